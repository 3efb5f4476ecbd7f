//! Defines the JSON protocol used between calfeed and external provider
//! binaries over stdin/stdout.

use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::event::Event;
use crate::provider::SessionContext;

pub trait ProviderCommand: Serialize {
    type Response: DeserializeOwned;
    fn command() -> Command;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Command {
    AddEvents,
    Fetch,
}

/// Request sent from calfeed to a provider.
#[derive(Debug, Serialize, Deserialize)]
pub struct Request {
    pub command: Command,
    #[serde(default)]
    pub params: serde_json::Value,
}

/// Response sent from a provider back to calfeed.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Response<T> {
    Success { data: T },
    Error { error: String },
}

impl<T: Serialize> Response<T> {
    pub fn success(data: T) -> serde_json::Result<String> {
        serde_json::to_string(&Response::Success { data })
    }
}

impl Response<()> {
    pub fn error(msg: &str) -> serde_json::Result<String> {
        serde_json::to_string(&Response::<()>::Error {
            error: msg.to_string(),
        })
    }
}

/// Push events to the provider's calendar.
#[derive(Debug, Serialize, Deserialize)]
pub struct AddEvents {
    pub session: SessionContext,
    pub events: Vec<Event>,
}

impl ProviderCommand for AddEvents {
    type Response = ();
    fn command() -> Command {
        Command::AddEvents
    }
}

/// Retrieve the provider's calendar.
#[derive(Debug, Serialize, Deserialize)]
pub struct Fetch {
    pub session: SessionContext,
}

/// Calendar as sent over the wire. Ownership is assigned when it is turned
/// into a [`crate::Calendar`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RemoteCalendar {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub service: String,
    #[serde(default)]
    pub events: Vec<Event>,
}

impl ProviderCommand for Fetch {
    type Response = RemoteCalendar;
    fn command() -> Command {
        Command::Fetch
    }
}
