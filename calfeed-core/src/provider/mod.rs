//! Calendar providers.
//!
//! A provider is a remote or local calendar store that can hand out its
//! calendar and accept new events. Three kinds exist:
//! - [`FeedProvider`]: a published ICS feed, read-only
//! - [`LocalProvider`]: an ICS file on disk
//! - [`ExternalProvider`]: a `calfeed-provider-{name}` binary speaking the
//!   JSON protocol in [`protocol`]

mod external;
mod feed;
mod local;
mod manager;
pub mod protocol;

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::calendar::Calendar;
use crate::error::{CalFeedError, CalFeedResult};
use crate::event::Event;

pub use external::ExternalProvider;
pub use feed::FeedProvider;
pub use local::LocalProvider;
pub use manager::ProviderManager;

/// Opaque per-caller session data (tokens, account ids, ...).
///
/// calfeed never looks inside; external providers receive it verbatim.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionContext(HashMap<String, serde_json::Value>);

impl SessionContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a session from a JSON object.
    pub fn from_json(json: &str) -> CalFeedResult<Self> {
        serde_json::from_str(json).map_err(|e| CalFeedError::Serialization(e.to_string()))
    }

    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.0.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: serde_json::Value) {
        self.0.insert(key.into(), value);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

pub enum Provider {
    Feed(FeedProvider),
    Local(LocalProvider),
    External(ExternalProvider),
}

impl Provider {
    pub fn name(&self) -> &str {
        match self {
            Provider::Feed(p) => p.name(),
            Provider::Local(p) => p.name(),
            Provider::External(p) => p.name(),
        }
    }

    /// Store `events` in the provider's calendar.
    pub async fn add_events(
        &self,
        events: &[Event],
        session: &SessionContext,
    ) -> CalFeedResult<()> {
        match self {
            Provider::Feed(p) => p.add_events(events, session).await,
            Provider::Local(p) => p.add_events(events, session).await,
            Provider::External(p) => p.add_events(events, session).await,
        }
    }

    /// Retrieve the provider's calendar.
    pub async fn fetch(&self, session: &SessionContext) -> CalFeedResult<Calendar> {
        match self {
            Provider::Feed(p) => p.fetch(session).await,
            Provider::Local(p) => p.fetch(session).await,
            Provider::External(p) => p.fetch(session).await,
        }
    }
}

impl From<FeedProvider> for Provider {
    fn from(p: FeedProvider) -> Self {
        Provider::Feed(p)
    }
}

impl From<LocalProvider> for Provider {
    fn from(p: LocalProvider) -> Self {
        Provider::Local(p)
    }
}

impl From<ExternalProvider> for Provider {
    fn from(p: ExternalProvider) -> Self {
        Provider::External(p)
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self {
            Provider::Feed(_) => "feed",
            Provider::Local(_) => "local",
            Provider::External(_) => "external",
        };
        write!(f, "{} ({})", self.name(), kind)
    }
}
