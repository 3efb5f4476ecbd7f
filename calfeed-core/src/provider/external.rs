//! External provider binaries.
//!
//! A provider named `google` is the executable `calfeed-provider-google` on
//! `PATH`. Each call spawns it, writes one JSON [`Request`] line to stdin and
//! reads one JSON [`Response`] from stdout. Providers keep their own
//! credentials; calfeed only forwards the caller's [`SessionContext`].

use std::io;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::io::AsyncWriteExt;
use tokio::process::Command as TokioCommand;
use tokio::time::timeout;
use tracing::debug;

use crate::calendar::Calendar;
use crate::error::{CalFeedError, CalFeedResult};
use crate::event::Event;
use crate::provider::SessionContext;
use crate::provider::protocol::{AddEvents, Command, Fetch, ProviderCommand, Request, Response};

const PROVIDER_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Clone, Debug)]
pub struct ExternalProvider {
    name: String,
    binary: Option<PathBuf>,
}

impl ExternalProvider {
    /// Provider resolved from `PATH` on each call.
    pub fn from_name(name: &str) -> Self {
        ExternalProvider {
            name: name.to_string(),
            binary: None,
        }
    }

    /// Provider backed by an explicit executable.
    pub fn with_binary(name: &str, binary: impl Into<PathBuf>) -> Self {
        ExternalProvider {
            name: name.to_string(),
            binary: Some(binary.into()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn binary_name(&self) -> String {
        format!("calfeed-provider-{}", self.name)
    }

    fn binary_path(&self) -> CalFeedResult<PathBuf> {
        if let Some(binary) = &self.binary {
            return Ok(binary.clone());
        }

        which::which(self.binary_name())
            .map_err(|_| CalFeedError::ProviderNotInstalled(self.binary_name()))
    }

    pub async fn add_events(
        &self,
        events: &[Event],
        session: &SessionContext,
    ) -> CalFeedResult<()> {
        self.call(AddEvents {
            session: session.clone(),
            events: events.to_vec(),
        })
        .await
    }

    pub async fn fetch(&self, session: &SessionContext) -> CalFeedResult<Calendar> {
        let remote = self
            .call(Fetch {
                session: session.clone(),
            })
            .await?;

        Ok(Calendar::with_events(remote.name, remote.service, remote.events))
    }

    /// Call a typed provider command and return the result.
    pub async fn call<C: ProviderCommand>(&self, cmd: C) -> CalFeedResult<C::Response> {
        timeout(PROVIDER_TIMEOUT, self.call_raw(C::command(), cmd))
            .await
            .map_err(|_| CalFeedError::ProviderTimeout(PROVIDER_TIMEOUT.as_secs()))?
    }

    async fn call_raw<P: Serialize, R: DeserializeOwned>(
        &self,
        command: Command,
        params: P,
    ) -> CalFeedResult<R> {
        let request = encode_request(command, params)?;
        let binary_path = self.binary_path()?;
        debug!(
            provider = %self.name,
            ?command,
            binary = %binary_path.display(),
            "Calling provider"
        );

        let stdout = run_binary(&binary_path, &request).await?;
        decode_response(&stdout)
    }
}

fn encode_request<P: Serialize>(command: Command, params: P) -> CalFeedResult<String> {
    let params =
        serde_json::to_value(params).map_err(|e| CalFeedError::Serialization(e.to_string()))?;
    let mut json = serde_json::to_string(&Request { command, params })
        .map_err(|e| CalFeedError::Serialization(e.to_string()))?;
    json.push('\n');
    Ok(json)
}

/// Spawn the provider, hand it `request` on stdin and collect its stdout.
async fn run_binary(binary_path: &Path, request: &str) -> CalFeedResult<Vec<u8>> {
    let mut child = TokioCommand::new(binary_path)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::inherit())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| {
            CalFeedError::Provider(format!("Failed to spawn {}: {e}", binary_path.display()))
        })?;

    let mut stdin = child
        .stdin
        .take()
        .ok_or_else(|| CalFeedError::Provider("Provider stdin unavailable".into()))?;
    match stdin.write_all(request.as_bytes()).await {
        Ok(()) => {}
        // The provider answered without reading its input
        Err(e) if e.kind() == io::ErrorKind::BrokenPipe => {
            debug!(binary = %binary_path.display(), "Provider closed stdin early");
        }
        Err(e) => return Err(e.into()),
    }
    drop(stdin);

    let output = child.wait_with_output().await?;
    if !output.status.success() {
        return Err(CalFeedError::Provider(format!(
            "Provider exited with status: {}",
            output.status.code().unwrap_or(-1)
        )));
    }

    Ok(output.stdout)
}

fn decode_response<R: DeserializeOwned>(stdout: &[u8]) -> CalFeedResult<R> {
    let text = String::from_utf8_lossy(stdout);
    if text.trim().is_empty() {
        return Err(CalFeedError::Provider("Provider returned no response".into()));
    }

    let response: Response<R> = serde_json::from_str(&text)
        .map_err(|e| CalFeedError::Provider(format!("Failed to parse response: {e}")))?;

    match response {
        Response::Success { data } => Ok(data),
        Response::Error { error } => Err(CalFeedError::Provider(error)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::protocol::RemoteCalendar;

    #[test]
    fn test_decode_success_and_error() {
        let calendar: RemoteCalendar =
            decode_response(br#"{"status":"success","data":{"name":"Team"}}"#).unwrap();
        assert_eq!(calendar.name, "Team");

        let result: CalFeedResult<()> = decode_response(br#"{"status":"error","error":"denied"}"#);
        assert!(matches!(result, Err(CalFeedError::Provider(msg)) if msg == "denied"));
    }

    #[test]
    fn test_decode_rejects_garbage() {
        let result: CalFeedResult<()> = decode_response(b"  \n");
        assert!(matches!(result, Err(CalFeedError::Provider(msg)) if msg.contains("no response")));

        let result: CalFeedResult<()> = decode_response(b"not json");
        assert!(matches!(result, Err(CalFeedError::Provider(msg)) if msg.contains("parse")));
    }

    #[test]
    fn test_request_is_one_json_line() {
        let request = encode_request(
            Command::Fetch,
            Fetch {
                session: SessionContext::new(),
            },
        )
        .unwrap();

        assert!(request.ends_with('\n'));
        assert_eq!(request.matches('\n').count(), 1);
        let json: serde_json::Value = serde_json::from_str(&request).unwrap();
        assert_eq!(json["command"], "fetch");
    }
}
