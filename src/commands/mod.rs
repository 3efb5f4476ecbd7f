pub mod download;
pub mod events;
pub mod fetch;
pub mod info;
pub mod merge;
pub mod push;

use std::path::Path;

use anyhow::{Context, Result};
use calfeed_core::ics::IcsDownloader;
use calfeed_core::provider::{ExternalProvider, FeedProvider, LocalProvider};
use calfeed_core::{Calendar, Config, Provider, SessionContext};
use tracing::debug;

/// Sources containing a scheme separator are feeds, anything else is a path.
pub fn is_url(source: &str) -> bool {
    source.contains("://")
}

/// Load a calendar from a feed URL or a local ICS file.
pub async fn load_source(config: &Config, source: &str) -> Result<Calendar> {
    debug!(source, "Loading calendar");
    let path = if is_url(source) {
        IcsDownloader::from_config(config)?
            .download(source)
            .await
            .with_context(|| format!("Failed to download {source}"))?
    } else {
        source.into()
    };

    read_calendar(&path)
}

pub fn read_calendar(path: &Path) -> Result<Calendar> {
    Calendar::from_ics_file(path).with_context(|| format!("Failed to read {}", path.display()))
}

/// Resolve `feed:URL`, `local:PATH` or a bare provider name.
pub fn resolve_provider(config: &Config, arg: &str) -> Result<Provider> {
    if let Some(url) = arg.strip_prefix("feed:") {
        let downloader = IcsDownloader::from_config(config)?;
        return Ok(FeedProvider::new(url, downloader).into());
    }

    if let Some(path) = arg.strip_prefix("local:") {
        return Ok(LocalProvider::new(path).into());
    }

    if arg.is_empty() {
        anyhow::bail!("Provider name must not be empty");
    }

    Ok(ExternalProvider::from_name(arg).into())
}

pub fn session_from_arg(session: Option<&str>) -> Result<SessionContext> {
    match session {
        Some(json) => SessionContext::from_json(json).context("Invalid --session"),
        None => Ok(SessionContext::new()),
    }
}

pub fn print_events(calendar: &Calendar) {
    for event in calendar.events() {
        println!("  {}", event);
    }
}
