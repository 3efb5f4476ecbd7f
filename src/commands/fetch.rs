use anyhow::{Context, Result};
use calfeed_core::{Config, ProviderManager};

use super::{print_events, resolve_provider, session_from_arg};

pub async fn run(config: &Config, provider: &str, session: Option<&str>) -> Result<()> {
    let session = session_from_arg(session)?;
    let manager = ProviderManager::new(resolve_provider(config, provider)?);

    let calendar = manager
        .fetch(&session)
        .await
        .with_context(|| format!("Failed to fetch from {}", manager.provider()))?;

    println!("📅 {} ({} events)", calendar, calendar.len());
    print_events(&calendar);
    Ok(())
}
