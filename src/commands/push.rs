use anyhow::{Context, Result};
use calfeed_core::{Config, ProviderManager};

use super::{load_source, resolve_provider, session_from_arg};

pub async fn run(
    config: &Config,
    source: &str,
    provider: &str,
    session: Option<&str>,
) -> Result<()> {
    let session = session_from_arg(session)?;
    let manager = ProviderManager::new(resolve_provider(config, provider)?);
    let calendar = load_source(config, source).await?;

    manager
        .add_events(calendar.events(), &session)
        .await
        .with_context(|| format!("Failed to push to {}", manager.provider()))?;

    println!("Pushed {} events to {}", calendar.len(), manager.provider().name());
    Ok(())
}
