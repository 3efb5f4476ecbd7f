use std::path::PathBuf;

use anyhow::{Context, Result};
use calfeed_core::ics::generate_ics;
use calfeed_core::{Calendar, Config};

use super::load_source;

pub async fn run(
    config: &Config,
    sources: &[String],
    output: Option<PathBuf>,
    name: Option<String>,
) -> Result<()> {
    let mut merged: Option<Calendar> = None;

    for source in sources {
        let calendar = load_source(config, source).await?;
        let total = calendar.len();

        let added = match merged.as_mut() {
            Some(merged) => merged.merge(calendar),
            None => {
                merged = Some(calendar);
                total
            }
        };
        eprintln!("  {source}: {added} of {total} events added");
    }

    let Some(mut merged) = merged else {
        anyhow::bail!("No sources given");
    };
    if let Some(name) = name {
        merged.set_name(name);
    }

    let ics = generate_ics(&merged)?;
    match output {
        Some(path) => {
            std::fs::write(&path, ics)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            eprintln!("Wrote {} events to {}", merged.len(), path.display());
        }
        None => print!("{ics}"),
    }

    Ok(())
}
