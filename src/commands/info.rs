use std::path::Path;

use anyhow::{Context, Result};
use calfeed_core::ics;

pub fn run(file: &Path) -> Result<()> {
    let metadata =
        ics::read_metadata(file).with_context(|| format!("Failed to read {}", file.display()))?;

    println!("Service: {}", metadata.service.as_deref().unwrap_or("(none)"));
    println!("Name:    {}", metadata.name.as_deref().unwrap_or("(none)"));
    Ok(())
}
