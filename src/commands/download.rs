use std::path::PathBuf;

use anyhow::{Context, Result};
use calfeed_core::Config;
use calfeed_core::ics::IcsDownloader;

pub async fn run(config: &Config, url: &str, dir: Option<PathBuf>) -> Result<()> {
    let mut downloader = IcsDownloader::from_config(config)?;
    if let Some(dir) = dir {
        downloader = downloader.into_dir(dir);
    }

    let path = downloader
        .download(url)
        .await
        .with_context(|| format!("Failed to download {url}"))?;

    println!("{}", path.display());
    Ok(())
}
