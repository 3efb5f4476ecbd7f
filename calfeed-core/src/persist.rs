//! Atomic file replacement.

use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::error::{CalFeedError, CalFeedResult};

/// Replace `path` with `contents`, creating parent directories as needed.
///
/// The data goes to a temporary file in the same directory which is then
/// renamed over `path`, so readers see either the old or the new contents.
/// Runs on the blocking thread pool.
pub(crate) async fn write_atomic(path: PathBuf, contents: Vec<u8>) -> CalFeedResult<()> {
    tokio::task::spawn_blocking(move || write_atomic_blocking(&path, &contents))
        .await
        .map_err(|e| CalFeedError::Io(std::io::Error::other(e)))?
}

fn write_atomic_blocking(path: &Path, contents: &[u8]) -> CalFeedResult<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)?;

    let mut file = NamedTempFile::new_in(dir)?;
    file.write_all(contents)?;
    file.as_file().sync_all()?;
    file.persist(path).map_err(|e| e.error)?;
    Ok(())
}
