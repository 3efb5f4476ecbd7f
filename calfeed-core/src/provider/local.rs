use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::calendar::Calendar;
use crate::error::CalFeedResult;
use crate::event::Event;
use crate::ics::generate_ics;
use crate::persist::write_atomic;
use crate::provider::SessionContext;

/// A calendar kept in a single ICS file.
pub struct LocalProvider {
    path: PathBuf,
    name: String,
}

impl LocalProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path.display().to_string();
        LocalProvider { path, name }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the file. A file that does not exist yet is an empty calendar
    /// named after the file stem.
    pub async fn fetch(&self, _session: &SessionContext) -> CalFeedResult<Calendar> {
        self.load()
    }

    /// Add `events` to the file, skipping ones already present.
    pub async fn add_events(
        &self,
        events: &[Event],
        _session: &SessionContext,
    ) -> CalFeedResult<()> {
        let mut calendar = self.load()?;

        let added = events
            .iter()
            .filter(|event| calendar.add_event((*event).clone()))
            .count();

        if added == 0 {
            debug!(path = %self.path.display(), "No new events to write");
            return Ok(());
        }

        let ics = generate_ics(&calendar)?;
        write_atomic(self.path.clone(), ics.into_bytes()).await?;
        info!(path = %self.path.display(), added, total = calendar.len(), "Updated calendar file");
        Ok(())
    }

    fn load(&self) -> CalFeedResult<Calendar> {
        if !self.path.exists() {
            let stem = self
                .path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            return Ok(Calendar::new(stem, ""));
        }

        Calendar::from_ics_file(&self.path)
    }
}
