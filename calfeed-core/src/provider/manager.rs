use tracing::debug;

use crate::calendar::Calendar;
use crate::error::CalFeedResult;
use crate::event::Event;
use crate::provider::{Provider, SessionContext};

/// Front for a single provider. Callers go through the manager rather than the
/// provider so the provider can be swapped without touching them.
pub struct ProviderManager {
    provider: Provider,
}

impl ProviderManager {
    pub fn new(provider: impl Into<Provider>) -> Self {
        ProviderManager {
            provider: provider.into(),
        }
    }

    pub fn provider(&self) -> &Provider {
        &self.provider
    }

    pub async fn add_events(
        &self,
        events: &[Event],
        session: &SessionContext,
    ) -> CalFeedResult<()> {
        debug!(provider = %self.provider, count = events.len(), "Adding events");
        self.provider.add_events(events, session).await
    }

    pub async fn fetch(&self, session: &SessionContext) -> CalFeedResult<Calendar> {
        debug!(provider = %self.provider, "Fetching calendar");
        self.provider.fetch(session).await
    }
}
