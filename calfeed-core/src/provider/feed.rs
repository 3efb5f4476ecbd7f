use tracing::debug;

use crate::calendar::Calendar;
use crate::error::{CalFeedError, CalFeedResult};
use crate::event::Event;
use crate::ics::IcsDownloader;
use crate::provider::SessionContext;

/// A published ICS feed. Every fetch downloads a fresh copy.
pub struct FeedProvider {
    url: String,
    downloader: IcsDownloader,
}

impl FeedProvider {
    pub fn new(url: impl Into<String>, downloader: IcsDownloader) -> Self {
        FeedProvider {
            url: url.into(),
            downloader,
        }
    }

    pub fn name(&self) -> &str {
        &self.url
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Feeds cannot be written to.
    pub async fn add_events(
        &self,
        events: &[Event],
        _session: &SessionContext,
    ) -> CalFeedResult<()> {
        debug!(url = %self.url, count = events.len(), "Rejecting events for read-only feed");
        Err(CalFeedError::ReadOnly(self.url.clone()))
    }

    pub async fn fetch(&self, _session: &SessionContext) -> CalFeedResult<Calendar> {
        let path = self.downloader.download(&self.url).await?;
        Calendar::from_ics_file(&path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{routing::get, Router};

    const FEED: &str = "BEGIN:VCALENDAR\r\n\
PRODID:-//Acme//EN\r\n\
X-WR-CALNAME:Team\r\n\
BEGIN:VEVENT\r\n\
SUMMARY:Standup\r\n\
DTSTART:20240102T090000Z\r\n\
DTEND:20240102T093000Z\r\n\
END:VEVENT\r\n\
BEGIN:VEVENT\r\n\
SUMMARY:Standup\r\n\
DTSTART:20240102T090000Z\r\n\
DTEND:20240102T093000Z\r\n\
END:VEVENT\r\n\
END:VCALENDAR\r\n";

    async fn serve() -> String {
        let router = Router::new().route("/team.ics", get(|| async { FEED }));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}/team.ics")
    }

    #[tokio::test]
    async fn test_fetch_downloads_and_parses() {
        let url = serve().await;
        let dir = tempfile::tempdir().unwrap();
        let provider = FeedProvider::new(&url, IcsDownloader::new(dir.path()).unwrap());

        let calendar = provider.fetch(&SessionContext::new()).await.unwrap();

        assert_eq!(calendar.name(), "Team");
        assert_eq!(calendar.service(), "-//Acme//EN");
        assert_eq!(calendar.len(), 1);
        assert_eq!(calendar.events()[0].owner(), Some(calendar.id()));
    }

    #[tokio::test]
    async fn test_add_events_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let provider = FeedProvider::new(
            "https://example.com/team.ics",
            IcsDownloader::new(dir.path()).unwrap(),
        );

        let result = provider.add_events(&[], &SessionContext::new()).await;
        assert!(matches!(
            result,
            Err(CalFeedError::ReadOnly(url)) if url == "https://example.com/team.ics"
        ));
    }
}
