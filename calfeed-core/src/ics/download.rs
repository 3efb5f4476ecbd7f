//! Downloading ICS feeds to local files.
//!
//! Each feed URL maps to one file in the download directory. The name is a
//! slug of the URL plus a short SHA-256 digest, so it is stable across runs and
//! legal on any filesystem. A new download overwrites the previous copy.

use std::path::{Path, PathBuf};
use std::time::Duration;

use sha2::{Digest, Sha256};
use tracing::{debug, info};
use url::Url;

use crate::config::Config;
use crate::error::{CalFeedError, CalFeedResult};
use crate::persist::write_atomic;

const MAX_SLUG_LEN: usize = 100;
const DIGEST_HEX_LEN: usize = 16;

/// Parse a feed URL. `webcal://` and `webcals://` links are fetched over HTTPS.
pub fn feed_url(url: &str) -> CalFeedResult<Url> {
    let url = url.trim();
    let normalized = match url
        .strip_prefix("webcal://")
        .or_else(|| url.strip_prefix("webcals://"))
    {
        Some(rest) => format!("https://{rest}"),
        None => url.to_string(),
    };

    let parsed = Url::parse(&normalized).map_err(|_| CalFeedError::InvalidUrl(url.to_string()))?;
    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        _ => Err(CalFeedError::InvalidUrl(url.to_string())),
    }
}

/// File name used for the downloaded copy of `url`.
pub fn file_name_for(url: &Url) -> String {
    let slug: String = slug::slugify(url.as_str())
        .chars()
        .take(MAX_SLUG_LEN)
        .collect();

    let digest: String = Sha256::digest(url.as_str().as_bytes())
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect::<String>()
        .chars()
        .take(DIGEST_HEX_LEN)
        .collect();

    format!("{slug}-{digest}.ics")
}

pub struct IcsDownloader {
    dir: PathBuf,
    client: reqwest::Client,
}

impl IcsDownloader {
    /// Downloader with a default HTTP client.
    pub fn new(dir: impl Into<PathBuf>) -> CalFeedResult<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("calfeed/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| CalFeedError::Config(format!("Could not build HTTP client: {e}")))?;

        Ok(Self::with_client(dir, client))
    }

    pub fn from_config(config: &Config) -> CalFeedResult<Self> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| CalFeedError::Config(format!("Could not build HTTP client: {e}")))?;

        Ok(Self::with_client(config.download_dir(), client))
    }

    pub fn with_client(dir: impl Into<PathBuf>, client: reqwest::Client) -> Self {
        IcsDownloader {
            dir: dir.into(),
            client,
        }
    }

    /// Same client, different target directory.
    pub fn into_dir(self, dir: impl Into<PathBuf>) -> Self {
        IcsDownloader {
            dir: dir.into(),
            ..self
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Where the feed at `url` is stored once downloaded.
    pub fn path_for(&self, url: &Url) -> PathBuf {
        self.dir.join(file_name_for(url))
    }

    /// Download the feed at `url` and return the path of the local copy.
    ///
    /// The body is written to a temporary file next to the target and renamed
    /// into place, so the target either holds the complete body or is left
    /// untouched when anything fails.
    pub async fn download(&self, url: &str) -> CalFeedResult<PathBuf> {
        let url = feed_url(url)?;
        let fetch_error = |e: reqwest::Error| CalFeedError::Fetch {
            url: url.to_string(),
            message: e.to_string(),
        };

        debug!(%url, "Downloading feed");
        let body = self
            .client
            .get(url.clone())
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(fetch_error)?
            .bytes()
            .await
            .map_err(fetch_error)?;

        let path = self.path_for(&url);
        let bytes = body.len();
        write_atomic(path.clone(), body.to_vec()).await?;

        info!(%url, path = %path.display(), bytes, "Downloaded feed");
        Ok(path)
    }
}

/// Download `url` into `dir` with a default client.
pub async fn download_ics_file(url: &str, dir: &Path) -> CalFeedResult<PathBuf> {
    IcsDownloader::new(dir)?.download(url).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{routing::get, Router};
    use std::net::SocketAddr;

    const FEED: &str = "PRODID:-//Acme//EN\r\nX-WR-CALNAME:Team\r\n";

    async fn serve() -> SocketAddr {
        let router = Router::new()
            .route("/team.ics", get(|| async { FEED }))
            .route("/other.ics", get(|| async { "PRODID:other\r\n" }));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        addr
    }

    #[test]
    fn test_webcal_links_use_https() {
        let url = feed_url("webcal://example.com/cal.ics").unwrap();
        assert_eq!(url.as_str(), "https://example.com/cal.ics");

        let url = feed_url("webcals://example.com/cal.ics").unwrap();
        assert_eq!(url.scheme(), "https");
    }

    #[test]
    fn test_rejects_non_http_urls() {
        assert!(matches!(
            feed_url("ftp://example.com/cal.ics"),
            Err(CalFeedError::InvalidUrl(_))
        ));
        assert!(matches!(
            feed_url("not a url"),
            Err(CalFeedError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_file_name_is_deterministic_and_safe() {
        let url = feed_url("https://example.com/a/b/cal.ics?key=1:2").unwrap();
        let name = file_name_for(&url);

        assert_eq!(name, file_name_for(&url));
        assert!(name.ends_with(".ics"));
        assert!(!name.contains('/'));
        assert!(!name.contains(':'));
        assert!(!name.contains('?'));
        assert!(name.starts_with("https-example-com-a-b-cal-ics-key-1-2-"));
    }

    #[test]
    fn test_file_name_distinguishes_urls() {
        let a = feed_url("https://example.com/cal.ics").unwrap();
        let b = feed_url("https://example.com/cal.ICS").unwrap();
        assert_ne!(file_name_for(&a), file_name_for(&b));
    }

    #[test]
    fn test_file_name_is_bounded_for_long_urls() {
        let long = format!("https://example.com/{}", "x".repeat(1000));
        let name = file_name_for(&feed_url(&long).unwrap());
        assert_eq!(name.len(), MAX_SLUG_LEN + 1 + DIGEST_HEX_LEN + ".ics".len());
    }

    #[tokio::test]
    async fn test_download_writes_body_verbatim() {
        let addr = serve().await;
        let dir = tempfile::tempdir().unwrap();
        let url = format!("http://{addr}/team.ics");

        let path = download_ics_file(&url, dir.path()).await.unwrap();

        assert_eq!(path.parent(), Some(dir.path()));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), FEED);
    }

    #[tokio::test]
    async fn test_download_overwrites_previous_copy() {
        let addr = serve().await;
        let dir = tempfile::tempdir().unwrap();
        let downloader = IcsDownloader::new(dir.path()).unwrap();
        let url = format!("http://{addr}/team.ics");

        let path = downloader.path_for(&feed_url(&url).unwrap());
        std::fs::write(&path, "stale").unwrap();

        let downloaded = downloader.download(&url).await.unwrap();
        assert_eq!(downloaded, path);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), FEED);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[tokio::test]
    async fn test_download_creates_missing_directory() {
        let addr = serve().await;
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("feeds/cache");

        let path = download_ics_file(&format!("http://{addr}/other.ics"), &nested)
            .await
            .unwrap();
        assert!(path.starts_with(&nested));
    }

    #[tokio::test]
    async fn test_http_error_leaves_no_file() {
        let addr = serve().await;
        let dir = tempfile::tempdir().unwrap();

        let result = download_ics_file(&format!("http://{addr}/missing.ics"), dir.path()).await;

        assert!(matches!(result, Err(CalFeedError::Fetch { .. })));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_connection_failure_is_surfaced() {
        // Bind then drop to get a port nobody listens on
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let dir = tempfile::tempdir().unwrap();
        let result = download_ics_file(&format!("http://{addr}/team.ics"), dir.path()).await;
        assert!(matches!(result, Err(CalFeedError::Fetch { .. })));
    }
}
