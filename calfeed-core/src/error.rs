//! Error types for calfeed.

use thiserror::Error;

/// Errors that can occur in calfeed operations.
///
/// Date values that fail to parse are not errors: the parser logs them and keeps
/// the raw text on the event.
#[derive(Error, Debug)]
pub enum CalFeedError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid feed URL '{0}'")]
    InvalidUrl(String),

    #[error("Failed to fetch {url}: {message}")]
    Fetch { url: String, message: String },

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Provider '{0}' not found in PATH")]
    ProviderNotInstalled(String),

    #[error("Provider request timed out after {0}s")]
    ProviderTimeout(u64),

    #[error("Calendar '{0}' is read-only")]
    ReadOnly(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type alias for calfeed operations.
pub type CalFeedResult<T> = Result<T, CalFeedError>;
