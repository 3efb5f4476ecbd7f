//! Global calfeed configuration.

use std::path::{Path, PathBuf};

use config::{Environment, File};
use serde::{Deserialize, Serialize};

use crate::error::{CalFeedError, CalFeedResult};

const DEFAULT_DOWNLOAD_DIR: &str = "~/.cache/calfeed/feeds";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

fn default_download_dir() -> PathBuf {
    PathBuf::from(DEFAULT_DOWNLOAD_DIR)
}

fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

fn default_user_agent() -> String {
    concat!("calfeed/", env!("CARGO_PKG_VERSION")).to_string()
}

/// Configuration at ~/.config/calfeed/config.toml
///
/// Every key can be overridden from the environment with a `CALFEED_` prefix,
/// e.g. `CALFEED_DOWNLOAD_DIR`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Where downloaded feeds are stored. `~` is expanded.
    #[serde(default = "default_download_dir")]
    pub download_dir: PathBuf,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            download_dir: default_download_dir(),
            request_timeout_secs: default_request_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

impl Config {
    pub fn config_path() -> CalFeedResult<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| CalFeedError::Config("Could not determine config directory".into()))?
            .join("calfeed");

        Ok(config_dir.join("config.toml"))
    }

    /// Load from the default location. Nothing is written when no config
    /// file exists; the defaults apply.
    pub fn load() -> CalFeedResult<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load from `path`. A missing file yields the defaults.
    pub fn load_from(path: &Path) -> CalFeedResult<Self> {
        config::Config::builder()
            .add_source(File::from(path).required(false))
            .add_source(Environment::with_prefix("CALFEED"))
            .build()
            .map_err(|e| CalFeedError::Config(e.to_string()))?
            .try_deserialize()
            .map_err(|e| CalFeedError::Config(e.to_string()))
    }

    /// `download_dir` with `~` expanded.
    pub fn download_dir(&self) -> PathBuf {
        let full_path_str =
            shellexpand::tilde(&self.download_dir.to_string_lossy()).into_owned();

        PathBuf::from(full_path_str)
    }
}
