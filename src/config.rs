//! Runtime configuration for the data-access core.
//!
//! Everything has a local-development default; deployments override the
//! API base URL and session storage location through the environment
//! (or a `.env` file next to the binary).

use std::path::PathBuf;
use std::time::Duration;

/// Environment variable overriding the API base URL.
const API_URL_VAR: &str = "STAYCACHE_API_URL";

/// Environment variable overriding the durable session directory.
const STORAGE_DIR_VAR: &str = "STAYCACHE_STORAGE_DIR";

/// Default API base URL for local development.
const DEFAULT_API_URL: &str = "http://localhost:5000";

/// Default per-request timeout in milliseconds.
/// 12s rides out slow cold starts of the backend while still failing
/// within one attention span.
pub const DEFAULT_TIMEOUT_MS: u64 = 12_000;

/// Default number of retries after the first attempt (3 total attempts).
pub const DEFAULT_MAX_RETRIES: u32 = 2;

/// Base backoff delay in milliseconds; doubles before each retry.
pub const DEFAULT_BACKOFF_BASE_MS: u64 = 500;

/// Configuration for the API client and session storage.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the remote API, without a trailing slash.
    pub api_url: String,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Retries after the first attempt for transient failures.
    pub max_retries: u32,
    /// Delay before the first retry; doubles per attempt.
    pub backoff_base: Duration,
    /// Session storage directory; `None` selects the platform default.
    pub storage_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            max_retries: DEFAULT_MAX_RETRIES,
            backoff_base: Duration::from_millis(DEFAULT_BACKOFF_BASE_MS),
            storage_dir: None,
        }
    }
}

impl Config {
    /// Build a config from the process environment, reading a `.env`
    /// file first if one is present.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let mut config = Self::default();
        if let Ok(url) = std::env::var(API_URL_VAR) {
            if !url.is_empty() {
                config.api_url = url;
            }
        }
        if let Ok(dir) = std::env::var(STORAGE_DIR_VAR) {
            if !dir.is_empty() {
                config.storage_dir = Some(PathBuf::from(dir));
            }
        }
        config
    }
}
