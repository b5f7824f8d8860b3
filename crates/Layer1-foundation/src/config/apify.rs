//! Apify platform configuration

use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Default API base URL
pub const DEFAULT_BASE_URL: &str = "https://api.apify.com/v2";

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_MAX_RETRIES: u32 = 3;

/// Connection settings for the Apify platform
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApifyConfig {
    /// API token used for authentication
    pub api_token: String,

    /// API base URL
    pub base_url: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,

    /// Maximum retry count, forwarded to callers that want it.
    /// Not acted on by this crate.
    pub max_retries: u32,
}

impl ApifyConfig {
    /// Create a config with defaults for everything but the token
    pub fn new(api_token: impl Into<String>) -> Result<Self> {
        let api_token = api_token.into();
        if api_token.trim().is_empty() {
            return Err(Error::Config("API token must not be empty".to_string()));
        }

        Ok(Self {
            api_token,
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_retries: DEFAULT_MAX_RETRIES,
        })
    }

    /// Load from `APIFY_*` environment variables
    ///
    /// `APIFY_API_TOKEN` is required; everything else falls back to defaults.
    pub fn from_env() -> Result<Self> {
        let api_token = std::env::var("APIFY_API_TOKEN")
            .map_err(|_| Error::Config("APIFY_API_TOKEN is not set".to_string()))?;

        let mut config = Self::new(api_token)?;

        if let Ok(base_url) = std::env::var("APIFY_BASE_URL") {
            if !base_url.trim().is_empty() {
                config.base_url = base_url;
            }
        }
        if let Some(timeout) = read_env_parsed("APIFY_TIMEOUT") {
            config.timeout_secs = timeout;
        }
        if let Some(retries) = read_env_parsed("APIFY_MAX_RETRIES") {
            config.max_retries = retries;
        }

        Ok(config)
    }

    /// Override the base URL
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Override the request timeout
    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }
}

fn read_env_parsed<T: std::str::FromStr>(key: &str) -> Option<T> {
    let raw = std::env::var(key).ok()?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!("Ignoring unparseable {}: {:?}", key, raw);
            None
        }
    }
}
