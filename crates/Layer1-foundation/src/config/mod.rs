//! Configuration for Harvester
//!
//! - `apify`: connection settings for the remote platform (`APIFY_*` env)
//! - `app`: local application settings (`APP_*` env)

mod apify;
mod app;

pub use apify::{ApifyConfig, DEFAULT_BASE_URL};
pub use app::AppConfig;

use serde::Serialize;
use tracing::warn;

/// Combined process settings
///
/// The platform half is optional: a process without an API token can still
/// inspect and manage its local task records, it just cannot run anything.
#[derive(Debug, Clone)]
pub struct Settings {
    pub apify: Option<ApifyConfig>,
    pub app: AppConfig,
}

impl Settings {
    /// Load everything from the environment
    ///
    /// A missing `APIFY_API_TOKEN` is tolerated (logged, platform half left
    /// unconfigured); the app half always loads.
    pub fn from_env() -> Self {
        let apify = match ApifyConfig::from_env() {
            Ok(config) => Some(config),
            Err(e) => {
                warn!("Apify configuration not loaded: {}", e);
                None
            }
        };

        Self {
            apify,
            app: AppConfig::from_env(),
        }
    }

    /// Whether the platform connection is configured
    pub fn is_configured(&self) -> bool {
        self.apify.is_some()
    }

    /// Summarize configuration state for display or assertions
    pub fn validate(&self) -> ConfigStatus {
        let mut problems = Vec::new();

        if self.apify.is_none() {
            problems.push("Apify API token is not configured".to_string());
        }

        ConfigStatus {
            apify_configured: self.apify.is_some(),
            data_dir: self.app.data_dir.display().to_string(),
            problems,
        }
    }
}

/// Validation summary for a [`Settings`] instance
#[derive(Debug, Clone, Serialize)]
pub struct ConfigStatus {
    pub apify_configured: bool,
    pub data_dir: String,
    pub problems: Vec<String>,
}

impl ConfigStatus {
    pub fn is_ok(&self) -> bool {
        self.problems.is_empty()
    }
}
