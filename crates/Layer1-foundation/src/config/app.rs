//! Application configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Local application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Debug mode
    pub debug: bool,

    /// Log level name ("trace".."error")
    pub log_level: String,

    /// Directory holding the persisted task store
    pub data_dir: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            debug: false,
            log_level: "info".to_string(),
            data_dir: PathBuf::from("./data"),
        }
    }
}

impl AppConfig {
    /// Load from `APP_*` environment variables, defaulting everything
    ///
    /// Never fails; unset or malformed variables keep their defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(debug) = std::env::var("APP_DEBUG") {
            config.debug = matches!(debug.trim(), "1" | "true" | "yes");
        }
        if let Ok(level) = std::env::var("APP_LOG_LEVEL") {
            if !level.trim().is_empty() {
                config.log_level = level.trim().to_lowercase();
            }
        }
        if let Ok(dir) = std::env::var("APP_DATA_DIR") {
            if !dir.trim().is_empty() {
                config.data_dir = PathBuf::from(dir);
            }
        }

        config
    }

    /// Override the data directory
    pub fn with_data_dir(mut self, data_dir: impl Into<PathBuf>) -> Self {
        self.data_dir = data_dir.into();
        self
    }
}
