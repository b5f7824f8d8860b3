//! # harvester-foundation
//!
//! Foundation layer for Harvester:
//! - Error: central error type and `Result` alias
//! - Config: environment-driven settings (Apify connection, app settings)
//!
//! Everything above this layer (the remote client, the task system) reports
//! errors through [`Error`] and is constructed from [`Settings`] values.
//! No global state lives here; callers own their config and pass it down.

pub mod config;
pub mod error;

pub use config::{ApifyConfig, AppConfig, ConfigStatus, Settings, DEFAULT_BASE_URL};
pub use error::{Error, Result};
