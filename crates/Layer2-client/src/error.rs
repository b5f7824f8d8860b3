//! Client-specific error types
//!
//! `ClientError` carries the detail of a failed platform interaction and
//! converts into `harvester_foundation::Error` at the crate boundary.

use harvester_foundation::Error as FoundationError;
use thiserror::Error;

/// Errors that can occur while talking to the remote platform
#[derive(Error, Debug, Clone)]
pub enum ClientError {
    /// Client was constructed without an API token
    #[error("Client not configured: {0}")]
    NotConfigured(String),

    /// API token is missing or invalid
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Resource (actor, run, dataset) does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Rate limit exceeded
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// Server error (5xx)
    #[error("Server error: {0}")]
    Server(String),

    /// Request failed before a response arrived (connection, DNS, timeout)
    #[error("Network error: {0}")]
    Network(String),

    /// Response arrived but could not be interpreted
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Anything else
    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

impl ClientError {
    /// Create from an HTTP status code and response body
    pub fn from_http_status(status: u16, body: &str) -> Self {
        match status {
            401 | 403 => ClientError::Authentication(body.to_string()),
            404 => ClientError::NotFound(body.to_string()),
            429 => ClientError::RateLimited(body.to_string()),
            500..=599 => ClientError::Server(body.to_string()),
            _ => ClientError::Unexpected(format!("HTTP {}: {}", status, body)),
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ClientError::InvalidResponse(err.to_string())
        } else {
            ClientError::Network(err.to_string())
        }
    }
}

impl From<ClientError> for FoundationError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::NotConfigured(msg) => FoundationError::Config(msg),
            ClientError::NotFound(msg) => FoundationError::NotFound(msg),
            other => FoundationError::Remote(other.to_string()),
        }
    }
}
