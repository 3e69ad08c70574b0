//! Error types for resource actions.

use std::path::PathBuf;

use thiserror::Error;

/// Result type for resource actions.
pub type Result<T> = std::result::Result<T, ActionError>;

/// Errors that abort a `check`, `in` or `out` invocation.
///
/// Every variant is fatal: the binary reports it on stderr and exits non-zero.
#[derive(Debug, Error)]
pub enum ActionError {
    /// A `file:` parameter points at a file that cannot be read.
    #[error("Failed to resolve parameter file {}: {source}", path.display())]
    Resolution {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The target could not be reached (DNS, connect, timeout, TLS).
    #[error("Request to {uri} failed: {message}")]
    Transport { uri: String, message: String },

    /// The target answered outside the 2xx range.
    #[error("HTTP request failed with status {status}: {body}")]
    HttpStatus {
        status: reqwest::StatusCode,
        body: String,
    },

    /// Malformed invocation payload or invalid source configuration.
    #[error("Invalid input: {0}")]
    Protocol(String),

    /// Reading stdin or writing stdout failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ActionError {
    pub fn protocol(message: impl Into<String>) -> Self {
        ActionError::Protocol(message.into())
    }
}

impl From<serde_json::Error> for ActionError {
    fn from(err: serde_json::Error) -> Self {
        ActionError::Protocol(err.to_string())
    }
}
