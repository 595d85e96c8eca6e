//! Error types for adapters.

use meshgraph_engine::{SourceError, SourceErrorKind};
use thiserror::Error;

/// Errors that can occur when fetching samples from a backend.
#[derive(Debug, Error)]
pub enum AdapterError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// The backend answered with an error status.
    #[error("Query failed ({error_type}): {message}")]
    Query { error_type: String, message: String },

    /// Failed to parse response.
    #[error("Failed to parse response: {0}")]
    Parse(String),

    /// Authentication failed.
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Connection failed.
    #[error("Connection failed: {0}")]
    Connection(String),

    /// Timeout waiting for response.
    #[error("Request timed out")]
    Timeout,

    /// Result shape not supported by this adapter.
    #[error("Unsupported result: {0}")]
    Unsupported(String),
}

#[cfg(feature = "prometheus")]
impl From<reqwest::Error> for AdapterError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            AdapterError::Timeout
        } else if err.is_connect() {
            AdapterError::Connection(err.to_string())
        } else {
            AdapterError::Http(err.to_string())
        }
    }
}

impl From<AdapterError> for SourceError {
    fn from(err: AdapterError) -> Self {
        let kind = match &err {
            AdapterError::Connection(_) => SourceErrorKind::Connection,
            AdapterError::Timeout => SourceErrorKind::Timeout,
            AdapterError::Auth(_) => SourceErrorKind::Auth,
            AdapterError::Http(_)
            | AdapterError::Query { .. }
            | AdapterError::Parse(_)
            | AdapterError::Unsupported(_) => SourceErrorKind::Backend,
        };
        SourceError::new(kind, err.to_string())
    }
}
