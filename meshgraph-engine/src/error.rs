//! Error types for graph construction.

use thiserror::Error;

/// Errors that can occur while answering a query.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The query model could not be parsed.
    #[error("Failed to parse query model: {0}")]
    Model(#[from] serde_json::Error),

    /// The query model parsed but describes an impossible request.
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// The time range is too short to normalise rates over.
    #[error("Invalid time range: window must be at least one second, got {0}ms")]
    InvalidTimeRange(u64),

    /// A sample source request failed. The first failure wins.
    #[error("Failed to fetch samples: {0}")]
    Source(#[from] SourceError),

    /// A fetch task panicked or was cancelled.
    #[error("Fetch task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Failure reported by a [`SampleSource`](crate::SampleSource).
///
/// Sources wrap their own error types into this so the engine can stay
/// agnostic of the backend.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct SourceError {
    kind: SourceErrorKind,
    message: String,
}

/// Broad classification of a [`SourceError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceErrorKind {
    /// The backend could not be reached.
    Connection,
    /// The backend did not answer in time.
    Timeout,
    /// The backend rejected the credentials.
    Auth,
    /// The backend answered with an error or an unexpected payload.
    Backend,
}

impl SourceError {
    /// Create a source error.
    pub fn new(kind: SourceErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Shorthand for a [`SourceErrorKind::Backend`] error.
    pub fn backend(message: impl Into<String>) -> Self {
        Self::new(SourceErrorKind::Backend, message)
    }

    /// Error classification.
    pub fn kind(&self) -> SourceErrorKind {
        self.kind
    }

    /// Error message.
    pub fn message(&self) -> &str {
        &self.message
    }
}
