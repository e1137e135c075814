//! Error types for Reflection

use thiserror::Error;

/// Result type alias using Reflection's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for Reflection
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// The model backend could not be reached or failed transiently
    #[error("Model backend unavailable: {0}")]
    BackendUnavailable(String),

    /// The model backend refused the request (bad request, safety filter, empty candidate)
    #[error("Model backend rejected request: {0}")]
    BackendRejected(String),

    /// Reading conversation history failed
    #[error("Store read failed: {0}")]
    StoreReadFailed(String),

    /// Persisting a turn or cache entry failed
    #[error("Store write failed: {0}")]
    StoreWriteFailed(String),

    /// Database error (pool setup, migrations)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// HTTP client error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl Error {
    /// Check if error is retryable
    ///
    /// The crate never retries on its own; this is for callers that
    /// wrap `send` in their own policy.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Error::BackendUnavailable(_)
                | Error::StoreReadFailed(_)
                | Error::StoreWriteFailed(_)
                | Error::Http(_)
                | Error::Database(_)
        )
    }

    /// Check if error is a client error (caller's fault)
    pub fn is_client_error(&self) -> bool {
        matches!(self, Error::InvalidInput(_) | Error::BackendRejected(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(Error::BackendUnavailable("503".into()).is_retryable());
        assert!(Error::StoreWriteFailed("down".into()).is_retryable());
        assert!(!Error::BackendRejected("SAFETY".into()).is_retryable());
        assert!(!Error::InvalidInput("empty".into()).is_retryable());
    }

    #[test]
    fn test_client_error_classification() {
        assert!(Error::InvalidInput("empty session".into()).is_client_error());
        assert!(Error::BackendRejected("blocked".into()).is_client_error());
        assert!(!Error::StoreReadFailed("timeout".into()).is_client_error());
    }
}
