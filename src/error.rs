//! Error types for the submission review agent
//!
//! Provides structured error types for rule evaluation, generation, and
//! backend communication.

use thiserror::Error;

/// Main error type for review operations
#[derive(Error, Debug)]
pub enum ReviewError {
    /// Invalid input data or arguments
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A generation backend returned an error or malformed response
    #[error("Backend error: {0}")]
    BackendError(String),

    /// A backend request timed out
    #[error("Backend timeout: {0}")]
    BackendTimeout(String),

    /// The backend is not configured (missing or malformed credentials)
    #[error("Backend unavailable: {0}")]
    BackendUnavailable(String),

    /// Admission denied by the per-backend rate limiter
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// Embedding backend failure
    #[error("Embedding error: {0}")]
    EmbeddingError(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// Metrics registration or encoding error
    #[error("Metrics error: {0}")]
    MetricsError(#[from] prometheus::Error),

    /// Internal invariant violation
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl ReviewError {
    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        ReviewError::InvalidInput(msg.into())
    }

    /// Create a backend error
    pub fn backend(msg: impl Into<String>) -> Self {
        ReviewError::BackendError(msg.into())
    }

    /// Create a backend unavailability error
    pub fn unavailable(msg: impl Into<String>) -> Self {
        ReviewError::BackendUnavailable(msg.into())
    }

    /// Check if this error should let the provider chain fall through to
    /// the next stage (everything except internal invariant violations)
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, ReviewError::InternalError(_))
    }
}

impl From<reqwest::Error> for ReviewError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ReviewError::BackendTimeout(err.to_string())
        } else {
            ReviewError::BackendError(err.to_string())
        }
    }
}

/// Result type alias for review operations
pub type Result<T> = std::result::Result<T, ReviewError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ReviewError::InvalidInput("bad factsheet".to_string());
        assert_eq!(err.to_string(), "Invalid input: bad factsheet");
    }

    #[test]
    fn test_is_recoverable() {
        assert!(ReviewError::BackendError("500".to_string()).is_recoverable());
        assert!(ReviewError::RateLimited("openai-gpt4".to_string()).is_recoverable());
        assert!(!ReviewError::InternalError("broken invariant".to_string()).is_recoverable());
    }

    #[test]
    fn test_error_constructors() {
        let err = ReviewError::invalid_input("test");
        assert!(matches!(err, ReviewError::InvalidInput(_)));

        let err = ReviewError::backend("test");
        assert!(matches!(err, ReviewError::BackendError(_)));

        let err = ReviewError::unavailable("test");
        assert!(matches!(err, ReviewError::BackendUnavailable(_)));
    }
}
