//! Store and configuration error types.
//!
//! Store errors are defined in `answercheck-core` so the recheck driver can
//! downcast and classify them for retry decisions without string matching.

use thiserror::Error;

/// Errors that can occur when talking to the submission store or task catalog.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store returned a 429 rate limit response.
    #[error("rate limited, retry after {retry_after_ms}ms")]
    RateLimited { retry_after_ms: u64 },

    /// Authentication failed (invalid or missing API key).
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    /// The requested table does not exist.
    #[error("table not found: {0}")]
    TableNotFound(String),

    /// The store returned an error response.
    #[error("API error (HTTP {status}): {message}")]
    ApiError { status: u16, message: String },

    /// The request timed out.
    #[error("request timed out after {0}s")]
    Timeout(u64),

    /// A network error occurred.
    #[error("network error: {0}")]
    NetworkError(String),

    /// A response body could not be decoded.
    #[error("failed to decode response: {0}")]
    Decode(String),
}

impl StoreError {
    /// Returns `true` if this error is permanent and should not be retried.
    pub fn is_permanent(&self) -> bool {
        matches!(
            self,
            StoreError::AuthenticationFailed(_)
                | StoreError::TableNotFound(_)
                | StoreError::Decode(_)
        )
    }

    /// Returns the retry-after delay in milliseconds, if applicable.
    pub fn retry_after_ms(&self) -> Option<u64> {
        match self {
            StoreError::RateLimited { retry_after_ms } => Some(*retry_after_ms),
            _ => None,
        }
    }
}

/// Errors raised while building grading configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("unknown subject: {0}")]
    UnknownSubject(String),

    #[error("invalid point value {0}, expected 1 or 2")]
    InvalidPointValue(i64),

    #[error("unknown {kind}: {value}")]
    UnknownOption { kind: &'static str, value: String },
}
