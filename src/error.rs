//! Quillon error types

use std::time::Duration;

/// Quillon error types
#[derive(Debug, thiserror::Error)]
pub enum QuillonError {
    // Local errors, raised before any provider call
    #[error("invalid request: {0}")]
    Validation(String),

    #[error("configuration error: {0}")]
    Configuration(String),

    // Breaker outcomes
    /// The circuit breaker is open; the provider was not called.
    #[error("circuit breaker open, retry in {retry_in:?}")]
    CircuitOpen { retry_in: Duration },

    /// The guarded call exceeded the breaker's expected response time.
    #[error("provider call timed out after {0:?}")]
    Timeout(Duration),

    #[error("request cancelled")]
    Cancelled,

    // Provider/network errors
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("rate limited, retry after {retry_after:?}")]
    RateLimited { retry_after: Option<Duration> },

    #[error("authentication failed")]
    AuthenticationFailed,

    #[error("empty response from model")]
    EmptyResponse,

    #[error("provider error: {0}")]
    Provider(String),

    // Data errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl QuillonError {
    /// Whether the error is worth retrying.
    ///
    /// Timeouts, rate limits, network failures, 5xx responses and empty
    /// responses are transient. Breaker rejections are not: retrying into an
    /// open circuit only burns the backoff budget.
    pub fn is_transient(&self) -> bool {
        match self {
            QuillonError::Timeout(_)
            | QuillonError::RateLimited { .. }
            | QuillonError::Http(_)
            | QuillonError::EmptyResponse => true,
            QuillonError::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Provider-supplied backoff hint, if any.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            QuillonError::RateLimited { retry_after } => *retry_after,
            _ => None,
        }
    }

    /// Whether the error originated in the provider adapter.
    pub fn is_provider_error(&self) -> bool {
        matches!(
            self,
            QuillonError::Http(_)
                | QuillonError::Api { .. }
                | QuillonError::RateLimited { .. }
                | QuillonError::AuthenticationFailed
                | QuillonError::EmptyResponse
                | QuillonError::Provider(_)
        )
    }
}

/// Result type alias for Quillon operations
pub type Result<T> = std::result::Result<T, QuillonError>;
