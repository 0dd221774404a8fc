use std::time::Duration;

use thiserror::Error;

/// Failure to obtain the next turn from the conversational backend.
///
/// A session that returns one of these has not recorded the attempted
/// exchange, so the same `advance` may be retried.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    #[error("Backend unavailable: {0}")]
    Unavailable(String),

    #[error("Malformed turn: {0}")]
    MalformedTurn(String),

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("Backend request timed out after {}ms", .0.as_millis())]
    Timeout(Duration),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("Invalid session input: {0}")]
    InvalidInput(String),
}

impl BackendError {
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            BackendError::Unavailable(_)
                | BackendError::MalformedTurn(_)
                | BackendError::RateLimited(_)
                | BackendError::Timeout(_)
        )
    }
}
