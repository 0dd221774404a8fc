use thiserror::Error;

use crate::session::BackendError;

#[derive(Error, Debug)]
pub enum AgentError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    #[error("Cancelled")]
    Cancelled,
}

impl AgentError {
    /// Whether resubmitting the same user text may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            AgentError::Backend(error) => error.is_retryable(),
            AgentError::Configuration(_) | AgentError::Cancelled => false,
        }
    }
}
