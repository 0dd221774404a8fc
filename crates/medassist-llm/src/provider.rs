use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;
use medassist_core::{BackendError, Message, ToolDescriptor};
use thiserror::Error;

use crate::types::LLMChunk;

#[derive(Error, Debug)]
pub enum LLMError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Stream error: {0}")]
    Stream(String),

    #[error("API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("Protocol conversion error: {0}")]
    Protocol(#[from] crate::protocol::ProtocolError),
}

pub type Result<T> = std::result::Result<T, LLMError>;

pub type LLMStream = Pin<Box<dyn Stream<Item = Result<LLMChunk>> + Send>>;

impl From<LLMError> for BackendError {
    fn from(error: LLMError) -> Self {
        match error {
            LLMError::Http(_) | LLMError::Transport(_) => {
                BackendError::Unavailable(error.to_string())
            }
            LLMError::Json(_) | LLMError::Stream(_) | LLMError::Protocol(_) => {
                BackendError::MalformedTurn(error.to_string())
            }
            LLMError::Api { status, message } if status >= 500 => {
                BackendError::Unavailable(format!("HTTP {status}: {message}"))
            }
            LLMError::Api { .. } => BackendError::Api(error.to_string()),
            LLMError::Auth(message) => BackendError::Unauthorized(message),
            LLMError::RateLimited(message) => BackendError::RateLimited(message),
        }
    }
}

#[async_trait]
pub trait LLMProvider: Send + Sync {
    /// Stream the model's next turn for `messages`.
    ///
    /// `tools` is the session's fixed tool declaration.
    async fn chat_stream(&self, messages: &[Message], tools: &[ToolDescriptor])
        -> Result<LLMStream>;

    fn model_name(&self) -> &str {
        "unknown"
    }
}
