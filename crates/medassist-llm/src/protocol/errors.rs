use thiserror::Error;

/// Failure converting between internal messages and Gemini wire content.
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("Gemini payload is not valid JSON: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Role '{0}' cannot be expressed as Gemini content")]
    InvalidRole(String),

    #[error("Message is missing '{0}'")]
    MissingField(String),

    #[error("Malformed functionCall: {0}")]
    InvalidToolCall(String),
}

pub type ProtocolResult<T> = Result<T, ProtocolError>;
