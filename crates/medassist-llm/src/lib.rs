pub mod config;
pub mod protocol;
pub mod provider;
pub mod providers;
pub mod session;
pub mod types;

pub use config::{Config, ConfigError};
pub use provider::{LLMError, LLMProvider, LLMStream};
pub use providers::GeminiProvider;
pub use session::ChatSession;
pub use types::LLMChunk;
