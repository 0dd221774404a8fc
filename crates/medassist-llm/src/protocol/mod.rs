//! Protocol conversion traits and types.
//!
//! Provider-specific wire types convert to and from the internal types in
//! `medassist_core` (messages, tool descriptors, conversation turns).
//!
//! ```text
//! Provider Types (Gemini)
//!     ↕
//! Internal Types (medassist_core::Message, ToolDescriptor, ConversationTurn)
//! ```

mod errors;
pub mod gemini;

pub use errors::{ProtocolError, ProtocolResult};
pub use gemini::GeminiProtocol;

/// Convert from a provider-specific type to an internal type ("spoke → hub").
pub trait FromProvider<T>: Sized {
    fn from_provider(value: T) -> ProtocolResult<Self>;
}

/// Convert from an internal type to a provider-specific type ("hub → spoke").
pub trait ToProvider<T> {
    fn to_provider(&self) -> ProtocolResult<T>;
}
