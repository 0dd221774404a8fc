pub mod agent;
pub mod session;
pub mod tools;

pub use agent::events::{AgentEvent, LoopStatus};
pub use agent::types::{Message, Role, Session};
pub use agent::AgentError;
pub use session::{
    correlate_results, BackendError, ConversationSession, ConversationTurn, SessionInput,
};
pub use tools::{
    RegistryError, Tool, ToolArguments, ToolCallRequest, ToolCallResult, ToolDescriptor,
    ToolError, ToolExecutor, ToolOutcome, ToolRegistry,
};

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
