pub mod config;
pub mod conversation;
pub mod dispatcher;
pub mod runner;

pub use config::AgentLoopConfig;
pub use conversation::{Conversation, ConversationBuilder};
pub use dispatcher::Dispatcher;
pub use runner::{run_agent_loop, LoopOutput};

#[cfg(test)]
mod test_support;
