use std::time::Duration;

use medassist_llm::Config;

pub const DEFAULT_MAX_ROUNDS: usize = 8;
pub const DEFAULT_TOOL_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_FALLBACK_TEXT: &str = "I'm sorry, I don't have a response for that.";
pub const DEFAULT_ROUND_LIMIT_TEXT: &str = "I'm sorry, I was unable to complete that request.";

/// Configuration for the agent loop.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentLoopConfig {
    /// Tool dispatches allowed per submission before giving up.
    pub max_rounds: usize,
    pub tool_timeout: Duration,
    /// Answer used when the final turn carries no text.
    pub fallback_text: String,
    pub round_limit_text: String,
}

impl Default for AgentLoopConfig {
    fn default() -> Self {
        Self {
            max_rounds: DEFAULT_MAX_ROUNDS,
            tool_timeout: DEFAULT_TOOL_TIMEOUT,
            fallback_text: DEFAULT_FALLBACK_TEXT.to_string(),
            round_limit_text: DEFAULT_ROUND_LIMIT_TEXT.to_string(),
        }
    }
}

impl From<&Config> for AgentLoopConfig {
    fn from(config: &Config) -> Self {
        Self {
            max_rounds: config.max_rounds,
            tool_timeout: config.tool_timeout(),
            ..Self::default()
        }
    }
}
