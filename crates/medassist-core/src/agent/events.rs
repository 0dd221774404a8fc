use serde::{Deserialize, Serialize};

/// How a submission ended when it did not fail outright.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LoopStatus {
    Completed,
    RoundLimitExceeded,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AgentEvent {
    /// Emitted for every requested tool before the batch is dispatched.
    ToolStart {
        #[serde(skip_serializing_if = "Option::is_none")]
        call_id: Option<String>,
        tool_name: String,
        arguments: serde_json::Value,
    },

    ToolComplete {
        #[serde(skip_serializing_if = "Option::is_none")]
        call_id: Option<String>,
        tool_name: String,
        result: serde_json::Value,
    },

    ToolError {
        #[serde(skip_serializing_if = "Option::is_none")]
        call_id: Option<String>,
        tool_name: String,
        error: String,
    },

    Complete {
        status: LoopStatus,
        rounds: usize,
    },

    Error {
        message: String,
    },
}

impl AgentEvent {
    pub fn tool_name(&self) -> Option<&str> {
        match self {
            AgentEvent::ToolStart { tool_name, .. }
            | AgentEvent::ToolComplete { tool_name, .. }
            | AgentEvent::ToolError { tool_name, .. } => Some(tool_name),
            AgentEvent::Complete { .. } | AgentEvent::Error { .. } => None,
        }
    }
}
