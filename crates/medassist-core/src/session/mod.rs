//! The conversation contract between the orchestration loop and a backend.
//!
//! A [`ConversationSession`] owns its history. The loop only ever hands it new
//! input and reads back the next [`ConversationTurn`].

mod error;

pub use error::BackendError;

use async_trait::async_trait;

use crate::tools::{ToolCallRequest, ToolCallResult};

#[derive(Debug, Clone, PartialEq)]
pub enum SessionInput {
    UserText(String),
    ToolResults(Vec<ToolCallResult>),
}

/// One model turn. Terminal when it requests no tools.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConversationTurn {
    pub text: Option<String>,
    pub tool_calls: Vec<ToolCallRequest>,
}

impl ConversationTurn {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            tool_calls: Vec::new(),
        }
    }

    pub fn tool_calls(tool_calls: Vec<ToolCallRequest>) -> Self {
        Self {
            text: None,
            tool_calls,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.tool_calls.is_empty()
    }
}

#[async_trait]
pub trait ConversationSession: Send {
    fn id(&self) -> &str;

    /// Sends `input` and returns the backend's next turn.
    ///
    /// `UserText` opens a human-initiated turn; every later call in the same
    /// cycle carries the results for the previous turn's tool calls. On error
    /// the history is unchanged.
    async fn advance(&mut self, input: SessionInput) -> Result<ConversationTurn, BackendError>;
}

/// Orders `results` to line up one-to-one with `outstanding`.
///
/// Results carrying a call id are matched by id; the rest fill the requests
/// without an id in order. Names must agree with the request they answer.
pub fn correlate_results(
    outstanding: &[ToolCallRequest],
    results: Vec<ToolCallResult>,
) -> Result<Vec<ToolCallResult>, BackendError> {
    if results.len() != outstanding.len() {
        return Err(BackendError::InvalidInput(format!(
            "expected {} tool results, got {}",
            outstanding.len(),
            results.len()
        )));
    }

    let mut slots: Vec<Option<ToolCallResult>> = vec![None; outstanding.len()];
    let mut anonymous = Vec::new();

    for result in results {
        let Some(call_id) = result.call_id.as_deref() else {
            anonymous.push(result);
            continue;
        };

        if !outstanding
            .iter()
            .any(|request| request.call_id.as_deref() == Some(call_id))
        {
            return Err(BackendError::InvalidInput(format!(
                "no outstanding tool call with id '{call_id}'"
            )));
        }

        // Backends may reuse an id within one turn; each result takes the
        // first open slot with that id, preferring one for the same tool.
        let open = |index: usize, same_name: bool| {
            let request = &outstanding[index];
            slots[index].is_none()
                && request.call_id.as_deref() == Some(call_id)
                && (!same_name || request.name == result.name)
        };
        let position = (0..outstanding.len())
            .find(|&index| open(index, true))
            .or_else(|| (0..outstanding.len()).find(|&index| open(index, false)))
            .ok_or_else(|| {
                BackendError::InvalidInput(format!(
                    "more results than tool calls with id '{call_id}'"
                ))
            })?;
        slots[position] = Some(result);
    }

    let mut anonymous = anonymous.into_iter();
    for (slot, request) in slots.iter_mut().zip(outstanding) {
        if slot.is_some() {
            continue;
        }
        if let Some(call_id) = request.call_id.as_deref() {
            return Err(BackendError::InvalidInput(format!(
                "missing result for tool call id '{call_id}'"
            )));
        }
        *slot = anonymous.next();
    }

    let mut ordered = Vec::with_capacity(slots.len());
    for (slot, request) in slots.into_iter().zip(outstanding) {
        let result = slot.ok_or_else(|| {
            BackendError::InvalidInput(format!("missing result for tool '{}'", request.name))
        })?;
        if result.name != request.name {
            return Err(BackendError::InvalidInput(format!(
                "result for '{}' does not answer request for '{}'",
                result.name, request.name
            )));
        }
        ordered.push(result);
    }

    Ok(ordered)
}
