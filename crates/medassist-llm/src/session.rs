use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;

use medassist_core::{
    correlate_results, BackendError, ConversationSession, ConversationTurn, Message, Role,
    Session, SessionInput, ToolCallRequest, ToolCallResult, ToolDescriptor, ToolRegistry,
};

use crate::provider::{LLMError, LLMProvider, LLMStream};
use crate::types::LLMChunk;

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);
const INTERRUPTED_TOOL_CALL: &str = "tool call was cancelled before it completed";

/// A conversation with an [`LLMProvider`].
///
/// The history is committed only after the backend delivered a complete
/// turn, so a failed, timed-out or dropped `advance` leaves it untouched.
pub struct ChatSession {
    session: Session,
    provider: Arc<dyn LLMProvider>,
    tools: Vec<ToolDescriptor>,
    outstanding: Vec<ToolCallRequest>,
    request_timeout: Duration,
}

impl ChatSession {
    /// Tools are declared once here and sent unchanged with every request.
    pub fn new(provider: Arc<dyn LLMProvider>, registry: &ToolRegistry) -> Self {
        Self {
            session: Session::with_generated_id(),
            provider,
            tools: registry.describe().to_vec(),
            outstanding: Vec::new(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        let prompt = prompt.into();
        if !prompt.trim().is_empty() {
            self.session
                .messages
                .retain(|message| message.role != Role::System);
            self.session.messages.insert(0, Message::system(prompt));
        }
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn history(&self) -> &[Message] {
        self.session.messages()
    }

    pub fn history_len(&self) -> usize {
        self.session.len()
    }

    /// Requests from the last turn that still await results.
    pub fn outstanding(&self) -> &[ToolCallRequest] {
        &self.outstanding
    }

    fn pending_messages(&self, input: SessionInput) -> Result<Vec<Message>, BackendError> {
        match input {
            SessionInput::UserText(text) => {
                let mut pending: Vec<Message> = self
                    .outstanding
                    .iter()
                    .map(|request| {
                        Message::tool_result(ToolCallResult::failure(
                            request,
                            INTERRUPTED_TOOL_CALL,
                        ))
                    })
                    .collect();
                if !pending.is_empty() {
                    log::info!(
                        "[{}] Closing {} unanswered tool calls before new user input",
                        self.session.id,
                        pending.len()
                    );
                }
                pending.push(Message::user(text));
                Ok(pending)
            }
            SessionInput::ToolResults(results) => {
                if self.outstanding.is_empty() {
                    return Err(BackendError::InvalidInput(
                        "no tool calls are awaiting results".to_string(),
                    ));
                }
                let ordered = correlate_results(&self.outstanding, results)?;
                Ok(ordered.into_iter().map(Message::tool_result).collect())
            }
        }
    }

    async fn request_turn(&self, messages: &[Message]) -> Result<ConversationTurn, LLMError> {
        let stream = self.provider.chat_stream(messages, &self.tools).await?;
        consume_llm_stream(stream, &self.session.id).await
    }
}

#[async_trait]
impl ConversationSession for ChatSession {
    fn id(&self) -> &str {
        &self.session.id
    }

    async fn advance(&mut self, input: SessionInput) -> Result<ConversationTurn, BackendError> {
        let pending = self.pending_messages(input)?;

        let mut request = Vec::with_capacity(self.session.len() + pending.len());
        request.extend_from_slice(self.session.messages());
        request.extend(pending.iter().cloned());

        log::debug!(
            "[{}] Requesting turn from {} with {} messages",
            self.session.id,
            self.provider.model_name(),
            request.len()
        );

        let turn = match tokio::time::timeout(self.request_timeout, self.request_turn(&request))
            .await
        {
            Ok(Ok(turn)) => turn,
            Ok(Err(error)) => {
                log::warn!("[{}] Backend request failed: {}", self.session.id, error);
                return Err(error.into());
            }
            Err(_) => {
                log::warn!(
                    "[{}] Backend request timed out after {:?}",
                    self.session.id,
                    self.request_timeout
                );
                return Err(BackendError::Timeout(self.request_timeout));
            }
        };

        self.session.extend_messages(pending);
        self.session.add_message(Message::assistant(
            turn.text.clone().unwrap_or_default(),
            Some(turn.tool_calls.clone()),
        ));
        self.outstanding = turn.tool_calls.clone();

        log::debug!(
            "[{}] Turn received: {} tool calls, text: {}",
            self.session.id,
            turn.tool_calls.len(),
            turn.text.is_some()
        );

        Ok(turn)
    }
}

/// Drains a provider stream into one [`ConversationTurn`].
pub async fn consume_llm_stream(
    mut stream: LLMStream,
    session_id: &str,
) -> Result<ConversationTurn, LLMError> {
    let mut content = String::new();
    let mut tool_calls = Vec::new();

    while let Some(chunk_result) = stream.next().await {
        match chunk_result? {
            LLMChunk::Token(token) => content.push_str(&token),
            LLMChunk::ToolCalls(calls) => {
                log::debug!("[{}] Received {} tool calls", session_id, calls.len());
                tool_calls.extend(calls);
            }
            LLMChunk::Done => {
                log::debug!("[{}] LLM stream completed", session_id);
                break;
            }
        }
    }

    Ok(ConversationTurn {
        text: (!content.is_empty()).then_some(content),
        tool_calls,
    })
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
