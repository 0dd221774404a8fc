use tokio::sync::mpsc::{self, error::TrySendError};
use tokio_util::sync::CancellationToken;

use medassist_core::{
    AgentError, AgentEvent, ConversationSession, ConversationTurn, LoopStatus, SessionInput,
    ToolCallResult, ToolOutcome,
};

use crate::config::AgentLoopConfig;
use crate::dispatcher::Dispatcher;

pub type Result<T> = std::result::Result<T, AgentError>;

/// Final answer of one user submission.
#[derive(Debug, Clone, PartialEq)]
pub struct LoopOutput {
    pub text: String,
    pub status: LoopStatus,
    /// Tool dispatches performed.
    pub rounds: usize,
}

/// Drives one user submission until the backend answers without tool calls.
///
/// Emits `ToolStart` for every request before its batch is dispatched, then
/// `ToolComplete` / `ToolError` per result. Ends with `Complete` on success or
/// `Error` on failure and cancellation. Events still waiting for channel
/// capacity when the turn is cancelled are dropped.
pub async fn run_agent_loop<S>(
    session: &mut S,
    dispatcher: &Dispatcher,
    user_text: String,
    event_tx: &mpsc::Sender<AgentEvent>,
    cancel_token: &CancellationToken,
    config: &AgentLoopConfig,
) -> Result<LoopOutput>
where
    S: ConversationSession + ?Sized,
{
    let session_id = session.id().to_string();
    log::debug!(
        "[{}] Starting agent loop with message: {}",
        session_id,
        user_text
    );

    match drive(session, dispatcher, user_text, event_tx, cancel_token, config).await {
        Ok(output) => {
            log::info!(
                "[{}] Agent loop finished after {} rounds: {:?}",
                session_id,
                output.rounds,
                output.status
            );
            emit(
                event_tx,
                cancel_token,
                AgentEvent::Complete {
                    status: output.status,
                    rounds: output.rounds,
                },
            )
            .await;
            Ok(output)
        }
        Err(error) => {
            log::warn!("[{}] Agent loop failed: {}", session_id, error);
            emit(
                event_tx,
                cancel_token,
                AgentEvent::Error {
                    message: error.to_string(),
                },
            )
            .await;
            Err(error)
        }
    }
}

async fn drive<S>(
    session: &mut S,
    dispatcher: &Dispatcher,
    user_text: String,
    event_tx: &mpsc::Sender<AgentEvent>,
    cancel_token: &CancellationToken,
    config: &AgentLoopConfig,
) -> Result<LoopOutput>
where
    S: ConversationSession + ?Sized,
{
    let mut rounds = 0usize;
    let mut turn = advance(session, SessionInput::UserText(user_text), cancel_token).await?;

    loop {
        if turn.is_terminal() {
            let text = turn
                .text
                .filter(|text| !text.trim().is_empty())
                .unwrap_or_else(|| config.fallback_text.clone());
            return Ok(LoopOutput {
                text,
                status: LoopStatus::Completed,
                rounds,
            });
        }

        if rounds >= config.max_rounds {
            log::warn!(
                "[{}] Round limit of {} reached with {} tool calls still requested",
                session.id(),
                config.max_rounds,
                turn.tool_calls.len()
            );
            return Ok(LoopOutput {
                text: config.round_limit_text.clone(),
                status: LoopStatus::RoundLimitExceeded,
                rounds,
            });
        }
        rounds += 1;

        if let Some(text) = turn.text.as_deref().filter(|text| !text.trim().is_empty()) {
            log::debug!(
                "[{}] Discarding text alongside tool calls: {}",
                session.id(),
                text
            );
        }

        let results = resolve_tools(&turn, dispatcher, event_tx, cancel_token).await?;
        log::debug!(
            "[{}] Round {}: {} tool results",
            session.id(),
            rounds,
            results.len()
        );

        turn = advance(session, SessionInput::ToolResults(results), cancel_token).await?;
    }
}

async fn advance<S>(
    session: &mut S,
    input: SessionInput,
    cancel_token: &CancellationToken,
) -> Result<ConversationTurn>
where
    S: ConversationSession + ?Sized,
{
    if cancel_token.is_cancelled() {
        return Err(AgentError::Cancelled);
    }

    tokio::select! {
        biased;
        _ = cancel_token.cancelled() => Err(AgentError::Cancelled),
        turn = session.advance(input) => turn.map_err(AgentError::from),
    }
}

async fn resolve_tools(
    turn: &ConversationTurn,
    dispatcher: &Dispatcher,
    event_tx: &mpsc::Sender<AgentEvent>,
    cancel_token: &CancellationToken,
) -> Result<Vec<ToolCallResult>> {
    for request in &turn.tool_calls {
        emit(
            event_tx,
            cancel_token,
            AgentEvent::ToolStart {
                call_id: request.call_id.clone(),
                tool_name: request.name.clone(),
                arguments: serde_json::Value::Object(request.arguments.clone()),
            },
        )
        .await;
    }

    let results = tokio::select! {
        biased;
        _ = cancel_token.cancelled() => return Err(AgentError::Cancelled),
        results = dispatcher.execute(&turn.tool_calls) => results,
    };

    for result in &results {
        let event = match &result.outcome {
            ToolOutcome::Success(payload) => AgentEvent::ToolComplete {
                call_id: result.call_id.clone(),
                tool_name: result.name.clone(),
                result: payload.clone(),
            },
            ToolOutcome::Error(error) => AgentEvent::ToolError {
                call_id: result.call_id.clone(),
                tool_name: result.name.clone(),
                error: error.clone(),
            },
        };
        emit(event_tx, cancel_token, event).await;
    }

    Ok(results)
}

/// Delivers `event` unless the receiver is gone or the turn is cancelled
/// while waiting for channel capacity.
async fn emit(
    event_tx: &mpsc::Sender<AgentEvent>,
    cancel_token: &CancellationToken,
    event: AgentEvent,
) {
    let event = match event_tx.try_send(event) {
        Ok(()) | Err(TrySendError::Closed(_)) => return,
        Err(TrySendError::Full(event)) => event,
    };

    tokio::select! {
        biased;
        _ = cancel_token.cancelled() => {
            log::debug!("Dropping agent event: cancelled while the event channel was full");
        }
        _ = event_tx.send(event) => {}
    }
}

#[cfg(test)]
#[path = "runner_tests.rs"]
mod tests;
