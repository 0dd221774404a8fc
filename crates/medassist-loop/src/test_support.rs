//! In-memory sessions and executors for exercising the loop without a network.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::sync::mpsc;

use medassist_core::{
    AgentEvent, BackendError, ConversationSession, ConversationTurn, ToolArguments,
    ToolCallRequest, ToolDescriptor, ToolError, ToolExecutor, ToolRegistry,
};

type Script =
    Box<dyn FnMut(usize, &SessionInput) -> Result<ConversationTurn, BackendError> + Send>;

pub(crate) use medassist_core::SessionInput;

/// Session whose turns come from a closure called with the call index and input.
pub(crate) struct ScriptedSession {
    script: Script,
    inputs: Arc<Mutex<Vec<SessionInput>>>,
    hang_from: Option<usize>,
}

impl ScriptedSession {
    pub(crate) fn new<F>(script: F) -> Self
    where
        F: FnMut(usize, &SessionInput) -> Result<ConversationTurn, BackendError> + Send + 'static,
    {
        Self {
            script: Box::new(script),
            inputs: Arc::default(),
            hang_from: None,
        }
    }

    /// Replays `turns` in order.
    pub(crate) fn from_turns(turns: Vec<ConversationTurn>) -> Self {
        let mut turns = turns.into_iter();
        Self::new(move |call, _| {
            turns
                .next()
                .ok_or_else(|| BackendError::Api(format!("no turn scripted for call {call}")))
        })
    }

    /// Every `advance` from call `index` on never completes.
    pub(crate) fn hang_from(mut self, index: usize) -> Self {
        self.hang_from = Some(index);
        self
    }

    pub(crate) fn inputs(&self) -> Arc<Mutex<Vec<SessionInput>>> {
        Arc::clone(&self.inputs)
    }
}

#[async_trait]
impl ConversationSession for ScriptedSession {
    fn id(&self) -> &str {
        "scripted"
    }

    async fn advance(&mut self, input: SessionInput) -> Result<ConversationTurn, BackendError> {
        let call = {
            let mut inputs = self.inputs.lock().unwrap();
            inputs.push(input.clone());
            inputs.len() - 1
        };
        if self.hang_from.is_some_and(|index| call >= index) {
            std::future::pending::<()>().await;
        }
        (self.script)(call, &input)
    }
}

#[derive(Clone)]
pub(crate) enum Behavior {
    Reply(Value),
    ReplyAfter(Duration, Value),
    Fail(ToolError),
    Panic,
    Hang,
}

/// Executor with per-tool canned behavior that records every invocation.
///
/// When observing an event receiver, each invocation first drains it so tests
/// can see which events were already emitted at dispatch time.
#[derive(Default)]
pub(crate) struct RecordingExecutor {
    behaviors: HashMap<String, Behavior>,
    calls: Mutex<Vec<(String, ToolArguments)>>,
    observer: Option<Mutex<mpsc::Receiver<AgentEvent>>>,
    observed: Mutex<Vec<AgentEvent>>,
}

impl RecordingExecutor {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn on(mut self, name: &str, behavior: Behavior) -> Self {
        self.behaviors.insert(name.to_string(), behavior);
        self
    }

    pub(crate) fn observing(mut self, events: mpsc::Receiver<AgentEvent>) -> Self {
        self.observer = Some(Mutex::new(events));
        self
    }

    pub(crate) fn call_names(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(name, _)| name.clone())
            .collect()
    }

    pub(crate) fn calls(&self) -> Vec<(String, ToolArguments)> {
        self.calls.lock().unwrap().clone()
    }

    /// Events seen by the time of the most recent invocation.
    pub(crate) fn observed(&self) -> Vec<AgentEvent> {
        self.observed.lock().unwrap().clone()
    }

    /// Events emitted after the last invocation, drained from the observed receiver.
    pub(crate) fn drain_remaining(&self) -> Vec<AgentEvent> {
        let mut remaining = Vec::new();
        if let Some(observer) = &self.observer {
            let mut events = observer.lock().unwrap();
            while let Ok(event) = events.try_recv() {
                remaining.push(event);
            }
        }
        remaining
    }

    /// Registry describing every tool with a configured behavior plus `extra` names.
    pub(crate) fn registry(&self, extra: &[&str]) -> ToolRegistry {
        let mut names: Vec<&str> = self.behaviors.keys().map(String::as_str).collect();
        names.sort_unstable();
        names.extend(extra.iter().copied().filter(|name| !self.behaviors.contains_key(*name)));
        ToolRegistry::new(names.into_iter().map(|name| {
            ToolDescriptor::new(name, format!("{name} tool"), json!({"type": "object"}))
        }))
        .unwrap()
    }
}

#[async_trait]
impl ToolExecutor for RecordingExecutor {
    async fn execute(&self, name: &str, arguments: &ToolArguments) -> Result<Value, ToolError> {
        self.calls
            .lock()
            .unwrap()
            .push((name.to_string(), arguments.clone()));
        if let Some(observer) = &self.observer {
            let mut events = observer.lock().unwrap();
            let mut observed = self.observed.lock().unwrap();
            while let Ok(event) = events.try_recv() {
                observed.push(event);
            }
        }

        match self.behaviors.get(name).cloned() {
            Some(Behavior::Reply(value)) => Ok(value),
            Some(Behavior::ReplyAfter(delay, value)) => {
                tokio::time::sleep(delay).await;
                Ok(value)
            }
            Some(Behavior::Fail(error)) => Err(error),
            Some(Behavior::Panic) => panic!("{name} exploded"),
            Some(Behavior::Hang) => std::future::pending().await,
            None => Err(ToolError::NotFound(name.to_string())),
        }
    }
}

pub(crate) fn request(name: &str, arguments: Value) -> ToolCallRequest {
    ToolCallRequest::from_value(name, arguments)
}

pub(crate) fn results_of(input: &SessionInput) -> &[medassist_core::ToolCallResult] {
    match input {
        SessionInput::ToolResults(results) => results,
        SessionInput::UserText(text) => panic!("expected tool results, got user text {text:?}"),
    }
}
