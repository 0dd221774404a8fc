use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use futures::FutureExt;
use serde_json::Value;

use medassist_core::{ToolCallRequest, ToolCallResult, ToolError, ToolExecutor, ToolRegistry};

use crate::config::DEFAULT_TOOL_TIMEOUT;

/// Resolves a batch of tool-call requests into results.
///
/// Every request yields exactly one result, in request order. Unknown names,
/// executor errors, timeouts and panics all become error-bearing results.
pub struct Dispatcher {
    registry: Arc<ToolRegistry>,
    executor: Arc<dyn ToolExecutor>,
    timeout: Duration,
}

impl Dispatcher {
    pub fn new(registry: Arc<ToolRegistry>, executor: Arc<dyn ToolExecutor>) -> Self {
        Self {
            registry,
            executor,
            timeout: DEFAULT_TOOL_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Runs all requests concurrently.
    pub async fn execute(&self, requests: &[ToolCallRequest]) -> Vec<ToolCallResult> {
        join_all(requests.iter().map(|request| self.execute_one(request))).await
    }

    async fn execute_one(&self, request: &ToolCallRequest) -> ToolCallResult {
        match self.invoke(request).await {
            Ok(payload) => {
                log::debug!("Tool {} completed", request.name);
                ToolCallResult::success(request, payload)
            }
            Err(error) => {
                log::warn!("Tool {} failed: {}", request.name, error);
                ToolCallResult::failure(request, error.to_string())
            }
        }
    }

    async fn invoke(&self, request: &ToolCallRequest) -> Result<Value, ToolError> {
        if !self.registry.contains(&request.name) {
            return Err(ToolError::NotFound(request.name.clone()));
        }

        let call = AssertUnwindSafe(self.executor.execute(&request.name, &request.arguments))
            .catch_unwind();

        match tokio::time::timeout(self.timeout, call).await {
            Ok(Ok(result)) => result,
            Ok(Err(_panic)) => Err(ToolError::Execution(format!(
                "tool '{}' crashed",
                request.name
            ))),
            Err(_) => Err(ToolError::Timeout {
                name: request.name.clone(),
                timeout: self.timeout,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::test_support::{request, Behavior, RecordingExecutor};

    fn dispatcher(executor: RecordingExecutor, extra: &[&str]) -> (Dispatcher, Arc<RecordingExecutor>) {
        let registry = Arc::new(executor.registry(extra));
        let executor = Arc::new(executor);
        (Dispatcher::new(registry, executor.clone()), executor)
    }

    #[tokio::test]
    async fn results_follow_request_order_not_completion_order() {
        let (dispatcher, _) = dispatcher(
            RecordingExecutor::new()
                .on("slow", Behavior::ReplyAfter(Duration::from_millis(60), json!({"n": 1})))
                .on("fast", Behavior::Reply(json!({"n": 2}))),
            &[],
        );
        let requests = vec![
            request("slow", json!({})).with_call_id("a"),
            request("fast", json!({})).with_call_id("b"),
        ];

        let results = dispatcher.execute(&requests).await;

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].call_id.as_deref(), Some("a"));
        assert_eq!(results[0].payload(), Some(&json!({"n": 1})));
        assert_eq!(results[1].call_id.as_deref(), Some("b"));
        assert_eq!(results[1].payload(), Some(&json!({"n": 2})));
    }

    #[tokio::test]
    async fn requests_run_concurrently() {
        let (dispatcher, _) = dispatcher(
            RecordingExecutor::new()
                .on("a", Behavior::ReplyAfter(Duration::from_millis(200), json!(1)))
                .on("b", Behavior::ReplyAfter(Duration::from_millis(200), json!(2))),
            &[],
        );

        let started = std::time::Instant::now();
        let results = dispatcher
            .execute(&[request("a", json!({})), request("b", json!({}))])
            .await;

        assert!(results.iter().all(ToolCallResult::is_success));
        assert!(started.elapsed() < Duration::from_millis(390));
    }

    #[tokio::test]
    async fn unknown_tool_is_never_invoked() {
        let (dispatcher, executor) = dispatcher(
            RecordingExecutor::new().on("checkVitals", Behavior::Reply(json!({}))),
            &[],
        );

        let results = dispatcher
            .execute(&[
                request("prescribeMedication", json!({"drug": "x"})),
                request("checkVitals", json!({})),
            ])
            .await;

        assert_eq!(results[0].name, "prescribeMedication");
        assert!(results[0].error().unwrap().contains("Unknown tool"));
        assert!(results[1].is_success());
        assert_eq!(executor.call_names(), vec!["checkVitals".to_string()]);
    }

    #[tokio::test]
    async fn one_failure_does_not_affect_siblings() {
        let (dispatcher, _) = dispatcher(
            RecordingExecutor::new()
                .on(
                    "broken",
                    Behavior::Fail(ToolError::Execution("database offline".to_string())),
                )
                .on("fine", Behavior::Reply(json!({"ok": true}))),
            &[],
        );

        let results = dispatcher
            .execute(&[request("broken", json!({})), request("fine", json!({}))])
            .await;

        assert_eq!(
            results[0].error(),
            Some("Execution failed: database offline")
        );
        assert_eq!(results[1].payload(), Some(&json!({"ok": true})));
    }

    #[tokio::test]
    async fn slow_tool_times_out() {
        let (dispatcher, _) = dispatcher(
            RecordingExecutor::new()
                .on("stuck", Behavior::Hang)
                .on("fine", Behavior::Reply(json!({}))),
            &[],
        );
        let dispatcher = dispatcher.with_timeout(Duration::from_millis(30));

        let results = dispatcher
            .execute(&[request("stuck", json!({})), request("fine", json!({}))])
            .await;

        assert!(results[0].error().unwrap().contains("timed out"));
        assert!(results[1].is_success());
    }

    #[tokio::test]
    async fn panicking_tool_becomes_error_result() {
        let (dispatcher, _) = dispatcher(
            RecordingExecutor::new()
                .on("volatile", Behavior::Panic)
                .on("fine", Behavior::Reply(json!({}))),
            &[],
        );

        let results = dispatcher
            .execute(&[request("volatile", json!({})), request("fine", json!({}))])
            .await;

        assert!(results[0].error().unwrap().contains("crashed"));
        assert!(results[1].is_success());
    }

    #[tokio::test]
    async fn missing_arguments_are_left_to_the_executor() {
        let (dispatcher, executor) = dispatcher(
            RecordingExecutor::new().on(
                "searchMedicalDatabase",
                Behavior::Fail(ToolError::InvalidArguments("missing field `query`".to_string())),
            ),
            &[],
        );

        let results = dispatcher
            .execute(&[request("searchMedicalDatabase", json!({}))])
            .await;

        assert_eq!(executor.call_names().len(), 1);
        assert!(results[0].error().unwrap().contains("query"));
    }

    #[tokio::test]
    async fn empty_batch_yields_no_results() {
        let (dispatcher, executor) = dispatcher(RecordingExecutor::new(), &["checkVitals"]);
        assert!(dispatcher.execute(&[]).await.is_empty());
        assert!(executor.calls().is_empty());
    }
}
