use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;

use medassist_core::{AgentError, AgentEvent, ConversationSession};
use medassist_llm::{ChatSession, Config, GeminiProvider, LLMProvider};
use medassist_tools::BuiltinToolExecutor;

use crate::config::AgentLoopConfig;
use crate::dispatcher::Dispatcher;
use crate::runner::{run_agent_loop, LoopOutput, Result};

/// One conversation: a session plus the tools it may call.
///
/// Submissions are serialised; a second `submit` waits for the first to finish.
pub struct Conversation {
    session: Mutex<Box<dyn ConversationSession>>,
    dispatcher: Dispatcher,
    config: AgentLoopConfig,
}

impl Conversation {
    pub fn builder(config: Config) -> ConversationBuilder {
        ConversationBuilder::new(config)
    }

    pub fn from_parts(
        session: Box<dyn ConversationSession>,
        dispatcher: Dispatcher,
        config: AgentLoopConfig,
    ) -> Self {
        Self {
            session: Mutex::new(session),
            dispatcher,
            config,
        }
    }

    pub async fn session_id(&self) -> String {
        self.session.lock().await.id().to_string()
    }

    pub fn loop_config(&self) -> &AgentLoopConfig {
        &self.config
    }

    pub async fn submit(
        &self,
        user_text: impl Into<String>,
        event_tx: &mpsc::Sender<AgentEvent>,
        cancel_token: &CancellationToken,
    ) -> Result<LoopOutput> {
        let mut session = self.session.lock().await;
        run_agent_loop(
            session.as_mut(),
            &self.dispatcher,
            user_text.into(),
            event_tx,
            cancel_token,
            &self.config,
        )
        .await
    }
}

/// Wires a Gemini-backed [`Conversation`] from [`Config`].
pub struct ConversationBuilder {
    config: Config,
    provider: Option<Arc<dyn LLMProvider>>,
    tools: Option<BuiltinToolExecutor>,
}

impl ConversationBuilder {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            provider: None,
            tools: None,
        }
    }

    /// Uses `provider` instead of a Gemini provider built from the config.
    pub fn with_provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Replaces the built-in tool set.
    pub fn with_tools(mut self, tools: BuiltinToolExecutor) -> Self {
        self.tools = Some(tools);
        self
    }

    pub fn build(self) -> Result<Conversation> {
        let tools = self.tools.unwrap_or_default();
        let registry = Arc::new(
            tools
                .registry()
                .map_err(|e| AgentError::Configuration(e.to_string()))?,
        );

        let provider = match self.provider {
            Some(provider) => provider,
            None => {
                let api_key = self
                    .config
                    .require_api_key()
                    .map_err(|e| AgentError::Configuration(e.to_string()))?;
                Arc::new(
                    GeminiProvider::new(api_key)
                        .with_base_url(self.config.api_base())
                        .with_model(self.config.model()),
                ) as Arc<dyn LLMProvider>
            }
        };

        let session = ChatSession::new(provider, &registry)
            .with_system_prompt(self.config.system_prompt())
            .with_request_timeout(self.config.request_timeout());
        log::info!(
            "[{}] Conversation created with {} tools",
            session.id(),
            registry.len()
        );

        let loop_config = AgentLoopConfig::from(&self.config);
        let dispatcher =
            Dispatcher::new(registry, Arc::new(tools)).with_timeout(loop_config.tool_timeout);

        Ok(Conversation::from_parts(
            Box::new(session),
            dispatcher,
            loop_config,
        ))
    }
}
