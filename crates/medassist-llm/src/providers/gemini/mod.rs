//! Google Gemini provider implementation.

mod stream;

pub use stream::parse_gemini_sse_event;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};

use crate::protocol::gemini::GeminiProtocol;
use crate::provider::{LLMError, LLMProvider, LLMStream, Result};
use medassist_core::{Message, ToolDescriptor};

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";

/// Google Gemini API provider.
pub struct GeminiProvider {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl GeminiProvider {
    /// Create a new Gemini provider with an API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
        }
    }

    /// Set a custom base URL (e.g., for proxies or alternative endpoints).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set the model name (e.g., "gemini-2.0-flash", "gemini-1.5-pro").
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    fn stream_url(&self) -> String {
        format!(
            "{}/models/{}:streamGenerateContent?alt=sse",
            self.base_url, self.model
        )
    }
}

#[async_trait]
impl LLMProvider for GeminiProvider {
    async fn chat_stream(
        &self,
        messages: &[Message],
        tools: &[ToolDescriptor],
    ) -> Result<LLMStream> {
        let request = GeminiProtocol::build_request(messages, tools)?;

        log::debug!(
            "Gemini request: {}",
            serde_json::to_string_pretty(&request).unwrap_or_default()
        );

        // Key goes in a header, never the query string
        let response = self
            .client
            .post(self.stream_url())
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(LLMError::Http)?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.map_err(LLMError::Http)?;

            return Err(match status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => LLMError::Auth(format!(
                    "Gemini authentication failed: {}. Please check your API key.",
                    text
                )),
                StatusCode::TOO_MANY_REQUESTS => LLMError::RateLimited(text),
                _ => LLMError::Api {
                    status: status.as_u16(),
                    message: text,
                },
            });
        }

        log::debug!("Gemini stream started successfully");

        Ok(crate::providers::common::sse::llm_stream_from_sse(
            response,
            parse_gemini_sse_event,
        ))
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
