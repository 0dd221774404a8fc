//! Gemini SSE stream parser.
//!
//! Gemini uses a simple SSE format where each event is a JSON response object:
//! ```text
//! data: {"candidates":[{"content":{"parts":[{"text":"Hello"}],"role":"model"}}]}
//!
//! data: {"candidates":[{"content":{"parts":[{"functionCall":{"name":"checkVitals","args":{}}}],"role":"model"}}]}
//! ```

use serde_json::Value;

use crate::protocol::gemini::GeminiResponse;
use crate::protocol::FromProvider;
use crate::provider::{LLMError, Result};
use crate::types::LLMChunk;
use medassist_core::ConversationTurn;

/// Parse a single Gemini SSE event into the chunks it carries.
///
/// Gemini sends JSON objects as data, not named events, so `_event_type` is
/// ignored. A single event may carry both text and function calls; text is
/// emitted first. Events without content (usage metadata, finish markers)
/// yield no chunks.
pub fn parse_gemini_sse_event(_event_type: &str, data: &str) -> Result<Vec<LLMChunk>> {
    let data = data.trim();

    if data.is_empty() {
        return Ok(Vec::new());
    }

    if data == "[DONE]" {
        return Ok(vec![LLMChunk::Done]);
    }

    let value: Value = serde_json::from_str(data).map_err(|e| {
        LLMError::Stream(format!("Failed to parse Gemini SSE data: {}: {}", e, data))
    })?;

    if let Some(error) = value.get("error") {
        let message = error
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("Unknown Gemini API error");
        let status = error
            .get("code")
            .and_then(Value::as_u64)
            .and_then(|code| u16::try_from(code).ok())
            .unwrap_or(500);
        return Err(match status {
            429 => LLMError::RateLimited(message.to_string()),
            401 | 403 => LLMError::Auth(message.to_string()),
            _ => LLMError::Api {
                status,
                message: message.to_string(),
            },
        });
    }

    if value.get("candidates").is_none() && value.get("usageMetadata").is_none() {
        return Err(LLMError::Stream(format!(
            "Missing candidates in Gemini response: {}",
            data
        )));
    }

    let response: GeminiResponse = serde_json::from_value(value)
        .map_err(|e| LLMError::Stream(format!("Unexpected Gemini response shape: {}", e)))?;

    // Gemini returns a single candidate unless asked otherwise
    let Some(content) = response
        .candidates
        .into_iter()
        .next()
        .and_then(|candidate| candidate.content)
    else {
        return Ok(Vec::new());
    };

    let turn = ConversationTurn::from_provider(content)?;

    let mut chunks = Vec::new();
    if let Some(text) = turn.text {
        chunks.push(LLMChunk::Token(text));
    }
    if !turn.tool_calls.is_empty() {
        chunks.push(LLMChunk::ToolCalls(turn.tool_calls));
    }
    Ok(chunks)
}
