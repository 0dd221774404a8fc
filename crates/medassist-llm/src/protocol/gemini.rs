//! Google Gemini protocol conversion implementation.
//!
//! Gemini API has a unique format:
//! - Messages are called "contents"
//! - Role is "user" or "model" (not "assistant")
//! - Content is an array of "parts"; tool results travel as `functionResponse`
//!   parts in a "user" content
//! - System instructions are separate from messages
//!
//! # Example Gemini Request
//! ```json
//! {
//!   "contents": [
//!     { "role": "user", "parts": [{"text": "What's my heart rate?"}] },
//!     { "role": "model", "parts": [{"functionCall": {"name": "checkVitals", "args": {}}}] },
//!     { "role": "user", "parts": [{"functionResponse": {"name": "checkVitals", "response": {"heartRate": 72}}}] }
//!   ],
//!   "systemInstruction": { "parts": [{"text": "You are a nurse assistant"}] },
//!   "tools": [{ "functionDeclarations": [{"name": "checkVitals", "description": "..."}] }]
//! }
//! ```

use medassist_core::{ConversationTurn, Message, Role, ToolCallRequest, ToolDescriptor};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::protocol::{FromProvider, ProtocolError, ProtocolResult, ToProvider};

/// Gemini protocol converter.
pub struct GeminiProtocol;

impl GeminiProtocol {
    /// Full request body for a history and the session's tool declaration.
    pub fn build_request(
        messages: &[Message],
        tools: &[ToolDescriptor],
    ) -> ProtocolResult<GeminiRequest> {
        let mut request: GeminiRequest = messages.to_provider()?;
        let tools: Vec<GeminiTool> = tools.to_provider()?;
        request.tools = (!tools.is_empty()).then_some(tools);
        Ok(request)
    }
}

// ============================================================================
// Gemini API Types
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeminiRequest {
    pub contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<GeminiTool>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeminiContent {
    /// "user" or "model"; empty for system instructions
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub role: String,
    #[serde(default)]
    pub parts: Vec<GeminiPart>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeminiPart {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Set on reasoning parts emitted by thinking models
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thought: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub function_call: Option<GeminiFunctionCall>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub function_response: Option<GeminiFunctionResponse>,
}

impl GeminiPart {
    fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiFunctionCall {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub args: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiFunctionResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    pub response: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeminiTool {
    pub function_declarations: Vec<GeminiFunctionDeclaration>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiFunctionDeclaration {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Omitted for tools without parameters; Gemini rejects empty object schemas.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeminiResponse {
    #[serde(default)]
    pub candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeminiCandidate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<GeminiContent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,
}

// ============================================================================
// Gemini → Internal (FromProvider)
// ============================================================================

impl FromProvider<GeminiContent> for ConversationTurn {
    fn from_provider(content: GeminiContent) -> ProtocolResult<Self> {
        if !content.role.is_empty() && content.role != "model" {
            return Err(ProtocolError::InvalidRole(content.role));
        }

        let mut text = String::new();
        let mut tool_calls = Vec::new();

        for part in content.parts {
            if let Some(fragment) = part.text {
                if part.thought != Some(true) {
                    text.push_str(&fragment);
                }
            }

            if let Some(call) = part.function_call {
                if call.name.trim().is_empty() {
                    return Err(ProtocolError::InvalidToolCall(
                        "function call without a name".to_string(),
                    ));
                }
                // Gemini may omit call ids; they are passed through untouched
                let request = ToolCallRequest::from_value(call.name, call.args);
                tool_calls.push(match call.id {
                    Some(id) => request.with_call_id(id),
                    None => request,
                });
            }
        }

        Ok(ConversationTurn {
            text: (!text.is_empty()).then_some(text),
            tool_calls,
        })
    }
}

// ============================================================================
// Internal → Gemini (ToProvider)
// ============================================================================

impl ToProvider<GeminiRequest> for [Message] {
    fn to_provider(&self) -> ProtocolResult<GeminiRequest> {
        let mut system_parts = Vec::new();
        let mut contents: Vec<GeminiContent> = Vec::new();
        let mut previous_was_tool = false;

        for msg in self {
            match msg.role {
                Role::System => {
                    system_parts.push(GeminiPart::text(msg.content.clone()));
                    previous_was_tool = false;
                }
                Role::Tool => {
                    let content: GeminiContent = msg.to_provider()?;
                    // Results for one parallel batch belong in a single content
                    match contents.last_mut() {
                        Some(last) if previous_was_tool => last.parts.extend(content.parts),
                        _ => contents.push(content),
                    }
                    previous_was_tool = true;
                }
                Role::User | Role::Assistant => {
                    contents.push(msg.to_provider()?);
                    previous_was_tool = false;
                }
            }
        }

        Ok(GeminiRequest {
            contents,
            system_instruction: (!system_parts.is_empty()).then(|| GeminiContent {
                role: String::new(),
                parts: system_parts,
            }),
            tools: None,
            generation_config: None,
        })
    }
}

impl ToProvider<GeminiContent> for Message {
    fn to_provider(&self) -> ProtocolResult<GeminiContent> {
        if self.role == Role::Tool {
            let result = self
                .tool_result
                .as_ref()
                .ok_or_else(|| ProtocolError::MissingField("tool_result".to_string()))?;

            return Ok(GeminiContent {
                role: "user".to_string(),
                parts: vec![GeminiPart {
                    function_response: Some(GeminiFunctionResponse {
                        id: result.call_id.clone(),
                        name: result.name.clone(),
                        response: result.to_response_value(),
                    }),
                    ..Default::default()
                }],
            });
        }

        let role = match self.role {
            Role::User => "user",
            Role::Assistant => "model",
            Role::System | Role::Tool => {
                return Err(ProtocolError::InvalidRole(format!("{:?}", self.role)))
            }
        };

        let mut parts = Vec::new();

        if !self.content.is_empty() {
            parts.push(GeminiPart::text(self.content.clone()));
        }

        if let Some(tool_calls) = &self.tool_calls {
            for call in tool_calls {
                parts.push(GeminiPart {
                    function_call: Some(GeminiFunctionCall {
                        id: call.call_id.clone(),
                        name: call.name.clone(),
                        args: Value::Object(call.arguments.clone()),
                    }),
                    ..Default::default()
                });
            }
        }

        // Ensure at least one part
        if parts.is_empty() {
            parts.push(GeminiPart::text(String::new()));
        }

        Ok(GeminiContent {
            role: role.to_string(),
            parts,
        })
    }
}

impl ToProvider<GeminiFunctionDeclaration> for ToolDescriptor {
    fn to_provider(&self) -> ProtocolResult<GeminiFunctionDeclaration> {
        let has_properties = self
            .parameters
            .get("properties")
            .and_then(Value::as_object)
            .is_some_and(|properties| !properties.is_empty());

        Ok(GeminiFunctionDeclaration {
            name: self.name.clone(),
            description: (!self.description.is_empty()).then(|| self.description.clone()),
            parameters: has_properties.then(|| self.parameters.clone()),
        })
    }
}

impl ToProvider<Vec<GeminiTool>> for [ToolDescriptor] {
    fn to_provider(&self) -> ProtocolResult<Vec<GeminiTool>> {
        // Gemini groups all function declarations into a single tool
        let declarations = self
            .iter()
            .map(|descriptor| descriptor.to_provider())
            .collect::<ProtocolResult<Vec<GeminiFunctionDeclaration>>>()?;

        if declarations.is_empty() {
            Ok(vec![])
        } else {
            Ok(vec![GeminiTool {
                function_declarations: declarations,
            }])
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use medassist_core::{ToolArguments, ToolCallResult};
    use serde_json::json;

    use super::*;

    fn vitals_descriptor() -> ToolDescriptor {
        ToolDescriptor::new(
            "checkVitals",
            "Read the patient's current vitals",
            json!({"type": "object", "properties": {}}),
        )
    }

    fn schedule_descriptor() -> ToolDescriptor {
        ToolDescriptor::new(
            "scheduleAppointment",
            "Book an appointment",
            json!({
                "type": "object",
                "properties": {"department": {"type": "string"}},
                "required": ["department"]
            }),
        )
    }

    #[test]
    fn test_internal_to_gemini_user_message() {
        let gemini: GeminiContent = Message::user("Hello").to_provider().unwrap();

        assert_eq!(gemini.role, "user");
        assert_eq!(gemini.parts.len(), 1);
        assert_eq!(gemini.parts[0].text, Some("Hello".to_string()));
    }

    #[test]
    fn test_assistant_tool_calls_become_function_calls() {
        let call = ToolCallRequest::from_value("scheduleAppointment", json!({"department": "cardiology"}))
            .with_call_id("call-1");
        let gemini: GeminiContent = Message::assistant("", Some(vec![call])).to_provider().unwrap();

        assert_eq!(gemini.role, "model");
        assert_eq!(gemini.parts.len(), 1);
        let function_call = gemini.parts[0].function_call.as_ref().unwrap();
        assert_eq!(function_call.name, "scheduleAppointment");
        assert_eq!(function_call.id.as_deref(), Some("call-1"));
        assert_eq!(function_call.args, json!({"department": "cardiology"}));
    }

    #[test]
    fn test_system_messages_become_system_instruction() {
        let messages = vec![Message::system("You are a nurse assistant"), Message::user("Hi")];
        let request: GeminiRequest = messages.as_slice().to_provider().unwrap();

        assert_eq!(request.contents.len(), 1);
        let instruction = request.system_instruction.unwrap();
        assert_eq!(
            instruction.parts[0].text.as_deref(),
            Some("You are a nurse assistant")
        );
    }

    #[test]
    fn test_consecutive_tool_results_share_one_content() {
        let vitals = ToolCallRequest::new("checkVitals", ToolArguments::new());
        let search = ToolCallRequest::from_value("searchMedicalDatabase", json!({"query": "flu"}));
        let messages = vec![
            Message::user("How am I?"),
            Message::assistant("", Some(vec![vitals.clone(), search.clone()])),
            Message::tool_result(ToolCallResult::success(&vitals, json!({"heartRate": 72}))),
            Message::tool_result(ToolCallResult::failure(&search, "database offline")),
        ];

        let request: GeminiRequest = messages.as_slice().to_provider().unwrap();

        assert_eq!(request.contents.len(), 3);
        let responses = &request.contents[2];
        assert_eq!(responses.role, "user");
        assert_eq!(responses.parts.len(), 2);
        let first = responses.parts[0].function_response.as_ref().unwrap();
        let second = responses.parts[1].function_response.as_ref().unwrap();
        assert_eq!(first.name, "checkVitals");
        assert_eq!(first.response, json!({"heartRate": 72}));
        assert!(first.id.is_none());
        assert_eq!(second.response, json!({"error": "database offline"}));
    }

    #[test]
    fn test_tool_message_without_result_is_rejected() {
        let mut message = Message::user("x");
        message.role = Role::Tool;

        let result: ProtocolResult<GeminiContent> = message.to_provider();
        assert!(matches!(result, Err(ProtocolError::MissingField(_))));
    }

    #[test]
    fn test_tools_grouped_into_single_declaration_list() {
        let tools = vec![vitals_descriptor(), schedule_descriptor()];
        let gemini: Vec<GeminiTool> = tools.as_slice().to_provider().unwrap();

        assert_eq!(gemini.len(), 1);
        assert_eq!(gemini[0].function_declarations.len(), 2);
        assert!(gemini[0].function_declarations[0].parameters.is_none());
        assert!(gemini[0].function_declarations[1].parameters.is_some());
    }

    #[test]
    fn test_empty_tools_produce_no_declaration() {
        let request = GeminiProtocol::build_request(&[Message::user("Hi")], &[]).unwrap();
        assert!(request.tools.is_none());
    }

    #[test]
    fn test_request_serializes_camel_case() {
        let request =
            GeminiProtocol::build_request(&[Message::system("sys"), Message::user("Hi")], &[vitals_descriptor()])
                .unwrap();
        let value = serde_json::to_value(&request).unwrap();

        assert!(value.get("systemInstruction").is_some());
        assert_eq!(
            value["tools"][0]["functionDeclarations"][0]["name"],
            json!("checkVitals")
        );
    }

    #[test]
    fn test_gemini_content_to_turn() {
        let content: GeminiContent = serde_json::from_value(json!({
            "role": "model",
            "parts": [
                {"text": "Checking", "thought": true},
                {"text": "Let me check."},
                {"functionCall": {"name": "checkVitals", "args": {}}},
                {"functionCall": {"id": "c2", "name": "searchMedicalDatabase", "args": {"query": "fever"}}}
            ]
        }))
        .unwrap();

        let turn = ConversationTurn::from_provider(content).unwrap();

        assert_eq!(turn.text.as_deref(), Some("Let me check."));
        assert_eq!(turn.tool_calls.len(), 2);
        assert!(turn.tool_calls[0].call_id.is_none());
        assert_eq!(turn.tool_calls[1].call_id.as_deref(), Some("c2"));
        assert_eq!(turn.tool_calls[1].arguments["query"], json!("fever"));
    }

    #[test]
    fn test_gemini_content_with_user_role_is_rejected() {
        let content = GeminiContent {
            role: "user".to_string(),
            parts: vec![GeminiPart::text("hi")],
        };

        assert!(matches!(
            ConversationTurn::from_provider(content),
            Err(ProtocolError::InvalidRole(_))
        ));
    }

    #[test]
    fn test_unnamed_function_call_is_rejected() {
        let content: GeminiContent = serde_json::from_value(json!({
            "role": "model",
            "parts": [{"functionCall": {"name": " ", "args": {}}}]
        }))
        .unwrap();

        assert!(matches!(
            ConversationTurn::from_provider(content),
            Err(ProtocolError::InvalidToolCall(_))
        ));
    }
}
