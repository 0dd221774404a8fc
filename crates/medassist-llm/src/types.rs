use medassist_core::ToolCallRequest;

/// One decoded piece of a streamed model turn.
#[derive(Debug, Clone, PartialEq)]
pub enum LLMChunk {
    Token(String),
    ToolCalls(Vec<ToolCallRequest>),
    Done,
}
