//! Conversation and request/response types
//!
//! These model a function-calling chat API (Gemini `generateContent`) but
//! carry no wire details; the client converts them to the provider format.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

/// A completion request - everything needed for one model query
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    /// System instruction
    pub system_prompt: String,

    /// Full conversation so far
    pub messages: Vec<Message>,

    /// Functions the model may call
    pub tools: Vec<ToolDefinition>,

    /// Max tokens for response (from config)
    pub max_tokens: u32,
}

/// Who produced a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
    Tool,
}

/// One piece of a message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Part {
    Text { text: String },
    FunctionCall(FunctionCall),
    FunctionResult(FunctionResult),
}

/// A message in the conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub parts: Vec<Part>,
}

impl Message {
    /// Create a user message with text content
    pub fn user(text: impl Into<String>) -> Self {
        debug!("Message::user: called");
        Self {
            role: Role::User,
            parts: vec![Part::Text { text: text.into() }],
        }
    }

    /// Create a model turn from a response: its text first, then its function calls
    pub fn from_response(response: &CompletionResponse) -> Self {
        debug!(calls = response.function_calls.len(), "Message::from_response: called");
        let mut parts = Vec::with_capacity(response.function_calls.len() + 1);

        if let Some(text) = response.content.as_ref().filter(|t| !t.is_empty()) {
            parts.push(Part::Text { text: text.clone() });
        }
        parts.extend(response.function_calls.iter().cloned().map(Part::FunctionCall));

        Self {
            role: Role::Model,
            parts,
        }
    }

    /// Create a tool message carrying one batch of function results
    pub fn tool_results(results: Vec<FunctionResult>) -> Self {
        debug!(count = results.len(), "Message::tool_results: called");
        Self {
            role: Role::Tool,
            parts: results.into_iter().map(Part::FunctionResult).collect(),
        }
    }

    /// Concatenated text parts, if any
    pub fn text(&self) -> Option<String> {
        let texts: Vec<&str> = self
            .parts
            .iter()
            .filter_map(|p| match p {
                Part::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect();

        if texts.is_empty() { None } else { Some(texts.join("")) }
    }
}

/// Append-only conversation history for one run
#[derive(Debug, Clone, Default)]
pub struct Conversation {
    messages: Vec<Message>,
}

impl Conversation {
    /// Start a conversation with the user's prompt as the first turn
    pub fn seeded(prompt: impl Into<String>) -> Self {
        Self {
            messages: vec![Message::user(prompt)],
        }
    }

    /// Append a message
    pub fn push(&mut self, message: Message) {
        debug!(role = ?message.role, parts = message.parts.len(), "Conversation::push: called");
        self.messages.push(message);
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }
}

/// Response from a completion request
#[derive(Debug, Clone, Default)]
pub struct CompletionResponse {
    /// Text content (if any)
    pub content: Option<String>,

    /// Function calls requested by the model, in order
    pub function_calls: Vec<FunctionCall>,

    /// Token usage reported by the provider
    pub usage: TokenUsage,
}

impl CompletionResponse {
    /// A plain text answer
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: Some(text.into()),
            ..Default::default()
        }
    }

    /// A response requesting the given function calls
    pub fn calls(function_calls: Vec<FunctionCall>) -> Self {
        Self {
            function_calls,
            ..Default::default()
        }
    }

    pub fn has_function_calls(&self) -> bool {
        !self.function_calls.is_empty()
    }
}

/// A function call requested by the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    pub args: Value,
}

impl FunctionCall {
    pub fn new(name: impl Into<String>, args: Value) -> Self {
        Self {
            name: name.into(),
            args,
        }
    }
}

/// Outcome of one function call, fed back to the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionResult {
    pub name: String,
    pub output: String,
    #[serde(default)]
    pub is_error: bool,
}

impl FunctionResult {
    /// Create a successful result
    pub fn success(name: impl Into<String>, output: impl Into<String>) -> Self {
        debug!("FunctionResult::success: called");
        Self {
            name: name.into(),
            output: output.into(),
            is_error: false,
        }
    }

    /// Create an error result
    pub fn error(name: impl Into<String>, output: impl Into<String>) -> Self {
        debug!("FunctionResult::error: called");
        Self {
            name: name.into(),
            output: output.into(),
            is_error: true,
        }
    }
}

/// Token usage for one query
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TokenUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

/// Function declaration offered to the model
#[derive(Debug, Clone, Serialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

impl ToolDefinition {
    /// Create a new tool definition
    pub fn new(name: impl Into<String>, description: impl Into<String>, parameters: Value) -> Self {
        let name = name.into();
        let description = description.into();
        debug!(%name, "ToolDefinition::new: called");
        Self {
            name,
            description,
            parameters,
        }
    }

    /// Convert to a Gemini `functionDeclarations` entry
    pub fn to_gemini_declaration(&self) -> Value {
        debug!(%self.name, "ToolDefinition::to_gemini_declaration: called");
        serde_json::json!({
            "name": self.name,
            "description": self.description,
            "parameters": self.parameters,
        })
    }
}
