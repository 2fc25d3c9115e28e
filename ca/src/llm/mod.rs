//! Model client module for codeagent
//!
//! Provides the stateless completion interface and the Gemini implementation.

use std::sync::Arc;

use tracing::debug;

pub mod client;
mod error;
mod gemini;
mod types;

pub use client::ModelClient;
pub use error::LlmError;
pub use gemini::GeminiClient;
pub use types::{
    CompletionRequest, CompletionResponse, Conversation, FunctionCall, FunctionResult, Message, Part, Role,
    TokenUsage, ToolDefinition,
};

use crate::config::LlmConfig;

/// Create a model client from config
///
/// Reads the API key from the configured environment variable.
pub fn create_client(config: &LlmConfig) -> Result<Arc<dyn ModelClient>, LlmError> {
    debug!(model = %config.model, "create_client: called");
    Ok(Arc::new(GeminiClient::from_config(config)?))
}
