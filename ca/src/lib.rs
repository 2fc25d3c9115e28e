//! codeagent - one-shot coding assistant with sandboxed function calling
//!
//! A single prompt is sent to the model together with a fixed set of
//! function declarations. Whenever the model asks for one of those functions
//! the call is executed locally, confined to one working directory, and the
//! result is fed back until the model produces a final answer or the round
//! cap is reached.
//!
//! # Modules
//!
//! - [`llm`] - ModelClient trait, conversation types and the Gemini client
//! - [`tools`] - PathSandbox, ToolRegistry and the four builtin functions
//! - [`r#loop`] - Conversation loop engine
//! - [`prompts`] - Embedded system prompt
//! - [`config`] - Configuration types and loading
//! - [`cli`] - Command-line interface

pub mod cli;
pub mod config;
pub mod llm;
pub mod prompts;
pub mod tools;

// Note: 'loop' is a reserved keyword, so we use r#loop
#[path = "loop/mod.rs"]
pub mod r#loop;

// Re-export commonly used types
pub use config::{Config, ExecutionLimits, LlmConfig, SandboxConfig};
pub use llm::{
    CompletionRequest, CompletionResponse, Conversation, FunctionCall, FunctionResult, GeminiClient, LlmError,
    Message, ModelClient, Part, Role, TokenUsage, ToolDefinition, create_client,
};
pub use r#loop::{ConversationLoop, LoopEvent, LoopOutcome, LoopState};
pub use tools::{Operation, PathSandbox, ScriptSettings, ToolContext, ToolError, ToolRegistry};
