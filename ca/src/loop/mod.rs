//! Conversation loop module for codeagent
//!
//! prompt → model → function calls → results → model ... until the model
//! answers in plain text or the round cap is reached.

mod engine;

pub use engine::{ConversationLoop, LoopEvent, LoopOutcome, LoopState};
