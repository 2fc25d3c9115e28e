//! ModelClient trait definition

use async_trait::async_trait;

use super::{CompletionRequest, CompletionResponse, LlmError};

/// Stateless model client - the caller owns and resends the whole conversation
///
/// Transport, authentication and retry policy live behind this trait; the
/// conversation loop only sees requests and responses.
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Send a single completion request (blocking until complete)
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError>;
}
