//! LLM error types

use std::time::Duration;
use thiserror::Error;

/// Errors that can occur during LLM operations
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Rate limited, retry after {retry_after:?}")]
    RateLimited { retry_after: Duration },

    #[error("API error {status}: {message}")]
    ApiError { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl LlmError {
    /// Whether the client should retry the request after a backoff
    ///
    /// Rate limits are not retried here: the caller gets `RateLimited` with
    /// the server's retry-after instead.
    pub fn is_retryable(&self) -> bool {
        match self {
            LlmError::ApiError { status, .. } => matches!(status, 408 | 500 | 502 | 503 | 504),
            LlmError::Network(_) => true,
            LlmError::RateLimited { .. } | LlmError::InvalidResponse(_) | LlmError::Json(_) => false,
        }
    }
}
