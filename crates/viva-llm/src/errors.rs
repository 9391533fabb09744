//! LLM adapter error types.

use thiserror::Error;

/// Errors from generation and evaluation calls.
#[derive(Debug, Error)]
pub enum LlmError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Provider returned an API error.
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Error description.
        message: String,
    },

    /// The model produced output that does not match the expected shape.
    #[error("Invalid model response: {0}")]
    InvalidResponse(String),

    /// The request exceeded the configured timeout.
    #[error("Generation timed out after {timeout_ms}ms")]
    Timeout {
        /// Configured timeout in milliseconds.
        timeout_ms: u64,
    },
}

/// Result alias for LLM operations.
pub type Result<T> = std::result::Result<T, LlmError>;

impl From<LlmError> for viva_core::VivaError {
    fn from(err: LlmError) -> Self {
        Self::GenerationFailure(err.to_string())
    }
}
