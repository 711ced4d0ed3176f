//! Error types for model operations
//!
//! The retryable-vs-fatal split drives the router's fallback policy: a
//! retryable failure backs off and retries, then walks the tier's fallback
//! chain; a fatal failure surfaces immediately.

use thiserror::Error;

use riff_core::Complexity;

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors from model providers and routing.
#[derive(Debug, Error)]
pub enum Error {
    /// Backend asked us to slow down.
    #[error("rate limited by {model}")]
    RateLimited { model: String },

    /// The call exceeded its deadline.
    #[error("call to {model} timed out")]
    Timeout { model: String },

    /// Backend is temporarily unavailable.
    #[error("{model} unavailable: {reason}")]
    Unavailable { model: String, reason: String },

    /// Transport-level failure.
    #[error("request failed: {0}")]
    Request(String),

    /// The request itself is malformed; retrying cannot help.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Backend refused the content.
    #[error("policy rejection from {model}: {reason}")]
    PolicyRejection { model: String, reason: String },

    /// Every model in the tier's chain failed.
    #[error("all models exhausted for tier {tier}")]
    Exhausted { tier: Complexity },

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Whether the router should back off and retry (same model, then
    /// fallback chain) rather than surface this error.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Error::RateLimited { .. }
                | Error::Timeout { .. }
                | Error::Unavailable { .. }
                | Error::Request(_)
        )
    }
}
