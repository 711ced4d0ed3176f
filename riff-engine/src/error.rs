//! Error types for riff-engine
//!
//! Availability failures never reach the caller as errors: slots drop,
//! batches shrink, and `diversity_incomplete` flags degraded outcomes.
//! What remains is invalid input and genuinely fatal upstream failures.

use thiserror::Error;

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, EngineError>;

/// Top-level error type for the engine facade.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The request itself is malformed (bad stage, zero count).
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Model layer error.
    #[error("model error: {0}")]
    Model(#[from] riff_models::Error),

    /// Learning layer error.
    #[error("learning error: {0}")]
    Learn(#[from] riff_learn::LearnError),

    /// Core type error.
    #[error("core error: {0}")]
    Core(#[from] riff_core::CoreError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_request_displays_reason() {
        let err = EngineError::InvalidRequest("requested_count must be at least 1".to_string());
        assert!(err.to_string().contains("at least 1"));
    }

    #[test]
    fn converts_from_model_error() {
        let model_err = riff_models::Error::InvalidRequest("empty prompt".to_string());
        let err: EngineError = model_err.into();
        assert!(matches!(err, EngineError::Model(_)));
    }

    #[test]
    fn converts_from_learn_error() {
        let learn_err = riff_learn::LearnError::Index("write failed".to_string());
        let err: EngineError = learn_err.into();
        assert!(matches!(err, EngineError::Learn(_)));
    }

    #[test]
    fn converts_from_core_error() {
        let core_err = riff_core::CoreError::UnknownStage("draft".to_string());
        let err: EngineError = core_err.into();
        assert!(err.to_string().contains("draft"));
    }
}
