//! Error types for riff-core

use thiserror::Error;

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Errors from core type construction and configuration.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A stage name that no variant of [`crate::Stage`] matches.
    #[error("unknown stage: {0}")]
    UnknownStage(String),

    /// A numeric input outside its documented range.
    #[error("{field} out of range: {value} (expected {expected})")]
    OutOfRange {
        field: &'static str,
        value: f64,
        expected: &'static str,
    },

    /// Configuration failed to parse.
    #[error("config error: {0}")]
    Config(#[from] toml::de::Error),
}
