//! Error types for the learning layer

use thiserror::Error;

use riff_core::CandidateId;

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, LearnError>;

/// Errors from feedback recording and the similarity index.
#[derive(Debug, Error)]
pub enum LearnError {
    /// Feedback referenced a candidate the registry has never seen.
    #[error("candidate not found: {0}")]
    CandidateNotFound(CandidateId),

    /// A score outside its documented range.
    #[error(transparent)]
    InvalidScore(#[from] riff_core::CoreError),

    /// The similarity index failed an operation.
    #[error("index error: {0}")]
    Index(String),

    /// A scope string that neither `global` nor `owner:` matches.
    #[error("invalid scope: {0}")]
    InvalidScope(String),
}
