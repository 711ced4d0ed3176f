//! riff-learn - The feedback-driven learning loop
//!
//! Stores rated candidates in a similarity index for future few-shot
//! retrieval, and maintains per-pattern running statistics keyed by
//! feature signatures extracted from candidates. Writes come from the
//! feedback learner; the orchestrator reads at generation time.

pub mod error;
pub mod feedback;
pub mod index;
pub mod patterns;
pub mod registry;
pub mod scope;

pub use error::{LearnError, Result};
pub use feedback::FeedbackLearner;
pub use index::{IndexEntry, IndexFilter, IndexHit, MemoryIndex, SimilarityIndex};
pub use patterns::PatternStore;
pub use registry::CandidateRegistry;
pub use scope::Scope;
