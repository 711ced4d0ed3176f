//! riff-engine - Variant generation orchestration
//!
//! Coordinates the model router, similarity retrieval, diversity
//! enforcement, and heuristic scoring into ranked candidate batches, and
//! exposes the engine facade collaborators call: `generate_batch`,
//! `record_user_score`, `record_outcome`, `pattern_stats`.

pub mod diversity;
pub mod engine;
pub mod error;
pub mod orchestrator;
pub mod prompt;

pub use diversity::{DiversityEnforcer, FilterOutcome};
pub use engine::{Engine, EngineBuilder};
pub use error::{EngineError, Result};
pub use orchestrator::Orchestrator;
pub use prompt::{PromptAssembler, WorkedExample};
