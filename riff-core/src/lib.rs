//! riff-core - Shared domain types for the riff variant engine
//!
//! This crate holds the data model (candidates, batches, feedback records,
//! learned patterns), the deterministic heuristic scorer, and engine
//! configuration. It performs no I/O; the model and learning layers build
//! on top of it.

pub mod config;
pub mod error;
pub mod score;
pub mod types;

pub use config::EngineConfig;
pub use error::{CoreError, Result};
pub use score::{HeuristicScorer, ScoreBreakdown, ScoreWeights};
pub use types::*;
