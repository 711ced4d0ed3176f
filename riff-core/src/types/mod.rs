//! Domain types for the riff variant engine

mod batch;
mod candidate;
mod feedback;
mod pattern;
mod stage;

pub use batch::GenerationBatch;
pub use candidate::{flatten_text, Candidate, CandidateId};
pub use feedback::FeedbackRecord;
pub use pattern::{LearnedPattern, PatternKey, PATTERN_KEY_VERSION};
pub use stage::{Complexity, Stage};
