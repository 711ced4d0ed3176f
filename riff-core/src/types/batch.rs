//! Generation batches - the result of one variant request

use serde::{Deserialize, Serialize};

use crate::{Candidate, CandidateId, Stage};

/// The set of candidates produced for one `(stage, context)` request.
///
/// Candidates are ordered by `overall` score descending, ties broken by
/// generation order. Unless `diversity_incomplete` is set, every pair of
/// candidates satisfies the engine's pairwise dissimilarity guarantee.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationBatch {
    pub stage: Stage,
    /// How many candidates the caller asked for. The delivered batch may be
    /// smaller when slots fail or diversity filtering drops survivors.
    pub requested_count: usize,
    pub candidates: Vec<Candidate>,
    /// Total regeneration calls spent restoring diversity.
    pub regeneration_attempts: u32,
    /// Prior successful candidates injected as worked examples.
    pub context_examples_used: Vec<CandidateId>,
    /// Set when the regeneration budget ran out before the batch could be
    /// made both full and diverse. Never an error condition.
    pub diversity_incomplete: bool,
}

impl GenerationBatch {
    /// The top-ranked candidate, if any survived.
    pub fn best(&self) -> Option<&Candidate> {
        self.candidates.first()
    }

    /// Whether the batch delivered as many candidates as were requested.
    pub fn is_full(&self) -> bool {
        self.candidates.len() >= self.requested_count
    }
}
