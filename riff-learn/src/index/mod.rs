//! Similarity index - nearest-neighbor retrieval over rated candidates
//!
//! The index is specified at its interface so a persistent vector store
//! can slot in behind the trait. Consistency is relaxed by design: a
//! freshly rated candidate becomes retrievable within a short window, not
//! necessarily within the same request, because retrieval is best-effort
//! few-shot context, not a correctness dependency.

mod memory;
mod vector;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use memory::MemoryIndex;
pub use vector::cosine_similarity;

use crate::{Result, Scope};
use riff_core::{CandidateId, Stage};

/// One stored `(embedding, metadata)` pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexEntry {
    pub candidate_id: CandidateId,
    pub embedding: Vec<f32>,
    pub stage: Stage,
    /// Whether the candidate's combined reward cleared the threshold.
    pub performed_well: bool,
    pub scope: Scope,
    /// Flattened content, re-injected verbatim as a worked example.
    pub content_text: String,
    /// The combined reward at index time.
    pub reward: f64,
}

/// Metadata filters applied before the similarity cut.
#[derive(Debug, Clone, Default)]
pub struct IndexFilter {
    pub stage: Option<Stage>,
    pub performed_well: Option<bool>,
    pub scope: Option<Scope>,
    /// Drop hits below this cosine similarity.
    pub min_similarity: Option<f64>,
}

/// One query result, most similar first.
#[derive(Debug, Clone)]
pub struct IndexHit {
    pub candidate_id: CandidateId,
    pub similarity: f64,
    pub stage: Stage,
    pub performed_well: bool,
    pub content_text: String,
}

/// Vector-similarity store over rated candidates.
///
/// Writes come from the feedback learner, reads from the orchestrator's
/// retrieval step; both may be concurrent.
#[async_trait]
pub trait SimilarityIndex: Send + Sync {
    /// Insert or replace the entry for a candidate.
    async fn upsert(&self, entry: IndexEntry) -> Result<()>;

    /// Nearest neighbors of `vector` passing `filter`, best first.
    async fn query(
        &self,
        vector: &[f32],
        filter: &IndexFilter,
        top_k: usize,
    ) -> Result<Vec<IndexHit>>;

    /// Number of stored entries.
    async fn len(&self) -> Result<usize>;
}
