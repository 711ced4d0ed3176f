//! Diversity enforcement over candidate batches
//!
//! Two passes with two thresholds. The high-similarity pass (default
//! 0.85) runs mid-batch and decides which slots go back for
//! regeneration; the strict pass (default similarity <= 0.70) runs at the
//! end and is the published pairwise guarantee on the returned batch.
//!
//! Both passes are greedy in generation order: earlier candidates are
//! anchors, later ones are rejected on conflict. Each run is a fresh
//! computation over a local similarity matrix; nothing is shared across
//! concurrent batches.

use riff_core::config::DiversityConfig;
use riff_learn::index::cosine_similarity;

/// Indices of candidates kept and rejected by a filter pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterOutcome {
    pub accepted: Vec<usize>,
    pub rejected: Vec<usize>,
}

/// Enforces pairwise dissimilarity within a batch.
#[derive(Debug, Clone)]
pub struct DiversityEnforcer {
    config: DiversityConfig,
}

impl DiversityEnforcer {
    pub fn new(config: DiversityConfig) -> Self {
        Self { config }
    }

    /// Mid-batch pass against the high-similarity threshold. Rejected
    /// indices are candidates for regeneration.
    pub fn filter(&self, embeddings: &[Vec<f32>]) -> FilterOutcome {
        greedy_filter(embeddings, self.config.high_similarity_threshold)
    }

    /// End-of-batch pass against the strict threshold; survivors carry
    /// the published dissimilarity guarantee.
    pub fn finalize(&self, embeddings: &[Vec<f32>]) -> FilterOutcome {
        greedy_filter(embeddings, self.config.strict_threshold())
    }

    /// Would a fresh candidate pass the mid-batch check against the
    /// already-accepted anchors?
    pub fn accepts(&self, anchors: &[Vec<f32>], candidate: &[f32]) -> bool {
        anchors
            .iter()
            .all(|anchor| cosine_similarity(anchor, candidate) <= self.config.high_similarity_threshold)
    }
}

/// Greedy accept in input order: a candidate is rejected if its similarity
/// to any already-accepted candidate exceeds `threshold`. O(n^2), fine at
/// batch sizes of 2-5.
fn greedy_filter(embeddings: &[Vec<f32>], threshold: f64) -> FilterOutcome {
    let mut accepted: Vec<usize> = Vec::with_capacity(embeddings.len());
    let mut rejected: Vec<usize> = Vec::new();
    for (i, embedding) in embeddings.iter().enumerate() {
        let conflicts = accepted
            .iter()
            .any(|&a| cosine_similarity(&embeddings[a], embedding) > threshold);
        if conflicts {
            rejected.push(i);
        } else {
            accepted.push(i);
        }
    }
    FilterOutcome { accepted, rejected }
}
