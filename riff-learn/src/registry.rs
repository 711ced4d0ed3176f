//! Candidate registry - resolves feedback events to candidates

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use riff_core::{Candidate, CandidateId};

/// Shared id-to-candidate map.
///
/// The orchestrator registers every delivered candidate; the feedback
/// learner resolves rating events against it. Candidates are immutable
/// once registered, so lookups hand out clones.
#[derive(Debug, Default)]
pub struct CandidateRegistry {
    candidates: Arc<RwLock<HashMap<CandidateId, Candidate>>>,
}

impl CandidateRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a delivered candidate.
    pub async fn register(&self, candidate: Candidate) {
        self.candidates
            .write()
            .await
            .insert(candidate.id, candidate);
    }

    /// Register every candidate in a batch.
    pub async fn register_all(&self, candidates: &[Candidate]) {
        let mut map = self.candidates.write().await;
        for candidate in candidates {
            map.insert(candidate.id, candidate.clone());
        }
    }

    /// Look up a candidate by id.
    pub async fn get(&self, id: CandidateId) -> Option<Candidate> {
        self.candidates.read().await.get(&id).cloned()
    }

    /// Number of registered candidates.
    pub async fn len(&self) -> usize {
        self.candidates.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.candidates.read().await.is_empty()
    }
}
