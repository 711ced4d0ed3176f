//! Feedback learner - ratings in, pattern statistics and index entries out
//!
//! Recording is idempotent per candidate: a repeat rating revises the
//! stored record and its pattern aggregate in place instead of counting a
//! second event. The similarity-index write that follows a successful
//! recording is best-effort; its failure degrades future retrieval, not
//! the feedback call.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, warn};

use riff_core::config::FeedbackConfig;
use riff_core::{Candidate, CandidateId, FeedbackRecord, LearnedPattern, PatternKey};
use riff_models::EmbeddingProvider;

use crate::{
    CandidateRegistry, IndexEntry, LearnError, PatternStore, Result, Scope, SimilarityIndex,
};

/// Receives human ratings and outcome signals, maintains per-pattern
/// running statistics, and feeds rated candidates back into the
/// similarity index for future retrieval.
pub struct FeedbackLearner {
    records: RwLock<HashMap<CandidateId, FeedbackRecord>>,
    patterns: Arc<PatternStore>,
    registry: Arc<CandidateRegistry>,
    index: Arc<dyn SimilarityIndex>,
    embedder: Arc<dyn EmbeddingProvider>,
    config: FeedbackConfig,
    scope: Scope,
}

impl FeedbackLearner {
    pub fn new(
        patterns: Arc<PatternStore>,
        registry: Arc<CandidateRegistry>,
        index: Arc<dyn SimilarityIndex>,
        embedder: Arc<dyn EmbeddingProvider>,
        config: FeedbackConfig,
    ) -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
            patterns,
            registry,
            index,
            embedder,
            config,
            scope: Scope::Global,
        }
    }

    /// Scope future index writes to an owner.
    #[must_use]
    pub fn with_scope(mut self, scope: Scope) -> Self {
        self.scope = scope;
        self
    }

    /// Record a human rating for a candidate.
    ///
    /// Calling twice for the same candidate updates the existing record;
    /// the pattern's `usage_count` grows once per candidate, not per call.
    pub async fn record_user_score(
        &self,
        candidate_id: CandidateId,
        user_score: u8,
        feedback_text: Option<String>,
        selected: bool,
    ) -> Result<FeedbackRecord> {
        let candidate = self
            .registry
            .get(candidate_id)
            .await
            .ok_or(LearnError::CandidateNotFound(candidate_id))?;
        let key = pattern_key_for(&candidate);

        let record = {
            let mut records = self.records.write().await;
            match records.get_mut(&candidate_id) {
                Some(existing) => {
                    let old_reward = existing.combined_reward;
                    existing.set_user_score(user_score, feedback_text, selected)?;
                    self.patterns
                        .revise(&key, candidate_id, old_reward, existing.combined_reward);
                    existing.clone()
                }
                None => {
                    let record = FeedbackRecord::from_user_score(
                        candidate_id,
                        user_score,
                        feedback_text,
                        selected,
                    )?;
                    self.patterns.observe(
                        key.clone(),
                        candidate.stage,
                        record.combined_reward,
                        candidate_id,
                        self.config.max_examples_per_pattern,
                    );
                    records.insert(candidate_id, record.clone());
                    record
                }
            }
        };

        debug!(
            candidate = %candidate_id,
            pattern = %key,
            reward = record.combined_reward,
            "user score recorded"
        );
        self.write_index_entry(&candidate, &record).await;
        Ok(record)
    }

    /// Back-fill a real-world engagement signal for a candidate.
    ///
    /// Revises the existing record's reward and its pattern aggregate in
    /// place; `usage_count` does not grow. An outcome arriving before any
    /// user score creates an outcome-only record and counts once.
    pub async fn record_outcome(
        &self,
        candidate_id: CandidateId,
        engagement_score: f64,
    ) -> Result<FeedbackRecord> {
        let candidate = self
            .registry
            .get(candidate_id)
            .await
            .ok_or(LearnError::CandidateNotFound(candidate_id))?;
        let key = pattern_key_for(&candidate);

        let record = {
            let mut records = self.records.write().await;
            match records.get_mut(&candidate_id) {
                Some(existing) => {
                    let old_reward = existing.combined_reward;
                    existing.set_engagement(engagement_score)?;
                    self.patterns
                        .revise(&key, candidate_id, old_reward, existing.combined_reward);
                    existing.clone()
                }
                None => {
                    let record = FeedbackRecord::from_engagement(candidate_id, engagement_score)?;
                    self.patterns.observe(
                        key.clone(),
                        candidate.stage,
                        record.combined_reward,
                        candidate_id,
                        self.config.max_examples_per_pattern,
                    );
                    records.insert(candidate_id, record.clone());
                    record
                }
            }
        };

        debug!(
            candidate = %candidate_id,
            pattern = %key,
            reward = record.combined_reward,
            "outcome recorded"
        );
        self.write_index_entry(&candidate, &record).await;
        Ok(record)
    }

    /// The stored feedback record for a candidate, if any.
    pub async fn get_record(&self, candidate_id: CandidateId) -> Option<FeedbackRecord> {
        self.records.read().await.get(&candidate_id).cloned()
    }

    /// Pattern aggregates for one key, or all of them.
    pub fn pattern_stats(&self, key: Option<&PatternKey>) -> Vec<LearnedPattern> {
        self.patterns.stats(key)
    }

    /// Recompute every pattern aggregate from the stored feedback records.
    ///
    /// Run after a `PATTERN_KEY_VERSION` bump: aggregates keyed by the old
    /// extraction are invalid and must be rebuilt, not migrated.
    pub async fn rebuild_patterns(&self) {
        let records = self.records.read().await;
        let mut observations = Vec::with_capacity(records.len());
        for (id, record) in records.iter() {
            if let Some(candidate) = self.registry.get(*id).await {
                observations.push((
                    pattern_key_for(&candidate),
                    candidate.stage,
                    record.combined_reward,
                    *id,
                ));
            }
        }
        self.patterns
            .rebuild(observations, self.config.max_examples_per_pattern);
    }

    /// Embed and index the rated candidate so future retrieval can find
    /// it. Best-effort: the rating is already durably recorded, so index
    /// or embedding failure only degrades retrieval quality.
    async fn write_index_entry(&self, candidate: &Candidate, record: &FeedbackRecord) {
        let text = candidate.content_text();
        let embedding = match self.embedder.embed(&text).await {
            Ok(embedding) => embedding,
            Err(err) => {
                warn!(candidate = %candidate.id, error = %err, "embedding failed; skipping index write");
                return;
            }
        };
        let entry = IndexEntry {
            candidate_id: candidate.id,
            embedding,
            stage: candidate.stage,
            performed_well: record.combined_reward >= self.config.performed_well_threshold,
            scope: self.scope.clone(),
            content_text: text,
            reward: record.combined_reward,
        };
        if let Err(err) = self.index.upsert(entry).await {
            warn!(candidate = %candidate.id, error = %err, "index write failed after feedback");
        }
    }
}

fn pattern_key_for(candidate: &Candidate) -> PatternKey {
    PatternKey::extract(
        candidate.stage,
        &candidate.strategy_tag,
        &candidate.content_text(),
    )
}
