//! Pattern store - serialized aggregate updates per pattern key
//!
//! The running-average update is a read-modify-write; concurrent feedback
//! on the same key must not interleave or an update is lost. Every mutation
//! here runs to completion inside the store's lock, never as a separate
//! read followed by a write.

use std::collections::HashMap;
use std::sync::Mutex;

use tracing::warn;

use riff_core::{CandidateId, LearnedPattern, PatternKey, Stage};

/// In-process store of learned pattern aggregates.
#[derive(Debug, Default)]
pub struct PatternStore {
    patterns: Mutex<HashMap<PatternKey, LearnedPattern>>,
}

impl PatternStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one reward observation into the key's aggregate, creating the
    /// pattern on first sight. Returns the updated aggregate.
    pub fn observe(
        &self,
        key: PatternKey,
        stage: Stage,
        reward: f64,
        candidate_id: CandidateId,
        max_examples: usize,
    ) -> LearnedPattern {
        let mut patterns = self.lock();
        let pattern = patterns
            .entry(key.clone())
            .or_insert_with(|| LearnedPattern::new(key, stage));
        pattern.observe(reward, candidate_id, max_examples);
        pattern.clone()
    }

    /// Replace a counted reward with a revised value (engagement back-fill
    /// or a repeated rating), leaving `usage_count` untouched.
    pub fn revise(
        &self,
        key: &PatternKey,
        candidate_id: CandidateId,
        old_reward: f64,
        new_reward: f64,
    ) -> Option<LearnedPattern> {
        let mut patterns = self.lock();
        let pattern = patterns.get_mut(key)?;
        pattern.revise(candidate_id, old_reward, new_reward);
        Some(pattern.clone())
    }

    /// Aggregates for one key, or all of them.
    pub fn stats(&self, key: Option<&PatternKey>) -> Vec<LearnedPattern> {
        let patterns = self.lock();
        match key {
            Some(key) => patterns.get(key).cloned().into_iter().collect(),
            None => {
                let mut all: Vec<LearnedPattern> = patterns.values().cloned().collect();
                all.sort_by(|a, b| a.pattern_key.as_str().cmp(b.pattern_key.as_str()));
                all
            }
        }
    }

    /// Throw away every aggregate and re-fold the given observations.
    ///
    /// Required after a pattern-key extraction version bump: historical
    /// aggregates keyed by the old function are invalid and must be
    /// rebuilt from feedback records, not migrated incrementally.
    pub fn rebuild<I>(&self, observations: I, max_examples: usize)
    where
        I: IntoIterator<Item = (PatternKey, Stage, f64, CandidateId)>,
    {
        let mut patterns = self.lock();
        patterns.clear();
        for (key, stage, reward, candidate_id) in observations {
            let pattern = patterns
                .entry(key.clone())
                .or_insert_with(|| LearnedPattern::new(key, stage));
            pattern.observe(reward, candidate_id, max_examples);
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<PatternKey, LearnedPattern>> {
        match self.patterns.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                warn!("pattern store lock poisoned; recovering");
                poisoned.into_inner()
            }
        }
    }
}
