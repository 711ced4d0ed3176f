//! Learned patterns - aggregate statistics keyed by feature signatures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{CandidateId, Stage};

/// Version of the pattern-key extraction function.
///
/// Bumping this invalidates historical aggregates: they must be rebuilt
/// from feedback records (see `PatternStore::rebuild` in riff-learn), never
/// mutated incrementally across versions.
pub const PATTERN_KEY_VERSION: u32 = 1;

/// Discrete feature signature extracted from a candidate.
///
/// Keys are namespaced by stage so copy-stage and research-stage statistics
/// never share an aggregate.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PatternKey(String);

impl PatternKey {
    /// Extract the signature for a candidate's strategy and content.
    ///
    /// Deterministic over its inputs: stage, strategy tag, a bucketed word
    /// count, whether the content cites external sources, and a bucketed
    /// element (line) count.
    pub fn extract(stage: Stage, strategy_tag: &str, content_text: &str) -> Self {
        let words = content_text.split_whitespace().count();
        let length_bucket = match words {
            0..=49 => "short",
            50..=199 => "medium",
            _ => "long",
        };
        let has_sources = content_text.contains("http://")
            || content_text.contains("https://")
            || content_text.contains("Source:")
            || content_text.contains("source:");
        let elements = content_text.lines().filter(|l| !l.trim().is_empty()).count();
        let element_bucket = match elements {
            0..=1 => "single",
            2..=5 => "few",
            _ => "many",
        };
        Self(format!(
            "{stage}:{strategy_tag}:len-{length_bucket}:src-{}:items-{element_bucket}:v{PATTERN_KEY_VERSION}",
            if has_sources { "y" } else { "n" },
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PatternKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for PatternKey {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Aggregate statistics for one pattern key.
///
/// `avg_reward` is a running mean updated once per distinct feedback event;
/// back-fills revise it in place without growing `usage_count`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LearnedPattern {
    pub pattern_key: PatternKey,
    pub stage: Stage,
    pub avg_reward: f64,
    pub usage_count: u64,
    /// Saturating function of `usage_count`, in [0, 1), never exactly 1.
    pub confidence_level: f64,
    /// Best-performing example candidates, highest reward first.
    pub example_candidate_ids: Vec<CandidateId>,
    /// Rewards parallel to `example_candidate_ids`.
    pub example_rewards: Vec<f64>,
    pub updated_at: DateTime<Utc>,
}

impl LearnedPattern {
    /// Create an empty aggregate for a key.
    pub fn new(pattern_key: PatternKey, stage: Stage) -> Self {
        Self {
            pattern_key,
            stage,
            avg_reward: 0.0,
            usage_count: 0,
            confidence_level: 0.0,
            example_candidate_ids: Vec::new(),
            example_rewards: Vec::new(),
            updated_at: Utc::now(),
        }
    }

    /// Fold one new reward into the running mean.
    pub fn observe(&mut self, reward: f64, candidate_id: CandidateId, max_examples: usize) {
        let n = self.usage_count as f64;
        self.avg_reward += (reward - self.avg_reward) / (n + 1.0);
        self.usage_count += 1;
        self.confidence_level = confidence(self.usage_count);
        self.record_example(candidate_id, reward, max_examples);
        self.updated_at = Utc::now();
    }

    /// Replace a previously observed reward with a revised value, leaving
    /// `usage_count` untouched. Used when an engagement signal back-fills a
    /// candidate that was already counted.
    pub fn revise(&mut self, candidate_id: CandidateId, old_reward: f64, new_reward: f64) {
        if self.usage_count == 0 {
            return;
        }
        let n = self.usage_count as f64;
        self.avg_reward += (new_reward - old_reward) / n;
        if let Some(pos) = self
            .example_candidate_ids
            .iter()
            .position(|id| *id == candidate_id)
        {
            self.example_rewards[pos] = new_reward;
            self.sort_examples();
        }
        self.updated_at = Utc::now();
    }

    fn record_example(&mut self, candidate_id: CandidateId, reward: f64, max_examples: usize) {
        if let Some(pos) = self
            .example_candidate_ids
            .iter()
            .position(|id| *id == candidate_id)
        {
            self.example_rewards[pos] = reward;
        } else {
            self.example_candidate_ids.push(candidate_id);
            self.example_rewards.push(reward);
        }
        self.sort_examples();
        self.example_candidate_ids.truncate(max_examples);
        self.example_rewards.truncate(max_examples);
    }

    fn sort_examples(&mut self) {
        let mut paired: Vec<(CandidateId, f64)> = self
            .example_candidate_ids
            .iter()
            .copied()
            .zip(self.example_rewards.iter().copied())
            .collect();
        paired.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        self.example_candidate_ids = paired.iter().map(|(id, _)| *id).collect();
        self.example_rewards = paired.iter().map(|(_, r)| *r).collect();
    }
}

/// Saturating confidence: `1 - 1/(1+n)`. Monotonic in `n`, bounded below 1.
fn confidence(usage_count: u64) -> f64 {
    1.0 - 1.0 / (1.0 + usage_count as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn key() -> PatternKey {
        PatternKey::extract(Stage::Copy, "short-punchy", "Buy the thing today")
    }

    #[test]
    fn extraction_is_deterministic() {
        let a = PatternKey::extract(Stage::Copy, "detailed", "some words here");
        let b = PatternKey::extract(Stage::Copy, "detailed", "some words here");
        assert_eq!(a, b);
    }

    #[test]
    fn extraction_is_namespaced_by_stage() {
        let copy = PatternKey::extract(Stage::Copy, "detailed", "words");
        let research = PatternKey::extract(Stage::Research, "detailed", "words");
        assert_ne!(copy, research);
        assert!(copy.as_str().starts_with("copy:"));
        assert!(research.as_str().starts_with("research:"));
    }

    #[test]
    fn extraction_buckets_length() {
        let short = PatternKey::extract(Stage::Copy, "s", "few words");
        assert!(short.as_str().contains("len-short"));

        let medium_text = "word ".repeat(80);
        let medium = PatternKey::extract(Stage::Copy, "s", &medium_text);
        assert!(medium.as_str().contains("len-medium"));

        let long_text = "word ".repeat(300);
        let long = PatternKey::extract(Stage::Copy, "s", &long_text);
        assert!(long.as_str().contains("len-long"));
    }

    #[test]
    fn extraction_flags_sources() {
        let with = PatternKey::extract(Stage::Research, "s", "see https://example.com");
        assert!(with.as_str().contains("src-y"));
        let without = PatternKey::extract(Stage::Research, "s", "no links here");
        assert!(without.as_str().contains("src-n"));
    }

    #[test]
    fn extraction_embeds_version() {
        assert!(key().as_str().ends_with(&format!("v{PATTERN_KEY_VERSION}")));
    }

    #[test]
    fn running_average_matches_sequence() {
        let mut pattern = LearnedPattern::new(key(), Stage::Copy);
        pattern.observe(0.8, CandidateId::new(), 5);
        assert!((pattern.avg_reward - 0.8).abs() < EPS);
        pattern.observe(0.6, CandidateId::new(), 5);
        assert!((pattern.avg_reward - 0.7).abs() < EPS);
        pattern.observe(1.0, CandidateId::new(), 5);
        assert!((pattern.avg_reward - 0.8).abs() < EPS);
        assert_eq!(pattern.usage_count, 3);
    }

    #[test]
    fn confidence_saturates_below_one() {
        let mut pattern = LearnedPattern::new(key(), Stage::Copy);
        let mut last = pattern.confidence_level;
        for _ in 0..50 {
            pattern.observe(0.5, CandidateId::new(), 5);
            assert!(pattern.confidence_level > last);
            assert!(pattern.confidence_level < 1.0);
            last = pattern.confidence_level;
        }
        assert!((pattern.confidence_level - (1.0 - 1.0 / 51.0)).abs() < EPS);
    }

    #[test]
    fn revise_moves_average_without_usage_growth() {
        let id = CandidateId::new();
        let mut pattern = LearnedPattern::new(key(), Stage::Copy);
        pattern.observe(1.0, id, 5);
        pattern.observe(0.5, CandidateId::new(), 5);
        assert_eq!(pattern.usage_count, 2);
        assert!((pattern.avg_reward - 0.75).abs() < EPS);

        pattern.revise(id, 1.0, 0.5);
        assert_eq!(pattern.usage_count, 2);
        assert!((pattern.avg_reward - 0.5).abs() < EPS);
    }

    #[test]
    fn revise_on_empty_pattern_is_a_noop() {
        let mut pattern = LearnedPattern::new(key(), Stage::Copy);
        pattern.revise(CandidateId::new(), 0.2, 0.9);
        assert_eq!(pattern.usage_count, 0);
        assert_eq!(pattern.avg_reward, 0.0);
    }

    #[test]
    fn examples_keep_best_and_stay_bounded() {
        let mut pattern = LearnedPattern::new(key(), Stage::Copy);
        for i in 0..6 {
            pattern.observe(f64::from(i) / 10.0, CandidateId::new(), 3);
        }
        assert_eq!(pattern.example_candidate_ids.len(), 3);
        // Highest rewards retained, descending.
        assert!((pattern.example_rewards[0] - 0.5).abs() < EPS);
        assert!(pattern.example_rewards.windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn observing_same_candidate_twice_updates_its_example() {
        let id = CandidateId::new();
        let mut pattern = LearnedPattern::new(key(), Stage::Copy);
        pattern.observe(0.2, id, 5);
        pattern.observe(0.9, id, 5);
        assert_eq!(pattern.example_candidate_ids.len(), 1);
        assert!((pattern.example_rewards[0] - 0.9).abs() < EPS);
    }
}
