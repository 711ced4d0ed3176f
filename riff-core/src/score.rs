//! Heuristic quality scoring
//!
//! Deterministic, side-effect-free scoring over a candidate's content text
//! and the generation context. `overall` is the sole batch sort key; the
//! sub-scores exist for observability and tuning.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Cue words that tend to pull readers in.
const ENGAGEMENT_CUES: [&str; 10] = [
    "you", "your", "how", "why", "new", "now", "free", "secret", "proven", "today",
];

/// Weights for combining sub-scores into `overall`.
///
/// Weights are normalized to sum to 1 before use, so any positive values
/// express a valid preference.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreWeights {
    pub clarity: f64,
    pub engagement: f64,
    pub brand_alignment: f64,
    pub readability: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            clarity: 0.25,
            engagement: 0.25,
            brand_alignment: 0.25,
            readability: 0.25,
        }
    }
}

impl ScoreWeights {
    /// Scale the weights so they sum to 1. Zero or negative totals fall
    /// back to uniform weights.
    pub fn normalized(&self) -> Self {
        let total = self.clarity + self.engagement + self.brand_alignment + self.readability;
        if total <= 0.0 {
            return Self::default();
        }
        Self {
            clarity: self.clarity / total,
            engagement: self.engagement / total,
            brand_alignment: self.brand_alignment / total,
            readability: self.readability / total,
        }
    }
}

/// Multi-dimensional quality score, every component in [0, 10].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub clarity: f64,
    pub engagement_potential: f64,
    pub brand_alignment: f64,
    pub readability: f64,
    pub overall: f64,
}

impl ScoreBreakdown {
    /// The all-zero score given to empty or degenerate content.
    pub fn zero() -> Self {
        Self {
            clarity: 0.0,
            engagement_potential: 0.0,
            brand_alignment: 0.0,
            readability: 0.0,
            overall: 0.0,
        }
    }
}

/// Computes [`ScoreBreakdown`]s for candidate content.
#[derive(Debug, Clone, Default)]
pub struct HeuristicScorer {
    weights: ScoreWeights,
}

impl HeuristicScorer {
    pub fn new(weights: ScoreWeights) -> Self {
        Self { weights }
    }

    /// Score content against the generation context.
    ///
    /// Pure over its inputs: identical `(content, context)` pairs always
    /// produce identical breakdowns. Empty content scores an overall of 0
    /// so corrupted candidates sort last instead of failing the batch.
    pub fn score(&self, content_text: &str, context_text: &str) -> ScoreBreakdown {
        let content = content_text.trim();
        if content.is_empty() {
            return ScoreBreakdown::zero();
        }

        let clarity = clarity_score(content);
        let engagement_potential = engagement_score(content);
        let brand_alignment = alignment_score(content, context_text);
        let readability = readability_score(content);

        let w = self.weights.normalized();
        let overall = w.clarity * clarity
            + w.engagement * engagement_potential
            + w.brand_alignment * brand_alignment
            + w.readability * readability;

        ScoreBreakdown {
            clarity,
            engagement_potential,
            brand_alignment,
            readability,
            overall,
        }
    }
}

/// Sentence length sweet spot: 8-20 words per sentence reads clearly.
fn clarity_score(text: &str) -> f64 {
    let sentences: Vec<&str> = text
        .split(['.', '!', '?'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();
    if sentences.is_empty() {
        return 0.0;
    }
    let total_words: usize = sentences
        .iter()
        .map(|s| s.split_whitespace().count())
        .sum();
    let avg = total_words as f64 / sentences.len() as f64;
    let deviation = if avg < 8.0 {
        8.0 - avg
    } else if avg > 20.0 {
        avg - 20.0
    } else {
        0.0
    };
    (10.0 - deviation * 0.5).clamp(0.0, 10.0)
}

/// Hook cues: a question, concrete numbers, and pull words.
fn engagement_score(text: &str) -> f64 {
    let lower = text.to_lowercase();
    let mut score = 2.0;
    if lower.contains('?') {
        score += 2.0;
    }
    if lower.chars().any(|c| c.is_ascii_digit()) {
        score += 2.0;
    }
    let words: HashSet<&str> = lower
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();
    let cues = ENGAGEMENT_CUES.iter().filter(|c| words.contains(*c)).count();
    score += cues as f64 * 1.5;
    score.clamp(0.0, 10.0)
}

/// Overlap between context keywords and content vocabulary.
///
/// Neutral (5.0) when the context carries no usable keywords, so scoring
/// still ranks candidates sensibly for context-free requests.
fn alignment_score(content: &str, context: &str) -> f64 {
    let keywords: HashSet<String> = context
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.len() > 3)
        .map(str::to_string)
        .collect();
    if keywords.is_empty() {
        return 5.0;
    }
    let content_words: HashSet<String> = content
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect();
    let matched = keywords.iter().filter(|k| content_words.contains(*k)).count();
    let ratio = matched as f64 / keywords.len() as f64;
    (10.0 * ratio.sqrt()).clamp(0.0, 10.0)
}

/// Word-length proxy for reading ease: shorter words read faster.
fn readability_score(text: &str) -> f64 {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.is_empty() {
        return 0.0;
    }
    let total_len: usize = words.iter().map(|w| w.chars().count()).sum();
    let avg_len = total_len as f64 / words.len() as f64;
    (10.0 - (avg_len - 4.0).max(0.0) * 1.5).clamp(0.0, 10.0)
}
