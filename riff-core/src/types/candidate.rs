//! Candidates - one generated artifact per stage slot

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::score::ScoreBreakdown;
use crate::Stage;

/// Opaque identifier for a [`Candidate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CandidateId(Uuid);

impl CandidateId {
    /// Mint a fresh random id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse an id from its string form.
    pub fn parse(s: &str) -> Option<Self> {
        Uuid::parse_str(s).ok().map(Self)
    }
}

impl Default for CandidateId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CandidateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One generated content artifact.
///
/// The `content` payload is stage-specific and treated as opaque; the engine
/// only flattens its string leaves (see [`Candidate::content_text`]) for
/// embedding and scoring. A candidate is immutable once scored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candidate {
    pub id: CandidateId,
    pub stage: Stage,
    /// Stage-specific structured payload.
    pub content: serde_json::Value,
    /// Which generation strategy produced this candidate.
    pub strategy_tag: String,
    /// Fully-qualified identifier of the backend model that generated it.
    pub model_used: String,
    /// Backend cost attributed to this candidate, in USD.
    pub cost: f64,
    /// Position in the original generation order; ties in score sort by
    /// this, so earlier slots win.
    pub generation_index: usize,
    /// Composite quality score, attached once by the scorer.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<ScoreBreakdown>,
    /// Embedding of the content text, computed lazily.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
    pub created_at: DateTime<Utc>,
}

impl Candidate {
    /// Create a candidate from generated text.
    pub fn from_text(
        stage: Stage,
        text: impl Into<String>,
        strategy_tag: impl Into<String>,
        model_used: impl Into<String>,
        generation_index: usize,
    ) -> Self {
        Self {
            id: CandidateId::new(),
            stage,
            content: serde_json::Value::String(text.into()),
            strategy_tag: strategy_tag.into(),
            model_used: model_used.into(),
            cost: 0.0,
            generation_index,
            score: None,
            embedding: None,
            created_at: Utc::now(),
        }
    }

    /// Attribute backend cost to this candidate.
    #[must_use]
    pub fn with_cost(mut self, cost: f64) -> Self {
        self.cost = cost;
        self
    }

    /// Flatten the string leaves of the content payload for embedding and
    /// scoring. Non-string leaves (numbers, booleans) are skipped.
    pub fn content_text(&self) -> String {
        flatten_text(&self.content)
    }

    /// Overall heuristic score, or 0 if not yet scored.
    pub fn overall_score(&self) -> f64 {
        self.score.as_ref().map(|s| s.overall).unwrap_or(0.0)
    }
}

/// Flatten the string leaves of an arbitrary JSON payload into text,
/// one leaf per line. Used for candidate content and generation contexts
/// alike; non-string leaves are skipped.
pub fn flatten_text(value: &serde_json::Value) -> String {
    let mut out = String::new();
    collect_text(value, &mut out);
    out.trim().to_string()
}

fn collect_text(value: &serde_json::Value, out: &mut String) {
    match value {
        serde_json::Value::String(s) => {
            if !out.is_empty() {
                out.push('\n');
            }
            out.push_str(s);
        }
        serde_json::Value::Array(items) => {
            for item in items {
                collect_text(item, out);
            }
        }
        serde_json::Value::Object(map) => {
            for item in map.values() {
                collect_text(item, out);
            }
        }
        _ => {}
    }
}
