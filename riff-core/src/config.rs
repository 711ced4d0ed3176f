//! Engine configuration
//!
//! Serde-backed config structs with per-field defaults, loadable from TOML.
//! Every tunable threshold in the engine lives here.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

use crate::error::Result;
use crate::score::ScoreWeights;

/// Top-level engine configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub diversity: DiversityConfig,
    #[serde(default)]
    pub generation: GenerationConfig,
    #[serde(default)]
    pub scoring: ScoringConfig,
    #[serde(default)]
    pub feedback: FeedbackConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub models: ModelsConfig,
}

impl EngineConfig {
    /// Parse a config from TOML text; omitted fields take their defaults.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        Ok(toml::from_str(s)?)
    }
}

/// Few-shot retrieval of past successes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Maximum worked examples injected into generation context.
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Minimum cosine similarity for a past candidate to qualify.
    #[serde(default = "default_retrieval_similarity")]
    pub min_similarity: f64,
}

fn default_top_k() -> usize {
    3
}

fn default_retrieval_similarity() -> f64 {
    0.5
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            min_similarity: default_retrieval_similarity(),
        }
    }
}

/// Pairwise diversity enforcement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiversityConfig {
    /// Mid-batch near-duplicate threshold; a fresh candidate more similar
    /// than this to any accepted anchor is sent back for regeneration.
    #[serde(default = "default_high_similarity")]
    pub high_similarity_threshold: f64,

    /// Published guarantee: every accepted pair differs by at least this
    /// margin (similarity at most `1 - min_dissimilarity`).
    #[serde(default = "default_min_dissimilarity")]
    pub min_dissimilarity: f64,

    /// Regeneration budget per slot before the batch is flagged.
    #[serde(default = "default_max_regenerations")]
    pub max_regenerations_per_slot: u32,
}

fn default_high_similarity() -> f64 {
    0.85
}

fn default_min_dissimilarity() -> f64 {
    0.30
}

fn default_max_regenerations() -> u32 {
    3
}

impl Default for DiversityConfig {
    fn default() -> Self {
        Self {
            high_similarity_threshold: default_high_similarity(),
            min_dissimilarity: default_min_dissimilarity(),
            max_regenerations_per_slot: default_max_regenerations(),
        }
    }
}

impl DiversityConfig {
    /// Maximum similarity an accepted pair may have in the returned batch.
    pub fn strict_threshold(&self) -> f64 {
        1.0 - self.min_dissimilarity
    }
}

/// Batch generation concurrency and limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Concurrent slot cap per batch, to respect backend rate limits.
    #[serde(default = "default_max_concurrent_slots")]
    pub max_concurrent_slots: usize,

    /// A slot slower than this is treated as absent, not fatal.
    #[serde(default = "default_slot_timeout", with = "humantime_serde")]
    pub slot_timeout: Duration,

    /// Token budget handed to the backend per candidate.
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,
}

fn default_max_concurrent_slots() -> usize {
    4
}

fn default_slot_timeout() -> Duration {
    Duration::from_secs(60)
}

fn default_max_output_tokens() -> u32 {
    1024
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            max_concurrent_slots: default_max_concurrent_slots(),
            slot_timeout: default_slot_timeout(),
            max_output_tokens: default_max_output_tokens(),
        }
    }
}

/// Heuristic scorer weighting.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// Sub-score weights; normalized to sum to 1 before use.
    #[serde(default)]
    pub weights: ScoreWeights,
}

/// Feedback-to-learning thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackConfig {
    /// Combined reward at or above which a rated candidate is indexed as
    /// `performed_well` and becomes retrievable as a worked example.
    #[serde(default = "default_performed_well")]
    pub performed_well_threshold: f64,

    /// Best-example list bound per learned pattern.
    #[serde(default = "default_max_examples")]
    pub max_examples_per_pattern: usize,
}

fn default_performed_well() -> f64 {
    0.6
}

fn default_max_examples() -> usize {
    5
}

impl Default for FeedbackConfig {
    fn default() -> Self {
        Self {
            performed_well_threshold: default_performed_well(),
            max_examples_per_pattern: default_max_examples(),
        }
    }
}

/// Retry and backoff policy for backend model calls.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Tries per model before falling through the tier chain (2 = one
    /// retry against the same model).
    #[serde(default = "default_attempts_per_model")]
    pub attempts_per_model: u32,

    /// First backoff delay.
    #[serde(default = "default_base_delay", with = "humantime_serde")]
    pub base_delay: Duration,

    /// Backoff growth factor between attempts.
    #[serde(default = "default_multiplier")]
    pub multiplier: f64,

    /// Backoff ceiling.
    #[serde(default = "default_max_delay", with = "humantime_serde")]
    pub max_delay: Duration,

    /// Per-call timeout; an elapsed timeout retries like a hard failure.
    #[serde(default = "default_call_timeout", with = "humantime_serde")]
    pub call_timeout: Duration,
}

fn default_attempts_per_model() -> u32 {
    2
}

fn default_base_delay() -> Duration {
    Duration::from_millis(200)
}

fn default_multiplier() -> f64 {
    2.0
}

fn default_max_delay() -> Duration {
    Duration::from_secs(2)
}

fn default_call_timeout() -> Duration {
    Duration::from_secs(20)
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            attempts_per_model: default_attempts_per_model(),
            base_delay: default_base_delay(),
            multiplier: default_multiplier(),
            max_delay: default_max_delay(),
            call_timeout: default_call_timeout(),
        }
    }
}

/// Backend model chains per complexity tier, plus embedding settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelsConfig {
    /// Ordered chain for the `simple` tier: primary first, then fallbacks.
    #[serde(default = "default_simple_chain")]
    pub simple: Vec<String>,

    /// Ordered chain for the `standard` tier.
    #[serde(default = "default_standard_chain")]
    pub standard: Vec<String>,

    /// Ordered chain for the `complex` tier.
    #[serde(default = "default_complex_chain")]
    pub complex: Vec<String>,

    /// USD pricing per model name; models without an entry cost 0 (local).
    #[serde(default)]
    pub pricing: HashMap<String, PricingEntry>,

    /// Embedding model name.
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,

    /// Embedding vector dimensionality.
    #[serde(default = "default_embedding_dimension")]
    pub embedding_dimension: usize,
}

fn default_simple_chain() -> Vec<String> {
    vec!["llama3.2:3b".to_string()]
}

fn default_standard_chain() -> Vec<String> {
    vec!["llama3.1:8b".to_string(), "llama3.2:3b".to_string()]
}

fn default_complex_chain() -> Vec<String> {
    vec![
        "llama3.1:70b".to_string(),
        "llama3.1:8b".to_string(),
        "llama3.2:3b".to_string(),
    ]
}

fn default_embedding_model() -> String {
    "nomic-embed-text".to_string()
}

fn default_embedding_dimension() -> usize {
    768
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            simple: default_simple_chain(),
            standard: default_standard_chain(),
            complex: default_complex_chain(),
            pricing: HashMap::new(),
            embedding_model: default_embedding_model(),
            embedding_dimension: default_embedding_dimension(),
        }
    }
}

impl ModelsConfig {
    /// The ordered model chain for a tier.
    pub fn chain(&self, complexity: crate::Complexity) -> &[String] {
        match complexity {
            crate::Complexity::Simple => &self.simple,
            crate::Complexity::Standard => &self.standard,
            crate::Complexity::Complex => &self.complex,
        }
    }
}

/// Per-model USD pricing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricingEntry {
    pub input_per_million: f64,
    pub output_per_million: f64,
}
