//! Core types for the model layer.

use serde::{Deserialize, Serialize};
use std::fmt;

use riff_core::Complexity;

/// Unique identifier for a model in format `provider:model_name`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModelId(String);

impl ModelId {
    /// Create a new model ID from provider and model name.
    pub fn new(provider: &str, model: &str) -> Self {
        Self(format!("{provider}:{model}"))
    }

    /// Get the provider portion of the ID.
    pub fn provider(&self) -> &str {
        self.0.split(':').next().unwrap_or("")
    }

    /// Get the model name portion of the ID (everything after the first
    /// colon; model names may themselves contain colons, e.g. tags).
    pub fn model(&self) -> &str {
        self.0.split_once(':').map(|(_, m)| m).unwrap_or("")
    }

    /// Get the full ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ModelId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Token usage statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub total_tokens: u64,
}

impl Usage {
    /// Create new usage statistics.
    pub fn new(input_tokens: u64, output_tokens: u64) -> Self {
        Self {
            input_tokens,
            output_tokens,
            total_tokens: input_tokens + output_tokens,
        }
    }
}

/// Pricing information for a model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pricing {
    /// Cost per million input tokens in USD.
    pub input_per_million: f64,
    /// Cost per million output tokens in USD.
    pub output_per_million: f64,
}

impl Pricing {
    pub fn new(input_per_million: f64, output_per_million: f64) -> Self {
        Self {
            input_per_million,
            output_per_million,
        }
    }

    /// Calculate cost in USD for the given token counts.
    pub fn calculate(&self, usage: Usage) -> f64 {
        let input_cost = (usage.input_tokens as f64 / 1_000_000.0) * self.input_per_million;
        let output_cost = (usage.output_tokens as f64 / 1_000_000.0) * self.output_per_million;
        input_cost + output_cost
    }
}

/// The result of a routed completion call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Completion {
    pub text: String,
    /// The model that actually answered; differs from the tier's primary
    /// when the fallback chain was walked.
    pub model_used: ModelId,
    pub tier: Complexity,
    pub usage: Usage,
    /// USD cost of this call; 0 for models without a pricing entry.
    pub cost: f64,
}
