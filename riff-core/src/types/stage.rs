//! Generation stages and their fixed strategy rotations

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::CoreError;

/// Pipeline stage a candidate is generated for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    /// Background research and source gathering.
    Research,
    /// Structural outline of the piece.
    Outline,
    /// Body copy.
    Copy,
    /// Opening hook.
    Hook,
    /// Visual concept description.
    Visual,
}

impl Stage {
    /// All stages, in pipeline order.
    pub const ALL: [Stage; 5] = [
        Stage::Research,
        Stage::Outline,
        Stage::Copy,
        Stage::Hook,
        Stage::Visual,
    ];

    /// Stage name as used in keys and wire payloads.
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Research => "research",
            Stage::Outline => "outline",
            Stage::Copy => "copy",
            Stage::Hook => "hook",
            Stage::Visual => "visual",
        }
    }

    /// Parse a stage from its lowercase name.
    pub fn parse(s: &str) -> Result<Self, CoreError> {
        match s {
            "research" => Ok(Stage::Research),
            "outline" => Ok(Stage::Outline),
            "copy" => Ok(Stage::Copy),
            "hook" => Ok(Stage::Hook),
            "visual" => Ok(Stage::Visual),
            other => Err(CoreError::UnknownStage(other.to_string())),
        }
    }

    /// Fixed per-stage strategy rotation.
    ///
    /// Slot `i` of a batch uses strategy `i % rotation.len()`, so strategy
    /// diversity is structural rather than left to sampling noise.
    pub fn strategy_rotation(&self) -> &'static [&'static str] {
        match self {
            Stage::Research => &["comprehensive", "focused", "visual-first"],
            Stage::Outline => &["classic", "narrative", "listicle"],
            Stage::Copy => &["short-punchy", "detailed", "story-driven"],
            Stage::Hook => &["question", "bold-claim", "pattern-interrupt"],
            Stage::Visual => &["minimal", "data-rich", "illustrative"],
        }
    }

    /// Default model complexity tier for this stage.
    pub fn default_complexity(&self) -> Complexity {
        match self {
            Stage::Research => Complexity::Complex,
            Stage::Outline | Stage::Copy | Stage::Hook => Complexity::Standard,
            Stage::Visual => Complexity::Simple,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Cost/quality class of backend generation model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Complexity {
    Simple,
    Standard,
    Complex,
}

impl Complexity {
    /// Tier name as used in config tables and ledger records.
    pub fn as_str(&self) -> &'static str {
        match self {
            Complexity::Simple => "simple",
            Complexity::Standard => "standard",
            Complexity::Complex => "complex",
        }
    }
}

impl fmt::Display for Complexity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
