//! Cost accounting for routed model calls.
//!
//! Recording is additive and best-effort: a ledger failure is logged and
//! swallowed, never surfaced to the generation path.

use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use tracing::warn;

use riff_core::Complexity;

use crate::{ModelId, Usage};

/// One recorded model call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallRecord {
    pub tier: Complexity,
    pub model: ModelId,
    pub input_tokens: u64,
    pub output_tokens: u64,
    /// USD cost of the call; 0 for unpriced (local) models.
    pub cost: f64,
}

/// Aggregate view over all recorded calls.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CostSummary {
    pub total_calls: u64,
    pub total_input_tokens: u64,
    pub total_output_tokens: u64,
    pub total_cost: f64,
}

/// Append-only record of model calls and their cost.
#[derive(Debug, Default)]
pub struct CostLedger {
    records: Mutex<Vec<CallRecord>>,
}

impl CostLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one call. Never fails the caller; a poisoned lock is logged
    /// and the record dropped.
    pub fn record(&self, tier: Complexity, model: ModelId, usage: Usage, cost: f64) {
        let record = CallRecord {
            tier,
            model,
            input_tokens: usage.input_tokens,
            output_tokens: usage.output_tokens,
            cost,
        };
        match self.records.lock() {
            Ok(mut records) => records.push(record),
            Err(_) => warn!("cost ledger lock poisoned; dropping call record"),
        }
    }

    /// Aggregate totals across all recorded calls.
    pub fn summary(&self) -> CostSummary {
        match self.records.lock() {
            Ok(records) => records.iter().fold(CostSummary::default(), |mut acc, r| {
                acc.total_calls += 1;
                acc.total_input_tokens += r.input_tokens;
                acc.total_output_tokens += r.output_tokens;
                acc.total_cost += r.cost;
                acc
            }),
            Err(_) => {
                warn!("cost ledger lock poisoned; returning empty summary");
                CostSummary::default()
            }
        }
    }

    /// Snapshot of every recorded call.
    pub fn records(&self) -> Vec<CallRecord> {
        self.records.lock().map(|r| r.clone()).unwrap_or_default()
    }
}
