//! Complexity-tier model routing with fallback chains.
//!
//! Each tier maps to an ordered model chain: primary first, fallbacks
//! after. The chain is walked iteratively with a shared backoff clock;
//! retryable failures (including per-call timeouts) back off and retry the
//! same model up to the configured attempt count before falling through.
//! Fatal failures surface immediately without fallback.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tracing::{debug, warn};

use riff_core::config::{ModelsConfig, RetryConfig};
use riff_core::Complexity;

use crate::{
    Completion, CostLedger, Error, GenerationProvider, ModelId, Pricing, Result,
};

/// One model in a tier chain, with its pricing if known.
#[derive(Debug, Clone)]
struct TierModel {
    /// Provider-local model name, as passed to the backend.
    name: String,
    /// Fully-qualified id recorded on completions and in the ledger.
    id: ModelId,
    pricing: Option<Pricing>,
}

/// Routes completion requests to backend models by complexity tier.
pub struct ModelRouter {
    provider: Arc<dyn GenerationProvider>,
    chains: HashMap<Complexity, Vec<TierModel>>,
    retry: RetryConfig,
    ledger: CostLedger,
}

impl ModelRouter {
    /// Build a router from the models config, resolving pricing entries
    /// by model name.
    pub fn new(
        provider: Arc<dyn GenerationProvider>,
        models: &ModelsConfig,
        retry: RetryConfig,
    ) -> Self {
        let mut chains = HashMap::new();
        for tier in [Complexity::Simple, Complexity::Standard, Complexity::Complex] {
            let chain = models
                .chain(tier)
                .iter()
                .map(|name| TierModel {
                    name: name.clone(),
                    id: ModelId::new(provider.name(), name),
                    pricing: models
                        .pricing
                        .get(name)
                        .map(|p| Pricing::new(p.input_per_million, p.output_per_million)),
                })
                .collect();
            chains.insert(tier, chain);
        }
        Self {
            provider,
            chains,
            retry,
            ledger: CostLedger::new(),
        }
    }

    /// The router's cost ledger.
    pub fn ledger(&self) -> &CostLedger {
        &self.ledger
    }

    /// Complete `prompt` against the given tier's model chain.
    pub async fn complete(
        &self,
        prompt: &str,
        tier: Complexity,
        max_tokens: u32,
    ) -> Result<Completion> {
        let chain = self
            .chains
            .get(&tier)
            .filter(|c| !c.is_empty())
            .ok_or_else(|| Error::InvalidRequest(format!("no models configured for tier {tier}")))?;

        // One clock across the whole chain walk: every retryable failure
        // grows the next delay, no matter which model it came from.
        let mut failures: u32 = 0;

        for model in chain {
            for attempt in 0..self.retry.attempts_per_model {
                let call = self
                    .provider
                    .generate(&model.name, prompt, max_tokens);
                let outcome = match tokio::time::timeout(self.retry.call_timeout, call).await {
                    Ok(result) => result,
                    Err(_) => Err(Error::Timeout {
                        model: model.id.to_string(),
                    }),
                };

                match outcome {
                    Ok(output) => {
                        let cost = model
                            .pricing
                            .map(|p| p.calculate(output.usage))
                            .unwrap_or(0.0);
                        self.ledger
                            .record(tier, model.id.clone(), output.usage, cost);
                        debug!(
                            model = %model.id,
                            tier = %tier,
                            output_tokens = output.usage.output_tokens,
                            "completion succeeded"
                        );
                        return Ok(Completion {
                            text: output.text,
                            model_used: model.id.clone(),
                            tier,
                            usage: output.usage,
                            cost,
                        });
                    }
                    Err(err) if err.is_retryable() => {
                        warn!(
                            model = %model.id,
                            attempt = attempt + 1,
                            error = %err,
                            "retryable failure"
                        );
                        failures += 1;
                        tokio::time::sleep(self.backoff_delay(failures)).await;
                    }
                    Err(err) => return Err(err),
                }
            }
            debug!(model = %model.id, tier = %tier, "attempts exhausted, falling through chain");
        }

        Err(Error::Exhausted { tier })
    }

    /// Exponential backoff with a bounded multiplier and jitter.
    fn backoff_delay(&self, failures: u32) -> Duration {
        let exponent = failures.saturating_sub(1).min(8);
        let scaled = self.retry.base_delay.as_millis() as f64
            * self.retry.multiplier.powi(exponent as i32);
        let capped = scaled.min(self.retry.max_delay.as_millis() as f64) as u64;
        let jitter = rand::thread_rng().gen_range(0..=capped / 4 + 1);
        Duration::from_millis(capped + jitter)
    }
}
