//! Variant generation orchestration
//!
//! The request path: retrieve worked examples (best-effort), generate one
//! candidate per slot concurrently, enforce diversity with a bounded
//! regeneration loop, score, rank, and register the batch. Callers always
//! get a batch back - possibly smaller or flagged, never an availability
//! error.

use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use riff_core::config::{DiversityConfig, EngineConfig, GenerationConfig, RetrievalConfig};
use riff_core::{
    flatten_text, Candidate, Complexity, GenerationBatch, HeuristicScorer, Stage,
};
use riff_learn::{CandidateRegistry, IndexFilter, SimilarityIndex};
use riff_models::{Completion, EmbeddingProvider, ModelRouter};

use crate::{DiversityEnforcer, EngineError, PromptAssembler, Result, WorkedExample};

/// Coordinates routing, retrieval, diversity, and scoring into ranked
/// candidate batches.
pub struct Orchestrator {
    router: Arc<ModelRouter>,
    embedder: Arc<dyn EmbeddingProvider>,
    index: Arc<dyn SimilarityIndex>,
    registry: Arc<CandidateRegistry>,
    scorer: HeuristicScorer,
    enforcer: DiversityEnforcer,
    assembler: PromptAssembler,
    retrieval: RetrievalConfig,
    generation: GenerationConfig,
    diversity: DiversityConfig,
}

impl Orchestrator {
    pub fn new(
        router: Arc<ModelRouter>,
        embedder: Arc<dyn EmbeddingProvider>,
        index: Arc<dyn SimilarityIndex>,
        registry: Arc<CandidateRegistry>,
        config: &EngineConfig,
    ) -> Self {
        Self {
            router,
            embedder,
            index,
            registry,
            scorer: HeuristicScorer::new(config.scoring.weights),
            enforcer: DiversityEnforcer::new(config.diversity.clone()),
            assembler: PromptAssembler::new(),
            retrieval: config.retrieval.clone(),
            generation: config.generation.clone(),
            diversity: config.diversity.clone(),
        }
    }

    /// Generate a ranked, diverse batch of candidates for one stage.
    ///
    /// `complexity` overrides the stage's default tier. Failed or
    /// timed-out slots are absent from the result; an exhausted
    /// regeneration budget surfaces as `diversity_incomplete`, not an
    /// error.
    pub async fn generate_batch(
        &self,
        stage: Stage,
        context: &serde_json::Value,
        requested_count: usize,
        complexity: Option<Complexity>,
    ) -> Result<GenerationBatch> {
        if requested_count == 0 {
            return Err(EngineError::InvalidRequest(
                "requested_count must be at least 1".to_string(),
            ));
        }

        let tier = complexity.unwrap_or_else(|| stage.default_complexity());
        let context_text = flatten_text(context);
        let examples = self.retrieve_examples(stage, &context_text).await;
        let example_ids: Vec<_> = examples.iter().map(|e| e.candidate_id).collect();

        let mut candidates = self
            .generate_slots(stage, tier, &context_text, &examples, requested_count)
            .await;

        let mut regeneration_attempts = 0u32;
        let mut diversity_incomplete = false;

        // Diversity pass. Without embeddings the guarantee cannot be
        // checked, so the batch is delivered flagged instead of failed.
        let texts: Vec<String> = candidates.iter().map(|c| c.content_text()).collect();
        match self.embedder.embed_batch(&texts).await {
            Ok(embeddings) => {
                for (candidate, embedding) in candidates.iter_mut().zip(embeddings) {
                    candidate.embedding = Some(embedding);
                }
                let (kept, attempts, exhausted) = self
                    .enforce_diversity(candidates, stage, tier, &context_text, &examples)
                    .await;
                candidates = kept;
                regeneration_attempts = attempts;
                diversity_incomplete = exhausted;
            }
            Err(err) => {
                if !candidates.is_empty() {
                    warn!(error = %err, "batch embedding failed; returning unverified batch");
                    diversity_incomplete = true;
                }
            }
        }

        // Score and rank. The sort is stable, so equal scores keep
        // generation order.
        for candidate in &mut candidates {
            let text = candidate.content_text();
            candidate.score = Some(self.scorer.score(&text, &context_text));
        }
        candidates.sort_by(|a, b| {
            b.overall_score()
                .partial_cmp(&a.overall_score())
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        self.registry.register_all(&candidates).await;

        info!(
            stage = %stage,
            tier = %tier,
            requested = requested_count,
            delivered = candidates.len(),
            regenerations = regeneration_attempts,
            examples = example_ids.len(),
            incomplete = diversity_incomplete,
            "batch generated"
        );

        Ok(GenerationBatch {
            stage,
            requested_count,
            candidates,
            regeneration_attempts,
            context_examples_used: example_ids,
            diversity_incomplete,
        })
    }

    /// Query the index for past successes near this context. Failures are
    /// non-fatal: generation proceeds without examples.
    async fn retrieve_examples(&self, stage: Stage, context_text: &str) -> Vec<WorkedExample> {
        if context_text.is_empty() {
            return Vec::new();
        }
        let vector = match self.embedder.embed(context_text).await {
            Ok(vector) => vector,
            Err(err) => {
                warn!(error = %err, "context embedding failed; generating without examples");
                return Vec::new();
            }
        };
        let filter = IndexFilter {
            stage: Some(stage),
            performed_well: Some(true),
            min_similarity: Some(self.retrieval.min_similarity),
            ..IndexFilter::default()
        };
        match self.index.query(&vector, &filter, self.retrieval.top_k).await {
            Ok(hits) => {
                debug!(stage = %stage, hits = hits.len(), "retrieved worked examples");
                hits.into_iter()
                    .map(|hit| WorkedExample {
                        candidate_id: hit.candidate_id,
                        content: hit.content_text,
                    })
                    .collect()
            }
            Err(err) => {
                warn!(error = %err, "retrieval failed; generating without examples");
                Vec::new()
            }
        }
    }

    /// Run every slot concurrently under the batch's concurrency cap.
    /// A slot that fails or times out is simply absent from the result.
    async fn generate_slots(
        &self,
        stage: Stage,
        tier: Complexity,
        context_text: &str,
        examples: &[WorkedExample],
        requested_count: usize,
    ) -> Vec<Candidate> {
        let rotation = stage.strategy_rotation();
        let semaphore = Arc::new(Semaphore::new(self.generation.max_concurrent_slots));
        let mut join_set: JoinSet<Option<(usize, String, Completion)>> = JoinSet::new();

        for slot in 0..requested_count {
            let strategy = rotation[slot % rotation.len()].to_string();
            let prompt = self
                .assembler
                .build(stage, &strategy, context_text, examples, 0);
            let router = Arc::clone(&self.router);
            let semaphore = Arc::clone(&semaphore);
            let slot_timeout = self.generation.slot_timeout;
            let max_tokens = self.generation.max_output_tokens;

            join_set.spawn(async move {
                let _permit = semaphore.acquire_owned().await.ok()?;
                match tokio::time::timeout(slot_timeout, router.complete(&prompt, tier, max_tokens))
                    .await
                {
                    Ok(Ok(completion)) => Some((slot, strategy, completion)),
                    Ok(Err(err)) => {
                        warn!(slot, error = %err, "slot generation failed; dropping slot");
                        None
                    }
                    Err(_) => {
                        warn!(slot, "slot timed out; dropping slot");
                        None
                    }
                }
            });
        }

        let mut produced: Vec<(usize, String, Completion)> = Vec::new();
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok(Some(result)) => produced.push(result),
                Ok(None) => {}
                Err(err) => warn!(error = %err, "slot task panicked; dropping slot"),
            }
        }
        produced.sort_by_key(|(slot, _, _)| *slot);

        produced
            .into_iter()
            .map(|(slot, strategy, completion)| {
                Candidate::from_text(
                    stage,
                    completion.text,
                    strategy,
                    completion.model_used.as_str(),
                    slot,
                )
                .with_cost(completion.cost)
            })
            .collect()
    }

    /// Greedy diversity pass with per-slot regeneration, then the strict
    /// finalize pass. Returns the kept candidates, the number of
    /// regeneration calls spent, and whether anything had to be dropped.
    async fn enforce_diversity(
        &self,
        candidates: Vec<Candidate>,
        stage: Stage,
        tier: Complexity,
        context_text: &str,
        examples: &[WorkedExample],
    ) -> (Vec<Candidate>, u32, bool) {
        let mut accepted: Vec<Candidate> = Vec::with_capacity(candidates.len());
        let mut anchors: Vec<Vec<f32>> = Vec::with_capacity(candidates.len());
        let mut regeneration_attempts = 0u32;
        let mut dropped_any = false;

        for candidate in candidates {
            let embedding = candidate.embedding.clone().unwrap_or_default();
            if self.enforcer.accepts(&anchors, &embedding) {
                anchors.push(embedding);
                accepted.push(candidate);
                continue;
            }

            debug!(
                slot = candidate.generation_index,
                strategy = %candidate.strategy_tag,
                "candidate too similar; regenerating"
            );
            let replacement = self
                .regenerate_slot(
                    &candidate,
                    stage,
                    tier,
                    context_text,
                    examples,
                    &anchors,
                    &mut regeneration_attempts,
                )
                .await;
            match replacement {
                Some((new_candidate, new_embedding)) => {
                    anchors.push(new_embedding);
                    accepted.push(new_candidate);
                }
                None => dropped_any = true,
            }
        }

        // The published guarantee is stricter than the mid-batch check;
        // survivors of this pass are what the caller may rely on.
        let final_embeddings: Vec<Vec<f32>> = accepted
            .iter()
            .map(|c| c.embedding.clone().unwrap_or_default())
            .collect();
        let outcome = self.enforcer.finalize(&final_embeddings);
        if !outcome.rejected.is_empty() {
            dropped_any = true;
        }
        let keep: std::collections::HashSet<usize> = outcome.accepted.into_iter().collect();
        let accepted = accepted
            .into_iter()
            .enumerate()
            .filter(|(i, _)| keep.contains(i))
            .map(|(_, c)| c)
            .collect();

        (accepted, regeneration_attempts, dropped_any)
    }

    /// Regenerate one slot with its strategy held constant and the prompt
    /// perturbed, up to the per-slot budget. Returns the first replacement
    /// that clears the mid-batch check against the accepted anchors.
    #[allow(clippy::too_many_arguments)]
    async fn regenerate_slot(
        &self,
        original: &Candidate,
        stage: Stage,
        tier: Complexity,
        context_text: &str,
        examples: &[WorkedExample],
        anchors: &[Vec<f32>],
        regeneration_attempts: &mut u32,
    ) -> Option<(Candidate, Vec<f32>)> {
        for attempt in 1..=self.diversity.max_regenerations_per_slot {
            *regeneration_attempts += 1;
            let prompt = self.assembler.build(
                stage,
                &original.strategy_tag,
                context_text,
                examples,
                attempt,
            );
            let completion = match self
                .router
                .complete(&prompt, tier, self.generation.max_output_tokens)
                .await
            {
                Ok(completion) => completion,
                Err(err) => {
                    warn!(
                        slot = original.generation_index,
                        attempt,
                        error = %err,
                        "regeneration call failed"
                    );
                    continue;
                }
            };
            let embedding = match self.embedder.embed(&completion.text).await {
                Ok(embedding) => embedding,
                Err(err) => {
                    warn!(
                        slot = original.generation_index,
                        attempt,
                        error = %err,
                        "regeneration embedding failed"
                    );
                    continue;
                }
            };
            if self.enforcer.accepts(anchors, &embedding) {
                let mut candidate = Candidate::from_text(
                    stage,
                    completion.text,
                    original.strategy_tag.clone(),
                    completion.model_used.as_str(),
                    original.generation_index,
                )
                .with_cost(completion.cost);
                candidate.embedding = Some(embedding.clone());
                return Some((candidate, embedding));
            }
            debug!(
                slot = original.generation_index,
                attempt, "regenerated candidate still too similar"
            );
        }
        warn!(
            slot = original.generation_index,
            budget = self.diversity.max_regenerations_per_slot,
            "regeneration budget exhausted; dropping slot"
        );
        None
    }
}
