//! Engine facade - the operations collaborators call
//!
//! Built once at process start with explicitly injected provider clients
//! (one shared generation client, one shared embedding client), then
//! shared behind an `Arc` by whatever surface fronts it.

use std::sync::Arc;

use riff_core::{
    Complexity, EngineConfig, FeedbackRecord, GenerationBatch, LearnedPattern, PatternKey, Stage,
};
use riff_learn::{
    CandidateRegistry, FeedbackLearner, MemoryIndex, PatternStore, Scope, SimilarityIndex,
};
use riff_models::{CostSummary, EmbeddingProvider, GenerationProvider, ModelRouter};

use crate::{EngineError, Orchestrator, Result};

/// Builder wiring providers, index, and config into an [`Engine`].
pub struct EngineBuilder {
    config: EngineConfig,
    generation_provider: Option<Arc<dyn GenerationProvider>>,
    embedder: Option<Arc<dyn EmbeddingProvider>>,
    index: Option<Arc<dyn SimilarityIndex>>,
    scope: Scope,
}

impl EngineBuilder {
    pub fn new() -> Self {
        Self {
            config: EngineConfig::default(),
            generation_provider: None,
            embedder: None,
            index: None,
            scope: Scope::Global,
        }
    }

    /// Use a non-default configuration.
    #[must_use]
    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// The shared generation backend client. Required.
    #[must_use]
    pub fn generation_provider(mut self, provider: Arc<dyn GenerationProvider>) -> Self {
        self.generation_provider = Some(provider);
        self
    }

    /// The shared embedding client. Required.
    #[must_use]
    pub fn embedding_provider(mut self, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedder = Some(embedder);
        self
    }

    /// Similarity index backend; defaults to the in-memory index.
    #[must_use]
    pub fn similarity_index(mut self, index: Arc<dyn SimilarityIndex>) -> Self {
        self.index = Some(index);
        self
    }

    /// Scope index writes to an owner.
    #[must_use]
    pub fn scope(mut self, scope: Scope) -> Self {
        self.scope = scope;
        self
    }

    pub fn build(self) -> Result<Engine> {
        let generation_provider = self.generation_provider.ok_or_else(|| {
            EngineError::InvalidRequest("a generation provider is required".to_string())
        })?;
        let embedder = self.embedder.ok_or_else(|| {
            EngineError::InvalidRequest("an embedding provider is required".to_string())
        })?;
        let index = self
            .index
            .unwrap_or_else(|| Arc::new(MemoryIndex::new()) as Arc<dyn SimilarityIndex>);

        let router = Arc::new(ModelRouter::new(
            generation_provider,
            &self.config.models,
            self.config.retry.clone(),
        ));
        let registry = Arc::new(CandidateRegistry::new());
        let patterns = Arc::new(PatternStore::new());

        let orchestrator = Orchestrator::new(
            Arc::clone(&router),
            Arc::clone(&embedder),
            Arc::clone(&index),
            Arc::clone(&registry),
            &self.config,
        );
        let learner = FeedbackLearner::new(
            patterns,
            registry,
            index,
            embedder,
            self.config.feedback.clone(),
        )
        .with_scope(self.scope);

        Ok(Engine {
            orchestrator,
            learner,
            router,
        })
    }
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// The variant generation and learning engine.
pub struct Engine {
    orchestrator: Orchestrator,
    learner: FeedbackLearner,
    router: Arc<ModelRouter>,
}

impl Engine {
    pub fn builder() -> EngineBuilder {
        EngineBuilder::new()
    }

    /// Generate a ranked, diverse candidate batch.
    pub async fn generate_batch(
        &self,
        stage: Stage,
        context: &serde_json::Value,
        requested_count: usize,
        complexity: Option<Complexity>,
    ) -> Result<GenerationBatch> {
        self.orchestrator
            .generate_batch(stage, context, requested_count, complexity)
            .await
    }

    /// Record a human rating for a delivered candidate.
    pub async fn record_user_score(
        &self,
        candidate_id: riff_core::CandidateId,
        user_score: u8,
        feedback_text: Option<String>,
        selected: bool,
    ) -> Result<FeedbackRecord> {
        Ok(self
            .learner
            .record_user_score(candidate_id, user_score, feedback_text, selected)
            .await?)
    }

    /// Back-fill a real-world engagement signal.
    pub async fn record_outcome(
        &self,
        candidate_id: riff_core::CandidateId,
        engagement_score: f64,
    ) -> Result<FeedbackRecord> {
        Ok(self
            .learner
            .record_outcome(candidate_id, engagement_score)
            .await?)
    }

    /// Learned pattern aggregates, for one key or all.
    pub fn pattern_stats(&self, key: Option<&PatternKey>) -> Vec<LearnedPattern> {
        self.learner.pattern_stats(key)
    }

    /// Aggregate model-call cost across every batch this engine served.
    pub fn cost_summary(&self) -> CostSummary {
        self.router.ledger().summary()
    }
}
