//! End-to-end tests for the rate -> learn -> retrieve loop
//!
//! Drives the public API the way the engine does: candidates are
//! registered, rated, and later surface as worked examples through the
//! similarity index.

use std::sync::Arc;

use async_trait::async_trait;

use riff_core::config::FeedbackConfig;
use riff_core::{Candidate, Stage};
use riff_learn::{
    CandidateRegistry, FeedbackLearner, IndexFilter, MemoryIndex, PatternStore, SimilarityIndex,
};
use riff_models::EmbeddingProvider;

/// Deterministic embedder: bigram-bucket histogram, normalized by length.
/// Similar texts land near each other without any network dependency.
struct BucketEmbedder;

#[async_trait]
impl EmbeddingProvider for BucketEmbedder {
    fn dimension(&self) -> usize {
        16
    }

    async fn embed(&self, text: &str) -> riff_models::Result<Vec<f32>> {
        let mut v = vec![0.0f32; 16];
        let bytes = text.as_bytes();
        for pair in bytes.windows(2) {
            let bucket = (pair[0] as usize * 31 + pair[1] as usize) % 16;
            v[bucket] += 1.0;
        }
        Ok(v)
    }
}

struct Loop {
    learner: FeedbackLearner,
    registry: Arc<CandidateRegistry>,
    index: Arc<MemoryIndex>,
    embedder: Arc<BucketEmbedder>,
}

fn learning_loop() -> Loop {
    let registry = Arc::new(CandidateRegistry::new());
    let index = Arc::new(MemoryIndex::new());
    let embedder = Arc::new(BucketEmbedder);
    let learner = FeedbackLearner::new(
        Arc::new(PatternStore::new()),
        Arc::clone(&registry),
        Arc::clone(&index) as Arc<dyn SimilarityIndex>,
        Arc::clone(&embedder) as Arc<dyn EmbeddingProvider>,
        FeedbackConfig::default(),
    );
    Loop {
        learner,
        registry,
        index,
        embedder,
    }
}

async fn register(lp: &Loop, stage: Stage, strategy: &str, text: &str) -> riff_core::CandidateId {
    let candidate = Candidate::from_text(stage, text, strategy, "ollama:test", 0);
    let id = candidate.id;
    lp.registry.register(candidate).await;
    id
}

#[tokio::test]
async fn rated_winners_become_retrievable_examples() {
    let lp = learning_loop();

    let winner = register(
        &lp,
        Stage::Copy,
        "short-punchy",
        "Ship faster with the toolkit your team already knows.",
    )
    .await;
    let loser = register(
        &lp,
        Stage::Copy,
        "detailed",
        "Our enterprise-grade synergy platform leverages paradigms.",
    )
    .await;

    lp.learner.record_user_score(winner, 5, None, true).await.unwrap();
    lp.learner.record_user_score(loser, 1, None, false).await.unwrap();

    // Retrieval the way the orchestrator does it: same stage, winners
    // only, ranked by similarity to the new request context.
    let context = lp
        .embedder
        .embed("Ship your toolkit faster, for teams")
        .await
        .unwrap();
    let hits = lp
        .index
        .query(
            &context,
            &IndexFilter {
                stage: Some(Stage::Copy),
                performed_well: Some(true),
                ..Default::default()
            },
            3,
        )
        .await
        .unwrap();

    assert_eq!(hits.len(), 1, "only the winner qualifies");
    assert_eq!(hits[0].candidate_id, winner);
    assert!(hits[0].content_text.contains("Ship faster"));
}

#[tokio::test]
async fn pattern_stats_separate_stages_and_strategies() {
    let lp = learning_loop();

    let copy = register(&lp, Stage::Copy, "short-punchy", "Buy it today.").await;
    let hook = register(&lp, Stage::Hook, "question", "Why settle for less?").await;
    lp.learner.record_user_score(copy, 4, None, true).await.unwrap();
    lp.learner.record_user_score(hook, 2, None, false).await.unwrap();

    let stats = lp.learner.pattern_stats(None);
    assert_eq!(stats.len(), 2);
    let keys: Vec<&str> = stats.iter().map(|p| p.pattern_key.as_str()).collect();
    assert!(keys.iter().any(|k| k.starts_with("copy:short-punchy")));
    assert!(keys.iter().any(|k| k.starts_with("hook:question")));
}

#[tokio::test]
async fn full_lifecycle_rating_backfill_and_retrieval_flip() {
    let lp = learning_loop();

    let id = register(
        &lp,
        Stage::Hook,
        "bold-claim",
        "This one trick doubles your open rate.",
    )
    .await;

    // Loved by the reviewer: indexed as a winner.
    lp.learner.record_user_score(id, 5, None, true).await.unwrap();
    let vector = lp
        .embedder
        .embed("This one trick doubles your open rate.")
        .await
        .unwrap();
    let winners = IndexFilter {
        performed_well: Some(true),
        ..Default::default()
    };
    assert_eq!(lp.index.query(&vector, &winners, 5).await.unwrap().len(), 1);

    // Real-world engagement tanks: the back-fill re-aggregates and the
    // index entry flips out of the performed-well set.
    let updated = lp.learner.record_outcome(id, 0.0).await.unwrap();
    assert!(updated.combined_reward < 0.6);
    assert!(lp.index.query(&vector, &winners, 5).await.unwrap().is_empty());
    assert_eq!(lp.index.len().await.unwrap(), 1, "entry revised, not duplicated");

    // And the pattern saw exactly one event throughout.
    let stats = lp.learner.pattern_stats(None);
    assert_eq!(stats.len(), 1);
    assert_eq!(stats[0].usage_count, 1);
}
