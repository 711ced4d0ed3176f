//! In-memory similarity index

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{cosine_similarity, IndexEntry, IndexFilter, IndexHit, SimilarityIndex};
use crate::Result;
use riff_core::CandidateId;

/// Brute-force in-memory index.
///
/// Linear scan per query is fine at the scale the engine retrieves (top-k
/// of a few thousand rated candidates); larger deployments put an ANN
/// store behind the [`SimilarityIndex`] trait instead.
#[derive(Debug, Default)]
pub struct MemoryIndex {
    entries: RwLock<HashMap<CandidateId, IndexEntry>>,
}

impl MemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SimilarityIndex for MemoryIndex {
    async fn upsert(&self, entry: IndexEntry) -> Result<()> {
        self.entries.write().await.insert(entry.candidate_id, entry);
        Ok(())
    }

    async fn query(
        &self,
        vector: &[f32],
        filter: &IndexFilter,
        top_k: usize,
    ) -> Result<Vec<IndexHit>> {
        let entries = self.entries.read().await;
        let mut hits: Vec<IndexHit> = entries
            .values()
            .filter(|e| filter.stage.is_none_or(|s| e.stage == s))
            .filter(|e| filter.performed_well.is_none_or(|p| e.performed_well == p))
            .filter(|e| filter.scope.as_ref().is_none_or(|s| &e.scope == s))
            .map(|e| IndexHit {
                candidate_id: e.candidate_id,
                similarity: cosine_similarity(vector, &e.embedding),
                stage: e.stage,
                performed_well: e.performed_well,
                content_text: e.content_text.clone(),
            })
            .filter(|h| filter.min_similarity.is_none_or(|min| h.similarity >= min))
            .collect();
        hits.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        hits.truncate(top_k);
        Ok(hits)
    }

    async fn len(&self) -> Result<usize> {
        Ok(self.entries.read().await.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Scope;
    use riff_core::Stage;

    fn entry(stage: Stage, performed_well: bool, embedding: Vec<f32>, text: &str) -> IndexEntry {
        IndexEntry {
            candidate_id: CandidateId::new(),
            embedding,
            stage,
            performed_well,
            scope: Scope::Global,
            content_text: text.to_string(),
            reward: if performed_well { 0.9 } else { 0.2 },
        }
    }

    #[tokio::test]
    async fn upsert_then_query_finds_entry() {
        let index = MemoryIndex::new();
        index
            .upsert(entry(Stage::Copy, true, vec![1.0, 0.0], "winning copy"))
            .await
            .unwrap();

        let hits = index
            .query(&[1.0, 0.0], &IndexFilter::default(), 10)
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert!((hits[0].similarity - 1.0).abs() < 1e-9);
        assert_eq!(hits[0].content_text, "winning copy");
    }

    #[tokio::test]
    async fn upsert_replaces_existing_entry() {
        let index = MemoryIndex::new();
        let mut e = entry(Stage::Copy, false, vec![1.0, 0.0], "first");
        let id = e.candidate_id;
        index.upsert(e.clone()).await.unwrap();

        e.performed_well = true;
        e.content_text = "revised".to_string();
        index.upsert(e).await.unwrap();

        assert_eq!(index.len().await.unwrap(), 1);
        let hits = index
            .query(&[1.0, 0.0], &IndexFilter::default(), 10)
            .await
            .unwrap();
        assert_eq!(hits[0].candidate_id, id);
        assert!(hits[0].performed_well);
        assert_eq!(hits[0].content_text, "revised");
    }

    #[tokio::test]
    async fn query_filters_by_stage_and_outcome() {
        let index = MemoryIndex::new();
        index
            .upsert(entry(Stage::Copy, true, vec![1.0, 0.0], "good copy"))
            .await
            .unwrap();
        index
            .upsert(entry(Stage::Copy, false, vec![1.0, 0.0], "bad copy"))
            .await
            .unwrap();
        index
            .upsert(entry(Stage::Hook, true, vec![1.0, 0.0], "good hook"))
            .await
            .unwrap();

        let filter = IndexFilter {
            stage: Some(Stage::Copy),
            performed_well: Some(true),
            ..IndexFilter::default()
        };
        let hits = index.query(&[1.0, 0.0], &filter, 10).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].content_text, "good copy");
    }

    #[tokio::test]
    async fn query_respects_min_similarity() {
        let index = MemoryIndex::new();
        index
            .upsert(entry(Stage::Copy, true, vec![1.0, 0.0], "aligned"))
            .await
            .unwrap();
        index
            .upsert(entry(Stage::Copy, true, vec![0.0, 1.0], "orthogonal"))
            .await
            .unwrap();

        let filter = IndexFilter {
            min_similarity: Some(0.5),
            ..IndexFilter::default()
        };
        let hits = index.query(&[1.0, 0.0], &filter, 10).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].content_text, "aligned");
    }

    #[tokio::test]
    async fn query_orders_by_similarity_and_truncates() {
        let index = MemoryIndex::new();
        index
            .upsert(entry(Stage::Copy, true, vec![1.0, 0.0], "exact"))
            .await
            .unwrap();
        index
            .upsert(entry(Stage::Copy, true, vec![0.9, 0.1], "close"))
            .await
            .unwrap();
        index
            .upsert(entry(Stage::Copy, true, vec![0.5, 0.5], "far"))
            .await
            .unwrap();

        let hits = index
            .query(&[1.0, 0.0], &IndexFilter::default(), 2)
            .await
            .unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].content_text, "exact");
        assert_eq!(hits[1].content_text, "close");
    }

    #[tokio::test]
    async fn query_filters_by_scope() {
        let index = MemoryIndex::new();
        let mut mine = entry(Stage::Copy, true, vec![1.0, 0.0], "mine");
        mine.scope = Scope::Owner("a".into());
        let mut theirs = entry(Stage::Copy, true, vec![1.0, 0.0], "theirs");
        theirs.scope = Scope::Owner("b".into());
        index.upsert(mine).await.unwrap();
        index.upsert(theirs).await.unwrap();

        let filter = IndexFilter {
            scope: Some(Scope::Owner("a".into())),
            ..IndexFilter::default()
        };
        let hits = index.query(&[1.0, 0.0], &filter, 10).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].content_text, "mine");
    }

    #[tokio::test]
    async fn concurrent_writes_and_reads_settle() {
        use std::sync::Arc;

        let index = Arc::new(MemoryIndex::new());
        let mut handles = Vec::new();
        for i in 0..16 {
            let index = Arc::clone(&index);
            handles.push(tokio::spawn(async move {
                index
                    .upsert(entry(
                        Stage::Copy,
                        true,
                        vec![i as f32, 1.0],
                        &format!("entry {i}"),
                    ))
                    .await
                    .unwrap();
                // Reads interleave with other writers.
                index
                    .query(&[1.0, 1.0], &IndexFilter::default(), 4)
                    .await
                    .unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }
        assert_eq!(index.len().await.unwrap(), 16);
    }
}
