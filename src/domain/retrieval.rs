//! Vector/content store trait
//!
//! The store itself (pgvector, OpenSearch, ...) lives outside this crate;
//! the pipeline only needs similarity search and chunk persistence. Both
//! are tenant-scoped.

use std::collections::HashMap;
use std::fmt::Debug;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::document::StructuredChunk;
use crate::domain::DomainError;

/// A search hit from the vector store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    pub content: String,
    /// Similarity score in [0, 1]
    pub score: f32,
    pub metadata: HashMap<String, serde_json::Value>,
}

impl SearchResult {
    pub fn new(content: impl Into<String>, score: f32) -> Self {
        Self {
            content: content.into(),
            score,
            metadata: HashMap::new(),
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }
}

/// Outcome of persisting a batch of chunks.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreOutcome {
    pub stored: usize,
    pub failed: usize,
}

/// Trait for the external vector/content store.
#[async_trait]
pub trait VectorStore: Send + Sync + Debug {
    /// Search the tenant's corpus by embedding similarity.
    ///
    /// `query_text` accompanies the embedding for stores that combine
    /// vector and keyword matching. Results below `similarity_threshold`
    /// are excluded; at most `top_k` hits are returned, best first.
    async fn similarity_search(
        &self,
        tenant_id: &str,
        query_embedding: &[f32],
        query_text: &str,
        top_k: usize,
        similarity_threshold: f32,
    ) -> Result<Vec<SearchResult>, DomainError>;

    /// Persist chunks with their embeddings for the tenant.
    ///
    /// `embeddings` is parallel to `chunks`; entries flagged as failed by
    /// the batcher are stored without a vector by the implementation or
    /// skipped, at its discretion.
    async fn store_chunks(
        &self,
        tenant_id: &str,
        chunks: &[StructuredChunk],
        embeddings: &[Vec<f32>],
    ) -> Result<StoreOutcome, DomainError>;
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::sync::Mutex;

    /// In-memory mock store.
    ///
    /// Search results can be scripted globally or per query-text
    /// substring; stored chunks are recorded for assertions.
    #[derive(Debug, Default)]
    pub struct MockVectorStore {
        results: Vec<SearchResult>,
        keyed_results: Vec<(String, Vec<SearchResult>)>,
        error: Option<String>,
        stored: Mutex<Vec<(String, Vec<StructuredChunk>, Vec<Vec<f32>>)>>,
    }

    impl MockVectorStore {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_search_results(mut self, results: Vec<SearchResult>) -> Self {
            self.results = results;
            self
        }

        /// Return `results` only for queries containing `needle`.
        pub fn with_results_for(
            mut self,
            needle: impl Into<String>,
            results: Vec<SearchResult>,
        ) -> Self {
            self.keyed_results.push((needle.into(), results));
            self
        }

        pub fn with_error(mut self, error: impl Into<String>) -> Self {
            self.error = Some(error.into());
            self
        }

        /// Chunks stored so far, per store_chunks call.
        pub fn stored(&self) -> Vec<(String, Vec<StructuredChunk>, Vec<Vec<f32>>)> {
            self.stored.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl VectorStore for MockVectorStore {
        async fn similarity_search(
            &self,
            _tenant_id: &str,
            _query_embedding: &[f32],
            query_text: &str,
            top_k: usize,
            similarity_threshold: f32,
        ) -> Result<Vec<SearchResult>, DomainError> {
            if let Some(ref error) = self.error {
                return Err(DomainError::store(error));
            }

            let source = self
                .keyed_results
                .iter()
                .find(|(needle, _)| query_text.contains(needle))
                .map(|(_, results)| results)
                .unwrap_or(&self.results);

            let mut hits: Vec<SearchResult> = source
                .iter()
                .filter(|r| r.score >= similarity_threshold)
                .cloned()
                .collect();
            hits.sort_by(|a, b| b.score.total_cmp(&a.score));
            hits.truncate(top_k);

            Ok(hits)
        }

        async fn store_chunks(
            &self,
            tenant_id: &str,
            chunks: &[StructuredChunk],
            embeddings: &[Vec<f32>],
        ) -> Result<StoreOutcome, DomainError> {
            if let Some(ref error) = self.error {
                return Err(DomainError::store(error));
            }

            self.stored.lock().unwrap().push((
                tenant_id.to_string(),
                chunks.to_vec(),
                embeddings.to_vec(),
            ));

            Ok(StoreOutcome {
                stored: chunks.len(),
                failed: 0,
            })
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[tokio::test]
        async fn test_threshold_and_top_k() {
            let store = MockVectorStore::new().with_search_results(vec![
                SearchResult::new("high", 0.9),
                SearchResult::new("mid", 0.5),
                SearchResult::new("low", 0.1),
            ]);

            let hits = store
                .similarity_search("t1", &[0.0], "query", 1, 0.25)
                .await
                .unwrap();

            assert_eq!(hits.len(), 1);
            assert_eq!(hits[0].content, "high");
        }

        #[tokio::test]
        async fn test_keyed_results() {
            let store = MockVectorStore::new()
                .with_results_for("verlof", vec![SearchResult::new("hit", 0.72)]);

            let hits = store
                .similarity_search("t1", &[0.0], "wat is verlof", 8, 0.25)
                .await
                .unwrap();
            assert_eq!(hits.len(), 1);

            let misses = store
                .similarity_search("t1", &[0.0], "iets anders", 8, 0.25)
                .await
                .unwrap();
            assert!(misses.is_empty());
        }
    }
}
