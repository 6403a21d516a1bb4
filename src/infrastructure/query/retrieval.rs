//! Retrieval-side search
//!
//! Composes query expansion, query embedding and the tenant's vector
//! store into one search call, mirroring how chunks were indexed.

use std::sync::Arc;

use tracing::info;

use super::expansion::{detect_follow_up, QueryExpander, QueryExpansionResult};
use crate::domain::{
    DomainError, EmbeddingProvider, LlmProvider, Message, SearchResult, VectorStore,
};
use crate::infrastructure::embedding::EmbeddingBatcher;

/// Default number of hits requested from the store.
pub const DEFAULT_TOP_K: usize = 10;

/// Default similarity floor for retrieval.
pub const DEFAULT_SIMILARITY_THRESHOLD: f32 = 0.7;

/// Search hits plus what the query cost to run.
#[derive(Debug, Clone)]
pub struct RetrievedContext {
    pub results: Vec<SearchResult>,
    pub query_used: String,
    pub was_expanded: bool,
    pub cost: f64,
}

/// Tenant-scoped retrieval over the vector store.
#[derive(Debug)]
pub struct RetrievalService<L, E, S>
where
    L: LlmProvider,
    E: EmbeddingProvider,
    S: VectorStore,
{
    expander: QueryExpander<L>,
    batcher: EmbeddingBatcher<E>,
    store: Arc<S>,
    top_k: usize,
    similarity_threshold: f32,
}

impl<L, E, S> RetrievalService<L, E, S>
where
    L: LlmProvider,
    E: EmbeddingProvider,
    S: VectorStore,
{
    pub fn new(expander: QueryExpander<L>, batcher: EmbeddingBatcher<E>, store: Arc<S>) -> Self {
        Self {
            expander,
            batcher,
            store,
            top_k: DEFAULT_TOP_K,
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
        }
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn with_similarity_threshold(mut self, threshold: f32) -> Self {
        self.similarity_threshold = threshold;
        self
    }

    /// Search the tenant's corpus, expanding follow-up queries first.
    pub async fn search(
        &self,
        tenant_id: &str,
        query: &str,
        history: &[Message],
    ) -> Result<RetrievedContext, DomainError> {
        let expansion = if detect_follow_up(query) {
            self.expander.expand(query, history).await
        } else {
            QueryExpansionResult::unchanged(query)
        };

        let embedded = self.batcher.embed_one(&expansion.expanded_query).await?;

        let results = self
            .store
            .similarity_search(
                tenant_id,
                &embedded.embedding,
                &expansion.expanded_query,
                self.top_k,
                self.similarity_threshold,
            )
            .await?;

        info!(
            tenant_id,
            hits = results.len(),
            was_expanded = expansion.was_expanded,
            "retrieval complete"
        );

        Ok(RetrievedContext {
            results,
            query_used: expansion.expanded_query,
            was_expanded: expansion.was_expanded,
            cost: expansion.cost + embedded.cost,
        })
    }
}
