//! Embedding batch orchestration
//!
//! Wraps an [`EmbeddingProvider`] with sanitization, provider batch
//! limits, per-item retry and zero-vector placeholders, so one bad text
//! never sinks a whole document. Output always aligns index-for-index
//! with the input.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::domain::embedding::{
    BatchEmbeddingResult, EmbeddingProvider, EmbeddingRequest, EmbeddingResult,
};
use crate::domain::llm::pricing;
use crate::domain::DomainError;
use crate::infrastructure::ingestion::sanitizer::{
    exceeds_token_limit, validate_for_embedding, EMBEDDING_TOKEN_LIMIT,
};

/// Provider-imposed ceiling on items per request.
pub const MAX_BATCH_SIZE: usize = 100;

/// Batching embedder bound to one model.
#[derive(Debug)]
pub struct EmbeddingBatcher<P: EmbeddingProvider> {
    provider: Arc<P>,
    model: String,
    dimensions: usize,
    batch_size: usize,
}

impl<P: EmbeddingProvider> EmbeddingBatcher<P> {
    /// Create a batcher for `model`.
    ///
    /// Fails when the provider does not know the model, since placeholder
    /// vectors need the dimensionality up front.
    pub fn new(provider: Arc<P>, model: impl Into<String>) -> Result<Self, DomainError> {
        let model = model.into();
        let dimensions = provider.dimensions(&model).ok_or_else(|| {
            DomainError::configuration(format!("unknown embedding model: {}", model))
        })?;

        Ok(Self {
            provider,
            model,
            dimensions,
            batch_size: MAX_BATCH_SIZE,
        })
    }

    /// Lower the per-request batch size (clamped to the provider ceiling).
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.clamp(1, MAX_BATCH_SIZE);
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// Embed every text, one placeholder per unembeddable item.
    ///
    /// Each text is sanitized first; items empty after sanitization or
    /// over the token limit are excluded up front and recorded as failed.
    /// A failing sub-batch is retried one item at a time so a single bad
    /// item does not sacrifice its neighbours.
    pub async fn embed_batch(&self, texts: &[String]) -> BatchEmbeddingResult {
        if texts.is_empty() {
            return BatchEmbeddingResult::empty();
        }

        let mut vectors: Vec<Option<Vec<f32>>> = vec![None; texts.len()];
        let mut failed: Vec<usize> = Vec::new();
        let mut total_tokens = 0u32;
        let mut total_cost = 0.0f64;

        // Pre-flight: sanitize and gate every item.
        let mut eligible: Vec<(usize, String)> = Vec::with_capacity(texts.len());
        for (index, text) in texts.iter().enumerate() {
            let validation = validate_for_embedding(text);
            if !validation.issues.is_empty() {
                debug!(index, issues = ?validation.issues, "embedding input needed sanitization");
            }

            if !validation.valid {
                warn!(index, "text empty after sanitization, marking failed");
                failed.push(index);
            } else if exceeds_token_limit(&validation.sanitized, EMBEDDING_TOKEN_LIMIT) {
                warn!(index, "text exceeds embedding token limit, marking failed");
                failed.push(index);
            } else {
                eligible.push((index, validation.sanitized));
            }
        }

        for sub_batch in eligible.chunks(self.batch_size) {
            let inputs: Vec<String> = sub_batch.iter().map(|(_, text)| text.clone()).collect();
            let request = EmbeddingRequest::batch(&self.model, inputs);

            match self.provider.embed(request).await {
                Ok(response) => {
                    let tokens = response.usage().total_tokens();
                    total_tokens += tokens;
                    total_cost += pricing::embedding_cost(&self.model, tokens);

                    for ((index, _), embedding) in
                        sub_batch.iter().zip(response.into_embeddings())
                    {
                        vectors[*index] = Some(embedding.into_vector());
                    }
                }
                Err(e) => {
                    warn!(error = %e, size = sub_batch.len(),
                        "sub-batch embedding failed, retrying items one by one");

                    for (index, text) in sub_batch {
                        match self.embed_sanitized(text).await {
                            Ok(result) => {
                                total_tokens += result.tokens;
                                total_cost += result.cost;
                                vectors[*index] = Some(result.embedding);
                            }
                            Err(e) => {
                                warn!(index, error = %e, "single item embedding failed");
                                failed.push(*index);
                            }
                        }
                    }
                }
            }
        }

        // Alignment: any index without a vector gets a placeholder.
        let embeddings: Vec<Vec<f32>> = vectors
            .into_iter()
            .enumerate()
            .map(|(index, vector)| {
                vector.unwrap_or_else(|| {
                    if !failed.contains(&index) {
                        failed.push(index);
                    }
                    vec![0.0; self.dimensions]
                })
            })
            .collect();

        failed.sort_unstable();
        failed.dedup();

        BatchEmbeddingResult {
            embeddings,
            total_tokens,
            total_cost,
            failed_indices: failed,
        }
    }

    /// Embed a single text, e.g. a retrieval query.
    ///
    /// Unlike the batch path this propagates failure: there is no
    /// placeholder that makes sense for a query.
    pub async fn embed_one(&self, text: &str) -> Result<EmbeddingResult, DomainError> {
        let validation = validate_for_embedding(text);
        if !validation.valid {
            return Err(DomainError::validation("text empty after sanitization"));
        }
        if exceeds_token_limit(&validation.sanitized, EMBEDDING_TOKEN_LIMIT) {
            return Err(DomainError::validation("text exceeds embedding token limit"));
        }

        self.embed_sanitized(&validation.sanitized).await
    }

    async fn embed_sanitized(&self, text: &str) -> Result<EmbeddingResult, DomainError> {
        let request = EmbeddingRequest::single(&self.model, text);
        let response = self.provider.embed(request).await?;

        let tokens = response.usage().total_tokens();
        let embedding = response
            .into_embeddings()
            .into_iter()
            .next()
            .ok_or_else(|| DomainError::embedding("provider returned no embedding"))?
            .into_vector();

        Ok(EmbeddingResult {
            embedding,
            tokens,
            cost: pricing::embedding_cost(&self.model, tokens),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::embedding::MockEmbeddingProvider;

    fn batcher(provider: MockEmbeddingProvider) -> EmbeddingBatcher<MockEmbeddingProvider> {
        EmbeddingBatcher::new(Arc::new(provider), "mock-model").unwrap()
    }

    #[tokio::test]
    async fn test_output_length_equals_input_length() {
        let batcher = batcher(MockEmbeddingProvider::new("mock", 8));
        let texts: Vec<String> = (0..7).map(|i| format!("tekst nummer {}", i)).collect();

        let result = batcher.embed_batch(&texts).await;

        assert_eq!(result.embeddings.len(), 7);
        assert!(result.failed_indices.is_empty());
        assert!(result.total_tokens > 0);
        assert!(result.total_cost > 0.0);
    }

    #[tokio::test]
    async fn test_oversized_item_gets_placeholder() {
        let batcher = batcher(MockEmbeddingProvider::new("mock", 8));
        let texts = vec![
            "gewone tekst een".to_string(),
            "woord ".repeat(10_000),
            "gewone tekst twee".to_string(),
        ];

        let result = batcher.embed_batch(&texts).await;

        assert_eq!(result.failed_indices, vec![1]);
        assert_eq!(result.embeddings[1], vec![0.0; 8]);
        assert_ne!(result.embeddings[0], vec![0.0; 8]);
        assert_ne!(result.embeddings[2], vec![0.0; 8]);
    }

    #[tokio::test]
    async fn test_empty_after_sanitization_fails_item() {
        let batcher = batcher(MockEmbeddingProvider::new("mock", 8));
        let texts = vec!["echte inhoud".to_string(), "\u{200B}\u{FEFF}".to_string()];

        let result = batcher.embed_batch(&texts).await;

        assert_eq!(result.failed_indices, vec![1]);
        assert_eq!(result.embeddings.len(), 2);
    }

    #[tokio::test]
    async fn test_batch_failure_falls_back_to_single_items() {
        let provider = MockEmbeddingProvider::new("mock", 8).with_failing_batches();
        let batcher = batcher(provider);
        let texts = vec!["een".to_string(), "twee".to_string(), "drie".to_string()];

        let result = batcher.embed_batch(&texts).await;

        // All three recovered one by one.
        assert!(result.failed_indices.is_empty());
        for embedding in &result.embeddings {
            assert_ne!(embedding, &vec![0.0; 8]);
        }
    }

    #[tokio::test]
    async fn test_poisoned_item_fails_alone() {
        let provider = MockEmbeddingProvider::new("mock", 8).with_failing_text("gif");
        let batcher = batcher(provider);
        let texts = vec![
            "schone tekst".to_string(),
            "tekst met gif erin".to_string(),
            "nog een schone".to_string(),
        ];

        let result = batcher.embed_batch(&texts).await;

        assert_eq!(result.failed_indices, vec![1]);
        assert_eq!(result.embeddings[1], vec![0.0; 8]);
        assert_ne!(result.embeddings[0], vec![0.0; 8]);
        assert_ne!(result.embeddings[2], vec![0.0; 8]);
    }

    #[tokio::test]
    async fn test_all_failed_provider() {
        let provider = MockEmbeddingProvider::new("mock", 4).with_error("down");
        let batcher = batcher(provider);
        let texts = vec!["a".to_string(), "b".to_string()];

        let result = batcher.embed_batch(&texts).await;

        assert_eq!(result.failed_indices, vec![0, 1]);
        assert_eq!(result.embeddings, vec![vec![0.0; 4], vec![0.0; 4]]);
        assert_eq!(result.total_tokens, 0);
    }

    #[tokio::test]
    async fn test_sub_batching_respects_size() {
        let batcher = batcher(MockEmbeddingProvider::new("mock", 8)).with_batch_size(2);
        let texts: Vec<String> = (0..5).map(|i| format!("tekst {}", i)).collect();

        let result = batcher.embed_batch(&texts).await;

        assert_eq!(result.embeddings.len(), 5);
        assert!(result.failed_indices.is_empty());
    }

    #[tokio::test]
    async fn test_empty_input() {
        let batcher = batcher(MockEmbeddingProvider::new("mock", 8));
        let result = batcher.embed_batch(&[]).await;

        assert!(result.embeddings.is_empty());
        assert!(result.failed_indices.is_empty());
    }

    #[test]
    fn test_unknown_model_rejected_upfront() {
        #[derive(Debug)]
        struct NoModels;

        #[async_trait::async_trait]
        impl EmbeddingProvider for NoModels {
            async fn embed(
                &self,
                _request: EmbeddingRequest,
            ) -> Result<crate::domain::embedding::EmbeddingResponse, DomainError> {
                unreachable!("never called")
            }

            fn provider_name(&self) -> &'static str {
                "none"
            }

            fn dimensions(&self, _model: &str) -> Option<usize> {
                None
            }
        }

        let result = EmbeddingBatcher::new(Arc::new(NoModels), "mystery-model");
        assert!(matches!(result, Err(DomainError::Configuration { .. })));
    }

    #[tokio::test]
    async fn test_embed_one() {
        let batcher = batcher(MockEmbeddingProvider::new("mock", 8));

        let result = batcher.embed_one("wat is het verlofbeleid?").await.unwrap();

        assert_eq!(result.embedding.len(), 8);
        assert!(result.tokens > 0);
    }

    #[tokio::test]
    async fn test_embed_one_empty_is_fatal() {
        let batcher = batcher(MockEmbeddingProvider::new("mock", 8));

        let result = batcher.embed_one("  \u{200B} ").await;
        assert!(matches!(result, Err(DomainError::Validation { .. })));
    }
}
