//! Embedding provider trait definition

use async_trait::async_trait;
use std::fmt::Debug;

use super::{EmbeddingRequest, EmbeddingResponse};
use crate::domain::DomainError;

/// Trait for embedding providers (OpenAI, Cohere, etc.)
#[async_trait]
pub trait EmbeddingProvider: Send + Sync + Debug {
    /// Generate embeddings for the given input
    async fn embed(&self, request: EmbeddingRequest) -> Result<EmbeddingResponse, DomainError>;

    /// Get the provider name
    fn provider_name(&self) -> &'static str;

    /// Get the embedding dimensions for a model
    fn dimensions(&self, model: &str) -> Option<usize>;
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use crate::domain::embedding::{Embedding, EmbeddingUsage};

    /// Mock embedding provider producing deterministic vectors.
    ///
    /// Vectors are derived from a byte-sum hash of the text, so the same
    /// text always embeds identically within a test. Failure modes can be
    /// injected per batch or per matching text to exercise the batcher's
    /// fallback paths.
    #[derive(Debug)]
    pub struct MockEmbeddingProvider {
        name: &'static str,
        dimensions: usize,
        error: Option<String>,
        fail_batch_requests: bool,
        fail_containing: Option<String>,
    }

    impl MockEmbeddingProvider {
        pub fn new(name: &'static str, dimensions: usize) -> Self {
            Self {
                name,
                dimensions,
                error: None,
                fail_batch_requests: false,
                fail_containing: None,
            }
        }

        /// Fail every call unconditionally.
        pub fn with_error(mut self, error: impl Into<String>) -> Self {
            self.error = Some(error.into());
            self
        }

        /// Fail requests carrying more than one input, so the batcher is
        /// forced into its one-by-one fallback.
        pub fn with_failing_batches(mut self) -> Self {
            self.fail_batch_requests = true;
            self
        }

        /// Fail any request whose inputs contain the given substring.
        pub fn with_failing_text(mut self, needle: impl Into<String>) -> Self {
            self.fail_containing = Some(needle.into());
            self
        }

        /// The deterministic vector this mock produces for `text`.
        pub fn vector_for(&self, text: &str) -> Vec<f32> {
            let hash = text.bytes().fold(0u64, |acc, b| acc.wrapping_add(b as u64));
            (0..self.dimensions)
                .map(|i| ((hash.wrapping_add(i as u64) % 1000) as f32 / 1000.0) - 0.5)
                .collect()
        }
    }

    #[async_trait]
    impl EmbeddingProvider for MockEmbeddingProvider {
        async fn embed(&self, request: EmbeddingRequest) -> Result<EmbeddingResponse, DomainError> {
            if let Some(ref error) = self.error {
                return Err(DomainError::provider(self.name, error));
            }

            if self.fail_batch_requests && request.len() > 1 {
                return Err(DomainError::provider(self.name, "batch request rejected"));
            }

            if let Some(ref needle) = self.fail_containing {
                if request.inputs().iter().any(|text| text.contains(needle)) {
                    return Err(DomainError::provider(self.name, "poisoned input"));
                }
            }

            let embeddings: Vec<Embedding> = request
                .inputs()
                .iter()
                .enumerate()
                .map(|(idx, text)| Embedding::new(idx, self.vector_for(text)))
                .collect();

            let total_tokens = request
                .inputs()
                .iter()
                .map(|t| (t.len() / 4).max(1))
                .sum::<usize>() as u32;

            Ok(EmbeddingResponse::new(
                request.model().to_string(),
                embeddings,
                EmbeddingUsage::new(total_tokens),
            ))
        }

        fn provider_name(&self) -> &'static str {
            self.name
        }

        fn dimensions(&self, _model: &str) -> Option<usize> {
            Some(self.dimensions)
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[tokio::test]
        async fn test_deterministic_embeddings() {
            let provider = MockEmbeddingProvider::new("test", 128);

            let first = provider
                .embed(EmbeddingRequest::single("mock", "Hallo"))
                .await
                .unwrap();
            let second = provider
                .embed(EmbeddingRequest::single("mock", "Hallo"))
                .await
                .unwrap();

            assert_eq!(first.first().unwrap().vector(), second.first().unwrap().vector());
            assert_eq!(first.first().unwrap().dimensions(), 128);
        }

        #[tokio::test]
        async fn test_failing_batches_allows_single() {
            let provider = MockEmbeddingProvider::new("test", 8).with_failing_batches();

            let batch = EmbeddingRequest::batch("mock", vec!["a".into(), "b".into()]);
            assert!(provider.embed(batch).await.is_err());

            let single = EmbeddingRequest::single("mock", "a");
            assert!(provider.embed(single).await.is_ok());
        }

        #[tokio::test]
        async fn test_failing_text() {
            let provider = MockEmbeddingProvider::new("test", 8).with_failing_text("bad");

            let poisoned = EmbeddingRequest::single("mock", "a bad text");
            assert!(provider.embed(poisoned).await.is_err());
        }
    }
}
