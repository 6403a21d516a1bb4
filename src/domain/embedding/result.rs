//! Embedding results as consumed by the pipeline

use serde::{Deserialize, Serialize};

/// Result of embedding a single text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingResult {
    pub embedding: Vec<f32>,
    pub tokens: u32,
    pub cost: f64,
}

/// Result of embedding a batch of texts.
///
/// `embeddings.len()` always equals the input length. Indices listed in
/// `failed_indices` hold an all-zero placeholder vector; callers must
/// treat those entries as non-authoritative and flag them for
/// re-processing rather than deleting them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchEmbeddingResult {
    pub embeddings: Vec<Vec<f32>>,
    pub total_tokens: u32,
    pub total_cost: f64,
    pub failed_indices: Vec<usize>,
}

impl BatchEmbeddingResult {
    /// An empty result for an empty input batch.
    pub fn empty() -> Self {
        Self {
            embeddings: Vec::new(),
            total_tokens: 0,
            total_cost: 0.0,
            failed_indices: Vec::new(),
        }
    }

    pub fn failed(&self, index: usize) -> bool {
        self.failed_indices.contains(&index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_result() {
        let result = BatchEmbeddingResult::empty();
        assert!(result.embeddings.is_empty());
        assert_eq!(result.total_tokens, 0);
    }

    #[test]
    fn test_failed_lookup() {
        let result = BatchEmbeddingResult {
            embeddings: vec![vec![0.0; 4]; 2],
            total_tokens: 0,
            total_cost: 0.0,
            failed_indices: vec![1],
        };

        assert!(!result.failed(0));
        assert!(result.failed(1));
    }
}
