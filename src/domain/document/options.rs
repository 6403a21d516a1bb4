//! Chunking options

use serde::{Deserialize, Serialize};

use crate::domain::DomainError;

/// Per-call chunking configuration.
///
/// Every field has a serde default, so callers can supply a partial
/// options object and get an effective value merged from defaults.
/// Options are never mutated during a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmartChunkingOptions {
    /// Target chunk size in characters
    #[serde(default = "default_target_chunk_size")]
    pub target_chunk_size: usize,
    /// Chunks shorter than this are merged into their predecessor
    #[serde(default = "default_min_chunk_size")]
    pub min_chunk_size: usize,
    /// Hard upper bound on chunk size
    #[serde(default = "default_max_chunk_size")]
    pub max_chunk_size: usize,
    /// Overlap between consecutive chunks, as a percentage of the target size
    #[serde(default = "default_overlap_percent")]
    pub overlap_percent: u8,
    /// Detect chapters/articles/sections and attach them to chunks
    #[serde(default = "default_true")]
    pub detect_structure: bool,
    /// Delegate boundary selection to the LLM
    #[serde(default)]
    pub use_semantic_chunking: bool,
    /// Prefix each chunk with a breadcrumb header
    #[serde(default = "default_true")]
    pub add_context_headers: bool,
    /// Fold undersized chunks into their predecessor
    #[serde(default = "default_true")]
    pub merge_small_chunks: bool,
    /// Model used for semantic chunking
    #[serde(default = "default_semantic_model")]
    pub semantic_model: String,
    /// Number of chunks embedded per provider call
    #[serde(default = "default_embedding_batch_size")]
    pub embedding_batch_size: usize,
}

fn default_target_chunk_size() -> usize {
    1000
}

fn default_min_chunk_size() -> usize {
    100
}

fn default_max_chunk_size() -> usize {
    2000
}

fn default_overlap_percent() -> u8 {
    10
}

fn default_true() -> bool {
    true
}

fn default_semantic_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_embedding_batch_size() -> usize {
    100
}

impl Default for SmartChunkingOptions {
    fn default() -> Self {
        Self {
            target_chunk_size: default_target_chunk_size(),
            min_chunk_size: default_min_chunk_size(),
            max_chunk_size: default_max_chunk_size(),
            overlap_percent: default_overlap_percent(),
            detect_structure: true,
            use_semantic_chunking: false,
            add_context_headers: true,
            merge_small_chunks: true,
            semantic_model: default_semantic_model(),
            embedding_batch_size: default_embedding_batch_size(),
        }
    }
}

impl SmartChunkingOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_target_chunk_size(mut self, size: usize) -> Self {
        self.target_chunk_size = size;
        self
    }

    pub fn with_min_chunk_size(mut self, size: usize) -> Self {
        self.min_chunk_size = size;
        self
    }

    pub fn with_max_chunk_size(mut self, size: usize) -> Self {
        self.max_chunk_size = size;
        self
    }

    pub fn with_overlap_percent(mut self, percent: u8) -> Self {
        self.overlap_percent = percent;
        self
    }

    pub fn with_semantic_chunking(mut self, enabled: bool) -> Self {
        self.use_semantic_chunking = enabled;
        self
    }

    pub fn with_semantic_model(mut self, model: impl Into<String>) -> Self {
        self.semantic_model = model.into();
        self
    }

    /// Overlap carried between consecutive chunks, in characters.
    pub fn overlap_chars(&self) -> usize {
        self.target_chunk_size * self.overlap_percent as usize / 100
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.target_chunk_size == 0 {
            return Err(DomainError::validation(
                "target_chunk_size must be greater than 0",
            ));
        }

        if self.min_chunk_size > self.target_chunk_size {
            return Err(DomainError::validation(
                "min_chunk_size must be less than or equal to target_chunk_size",
            ));
        }

        if self.max_chunk_size < self.target_chunk_size {
            return Err(DomainError::validation(
                "max_chunk_size must be greater than or equal to target_chunk_size",
            ));
        }

        if self.overlap_percent >= 100 {
            return Err(DomainError::validation(
                "overlap_percent must be less than 100",
            ));
        }

        if self.embedding_batch_size == 0 || self.embedding_batch_size > 100 {
            return Err(DomainError::validation(
                "embedding_batch_size must be between 1 and 100",
            ));
        }

        Ok(())
    }
}
