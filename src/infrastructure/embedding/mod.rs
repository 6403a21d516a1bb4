//! Embedding provider implementations and batch orchestration

mod batcher;
mod openai;

pub use batcher::{EmbeddingBatcher, MAX_BATCH_SIZE};
pub use openai::OpenAiEmbeddingProvider;

// Re-export HTTP client for use by embedding providers
pub use super::llm::{HttpClient, HttpClientTrait};
