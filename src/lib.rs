//! Portal RAG core
//!
//! Document ingestion and retrieval augmentation for the customer portal:
//! - Position-accurate chunking (heuristic and LLM-assisted semantic)
//! - Embedding with batching, per-item retry and placeholder recovery
//! - Conversation-aware query expansion for follow-up questions
//! - Corpus-similarity verification of synthetic test questions
//!
//! The portal itself (upload transport, auth, tenant routing, the vector
//! store) lives elsewhere; this crate talks to it through the
//! [`domain::VectorStore`] trait and to model providers through
//! [`domain::LlmProvider`] / [`domain::EmbeddingProvider`].

pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;

use std::sync::Arc;

use domain::DomainError;
use infrastructure::embedding::{EmbeddingBatcher, OpenAiEmbeddingProvider};
use infrastructure::llm::{HttpClient, OpenAiProvider};

/// OpenAI chat and embedding providers wired from configuration.
///
/// Fails when no API key is configured: embedding has no safe fallback,
/// so this is a configuration error surfaced at startup rather than a
/// degraded mode.
pub fn create_openai_providers(
    config: &AppConfig,
) -> Result<
    (
        Arc<OpenAiProvider<HttpClient>>,
        Arc<OpenAiEmbeddingProvider<HttpClient>>,
    ),
    DomainError,
> {
    let api_key = config
        .providers
        .resolve_api_key()
        .ok_or_else(|| DomainError::configuration("no OpenAI API key configured"))?;

    let llm = Arc::new(OpenAiProvider::new(HttpClient::new(), api_key.clone()));
    let embedder = Arc::new(OpenAiEmbeddingProvider::new(HttpClient::new(), api_key));

    Ok((llm, embedder))
}

/// Embedding batcher for the configured embedding model.
pub fn create_embedding_batcher(
    config: &AppConfig,
    embedder: Arc<OpenAiEmbeddingProvider<HttpClient>>,
) -> Result<EmbeddingBatcher<OpenAiEmbeddingProvider<HttpClient>>, DomainError> {
    EmbeddingBatcher::new(embedder, config.providers.embedding_model.clone())
}
