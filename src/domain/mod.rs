//! Domain layer - Core entities and provider traits

pub mod document;
pub mod embedding;
pub mod error;
pub mod llm;
pub mod retrieval;

pub use document::{
    join_pages, ChunkMetadata, DocumentStructure, Page, PageBoundary, SmartChunkingOptions,
    StructureIndex, StructureKind, StructureTree, StructuredChunk, PAGE_SEPARATOR,
};
pub use embedding::{
    cosine_similarity, BatchEmbeddingResult, Embedding, EmbeddingProvider, EmbeddingRequest,
    EmbeddingResponse, EmbeddingResult, EmbeddingUsage,
};
pub use error::DomainError;
pub use llm::{
    FinishReason, LlmProvider, LlmRequest, LlmRequestBuilder, LlmResponse, Message, MessageRole,
    Usage,
};
pub use retrieval::{SearchResult, StoreOutcome, VectorStore};
