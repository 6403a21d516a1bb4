//! Document ingestion infrastructure
//!
//! This module provides the ingestion stages in dependency order:
//! sanitization, structure detection, boundary scoring, the two chunking
//! strategies, position reconciliation, chunk assembly and the pipeline
//! that orchestrates them.

pub mod assembler;
pub mod boundary;
pub mod chunkers;
pub mod pipeline;
pub mod reconcile;
pub mod sanitizer;
pub mod structure;

pub use assembler::ChunkAssembler;
pub use boundary::{find_best_boundary, ScoredBoundary};
pub use chunkers::{RawChunk, SemanticChunker, SmartBoundaryChunker, CHUNK_MARKER};
pub use pipeline::{ChunkingStrategyUsed, IngestionPipeline, IngestionReport};
pub use reconcile::{find_chunk_start, find_page_for_position, Watermark};
pub use sanitizer::{
    estimate_token_count, exceeds_token_limit, sanitize, validate_for_embedding,
    EmbeddingValidation, EMBEDDING_TOKEN_LIMIT,
};
pub use structure::{detect_structure, generate_context_header};
