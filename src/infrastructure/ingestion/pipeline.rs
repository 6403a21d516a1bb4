//! Ingestion pipeline service
//!
//! Glues the stages together for one document: sanitize pages, join,
//! detect structure, chunk (semantic when enabled, heuristic otherwise),
//! reconcile and assemble, embed, persist. A single bad chunk or provider
//! hiccup degrades its own stage; only configuration errors and an empty
//! document abort the run.

use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::document::{
    join_pages, Page, SmartChunkingOptions, StructureTree, StructuredChunk,
};
use crate::domain::{DomainError, EmbeddingProvider, LlmProvider, VectorStore};
use crate::infrastructure::embedding::EmbeddingBatcher;
use crate::infrastructure::ingestion::assembler::ChunkAssembler;
use crate::infrastructure::ingestion::chunkers::{
    RawChunk, SemanticChunker, SmartBoundaryChunker,
};
use crate::infrastructure::ingestion::sanitizer::sanitize;
use crate::infrastructure::ingestion::structure::detect_structure;

/// Chunking strategy that ended up producing the document's chunks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChunkingStrategyUsed {
    Heuristic,
    Semantic,
}

/// Outcome of ingesting one document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestionReport {
    pub document_id: String,
    pub document_name: String,
    pub chunk_count: usize,
    pub chunks_stored: usize,
    /// Chunk indices whose embeddings are zero-vector placeholders
    pub failed_embedding_indices: Vec<usize>,
    pub strategy: ChunkingStrategyUsed,
    pub total_tokens: u32,
    pub total_cost: f64,
    pub duration_ms: u64,
    pub ingested_at: DateTime<Utc>,
}

/// Per-document ingestion over injected providers and store.
#[derive(Debug)]
pub struct IngestionPipeline<L, E, S>
where
    L: LlmProvider,
    E: EmbeddingProvider,
    S: VectorStore,
{
    semantic_chunker: SemanticChunker<L>,
    heuristic_chunker: SmartBoundaryChunker,
    assembler: ChunkAssembler,
    batcher: EmbeddingBatcher<E>,
    store: Arc<S>,
}

impl<L, E, S> IngestionPipeline<L, E, S>
where
    L: LlmProvider,
    E: EmbeddingProvider,
    S: VectorStore,
{
    pub fn new(
        llm_provider: Arc<L>,
        batcher: EmbeddingBatcher<E>,
        store: Arc<S>,
    ) -> Self {
        Self {
            semantic_chunker: SemanticChunker::new(llm_provider),
            heuristic_chunker: SmartBoundaryChunker::new(),
            assembler: ChunkAssembler::new(),
            batcher,
            store,
        }
    }

    /// Ingest one document's pages for a tenant.
    pub async fn ingest(
        &self,
        tenant_id: &str,
        doc_name: &str,
        pages: &[Page],
        options: &SmartChunkingOptions,
    ) -> Result<IngestionReport, DomainError> {
        options.validate()?;
        let started = Instant::now();

        // Sanitize per page so page boundaries stay aligned with the
        // combined text.
        let sanitized: Vec<Page> = pages
            .iter()
            .map(|page| Page::new(page.page_number, sanitize(&page.text)))
            .collect();

        let (full_text, boundaries) = join_pages(&sanitized);
        if full_text.trim().is_empty() {
            return Err(DomainError::validation(
                "document is empty after sanitization",
            ));
        }

        let tree = if options.detect_structure {
            detect_structure(&full_text)
        } else {
            StructureTree::new()
        };

        let mut total_cost = 0.0f64;
        let mut total_tokens = 0u32;

        let (raw_chunks, strategy) = self
            .chunk(&full_text, &tree, options, &mut total_cost, &mut total_tokens)
            .await?;

        let chunks =
            self.assembler
                .assemble(doc_name, &full_text, raw_chunks, &tree, &boundaries, options);

        let texts: Vec<String> = chunks.iter().map(StructuredChunk::content_with_header).collect();
        let batch = self.batcher.embed_batch(&texts).await;
        total_cost += batch.total_cost;
        total_tokens += batch.total_tokens;

        if !batch.failed_indices.is_empty() {
            warn!(
                failed = batch.failed_indices.len(),
                "some chunks received placeholder embeddings"
            );
        }

        let outcome = self
            .store
            .store_chunks(tenant_id, &chunks, &batch.embeddings)
            .await?;

        let report = IngestionReport {
            document_id: Uuid::new_v4().to_string(),
            document_name: doc_name.to_string(),
            chunk_count: chunks.len(),
            chunks_stored: outcome.stored,
            failed_embedding_indices: batch.failed_indices,
            strategy,
            total_tokens,
            total_cost,
            duration_ms: started.elapsed().as_millis() as u64,
            ingested_at: Utc::now(),
        };

        info!(
            tenant_id,
            doc_name,
            chunks = report.chunk_count,
            stored = report.chunks_stored,
            strategy = ?report.strategy,
            cost = report.total_cost,
            "document ingested"
        );

        Ok(report)
    }

    async fn chunk(
        &self,
        full_text: &str,
        tree: &StructureTree,
        options: &SmartChunkingOptions,
        total_cost: &mut f64,
        total_tokens: &mut u32,
    ) -> Result<(Vec<RawChunk>, ChunkingStrategyUsed), DomainError> {
        if options.use_semantic_chunking {
            match self.semantic_chunker.chunk(full_text, options).await {
                Ok(outcome) if !outcome.chunks.is_empty() => {
                    *total_cost += outcome.cost;
                    *total_tokens += outcome.tokens_used;
                    return Ok((outcome.chunks, ChunkingStrategyUsed::Semantic));
                }
                Ok(_) => {
                    warn!("semantic chunker returned nothing, falling back to heuristic");
                }
                Err(e) => {
                    warn!(error = %e, "semantic chunking failed, falling back to heuristic");
                }
            }
        }

        let chunks = self.heuristic_chunker.chunk(full_text, tree, options)?;
        Ok((chunks, ChunkingStrategyUsed::Heuristic))
    }
}
