//! Chunk assembly
//!
//! Merges the structure tree, chunker output and position reconciliation
//! into final [`StructuredChunk`]s: exact offsets, page numbers, context
//! headers and structure paths, followed by a merge pass that folds
//! undersized fragments into their predecessor.

use tracing::debug;

use crate::domain::document::{
    ChunkMetadata, PageBoundary, SmartChunkingOptions, StructureTree, StructuredChunk,
};
use crate::infrastructure::ingestion::chunkers::RawChunk;
use crate::infrastructure::ingestion::reconcile::{
    find_chunk_start, find_page_for_position, Watermark,
};

#[derive(Debug, Clone, Default)]
pub struct ChunkAssembler;

impl ChunkAssembler {
    pub fn new() -> Self {
        Self
    }

    /// Build structured chunks from raw chunker output.
    ///
    /// Chunks are reconciled in the order the chunker produced them; the
    /// watermark keeps each search anchored after the previous chunk so
    /// repeated text cannot reorder them.
    pub fn assemble(
        &self,
        doc_name: &str,
        full_text: &str,
        raw_chunks: Vec<RawChunk>,
        tree: &StructureTree,
        boundaries: &[PageBoundary],
        options: &SmartChunkingOptions,
    ) -> Vec<StructuredChunk> {
        let total = raw_chunks.len();
        let mut watermark = Watermark::new();
        let mut previous_start = 0usize;
        let mut chunks = Vec::with_capacity(total);

        for (index, raw) in raw_chunks.into_iter().enumerate() {
            let hint = watermark.hint().max(raw.position_hint);
            let mut start = find_chunk_start(full_text, &raw.text, hint, index, total);

            // Monotonic ordering: a chunk may start inside the previous
            // chunk's overlap, but never before the previous chunk.
            if start < previous_start {
                start = previous_start;
            }

            let end = (start + raw.text.len()).min(full_text.len());
            watermark.advance(start, raw.text.len());
            previous_start = start;

            let structure = if options.detect_structure {
                tree.find_at_position(start)
            } else {
                None
            };

            let context_header = if options.add_context_headers {
                tree.context_header(doc_name, start)
            } else {
                String::new()
            };

            let structure_path = structure
                .map(|idx| tree.path_labels(idx))
                .unwrap_or_default();
            let structure_type = structure.and_then(|idx| tree.get(idx)).map(|n| n.kind);

            chunks.push(StructuredChunk {
                context_header,
                structure,
                page_number: find_page_for_position(boundaries, start),
                chunk_index: index,
                metadata: ChunkMetadata {
                    start_char: start,
                    end_char: end,
                    word_count: StructuredChunk::count_words(&raw.text),
                    structure_type,
                    structure_path,
                },
                content: raw.text,
            });
        }

        let chunks = if options.merge_small_chunks {
            merge_undersized(chunks, options.min_chunk_size)
        } else {
            chunks
        };

        reindex(chunks)
    }
}

/// Fold chunks shorter than `min_size` into their predecessor.
fn merge_undersized(chunks: Vec<StructuredChunk>, min_size: usize) -> Vec<StructuredChunk> {
    let mut merged: Vec<StructuredChunk> = Vec::with_capacity(chunks.len());
    let mut folded = 0usize;

    for chunk in chunks {
        let undersized = chunk.content.len() < min_size;
        match merged.last_mut() {
            Some(previous) if undersized => {
                previous.content.push_str("\n\n");
                previous.content.push_str(&chunk.content);
                previous.metadata.end_char = chunk.metadata.end_char;
                previous.metadata.word_count = StructuredChunk::count_words(&previous.content);
                folded += 1;
            }
            _ => merged.push(chunk),
        }
    }

    if folded > 0 {
        debug!(folded, "merged undersized chunks into predecessors");
    }

    merged
}

fn reindex(mut chunks: Vec<StructuredChunk>) -> Vec<StructuredChunk> {
    for (index, chunk) in chunks.iter_mut().enumerate() {
        chunk.chunk_index = index;
    }
    chunks
}
