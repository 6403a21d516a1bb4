//! Heuristic boundary chunker
//!
//! Walks the document start to end, splitting at the best-scoring
//! boundary near each target position. No provider calls; this is the
//! default strategy and the fallback when semantic chunking fails.

use tracing::debug;

use super::RawChunk;
use crate::domain::document::{SmartChunkingOptions, StructureTree};
use crate::domain::DomainError;
use crate::infrastructure::ingestion::boundary::{ceil_char_boundary, find_best_boundary};

#[derive(Debug, Clone, Default)]
pub struct SmartBoundaryChunker;

impl SmartBoundaryChunker {
    pub fn new() -> Self {
        Self
    }

    /// Split `text` into chunks at scored boundaries.
    ///
    /// Consecutive chunks overlap by `options.overlap_chars()`, with the
    /// overlap start nudged forward to the next whitespace so no chunk
    /// begins mid-word. Emitted text is verbatim source text; positions
    /// are exact.
    pub fn chunk(
        &self,
        text: &str,
        tree: &StructureTree,
        options: &SmartChunkingOptions,
    ) -> Result<Vec<RawChunk>, DomainError> {
        options.validate()?;

        if text.trim().is_empty() {
            return Ok(Vec::new());
        }

        let overlap = options.overlap_chars();
        let mut chunks = Vec::new();
        let mut current_start = 0usize;

        while current_start < text.len() {
            let target_end = current_start + options.target_chunk_size;

            // Remainder fits in one chunk; emit it and stop.
            if target_end >= text.len() {
                chunks.push(RawChunk::new(&text[current_start..], current_start));
                break;
            }

            let mut boundary = find_best_boundary(
                text,
                tree,
                current_start,
                target_end,
                options.min_chunk_size,
                options.max_chunk_size,
            );

            if boundary <= current_start {
                boundary = ceil_char_boundary(text, target_end.min(text.len()));
            }

            chunks.push(RawChunk::new(&text[current_start..boundary], current_start));

            current_start = next_chunk_start(text, boundary, overlap, current_start);
        }

        debug!(chunk_count = chunks.len(), "heuristic chunking complete");
        Ok(chunks)
    }
}

/// Start of the next chunk: `boundary - overlap`, nudged forward past the
/// next whitespace run so the chunk starts on a word. Falls back to the
/// boundary itself when no whitespace is available or progress would stall.
fn next_chunk_start(text: &str, boundary: usize, overlap: usize, previous_start: usize) -> usize {
    if overlap == 0 {
        return boundary;
    }

    let mut candidate = ceil_char_boundary(text, boundary.saturating_sub(overlap));
    if candidate <= previous_start {
        return boundary;
    }

    // Nudge to the first whitespace, then past the whitespace run.
    let rest = &text[candidate..boundary];
    match rest.find(char::is_whitespace) {
        Some(ws_offset) => {
            let after_ws = rest[ws_offset..]
                .find(|c: char| !c.is_whitespace())
                .map(|non_ws| ws_offset + non_ws)
                .unwrap_or(rest.len());
            candidate += after_ws;
        }
        None => return boundary,
    }

    if candidate <= previous_start || candidate > boundary {
        boundary
    } else {
        candidate
    }
}
