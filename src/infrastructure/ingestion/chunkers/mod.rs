//! Chunking strategy implementations
//!
//! Two strategies produce raw chunks from sanitized text: the heuristic
//! boundary walker (no AI) and the LLM-backed semantic chunker. Both emit
//! [`RawChunk`]s whose positions are hints for the reconciler, not ground
//! truth.

mod heuristic;
mod semantic;

pub use heuristic::SmartBoundaryChunker;
pub use semantic::{SemanticChunkOutcome, SemanticChunker, CHUNK_MARKER};

/// A chunk of text with an approximate start position.
///
/// The heuristic chunker emits exact positions; the semantic chunker
/// emits proportional estimates. Either way the reconciler recovers the
/// authoritative offset by searching the source text.
#[derive(Debug, Clone)]
pub struct RawChunk {
    pub text: String,
    pub position_hint: usize,
}

impl RawChunk {
    pub fn new(text: impl Into<String>, position_hint: usize) -> Self {
        Self {
            text: text.into(),
            position_hint,
        }
    }
}
