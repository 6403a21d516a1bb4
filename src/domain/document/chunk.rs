//! Structured chunk types emitted by the assembler

use serde::{Deserialize, Serialize};

use super::structure::{StructureIndex, StructureKind};

/// Metadata carried by every [`StructuredChunk`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkMetadata {
    /// Byte offset where the chunk starts in the combined document text
    pub start_char: usize,
    /// Byte offset where the chunk ends
    pub end_char: usize,
    /// Number of whitespace-separated words
    pub word_count: usize,
    /// Kind of the most specific containing structure, if any
    pub structure_type: Option<StructureKind>,
    /// Structure labels from root to leaf, e.g. ["Hoofdstuk 1", "Artikel 1.1 Vakantie"]
    pub structure_path: Vec<String>,
}

/// A finished retrieval unit: chunk text plus position, page and
/// structure context. Immutable once emitted by the assembler.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructuredChunk {
    pub content: String,
    /// Breadcrumb prefixed to the chunk for retrieval context
    pub context_header: String,
    /// Most specific containing structure node, as an index into the
    /// per-document [`StructureTree`](super::structure::StructureTree)
    pub structure: Option<StructureIndex>,
    /// Source page, when page boundaries were supplied
    pub page_number: Option<u32>,
    /// Dense, 0-based index; reassigned after merge passes
    pub chunk_index: usize,
    pub metadata: ChunkMetadata,
}

impl StructuredChunk {
    /// Word count used across the pipeline: whitespace split, empty
    /// tokens discarded.
    pub fn count_words(text: &str) -> usize {
        text.split_whitespace().count()
    }

    /// Content with the context header prepended, as stored for retrieval.
    pub fn content_with_header(&self) -> String {
        if self.context_header.is_empty() {
            self.content.clone()
        } else {
            format!("{}\n\n{}", self.context_header, self.content)
        }
    }
}
