//! LLM-assisted semantic chunker
//!
//! The model receives a document section and copies it back verbatim with
//! a literal marker inserted before each new chunk. Model output is
//! untrusted: the response is parsed as marker-split candidates with a
//! boilerplate filter, and any API or parse failure degrades that section
//! to a single chunk instead of propagating.

use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, warn};
use unicode_segmentation::UnicodeSegmentation;

use super::RawChunk;
use crate::domain::document::SmartChunkingOptions;
use crate::domain::llm::pricing;
use crate::domain::{DomainError, LlmProvider, LlmRequest};

/// Marker the model inserts before each chunk start.
pub const CHUNK_MARKER: &str = "|||CHUNK|||";

/// Documents shorter than this are returned whole at zero cost.
const MIN_SEMANTIC_LENGTH: usize = 500;

/// Upper bound per model call, to stay well inside context limits.
const MAX_SECTION_LENGTH: usize = 15_000;

/// Known "explanation" prefixes models prepend despite instructions.
static BOILERPLATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^\s*(here (is|are)|here's|sure[,!]|certainly[,!]|below (is|are)|the (analyzed|segmented|chunked) text|hier (is|volgt)|de (geanalyseerde|opgedeelde) tekst)[^\n]*\n+",
    )
    .unwrap()
});

/// Result of semantically chunking a document.
#[derive(Debug, Clone)]
pub struct SemanticChunkOutcome {
    /// Chunks with proportional position estimates (hints only)
    pub chunks: Vec<RawChunk>,
    pub cost: f64,
    pub tokens_used: u32,
}

/// Chunker that delegates boundary selection to an LLM.
#[derive(Debug)]
pub struct SemanticChunker<P: LlmProvider> {
    provider: Arc<P>,
}

impl<P: LlmProvider> SemanticChunker<P> {
    pub fn new(provider: Arc<P>) -> Self {
        Self { provider }
    }

    /// Chunk `text` via the model.
    ///
    /// Errors only on invalid options; provider and parse failures
    /// degrade per section.
    pub async fn chunk(
        &self,
        text: &str,
        options: &SmartChunkingOptions,
    ) -> Result<SemanticChunkOutcome, DomainError> {
        options.validate()?;

        if text.len() < MIN_SEMANTIC_LENGTH {
            return Ok(SemanticChunkOutcome {
                chunks: vec![RawChunk::new(text, 0)],
                cost: 0.0,
                tokens_used: 0,
            });
        }

        let sections = split_sections(text);
        let mut chunks = Vec::new();
        let mut cost = 0.0;
        let mut tokens_used = 0u32;

        for (section, section_offset) in sections {
            match self.chunk_section(section, options).await {
                Ok((section_chunks, section_cost, section_tokens)) => {
                    cost += section_cost;
                    tokens_used += section_tokens;
                    chunks.extend(remap_positions(section_chunks, section, section_offset));
                }
                Err(e) => {
                    warn!(error = %e, "semantic chunking failed for section, keeping it whole");
                    chunks.push(RawChunk::new(section, section_offset));
                }
            }
        }

        debug!(
            chunk_count = chunks.len(),
            cost, tokens_used, "semantic chunking complete"
        );

        Ok(SemanticChunkOutcome {
            chunks,
            cost,
            tokens_used,
        })
    }

    /// One model call for one section. Returns chunks with offsets
    /// measured in the model's *output* text.
    async fn chunk_section(
        &self,
        section: &str,
        options: &SmartChunkingOptions,
    ) -> Result<(Vec<(String, usize)>, f64, u32), DomainError> {
        let request = LlmRequest::builder()
            .system(
                "You split documents into semantically coherent chunks. \
                 Copy the user's text back verbatim, unchanged, inserting the literal marker \
                 |||CHUNK||| immediately before the start of each new chunk. \
                 Aim for 500-800 words per chunk. Never split in the middle of a sentence, \
                 list or table. Output only the marked text, with no commentary.",
            )
            .user(section)
            .temperature(0.0)
            .build();

        let response = self
            .provider
            .chat(&options.semantic_model, request)
            .await?;

        let (section_cost, section_tokens) = match response.usage {
            Some(usage) => (
                pricing::chat_cost(&options.semantic_model, &usage),
                usage.total_tokens,
            ),
            None => (0.0, 0),
        };

        let pieces = parse_marked_response(response.content());
        if pieces.is_empty() {
            return Err(DomainError::chunking("model returned no usable chunks"));
        }

        Ok((pieces, section_cost, section_tokens))
    }
}

/// Split the model output on the marker and filter boilerplate.
///
/// Returns (chunk text, byte offset in the output) pairs; empty pieces
/// are dropped. A marker-less response yields the whole output as one
/// piece, which still degrades gracefully downstream.
fn parse_marked_response(output: &str) -> Vec<(String, usize)> {
    let mut pieces = Vec::new();
    let mut segment_start = 0usize;

    let mut boundaries: Vec<usize> = output
        .match_indices(CHUNK_MARKER)
        .map(|(idx, _)| idx)
        .collect();
    boundaries.push(output.len());

    for boundary in boundaries {
        let segment = &output[segment_start..boundary];
        push_piece(&mut pieces, segment, segment_start);
        segment_start = boundary + CHUNK_MARKER.len();
    }

    pieces
}

fn push_piece(pieces: &mut Vec<(String, usize)>, segment: &str, segment_offset: usize) {
    let mut offset = segment_offset;
    let mut piece = segment;

    if let Some(m) = BOILERPLATE.find(piece) {
        offset += m.end();
        piece = &piece[m.end()..];
    }

    if piece.trim().is_empty() {
        return;
    }

    pieces.push((piece.to_string(), offset));
}

/// Map output-relative offsets back to document coordinates.
///
/// The model's output length differs from the input (markers, dropped
/// boilerplate), so each chunk's position is estimated proportionally
/// and shifted by the section's offset in the document.
fn remap_positions(
    pieces: Vec<(String, usize)>,
    section: &str,
    section_offset: usize,
) -> Vec<RawChunk> {
    let output_len: usize = pieces
        .last()
        .map(|(text, offset)| offset + text.len())
        .unwrap_or(0)
        .max(1);

    pieces
        .into_iter()
        .map(|(text, offset)| {
            let proportional =
                (offset as f64 / output_len as f64 * section.len() as f64) as usize;
            RawChunk::new(text, section_offset + proportional.min(section.len()))
        })
        .collect()
}

/// Split a document into sections of at most [`MAX_SECTION_LENGTH`]
/// bytes, cutting on paragraph boundaries and falling back to sentence
/// boundaries for oversized paragraphs. Never cuts mid-sentence.
fn split_sections(text: &str) -> Vec<(&str, usize)> {
    if text.len() <= MAX_SECTION_LENGTH {
        return vec![(text, 0)];
    }

    let mut sections = Vec::new();
    let mut section_start = 0usize;
    let mut cursor = 0usize;

    for paragraph in split_paragraphs(text) {
        let paragraph_end = cursor + paragraph.len();

        if paragraph.len() > MAX_SECTION_LENGTH {
            // Flush what we have, then pack the oversized paragraph by
            // sentence.
            if cursor > section_start {
                sections.push((&text[section_start..cursor], section_start));
            }
            pack_sentences(text, cursor, paragraph, &mut sections);
            section_start = paragraph_end;
        } else if paragraph_end - section_start > MAX_SECTION_LENGTH {
            sections.push((&text[section_start..cursor], section_start));
            section_start = cursor;
        }

        cursor = paragraph_end;
    }

    if section_start < text.len() {
        sections.push((&text[section_start..], section_start));
    }

    sections
}

/// Paragraph pieces including their trailing separators, so offsets add up.
fn split_paragraphs(text: &str) -> Vec<&str> {
    let mut pieces = Vec::new();
    let mut start = 0usize;

    while let Some(found) = text[start..].find("\n\n") {
        let mut end = start + found + 2;
        // Absorb any extra newlines into the same piece.
        while text[end..].starts_with('\n') {
            end += 1;
        }
        pieces.push(&text[start..end]);
        start = end;
    }

    if start < text.len() {
        pieces.push(&text[start..]);
    }

    pieces
}

fn pack_sentences<'a>(
    text: &'a str,
    paragraph_offset: usize,
    paragraph: &'a str,
    sections: &mut Vec<(&'a str, usize)>,
) {
    let mut section_start = paragraph_offset;
    let mut cursor = paragraph_offset;

    for sentence in paragraph.unicode_sentences() {
        let sentence_end = cursor + sentence.len();

        if sentence_end - section_start > MAX_SECTION_LENGTH && cursor > section_start {
            sections.push((&text[section_start..cursor], section_start));
            section_start = cursor;
        }

        cursor = sentence_end;
    }

    if section_start < paragraph_offset + paragraph.len() {
        sections.push((
            &text[section_start..paragraph_offset + paragraph.len()],
            section_start,
        ));
    }
}
