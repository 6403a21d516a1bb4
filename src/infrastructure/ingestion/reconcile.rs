//! Position reconciliation
//!
//! Chunk text that went through the model (or was trimmed at a boundary)
//! is not guaranteed to be a byte-identical substring at a known offset.
//! The true start position is recovered by a ladder of searches, from
//! exact prefix matches near the hint down to a proportional estimate.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::domain::document::PageBoundary;
use crate::infrastructure::ingestion::boundary::floor_char_boundary;

/// How far before the hint the near-hint searches begin.
const HINT_BACKTRACK: usize = 500;

/// Prefix lengths tried by the search ladder, in bytes.
const LONG_PREFIX: usize = 150;
const MID_PREFIX: usize = 80;
const SHORT_PREFIX: usize = 50;

/// Fraction of each resolved chunk's length the watermark advances by.
/// Less than 100% so configured overlap between chunks stays reachable.
const WATERMARK_ADVANCE_NUM: usize = 8;
const WATERMARK_ADVANCE_DEN: usize = 10;

static WHITESPACE_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Recover the start offset of `chunk_content` within `full_text`.
///
/// Strategies are attempted in order; the first match wins:
/// 1. 150-byte prefix, searched from just before the hint
/// 2. 80-byte prefix, same starting point
/// 3. 150-byte prefix, searched from the document start
/// 4. 50-byte prefix, from the document start
/// 5. whitespace-normalized search, mapped back proportionally
/// 6. proportional estimate from the chunk's ordinal position
///
/// The final fallback deliberately never returns `search_hint` itself:
/// a wrong hint repeated across chunks would silently collapse many
/// chunks onto the same offset.
pub fn find_chunk_start(
    full_text: &str,
    chunk_content: &str,
    search_hint: usize,
    chunk_index: usize,
    total_chunks: usize,
) -> usize {
    let needle = chunk_content.trim_start();
    if needle.is_empty() || full_text.is_empty() {
        return proportional_estimate(full_text, chunk_index, total_chunks);
    }

    let near_start = floor_char_boundary(
        full_text,
        search_hint.saturating_sub(HINT_BACKTRACK).min(full_text.len()),
    );

    for (prefix_len, from) in [
        (LONG_PREFIX, near_start),
        (MID_PREFIX, near_start),
        (LONG_PREFIX, 0),
        (SHORT_PREFIX, 0),
    ] {
        if let Some(pos) = find_prefix(full_text, needle, prefix_len, from) {
            return pos;
        }
    }

    if let Some(pos) = normalized_search(full_text, needle) {
        debug!(chunk_index, "chunk position recovered via normalized search");
        return pos;
    }

    debug!(chunk_index, "chunk position fell back to proportional estimate");
    proportional_estimate(full_text, chunk_index, total_chunks)
}

fn find_prefix(full_text: &str, needle: &str, prefix_len: usize, from: usize) -> Option<usize> {
    let prefix = &needle[..floor_char_boundary(needle, prefix_len.min(needle.len()))];
    if prefix.is_empty() {
        return None;
    }
    full_text[from..].find(prefix).map(|found| from + found)
}

/// Collapse whitespace runs in both needle and haystack, search, and map
/// the found index back proportionally.
fn normalized_search(full_text: &str, needle: &str) -> Option<usize> {
    let norm_text = WHITESPACE_RUNS.replace_all(full_text, " ");
    let norm_needle = WHITESPACE_RUNS.replace_all(needle, " ");
    let norm_prefix =
        &norm_needle[..floor_char_boundary(&norm_needle, LONG_PREFIX.min(norm_needle.len()))];
    if norm_prefix.trim().is_empty() {
        return None;
    }

    let found = norm_text.find(norm_prefix.trim_end())?;
    let mapped = (found as f64 / norm_text.len().max(1) as f64 * full_text.len() as f64) as usize;
    Some(floor_char_boundary(full_text, mapped.min(full_text.len())))
}

fn proportional_estimate(full_text: &str, chunk_index: usize, total_chunks: usize) -> usize {
    if total_chunks == 0 {
        return 0;
    }
    let estimate = chunk_index * full_text.len() / total_chunks;
    floor_char_boundary(full_text, estimate.min(full_text.len()))
}

/// Look up the page containing `position`.
///
/// The scan accepts `end_pos + 2` so positions falling inside the
/// page-joining separator resolve to the earlier page; positions past the
/// final boundary resolve to the last page. Returns `None` only when no
/// boundaries were supplied.
pub fn find_page_for_position(boundaries: &[PageBoundary], position: usize) -> Option<u32> {
    for boundary in boundaries {
        if position < boundary.end_pos + 2 {
            return Some(boundary.page_number);
        }
    }
    boundaries.last().map(|b| b.page_number)
}

/// Monotonic search-hint tracker for reconciling a chunk sequence.
///
/// After each resolved chunk the watermark advances by ~80% of the
/// chunk's length, so the next search starts close to — but safely
/// before — the next chunk's true position even with overlap configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct Watermark {
    position: usize,
}

impl Watermark {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current hint to pass as `search_hint`.
    pub fn hint(&self) -> usize {
        self.position
    }

    /// Advance past a chunk resolved at `start` with length `chunk_len`.
    pub fn advance(&mut self, start: usize, chunk_len: usize) {
        let step = chunk_len * WATERMARK_ADVANCE_NUM / WATERMARK_ADVANCE_DEN;
        self.position = self.position.max(start + step);
    }
}
