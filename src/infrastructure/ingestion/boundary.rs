//! Boundary scoring for chunk splitting
//!
//! Candidate split points are ranked by structural significance so the
//! chunker prefers cutting at an article start over a paragraph break,
//! and at a paragraph break over a sentence end. Positions are byte
//! offsets into the sanitized document text.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::domain::document::{StructureKind, StructureTree};

/// Priority scores; higher wins.
pub const SCORE_STRUCTURAL: u32 = 100;
pub const SCORE_SECTION: u32 = 90;
pub const SCORE_PARAGRAPH: u32 = 70;
pub const SCORE_LIST_END: u32 = 60;
pub const SCORE_SENTENCE_END: u32 = 40;
pub const SCORE_COLON_NEWLINE: u32 = 30;
pub const SCORE_CLAUSE: u32 = 10;

/// Half-width of the window searched around the target split point.
pub const SEARCH_WINDOW: usize = 300;

/// A candidate split position with its priority score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoredBoundary {
    pub position: usize,
    pub score: u32,
}

static SENTENCE_END: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"[.!?]["')\]]?\s+([A-Z0-9\u{C0}-\u{17E}])"#).unwrap());
static CLAUSE_END: Lazy<Regex> = Lazy::new(|| Regex::new(r"[,;]\s").unwrap());
static LIST_ITEM: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*(\u{2022}|-|\*|\d+\.)\s").unwrap());

/// Largest byte index `<= i` that is a char boundary of `s`.
pub fn floor_char_boundary(s: &str, mut i: usize) -> usize {
    if i >= s.len() {
        return s.len();
    }
    while i > 0 && !s.is_char_boundary(i) {
        i -= 1;
    }
    i
}

/// Smallest byte index `>= i` that is a char boundary of `s`.
pub fn ceil_char_boundary(s: &str, mut i: usize) -> usize {
    if i >= s.len() {
        return s.len();
    }
    while i < s.len() && !s.is_char_boundary(i) {
        i += 1;
    }
    i
}

/// Collect every scored boundary candidate within `[window_start, window_end)`.
pub fn collect_boundaries(
    text: &str,
    tree: &StructureTree,
    window_start: usize,
    window_end: usize,
) -> Vec<ScoredBoundary> {
    let window_start = floor_char_boundary(text, window_start);
    let window_end = ceil_char_boundary(text, window_end.min(text.len()));
    if window_start >= window_end {
        return Vec::new();
    }

    let mut boundaries = Vec::new();

    // Structural starts detected earlier in the pipeline.
    for node in tree.nodes() {
        if node.start_index >= window_start && node.start_index < window_end {
            let score = match node.kind {
                StructureKind::Chapter | StructureKind::Article => SCORE_STRUCTURAL,
                StructureKind::Section => SCORE_SECTION,
            };
            boundaries.push(ScoredBoundary {
                position: node.start_index,
                score,
            });
        }
    }

    let window = &text[window_start..window_end];

    // Paragraph breaks: split after the blank line.
    let mut search_from = 0;
    while let Some(found) = window[search_from..].find("\n\n") {
        let pos = search_from + found;
        boundaries.push(ScoredBoundary {
            position: window_start + pos + 2,
            score: SCORE_PARAGRAPH,
        });
        search_from = pos + 2;
    }

    collect_list_ends(window, window_start, &mut boundaries);

    for captures in SENTENCE_END.captures_iter(window) {
        if let Some(capital) = captures.get(1) {
            boundaries.push(ScoredBoundary {
                position: window_start + capital.start(),
                score: SCORE_SENTENCE_END,
            });
        }
    }

    let mut search_from = 0;
    while let Some(found) = window[search_from..].find(":\n") {
        let pos = search_from + found;
        boundaries.push(ScoredBoundary {
            position: window_start + pos + 2,
            score: SCORE_COLON_NEWLINE,
        });
        search_from = pos + 2;
    }

    for m in CLAUSE_END.find_iter(window) {
        boundaries.push(ScoredBoundary {
            position: window_start + m.end(),
            score: SCORE_CLAUSE,
        });
    }

    boundaries
}

/// A list ends where a list-item line is followed by a non-item line.
fn collect_list_ends(window: &str, window_start: usize, boundaries: &mut Vec<ScoredBoundary>) {
    let mut offset = 0;
    let mut previous_was_item = false;

    for line in window.split_inclusive('\n') {
        let is_item = LIST_ITEM.is_match(line);
        if previous_was_item && !is_item && !line.trim().is_empty() {
            boundaries.push(ScoredBoundary {
                position: window_start + offset,
                score: SCORE_LIST_END,
            });
        }
        previous_was_item = is_item;
        offset += line.len();
    }
}

/// Pick the best split point near `target_index` for a chunk starting at
/// `chunk_start`.
///
/// Searches ±[`SEARCH_WINDOW`] around the target, scores every candidate
/// and returns the highest-scoring position, preferring the candidate
/// closest to the target on ties. The result never exceeds
/// `chunk_start + max_size` and never falls below `chunk_start + min_size`
/// unless the document ends first.
pub fn find_best_boundary(
    text: &str,
    tree: &StructureTree,
    chunk_start: usize,
    target_index: usize,
    min_size: usize,
    max_size: usize,
) -> usize {
    let hard_min = (chunk_start + min_size).min(text.len());
    let hard_max = (chunk_start + max_size).min(text.len());

    let window_start = target_index.saturating_sub(SEARCH_WINDOW).max(hard_min);
    let window_end = (target_index + SEARCH_WINDOW).min(hard_max);

    let candidates = collect_boundaries(text, tree, window_start, window_end);

    let best = candidates
        .iter()
        .filter(|b| b.position > chunk_start)
        .max_by(|a, b| {
            a.score.cmp(&b.score).then_with(|| {
                let da = a.position.abs_diff(target_index);
                let db = b.position.abs_diff(target_index);
                db.cmp(&da)
            })
        })
        .map(|b| b.position);

    let boundary = best.unwrap_or_else(|| ceil_char_boundary(text, target_index.min(hard_max)));
    floor_char_boundary(text, boundary.clamp(chunk_start + 1, hard_max.max(chunk_start + 1)))
}
