//! Heading detection over sanitized document text
//!
//! Dutch and English policy documents follow a fairly rigid
//! chapter/article/section layout; a handful of line-anchored patterns
//! recovers enough hierarchy to attach context to chunks. Detection is
//! pure and deterministic for identical input.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::domain::document::{DocumentStructure, StructureIndex, StructureKind, StructureTree};

/// Headings longer than this are almost certainly prose that happens to
/// start with a heading word.
const MAX_HEADING_LINE_LEN: usize = 100;

static CHAPTER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^(Hoofdstuk|HOOFDSTUK|Chapter|CHAPTER)\s+(\d+|[IVXLC]+)\.?\s*(.*)$").unwrap()
});

static ARTICLE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^(Artikel|ARTIKEL|Article|ARTICLE|Art\.)\s+(\d+(?:\.\d+)*[a-z]?)\.?\s*(.*)$")
        .unwrap()
});

static NUMBERED_SECTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^(\d+(?:\.\d+)+)\.?\s+(\S.*)$").unwrap());

static TITLED_SECTION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^(Paragraaf|PARAGRAAF|Section|SECTION|§)\s*(\d+(?:\.\d+)*)\.?\s*(.*)$")
        .unwrap()
});

struct Candidate {
    kind: StructureKind,
    start: usize,
    identifier: String,
    title: String,
}

fn line_len_ok(m: &regex::Match<'_>) -> bool {
    m.as_str().len() <= MAX_HEADING_LINE_LEN
}

fn clean_title(raw: &str) -> String {
    raw.trim().trim_matches(':').trim().to_string()
}

/// Detect the document's structural hierarchy.
pub fn detect_structure(text: &str) -> StructureTree {
    let mut candidates: Vec<Candidate> = Vec::new();

    for captures in CHAPTER.captures_iter(text) {
        let Some(whole) = captures.get(0) else { continue };
        if !line_len_ok(&whole) {
            continue;
        }
        candidates.push(Candidate {
            kind: StructureKind::Chapter,
            start: whole.start(),
            identifier: format!("{} {}", &captures[1], &captures[2]),
            title: clean_title(&captures[3]),
        });
    }

    for captures in ARTICLE.captures_iter(text) {
        let Some(whole) = captures.get(0) else { continue };
        if !line_len_ok(&whole) {
            continue;
        }
        candidates.push(Candidate {
            kind: StructureKind::Article,
            start: whole.start(),
            identifier: format!("{} {}", &captures[1], &captures[2]),
            title: clean_title(&captures[3]),
        });
    }

    for captures in TITLED_SECTION.captures_iter(text) {
        let Some(whole) = captures.get(0) else { continue };
        if !line_len_ok(&whole) {
            continue;
        }
        candidates.push(Candidate {
            kind: StructureKind::Section,
            start: whole.start(),
            identifier: format!("{} {}", &captures[1], &captures[2]),
            title: clean_title(&captures[3]),
        });
    }

    for captures in NUMBERED_SECTION.captures_iter(text) {
        let Some(whole) = captures.get(0) else { continue };
        if !line_len_ok(&whole) {
            continue;
        }
        candidates.push(Candidate {
            kind: StructureKind::Section,
            start: whole.start(),
            identifier: captures[1].to_string(),
            title: clean_title(&captures[2]),
        });
    }

    // Stable order by position; when two patterns hit the same line,
    // keep the shallower (more significant) interpretation.
    candidates.sort_by(|a, b| {
        a.start
            .cmp(&b.start)
            .then(a.kind.level().cmp(&b.kind.level()))
    });
    candidates.dedup_by(|b, a| a.start == b.start);

    build_tree(candidates)
}

fn build_tree(candidates: Vec<Candidate>) -> StructureTree {
    let mut tree = StructureTree::new();
    // Stack of (level, index) for parent inference.
    let mut stack: Vec<(u8, StructureIndex)> = Vec::new();

    for candidate in candidates {
        let level = candidate.kind.level();

        while stack.last().is_some_and(|(l, _)| *l >= level) {
            stack.pop();
        }

        let parent = stack.last().map(|(_, idx)| *idx);
        let index = tree.push(DocumentStructure {
            kind: candidate.kind,
            identifier: candidate.identifier,
            title: candidate.title,
            start_index: candidate.start,
            parent,
        });
        stack.push((level, index));
    }

    tree
}

/// Breadcrumb for the chunk at `pos`, prefixed with the document name.
pub fn generate_context_header(doc_name: &str, tree: &StructureTree, pos: usize) -> String {
    tree.context_header(doc_name, pos)
}
