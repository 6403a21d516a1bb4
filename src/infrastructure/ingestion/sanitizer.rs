//! Text sanitization for extracted document text
//!
//! PDF extraction leaves ligatures, typographic punctuation, zero-width
//! characters and stray control bytes in the text. Everything downstream
//! (structure detection, chunking, embedding) assumes sanitized input, so
//! `sanitize` runs first and is total and idempotent: it never fails, and
//! re-sanitizing output is a no-op.

use std::borrow::Cow;

use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::{is_nfc_quick, IsNormalized, UnicodeNormalization};

/// Hard per-item token ceiling of the embedding API.
pub const EMBEDDING_TOKEN_LIMIT: u32 = 8191;

/// Diagnostic report from [`validate_for_embedding`].
#[derive(Debug, Clone)]
pub struct EmbeddingValidation {
    /// False only when nothing embeddable remains after sanitization
    pub valid: bool,
    /// Categories of problems found, e.g. `"control_characters"`
    pub issues: Vec<String>,
    pub sanitized: String,
    pub original_length: usize,
    pub sanitized_length: usize,
    pub removed_chars: usize,
}

/// Normalize raw extracted text. Total and idempotent.
pub fn sanitize(text: &str) -> String {
    let text = normalize_nfc(text);
    let text = strip_replacement_chars(&text);
    let text = strip_control_chars(&text);
    let text = strip_invisible_chars(&text);
    let text = replace_pdf_artifacts(&text);
    normalize_whitespace(&text)
}

/// Unicode NFC normalization with a fast path for already-normalized text.
fn normalize_nfc(input: &str) -> Cow<'_, str> {
    if is_nfc_quick(input.chars()) == IsNormalized::Yes {
        Cow::Borrowed(input)
    } else {
        Cow::Owned(input.nfc().collect())
    }
}

/// U+FFFD marks characters lost to lossy decoding upstream (typically
/// unpaired surrogate halves in the extractor's UTF-16 output). They
/// carry no content, so they are dropped rather than kept as noise.
fn strip_replacement_chars(input: &str) -> Cow<'_, str> {
    strip_matching(input, |c| c == '\u{FFFD}')
}

fn is_stripped_control(c: char) -> bool {
    c.is_control() && !matches!(c, '\t' | '\n' | '\r')
}

fn strip_control_chars(input: &str) -> Cow<'_, str> {
    strip_matching(input, is_stripped_control)
}

/// Zero-width and invisible formatting characters.
fn is_invisible(c: char) -> bool {
    matches!(
        c,
        '\u{200B}'              // zero-width space
        | '\u{200C}'            // zero-width non-joiner
        | '\u{200D}'            // zero-width joiner
        | '\u{2060}'            // word joiner
        | '\u{FEFF}'            // BOM
        | '\u{00AD}'            // soft hyphen
        | '\u{200E}' | '\u{200F}'   // directional marks
        | '\u{202A}'..='\u{202E}'   // bidi embedding controls
        | '\u{2066}'..='\u{2069}'   // bidi isolates
    )
}

fn strip_invisible_chars(input: &str) -> Cow<'_, str> {
    strip_matching(input, is_invisible)
}

fn strip_matching(input: &str, pred: impl Fn(char) -> bool) -> Cow<'_, str> {
    if !input.chars().any(&pred) {
        return Cow::Borrowed(input);
    }
    Cow::Owned(input.chars().filter(|c| !pred(*c)).collect())
}

/// Replacements for common PDF-extraction artifacts.
const ARTIFACT_REPLACEMENTS: &[(char, &str)] = &[
    // Ligatures
    ('\u{FB00}', "ff"),
    ('\u{FB01}', "fi"),
    ('\u{FB02}', "fl"),
    ('\u{FB03}', "ffi"),
    ('\u{FB04}', "ffl"),
    ('\u{FB05}', "ft"),
    ('\u{FB06}', "st"),
    // Typographic quotes
    ('\u{2018}', "'"),
    ('\u{2019}', "'"),
    ('\u{201A}', "'"),
    ('\u{201C}', "\""),
    ('\u{201D}', "\""),
    ('\u{201E}', "\""),
    // Dashes and ellipsis
    ('\u{2013}', "-"),
    ('\u{2014}', "-"),
    ('\u{2012}', "-"),
    ('\u{2015}', "-"),
    ('\u{2026}', "..."),
    // Bullet variants
    ('\u{25AA}', "\u{2022} "),
    ('\u{25CF}', "\u{2022} "),
    ('\u{25E6}', "\u{2022} "),
    ('\u{2023}', "\u{2022} "),
    ('\u{2043}', "\u{2022} "),
    ('\u{00B7}', "\u{2022} "),
    // Fractions
    ('\u{00BD}', "1/2"),
    ('\u{00BC}', "1/4"),
    ('\u{00BE}', "3/4"),
    ('\u{2153}', "1/3"),
    ('\u{2154}', "2/3"),
    // Math and spacing symbols
    ('\u{00D7}', "x"),
    ('\u{2212}', "-"),
    ('\u{00A0}', " "),
    ('\u{202F}', " "),
    ('\u{2009}', " "),
];

fn is_private_use(c: char) -> bool {
    matches!(c, '\u{E000}'..='\u{F8FF}')
}

fn replace_pdf_artifacts(input: &str) -> Cow<'_, str> {
    let needs_work = input
        .chars()
        .any(|c| is_private_use(c) || ARTIFACT_REPLACEMENTS.iter().any(|(from, _)| *from == c));
    if !needs_work {
        return Cow::Borrowed(input);
    }

    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        if is_private_use(c) {
            continue;
        }
        match ARTIFACT_REPLACEMENTS.iter().find(|(from, _)| *from == c) {
            Some((_, to)) => out.push_str(to),
            None => out.push(c),
        }
    }
    Cow::Owned(out)
}

static MULTI_SPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r" {2,}").unwrap());
static BLANK_LINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n[ \n]*\n").unwrap());
static LINE_TRAILING_SPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r" +\n").unwrap());

fn normalize_whitespace(input: &str) -> String {
    let text = input.replace("\r\n", "\n").replace('\r', "\n");
    let text = text.replace('\t', " ");
    let text = MULTI_SPACE.replace_all(&text, " ");
    let text = LINE_TRAILING_SPACE.replace_all(&text, "\n");
    let text = BLANK_LINES.replace_all(&text, "\n\n");
    text.trim().to_string()
}

/// Check a text for embedding suitability without blocking the caller.
///
/// Reports which categories of problems were found; the sanitized text is
/// returned alongside so callers embed that instead.
pub fn validate_for_embedding(text: &str) -> EmbeddingValidation {
    let mut issues = Vec::new();

    if text.chars().any(|c| c == '\u{FFFD}') {
        issues.push("replacement_characters".to_string());
    }
    if text.chars().any(is_stripped_control) {
        issues.push("control_characters".to_string());
    }
    if text.chars().any(is_invisible) {
        issues.push("zero_width_characters".to_string());
    }
    if text
        .chars()
        .any(|c| is_private_use(c) || ARTIFACT_REPLACEMENTS.iter().any(|(from, _)| *from == c))
    {
        issues.push("pdf_artifacts".to_string());
    }
    if text.contains("\r\n") || text.contains('\t') || MULTI_SPACE.is_match(text) {
        issues.push("excess_whitespace".to_string());
    }

    let sanitized = sanitize(text);
    let original_length = text.chars().count();
    let sanitized_length = sanitized.chars().count();

    if sanitized.is_empty() && !issues.contains(&"empty_after_sanitization".to_string()) {
        issues.push("empty_after_sanitization".to_string());
    }

    EmbeddingValidation {
        valid: !sanitized.is_empty(),
        issues,
        original_length,
        sanitized_length,
        removed_chars: original_length.saturating_sub(sanitized_length),
        sanitized,
    }
}

static DIGIT_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d{2,}").unwrap());
static URLS: Lazy<Regex> = Lazy::new(|| Regex::new(r"https?://\S+|www\.\S+").unwrap());

/// Approximate token count for embedding-limit checks.
///
/// Base rate of 3.5 characters per token for prose, with additive
/// corrections for digit runs and URLs, which both tokenize closer to
/// 2-3 characters per token.
pub fn estimate_token_count(text: &str) -> u32 {
    if text.is_empty() {
        return 0;
    }

    let base = (text.chars().count() as f64 / 3.5).ceil();

    let digit_chars: usize = DIGIT_RUNS.find_iter(text).map(|m| m.as_str().len()).sum();
    let url_chars: usize = URLS.find_iter(text).map(|m| m.as_str().len()).sum();

    // Digits and URL fragments cost roughly an extra token per 4 chars
    // on top of the prose rate.
    let correction = (digit_chars as f64 / 4.0) + (url_chars as f64 / 4.0);

    (base + correction).ceil() as u32
}

/// Hard gate applied before any embedding call.
pub fn exceeds_token_limit(text: &str, limit: u32) -> bool {
    estimate_token_count(text) > limit
}
