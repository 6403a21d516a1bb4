//! Page types for extracted document text

use serde::{Deserialize, Serialize};

/// Separator inserted between pages when building the combined document text.
pub const PAGE_SEPARATOR: &str = "\n\n";

/// A single page of raw extracted text, as supplied by the PDF extractor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page {
    /// 1-based page number
    pub page_number: u32,
    /// Raw extracted text for this page
    pub text: String,
}

impl Page {
    /// Create a new page
    pub fn new(page_number: u32, text: impl Into<String>) -> Self {
        Self {
            page_number,
            text: text.into(),
        }
    }
}

/// Byte range of a page within the combined document text.
///
/// Boundaries are contiguous and monotonically increasing in `start_pos`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageBoundary {
    pub page_number: u32,
    pub start_pos: usize,
    pub end_pos: usize,
}

/// Concatenate pages into a single document text and record where each
/// page starts and ends. Pages are joined with [`PAGE_SEPARATOR`].
pub fn join_pages(pages: &[Page]) -> (String, Vec<PageBoundary>) {
    let mut full_text = String::new();
    let mut boundaries = Vec::with_capacity(pages.len());

    for (i, page) in pages.iter().enumerate() {
        if i > 0 {
            full_text.push_str(PAGE_SEPARATOR);
        }

        let start_pos = full_text.len();
        full_text.push_str(&page.text);

        boundaries.push(PageBoundary {
            page_number: page.page_number,
            start_pos,
            end_pos: full_text.len(),
        });
    }

    (full_text, boundaries)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_pages_boundaries_contiguous() {
        let pages = vec![
            Page::new(1, "First page."),
            Page::new(2, "Second page."),
            Page::new(3, "Third."),
        ];

        let (full_text, boundaries) = join_pages(&pages);

        assert_eq!(full_text, "First page.\n\nSecond page.\n\nThird.");
        assert_eq!(boundaries.len(), 3);
        assert_eq!(boundaries[0].start_pos, 0);

        for window in boundaries.windows(2) {
            assert!(window[0].start_pos < window[1].start_pos);
            assert_eq!(
                window[0].end_pos + PAGE_SEPARATOR.len(),
                window[1].start_pos
            );
        }
    }

    #[test]
    fn test_join_pages_empty() {
        let (full_text, boundaries) = join_pages(&[]);
        assert!(full_text.is_empty());
        assert!(boundaries.is_empty());
    }

    #[test]
    fn test_join_pages_single() {
        let (full_text, boundaries) = join_pages(&[Page::new(1, "Only page")]);
        assert_eq!(full_text, "Only page");
        assert_eq!(boundaries[0].end_pos, full_text.len());
    }
}
