//! Document structure tree
//!
//! Headings detected in a document form a forest of chapters, articles and
//! sections. Nodes live in an arena (`StructureTree`) and refer to their
//! parent by index, never by shared ownership; the tree is read-only after
//! construction and always outlives the chunks that point into it within a
//! single ingestion call.

use serde::{Deserialize, Serialize};

/// Kind of structural element a heading introduces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StructureKind {
    Chapter,
    Article,
    Section,
}

impl StructureKind {
    /// Nesting level used for parent inference (lower = shallower).
    pub fn level(&self) -> u8 {
        match self {
            Self::Chapter => 1,
            Self::Article => 2,
            Self::Section => 3,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Chapter => "chapter",
            Self::Article => "article",
            Self::Section => "section",
        }
    }
}

/// Index of a node within a [`StructureTree`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructureIndex(pub usize);

/// A single detected heading.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentStructure {
    pub kind: StructureKind,
    /// Numbering as it appears in the text, e.g. "Artikel 4.3" or "Hoofdstuk 2"
    pub identifier: String,
    /// Free-text heading title, possibly empty
    pub title: String,
    /// Byte offset in the combined document text where the heading starts
    pub start_index: usize,
    /// Parent node, inferred from heading level
    pub parent: Option<StructureIndex>,
}

impl DocumentStructure {
    /// Human-readable label: identifier and title, whichever is present.
    pub fn label(&self) -> String {
        match (self.identifier.is_empty(), self.title.is_empty()) {
            (false, false) => format!("{} {}", self.identifier, self.title),
            (false, true) => self.identifier.clone(),
            (true, false) => self.title.clone(),
            (true, true) => String::new(),
        }
    }
}

/// Arena of [`DocumentStructure`] nodes, ordered by `start_index`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StructureTree {
    nodes: Vec<DocumentStructure>,
}

impl StructureTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a node, returning its index. Nodes must be pushed in
    /// document order (ascending `start_index`).
    pub fn push(&mut self, node: DocumentStructure) -> StructureIndex {
        let index = StructureIndex(self.nodes.len());
        self.nodes.push(node);
        index
    }

    pub fn get(&self, index: StructureIndex) -> Option<&DocumentStructure> {
        self.nodes.get(index.0)
    }

    pub fn nodes(&self) -> &[DocumentStructure] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Most specific node whose range contains `pos`.
    ///
    /// Headings partition the document linearly, so the last node starting
    /// at or before `pos` is the deepest one that applies.
    pub fn find_at_position(&self, pos: usize) -> Option<StructureIndex> {
        self.nodes
            .iter()
            .enumerate()
            .rev()
            .find(|(_, node)| node.start_index <= pos)
            .map(|(i, _)| StructureIndex(i))
    }

    /// Labels from the root ancestor down to `index`, for breadcrumbs
    /// and chunk metadata.
    pub fn path_labels(&self, index: StructureIndex) -> Vec<String> {
        let mut labels = Vec::new();
        let mut current = Some(index);

        while let Some(idx) = current {
            let Some(node) = self.get(idx) else { break };
            let label = node.label();
            if !label.is_empty() {
                labels.push(label);
            }
            current = node.parent;
        }

        labels.reverse();
        labels
    }

    /// Render a breadcrumb header for the chunk at `pos`, e.g.
    /// `"Personeelsgids > Hoofdstuk 4 > Artikel 4.3 Verlof"`.
    pub fn context_header(&self, doc_name: &str, pos: usize) -> String {
        let mut parts = vec![doc_name.to_string()];

        if let Some(index) = self.find_at_position(pos) {
            parts.extend(self.path_labels(index));
        }

        parts.join(" > ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_tree() -> StructureTree {
        let mut tree = StructureTree::new();
        let chapter = tree.push(DocumentStructure {
            kind: StructureKind::Chapter,
            identifier: "Hoofdstuk 1".into(),
            title: "Arbeidsvoorwaarden".into(),
            start_index: 0,
            parent: None,
        });
        tree.push(DocumentStructure {
            kind: StructureKind::Article,
            identifier: "Artikel 1.1".into(),
            title: "Vakantie".into(),
            start_index: 100,
            parent: Some(chapter),
        });
        tree.push(DocumentStructure {
            kind: StructureKind::Article,
            identifier: "Artikel 1.2".into(),
            title: "Ziekte".into(),
            start_index: 400,
            parent: Some(chapter),
        });
        tree
    }

    #[test]
    fn test_find_at_position_deepest() {
        let tree = sample_tree();

        let found = tree.find_at_position(150).unwrap();
        assert_eq!(tree.get(found).unwrap().identifier, "Artikel 1.1");

        let found = tree.find_at_position(500).unwrap();
        assert_eq!(tree.get(found).unwrap().identifier, "Artikel 1.2");
    }

    #[test]
    fn test_find_at_position_before_first_heading() {
        let mut tree = StructureTree::new();
        tree.push(DocumentStructure {
            kind: StructureKind::Article,
            identifier: "Artikel 1".into(),
            title: String::new(),
            start_index: 50,
            parent: None,
        });

        assert!(tree.find_at_position(10).is_none());
    }

    #[test]
    fn test_path_labels_root_to_leaf() {
        let tree = sample_tree();
        let index = tree.find_at_position(150).unwrap();

        assert_eq!(
            tree.path_labels(index),
            vec!["Hoofdstuk 1 Arbeidsvoorwaarden", "Artikel 1.1 Vakantie"]
        );
    }

    #[test]
    fn test_context_header() {
        let tree = sample_tree();
        assert_eq!(
            tree.context_header("Personeelsgids", 150),
            "Personeelsgids > Hoofdstuk 1 Arbeidsvoorwaarden > Artikel 1.1 Vakantie"
        );
    }

    #[test]
    fn test_context_header_no_structure() {
        let tree = StructureTree::new();
        assert_eq!(tree.context_header("Doc", 0), "Doc");
    }

    #[test]
    fn test_label_identifier_only() {
        let node = DocumentStructure {
            kind: StructureKind::Section,
            identifier: "2.1".into(),
            title: String::new(),
            start_index: 0,
            parent: None,
        };
        assert_eq!(node.label(), "2.1");
    }
}
