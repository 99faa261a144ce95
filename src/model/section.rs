//! Structural types: sections, blocks and section paths.

use super::{List, Paragraph};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A section of the heading hierarchy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    /// Section title
    pub title: String,

    /// Line shown under the heading, not listed in the TOC
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,

    /// Nesting depth (1 = top level)
    pub depth: usize,

    /// Child blocks and sections in document order
    pub children: Vec<Node>,

    /// Page directives keyed by backend directive key
    pub page_directives: BTreeMap<String, u32>,
}

impl Section {
    /// Create a new empty section.
    pub fn new(title: impl Into<String>, depth: usize) -> Self {
        Self {
            title: title.into(),
            subtitle: None,
            depth,
            children: Vec::new(),
            page_directives: BTreeMap::new(),
        }
    }

    /// Page directive for the backend with the given key, if any.
    pub fn page_directive(&self, key: &str) -> Option<u32> {
        self.page_directives.get(key).copied()
    }

    /// Direct child sections.
    pub fn subsections(&self) -> impl Iterator<Item = &Section> {
        self.children.iter().filter_map(|node| match node {
            Node::Section(s) => Some(s),
            Node::Block(_) => None,
        })
    }

    /// Direct child blocks.
    pub fn blocks(&self) -> impl Iterator<Item = &Block> {
        self.children.iter().filter_map(|node| match node {
            Node::Block(b) => Some(b),
            Node::Section(_) => None,
        })
    }

    /// Get plain text of the section, heading included.
    pub fn plain_text(&self) -> String {
        std::iter::once(self.title.clone())
            .chain(self.subtitle.clone())
            .chain(self.children.iter().map(Node::plain_text))
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

/// A child of the document root or of a section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "node", rename_all = "snake_case")]
pub enum Node {
    /// A content block
    Block(Block),
    /// A nested section
    Section(Section),
}

impl Node {
    /// Get plain text of the node.
    pub fn plain_text(&self) -> String {
        match self {
            Node::Block(b) => b.plain_text(),
            Node::Section(s) => s.plain_text(),
        }
    }
}

/// A content block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    /// A paragraph or quote
    Paragraph(Paragraph),
    /// A list
    List(List),
    /// A forced page break
    PageBreak,
    /// A horizontal rule between passages
    ThematicBreak,
}

impl Block {
    /// Get plain text of the block.
    pub fn plain_text(&self) -> String {
        match self {
            Block::Paragraph(p) => p.plain_text(),
            Block::List(l) => l
                .items
                .iter()
                .map(|item| {
                    let mut text = item.plain_text();
                    if let Some(sub) = &item.sublist {
                        text.push('\n');
                        text.push_str(&Block::List(sub.clone()).plain_text());
                    }
                    text
                })
                .collect::<Vec<_>>()
                .join("\n"),
            Block::PageBreak | Block::ThematicBreak => String::new(),
        }
    }
}

/// Position of a section in the tree: 1-based ordinals among sibling
/// sections from the root down. The empty path is the document root.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SectionPath(Vec<u32>);

impl SectionPath {
    /// The document root.
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Build a path from ordinals.
    pub fn from_ordinals(ordinals: impl Into<Vec<u32>>) -> Self {
        Self(ordinals.into())
    }

    /// Path of the `ordinal`-th child section.
    pub fn child(&self, ordinal: u32) -> Self {
        let mut ordinals = self.0.clone();
        ordinals.push(ordinal);
        Self(ordinals)
    }

    /// Ordinals from the root down.
    pub fn ordinals(&self) -> &[u32] {
        &self.0
    }

    /// Depth of the section (0 for the root).
    pub fn depth(&self) -> usize {
        self.0.len()
    }

    /// Check if this is the document root.
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Path of the enclosing section, or `None` for the root.
    pub fn parent(&self) -> Option<Self> {
        if self.is_root() {
            None
        } else {
            Some(Self(self.0[..self.0.len() - 1].to_vec()))
        }
    }

    /// Ordinals joined with a delimiter, e.g. `1_2` for `"_"`.
    pub fn join(&self, delimiter: &str) -> String {
        self.0
            .iter()
            .map(u32::to_string)
            .collect::<Vec<_>>()
            .join(delimiter)
    }

    /// Heading number in the form `1.2.`.
    pub fn number(&self) -> String {
        if self.is_root() {
            String::new()
        } else {
            format!("{}.", self.join("."))
        }
    }
}

impl fmt::Display for SectionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_root() {
            f.write_str("root")
        } else {
            f.write_str(&self.join("."))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_section_path() {
        let root = SectionPath::root();
        assert!(root.is_root());
        assert_eq!(root.parent(), None);

        let path = root.child(1).child(2);
        assert_eq!(path.depth(), 2);
        assert_eq!(path.number(), "1.2.");
        assert_eq!(path.to_string(), "1.2");
        assert_eq!(path.join("_"), "1_2");
        assert_eq!(path.parent(), Some(SectionPath::from_ordinals(vec![1])));
    }

    #[test]
    fn test_section_children() {
        let mut section = Section::new("Intro", 1);
        section
            .children
            .push(Node::Block(Block::Paragraph(Paragraph::with_text("Body."))));
        section
            .children
            .push(Node::Section(Section::new("Details", 2)));
        section.page_directives.insert("docx".into(), 4);

        assert_eq!(section.blocks().count(), 1);
        assert_eq!(section.subsections().count(), 1);
        assert_eq!(section.page_directive("docx"), Some(4));
        assert_eq!(section.page_directive("epub"), None);
        assert_eq!(section.plain_text(), "Intro\n\nBody.\n\nDetails");
    }

    #[test]
    fn test_breaks_carry_no_text() {
        let mut section = Section::new("Intro", 1);
        section.subtitle = Some("A beginning".into());
        section.children.push(Node::Block(Block::ThematicBreak));
        section
            .children
            .push(Node::Block(Block::Paragraph(Paragraph::with_text("Body."))));
        section.children.push(Node::Block(Block::PageBreak));

        assert_eq!(section.blocks().count(), 3);
        assert_eq!(section.plain_text(), "Intro\n\nA beginning\n\nBody.");

        let json = serde_json::to_string(&Block::PageBreak).unwrap();
        assert_eq!(json, r#"{"type":"page_break"}"#);
    }
}
