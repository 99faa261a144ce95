//! Render statistics.

use serde::{Deserialize, Serialize};

/// Statistics collected while walking a document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderStats {
    /// Number of sections rendered
    pub section_count: u32,

    /// Number of paragraphs and quotes, including list and footnote bodies
    pub paragraph_count: u32,

    /// Number of list items at any depth
    pub list_item_count: u32,

    /// Number of footnotes emitted
    pub footnote_count: u32,

    /// Number of citation anchors
    pub citation_count: u32,

    /// Number of indexed-term anchors
    pub index_term_count: u32,

    /// Physical pages or files produced (backend-specific)
    pub page_count: u32,

    /// Approximate word count (whitespace-separated tokens)
    pub word_count: u32,
}

impl RenderStats {
    /// Create new empty statistics.
    pub fn new() -> Self {
        Self::default()
    }

    /// Increment section count.
    pub fn add_section(&mut self) {
        self.section_count += 1;
    }

    /// Increment paragraph count.
    pub fn add_paragraph(&mut self) {
        self.paragraph_count += 1;
    }

    /// Increment list item count.
    pub fn add_list_item(&mut self) {
        self.list_item_count += 1;
    }

    /// Increment footnote count.
    pub fn add_footnote(&mut self) {
        self.footnote_count += 1;
    }

    /// Add word counts from text.
    pub fn count_text(&mut self, text: &str) {
        self.word_count += text.split_whitespace().count() as u32;
    }
}
