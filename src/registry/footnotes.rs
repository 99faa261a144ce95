//! Footnote registry.

use crate::model::{Block, SectionPath};
use serde::{Deserialize, Serialize};

/// A footnote body and the section owning its anchor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Footnote {
    /// Document-wide number, in anchor order
    pub number: u32,

    /// Innermost section enclosing the anchor
    pub section: SectionPath,

    /// Body blocks
    pub body: Vec<Block>,
}

impl Footnote {
    /// Get plain text of the footnote body.
    pub fn plain_text(&self) -> String {
        self.body
            .iter()
            .map(Block::plain_text)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Registry of footnotes in anchor order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FootnoteRegistry {
    notes: Vec<Footnote>,
    issued: u32,
}

impl FootnoteRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Hand out the next footnote number.
    ///
    /// Numbers are reserved when the anchor is created, before the body is
    /// built, so a footnote anchored inside another footnote's body gets a
    /// later number.
    pub fn reserve(&mut self) -> u32 {
        self.issued += 1;
        self.issued
    }

    /// Store a finished footnote, keeping number order.
    pub fn insert(&mut self, note: Footnote) {
        let pos = self
            .notes
            .binary_search_by_key(&note.number, |n| n.number)
            .unwrap_or_else(|pos| pos);
        self.notes.insert(pos, note);
    }

    /// Footnote by number.
    pub fn get(&self, number: u32) -> Option<&Footnote> {
        self.notes
            .binary_search_by_key(&number, |n| n.number)
            .ok()
            .map(|pos| &self.notes[pos])
    }

    /// Footnotes owned by one section, in anchor order.
    pub fn emit_footnotes(&self, section: &SectionPath) -> Vec<&Footnote> {
        self.notes.iter().filter(|n| &n.section == section).collect()
    }

    /// Every footnote in document pre-order.
    pub fn emit_all(&self) -> &[Footnote] {
        &self.notes
    }

    /// Number of footnotes.
    pub fn len(&self) -> usize {
        self.notes.len()
    }

    /// Check if there are no footnotes.
    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }
}
