//! Table-of-contents collector.

use crate::model::SectionPath;
use serde::{Deserialize, Serialize};

/// A section listed in the table of contents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TocEntry {
    /// Position of the section
    pub path: SectionPath,

    /// Section title
    pub title: String,

    /// Section depth (1 = top level)
    pub depth: usize,
}

/// Collects TOC entries in document pre-order as sections are created.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TocCollector {
    level: usize,
    entries: Vec<TocEntry>,
}

impl TocCollector {
    /// Create a collector keeping sections down to `level` (0 keeps none).
    pub fn new(level: usize) -> Self {
        Self {
            level,
            entries: Vec::new(),
        }
    }

    /// Configured depth.
    pub fn level(&self) -> usize {
        self.level
    }

    /// Record a section if it is shallow enough.
    pub fn record(&mut self, path: &SectionPath, title: &str) {
        let depth = path.depth();
        if depth == 0 || depth > self.level {
            return;
        }
        self.entries.push(TocEntry {
            path: path.clone(),
            title: title.to_string(),
            depth,
        });
    }

    /// Entries with depth at most `max_depth`, in pre-order.
    pub fn emit(&self, max_depth: usize) -> Vec<&TocEntry> {
        self.entries
            .iter()
            .filter(|e| e.depth <= max_depth)
            .collect()
    }

    /// Number of recorded entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
