//! Back-of-book index registry.

use crate::model::SectionPath;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Where an indexed term was anchored.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    /// Enclosing section
    pub section: SectionPath,

    /// Number of the enclosing body paragraph, if the anchor sits in one
    pub paragraph: Option<u32>,
}

impl Location {
    /// Create a location.
    pub fn new(section: SectionPath, paragraph: Option<u32>) -> Self {
        Self { section, paragraph }
    }
}

/// All anchors of one canonical term.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexEntry {
    /// Canonical key
    pub key: String,

    /// Distinct display forms, in order first seen
    pub forms: Vec<String>,

    /// Anchor locations in document order
    pub locations: Vec<Location>,
}

impl IndexEntry {
    /// Display forms that differ from the key.
    pub fn variants(&self) -> Vec<&str> {
        self.forms
            .iter()
            .map(String::as_str)
            .filter(|form| *form != self.key)
            .collect()
    }
}

/// Registry of indexed terms grouped by canonical key.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IndexRegistry {
    entries: Vec<IndexEntry>,
    positions: HashMap<String, usize>,
}

impl IndexRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an anchor of `display` under the canonical key `key`.
    pub fn add(&mut self, display: &str, key: &str, location: Location) {
        let pos = match self.positions.get(key) {
            Some(&pos) => pos,
            None => {
                self.positions.insert(key.to_string(), self.entries.len());
                self.entries.push(IndexEntry {
                    key: key.to_string(),
                    forms: Vec::new(),
                    locations: Vec::new(),
                });
                self.entries.len() - 1
            }
        };
        let entry = &mut self.entries[pos];
        if !entry.forms.iter().any(|f| f == display) {
            entry.forms.push(display.to_string());
        }
        entry.locations.push(location);
    }

    /// Entry for a canonical key.
    pub fn get(&self, key: &str) -> Option<&IndexEntry> {
        self.positions.get(key).map(|&pos| &self.entries[pos])
    }

    /// Number of distinct canonical keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if no term was indexed.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total number of anchors across all keys.
    pub fn anchor_count(&self) -> usize {
        self.entries.iter().map(|e| e.locations.len()).sum()
    }

    /// Entries sorted by canonical key, case-insensitively.
    pub fn emit_index(&self) -> Vec<&IndexEntry> {
        let mut sorted: Vec<&IndexEntry> = self.entries.iter().collect();
        sorted.sort_by(|a, b| {
            a.key
                .to_lowercase()
                .cmp(&b.key.to_lowercase())
                .then_with(|| a.key.cmp(&b.key))
        });
        sorted
    }
}
