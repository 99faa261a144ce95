//! Citation registry and the references collaborator interface.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// External references database.
///
/// Implementations resolve a free-form citation key (e.g. `"Darwin 1859"`)
/// to formatted bibliographic text, failing with
/// [`Error::ReferenceNotFound`] for unknown keys. Calls happen synchronously
/// during document construction, at most once per distinct key.
pub trait ReferenceSource: Send + Sync {
    /// Resolve a key to formatted bibliographic text.
    fn resolve(&self, key: &str) -> Result<String>;
}

/// In-memory references database with case-insensitive keys.
#[derive(Debug, Clone, Default)]
pub struct ReferenceMap {
    entries: HashMap<String, String>,
}

impl ReferenceMap {
    /// Create an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace an entry.
    pub fn insert(&mut self, key: &str, text: impl Into<String>) {
        self.entries.insert(fold(key), text.into());
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with(mut self, key: &str, text: impl Into<String>) -> Self {
        self.insert(key, text);
        self
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the map is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Check if a key is known.
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(&fold(key))
    }
}

impl ReferenceSource for ReferenceMap {
    fn resolve(&self, key: &str) -> Result<String> {
        self.entries
            .get(&fold(key))
            .cloned()
            .ok_or_else(|| Error::ReferenceNotFound(key.to_string()))
    }
}

/// A cited reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceEntry {
    /// Key as first cited
    pub key: String,

    /// Citation number, in order of first use
    pub number: u32,

    /// Formatted text, `None` when no collaborator was configured
    pub text: Option<String>,
}

/// One line of the bibliography.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BibliographyEntry {
    /// Citation number
    pub number: u32,

    /// Citation key
    pub key: String,

    /// Text to print
    pub text: String,
}

/// Registry of cited references.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReferenceRegistry {
    entries: Vec<ReferenceEntry>,
    positions: HashMap<String, usize>,
    missing: Vec<String>,
}

impl ReferenceRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Cite a key, resolving it through `source` on first use.
    ///
    /// Returns the citation number. Re-citing a key returns the number
    /// assigned on first use. Keys are matched case-insensitively.
    pub fn cite(&mut self, key: &str, source: Option<&dyn ReferenceSource>) -> Result<u32> {
        let folded = fold(key);
        if let Some(&pos) = self.positions.get(&folded) {
            return Ok(self.entries[pos].number);
        }

        let text = match source {
            Some(source) => Some(source.resolve(key)?),
            None => None,
        };

        let number = self.entries.len() as u32 + 1;
        log::debug!("citation [{}] assigned to {:?}", number, key);
        self.positions.insert(folded, self.entries.len());
        self.entries.push(ReferenceEntry {
            key: key.to_string(),
            number,
            text,
        });
        Ok(number)
    }

    /// Record a key that could not be resolved.
    pub fn mark_missing(&mut self, key: &str) {
        let folded = fold(key);
        if !self.missing.iter().any(|k| fold(k) == folded) {
            self.missing.push(key.to_string());
        }
    }

    /// Entry for a key, if it was resolved.
    pub fn lookup(&self, key: &str) -> Option<&ReferenceEntry> {
        self.positions
            .get(&fold(key))
            .map(|&pos| &self.entries[pos])
    }

    /// Text shown at a citation anchor: `[n]`, or `[ref? key]` if unresolved.
    pub fn citation_label(&self, key: &str) -> String {
        match self.lookup(key) {
            Some(entry) => format!("[{}]", entry.number),
            None => format!("[ref? {}]", key),
        }
    }

    /// Keys rendered as placeholders.
    pub fn missing(&self) -> &[String] {
        &self.missing
    }

    /// Resolved entries in citation order.
    pub fn entries(&self) -> &[ReferenceEntry] {
        &self.entries
    }

    /// Number of distinct resolved keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if nothing was cited successfully.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Bibliography in citation-number order.
    pub fn emit_bibliography(&self) -> Vec<BibliographyEntry> {
        self.entries
            .iter()
            .map(|entry| BibliographyEntry {
                number: entry.number,
                key: entry.key.clone(),
                text: entry.text.clone().unwrap_or_else(|| entry.key.clone()),
            })
            .collect()
    }
}

fn fold(key: &str) -> String {
    key.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn refs() -> ReferenceMap {
        ReferenceMap::new()
            .with("Darwin 1859", "Darwin. On the Origin of Species.")
            .with("Wallace 1858", "Wallace. On the Tendency of Varieties.")
    }

    #[test]
    fn test_numbering_follows_first_use() {
        let source = refs();
        let mut registry = ReferenceRegistry::new();
        assert_eq!(registry.cite("Wallace 1858", Some(&source)).unwrap(), 1);
        assert_eq!(registry.cite("Darwin 1859", Some(&source)).unwrap(), 2);
        assert_eq!(registry.cite("wallace 1858", Some(&source)).unwrap(), 1);
        assert_eq!(registry.len(), 2);

        let bibliography = registry.emit_bibliography();
        assert_eq!(bibliography[0].number, 1);
        assert_eq!(bibliography[0].key, "Wallace 1858");
        assert_eq!(bibliography[1].text, "Darwin. On the Origin of Species.");
    }

    #[test]
    fn test_unknown_key() {
        let source = refs();
        let mut registry = ReferenceRegistry::new();
        let err = registry.cite("Lamarck 1809", Some(&source)).unwrap_err();
        assert!(matches!(err, Error::ReferenceNotFound(ref k) if k == "Lamarck 1809"));
        assert!(registry.is_empty());

        registry.mark_missing("Lamarck 1809");
        registry.mark_missing("lamarck 1809");
        assert_eq!(registry.missing().len(), 1);
        assert_eq!(registry.citation_label("Lamarck 1809"), "[ref? Lamarck 1809]");
    }

    #[test]
    fn test_without_collaborator() {
        let mut registry = ReferenceRegistry::new();
        assert_eq!(registry.cite("Darwin 1859", None).unwrap(), 1);
        assert_eq!(registry.citation_label("Darwin 1859"), "[1]");
        assert_eq!(registry.emit_bibliography()[0].text, "Darwin 1859");
    }
}
