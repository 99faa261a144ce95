//! Cross-reference registries.
//!
//! Registries are side tables filled while the document tree is composed
//! and read by backends at render time. They belong to one document; several
//! documents can coexist in a process.

mod footnotes;
mod index;
mod references;
mod toc;

pub use footnotes::{Footnote, FootnoteRegistry};
pub use index::{IndexEntry, IndexRegistry, Location};
pub use references::{
    BibliographyEntry, ReferenceEntry, ReferenceMap, ReferenceRegistry, ReferenceSource,
};
pub use toc::{TocCollector, TocEntry};

use serde::{Deserialize, Serialize};

/// The four registries owned by a document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Registries {
    /// Citations
    pub references: ReferenceRegistry,

    /// Indexed terms
    pub index: IndexRegistry,

    /// Footnotes
    pub footnotes: FootnoteRegistry,

    /// Table of contents
    pub toc: TocCollector,
}

impl Registries {
    /// Create empty registries collecting TOC entries down to `toc_level`.
    pub fn new(toc_level: usize) -> Self {
        Self {
            toc: TocCollector::new(toc_level),
            ..Default::default()
        }
    }
}
