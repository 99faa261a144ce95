//! Document-level types.

use super::{DocumentConfig, Node, Section, SectionPath};
use crate::registry::{
    Footnote, FootnoteRegistry, IndexRegistry, ReferenceRegistry, Registries, TocCollector,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A finished, immutable document.
///
/// Documents are produced by [`DocumentBuilder::finish`](crate::DocumentBuilder::finish)
/// and never change afterwards, so one value can be shared by backends
/// rendering on different threads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    metadata: Metadata,
    config: DocumentConfig,
    body: Vec<Node>,
    registries: Registries,
}

impl Document {
    pub(crate) fn from_parts(
        metadata: Metadata,
        config: DocumentConfig,
        body: Vec<Node>,
        registries: Registries,
    ) -> Self {
        Self {
            metadata,
            config,
            body,
            registries,
        }
    }

    /// Document metadata.
    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// Configuration the document was built with.
    pub fn config(&self) -> &DocumentConfig {
        &self.config
    }

    /// Top-level nodes in document order.
    pub fn body(&self) -> &[Node] {
        &self.body
    }

    /// All cross-reference registries.
    pub fn registries(&self) -> &Registries {
        &self.registries
    }

    /// Citation registry.
    pub fn references(&self) -> &ReferenceRegistry {
        &self.registries.references
    }

    /// Index-term registry.
    pub fn index(&self) -> &IndexRegistry {
        &self.registries.index
    }

    /// Footnote registry.
    pub fn footnotes(&self) -> &FootnoteRegistry {
        &self.registries.footnotes
    }

    /// Table-of-contents collector.
    pub fn toc(&self) -> &TocCollector {
        &self.registries.toc
    }

    /// Footnote by number.
    pub fn footnote(&self, number: u32) -> Option<&Footnote> {
        self.registries.footnotes.get(number)
    }

    /// Top-level sections.
    pub fn sections(&self) -> impl Iterator<Item = &Section> {
        self.body.iter().filter_map(|node| match node {
            Node::Section(s) => Some(s),
            Node::Block(_) => None,
        })
    }

    /// Section at a path, or `None` for the root or a dangling path.
    pub fn section_at(&self, path: &SectionPath) -> Option<&Section> {
        let mut ordinals = path.ordinals().iter();
        let first = *ordinals.next()?;
        let mut current = self.sections().nth(first.checked_sub(1)? as usize)?;
        for ordinal in ordinals {
            current = current.subsections().nth(ordinal.checked_sub(1)? as usize)?;
        }
        Some(current)
    }

    /// Visit every section in pre-order together with its path.
    pub fn visit_sections<F>(&self, mut f: F)
    where
        F: FnMut(&SectionPath, &Section),
    {
        fn walk<F: FnMut(&SectionPath, &Section)>(nodes: &[Node], parent: &SectionPath, f: &mut F) {
            let mut ordinal = 0;
            for node in nodes {
                if let Node::Section(section) = node {
                    ordinal += 1;
                    let path = parent.child(ordinal);
                    f(&path, section);
                    walk(&section.children, &path, f);
                }
            }
        }
        walk(&self.body, &SectionPath::root(), &mut f);
    }

    /// Number of sections at any depth.
    pub fn section_count(&self) -> usize {
        let mut count = 0;
        self.visit_sections(|_, _| count += 1);
        count
    }

    /// Check if the document has no content.
    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }

    /// Get plain text content of the entire document.
    pub fn plain_text(&self) -> String {
        self.body
            .iter()
            .map(Node::plain_text)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

/// Document metadata.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Metadata {
    /// Document title
    pub title: Option<String>,

    /// Subtitle
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,

    /// Authors in display order
    pub authors: Vec<String>,

    /// Version string
    pub version: Option<String>,

    /// Unique identifier
    pub identifier: Option<String>,

    /// Language tag
    pub language: String,

    /// Creation timestamp
    pub created: Option<DateTime<Utc>>,

    /// Generator name and version
    pub generator: String,
}

impl Metadata {
    /// Derive metadata from a configuration, stamped with the current time.
    pub fn from_config(config: &DocumentConfig) -> Self {
        Self {
            title: config.title.clone(),
            subtitle: config.subtitle.clone(),
            authors: config.authors.clone(),
            version: config.version.clone(),
            identifier: config.identifier.clone(),
            language: config.language.clone(),
            created: Some(Utc::now()),
            generator: format!("quire {}", env!("CARGO_PKG_VERSION")),
        }
    }

    /// Authors joined for display, or `None` if there are none.
    pub fn author_line(&self) -> Option<String> {
        if self.authors.is_empty() {
            None
        } else {
            Some(self.authors.join(", "))
        }
    }

    /// Check if the title page would be empty.
    pub fn is_blank(&self) -> bool {
        self.title.is_none()
            && self.subtitle.is_none()
            && self.authors.is_empty()
            && self.version.is_none()
    }
}
