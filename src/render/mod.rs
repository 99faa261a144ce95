//! Rendering of finished documents into backend artifacts.
//!
//! All backends share one traversal ([`walk`]) and differ only in the
//! [`RenderSink`] they plug into it.

pub mod ebook;
mod inline;
mod json;
mod options;
pub mod page;
mod result;
mod walk;
pub mod word;

pub use ebook::{Chapter, EbookArtifact, NavPoint};
pub use inline::{segments_text, Segment, SegmentKind};
pub use json::{to_json, JsonFormat};
pub use options::{RenderOptions, DEFAULT_EBOOK_STYLESHEET};
pub use page::{Flowable, PageArtifact, PdfPage};
pub use result::RenderStats;
pub use walk::{
    location_label, walk, FootnotePlacement, Heading, RenderSink, RenderedParagraph, TocLine,
};
pub use word::{WordArtifact, WordBlock, WordParagraph, WordRun};

use crate::model::Metadata;
use serde::{Deserialize, Serialize};

/// Output of one backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "format", rename_all = "lowercase")]
pub enum Artifact {
    /// Word-processor document
    Docx(WordArtifact),
    /// Fixed-page document
    Pdf(PageArtifact),
    /// Reflowable e-book
    Epub(EbookArtifact),
}

impl Artifact {
    /// Backend key of the format.
    pub fn format(&self) -> &'static str {
        match self {
            Artifact::Docx(_) => "docx",
            Artifact::Pdf(_) => "pdf",
            Artifact::Epub(_) => "epub",
        }
    }

    /// Document metadata carried by the artifact.
    pub fn metadata(&self) -> &Metadata {
        match self {
            Artifact::Docx(a) => &a.metadata,
            Artifact::Pdf(a) => &a.metadata,
            Artifact::Epub(a) => &a.metadata,
        }
    }

    /// Traversal statistics.
    pub fn stats(&self) -> &RenderStats {
        match self {
            Artifact::Docx(a) => &a.stats,
            Artifact::Pdf(a) => &a.stats,
            Artifact::Epub(a) => &a.stats,
        }
    }

    /// Word-processor artifact, if this is one.
    pub fn as_word(&self) -> Option<&WordArtifact> {
        match self {
            Artifact::Docx(a) => Some(a),
            _ => None,
        }
    }

    /// Fixed-page artifact, if this is one.
    pub fn as_page(&self) -> Option<&PageArtifact> {
        match self {
            Artifact::Pdf(a) => Some(a),
            _ => None,
        }
    }

    /// E-book artifact, if this is one.
    pub fn as_ebook(&self) -> Option<&EbookArtifact> {
        match self {
            Artifact::Epub(a) => Some(a),
            _ => None,
        }
    }
}

/// Escape XML special characters for element content and attributes.
pub(crate) fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_xml() {
        assert_eq!(escape_xml("a < b & \"c\""), "a &lt; b &amp; &quot;c&quot;");
        assert_eq!(escape_xml("plain"), "plain");
    }
}
