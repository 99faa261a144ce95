//! Flattening of nested inline content into styled segments.

use crate::error::{Error, Result};
use crate::model::{Inline, TextStyle};
use crate::registry::ReferenceRegistry;
use serde::{Deserialize, Serialize};

/// A run of inline content carrying the union of every enclosing style.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    /// Active style flags
    pub style: TextStyle,

    /// What the run holds
    pub kind: SegmentKind,
}

/// Content of a [`Segment`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SegmentKind {
    /// Plain text, adjacent runs of equal style merged
    Text(String),
    /// Hyperlink
    Link {
        /// Link text
        text: String,
        /// Target URI
        uri: String,
    },
    /// Footnote anchor
    FootnoteRef(u32),
    /// Indexed term
    IndexTerm {
        /// Displayed text
        text: String,
        /// Canonical key
        key: String,
    },
    /// Citation anchor
    Citation {
        /// Citation key
        key: String,
        /// Text shown at the anchor, `[n]` or `[ref? key]`
        label: String,
        /// Citation number if the key was resolved
        number: Option<u32>,
    },
    /// Explicit line break
    LineBreak,
}

impl Segment {
    /// Text shown for this segment.
    pub fn display_text(&self) -> String {
        match &self.kind {
            SegmentKind::Text(text) => text.clone(),
            SegmentKind::Link { text, .. } => text.clone(),
            SegmentKind::FootnoteRef(n) => n.to_string(),
            SegmentKind::IndexTerm { text, .. } => text.clone(),
            SegmentKind::Citation { label, .. } => label.clone(),
            SegmentKind::LineBreak => "\n".to_string(),
        }
    }
}

/// Plain text of a segment sequence. Footnote anchors are omitted.
pub fn segments_text(segments: &[Segment]) -> String {
    segments
        .iter()
        .filter(|s| !matches!(s.kind, SegmentKind::FootnoteRef(_)))
        .map(Segment::display_text)
        .collect()
}

/// Flattens inline trees for one backend.
pub(crate) struct Flattener<'a> {
    references: &'a ReferenceRegistry,
    supported: TextStyle,
    backend: &'static str,
}

impl<'a> Flattener<'a> {
    pub(crate) fn new(
        references: &'a ReferenceRegistry,
        supported: TextStyle,
        backend: &'static str,
    ) -> Self {
        Self {
            references,
            supported,
            backend,
        }
    }

    /// Flatten `content` found at node `path`.
    ///
    /// Fails with [`Error::UnsupportedStyle`] naming the offending span when
    /// a style union contains a flag the backend cannot express.
    pub(crate) fn flatten(&self, content: &[Inline], path: &str) -> Result<Vec<Segment>> {
        let mut out = Vec::new();
        self.flatten_into(content, TextStyle::default(), path, &mut out)?;
        Ok(out)
    }

    fn flatten_into(
        &self,
        content: &[Inline],
        style: TextStyle,
        path: &str,
        out: &mut Vec<Segment>,
    ) -> Result<()> {
        for (i, inline) in content.iter().enumerate() {
            match inline {
                Inline::Text(text) => push_text(out, style, text),
                Inline::Period => push_text(out, style, "."),
                Inline::Styled {
                    style: span,
                    children,
                } => {
                    let span_path = format!("{}/span[{}]", path, i);
                    let combined = style.union(*span);
                    if let Some(flag) = combined.first_unsupported(&self.supported) {
                        return Err(Error::UnsupportedStyle {
                            backend: self.backend,
                            style: flag.to_string(),
                            path: span_path,
                        });
                    }
                    self.flatten_into(children, combined, &span_path, out)?;
                }
                Inline::Link { text, uri } => out.push(Segment {
                    style,
                    kind: SegmentKind::Link {
                        text: text.clone(),
                        uri: uri.clone(),
                    },
                }),
                Inline::Footnote(number) => out.push(Segment {
                    style,
                    kind: SegmentKind::FootnoteRef(*number),
                }),
                Inline::IndexTerm { text, key } => out.push(Segment {
                    style,
                    kind: SegmentKind::IndexTerm {
                        text: text.clone(),
                        key: key.clone(),
                    },
                }),
                Inline::Citation(key) => out.push(Segment {
                    style,
                    kind: SegmentKind::Citation {
                        key: key.clone(),
                        label: self.references.citation_label(key),
                        number: self.references.lookup(key).map(|e| e.number),
                    },
                }),
                Inline::LineBreak => out.push(Segment {
                    style,
                    kind: SegmentKind::LineBreak,
                }),
            }
        }
        Ok(())
    }
}

fn push_text(out: &mut Vec<Segment>, style: TextStyle, text: &str) {
    if let Some(Segment {
        style: last_style,
        kind: SegmentKind::Text(last),
    }) = out.last_mut()
    {
        if *last_style == style {
            last.push_str(text);
            return;
        }
    }
    out.push(Segment {
        style,
        kind: SegmentKind::Text(text.to_string()),
    });
}
