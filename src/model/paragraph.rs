//! Paragraph and inline-level types.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;
use unicode_normalization::UnicodeNormalization;

/// A paragraph of inline content.
///
/// Quotes are paragraphs with [`ParagraphKind::Quote`]; they carry the same
/// inline content and differ only in the block style a backend applies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paragraph {
    /// Block style of the paragraph
    pub kind: ParagraphKind,

    /// Inline nodes in document order
    pub content: Vec<Inline>,
}

impl Paragraph {
    /// Create a new empty paragraph.
    pub fn new() -> Self {
        Self::with_kind(ParagraphKind::Normal)
    }

    /// Create a new empty quote.
    pub fn quote() -> Self {
        Self::with_kind(ParagraphKind::Quote)
    }

    /// Create an empty paragraph of the given kind.
    pub fn with_kind(kind: ParagraphKind) -> Self {
        Self {
            kind,
            content: Vec::new(),
        }
    }

    /// Create a paragraph holding a single normalized text run.
    pub fn with_text(text: &str) -> Self {
        let mut p = Self::new();
        let text = normalize_whitespace(text);
        let text = text.trim();
        if !text.is_empty() {
            p.content.push(Inline::Text(text.to_string()));
        }
        p
    }

    /// Check if this paragraph is a quote.
    pub fn is_quote(&self) -> bool {
        self.kind == ParagraphKind::Quote
    }

    /// Check if the paragraph has no visible content.
    pub fn is_empty(&self) -> bool {
        self.content.is_empty() || self.plain_text().trim().is_empty()
    }

    /// Get plain text content of the paragraph.
    pub fn plain_text(&self) -> String {
        let mut out = String::new();
        for inline in &self.content {
            inline.write_plain(&mut out);
        }
        out
    }

    /// Footnote numbers anchored in this paragraph, in anchor order.
    pub fn footnote_anchors(&self) -> Vec<u32> {
        fn collect(content: &[Inline], out: &mut Vec<u32>) {
            for inline in content {
                match inline {
                    Inline::Footnote(number) => out.push(*number),
                    Inline::Styled { children, .. } => collect(children, out),
                    _ => {}
                }
            }
        }
        let mut out = Vec::new();
        collect(&self.content, &mut out);
        out
    }
}

impl Default for Paragraph {
    fn default() -> Self {
        Self::new()
    }
}

/// Block style of a paragraph.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParagraphKind {
    /// Body text
    #[default]
    Normal,
    /// Block quotation
    Quote,
}

/// Inline content within a paragraph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Inline {
    /// A plain text run
    Text(String),

    /// A styled span owning its children
    Styled {
        /// Styles added by this span (never empty)
        style: TextStyle,
        /// Child inline nodes
        children: Vec<Inline>,
    },

    /// A hyperlink
    Link {
        /// Link text
        text: String,
        /// Target URI
        uri: String,
    },

    /// Anchor of the footnote with this number
    Footnote(u32),

    /// An indexed term
    IndexTerm {
        /// Text shown at the anchor
        text: String,
        /// Canonical index key
        key: String,
    },

    /// A citation of a bibliography key
    Citation(String),

    /// An explicit line break
    LineBreak,

    /// A sentence terminator, attached without a preceding space
    Period,
}

impl Inline {
    /// Create a span carrying a single style.
    pub fn span(style: Style, children: Vec<Inline>) -> Self {
        Inline::Styled {
            style: TextStyle::from(style),
            children,
        }
    }

    fn write_plain(&self, out: &mut String) {
        match self {
            Inline::Text(text) => out.push_str(text),
            Inline::Styled { children, .. } => {
                for child in children {
                    child.write_plain(out);
                }
            }
            Inline::Link { text, .. } => out.push_str(text),
            Inline::Footnote(_) => {}
            Inline::IndexTerm { text, .. } => out.push_str(text),
            Inline::Citation(key) => {
                out.push('[');
                out.push_str(key);
                out.push(']');
            }
            Inline::LineBreak => out.push('\n'),
            Inline::Period => out.push('.'),
        }
    }
}

/// A single inline style flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Style {
    /// Bold text
    Bold,
    /// Italic text
    Italic,
    /// Underlined text
    Underline,
    /// Editorial comment
    Comment,
}

impl Style {
    /// Every recognized style flag.
    pub const ALL: [Style; 4] = [Style::Bold, Style::Italic, Style::Underline, Style::Comment];
}

impl fmt::Display for Style {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Style::Bold => "bold",
            Style::Italic => "italic",
            Style::Underline => "underline",
            Style::Comment => "comment",
        };
        f.write_str(name)
    }
}

/// A set of active style flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TextStyle {
    /// Bold text
    pub bold: bool,

    /// Italic text
    pub italic: bool,

    /// Underlined text
    pub underline: bool,

    /// Editorial comment
    pub comment: bool,
}

impl TextStyle {
    /// A set with every flag enabled.
    pub fn all() -> Self {
        Self {
            bold: true,
            italic: true,
            underline: true,
            comment: true,
        }
    }

    /// Check if any styling is applied.
    pub fn has_styling(&self) -> bool {
        self.bold || self.italic || self.underline || self.comment
    }

    /// Check if a flag is active.
    pub fn contains(&self, style: Style) -> bool {
        match style {
            Style::Bold => self.bold,
            Style::Italic => self.italic,
            Style::Underline => self.underline,
            Style::Comment => self.comment,
        }
    }

    /// Return a copy with the flag enabled.
    pub fn with(mut self, style: Style) -> Self {
        match style {
            Style::Bold => self.bold = true,
            Style::Italic => self.italic = true,
            Style::Underline => self.underline = true,
            Style::Comment => self.comment = true,
        }
        self
    }

    /// Return a copy with the flag disabled.
    pub fn without(mut self, style: Style) -> Self {
        match style {
            Style::Bold => self.bold = false,
            Style::Italic => self.italic = false,
            Style::Underline => self.underline = false,
            Style::Comment => self.comment = false,
        }
        self
    }

    /// Union of two style sets.
    pub fn union(self, other: TextStyle) -> Self {
        Self {
            bold: self.bold || other.bold,
            italic: self.italic || other.italic,
            underline: self.underline || other.underline,
            comment: self.comment || other.comment,
        }
    }

    /// Active flags in canonical order.
    pub fn flags(&self) -> Vec<Style> {
        Style::ALL
            .into_iter()
            .filter(|s| self.contains(*s))
            .collect()
    }

    /// First active flag that `supported` does not contain.
    pub fn first_unsupported(&self, supported: &TextStyle) -> Option<Style> {
        self.flags().into_iter().find(|s| !supported.contains(*s))
    }
}

impl From<Style> for TextStyle {
    fn from(style: Style) -> Self {
        TextStyle::default().with(style)
    }
}

fn whitespace_run() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[ \t\r\n]+").expect("valid whitespace pattern"))
}

/// Collapse every run of space, tab, CR and newline into a single space and
/// normalize to Unicode NFC.
///
/// The function is idempotent: normalizing its output yields the same text.
pub fn normalize_whitespace(text: &str) -> String {
    let collapsed = whitespace_run().replace_all(text, " ");
    collapsed.nfc().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_whitespace() {
        assert_eq!(normalize_whitespace("Hello\n   world."), "Hello world.");
        assert_eq!(normalize_whitespace("a\t\tb\r\nc"), "a b c");
        assert_eq!(normalize_whitespace("  padded  "), " padded ");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let inputs = ["Hello\n   world.", "  a \t b  ", "", "e\u{301}t\u{e9}"];
        for input in inputs {
            let once = normalize_whitespace(input);
            assert_eq!(normalize_whitespace(&once), once);
        }
    }

    #[test]
    fn test_normalize_composes_unicode() {
        assert_eq!(normalize_whitespace("e\u{301}"), "\u{e9}");
    }

    #[test]
    fn test_paragraph_plain_text() {
        let mut p = Paragraph::with_text("Hello");
        p.content.push(Inline::span(
            Style::Bold,
            vec![Inline::Text(" world".into())],
        ));
        p.content.push(Inline::Period);
        p.content.push(Inline::Footnote(1));

        assert_eq!(p.plain_text(), "Hello world.");
        assert_eq!(p.footnote_anchors(), vec![1]);
    }

    #[test]
    fn test_text_style_union() {
        let italic = TextStyle::from(Style::Italic);
        let both = italic.union(Style::Bold.into());
        assert!(both.bold && both.italic);
        assert_eq!(both.flags(), vec![Style::Bold, Style::Italic]);
        assert!(!TextStyle::default().has_styling());
    }

    #[test]
    fn test_first_unsupported() {
        let supported = TextStyle::all().without(Style::Comment);
        let style = TextStyle::from(Style::Comment).with(Style::Bold);
        assert_eq!(style.first_unsupported(&supported), Some(Style::Comment));
        assert_eq!(TextStyle::from(Style::Bold).first_unsupported(&supported), None);
    }
}
