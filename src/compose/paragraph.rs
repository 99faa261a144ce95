//! Paragraph handles and inline construction.

use super::{BuildState, Container, Dest, FootnoteHandle, Parts};
use crate::error::{Error, Result};
use crate::model::{
    normalize_whitespace, Block, Inline, Paragraph, ParagraphKind, SectionPath, Style,
};
use crate::registry::{Footnote, Location};

const EMDASH: &str = "\u{2014}";

struct OpenSpan {
    style: Style,
    children: Vec<Inline>,
}

/// An open paragraph or block quote.
///
/// Inline content is appended through the methods below. Style scopes form
/// a stack: [`close_style`](Self::close_style) must name the innermost open
/// style, and every scope must be closed before the paragraph itself.
/// [`styled`](Self::styled) closes its scope on every exit path.
pub struct ParagraphHandle<'a> {
    state: &'a mut BuildState,
    dest: Dest<'a>,
    section: SectionPath,
    number: Option<u32>,
    paragraph: Option<Paragraph>,
    spans: Vec<OpenSpan>,
    spaced: bool,
    /// Content emitted so far ends in whitespace, or there is none yet
    trailing_space: bool,
}

impl std::fmt::Debug for ParagraphHandle<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParagraphHandle")
            .field("section", &self.section)
            .field("number", &self.number)
            .field("paragraph", &self.paragraph)
            .finish_non_exhaustive()
    }
}

impl<'a> ParagraphHandle<'a> {
    pub(crate) fn open(parts: Parts<'a>, kind: ParagraphKind) -> Self {
        let Parts {
            state,
            dest,
            section,
        } = parts;
        let number = dest.is_flow().then(|| state.next_flow_paragraph());
        Self {
            state,
            dest,
            section,
            number,
            paragraph: Some(Paragraph::with_kind(kind)),
            spans: Vec::new(),
            spaced: false,
            trailing_space: true,
        }
    }

    /// Flow number of the paragraph, `None` inside lists and footnotes.
    pub fn number(&self) -> Option<u32> {
        self.number
    }

    /// Check if the paragraph has been finalized.
    pub fn is_closed(&self) -> bool {
        self.paragraph.is_none()
    }

    /// Styles currently open, outermost first.
    pub fn open_styles(&self) -> Vec<Style> {
        self.spans.iter().map(|s| s.style).collect()
    }

    /// Append text. Whitespace runs collapse to one space and a separating
    /// space is inserted unless the paragraph is empty or ends in a break.
    pub fn text(&mut self, text: &str) -> Result<&mut Self> {
        self.ensure_open()?;
        let text = normalize_whitespace(text);
        let text = text.trim();
        if !text.is_empty() {
            let separate = self.spaced;
            self.push_text(text, separate)?;
        }
        Ok(self)
    }

    /// Append text without a separating space, e.g. punctuation.
    ///
    /// Leading whitespace is dropped when the paragraph already ends in a
    /// space, so adjacent runs never produce a double space.
    pub fn raw(&mut self, text: &str) -> Result<&mut Self> {
        self.ensure_open()?;
        let text = normalize_whitespace(text);
        if !text.is_empty() {
            self.push_text(&text, false)?;
        }
        Ok(self)
    }

    /// Append an em dash, set off by a space from preceding text.
    pub fn emdash(&mut self) -> Result<&mut Self> {
        self.ensure_open()?;
        let separate = self.spaced;
        self.push_text(EMDASH, separate)?;
        Ok(self)
    }

    /// Append a hyperlink.
    pub fn link(&mut self, uri: &str, text: &str) -> Result<&mut Self> {
        let text = normalize_whitespace(text).trim().to_string();
        self.push_inline(
            Inline::Link {
                text,
                uri: uri.trim().to_string(),
            },
            true,
        )?;
        self.spaced = true;
        Ok(self)
    }

    /// Append an explicit line break.
    pub fn line_break(&mut self) -> Result<&mut Self> {
        self.push_inline(Inline::LineBreak, false)?;
        self.spaced = false;
        self.trailing_space = true;
        Ok(self)
    }

    /// Append a sentence terminator with no preceding space.
    pub fn period(&mut self) -> Result<&mut Self> {
        self.push_inline(Inline::Period, false)?;
        self.spaced = true;
        Ok(self)
    }

    /// Append a term indexed under its own text.
    pub fn indexed(&mut self, display: &str) -> Result<&mut Self> {
        self.indexed_as(display, display)
    }

    /// Append `display` and index it under the canonical key `canonical`.
    pub fn indexed_as(&mut self, display: &str, canonical: &str) -> Result<&mut Self> {
        self.ensure_open()?;
        let text = normalize_whitespace(display).trim().to_string();
        let key = normalize_whitespace(canonical).trim().to_string();
        let location = Location::new(self.section.clone(), self.number);
        self.state.registries.index.add(&text, &key, location);
        self.push_inline(Inline::IndexTerm { text, key }, true)?;
        self.spaced = true;
        Ok(self)
    }

    /// Append a citation anchor, resolving the key on first use.
    ///
    /// Keys the references collaborator cannot resolve either fail with
    /// [`Error::ReferenceNotFound`] or render as a placeholder, depending on
    /// the configured policy.
    pub fn citation(&mut self, key: &str) -> Result<&mut Self> {
        self.ensure_open()?;
        let key = normalize_whitespace(key).trim().to_string();
        self.state.cite(&key)?;
        self.push_inline(Inline::Citation(key), true)?;
        self.spaced = true;
        Ok(self)
    }

    /// Anchor a new footnote here and build its body in `f`.
    ///
    /// The footnote belongs to the innermost enclosing section. It is
    /// registered even if `f` fails. Returns the footnote number.
    pub fn footnote<F>(&mut self, f: F) -> Result<u32>
    where
        F: FnOnce(&mut FootnoteHandle<'_>) -> Result<()>,
    {
        self.ensure_open()?;
        let number = self.state.registries.footnotes.reserve();
        self.push_inline(Inline::Footnote(number), false)?;
        self.spaced = true;

        let mut body = Vec::new();
        let result = {
            let mut note =
                FootnoteHandle::new(&mut *self.state, &mut body, self.section.clone(), number);
            f(&mut note)
        };
        log::debug!("footnote {} registered in section {}", number, self.section);
        self.state.registries.footnotes.insert(Footnote {
            number,
            section: self.section.clone(),
            body,
        });
        result.map(|()| number)
    }

    /// Anchor a footnote whose body is a single paragraph of `text`.
    pub fn footnote_text(&mut self, text: &str) -> Result<u32> {
        self.footnote(|note| note.p(text))
    }

    /// Open a style scope.
    pub fn open_style(&mut self, style: Style) -> Result<&mut Self> {
        self.ensure_open()?;
        self.spans.push(OpenSpan {
            style,
            children: Vec::new(),
        });
        Ok(self)
    }

    /// Close the innermost style scope, which must be `style`.
    pub fn close_style(&mut self, style: Style) -> Result<&mut Self> {
        self.ensure_open()?;
        match self.spans.last() {
            None => return Err(Error::scope_mismatch(style.to_string(), "no open style")),
            Some(top) if top.style != style => {
                return Err(Error::scope_mismatch(style.to_string(), top.style.to_string()))
            }
            Some(_) => {}
        }
        self.pop_span()?;
        Ok(self)
    }

    /// Run `f` inside a style scope that is closed on every exit path.
    pub fn styled<F, T>(&mut self, style: Style, f: F) -> Result<T>
    where
        F: FnOnce(&mut Self) -> Result<T>,
    {
        self.open_style(style)?;
        let depth = self.spans.len();
        let result = f(self);

        let innermost = self.spans.last().map(|s| s.style);
        if self.spans.len() != depth || innermost != Some(style) {
            let found = innermost.map_or_else(|| "no open style".to_string(), |s| s.to_string());
            self.unwind(depth.saturating_sub(1))?;
            return result.and(Err(Error::scope_mismatch(style.to_string(), found)));
        }
        self.close_style(style)?;
        result
    }

    /// Append `text` inside a single style scope.
    pub fn styled_text(&mut self, style: Style, text: &str) -> Result<&mut Self> {
        self.styled(style, |p| p.text(text).map(|_| ()))?;
        Ok(self)
    }

    /// Finalize the paragraph. Fails with [`Error::ScopeMismatch`] while a
    /// style scope is still open.
    pub fn close(&mut self) -> Result<()> {
        self.ensure_open()?;
        if let Some(span) = self.spans.last() {
            return Err(Error::scope_mismatch("paragraph", span.style.to_string()));
        }
        self.finalize();
        Ok(())
    }

    fn ensure_open(&self) -> Result<()> {
        if self.paragraph.is_none() {
            return Err(Error::closed(self.node_name()));
        }
        Ok(())
    }

    fn node_name(&self) -> &'static str {
        match &self.paragraph {
            Some(p) if p.is_quote() => "quote",
            _ => "paragraph",
        }
    }

    fn target(&mut self) -> Result<&mut Vec<Inline>> {
        let paragraph = self
            .paragraph
            .as_mut()
            .ok_or_else(|| Error::closed("paragraph"))?;
        Ok(match self.spans.last_mut() {
            Some(span) => &mut span.children,
            None => &mut paragraph.content,
        })
    }

    fn push_text(&mut self, text: &str, separate: bool) -> Result<()> {
        let text = if self.trailing_space {
            text.trim_start()
        } else {
            text
        };
        if text.is_empty() {
            return Ok(());
        }
        let separate = separate && !self.trailing_space;
        let target = self.target()?;
        let mut run = String::with_capacity(text.len() + 1);
        if separate {
            run.push(' ');
        }
        run.push_str(text);
        match target.last_mut() {
            Some(Inline::Text(prev)) => prev.push_str(&run),
            _ => target.push(Inline::Text(run)),
        }
        self.spaced = !text.ends_with(' ');
        self.trailing_space = text.ends_with(' ');
        Ok(())
    }

    fn push_inline(&mut self, inline: Inline, separate: bool) -> Result<()> {
        let separate = separate && self.spaced && !self.trailing_space;
        self.trailing_space = false;
        let target = self.target()?;
        if separate {
            match target.last_mut() {
                Some(Inline::Text(prev)) => prev.push(' '),
                _ => target.push(Inline::Text(" ".to_string())),
            }
        }
        target.push(inline);
        Ok(())
    }

    fn pop_span(&mut self) -> Result<()> {
        if let Some(span) = self.spans.pop() {
            if !span.children.is_empty() {
                self.target()?.push(Inline::span(span.style, span.children));
            }
        }
        Ok(())
    }

    fn unwind(&mut self, depth: usize) -> Result<()> {
        while self.spans.len() > depth {
            self.pop_span()?;
        }
        Ok(())
    }

    fn finalize(&mut self) {
        if self.paragraph.is_none() {
            return;
        }
        if !self.spans.is_empty() {
            log::warn!(
                "paragraph dropped with open styles {:?}; closing them",
                self.open_styles()
            );
            // Unwinding cannot fail while the paragraph is open.
            let _ = self.unwind(0);
        }
        if let Some(paragraph) = self.paragraph.take() {
            if paragraph.content.is_empty() {
                if self.number.is_some() {
                    self.state.release_flow_paragraph();
                }
                return;
            }
            self.dest.push(Block::Paragraph(paragraph));
        }
    }
}

impl Drop for ParagraphHandle<'_> {
    fn drop(&mut self) {
        self.finalize();
    }
}

#[cfg(test)]
mod tests {
    use crate::compose::{Container, DocumentBuilder};
    use crate::error::Error;
    use crate::model::{Block, DocumentConfig, Inline, Node, Paragraph, Style, TextStyle};

    fn build<F>(f: F) -> Paragraph
    where
        F: FnOnce(&mut super::ParagraphHandle<'_>) -> crate::Result<()>,
    {
        let mut b = DocumentBuilder::new(DocumentConfig::new()).unwrap();
        b.with_paragraph(f).unwrap();
        let doc = b.finish();
        match &doc.body()[0] {
            Node::Block(Block::Paragraph(p)) => p.clone(),
            other => panic!("unexpected node {:?}", other),
        }
    }

    #[test]
    fn test_separator_rules() {
        let p = build(|p| {
            p.text("Hello")?.text("world")?.period()?;
            p.raw(",")?.text("then")?.line_break()?.text("after")?;
            Ok(())
        });
        assert_eq!(p.plain_text(), "Hello world., then\nafter");
    }

    #[test]
    fn test_raw_runs_share_one_space() {
        let p = build(|p| {
            p.raw("a ")?.raw(" b")?;
            p.text("c")?.raw(" ")?.raw("  d")?;
            Ok(())
        });
        assert_eq!(p.content, vec![Inline::Text("a b c d".into())]);

        let p = build(|p| {
            p.raw("See ")?.link("https://example.com", "here")?;
            p.raw(" ")?.line_break()?.raw(" after")?;
            Ok(())
        });
        assert_eq!(p.plain_text(), "See here \nafter");
    }

    #[test]
    fn test_emdash_spacing() {
        let p = build(|p| {
            p.text("Wait")?.emdash()?.text("there")?;
            p.raw(" ")?.emdash()?.emdash()?;
            Ok(())
        });
        assert_eq!(p.plain_text(), "Wait \u{2014} there \u{2014} \u{2014}");
    }

    #[test]
    fn test_anchor_separators() {
        let p = build(|p| {
            p.text("See")?.link("https://example.com", "here")?;
            p.footnote_text("A note.")?;
            p.text("and")?.indexed_as("Mr Sage", "Sage, Mr")?;
            Ok(())
        });
        assert_eq!(p.plain_text(), "See here and Mr Sage");
        assert_eq!(p.footnote_anchors(), vec![1]);
    }

    #[test]
    fn test_empty_scope_is_noop() {
        let with_scope = build(|p| {
            p.text("Plain")?;
            p.open_style(Style::Bold)?.close_style(Style::Bold)?;
            p.text("text")?;
            Ok(())
        });
        let without = build(|p| {
            p.text("Plain")?.text("text")?;
            Ok(())
        });
        assert_eq!(with_scope, without);
    }

    #[test]
    fn test_close_style_mismatch() {
        let mut b = DocumentBuilder::new(DocumentConfig::new()).unwrap();
        let mut p = b.paragraph().unwrap();
        p.open_style(Style::Italic).unwrap();
        p.open_style(Style::Bold).unwrap();
        let err = p.close_style(Style::Italic).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Scope mismatch: expected to close italic, found bold"
        );
        assert!(matches!(p.close(), Err(Error::ScopeMismatch { .. })));

        p.close_style(Style::Bold).unwrap();
        p.close_style(Style::Italic).unwrap();
        assert!(matches!(
            p.close_style(Style::Italic),
            Err(Error::ScopeMismatch { .. })
        ));
        p.close().unwrap();
        assert!(matches!(
            p.text("late"),
            Err(Error::ClosedNodeMutation { node: "paragraph" })
        ));
    }

    #[test]
    fn test_styled_closes_on_error() {
        let mut b = DocumentBuilder::new(DocumentConfig::new()).unwrap();
        let mut p = b.paragraph().unwrap();
        let result: crate::Result<()> = p.styled(Style::Bold, |p| {
            p.text("partial")?;
            Err(Error::ReferenceNotFound("x".into()))
        });
        assert!(result.is_err());
        assert!(p.open_styles().is_empty());
        p.close().unwrap();
    }

    #[test]
    fn test_style_union_on_nested_runs() {
        let p = build(|p| {
            p.styled(Style::Italic, |p| {
                p.text("outer")?;
                p.styled_text(Style::Bold, "inner")?;
                Ok(())
            })
        });
        let Inline::Styled { style, children } = &p.content[0] else {
            panic!("expected span");
        };
        assert_eq!(*style, TextStyle::from(Style::Italic));
        assert_eq!(children[0], Inline::Text("outer".into()));
        assert_eq!(
            children[1],
            Inline::span(Style::Bold, vec![Inline::Text(" inner".into())])
        );
    }

    #[test]
    fn test_dropped_paragraph_unwinds_styles() {
        let mut b = DocumentBuilder::new(DocumentConfig::new()).unwrap();
        {
            let mut p = b.paragraph().unwrap();
            p.open_style(Style::Underline).unwrap();
            p.text("unterminated").unwrap();
        }
        let doc = b.finish();
        let Node::Block(Block::Paragraph(p)) = &doc.body()[0] else {
            panic!("expected paragraph");
        };
        assert!(matches!(&p.content[0], Inline::Styled { style, .. } if style.underline));
    }

    #[test]
    fn test_flow_numbers_skip_empty_paragraphs() {
        let mut b = DocumentBuilder::new(DocumentConfig::new()).unwrap();
        {
            let p = b.paragraph().unwrap();
            assert_eq!(p.number(), Some(1));
        }
        let p = b.paragraph().unwrap();
        assert_eq!(p.number(), Some(1));
    }
}
