//! Fixed-page (pdf-like) rendering.
//!
//! Produces physical pages of flowables written in a small paragraph
//! markup dialect (`<b>`, `<i>`, `<u>`, `<link>`, `<super>`, `<index>`),
//! ready for a page layout engine. Footnotes land at the bottom of the page
//! that is current when their anchor is rendered.

use super::escape_xml;
use super::inline::{Segment, SegmentKind};
use super::options::RenderOptions;
use super::result::RenderStats;
use super::walk::{
    location_label, walk, FootnotePlacement, Heading, RenderSink, RenderedParagraph, TocLine,
};
use crate::error::Result;
use crate::model::{Document, Metadata, Style, TextStyle, MAX_LEVEL};
use crate::registry::{BibliographyEntry, IndexEntry};
use serde::{Deserialize, Serialize};

/// Rendered fixed-page document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageArtifact {
    /// Document metadata
    pub metadata: Metadata,

    /// Pages in order
    pub pages: Vec<PdfPage>,

    /// Traversal statistics
    pub stats: RenderStats,
}

impl PageArtifact {
    /// Every flowable in reading order, page notes after their page body.
    pub fn flowables(&self) -> impl Iterator<Item = &Flowable> {
        self.pages
            .iter()
            .flat_map(|page| page.flowables.iter().chain(page.footnotes.iter()))
    }
}

/// One physical page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PdfPage {
    /// Printed page number
    pub number: u32,

    /// Body flowables
    pub flowables: Vec<Flowable>,

    /// Notes printed at the bottom of the page, by footnote number
    pub footnotes: Vec<Flowable>,
}

impl PdfPage {
    fn new(number: u32) -> Self {
        Self {
            number,
            flowables: Vec::new(),
            footnotes: Vec::new(),
        }
    }

    /// Check if nothing was placed on the page.
    pub fn is_empty(&self) -> bool {
        self.flowables.is_empty() && self.footnotes.is_empty()
    }
}

/// A paragraph-level flowable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flowable {
    /// Paragraph style name
    pub style: String,

    /// Content in paragraph markup
    pub markup: String,

    /// Bullet or number drawn in the left margin
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bullet: Option<String>,

    /// Left indentation in points
    #[serde(default)]
    pub indent: u32,

    /// Footnote this flowable belongs to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub footnote: Option<u32>,
}

impl Flowable {
    fn new(style: impl Into<String>, markup: impl Into<String>) -> Self {
        Self {
            style: style.into(),
            markup: markup.into(),
            bullet: None,
            indent: 0,
            footnote: None,
        }
    }
}

/// Render a document to a fixed-page artifact.
pub fn render(doc: &Document, options: &RenderOptions) -> Result<PageArtifact> {
    let mut sink = PageSink::new(doc, options);
    let stats = walk(doc, &mut sink)?;
    Ok(sink.finish(stats))
}

/// Sink building a [`PageArtifact`].
pub struct PageSink<'a> {
    doc: &'a Document,
    options: &'a RenderOptions,
    pages: Vec<PdfPage>,
    lists: Vec<bool>,
    bullet: Option<String>,
    note: Option<(u32, bool)>,
}

impl<'a> PageSink<'a> {
    /// Create a sink for `doc`.
    pub fn new(doc: &'a Document, options: &'a RenderOptions) -> Self {
        Self {
            doc,
            options,
            pages: vec![PdfPage::new(1)],
            lists: Vec::new(),
            bullet: None,
            note: None,
        }
    }

    /// Finish the artifact.
    pub fn finish(mut self, mut stats: RenderStats) -> PageArtifact {
        if self.pages.len() > 1 && self.pages.last().is_some_and(PdfPage::is_empty) {
            self.pages.pop();
        }
        stats.page_count = self.pages.len() as u32;
        PageArtifact {
            metadata: self.doc.metadata().clone(),
            pages: self.pages,
            stats,
        }
    }

    fn page(&mut self) -> &mut PdfPage {
        if self.pages.is_empty() {
            self.pages.push(PdfPage::new(1));
        }
        let last = self.pages.len() - 1;
        &mut self.pages[last]
    }

    fn push(&mut self, flowable: Flowable) {
        let in_note = flowable.footnote.is_some();
        let page = self.page();
        if in_note {
            page.footnotes.push(flowable);
        } else {
            page.flowables.push(flowable);
        }
    }
}

/// Write segments as paragraph markup.
fn segment_markup(segments: &[Segment]) -> String {
    let mut out = String::new();
    for segment in segments {
        let tags = open_tags(segment.style);
        for tag in &tags {
            out.push_str(tag.0);
        }
        match &segment.kind {
            SegmentKind::Text(text) => out.push_str(&escape_xml(text)),
            SegmentKind::Link { text, uri } => out.push_str(&format!(
                "<link href=\"{}\" underline=\"true\" color=\"blue\">{}</link>",
                escape_xml(uri),
                escape_xml(text)
            )),
            SegmentKind::FootnoteRef(n) => out.push_str(&format!("<b><super>{}</super></b>", n)),
            SegmentKind::IndexTerm { text, key } => out.push_str(&format!(
                "<u>{}</u><index item=\"{}\"/>",
                escape_xml(text),
                escape_xml(key)
            )),
            SegmentKind::Citation { label, .. } => out.push_str(&escape_xml(label)),
            SegmentKind::LineBreak => out.push_str("<br/>"),
        }
        for tag in tags.iter().rev() {
            out.push_str(tag.1);
        }
    }
    out
}

fn open_tags(style: TextStyle) -> Vec<(&'static str, &'static str)> {
    let mut tags = Vec::new();
    if style.comment {
        tags.push(("<span class=\"annotation\">", "</span>"));
    }
    if style.bold {
        tags.push(("<b>", "</b>"));
    }
    if style.italic {
        tags.push(("<i>", "</i>"));
    }
    if style.underline {
        tags.push(("<u>", "</u>"));
    }
    tags
}

impl RenderSink for PageSink<'_> {
    fn backend(&self) -> &'static str {
        "pdf"
    }

    fn directive_key(&self) -> &'static str {
        "pdf"
    }

    fn placement(&self) -> FootnotePlacement {
        FootnotePlacement::PageBottom
    }

    fn supported_styles(&self) -> TextStyle {
        if self.options.page_annotations {
            TextStyle::all()
        } else {
            TextStyle::all().without(Style::Comment)
        }
    }

    fn title_block(&mut self, metadata: &Metadata) -> Result<()> {
        if let Some(title) = &metadata.title {
            self.push(Flowable::new("Title", escape_xml(title)));
        }
        if let Some(subtitle) = &metadata.subtitle {
            self.push(Flowable::new("Subtitle", escape_xml(subtitle)));
        }
        if let Some(authors) = metadata.author_line() {
            self.push(Flowable::new("Heading2", escape_xml(&authors)));
        }
        if let Some(version) = &metadata.version {
            self.push(Flowable::new("Normal", escape_xml(version)));
        }
        Ok(())
    }

    fn toc(&mut self, title: &str, lines: &[TocLine]) -> Result<()> {
        self.push(Flowable::new("Heading1", escape_xml(title)));
        for line in lines {
            let mut flowable = Flowable::new("Normal", escape_xml(&line.text()));
            flowable.indent = line.depth.saturating_sub(1) as u32 * self.options.list_indent;
            self.push(flowable);
        }
        Ok(())
    }

    /// Breaks are not taken at the top of a page; a restart renumbers the
    /// page that follows.
    fn page_break(&mut self, restart: Option<u32>) -> Result<()> {
        let page = self.page();
        if page.is_empty() {
            if let Some(number) = restart {
                page.number = number;
            }
            return Ok(());
        }
        let number = restart.unwrap_or(page.number + 1);
        self.pages.push(PdfPage::new(number));
        Ok(())
    }

    fn begin_section(&mut self, heading: &Heading<'_>) -> Result<()> {
        let style = format!("Heading{}", heading.depth.min(MAX_LEVEL as usize));
        self.push(Flowable::new(style, escape_xml(&heading.text())));
        if let Some(subtitle) = heading.subtitle {
            let level = (heading.depth + 1).min(MAX_LEVEL as usize);
            self.push(Flowable::new(format!("Heading{}", level), escape_xml(subtitle)));
        }
        Ok(())
    }

    fn thematic_break(&mut self) -> Result<()> {
        self.push(Flowable::new("HorizontalRule", String::new()));
        Ok(())
    }

    fn paragraph(&mut self, paragraph: &RenderedParagraph) -> Result<()> {
        let mut markup = String::new();
        let mut footnote = None;
        let style = match self.note.as_mut() {
            Some((number, first)) => {
                footnote = Some(*number);
                if *first {
                    *first = false;
                    markup.push_str(&format!("<b>{}.</b> ", number));
                    "Footnote"
                } else {
                    "Footnote subsequent"
                }
            }
            None => match self.lists.last() {
                Some(true) => "OrderedList",
                Some(false) => "UnorderedList",
                None if paragraph.is_quote() => "Quote",
                None => "Normal",
            },
        };
        if let Some(n) = paragraph.display_number() {
            markup.push_str(&format!("<b>{}.</b> ", n));
        }
        markup.push_str(&segment_markup(&paragraph.segments));

        let mut flowable = Flowable::new(style, markup);
        flowable.bullet = self.bullet.take();
        flowable.indent = self.lists.len() as u32 * self.options.list_indent;
        flowable.footnote = footnote;
        self.push(flowable);
        Ok(())
    }

    fn begin_list(&mut self, ordered: bool, _depth: usize) -> Result<()> {
        self.lists.push(ordered);
        Ok(())
    }

    fn end_list(&mut self, _ordered: bool, _depth: usize) -> Result<()> {
        self.lists.pop();
        Ok(())
    }

    fn begin_item(&mut self, marker: &str, _depth: usize) -> Result<()> {
        self.bullet = Some(marker.to_string());
        Ok(())
    }

    fn end_item(&mut self, _depth: usize) -> Result<()> {
        self.bullet = None;
        Ok(())
    }

    fn begin_footnote(&mut self, number: u32) -> Result<()> {
        self.note = Some((number, true));
        Ok(())
    }

    fn end_footnote(&mut self, _number: u32) -> Result<()> {
        self.note = None;
        Ok(())
    }

    fn bibliography(&mut self, title: &str, entries: &[BibliographyEntry]) -> Result<()> {
        self.push(Flowable::new("Heading1", escape_xml(title)));
        for entry in entries {
            self.push(Flowable::new(
                "Reference",
                format!("[{}] {}", entry.number, escape_xml(&entry.text)),
            ));
        }
        Ok(())
    }

    fn index(&mut self, title: &str, entries: &[&IndexEntry]) -> Result<()> {
        self.push(Flowable::new("Heading1", escape_xml(title)));
        let config = self.doc.config();
        for entry in entries {
            let locations: Vec<String> = entry
                .locations
                .iter()
                .map(|loc| location_label(loc, config))
                .collect();
            let mut markup = format!("<b>{}</b>", escape_xml(&entry.key));
            let variants = entry.variants();
            if !variants.is_empty() {
                markup.push_str(&format!(" <i>({})</i>", escape_xml(&variants.join("; "))));
            }
            markup.push_str(&format!(" {}", escape_xml(&locations.join(", "))));
            self.push(Flowable::new("Index", markup));
        }
        Ok(())
    }
}
