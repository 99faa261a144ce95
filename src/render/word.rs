//! Word-processor (docx-like) rendering.
//!
//! The artifact is a flat sequence of styled paragraphs and page breaks, the
//! shape a docx writer consumes. Footnotes are flushed at the end of the
//! section that owns them.

use super::inline::{Segment, SegmentKind};
use super::options::RenderOptions;
use super::result::RenderStats;
use super::walk::{
    location_label, walk, FootnotePlacement, Heading, RenderSink, RenderedParagraph, TocLine,
};
use crate::error::Result;
use crate::model::{Document, Metadata, TextStyle};
use crate::registry::{BibliographyEntry, IndexEntry};
use serde::{Deserialize, Serialize};

/// Highest heading style level a word processor offers.
const MAX_HEADING_STYLE: usize = 9;

/// Rendered word-processor document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WordArtifact {
    /// Document metadata (core properties)
    pub metadata: Metadata,

    /// Body content in order
    pub blocks: Vec<WordBlock>,

    /// Traversal statistics
    pub stats: RenderStats,
}

impl WordArtifact {
    /// Paragraphs in order, skipping page breaks.
    pub fn paragraphs(&self) -> impl Iterator<Item = &WordParagraph> {
        self.blocks.iter().filter_map(|block| match block {
            WordBlock::Paragraph(p) => Some(p),
            WordBlock::PageBreak { .. } => None,
        })
    }

    /// Number of page breaks.
    pub fn page_breaks(&self) -> usize {
        self.blocks
            .iter()
            .filter(|b| matches!(b, WordBlock::PageBreak { .. }))
            .count()
    }
}

/// A body element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WordBlock {
    /// A styled paragraph
    Paragraph(WordParagraph),
    /// A hard page break, optionally restarting page numbering
    PageBreak {
        /// New page number
        #[serde(skip_serializing_if = "Option::is_none")]
        restart_at: Option<u32>,
    },
}

/// A paragraph with a named paragraph style.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordParagraph {
    /// Paragraph style name, e.g. `Heading 2` or `List Bullet`
    pub style: String,

    /// List marker of the first paragraph of a list item
    #[serde(skip_serializing_if = "Option::is_none")]
    pub marker: Option<String>,

    /// Indentation level (0 = none)
    #[serde(default, skip_serializing_if = "is_zero")]
    pub indent_level: usize,

    /// Left indentation in points
    #[serde(default, skip_serializing_if = "is_zero")]
    pub indent: u32,

    /// Character runs
    pub runs: Vec<WordRun>,
}

impl WordParagraph {
    fn new(style: impl Into<String>) -> Self {
        Self {
            style: style.into(),
            marker: None,
            indent_level: 0,
            indent: 0,
            runs: Vec::new(),
        }
    }

    fn with_run(mut self, run: WordRun) -> Self {
        self.runs.push(run);
        self
    }

    fn indented(mut self, level: usize, step: u32) -> Self {
        self.indent_level = level;
        self.indent = level as u32 * step;
        self
    }

    /// Concatenated run text.
    pub fn text(&self) -> String {
        self.runs.iter().map(|r| r.text.as_str()).collect()
    }
}

/// A character run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordRun {
    /// Run text
    pub text: String,

    /// Bold
    #[serde(default, skip_serializing_if = "is_false")]
    pub bold: bool,

    /// Italic
    #[serde(default, skip_serializing_if = "is_false")]
    pub italic: bool,

    /// Underlined
    #[serde(default, skip_serializing_if = "is_false")]
    pub underline: bool,

    /// Raised, used for footnote references
    #[serde(default, skip_serializing_if = "is_false")]
    pub superscript: bool,

    /// Highlighted as a reviewer comment
    #[serde(default, skip_serializing_if = "is_false")]
    pub comment: bool,

    /// Hyperlink target; the run takes the `Hyperlink` character style
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hyperlink: Option<String>,

    /// Index entry field attached to the run
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index_key: Option<String>,
}

impl WordRun {
    /// Plain run.
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    /// Run with the given style flags.
    pub fn styled(text: impl Into<String>, style: TextStyle) -> Self {
        Self {
            text: text.into(),
            bold: style.bold,
            italic: style.italic,
            underline: style.underline,
            comment: style.comment,
            ..Default::default()
        }
    }

    fn bold(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            bold: true,
            ..Default::default()
        }
    }
}

fn is_false(value: &bool) -> bool {
    !*value
}

fn is_zero<T: Default + PartialEq>(value: &T) -> bool {
    *value == T::default()
}

/// Render a document to a word-processor artifact.
pub fn render(doc: &Document, options: &RenderOptions) -> Result<WordArtifact> {
    let mut sink = WordSink::new(doc, options);
    let stats = walk(doc, &mut sink)?;
    Ok(sink.finish(stats))
}

struct NoteState {
    number: u32,
    first: bool,
}

/// Sink building a [`WordArtifact`].
pub struct WordSink<'a> {
    doc: &'a Document,
    options: &'a RenderOptions,
    blocks: Vec<WordBlock>,
    lists: Vec<bool>,
    marker: Option<String>,
    note: Option<NoteState>,
}

impl<'a> WordSink<'a> {
    /// Create a sink for `doc`.
    pub fn new(doc: &'a Document, options: &'a RenderOptions) -> Self {
        Self {
            doc,
            options,
            blocks: Vec::new(),
            lists: Vec::new(),
            marker: None,
            note: None,
        }
    }

    /// Finish the artifact.
    pub fn finish(self, mut stats: RenderStats) -> WordArtifact {
        let breaks = self
            .blocks
            .iter()
            .filter(|b| matches!(b, WordBlock::PageBreak { .. }))
            .count() as u32;
        stats.page_count = breaks + 1;
        WordArtifact {
            metadata: self.doc.metadata().clone(),
            blocks: self.blocks,
            stats,
        }
    }

    fn push(&mut self, paragraph: WordParagraph) {
        self.blocks.push(WordBlock::Paragraph(paragraph));
    }

    /// List styles win over the footnote style so lists keep their
    /// numbering inside notes.
    fn paragraph_style(&self, paragraph: &RenderedParagraph) -> String {
        if let Some(&ordered) = self.lists.last() {
            let base = if ordered { "List Number" } else { "List Bullet" };
            return match self.lists.len() {
                1 => base.to_string(),
                depth => format!("{} {}", base, depth.min(5)),
            };
        }
        if self.note.is_some() {
            return "Footnote Text".to_string();
        }
        if paragraph.is_quote() {
            "Quote".to_string()
        } else {
            "Normal".to_string()
        }
    }
}

/// Translate flattened segments into runs.
fn segment_runs(segments: &[Segment]) -> Vec<WordRun> {
    segments
        .iter()
        .map(|segment| {
            let mut run = WordRun::styled(segment.display_text(), segment.style);
            match &segment.kind {
                SegmentKind::Link { uri, .. } => run.hyperlink = Some(uri.clone()),
                SegmentKind::FootnoteRef(_) => {
                    run.bold = true;
                    run.superscript = true;
                }
                SegmentKind::IndexTerm { key, .. } => {
                    run.underline = true;
                    run.index_key = Some(key.clone());
                }
                _ => {}
            }
            run
        })
        .collect()
}

impl RenderSink for WordSink<'_> {
    fn backend(&self) -> &'static str {
        "docx"
    }

    fn directive_key(&self) -> &'static str {
        "docx"
    }

    fn placement(&self) -> FootnotePlacement {
        FootnotePlacement::SectionEnd
    }

    fn title_block(&mut self, metadata: &Metadata) -> Result<()> {
        if let Some(title) = &metadata.title {
            self.push(WordParagraph::new("Title").with_run(WordRun::plain(title)));
        }
        if let Some(subtitle) = &metadata.subtitle {
            self.push(WordParagraph::new("Subtitle").with_run(WordRun::plain(subtitle)));
        }
        if let Some(authors) = metadata.author_line() {
            self.push(WordParagraph::new("Heading 1").with_run(WordRun::plain(authors)));
        }
        if let Some(version) = &metadata.version {
            self.push(WordParagraph::new("Normal").with_run(WordRun::plain(version)));
        }
        Ok(())
    }

    fn toc(&mut self, title: &str, lines: &[TocLine]) -> Result<()> {
        self.push(WordParagraph::new("Heading 1").with_run(WordRun::plain(title)));
        for line in lines {
            self.push(
                WordParagraph::new("Body Text")
                    .with_run(WordRun::plain(line.text()))
                    .indented(line.depth.saturating_sub(1), self.options.list_indent),
            );
        }
        Ok(())
    }

    fn page_break(&mut self, restart: Option<u32>) -> Result<()> {
        // A leading or repeated break would only produce an empty page.
        let at_page_start = matches!(self.blocks.last(), None | Some(WordBlock::PageBreak { .. }));
        if at_page_start && restart.is_none() {
            return Ok(());
        }
        self.blocks.push(WordBlock::PageBreak {
            restart_at: restart,
        });
        Ok(())
    }

    fn begin_section(&mut self, heading: &Heading<'_>) -> Result<()> {
        let style = format!("Heading {}", heading.depth.min(MAX_HEADING_STYLE));
        self.push(WordParagraph::new(style).with_run(WordRun::plain(heading.text())));
        if let Some(subtitle) = heading.subtitle {
            self.push(WordParagraph::new("Subtitle").with_run(WordRun::plain(subtitle)));
        }
        Ok(())
    }

    fn thematic_break(&mut self) -> Result<()> {
        self.push(WordParagraph::new("Thematic Break").with_run(WordRun::plain("* * *")));
        Ok(())
    }

    fn paragraph(&mut self, paragraph: &RenderedParagraph) -> Result<()> {
        let mut out = WordParagraph::new(self.paragraph_style(paragraph))
            .indented(self.lists.len(), self.options.list_indent);
        out.marker = self.marker.take();

        if let Some(n) = paragraph.display_number() {
            out.runs.push(WordRun::bold(format!("{}. ", n)));
        }
        if let Some(note) = self.note.as_mut() {
            if note.first {
                out.runs.push(WordRun::bold(format!("{}. ", note.number)));
                note.first = false;
            }
        }
        out.runs.extend(segment_runs(&paragraph.segments));
        self.push(out);
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
        self.marker = Some(marker.to_string());
        Ok(())
    }

    fn end_item(&mut self, _depth: usize) -> Result<()> {
        self.marker = None;
        Ok(())
    }

    fn begin_footnotes(&mut self, title: &str) -> Result<()> {
        let mut run = WordRun::bold(title);
        run.italic = true;
        self.push(WordParagraph::new("Normal").with_run(run));
        Ok(())
    }

    fn begin_footnote(&mut self, number: u32) -> Result<()> {
        self.note = Some(NoteState {
            number,
            first: true,
        });
        Ok(())
    }

    fn end_footnote(&mut self, _number: u32) -> Result<()> {
        self.note = None;
        Ok(())
    }

    fn bibliography(&mut self, title: &str, entries: &[BibliographyEntry]) -> Result<()> {
        self.push(WordParagraph::new("Heading 1").with_run(WordRun::plain(title)));
        for entry in entries {
            self.push(
                WordParagraph::new("Body Text")
                    .with_run(WordRun::bold(format!("[{}] ", entry.number)))
                    .with_run(WordRun::plain(&entry.text)),
            );
        }
        Ok(())
    }

    fn index(&mut self, title: &str, entries: &[&IndexEntry]) -> Result<()> {
        self.push(WordParagraph::new("Heading 1").with_run(WordRun::plain(title)));
        let config = self.doc.config();
        for entry in entries {
            let locations: Vec<String> = entry
                .locations
                .iter()
                .map(|loc| location_label(loc, config))
                .collect();
            let mut paragraph = WordParagraph::new("Body Text").with_run(WordRun::bold(&entry.key));
            let variants = entry.variants();
            if !variants.is_empty() {
                let mut run = WordRun::plain(format!(" ({})", variants.join("; ")));
                run.italic = true;
                paragraph.runs.push(run);
            }
            paragraph
                .runs
                .push(WordRun::plain(format!(": {}", locations.join(", "))));
            self.push(paragraph);
        }
        Ok(())
    }
}
