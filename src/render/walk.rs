//! The shared document traversal.
//!
//! Every backend renders through [`walk`], which performs one read-only
//! pre-order pass over a [`Document`] and drives a backend-specific
//! [`RenderSink`]. The walker owns the semantics common to all backends:
//! front and back matter order, page break decisions, positional numbering,
//! style flattening and footnote placement. Sinks only translate the
//! resulting events into their own primitives.

use super::inline::{segments_text, Flattener, Segment, SegmentKind};
use super::result::RenderStats;
use crate::error::Result;
use crate::model::{
    list_marker, Block, Document, DocumentConfig, List, Metadata, Node, Paragraph,
    ParagraphKind, Section, SectionPath, TextStyle,
};
use crate::registry::{BibliographyEntry, IndexEntry, Location};
use std::collections::VecDeque;

/// Where a backend places footnote bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FootnotePlacement {
    /// Flushed when the owning section closes; root notes at document end
    SectionEnd,
    /// Attached to the page current when the anchor is rendered
    PageBottom,
    /// Emitted right after the block holding the anchor
    Inline,
}

/// A section heading as seen by a sink.
#[derive(Debug, Clone)]
pub struct Heading<'a> {
    /// Position of the section
    pub path: &'a SectionPath,
    /// Section title
    pub title: &'a str,
    /// Line under the heading
    pub subtitle: Option<&'a str>,
    /// Depth (1 = top-level)
    pub depth: usize,
    /// Heading number such as `1.2.`, when section numbering is on
    pub number: Option<String>,
}

impl Heading<'_> {
    /// Heading text with its number prefix.
    pub fn text(&self) -> String {
        numbered_title(self.number.as_deref(), self.title)
    }
}

/// One line of the table of contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TocLine {
    /// Position of the section
    pub path: SectionPath,
    /// Section title
    pub title: String,
    /// Depth (1 = top-level)
    pub depth: usize,
    /// Heading number when section numbering is on
    pub number: Option<String>,
}

impl TocLine {
    /// Line text with its number prefix.
    pub fn text(&self) -> String {
        numbered_title(self.number.as_deref(), &self.title)
    }
}

fn numbered_title(number: Option<&str>, title: &str) -> String {
    match number {
        Some(number) => format!("{} {}", number, title),
        None => title.to_string(),
    }
}

/// A paragraph or quote ready for a sink.
#[derive(Debug, Clone)]
pub struct RenderedParagraph {
    /// Block style
    pub kind: ParagraphKind,
    /// Flow ordinal; `None` inside lists and footnote bodies
    pub number: Option<u32>,
    /// Whether the number should be printed
    pub numbered: bool,
    /// Flattened inline content
    pub segments: Vec<Segment>,
    /// Node path, e.g. `/1.2/block[3]`
    pub path: String,
}

impl RenderedParagraph {
    /// Check if this is a block quote.
    pub fn is_quote(&self) -> bool {
        self.kind == ParagraphKind::Quote
    }

    /// Number to print, if any.
    pub fn display_number(&self) -> Option<u32> {
        self.number.filter(|_| self.numbered)
    }

    /// Plain text of the content.
    pub fn plain_text(&self) -> String {
        segments_text(&self.segments)
    }
}

/// Receiver of traversal events.
///
/// Structural events without a default must be handled by every backend;
/// the rest default to doing nothing.
pub trait RenderSink {
    /// Backend name used in error reports.
    fn backend(&self) -> &'static str;

    /// Key of the page directives this backend honours.
    fn directive_key(&self) -> &'static str;

    /// Footnote placement strategy.
    fn placement(&self) -> FootnotePlacement;

    /// Inline styles the backend can express.
    fn supported_styles(&self) -> TextStyle {
        TextStyle::all()
    }

    /// Called once before anything else.
    fn title_block(&mut self, metadata: &Metadata) -> Result<()>;

    /// Called after the title block when the TOC is enabled and non-empty.
    ///
    /// # Arguments
    /// * `title` - Configured TOC title
    /// * `lines` - Entries in pre-order
    fn toc(&mut self, title: &str, lines: &[TocLine]) -> Result<()>;

    /// Start a new page.
    ///
    /// # Arguments
    /// * `restart` - Physical page number requested by a directive
    fn page_break(&mut self, restart: Option<u32>) -> Result<()>;

    /// Called for a page break placed in the body by the author. Backends
    /// that paginate treat it like any other break.
    fn forced_page_break(&mut self) -> Result<()> {
        self.page_break(None)
    }

    /// Called for a horizontal rule between passages.
    fn thematic_break(&mut self) -> Result<()>;

    /// Called on section entry, after any page break.
    fn begin_section(&mut self, heading: &Heading<'_>) -> Result<()>;

    /// Called on section exit, after section-end footnotes.
    fn end_section(&mut self, heading: &Heading<'_>) -> Result<()> {
        let _ = heading;
        Ok(())
    }

    /// Called for every paragraph and quote.
    fn paragraph(&mut self, paragraph: &RenderedParagraph) -> Result<()>;

    /// Called before the first item of a list.
    fn begin_list(&mut self, ordered: bool, depth: usize) -> Result<()> {
        let _ = (ordered, depth);
        Ok(())
    }

    /// Called after the last item of a list.
    fn end_list(&mut self, ordered: bool, depth: usize) -> Result<()> {
        let _ = (ordered, depth);
        Ok(())
    }

    /// Called before the blocks of a list item.
    ///
    /// # Arguments
    /// * `marker` - Number or bullet derived from ordering and depth
    /// * `depth` - List nesting depth (1 = outermost)
    fn begin_item(&mut self, marker: &str, depth: usize) -> Result<()>;

    /// Called after the blocks and nested list of an item.
    fn end_item(&mut self, depth: usize) -> Result<()> {
        let _ = depth;
        Ok(())
    }

    /// Opens a group of section-end footnotes.
    fn begin_footnotes(&mut self, title: &str) -> Result<()> {
        let _ = title;
        Ok(())
    }

    /// Closes a group of section-end footnotes.
    fn end_footnotes(&mut self) -> Result<()> {
        Ok(())
    }

    /// Called before the body blocks of a footnote.
    fn begin_footnote(&mut self, number: u32) -> Result<()>;

    /// Called after the body blocks of a footnote.
    fn end_footnote(&mut self, number: u32) -> Result<()> {
        let _ = number;
        Ok(())
    }

    /// Bibliography back matter.
    fn bibliography(&mut self, title: &str, entries: &[BibliographyEntry]) -> Result<()>;

    /// Index back matter, entries already sorted.
    fn index(&mut self, title: &str, entries: &[&IndexEntry]) -> Result<()>;
}

/// Label of an index location: the flow paragraph number when paragraphs
/// are numbered, otherwise the section number.
pub fn location_label(location: &Location, config: &DocumentConfig) -> String {
    match location.paragraph {
        Some(n) if config.paragraph_numbers => n.to_string(),
        _ if location.section.is_root() => "\u{a7}0".to_string(),
        _ => format!("\u{a7}{}", location.section.join(".")),
    }
}

/// Walk `doc` and drive `sink`, returning traversal statistics.
///
/// Fails on the first sink error or unsupported style; nothing is retried.
pub fn walk<S: RenderSink + ?Sized>(doc: &Document, sink: &mut S) -> Result<RenderStats> {
    let supported = sink.supported_styles();
    let backend = sink.backend();
    log::debug!(
        "rendering {} sections with the {} backend",
        doc.section_count(),
        backend
    );

    let mut walker = Walker {
        doc,
        config: doc.config(),
        flattener: Flattener::new(doc.references(), supported, backend),
        placement: sink.placement(),
        directive_key: sink.directive_key(),
        sink,
        flow: 0,
        anchors: Vec::new(),
        stats: RenderStats::new(),
    };
    walker.run()?;
    Ok(walker.stats)
}

struct Walker<'d, 's, S: ?Sized> {
    doc: &'d Document,
    config: &'d DocumentConfig,
    flattener: Flattener<'d>,
    placement: FootnotePlacement,
    directive_key: &'static str,
    sink: &'s mut S,
    flow: u32,
    anchors: Vec<u32>,
    stats: RenderStats,
}

impl<S: RenderSink + ?Sized> Walker<'_, '_, S> {
    fn run(&mut self) -> Result<()> {
        self.front_matter()?;

        let root = SectionPath::root();
        self.nodes(self.doc.body(), &root)?;
        if self.placement == FootnotePlacement::SectionEnd {
            self.flush_section_notes(&root)?;
        }

        self.back_matter()
    }

    fn front_matter(&mut self) -> Result<()> {
        self.sink.title_block(self.doc.metadata())?;

        let level = self.config.toc_level as usize;
        if level == 0 || self.doc.toc().is_empty() {
            return Ok(());
        }
        let lines: Vec<TocLine> = self
            .doc
            .toc()
            .emit(level)
            .into_iter()
            .map(|entry| TocLine {
                path: entry.path.clone(),
                title: entry.title.clone(),
                depth: entry.depth,
                number: self
                    .config
                    .section_numbers
                    .then(|| entry.path.number()),
            })
            .collect();
        self.sink.toc(&self.config.toc_title, &lines)
    }

    fn back_matter(&mut self) -> Result<()> {
        let bibliography = self.doc.references().emit_bibliography();
        if self.config.bibliography && !bibliography.is_empty() {
            log::debug!("bibliography with {} entries", bibliography.len());
            self.sink.page_break(None)?;
            self.sink
                .bibliography(&self.config.bibliography_title, &bibliography)?;
        }

        let index = self.doc.index().emit_index();
        if self.config.index && !index.is_empty() {
            log::debug!("index with {} terms", index.len());
            self.sink.page_break(None)?;
            self.sink.index(&self.config.index_title, &index)?;
        }
        Ok(())
    }

    fn nodes(&mut self, nodes: &[Node], section: &SectionPath) -> Result<()> {
        let base = node_base(section);
        let mut ordinal = 0;
        for (i, node) in nodes.iter().enumerate() {
            match node {
                Node::Section(child) => {
                    ordinal += 1;
                    let path = section.child(ordinal);
                    self.section(child, &path)?;
                }
                Node::Block(block) => {
                    self.block(block, &format!("{}/block[{}]", base, i), true, 0)?;
                    if self.placement != FootnotePlacement::SectionEnd {
                        self.flush_anchored_notes()?;
                    }
                }
            }
        }
        Ok(())
    }

    fn section(&mut self, section: &Section, path: &SectionPath) -> Result<()> {
        let heading = Heading {
            path,
            title: &section.title,
            subtitle: section.subtitle.as_deref(),
            depth: section.depth,
            number: self.config.section_numbers.then(|| path.number()),
        };

        let directive = section.page_directive(self.directive_key);
        if section.depth <= self.config.page_break_level as usize || directive.is_some() {
            self.sink.page_break(directive)?;
        }
        self.sink.begin_section(&heading)?;
        self.stats.add_section();
        self.stats.count_text(&section.title);

        self.nodes(&section.children, path)?;

        if self.placement == FootnotePlacement::SectionEnd {
            self.flush_section_notes(path)?;
        }
        self.sink.end_section(&heading)
    }

    fn block(&mut self, block: &Block, path: &str, flow: bool, list_depth: usize) -> Result<()> {
        match block {
            Block::Paragraph(paragraph) => self.paragraph(paragraph, path, flow),
            Block::List(list) => self.list(list, list_depth + 1, path),
            Block::PageBreak => self.sink.forced_page_break(),
            Block::ThematicBreak => self.sink.thematic_break(),
        }
    }

    fn paragraph(&mut self, paragraph: &Paragraph, path: &str, flow: bool) -> Result<()> {
        let number = if flow {
            self.flow += 1;
            Some(self.flow)
        } else {
            None
        };
        let segments = self.flattener.flatten(&paragraph.content, path)?;

        for segment in &segments {
            match &segment.kind {
                SegmentKind::FootnoteRef(n) => self.anchors.push(*n),
                SegmentKind::Citation { .. } => self.stats.citation_count += 1,
                SegmentKind::IndexTerm { .. } => self.stats.index_term_count += 1,
                _ => {}
            }
        }

        let rendered = RenderedParagraph {
            kind: paragraph.kind,
            number,
            numbered: number.is_some() && self.config.paragraph_numbers,
            segments,
            path: path.to_string(),
        };
        self.stats.add_paragraph();
        self.stats.count_text(&rendered.plain_text());
        self.sink.paragraph(&rendered)
    }

    fn list(&mut self, list: &List, depth: usize, path: &str) -> Result<()> {
        self.sink.begin_list(list.ordered, depth)?;
        for (i, item) in list.items.iter().enumerate() {
            let marker = list_marker(list.ordered, depth, i as u32 + 1);
            let item_path = format!("{}/item[{}]", path, i);
            self.sink.begin_item(&marker, depth)?;
            self.stats.add_list_item();
            for (j, block) in item.blocks.iter().enumerate() {
                self.block(block, &format!("{}/block[{}]", item_path, j), false, depth)?;
            }
            if let Some(sublist) = &item.sublist {
                self.list(sublist, depth + 1, &format!("{}/list", item_path))?;
            }
            self.sink.end_item(depth)?;
        }
        self.sink.end_list(list.ordered, depth)
    }

    /// Section-end placement: every note the section owns, in number order.
    fn flush_section_notes(&mut self, section: &SectionPath) -> Result<()> {
        self.anchors.clear();
        let notes = self.doc.footnotes().emit_footnotes(section);
        if notes.is_empty() {
            return Ok(());
        }
        self.sink.begin_footnotes(&self.config.footnotes_title)?;
        for note in notes {
            self.footnote(note.number)?;
            // Nested anchors belong to the same section and are already listed.
            self.anchors.clear();
        }
        self.sink.end_footnotes()
    }

    /// Page-bottom and inline placement: notes anchored in the block just
    /// rendered, followed by notes anchored inside those notes.
    fn flush_anchored_notes(&mut self) -> Result<()> {
        let mut queue: VecDeque<u32> = self.anchors.drain(..).collect();
        while let Some(number) = queue.pop_front() {
            self.footnote(number)?;
            queue.extend(self.anchors.drain(..));
        }
        Ok(())
    }

    fn footnote(&mut self, number: u32) -> Result<()> {
        let Some(note) = self.doc.footnote(number) else {
            log::warn!("anchor of unknown footnote {}", number);
            return Ok(());
        };
        self.sink.begin_footnote(number)?;
        self.stats.add_footnote();
        for (i, block) in note.body.iter().enumerate() {
            self.block(block, &format!("/footnote[{}]/block[{}]", number, i), false, 0)?;
        }
        self.sink.end_footnote(number)
    }
}

fn node_base(section: &SectionPath) -> String {
    if section.is_root() {
        String::new()
    } else {
        format!("/{}", section.join("."))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compose::{Container, DocumentBuilder, Flow};
    use crate::error::Error;
    use crate::model::Style;

    /// Records events as strings.
    struct Recorder {
        placement: FootnotePlacement,
        supported: TextStyle,
        events: Vec<String>,
    }

    impl Recorder {
        fn new(placement: FootnotePlacement) -> Self {
            Self {
                placement,
                supported: TextStyle::all(),
                events: Vec::new(),
            }
        }
    }

    impl RenderSink for Recorder {
        fn backend(&self) -> &'static str {
            "recorder"
        }

        fn directive_key(&self) -> &'static str {
            "rec"
        }

        fn placement(&self) -> FootnotePlacement {
            self.placement
        }

        fn supported_styles(&self) -> TextStyle {
            self.supported
        }

        fn title_block(&mut self, metadata: &Metadata) -> Result<()> {
            self.events
                .push(format!("title {}", metadata.title.as_deref().unwrap_or("")));
            Ok(())
        }

        fn toc(&mut self, title: &str, lines: &[TocLine]) -> Result<()> {
            let texts: Vec<String> = lines.iter().map(TocLine::text).collect();
            self.events.push(format!("toc {} {}", title, texts.join("|")));
            Ok(())
        }

        fn page_break(&mut self, restart: Option<u32>) -> Result<()> {
            self.events.push(format!("break {:?}", restart));
            Ok(())
        }

        fn thematic_break(&mut self) -> Result<()> {
            self.events.push("rule".to_string());
            Ok(())
        }

        fn begin_section(&mut self, heading: &Heading<'_>) -> Result<()> {
            match heading.subtitle {
                Some(subtitle) => self
                    .events
                    .push(format!("section {} / {}", heading.text(), subtitle)),
                None => self.events.push(format!("section {}", heading.text())),
            }
            Ok(())
        }

        fn paragraph(&mut self, paragraph: &RenderedParagraph) -> Result<()> {
            self.events.push(format!(
                "p{} {}",
                paragraph
                    .display_number()
                    .map(|n| n.to_string())
                    .unwrap_or_default(),
                paragraph.plain_text()
            ));
            Ok(())
        }

        fn begin_item(&mut self, marker: &str, depth: usize) -> Result<()> {
            self.events.push(format!("item {} {}", depth, marker));
            Ok(())
        }

        fn begin_footnotes(&mut self, title: &str) -> Result<()> {
            self.events.push(format!("notes {}", title));
            Ok(())
        }

        fn begin_footnote(&mut self, number: u32) -> Result<()> {
            self.events.push(format!("note {}", number));
            Ok(())
        }

        fn bibliography(&mut self, title: &str, entries: &[BibliographyEntry]) -> Result<()> {
            self.events.push(format!("{} {}", title, entries.len()));
            Ok(())
        }

        fn index(&mut self, title: &str, entries: &[&IndexEntry]) -> Result<()> {
            self.events.push(format!("{} {}", title, entries.len()));
            Ok(())
        }
    }

    fn sample(config: DocumentConfig) -> Document {
        let mut b = DocumentBuilder::new(config).unwrap();
        b.with_section("One", |s| {
            s.with_paragraph(|p| {
                p.text("Alpha")?;
                p.footnote(|note| {
                    note.with_paragraph(|inner| {
                        inner.text("Note one")?;
                        inner.footnote_text("Nested.")?;
                        Ok(())
                    })
                })?;
                Ok(())
            })?;
            s.with_section("Sub", |s| s.p("Beta"))?;
            s.p("Gamma")
        })
        .unwrap();
        b.with_section("Two", |s| {
            s.set_page("rec", 7)?;
            s.with_paragraph(|p| {
                p.text("Delta")?.indexed("Sage")?.citation("Darwin")?;
                Ok(())
            })
        })
        .unwrap();
        b.finish()
    }

    fn config() -> DocumentConfig {
        DocumentConfig::new()
            .with_title("Opus")
            .with_section_numbers(true)
            .with_paragraph_numbers(true)
            .with_toc(2, "Contents")
            .with_page_break_level(1)
            .with_bibliography(true)
            .with_index(true)
    }

    #[test]
    fn test_section_end_placement() {
        let doc = sample(config());
        let mut sink = Recorder::new(FootnotePlacement::SectionEnd);
        let stats = walk(&doc, &mut sink).unwrap();

        let events = sink.events;
        assert_eq!(events[0], "title Opus");
        assert_eq!(events[1], "toc Contents 1. One|1.1. Sub|2. Two");
        assert_eq!(events[2], "break None");
        assert_eq!(events[3], "section 1. One");
        assert_eq!(events[4], "p1 Alpha");
        assert_eq!(events[5], "section 1.1. Sub");
        assert_eq!(events[6], "p2 Beta");
        assert_eq!(events[7], "p3 Gamma");
        assert_eq!(events[8], "notes Footnotes");
        assert_eq!(events[9], "note 1");
        assert_eq!(events[10], "p Note one");
        assert_eq!(events[11], "note 2");
        assert_eq!(events[12], "p Nested.");
        assert_eq!(events[13], "break Some(7)");
        assert_eq!(events[14], "section 2. Two");
        assert_eq!(events[15], "p4 Delta Sage [1]");
        assert_eq!(events[16], "break None");
        assert_eq!(events[17], "References 1");
        assert_eq!(events[18], "break None");
        assert_eq!(events[19], "Index 1");

        assert_eq!(stats.section_count, 3);
        assert_eq!(stats.footnote_count, 2);
        assert_eq!(stats.citation_count, 1);
        assert_eq!(stats.index_term_count, 1);
    }

    #[test]
    fn test_inline_placement_follows_block() {
        let doc = sample(config());
        let mut sink = Recorder::new(FootnotePlacement::Inline);
        walk(&doc, &mut sink).unwrap();

        let start = sink.events.iter().position(|e| e == "p1 Alpha").unwrap();
        assert_eq!(
            &sink.events[start..start + 5],
            &["p1 Alpha", "note 1", "p Note one", "note 2", "p Nested."]
        );
        assert!(!sink.events.iter().any(|e| e.starts_with("notes")));
    }

    #[test]
    fn test_back_matter_requires_config() {
        let doc = sample(config().with_bibliography(false).with_index(false));
        let mut sink = Recorder::new(FootnotePlacement::Inline);
        walk(&doc, &mut sink).unwrap();
        assert!(sink.events.last().unwrap().starts_with("p4"));
    }

    #[test]
    fn test_unsupported_style_fails_closed() {
        let mut b = DocumentBuilder::new(DocumentConfig::new()).unwrap();
        b.with_section("S", |s| {
            s.p("plain")?;
            s.with_paragraph(|p| {
                p.styled(Style::Comment, |p| p.text("remark").map(|_| ()))?;
                Ok(())
            })
        })
        .unwrap();
        let doc = b.finish();

        let mut sink = Recorder::new(FootnotePlacement::Inline);
        sink.supported = TextStyle::all().without(Style::Comment);
        let err = walk(&doc, &mut sink).unwrap_err();
        assert!(matches!(
            err,
            Error::UnsupportedStyle { ref path, .. } if path == "/1/block[1]/span[0]"
        ));
    }

    #[test]
    fn test_list_markers_by_depth() {
        let mut b = DocumentBuilder::new(DocumentConfig::new()).unwrap();
        b.with_list(true, |list| {
            list.with_item(|item| {
                item.p("a")?;
                item.with_list(true, |sub| sub.item_text("b").map(|_| ()))
            })?;
            list.item_text("c").map(|_| ())
        })
        .unwrap();
        let doc = b.finish();

        let mut sink = Recorder::new(FootnotePlacement::Inline);
        walk(&doc, &mut sink).unwrap();
        let items: Vec<&String> = sink.events.iter().filter(|e| e.starts_with("item")).collect();
        assert_eq!(items, vec!["item 1 1.", "item 2 a.", "item 1 2."]);
    }

    #[test]
    fn test_breaks_and_subtitles() {
        let mut b = DocumentBuilder::new(DocumentConfig::new().with_page_break_level(0)).unwrap();
        b.with_section("One", |s| {
            s.set_subtitle("Opening")?;
            s.p("a")?;
            s.thematic_break()?;
            s.p("b")?;
            s.page_break()?;
            s.p("c")
        })
        .unwrap();
        let doc = b.finish();

        let mut sink = Recorder::new(FootnotePlacement::Inline);
        let stats = walk(&doc, &mut sink).unwrap();
        assert_eq!(
            &sink.events[1..],
            &["section One / Opening", "p a", "rule", "p b", "break None", "p c"]
        );
        assert_eq!(stats.paragraph_count, 3);
    }

    #[test]
    fn test_location_label() {
        let config = DocumentConfig::new().with_paragraph_numbers(true);
        let loc = Location::new(SectionPath::from_ordinals(vec![2, 1]), Some(9));
        assert_eq!(location_label(&loc, &config), "9");

        let config = DocumentConfig::new();
        assert_eq!(location_label(&loc, &config), "\u{a7}2.1");
        let root = Location::new(SectionPath::root(), None);
        assert_eq!(location_label(&root, &config), "\u{a7}0");
    }
}
