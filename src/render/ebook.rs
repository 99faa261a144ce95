//! Reflowable e-book (epub-like) rendering.
//!
//! The artifact is a set of XHTML chapters in spine order: a title page, the
//! navigation document when a table of contents is configured, one chapter
//! per page-breaking section, then the references and index pages. Footnote
//! bodies become popup `<aside>` elements placed right after the block that
//! anchors them.

use super::escape_xml;
use super::inline::{Segment, SegmentKind};
use super::options::RenderOptions;
use super::result::RenderStats;
use super::walk::{
    location_label, walk, FootnotePlacement, Heading, RenderSink, RenderedParagraph, TocLine,
};
use crate::error::Result;
use crate::model::{Document, Metadata, NumberStyle, SectionPath, MAX_LEVEL};
use crate::registry::{BibliographyEntry, IndexEntry, Location};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

const TITLE_PAGE: &str = "title_page.xhtml";
const NAV_PAGE: &str = "nav.xhtml";
const REFERENCES_PAGE: &str = "references.xhtml";
const INDEX_PAGE: &str = "index.xhtml";
const STYLESHEET_HREF: &str = "style/stylesheet.css";

/// Rendered e-book.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EbookArtifact {
    /// Document metadata (Dublin Core)
    pub metadata: Metadata,

    /// Chapters in spine order
    pub chapters: Vec<Chapter>,

    /// Navigation points
    pub nav: Vec<NavPoint>,

    /// Embedded stylesheet
    pub stylesheet: String,

    /// Traversal statistics
    pub stats: RenderStats,
}

impl EbookArtifact {
    /// Find a chapter by file name.
    pub fn chapter(&self, file_name: &str) -> Option<&Chapter> {
        self.chapters.iter().find(|c| c.file_name == file_name)
    }
}

/// One XHTML content document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chapter {
    /// File name inside the container
    pub file_name: String,

    /// Title shown in reading systems
    pub title: String,

    /// Body markup
    pub content: String,

    /// Printed page the chapter starts on, from a page directive
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_page: Option<u32>,
}

impl Chapter {
    fn new(file_name: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            title: title.into(),
            content: String::new(),
            start_page: None,
        }
    }

    /// Complete XHTML document for this chapter.
    pub fn to_xhtml(&self, language: &str) -> String {
        let language = escape_xml(language);
        format!(
            "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n\
             <!DOCTYPE html>\n\
             <html xmlns=\"http://www.w3.org/1999/xhtml\" \
             xmlns:epub=\"http://www.idpf.org/2007/ops\" lang=\"{lang}\" xml:lang=\"{lang}\">\n\
             <head>\n<title>{title}</title>\n\
             <link rel=\"stylesheet\" type=\"text/css\" href=\"{css}\"/>\n</head>\n\
             <body>\n{body}</body>\n</html>\n",
            lang = language,
            title = escape_xml(&self.title),
            css = STYLESHEET_HREF,
            body = self.content,
        )
    }
}

/// A navigation entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavPoint {
    /// Label
    pub title: String,
    /// Target, `file#fragment`
    pub href: String,
    /// Nesting depth (1 = top)
    pub depth: usize,
}

/// Render a document to an e-book artifact.
pub fn render(doc: &Document, options: &RenderOptions) -> Result<EbookArtifact> {
    let mut sink = EbookSink::new(doc, options);
    let stats = walk(doc, &mut sink)?;
    Ok(sink.finish(stats))
}

/// Sink building an [`EbookArtifact`].
pub struct EbookSink<'a> {
    doc: &'a Document,
    options: &'a RenderOptions,
    chapters: Vec<Chapter>,
    toc: Option<(String, Vec<TocLine>)>,
    pending_break: bool,
    pending_page: Option<u32>,
    section_files: HashMap<SectionPath, String>,
    paragraph_files: HashMap<u32, String>,
    note: Option<(u32, bool)>,
}

impl<'a> EbookSink<'a> {
    /// Create a sink for `doc`.
    pub fn new(doc: &'a Document, options: &'a RenderOptions) -> Self {
        let title = doc
            .metadata()
            .title
            .clone()
            .unwrap_or_else(|| "Title page".to_string());
        Self {
            doc,
            options,
            chapters: vec![Chapter::new(TITLE_PAGE, title)],
            toc: None,
            pending_break: false,
            pending_page: None,
            section_files: HashMap::new(),
            paragraph_files: HashMap::new(),
            note: None,
        }
    }

    /// Finish the artifact, inserting the navigation document second.
    pub fn finish(mut self, mut stats: RenderStats) -> EbookArtifact {
        let nav = match self.toc.take() {
            Some((title, lines)) => {
                let points: Vec<NavPoint> = lines
                    .iter()
                    .map(|line| NavPoint {
                        title: line.text(),
                        href: self.section_href(&line.path),
                        depth: line.depth,
                    })
                    .collect();
                let mut chapter = Chapter::new(NAV_PAGE, title.clone());
                chapter
                    .content
                    .push_str(&format!("<h1>{}</h1>\n<nav epub:type=\"toc\">\n", escape_xml(&title)));
                for point in &points {
                    chapter.content.push_str(&format!(
                        "<p class=\"toc{}\"><a href=\"{}\">{}</a></p>\n",
                        point.depth,
                        escape_xml(&point.href),
                        escape_xml(&point.title)
                    ));
                }
                chapter.content.push_str("</nav>\n");
                self.chapters.insert(1, chapter);
                points
            }
            None => self
                .chapters
                .iter()
                .map(|chapter| NavPoint {
                    title: chapter.title.clone(),
                    href: chapter.file_name.clone(),
                    depth: 1,
                })
                .collect(),
        };

        stats.page_count = self.chapters.len() as u32;
        EbookArtifact {
            metadata: self.doc.metadata().clone(),
            chapters: self.chapters,
            nav,
            stylesheet: self.options.stylesheet().to_string(),
            stats,
        }
    }

    fn write(&mut self, markup: &str) {
        if let Some(chapter) = self.chapters.last_mut() {
            chapter.content.push_str(markup);
            chapter.content.push('\n');
        }
    }

    fn current_file(&self) -> String {
        self.chapters
            .last()
            .map(|c| c.file_name.clone())
            .unwrap_or_else(|| TITLE_PAGE.to_string())
    }

    fn open_chapter(&mut self, file_name: String, title: String) {
        let mut chapter = Chapter::new(file_name, title);
        chapter.start_page = self.pending_page.take();
        self.chapters.push(chapter);
        self.pending_break = false;
    }

    fn section_href(&self, path: &SectionPath) -> String {
        let file = self
            .section_files
            .get(path)
            .cloned()
            .unwrap_or_else(|| TITLE_PAGE.to_string());
        format!("{}#s{}", file, path.join("_"))
    }

    fn location_href(&self, location: &Location) -> String {
        if let Some(file) = location
            .paragraph
            .and_then(|n| self.paragraph_files.get(&n))
        {
            return format!("{}#p{}", file, location.paragraph.unwrap_or_default());
        }
        if location.section.is_root() {
            TITLE_PAGE.to_string()
        } else {
            self.section_href(&location.section)
        }
    }
}

/// Write segments as XHTML inline markup.
fn segment_markup(segments: &[Segment]) -> String {
    let mut out = String::new();
    for segment in segments {
        let mut close = Vec::new();
        if segment.style.comment {
            out.push_str("<span class=\"comment\">");
            close.push("</span>");
        }
        if segment.style.bold {
            out.push_str("<b>");
            close.push("</b>");
        }
        if segment.style.italic {
            out.push_str("<i>");
            close.push("</i>");
        }
        if segment.style.underline {
            out.push_str("<u>");
            close.push("</u>");
        }
        match &segment.kind {
            SegmentKind::Text(text) => out.push_str(&escape_xml(text)),
            SegmentKind::Link { text, uri } => out.push_str(&format!(
                "<a href=\"{}\">{}</a>",
                escape_xml(uri),
                escape_xml(text)
            )),
            SegmentKind::FootnoteRef(n) => out.push_str(&format!(
                "<a epub:type=\"noteref\" href=\"#fn{n}\" id=\"fnref{n}\"><sup>{n}</sup></a>"
            )),
            SegmentKind::IndexTerm { text, .. } => {
                out.push_str(&format!("<u>{}</u>", escape_xml(text)))
            }
            SegmentKind::Citation { label, number, .. } => match number {
                Some(n) => out.push_str(&format!(
                    "<a href=\"{}#ref{}\">{}</a>",
                    REFERENCES_PAGE,
                    n,
                    escape_xml(label)
                )),
                None => out.push_str(&escape_xml(label)),
            },
            SegmentKind::LineBreak => out.push_str("<br/>"),
        }
        for tag in close.iter().rev() {
            out.push_str(tag);
        }
    }
    out
}

fn list_tag(ordered: bool, depth: usize) -> String {
    if !ordered {
        return "<ul>".to_string();
    }
    let kind = match NumberStyle::for_depth(depth) {
        NumberStyle::Decimal => "1",
        NumberStyle::LowerAlpha => "a",
        NumberStyle::LowerRoman => "i",
    };
    format!("<ol type=\"{}\">", kind)
}

impl RenderSink for EbookSink<'_> {
    fn backend(&self) -> &'static str {
        "epub"
    }

    fn directive_key(&self) -> &'static str {
        "epub"
    }

    fn placement(&self) -> FootnotePlacement {
        FootnotePlacement::Inline
    }

    fn title_block(&mut self, metadata: &Metadata) -> Result<()> {
        if metadata.is_blank() {
            return Ok(());
        }
        if let Some(title) = &metadata.title {
            self.write(&format!("<h1>{}</h1>", escape_xml(title)));
        }
        if let Some(subtitle) = &metadata.subtitle {
            self.write(&format!("<h2>{}</h2>", escape_xml(subtitle)));
        }
        if !metadata.authors.is_empty() {
            let authors: Vec<String> = metadata.authors.iter().map(|a| escape_xml(a)).collect();
            self.write(&format!("<h3>{}</h3>", authors.join("<br/>")));
        }
        if let Some(version) = &metadata.version {
            self.write(&format!("<p>{}</p>", escape_xml(version)));
        }
        self.write("<hr/>");
        Ok(())
    }

    fn toc(&mut self, title: &str, lines: &[TocLine]) -> Result<()> {
        self.toc = Some((title.to_string(), lines.to_vec()));
        Ok(())
    }

    /// Page breaks become chapter boundaries at the next section.
    fn page_break(&mut self, restart: Option<u32>) -> Result<()> {
        self.pending_break = true;
        if restart.is_some() {
            self.pending_page = restart;
        }
        Ok(())
    }

    /// Inside a chapter an explicit break is a CSS page break.
    fn forced_page_break(&mut self) -> Result<()> {
        self.write("<br style=\"page-break-after: always;\"/>");
        Ok(())
    }

    fn thematic_break(&mut self) -> Result<()> {
        self.write("<hr class=\"thematic\"/>");
        Ok(())
    }

    fn begin_section(&mut self, heading: &Heading<'_>) -> Result<()> {
        if self.pending_break {
            let file = format!("{}_section.xhtml", heading.path.join("_"));
            self.open_chapter(file, heading.text());
        }
        self.section_files
            .insert(heading.path.clone(), self.current_file());
        let level = heading.depth.min(MAX_LEVEL as usize);
        self.write(&format!(
            "<h{level} id=\"s{id}\">{text}</h{level}>",
            level = level,
            id = heading.path.join("_"),
            text = escape_xml(&heading.text())
        ));
        if let Some(subtitle) = heading.subtitle {
            let level = (heading.depth + 1).min(MAX_LEVEL as usize);
            self.write(&format!("<h{l}>{}</h{l}>", escape_xml(subtitle), l = level));
        }
        Ok(())
    }

    fn paragraph(&mut self, paragraph: &RenderedParagraph) -> Result<()> {
        let tag = if paragraph.is_quote() { "blockquote" } else { "p" };
        let mut markup = match paragraph.number {
            Some(n) => {
                self.paragraph_files.insert(n, self.current_file());
                format!("<{} id=\"p{}\">", tag, n)
            }
            None => format!("<{}>", tag),
        };
        if let Some((number, first)) = self.note.as_mut() {
            if *first {
                *first = false;
                markup.push_str(&format!("<b>{}.</b> ", number));
            }
        }
        if let Some(n) = paragraph.display_number() {
            markup.push_str(&format!("({}) ", n));
        }
        markup.push_str(&segment_markup(&paragraph.segments));
        markup.push_str(&format!("</{}>", tag));
        self.write(&markup);
        Ok(())
    }

    fn begin_list(&mut self, ordered: bool, depth: usize) -> Result<()> {
        self.write(&list_tag(ordered, depth));
        Ok(())
    }

    fn end_list(&mut self, ordered: bool, _depth: usize) -> Result<()> {
        self.write(if ordered { "</ol>" } else { "</ul>" });
        Ok(())
    }

    fn begin_item(&mut self, _marker: &str, _depth: usize) -> Result<()> {
        self.write("<li>");
        Ok(())
    }

    fn end_item(&mut self, _depth: usize) -> Result<()> {
        self.write("</li>");
        Ok(())
    }

    fn begin_footnote(&mut self, number: u32) -> Result<()> {
        self.note = Some((number, true));
        self.write(&format!(
            "<aside epub:type=\"footnote\" id=\"fn{}\">",
            number
        ));
        Ok(())
    }

    fn end_footnote(&mut self, _number: u32) -> Result<()> {
        self.note = None;
        self.write("</aside>");
        Ok(())
    }

    fn bibliography(&mut self, title: &str, entries: &[BibliographyEntry]) -> Result<()> {
        self.open_chapter(REFERENCES_PAGE.to_string(), title.to_string());
        self.write(&format!("<h1>{}</h1>", escape_xml(title)));
        for entry in entries {
            self.write(&format!(
                "<p id=\"ref{n}\">[{n}] {text}</p>",
                n = entry.number,
                text = escape_xml(&entry.text)
            ));
        }
        Ok(())
    }

    fn index(&mut self, title: &str, entries: &[&IndexEntry]) -> Result<()> {
        self.open_chapter(INDEX_PAGE.to_string(), title.to_string());
        self.write(&format!("<h1>{}</h1>", escape_xml(title)));
        let config = self.doc.config();
        for entry in entries {
            let links: Vec<String> = entry
                .locations
                .iter()
                .map(|loc| {
                    format!(
                        "<a href=\"{}\">{}</a>",
                        escape_xml(&self.location_href(loc)),
                        escape_xml(&location_label(loc, config))
                    )
                })
                .collect();
            let mut line = format!("<p><b>{}</b>", escape_xml(&entry.key));
            let variants = entry.variants();
            if !variants.is_empty() {
                line.push_str(&format!(" <i>({})</i>", escape_xml(&variants.join("; "))));
            }
            line.push_str(&format!(" {}</p>", links.join(", ")));
            self.write(&line);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compose::{Container, DocumentBuilder, Flow};
    use crate::model::{DocumentConfig, Style};

    fn doc() -> Document {
        let config = DocumentConfig::new()
            .with_title("Opus & Co")
            .with_author("Per")
            .with_author("Anna")
            .with_toc(2, "Contents")
            .with_paragraph_numbers(true);
        let mut b = DocumentBuilder::new(config).unwrap();
        b.with_section("One", |s| {
            s.with_paragraph(|p| {
                p.text("See")?.indexed("Sage")?;
                p.footnote_text("Popup.")?;
                Ok(())
            })?;
            s.p("After")?;
            s.with_section("Deeper", |s| s.q("Quoted"))
        })
        .unwrap();
        b.with_section("Two", |s| {
            s.with_list(true, |l| {
                l.with_item(|item| {
                    item.p("outer")?;
                    item.with_list(true, |sub| sub.item_text("inner").map(|_| ()))
                })
            })?;
            s.with_paragraph(|p| {
                p.styled(Style::Comment, |p| p.text("aside").map(|_| ()))?;
                p.indexed_as("Mr Sage", "Sage")?;
                Ok(())
            })
        })
        .unwrap();
        b.finish()
    }

    #[test]
    fn test_chapter_layout() {
        let artifact = render(&doc(), &RenderOptions::default()).unwrap();
        let files: Vec<&str> = artifact
            .chapters
            .iter()
            .map(|c| c.file_name.as_str())
            .collect();
        assert_eq!(
            files,
            vec![TITLE_PAGE, NAV_PAGE, "1_section.xhtml", "2_section.xhtml", INDEX_PAGE]
        );

        let title = &artifact.chapters[0].content;
        assert!(title.contains("<h1>Opus &amp; Co</h1>"));
        assert!(title.contains("<h3>Per<br/>Anna</h3>"));

        assert_eq!(artifact.nav.len(), 3);
        assert_eq!(artifact.nav[1].href, "1_section.xhtml#s1_1");
        assert_eq!(artifact.stats.page_count, 5);
    }

    #[test]
    fn test_footnote_aside_follows_block() {
        let artifact = render(&doc(), &RenderOptions::default()).unwrap();
        let one = artifact.chapter("1_section.xhtml").unwrap();

        let anchor = one.content.find("href=\"#fn1\"").unwrap();
        let aside = one.content.find("<aside epub:type=\"footnote\" id=\"fn1\">").unwrap();
        let after = one.content.find("(2) After").unwrap();
        assert!(anchor < aside && aside < after);
        assert!(one.content.contains("<p id=\"p1\">(1) See <u>Sage</u>"));
        assert!(one.content.contains("<blockquote id=\"p3\">(3) Quoted</blockquote>"));
    }

    #[test]
    fn test_nested_lists_and_comment() {
        let artifact = render(&doc(), &RenderOptions::default()).unwrap();
        let two = artifact.chapter("2_section.xhtml").unwrap();
        assert!(two.content.contains("<ol type=\"1\">\n<li>\n<p>outer</p>\n<ol type=\"a\">"));
        assert!(two.content.contains("<span class=\"comment\">aside</span>"));
    }

    #[test]
    fn test_index_links_to_paragraphs() {
        let artifact = render(&doc(), &RenderOptions::default()).unwrap();
        let index = artifact.chapter(INDEX_PAGE).unwrap();
        assert!(index.content.contains(
            "<p><b>Sage</b> <i>(Mr Sage)</i> <a href=\"1_section.xhtml#p1\">1</a>, <a href=\"2_section.xhtml#p4\">4</a></p>"
        ));
    }

    #[test]
    fn test_breaks_stay_inside_chapter() {
        let config = DocumentConfig::new().with_title("Opus").with_subtitle("Second edition");
        let mut b = DocumentBuilder::new(config).unwrap();
        b.with_section("One", |s| {
            s.set_subtitle("Early days")?;
            s.p("a")?;
            s.thematic_break()?;
            s.page_break()?;
            s.p("b")
        })
        .unwrap();
        let artifact = render(&b.finish(), &RenderOptions::default()).unwrap();

        assert!(artifact.chapters[0]
            .content
            .starts_with("<h1>Opus</h1>\n<h2>Second edition</h2>\n"));
        assert_eq!(artifact.chapters.len(), 2);
        let one = &artifact.chapters[1].content;
        assert!(one.contains(
            "<h1 id=\"s1\">One</h1>\n<h2>Early days</h2>\n<p id=\"p1\">a</p>\n\
             <hr class=\"thematic\"/>\n<br style=\"page-break-after: always;\"/>\n<p id=\"p2\">b</p>"
        ));
    }

    #[test]
    fn test_blank_title_page_has_no_rule() {
        let mut b = DocumentBuilder::new(DocumentConfig::new()).unwrap();
        b.p("body").unwrap();
        let artifact = render(&b.finish(), &RenderOptions::default()).unwrap();
        assert_eq!(artifact.chapters[0].content, "<p id=\"p1\">body</p>\n");
    }

    #[test]
    fn test_to_xhtml_wraps_body() {
        let artifact = render(&doc(), &RenderOptions::default()).unwrap();
        let xhtml = artifact.chapters[0].to_xhtml("en");
        assert!(xhtml.starts_with("<?xml"));
        assert!(xhtml.contains("xmlns:epub"));
        assert!(xhtml.contains("<title>Opus &amp; Co</title>"));
    }
}
