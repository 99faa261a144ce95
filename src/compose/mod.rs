//! Scoped document construction.
//!
//! A [`DocumentBuilder`] hands out handles for sections, paragraphs, lists
//! and footnotes. Each handle mutably borrows its parent, so construction is
//! strictly nested: a child must be finished before its parent accepts more
//! content. Handles are finalized exactly once, either by an explicit
//! `close()` or when they go out of scope. Registries are filled as a side
//! effect and move into the [`Document`] returned by
//! [`DocumentBuilder::finish`].
//!
//! # Example
//!
//! ```
//! use quire::compose::{Container, DocumentBuilder};
//! use quire::model::{DocumentConfig, Style};
//!
//! let config = DocumentConfig::new().with_title("Opus").with_toc(2, "Contents");
//! let mut builder = DocumentBuilder::new(config)?;
//! builder.with_section("Introduction", |section| {
//!     let mut para = section.paragraph()?;
//!     para.text("Some")?;
//!     para.styled(Style::Bold, |p| p.text("bold").map(|_| ()))?;
//!     para.text("text")?.period()?;
//!     para.close()
//! })?;
//! let document = builder.finish();
//! assert_eq!(document.toc().len(), 1);
//! # Ok::<(), quire::Error>(())
//! ```

mod footnote;
mod list;
mod paragraph;
mod section;

pub use footnote::FootnoteHandle;
pub use list::{ListHandle, ListItemHandle};
pub use paragraph::ParagraphHandle;
pub use section::SectionHandle;

use crate::error::{Error, Result};
use crate::model::{
    Block, Document, DocumentConfig, List, Metadata, MissingReferencePolicy, Node,
    ParagraphKind, SectionPath,
};
use crate::registry::{ReferenceSource, Registries};
use std::sync::Arc;

/// Construction state shared by every open handle of one document.
pub(crate) struct BuildState {
    config: DocumentConfig,
    references: Option<Arc<dyn ReferenceSource>>,
    registries: Registries,
    flow_paragraphs: u32,
}

impl BuildState {
    fn cite(&mut self, key: &str) -> Result<()> {
        let source = self.references.as_deref();
        match self.registries.references.cite(key, source) {
            Ok(_) => Ok(()),
            Err(Error::ReferenceNotFound(missing))
                if self.config.missing_references == MissingReferencePolicy::Placeholder =>
            {
                log::warn!("unresolved citation {:?} rendered as placeholder", missing);
                self.registries.references.mark_missing(key);
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    fn next_flow_paragraph(&mut self) -> u32 {
        self.flow_paragraphs += 1;
        self.flow_paragraphs
    }

    fn release_flow_paragraph(&mut self) {
        self.flow_paragraphs = self.flow_paragraphs.saturating_sub(1);
    }
}

/// Where a finished block goes.
pub(crate) enum Dest<'a> {
    /// Document body or section children; paragraphs here are numbered
    Flow(&'a mut Vec<Node>),
    /// List item or footnote body
    Blocks(&'a mut Vec<Block>),
}

impl Dest<'_> {
    fn push(&mut self, block: Block) {
        match self {
            Dest::Flow(nodes) => nodes.push(Node::Block(block)),
            Dest::Blocks(blocks) => blocks.push(block),
        }
    }

    fn is_flow(&self) -> bool {
        matches!(self, Dest::Flow(_))
    }
}

/// Where a finished list goes.
pub(crate) enum ListDest<'a> {
    Block(Dest<'a>),
    Sublist(&'a mut Option<List>),
}

impl ListDest<'_> {
    fn push(&mut self, list: List) {
        match self {
            ListDest::Block(dest) => dest.push(Block::List(list)),
            ListDest::Sublist(slot) => **slot = Some(list),
        }
    }
}

/// Borrowed pieces a container lends to a child block handle.
#[doc(hidden)]
pub struct Parts<'a> {
    pub(crate) state: &'a mut BuildState,
    pub(crate) dest: Dest<'a>,
    pub(crate) section: SectionPath,
}

mod sealed {
    pub trait Sealed {}
}

/// Anything that accepts blocks: the document body, sections, list items
/// and footnote bodies.
pub trait Container: sealed::Sealed {
    #[doc(hidden)]
    fn parts(&mut self) -> Result<Parts<'_>>;

    /// Open a paragraph.
    fn paragraph(&mut self) -> Result<ParagraphHandle<'_>> {
        Ok(ParagraphHandle::open(self.parts()?, ParagraphKind::Normal))
    }

    /// Open a block quote.
    fn quote(&mut self) -> Result<ParagraphHandle<'_>> {
        Ok(ParagraphHandle::open(self.parts()?, ParagraphKind::Quote))
    }

    /// Add a paragraph holding `text`.
    fn p(&mut self, text: &str) -> Result<()> {
        let mut para = self.paragraph()?;
        para.text(text)?;
        para.close()
    }

    /// Add a block quote holding `text`.
    fn q(&mut self, text: &str) -> Result<()> {
        let mut quote = self.quote()?;
        quote.text(text)?;
        quote.close()
    }

    /// Build a paragraph inside a closure; it is finalized on every exit path.
    fn with_paragraph<F, T>(&mut self, f: F) -> Result<T>
    where
        F: FnOnce(&mut ParagraphHandle<'_>) -> Result<T>,
    {
        let mut para = self.paragraph()?;
        let value = f(&mut para)?;
        para.close()?;
        Ok(value)
    }

    /// Build a block quote inside a closure.
    fn with_quote<F, T>(&mut self, f: F) -> Result<T>
    where
        F: FnOnce(&mut ParagraphHandle<'_>) -> Result<T>,
    {
        let mut quote = self.quote()?;
        let value = f(&mut quote)?;
        quote.close()?;
        Ok(value)
    }

    /// Open a list.
    fn list(&mut self, ordered: bool) -> Result<ListHandle<'_>> {
        let parts = self.parts()?;
        Ok(ListHandle::open(
            parts.state,
            ListDest::Block(parts.dest),
            parts.section,
            ordered,
        ))
    }

    /// Build a list inside a closure.
    fn with_list<F, T>(&mut self, ordered: bool, f: F) -> Result<T>
    where
        F: FnOnce(&mut ListHandle<'_>) -> Result<T>,
    {
        let mut list = self.list(ordered)?;
        let value = f(&mut list)?;
        list.close()?;
        Ok(value)
    }
}

/// Containers in the document flow: the body and sections. Breaks only
/// make sense here, not inside list items or footnotes.
pub trait Flow: Container {
    /// Force a page break before the next block.
    fn page_break(&mut self) -> Result<()> {
        self.parts()?.dest.push(Block::PageBreak);
        Ok(())
    }

    /// Add a horizontal rule between passages.
    fn thematic_break(&mut self) -> Result<()> {
        self.parts()?.dest.push(Block::ThematicBreak);
        Ok(())
    }
}

/// Entry point for building a [`Document`].
pub struct DocumentBuilder {
    state: BuildState,
    body: Vec<Node>,
    sections: u32,
}

impl DocumentBuilder {
    /// Start a document. Fails with [`Error::InvalidConfig`] if the
    /// configuration does not validate.
    pub fn new(config: DocumentConfig) -> Result<Self> {
        config.validate()?;
        let registries = Registries::new(config.toc_level as usize);
        Ok(Self {
            state: BuildState {
                config,
                references: None,
                registries,
                flow_paragraphs: 0,
            },
            body: Vec::new(),
            sections: 0,
        })
    }

    /// Attach the references collaborator used to resolve citations.
    pub fn with_references(mut self, source: Arc<dyn ReferenceSource>) -> Self {
        self.state.references = Some(source);
        self
    }

    /// Configuration in use.
    pub fn config(&self) -> &DocumentConfig {
        &self.state.config
    }

    /// Registries as filled so far.
    pub fn registries(&self) -> &Registries {
        &self.state.registries
    }

    /// Open a top-level section.
    pub fn section(&mut self, title: &str) -> Result<SectionHandle<'_>> {
        self.sections += 1;
        let path = SectionPath::root().child(self.sections);
        Ok(SectionHandle::open(
            &mut self.state,
            &mut self.body,
            path,
            title,
        ))
    }

    /// Build a top-level section inside a closure; it is finalized on every
    /// exit path.
    pub fn with_section<F, T>(&mut self, title: &str, f: F) -> Result<T>
    where
        F: FnOnce(&mut SectionHandle<'_>) -> Result<T>,
    {
        let mut section = self.section(title)?;
        let value = f(&mut section)?;
        section.close()?;
        Ok(value)
    }

    /// Freeze the tree and registries into an immutable document.
    pub fn finish(self) -> Document {
        let metadata = Metadata::from_config(&self.state.config);
        log::debug!(
            "document finished: {} top-level nodes, {} footnotes, {} citations",
            self.body.len(),
            self.state.registries.footnotes.len(),
            self.state.registries.references.len()
        );
        Document::from_parts(
            metadata,
            self.state.config,
            self.body,
            self.state.registries,
        )
    }
}

impl sealed::Sealed for DocumentBuilder {}

impl Container for DocumentBuilder {
    fn parts(&mut self) -> Result<Parts<'_>> {
        Ok(Parts {
            state: &mut self.state,
            dest: Dest::Flow(&mut self.body),
            section: SectionPath::root(),
        })
    }
}

impl Flow for DocumentBuilder {}

impl sealed::Sealed for SectionHandle<'_> {}
impl sealed::Sealed for ListItemHandle<'_> {}
impl sealed::Sealed for FootnoteHandle<'_> {}
