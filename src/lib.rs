//! # quire
//!
//! Compose a document once and render it to several output formats.
//!
//! A document is built through nested, scoped handles into an abstract tree
//! of sections, paragraphs, lists and footnotes. Building also fills the
//! cross-cutting registries (table of contents, index, footnotes and cited
//! references). The finished [`Document`] is immutable and is rendered by
//! independent backends into word-processor, fixed-page and e-book artifacts.
//!
//! ## Quick Start
//!
//! ```
//! use quire::{render, Container, DocumentBuilder, DocumentConfig, OutputFormat, Style};
//!
//! fn main() -> quire::Result<()> {
//!     let config = DocumentConfig::new()
//!         .with_title("Opus")
//!         .with_author("A. Writer")
//!         .with_toc(2, "Contents");
//!
//!     let mut builder = DocumentBuilder::new(config)?;
//!     builder.with_section("Introduction", |section| {
//!         let mut para = section.paragraph()?;
//!         para.text("Plain")?;
//!         para.styled_text(Style::Italic, "and slanted")?;
//!         para.footnote_text("A remark.")?;
//!         para.close()
//!     })?;
//!     let doc = builder.finish();
//!
//!     let artifact = render(&doc, OutputFormat::Pdf)?;
//!     println!("{} pages", artifact.stats().page_count);
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Scoped construction**: handles close on every exit path and reject
//!   content once closed
//! - **Registries**: TOC, index, footnotes and citations collected while building
//! - **Three backends**: word-processor, fixed-page and e-book layouts
//! - **Per-backend page directives**: each backend honours only its own key
//! - **Parallel rendering**: Uses Rayon to render every backend at once
//! - **JSON output**: documents and artifacts serialize with serde

pub mod backend;
pub mod compose;
pub mod error;
pub mod model;
pub mod registry;
pub mod render;

// Re-export commonly used types
pub use backend::{Backend, BackendRegistry, EbookBackend, OutputFormat, PageBackend, WordBackend};
pub use compose::{
    Container, DocumentBuilder, Flow, FootnoteHandle, ListHandle, ListItemHandle,
    ParagraphHandle, SectionHandle,
};
pub use error::{Error, Result};
pub use model::{
    Block, Document, DocumentConfig, Inline, List, ListItem, Metadata, MissingReferencePolicy,
    Node, Paragraph, ParagraphKind, Section, SectionPath, Style, TextStyle,
};
pub use registry::{ReferenceMap, ReferenceSource};
pub use render::{Artifact, JsonFormat, RenderOptions, RenderStats};

/// Render a document with one of the built-in backends.
///
/// # Arguments
///
/// * `doc` - Finished document
/// * `format` - Output format
///
/// # Example
///
/// ```
/// use quire::{render, DocumentBuilder, DocumentConfig, OutputFormat};
///
/// let doc = DocumentBuilder::new(DocumentConfig::new().with_title("Empty"))?.finish();
/// let artifact = render(&doc, OutputFormat::Docx)?;
/// assert_eq!(artifact.format(), "docx");
/// # Ok::<(), quire::Error>(())
/// ```
pub fn render(doc: &Document, format: OutputFormat) -> Result<Artifact> {
    render_with_options(doc, format, &RenderOptions::default())
}

/// Render a document with one of the built-in backends and custom options.
pub fn render_with_options(
    doc: &Document,
    format: OutputFormat,
    options: &RenderOptions,
) -> Result<Artifact> {
    BackendRegistry::with_defaults().render(format.as_str(), doc, options)
}

/// Render a document with every built-in backend in parallel.
///
/// Results are returned in the order docx, pdf, epub.
///
/// # Example
///
/// ```
/// use quire::{render_all, Container, DocumentBuilder, DocumentConfig};
///
/// let mut builder = DocumentBuilder::new(DocumentConfig::new())?;
/// builder.p("Shared by all backends.")?;
/// let doc = builder.finish();
///
/// for (name, artifact) in render_all(&doc) {
///     assert_eq!(artifact?.format(), name);
/// }
/// # Ok::<(), quire::Error>(())
/// ```
pub fn render_all(doc: &Document) -> Vec<(String, Result<Artifact>)> {
    BackendRegistry::with_defaults().render_all(doc, &RenderOptions::default())
}

/// Serialize a document to JSON.
///
/// # Example
///
/// ```
/// use quire::{to_json, DocumentBuilder, DocumentConfig, JsonFormat};
///
/// let doc = DocumentBuilder::new(DocumentConfig::new())?.finish();
/// let json = to_json(&doc, JsonFormat::Compact)?;
/// assert!(json.starts_with('{'));
/// # Ok::<(), quire::Error>(())
/// ```
pub fn to_json(doc: &Document, format: JsonFormat) -> Result<String> {
    render::to_json(doc, format)
}

/// Builder bundling a backend registry with render options.
///
/// # Example
///
/// ```
/// use quire::{Container, DocumentBuilder, DocumentConfig, Quire};
///
/// let mut builder = DocumentBuilder::new(DocumentConfig::new())?;
/// builder.p("Hello")?;
/// let doc = builder.finish();
///
/// let artifact = Quire::new()
///     .with_list_indent(24)
///     .without_annotations()
///     .render(&doc, "pdf")?;
/// assert_eq!(artifact.stats().paragraph_count, 1);
/// # Ok::<(), quire::Error>(())
/// ```
pub struct Quire {
    registry: BackendRegistry,
    render_options: RenderOptions,
}

impl Quire {
    /// Create a builder with the built-in backends and default options.
    pub fn new() -> Self {
        Self {
            registry: BackendRegistry::with_defaults(),
            render_options: RenderOptions::default(),
        }
    }

    /// Use a custom backend registry.
    pub fn with_registry(mut self, registry: BackendRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Add a backend to the registry.
    pub fn with_backend(mut self, backend: std::sync::Arc<dyn Backend>) -> Self {
        self.registry.register(backend);
        self
    }

    /// Replace the render options.
    pub fn with_options(mut self, options: RenderOptions) -> Self {
        self.render_options = options;
        self
    }

    /// Reject the comment style in the fixed-page backend.
    pub fn without_annotations(mut self) -> Self {
        self.render_options = self.render_options.with_page_annotations(false);
        self
    }

    /// Set the list indentation step.
    pub fn with_list_indent(mut self, indent: u32) -> Self {
        self.render_options = self.render_options.with_list_indent(indent);
        self
    }

    /// Set the e-book stylesheet.
    pub fn with_ebook_stylesheet(mut self, css: impl Into<String>) -> Self {
        self.render_options = self.render_options.with_ebook_stylesheet(css);
        self
    }

    /// Render with the backend registered under `name`.
    pub fn render(&self, doc: &Document, name: &str) -> Result<Artifact> {
        self.registry.render(name, doc, &self.render_options)
    }

    /// Render with every registered backend in parallel.
    pub fn render_all(&self, doc: &Document) -> Vec<(String, Result<Artifact>)> {
        self.registry.render_all(doc, &self.render_options)
    }

    /// Get the backend registry.
    pub fn registry(&self) -> &BackendRegistry {
        &self.registry
    }

    /// Get the render options.
    pub fn options(&self) -> &RenderOptions {
        &self.render_options
    }
}

impl Default for Quire {
    fn default() -> Self {
        Self::new()
    }
}
