//! Backend registry providing a plugin architecture for output formats.
//!
//! Backends are registered under their name and file extensions. A registry
//! can render one backend by name or every registered backend at once; the
//! latter runs the backends in parallel against the same shared document.
//!
//! # Example
//!
//! ```
//! use quire::backend::BackendRegistry;
//! use quire::compose::{Container, DocumentBuilder};
//! use quire::model::DocumentConfig;
//! use quire::render::RenderOptions;
//!
//! let mut builder = DocumentBuilder::new(DocumentConfig::new().with_title("Opus"))?;
//! builder.with_section("Intro", |s| s.p("Hello"))?;
//! let doc = builder.finish();
//!
//! let registry = BackendRegistry::with_defaults();
//! let artifact = registry.render("epub", &doc, &RenderOptions::default())?;
//! assert_eq!(artifact.format(), "epub");
//! # Ok::<(), quire::Error>(())
//! ```

mod builtin;

pub use builtin::{EbookBackend, PageBackend, WordBackend};

use crate::error::{Error, Result};
use crate::model::Document;
use crate::render::{Artifact, RenderOptions};
use rayon::prelude::*;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// The built-in output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputFormat {
    /// Word-processor document
    Docx,
    /// Fixed-page document
    Pdf,
    /// Reflowable e-book
    Epub,
}

impl OutputFormat {
    /// Every built-in format.
    pub const ALL: [OutputFormat; 3] = [OutputFormat::Docx, OutputFormat::Pdf, OutputFormat::Epub];

    /// Backend name and directive key.
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Docx => "docx",
            OutputFormat::Pdf => "pdf",
            OutputFormat::Epub => "epub",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "docx" | "word" => Ok(OutputFormat::Docx),
            "pdf" | "page" => Ok(OutputFormat::Pdf),
            "epub" | "ebook" => Ok(OutputFormat::Epub),
            other => Err(Error::UnknownBackend(other.to_string())),
        }
    }
}

/// Trait for rendering backends.
///
/// Implement this trait to add support for a new output format. Backends
/// only read the document, so one document can be rendered by several
/// backends at the same time.
pub trait Backend: Send + Sync {
    /// Get the name of this backend. Also the key of the page directives it
    /// honours.
    fn name(&self) -> &str;

    /// Get the file extensions this backend produces.
    ///
    /// Extensions should be lowercase without the leading dot (e.g., `["pdf"]`).
    fn supported_extensions(&self) -> &[&str];

    /// MIME type of the encoded output.
    fn media_type(&self) -> &'static str;

    /// Render a finished document.
    fn render(&self, doc: &Document, options: &RenderOptions) -> Result<Artifact>;

    /// Check if this backend produces the given extension.
    fn supports_extension(&self, ext: &str) -> bool {
        let ext_lower = ext.to_lowercase();
        self.supported_extensions().iter().any(|e| *e == ext_lower)
    }
}

/// Registry for rendering backends.
pub struct BackendRegistry {
    backends: HashMap<String, Arc<dyn Backend>>,
    by_name: HashMap<String, Arc<dyn Backend>>,
    order: Vec<String>,
}

impl BackendRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            backends: HashMap::new(),
            by_name: HashMap::new(),
            order: Vec::new(),
        }
    }

    /// Create a registry with the word-processor, fixed-page and e-book
    /// backends.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(WordBackend::new()));
        registry.register(Arc::new(PageBackend::new()));
        registry.register(Arc::new(EbookBackend::new()));
        registry
    }

    /// Register a backend.
    ///
    /// The backend will be registered for all its supported extensions. A
    /// backend registered under an existing name replaces the old one.
    pub fn register(&mut self, backend: Arc<dyn Backend>) {
        for ext in backend.supported_extensions() {
            self.backends.insert(ext.to_lowercase(), backend.clone());
        }
        let name = backend.name().to_lowercase();
        if !self.order.contains(&name) {
            self.order.push(name.clone());
        }
        self.by_name.insert(name, backend);
    }

    /// Get a backend by file extension.
    pub fn get_by_extension(&self, ext: &str) -> Option<Arc<dyn Backend>> {
        self.backends.get(&ext.to_lowercase()).cloned()
    }

    /// Get a backend by name.
    pub fn get_by_name(&self, name: &str) -> Option<Arc<dyn Backend>> {
        self.by_name.get(&name.to_lowercase()).cloned()
    }

    /// Check if an extension is supported.
    pub fn supports(&self, ext: &str) -> bool {
        self.backends.contains_key(&ext.to_lowercase())
    }

    /// Names of registered backends in registration order.
    pub fn names(&self) -> &[String] {
        &self.order
    }

    /// Render with the backend registered under `name`.
    pub fn render(&self, name: &str, doc: &Document, options: &RenderOptions) -> Result<Artifact> {
        let backend = self
            .get_by_name(name)
            .or_else(|| self.get_by_extension(name))
            .ok_or_else(|| Error::UnknownBackend(name.to_string()))?;
        backend.render(doc, options)
    }

    /// Render the named backends in parallel.
    ///
    /// Results come back in the order of `names`; one backend failing does
    /// not affect the others.
    pub fn render_selected(
        &self,
        names: &[&str],
        doc: &Document,
        options: &RenderOptions,
    ) -> Vec<(String, Result<Artifact>)> {
        names
            .par_iter()
            .map(|name| {
                log::debug!("rendering backend {}", name);
                (name.to_string(), self.render(name, doc, options))
            })
            .collect()
    }

    /// Render every registered backend in parallel.
    pub fn render_all(
        &self,
        doc: &Document,
        options: &RenderOptions,
    ) -> Vec<(String, Result<Artifact>)> {
        let names: Vec<&str> = self.order.iter().map(String::as_str).collect();
        self.render_selected(&names, doc, options)
    }
}

impl Default for BackendRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_with_defaults() {
        let registry = BackendRegistry::with_defaults();
        assert!(registry.supports("pdf"));
        assert!(registry.supports("DOCX"));
        assert!(registry.supports("epub"));
        assert!(!registry.supports("odt"));
        assert_eq!(registry.names(), &["docx", "pdf", "epub"]);
    }

    #[test]
    fn test_registry_get_by_name() {
        let registry = BackendRegistry::with_defaults();
        let backend = registry.get_by_name("epub");
        assert!(backend.is_some());
        assert_eq!(backend.unwrap().media_type(), "application/epub+zip");
    }

    #[test]
    fn test_unknown_backend() {
        let registry = BackendRegistry::new();
        let doc = crate::compose::DocumentBuilder::new(Default::default())
            .unwrap()
            .finish();
        let err = registry
            .render("odt", &doc, &RenderOptions::default())
            .unwrap_err();
        assert!(matches!(err, Error::UnknownBackend(ref name) if name == "odt"));
    }

    #[test]
    fn test_output_format_parse() {
        assert_eq!("PDF".parse::<OutputFormat>().unwrap(), OutputFormat::Pdf);
        assert_eq!("ebook".parse::<OutputFormat>().unwrap(), OutputFormat::Epub);
        assert!("rtf".parse::<OutputFormat>().is_err());
        assert_eq!(OutputFormat::Docx.to_string(), "docx");
    }
}
