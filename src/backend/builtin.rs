//! Built-in backends.

use super::Backend;
use crate::error::Result;
use crate::model::Document;
use crate::render::{ebook, page, word, Artifact, RenderOptions};

/// Word-processor backend.
///
/// Flushes footnotes at the end of their section and honours `docx` page
/// directives.
#[derive(Debug, Clone, Default)]
pub struct WordBackend {
    _private: (),
}

impl WordBackend {
    /// Create a new word-processor backend.
    pub fn new() -> Self {
        Self { _private: () }
    }
}

impl Backend for WordBackend {
    fn name(&self) -> &str {
        "docx"
    }

    fn supported_extensions(&self) -> &[&str] {
        &["docx"]
    }

    fn media_type(&self) -> &'static str {
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
    }

    fn render(&self, doc: &Document, options: &RenderOptions) -> Result<Artifact> {
        word::render(doc, options).map(Artifact::Docx)
    }
}

/// Fixed-page backend.
///
/// Places footnotes at the bottom of the anchoring page and honours `pdf`
/// page directives.
#[derive(Debug, Clone, Default)]
pub struct PageBackend {
    _private: (),
}

impl PageBackend {
    /// Create a new fixed-page backend.
    pub fn new() -> Self {
        Self { _private: () }
    }
}

impl Backend for PageBackend {
    fn name(&self) -> &str {
        "pdf"
    }

    fn supported_extensions(&self) -> &[&str] {
        &["pdf"]
    }

    fn media_type(&self) -> &'static str {
        "application/pdf"
    }

    fn render(&self, doc: &Document, options: &RenderOptions) -> Result<Artifact> {
        page::render(doc, options).map(Artifact::Pdf)
    }
}

/// Reflowable e-book backend.
///
/// Emits footnotes as popups after their anchoring block and honours `epub`
/// page directives.
#[derive(Debug, Clone, Default)]
pub struct EbookBackend {
    _private: (),
}

impl EbookBackend {
    /// Create a new e-book backend.
    pub fn new() -> Self {
        Self { _private: () }
    }
}

impl Backend for EbookBackend {
    fn name(&self) -> &str {
        "epub"
    }

    fn supported_extensions(&self) -> &[&str] {
        &["epub"]
    }

    fn media_type(&self) -> &'static str {
        "application/epub+zip"
    }

    fn render(&self, doc: &Document, options: &RenderOptions) -> Result<Artifact> {
        ebook::render(doc, options).map(Artifact::Epub)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compose::{Container, DocumentBuilder};
    use crate::model::DocumentConfig;

    #[test]
    fn test_backends_produce_their_format() {
        let mut b = DocumentBuilder::new(DocumentConfig::new()).unwrap();
        b.p("Hello").unwrap();
        let doc = b.finish();
        let options = RenderOptions::default();

        let backends: Vec<Box<dyn Backend>> = vec![
            Box::new(WordBackend::new()),
            Box::new(PageBackend::new()),
            Box::new(EbookBackend::new()),
        ];
        for backend in backends {
            let artifact = backend.render(&doc, &options).unwrap();
            assert_eq!(artifact.format(), backend.name());
            assert_eq!(artifact.stats().paragraph_count, 1);
        }
    }
}
