//! Rendering options and configuration.

/// Default stylesheet shipped with e-book output.
pub const DEFAULT_EBOOK_STYLESHEET: &str = "body {
  color: black;
  background-color: white;
  font-family: Arial, Helvetica, sans-serif;
}
blockquote {
  font-family: \"Times New Roman\", serif;
}
span.comment {
  background-color: #ffffcc;
}
aside {
  font-size: smaller;
}
";

/// Backend knobs that are independent of the document configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOptions {
    /// Let the fixed-page backend express `comment` spans as annotations.
    /// When disabled the backend rejects them with `UnsupportedStyle`.
    pub page_annotations: bool,

    /// Stylesheet for e-book output (`None` = built-in)
    pub ebook_stylesheet: Option<String>,

    /// Indentation per nesting level for lists and TOC lines, in points
    pub list_indent: u32,
}

impl RenderOptions {
    /// Create new render options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable annotation support in the fixed-page backend.
    pub fn with_page_annotations(mut self, enabled: bool) -> Self {
        self.page_annotations = enabled;
        self
    }

    /// Replace the e-book stylesheet.
    pub fn with_ebook_stylesheet(mut self, css: impl Into<String>) -> Self {
        self.ebook_stylesheet = Some(css.into());
        self
    }

    /// Set the per-level indentation.
    pub fn with_list_indent(mut self, points: u32) -> Self {
        self.list_indent = points;
        self
    }

    /// Stylesheet the e-book backend will embed.
    pub fn stylesheet(&self) -> &str {
        self.ebook_stylesheet
            .as_deref()
            .unwrap_or(DEFAULT_EBOOK_STYLESHEET)
    }
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            page_annotations: true,
            ebook_stylesheet: None,
            list_indent: 18,
        }
    }
}
