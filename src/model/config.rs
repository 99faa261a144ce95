//! Document configuration.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Deepest heading level any backend distinguishes.
pub const MAX_LEVEL: u8 = 6;

/// Configuration consumed at document creation.
///
/// Every recognized option is enumerated here; deserialization rejects
/// unknown keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DocumentConfig {
    /// Document title
    pub title: Option<String>,

    /// Line shown under the title
    pub subtitle: Option<String>,

    /// Authors in display order
    pub authors: Vec<String>,

    /// Version string shown on the title page
    pub version: Option<String>,

    /// Unique identifier (URI, ISBN, ...)
    pub identifier: Option<String>,

    /// Language tag (e.g. "en", "sv-SE")
    pub language: String,

    /// Prefix section headings with their number
    pub section_numbers: bool,

    /// Prefix body paragraphs with their number
    pub paragraph_numbers: bool,

    /// Deepest section level listed in the table of contents (0 = no TOC)
    pub toc_level: u8,

    /// Heading of the table of contents
    pub toc_title: String,

    /// Sections at this depth or shallower start a new page
    pub page_break_level: u8,

    /// Emit the bibliography as back matter
    pub bibliography: bool,

    /// Heading of the bibliography
    pub bibliography_title: String,

    /// Emit the back-of-book index as back matter
    pub index: bool,

    /// Heading of the index
    pub index_title: String,

    /// Heading of flushed footnote blocks
    pub footnotes_title: String,

    /// What to do with citations the references collaborator cannot resolve
    pub missing_references: MissingReferencePolicy,
}

impl DocumentConfig {
    /// Create a configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse and validate a JSON configuration object.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: DocumentConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject option values no backend can honour.
    pub fn validate(&self) -> Result<()> {
        if self.toc_level > MAX_LEVEL {
            return Err(Error::InvalidConfig(format!(
                "toc_level {} exceeds maximum heading level {}",
                self.toc_level, MAX_LEVEL
            )));
        }
        if self.page_break_level > MAX_LEVEL {
            return Err(Error::InvalidConfig(format!(
                "page_break_level {} exceeds maximum heading level {}",
                self.page_break_level, MAX_LEVEL
            )));
        }
        if self.authors.iter().any(|a| a.trim().is_empty()) {
            return Err(Error::InvalidConfig("author names must not be blank".into()));
        }
        Ok(())
    }

    /// Set the title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set the subtitle.
    pub fn with_subtitle(mut self, subtitle: impl Into<String>) -> Self {
        self.subtitle = Some(subtitle.into());
        self
    }

    /// Append an author.
    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.authors.push(author.into());
        self
    }

    /// Set the version string.
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Set the identifier.
    pub fn with_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.identifier = Some(identifier.into());
        self
    }

    /// Set the language tag.
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    /// Enable or disable section numbering.
    pub fn with_section_numbers(mut self, enabled: bool) -> Self {
        self.section_numbers = enabled;
        self
    }

    /// Enable or disable paragraph numbering.
    pub fn with_paragraph_numbers(mut self, enabled: bool) -> Self {
        self.paragraph_numbers = enabled;
        self
    }

    /// Set the table of contents depth (0 disables it).
    pub fn with_toc(mut self, level: u8, title: impl Into<String>) -> Self {
        self.toc_level = level;
        self.toc_title = title.into();
        self
    }

    /// Set the page break threshold.
    pub fn with_page_break_level(mut self, level: u8) -> Self {
        self.page_break_level = level;
        self
    }

    /// Enable or disable the bibliography.
    pub fn with_bibliography(mut self, enabled: bool) -> Self {
        self.bibliography = enabled;
        self
    }

    /// Enable or disable the index.
    pub fn with_index(mut self, enabled: bool) -> Self {
        self.index = enabled;
        self
    }

    /// Set the policy for unresolvable citations.
    pub fn with_missing_references(mut self, policy: MissingReferencePolicy) -> Self {
        self.missing_references = policy;
        self
    }
}

impl Default for DocumentConfig {
    fn default() -> Self {
        Self {
            title: None,
            subtitle: None,
            authors: Vec::new(),
            version: None,
            identifier: None,
            language: "en".to_string(),
            section_numbers: false,
            paragraph_numbers: false,
            toc_level: 0,
            toc_title: "Contents".to_string(),
            page_break_level: 1,
            bibliography: true,
            bibliography_title: "References".to_string(),
            index: true,
            index_title: "Index".to_string(),
            footnotes_title: "Footnotes".to_string(),
            missing_references: MissingReferencePolicy::default(),
        }
    }
}

/// Handling of citation keys the references collaborator cannot resolve.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingReferencePolicy {
    /// Render a visible `[ref? key]` marker and leave it out of the bibliography
    #[default]
    Placeholder,
    /// Fail the citation call with `ReferenceNotFound`
    Error,
}
