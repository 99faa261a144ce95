//! Document model types.
//!
//! This module defines the format-agnostic tree that every backend renders:
//! sections own blocks and nested sections, blocks own inline content. The
//! model carries no numbering; numbers are derived from position at render
//! time.

mod config;
mod document;
mod list;
mod paragraph;
mod section;

pub use config::{DocumentConfig, MissingReferencePolicy, MAX_LEVEL};
pub use document::{Document, Metadata};
pub use list::{list_marker, to_roman, List, ListItem, NumberStyle};
pub use paragraph::{
    normalize_whitespace, Inline, Paragraph, ParagraphKind, Style, TextStyle,
};
pub use section::{Block, Node, Section, SectionPath};
