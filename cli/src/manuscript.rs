//! JSON manuscripts replayed through the builder API.
//!
//! A manuscript holds a `config` object and a `body` of nodes:
//!
//! ```json
//! {
//!   "config": { "title": "Opus", "toc_level": 2 },
//!   "body": [
//!     { "type": "section", "title": "Intro", "subtitle": "Where it starts", "body": [
//!       { "type": "paragraph", "content": [
//!         "Plain text",
//!         { "type": "emdash" },
//!         { "type": "styled", "style": "bold", "content": ["loud"] },
//!         { "type": "footnote", "body": [{ "type": "paragraph", "content": ["note"] }] }
//!       ]},
//!       { "type": "thematic_break" },
//!       { "type": "page_break" }
//!     ]}
//!   ]
//! }
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use quire::{
    Container, Document, DocumentBuilder, DocumentConfig, Error, Flow, ParagraphHandle,
    ReferenceSource, Result, SectionHandle, Style,
};
use serde::Deserialize;

/// A document description.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manuscript {
    #[serde(default)]
    pub config: DocumentConfig,

    #[serde(default)]
    pub body: Vec<NodeSpec>,
}

/// A body node.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", deny_unknown_fields)]
pub enum NodeSpec {
    Section {
        title: String,
        #[serde(default)]
        subtitle: Option<String>,
        /// Page directives keyed by backend
        #[serde(default)]
        pages: BTreeMap<String, u32>,
        #[serde(default)]
        body: Vec<NodeSpec>,
    },
    Paragraph {
        #[serde(default)]
        content: Vec<InlineSpec>,
    },
    Quote {
        #[serde(default)]
        content: Vec<InlineSpec>,
    },
    List(ListSpec),
    /// Body and sections only
    PageBreak,
    /// Body and sections only
    ThematicBreak,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ListSpec {
    #[serde(default)]
    pub ordered: bool,
    #[serde(default)]
    pub items: Vec<ItemSpec>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ItemSpec {
    /// Shorthand for a single paragraph body
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub body: Vec<NodeSpec>,
    #[serde(default)]
    pub sublist: Option<ListSpec>,
}

/// Inline content: bare strings are text.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum InlineSpec {
    Text(String),
    Node(InlineNode),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", deny_unknown_fields)]
pub enum InlineNode {
    Text {
        text: String,
    },
    /// Text appended without a separating space
    Raw {
        text: String,
    },
    Styled {
        style: Style,
        #[serde(default)]
        content: Vec<InlineSpec>,
    },
    Link {
        uri: String,
        text: String,
    },
    Index {
        text: String,
        #[serde(default)]
        canonical: Option<String>,
    },
    Cite {
        key: String,
    },
    Footnote {
        #[serde(default)]
        body: Vec<NodeSpec>,
    },
    Period,
    LineBreak,
    Emdash,
}

impl Manuscript {
    /// Read a manuscript file.
    pub fn load(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Parse a manuscript. Configuration keys are validated here.
    pub fn from_json(json: &str) -> Result<Self> {
        let manuscript: Manuscript = serde_json::from_str(json)?;
        manuscript.config.validate()?;
        Ok(manuscript)
    }

    /// Replay the manuscript into a finished document.
    pub fn build(&self, references: Option<Arc<dyn ReferenceSource>>) -> Result<Document> {
        let mut builder = DocumentBuilder::new(self.config.clone())?;
        if let Some(source) = references {
            builder = builder.with_references(source);
        }
        for node in &self.body {
            match node {
                NodeSpec::Section { title, .. } => {
                    builder.with_section(title, |s| replay_section(s, node))?;
                }
                other => replay_flow(&mut builder, other)?,
            }
        }
        Ok(builder.finish())
    }
}

fn replay_section(section: &mut SectionHandle<'_>, spec: &NodeSpec) -> Result<()> {
    let NodeSpec::Section {
        subtitle,
        pages,
        body,
        ..
    } = spec
    else {
        return Ok(());
    };
    if let Some(subtitle) = subtitle {
        section.set_subtitle(subtitle)?;
    }
    for (key, page) in pages {
        section.set_page(key, *page)?;
    }
    for node in body {
        match node {
            NodeSpec::Section { title, .. } => {
                section.with_section(title, |s| replay_section(s, node))?;
            }
            other => replay_flow(section, other)?,
        }
    }
    Ok(())
}

fn replay_flow<F: Flow>(flow: &mut F, node: &NodeSpec) -> Result<()> {
    match node {
        NodeSpec::PageBreak => flow.page_break(),
        NodeSpec::ThematicBreak => flow.thematic_break(),
        block => replay_block(flow, block),
    }
}

fn replay_block<C: Container>(container: &mut C, node: &NodeSpec) -> Result<()> {
    match node {
        NodeSpec::Section { title, .. } => Err(Error::InvalidConfig(format!(
            "section {:?} may only appear in the body or inside another section",
            title
        ))),
        NodeSpec::PageBreak | NodeSpec::ThematicBreak => Err(Error::InvalidConfig(
            "breaks may only appear in the body or inside a section".into(),
        )),
        NodeSpec::Paragraph { content } => {
            container.with_paragraph(|p| replay_inlines(p, content))
        }
        NodeSpec::Quote { content } => container.with_quote(|p| replay_inlines(p, content)),
        NodeSpec::List(list) => replay_list(container, list),
    }
}

fn replay_list<C: Container>(container: &mut C, entries: &ListSpec) -> Result<()> {
    container.with_list(entries.ordered, |list| {
        for item in &entries.items {
            list.with_item(|handle| {
                if let Some(text) = &item.text {
                    handle.p(text)?;
                }
                for node in &item.body {
                    replay_block(handle, node)?;
                }
                if let Some(sublist) = &item.sublist {
                    replay_list(handle, sublist)?;
                }
                Ok(())
            })?;
        }
        Ok(())
    })
}

fn replay_inlines(p: &mut ParagraphHandle<'_>, content: &[InlineSpec]) -> Result<()> {
    for inline in content {
        match inline {
            InlineSpec::Text(text) => {
                p.text(text)?;
            }
            InlineSpec::Node(node) => replay_inline(p, node)?,
        }
    }
    Ok(())
}

fn replay_inline(p: &mut ParagraphHandle<'_>, node: &InlineNode) -> Result<()> {
    match node {
        InlineNode::Text { text } => {
            p.text(text)?;
        }
        InlineNode::Raw { text } => {
            p.raw(text)?;
        }
        InlineNode::Styled { style, content } => {
            p.styled(*style, |inner| replay_inlines(inner, content))?;
        }
        InlineNode::Link { uri, text } => {
            p.link(uri, text)?;
        }
        InlineNode::Index { text, canonical } => {
            p.indexed_as(text, canonical.as_deref().unwrap_or(text))?;
        }
        InlineNode::Cite { key } => {
            p.citation(key)?;
        }
        InlineNode::Footnote { body } => {
            p.footnote(|note| {
                for node in body {
                    replay_block(note, node)?;
                }
                Ok(())
            })?;
        }
        InlineNode::Period => {
            p.period()?;
        }
        InlineNode::LineBreak => {
            p.line_break()?;
        }
        InlineNode::Emdash => {
            p.emdash()?;
        }
    }
    Ok(())
}
