//! Footnote body handles.

use super::{BuildState, Container, Dest, Parts};
use crate::error::{Error, Result};
use crate::model::{Block, SectionPath};

/// The body of a footnote under construction.
///
/// Handed to the closure passed to
/// [`ParagraphHandle::footnote`](super::ParagraphHandle::footnote). Body
/// paragraphs are not flow-numbered.
pub struct FootnoteHandle<'a> {
    state: &'a mut BuildState,
    body: &'a mut Vec<Block>,
    section: SectionPath,
    number: u32,
    closed: bool,
}

impl<'a> FootnoteHandle<'a> {
    pub(crate) fn new(
        state: &'a mut BuildState,
        body: &'a mut Vec<Block>,
        section: SectionPath,
        number: u32,
    ) -> Self {
        Self {
            state,
            body,
            section,
            number,
            closed: false,
        }
    }

    /// Number of the footnote being built.
    pub fn number(&self) -> u32 {
        self.number
    }

    /// Stop accepting body content.
    pub fn close(&mut self) -> Result<()> {
        if self.closed {
            return Err(Error::closed("footnote"));
        }
        self.closed = true;
        Ok(())
    }
}

impl Container for FootnoteHandle<'_> {
    fn parts(&mut self) -> Result<Parts<'_>> {
        if self.closed {
            return Err(Error::closed("footnote"));
        }
        Ok(Parts {
            state: &mut *self.state,
            dest: Dest::Blocks(&mut *self.body),
            section: self.section.clone(),
        })
    }
}
