//! Section handles.

use super::{BuildState, Container, Dest, Flow, Parts};
use crate::error::{Error, Result};
use crate::model::{normalize_whitespace, Node, Section, SectionPath};

/// An open section.
///
/// Obtained from [`DocumentBuilder::section`](super::DocumentBuilder::section)
/// or [`SectionHandle::section`]. The section is appended to its parent when
/// the handle is closed or dropped.
pub struct SectionHandle<'a> {
    state: &'a mut BuildState,
    parent: &'a mut Vec<Node>,
    path: SectionPath,
    section: Option<Section>,
    subsections: u32,
}

impl<'a> SectionHandle<'a> {
    pub(crate) fn open(
        state: &'a mut BuildState,
        parent: &'a mut Vec<Node>,
        path: SectionPath,
        title: &str,
    ) -> Self {
        let title = normalize_whitespace(title).trim().to_string();
        state.registries.toc.record(&path, &title);
        log::debug!("section {} opened: {:?}", path, title);
        let section = Section::new(title, path.depth());
        Self {
            state,
            parent,
            path,
            section: Some(section),
            subsections: 0,
        }
    }

    /// Position of this section in the tree.
    pub fn path(&self) -> &SectionPath {
        &self.path
    }

    /// Nesting depth (1 = top level).
    pub fn depth(&self) -> usize {
        self.path.depth()
    }

    /// Check if the section has been finalized.
    pub fn is_closed(&self) -> bool {
        self.section.is_none()
    }

    /// Open a child section at depth + 1.
    pub fn section(&mut self, title: &str) -> Result<SectionHandle<'_>> {
        let section = self.section.as_mut().ok_or_else(|| Error::closed("section"))?;
        self.subsections += 1;
        let path = self.path.child(self.subsections);
        Ok(SectionHandle::open(
            &mut *self.state,
            &mut section.children,
            path,
            title,
        ))
    }

    /// Build a child section inside a closure; it is finalized on every
    /// exit path.
    pub fn with_section<F, T>(&mut self, title: &str, f: F) -> Result<T>
    where
        F: FnOnce(&mut SectionHandle<'_>) -> Result<T>,
    {
        let mut child = self.section(title)?;
        let value = f(&mut child)?;
        child.close()?;
        Ok(value)
    }

    /// Ask the backend whose directive key is `key` to start this section on
    /// physical page `page`. Other backends ignore the directive.
    pub fn set_page(&mut self, key: &str, page: u32) -> Result<&mut Self> {
        let section = self.section.as_mut().ok_or_else(|| Error::closed("section"))?;
        section.page_directives.insert(key.to_string(), page);
        Ok(self)
    }

    /// Set the line shown under the heading. A blank subtitle clears it.
    pub fn set_subtitle(&mut self, subtitle: &str) -> Result<&mut Self> {
        let section = self.section.as_mut().ok_or_else(|| Error::closed("section"))?;
        let subtitle = normalize_whitespace(subtitle).trim().to_string();
        section.subtitle = (!subtitle.is_empty()).then_some(subtitle);
        Ok(self)
    }

    /// Finalize the section and append it to its parent.
    pub fn close(&mut self) -> Result<()> {
        let section = self.section.take().ok_or_else(|| Error::closed("section"))?;
        log::debug!("section {} closed", self.path);
        self.parent.push(Node::Section(section));
        Ok(())
    }
}

impl Container for SectionHandle<'_> {
    fn parts(&mut self) -> Result<Parts<'_>> {
        let section = self.section.as_mut().ok_or_else(|| Error::closed("section"))?;
        Ok(Parts {
            state: &mut *self.state,
            dest: Dest::Flow(&mut section.children),
            section: self.path.clone(),
        })
    }
}

impl Flow for SectionHandle<'_> {}

impl Drop for SectionHandle<'_> {
    fn drop(&mut self) {
        if let Some(section) = self.section.take() {
            self.parent.push(Node::Section(section));
        }
    }
}
