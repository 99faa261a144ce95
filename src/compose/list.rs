//! List and list item handles.

use super::{BuildState, Container, Dest, ListDest, Parts};
use crate::error::{Error, Result};
use crate::model::{List, ListItem, SectionPath};

/// An open list.
pub struct ListHandle<'a> {
    state: &'a mut BuildState,
    dest: ListDest<'a>,
    section: SectionPath,
    list: Option<List>,
}

impl<'a> ListHandle<'a> {
    pub(crate) fn open(
        state: &'a mut BuildState,
        dest: ListDest<'a>,
        section: SectionPath,
        ordered: bool,
    ) -> Self {
        Self {
            state,
            dest,
            section,
            list: Some(List::new(ordered)),
        }
    }

    /// Check if the list has been finalized.
    pub fn is_closed(&self) -> bool {
        self.list.is_none()
    }

    /// Open the next item.
    pub fn item(&mut self) -> Result<ListItemHandle<'_>> {
        let list = self.list.as_mut().ok_or_else(|| Error::closed("list"))?;
        Ok(ListItemHandle {
            state: &mut *self.state,
            items: &mut list.items,
            section: self.section.clone(),
            item: Some(ListItem::new()),
        })
    }

    /// Build an item inside a closure; it is finalized on every exit path.
    pub fn with_item<F, T>(&mut self, f: F) -> Result<T>
    where
        F: FnOnce(&mut ListItemHandle<'_>) -> Result<T>,
    {
        let mut item = self.item()?;
        let value = f(&mut item)?;
        item.close()?;
        Ok(value)
    }

    /// Add an item holding one paragraph of `text`.
    pub fn item_text(&mut self, text: &str) -> Result<&mut Self> {
        self.with_item(|item| item.p(text))?;
        Ok(self)
    }

    /// Finalize the list. An empty list leaves no trace.
    pub fn close(&mut self) -> Result<()> {
        let list = self.list.take().ok_or_else(|| Error::closed("list"))?;
        if !list.is_empty() {
            self.dest.push(list);
        }
        Ok(())
    }
}

impl Drop for ListHandle<'_> {
    fn drop(&mut self) {
        if let Some(list) = self.list.take() {
            if !list.is_empty() {
                self.dest.push(list);
            }
        }
    }
}

/// An open list item.
///
/// Items hold blocks and at most one nested list.
pub struct ListItemHandle<'a> {
    state: &'a mut BuildState,
    items: &'a mut Vec<ListItem>,
    section: SectionPath,
    item: Option<ListItem>,
}

impl ListItemHandle<'_> {
    /// Check if the item has been finalized.
    pub fn is_closed(&self) -> bool {
        self.item.is_none()
    }

    /// Finalize the item and append it to its list.
    pub fn close(&mut self) -> Result<()> {
        let item = self.item.take().ok_or_else(|| Error::closed("list item"))?;
        self.items.push(item);
        Ok(())
    }
}

impl Container for ListItemHandle<'_> {
    fn parts(&mut self) -> Result<Parts<'_>> {
        let item = self.item.as_mut().ok_or_else(|| Error::closed("list item"))?;
        Ok(Parts {
            state: &mut *self.state,
            dest: Dest::Blocks(&mut item.blocks),
            section: self.section.clone(),
        })
    }

    /// Open the nested list of this item. An item takes one nested list;
    /// asking for a second fails with [`Error::ClosedNodeMutation`].
    fn list(&mut self, ordered: bool) -> Result<ListHandle<'_>> {
        let item = self.item.as_mut().ok_or_else(|| Error::closed("list item"))?;
        if item.sublist.is_some() {
            return Err(Error::closed("nested list"));
        }
        Ok(ListHandle::open(
            &mut *self.state,
            ListDest::Sublist(&mut item.sublist),
            self.section.clone(),
            ordered,
        ))
    }
}

impl Drop for ListItemHandle<'_> {
    fn drop(&mut self) {
        if let Some(item) = self.item.take() {
            self.items.push(item);
        }
    }
}
