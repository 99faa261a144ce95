//! List types and marker derivation.

use super::Block;
use serde::{Deserialize, Serialize};

/// An ordered or unordered list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct List {
    /// Whether items are numbered
    pub ordered: bool,

    /// Items in document order
    pub items: Vec<ListItem>,
}

impl List {
    /// Create a new empty list.
    pub fn new(ordered: bool) -> Self {
        Self {
            ordered,
            items: Vec::new(),
        }
    }

    /// Check if the list has no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Total number of items, including nested lists.
    pub fn total_items(&self) -> usize {
        self.items
            .iter()
            .map(|item| 1 + item.sublist.as_ref().map_or(0, List::total_items))
            .sum()
    }

    /// Deepest nesting level below and including this list (1 for a flat list).
    pub fn depth(&self) -> usize {
        1 + self
            .items
            .iter()
            .filter_map(|item| item.sublist.as_ref())
            .map(List::depth)
            .max()
            .unwrap_or(0)
    }
}

/// A single list item.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListItem {
    /// Blocks making up the item body
    pub blocks: Vec<Block>,

    /// Optional nested list, rendered after the body
    pub sublist: Option<List>,
}

impl ListItem {
    /// Create a new empty item.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get plain text content of the item body.
    pub fn plain_text(&self) -> String {
        self.blocks
            .iter()
            .map(Block::plain_text)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Number style for ordered lists.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NumberStyle {
    /// 1, 2, 3, ...
    #[default]
    Decimal,
    /// a, b, c, ...
    LowerAlpha,
    /// i, ii, iii, ...
    LowerRoman,
}

impl NumberStyle {
    /// Number style used at a nesting depth (1 = outermost).
    pub fn for_depth(depth: usize) -> Self {
        match depth.saturating_sub(1) % 3 {
            0 => NumberStyle::Decimal,
            1 => NumberStyle::LowerAlpha,
            _ => NumberStyle::LowerRoman,
        }
    }

    /// Format a 1-based item number.
    pub fn format(&self, number: u32) -> String {
        match self {
            NumberStyle::Decimal => number.to_string(),
            NumberStyle::LowerAlpha => to_alpha(number),
            NumberStyle::LowerRoman => to_roman(number).to_lowercase(),
        }
    }
}

const BULLETS: [char; 3] = ['\u{2022}', '\u{25e6}', '\u{25aa}'];

/// Marker for the `index`-th item (1-based) of a list at `depth` (1-based).
///
/// Ordered lists cycle decimal, alphabetic and roman numbering with depth;
/// unordered lists cycle bullet glyphs.
pub fn list_marker(ordered: bool, depth: usize, index: u32) -> String {
    if ordered {
        format!("{}.", NumberStyle::for_depth(depth).format(index))
    } else {
        BULLETS[depth.saturating_sub(1) % BULLETS.len()].to_string()
    }
}

/// Bijective base-26 lettering: 1 = a, 26 = z, 27 = aa.
fn to_alpha(mut num: u32) -> String {
    let mut letters = Vec::new();
    while num > 0 {
        num -= 1;
        letters.push((b'a' + (num % 26) as u8) as char);
        num /= 26;
    }
    letters.iter().rev().collect()
}

/// Convert number to Roman numerals.
pub fn to_roman(mut num: u32) -> String {
    let numerals = [
        (1000, "M"),
        (900, "CM"),
        (500, "D"),
        (400, "CD"),
        (100, "C"),
        (90, "XC"),
        (50, "L"),
        (40, "XL"),
        (10, "X"),
        (9, "IX"),
        (5, "V"),
        (4, "IV"),
        (1, "I"),
    ];

    let mut result = String::new();
    for (value, symbol) in numerals {
        while num >= value {
            result.push_str(symbol);
            num -= value;
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Paragraph;

    #[test]
    fn test_to_roman() {
        assert_eq!(to_roman(1), "I");
        assert_eq!(to_roman(4), "IV");
        assert_eq!(to_roman(14), "XIV");
        assert_eq!(to_roman(2024), "MMXXIV");
    }

    #[test]
    fn test_to_alpha() {
        assert_eq!(to_alpha(1), "a");
        assert_eq!(to_alpha(26), "z");
        assert_eq!(to_alpha(27), "aa");
    }

    #[test]
    fn test_list_marker_by_depth() {
        assert_eq!(list_marker(true, 1, 3), "3.");
        assert_eq!(list_marker(true, 2, 2), "b.");
        assert_eq!(list_marker(true, 3, 4), "iv.");
        assert_eq!(list_marker(true, 4, 1), "1.");
        assert_eq!(list_marker(false, 1, 9), "\u{2022}");
        assert_eq!(list_marker(false, 2, 1), "\u{25e6}");
    }

    #[test]
    fn test_list_depth_and_count() {
        let mut inner = List::new(false);
        inner.items.push(ListItem::new());
        let mut item = ListItem::new();
        item.blocks
            .push(Block::Paragraph(Paragraph::with_text("Third item.")));
        item.sublist = Some(inner);

        let mut outer = List::new(true);
        outer.items.push(ListItem::new());
        outer.items.push(item);

        assert_eq!(outer.total_items(), 3);
        assert_eq!(outer.depth(), 2);
    }
}
