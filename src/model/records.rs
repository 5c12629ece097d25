//! Immutable value records returned by document queries.
//!
//! None of these types hold a native handle; they are plain data owned by
//! the caller and stay valid after the component that produced them is
//! closed.

use super::Rect;
use serde::{Deserialize, Serialize};

/// Document information dictionary fields.
///
/// Every field is queried individually; a field absent from the document is
/// an empty string, never an error. Date fields carry the raw PDF date
/// string (e.g. `D:20240131120000Z`) untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetaInfo {
    /// Document title
    pub title: String,

    /// Document author
    pub author: String,

    /// Document subject
    pub subject: String,

    /// Keywords
    pub keywords: String,

    /// Creator application
    pub creator: String,

    /// Producer application
    pub producer: String,

    /// Creation date (raw PDF date string)
    pub creation_date: String,

    /// Last modification date (raw PDF date string)
    pub mod_date: String,
}

/// A link annotation on a page.
///
/// A destination page index of `0` means "no internal destination"; such a
/// link is only surfaced when it carries a URI instead. Links with neither
/// are dropped before reaching the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link {
    /// Bounding rectangle in page coordinates
    pub bounds: Rect,

    /// Destination page index (0 = no internal destination)
    pub dest_page_index: u32,

    /// External URI target, if any (never `Some("")`)
    pub uri: Option<String>,
}

/// One match reported by a search cursor.
///
/// Snapshot of the cursor position at the time of the `find_next` /
/// `find_prev` call; the next cursor movement repositions destructively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    /// Character index of the first matched character on the page
    pub start_index: u32,

    /// Number of matched characters
    pub length: u32,
}

/// A node of the document outline (bookmark tree).
///
/// Materialized eagerly from the native child/sibling pointer structure;
/// sibling order is preserved and the tree is detached from the engine once
/// built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookmarkNode {
    /// Bookmark title
    pub title: String,

    /// Destination page index
    pub dest_page_index: u32,

    /// Child bookmarks, in document order
    pub children: Vec<BookmarkNode>,
}

impl BookmarkNode {
    /// Create a leaf node.
    pub fn new(title: impl Into<String>, dest_page_index: u32) -> Self {
        Self {
            title: title.into(),
            dest_page_index,
            children: Vec::new(),
        }
    }

    /// Total number of nodes in this subtree, including `self`.
    pub fn total_nodes(&self) -> usize {
        1 + self
            .children
            .iter()
            .map(BookmarkNode::total_nodes)
            .sum::<usize>()
    }
}
