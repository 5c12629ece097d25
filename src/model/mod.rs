//! Value types exposed to callers.
//!
//! Geometry primitives plus the immutable records produced by document,
//! page and search queries.

mod geometry;
mod records;

pub use geometry::{Point, Rect, Rotation, Size, Viewport};
pub use records::{BookmarkNode, Link, MetaInfo, SearchResult};
