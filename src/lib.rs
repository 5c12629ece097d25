//! # pdfgate
//!
//! Safety and lifecycle layer between application code and a native
//! document-rendering engine.
//!
//! The native engine does the actual parsing, layout and rasterization;
//! this crate manages what makes such engines hard to use correctly:
//!
//! - **Hierarchical handle ownership**: document → page → text page →
//!   search cursor. Every handle is used only while its owner is alive and
//!   released exactly once; a parent refuses to close while children still
//!   hold native handles nested inside it.
//! - **Global serialization**: the engine is not thread-safe, so every
//!   native call in the process funnels through one gate. Concurrent
//!   callers are serialized, never parallelized.
//! - **Leak-free partial failure**: if multi-step initialization fails
//!   midway, the half-constructed native resource is released before the
//!   error propagates.
//! - **Fail-fast on misuse**: operations on a closed component return
//!   [`Error::Closed`] without ever reaching the native layer; double
//!   close is a harmless no-op.
//!
//! The concrete engine is bound through the [`NativeBackend`] trait; this
//! crate ships no FFI binding of its own.
//!
//! ## Quick Start
//!
//! ```ignore
//! use pdfgate::{Engine, Rotation, SearchFlags, SearchStart, Viewport};
//!
//! let engine = Engine::new(my_backend);
//! let doc = engine.open_buffer(std::fs::read("document.pdf")?, None)?;
//!
//! println!("{} pages", doc.page_count());
//! for root in doc.bookmarks()? {
//!     println!("- {}", root.title);
//! }
//!
//! let page = doc.open_page(0)?;
//! let text = page.open_text()?;
//! let mut search = text.search("query", SearchStart::Index(0), SearchFlags::default())?;
//! while let Some(hit) = search.find_next()? {
//!     println!("match at {} (+{})", hit.start_index, hit.length);
//! }
//! ```

pub mod engine;
pub mod error;
pub mod model;

mod document;
mod page;
mod search;
mod text;

// Re-export commonly used types
pub use document::Document;
pub use engine::{
    BookmarkHandle, DocumentHandle, Engine, InputStream, LinkHandle, NativeBackend, PageHandle,
    PixelBuffer, SearchFlags, SearchHandle, SurfaceHandle, TextHandle,
};
pub use error::{Error, Result};
pub use model::{
    BookmarkNode, Link, MetaInfo, Point, Rect, Rotation, SearchResult, Size, Viewport,
};
pub use page::Page;
pub use search::Search;
pub use text::{SearchStart, Text};
