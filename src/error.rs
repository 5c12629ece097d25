//! Error types for the pdfgate library.

use std::io;
use thiserror::Error;

/// Result type alias for pdfgate operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while driving the native engine.
///
/// Recoverable "found nothing" conditions (missing metadata field, empty
/// outline, exhausted search cursor) are never represented here; they are
/// empty strings, empty vectors or `Ok(None)` at the call site.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error on the document input stream.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Operation attempted on a component whose handle was already released.
    ///
    /// Raised before any native call is made, so a stale wrapper can never
    /// hand a dangling token to the engine.
    #[error("operation on closed {0}")]
    Closed(&'static str),

    /// The provided password is wrong or a required password is missing.
    #[error("invalid or missing password")]
    InvalidPassword,

    /// The native engine refused to open the document.
    #[error("failed to open document: {0}")]
    Open(String),

    /// Page index is out of range.
    #[error("page {0} is out of range (document has {1} pages)")]
    PageOutOfRange(u32, u32),

    /// A native rendering call raised an internal fault.
    ///
    /// Caught at the render boundary and reported; never fatal to the caller.
    #[error("rendering failed: {0}")]
    Render(String),

    /// A parent component was asked to close while children still hold
    /// native handles nested inside it.
    #[error("cannot close {parent}: {count} child handle(s) still open")]
    LiveChildren {
        /// Kind of the component refusing to close.
        parent: &'static str,
        /// Number of children still open.
        count: usize,
    },

    /// Any other fault reported by the native engine.
    #[error("native engine error: {0}")]
    Native(String),
}
