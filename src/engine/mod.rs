//! Engine boundary: typed handles, the backend trait and the global gate.

mod backend;
mod serial;

pub use backend::{
    BookmarkHandle, DocumentHandle, InputStream, LinkHandle, NativeBackend, PageHandle,
    PixelBuffer, SearchFlags, SearchHandle, SurfaceHandle, TextHandle,
};
pub use serial::Engine;

pub(crate) use serial::EngineInner;
