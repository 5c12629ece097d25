//! Process-wide serialization of native calls.
//!
//! The wrapped engine is globally non-reentrant: it tolerates at most one
//! thread inside *any* native call at a time, regardless of which resource
//! the call targets. A single static gate turns the whole engine into one
//! critical section; concurrent callers block, they are never parallelized.
//!
//! The gate is held for the duration of one native call (or one short,
//! crate-internal sequence of native calls) and is released on every exit
//! path, including panics, via the lock guard. It is never held across
//! caller-supplied closures.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::document::Document;
use crate::engine::backend::{InputStream, NativeBackend};
use crate::error::Result;

/// One gate for the whole process, shared by every [`Engine`] instance.
/// Two engines still drive the same non-reentrant native library.
static NATIVE_GATE: Mutex<()> = Mutex::new(());

/// Serialized access to a boxed backend.
///
/// Documents and their descendants share one `EngineInner` and funnel every
/// native call through [`with_backend`](EngineInner::with_backend).
pub(crate) struct EngineInner {
    backend: Mutex<Box<dyn NativeBackend>>,
}

impl EngineInner {
    /// Run `f` with exclusive access to the backend, behind the
    /// process-wide gate.
    pub(crate) fn with_backend<R>(&self, f: impl FnOnce(&mut dyn NativeBackend) -> R) -> R {
        let _gate = NATIVE_GATE.lock();
        let mut backend = self.backend.lock();
        f(backend.as_mut())
    }
}

/// Entry point binding a [`NativeBackend`] implementation.
///
/// An `Engine` is the factory for [`Document`]s. All documents opened from
/// it (and from any other engine in the process) serialize their native
/// calls through one global gate.
///
/// # Example
///
/// ```ignore
/// use pdfgate::Engine;
///
/// let engine = Engine::new(my_backend);
/// let doc = engine.open_buffer(std::fs::read("a.pdf")?, None)?;
/// println!("{} pages", doc.page_count());
/// ```
pub struct Engine {
    inner: Arc<EngineInner>,
}

impl Engine {
    /// Bind a backend implementation.
    pub fn new(backend: impl NativeBackend + 'static) -> Self {
        Self {
            inner: Arc::new(EngineInner {
                backend: Mutex::new(Box::new(backend)),
            }),
        }
    }

    /// Open a document from an owned byte buffer.
    ///
    /// The buffer is kept alive by the returned [`Document`] and released
    /// on close.
    pub fn open_buffer(&self, data: Vec<u8>, password: Option<&str>) -> Result<Document> {
        Document::open_buffer(Arc::clone(&self.inner), data, password)
    }

    /// Open a document from a seekable stream with an explicit byte length.
    ///
    /// The stream is owned by the returned [`Document`] for its whole
    /// lifetime and dropped on close.
    pub fn open_stream(
        &self,
        stream: impl InputStream + Send + 'static,
        len: u64,
        password: Option<&str>,
    ) -> Result<Document> {
        Document::open_stream(Arc::clone(&self.inner), Box::new(stream), len, password)
    }
}
