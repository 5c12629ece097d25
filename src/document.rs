//! Document lifecycle: open, query, outline materialization, close.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::engine::{DocumentHandle, EngineInner, InputStream, NativeBackend};
use crate::error::{Error, Result};
use crate::model::{BookmarkNode, MetaInfo, Size};
use crate::page::Page;

/// Upper bound on materialized outline nodes.
///
/// A malformed outline can link its sibling pointers into a cycle; the walk
/// stops here and returns the partial tree instead of looping.
const MAX_OUTLINE_NODES: usize = 16_384;

/// An open document: root of the handle hierarchy.
///
/// Owns the native document handle and whatever backs it: the byte buffer
/// for buffer-opened documents, the input stream for stream-opened ones.
/// Both are held until close, so a backend that keeps pointers into its
/// input stays valid for the document's whole lifetime. Pages are opened
/// through [`Document::open_page`] and must be closed (or dropped) before
/// the document itself can close.
///
/// `close` is idempotent: the second and later calls are no-ops. Every
/// other operation on a closed document fails with [`Error::Closed`]
/// without touching the native layer.
pub struct Document {
    engine: Arc<EngineInner>,
    handle: Option<DocumentHandle>,
    page_count: u32,
    buffer: Option<Vec<u8>>,
    input: Option<Box<dyn InputStream + Send>>,
    live_pages: Arc<AtomicUsize>,
}

impl Document {
    pub(crate) fn open_buffer(
        engine: Arc<EngineInner>,
        data: Vec<u8>,
        password: Option<&str>,
    ) -> Result<Self> {
        let (handle, page_count) =
            Self::open_and_count(&engine, |b| b.open_buffer(&data, password))?;
        log::debug!("opened document from {}-byte buffer ({page_count} pages)", data.len());
        Ok(Self::assemble(engine, handle, page_count, Some(data), None))
    }

    pub(crate) fn open_stream(
        engine: Arc<EngineInner>,
        mut stream: Box<dyn InputStream + Send>,
        len: u64,
        password: Option<&str>,
    ) -> Result<Self> {
        let (handle, page_count) =
            Self::open_and_count(&engine, |b| b.open_stream(stream.as_mut(), len, password))?;
        log::debug!("opened document from {len}-byte stream ({page_count} pages)");
        Ok(Self::assemble(engine, handle, page_count, None, Some(stream)))
    }

    /// Open the native document and query its page count in one critical
    /// section. If the count query fails after the open succeeded, the
    /// just-opened handle is released before the error propagates, so a
    /// partial failure never leaks a native resource.
    fn open_and_count(
        engine: &EngineInner,
        open: impl FnOnce(&mut dyn NativeBackend) -> Result<DocumentHandle>,
    ) -> Result<(DocumentHandle, u32)> {
        engine.with_backend(|b| {
            let handle = open(b)?;
            match b.page_count(handle) {
                Ok(count) => Ok((handle, count)),
                Err(err) => {
                    if let Err(close_err) = b.close_document(handle) {
                        log::error!(
                            "failed to release partially opened document: {close_err}"
                        );
                    }
                    Err(err)
                }
            }
        })
    }

    fn assemble(
        engine: Arc<EngineInner>,
        handle: DocumentHandle,
        page_count: u32,
        buffer: Option<Vec<u8>>,
        input: Option<Box<dyn InputStream + Send>>,
    ) -> Self {
        Self {
            engine,
            handle: Some(handle),
            page_count,
            buffer,
            input,
            live_pages: Arc::new(AtomicUsize::new(0)),
        }
    }

    fn handle(&self) -> Result<DocumentHandle> {
        self.handle.ok_or(Error::Closed("document"))
    }

    /// Number of pages, cached at open time. No native call.
    pub fn page_count(&self) -> u32 {
        self.page_count
    }

    /// Whether this document has been closed.
    pub fn is_closed(&self) -> bool {
        self.handle.is_none()
    }

    /// Whether the viewer should scale this document for printing.
    pub fn should_scale_for_printing(&self) -> Result<bool> {
        let doc = self.handle()?;
        self.engine.with_backend(|b| b.scale_for_printing(doc))
    }

    /// Dimensions of one page without opening it.
    pub fn page_size(&self, index: u32) -> Result<Size> {
        let doc = self.handle()?;
        self.engine.with_backend(|b| b.page_size(doc, index))
    }

    /// Dimensions of every page, in page order, under one gate acquisition.
    pub fn all_page_sizes(&self) -> Result<Vec<Size>> {
        let doc = self.handle()?;
        self.engine.with_backend(|b| {
            let mut sizes = Vec::with_capacity(self.page_count as usize);
            for index in 0..self.page_count {
                sizes.push(b.page_size(doc, index)?);
            }
            Ok(sizes)
        })
    }

    /// Document information dictionary.
    ///
    /// One native query per field; a field the document does not carry is
    /// an empty string, not an error.
    pub fn metadata(&self) -> Result<MetaInfo> {
        let doc = self.handle()?;
        self.engine.with_backend(|b| {
            Ok(MetaInfo {
                title: b.metadata_field(doc, "Title")?,
                author: b.metadata_field(doc, "Author")?,
                subject: b.metadata_field(doc, "Subject")?,
                keywords: b.metadata_field(doc, "Keywords")?,
                creator: b.metadata_field(doc, "Creator")?,
                producer: b.metadata_field(doc, "Producer")?,
                creation_date: b.metadata_field(doc, "CreationDate")?,
                mod_date: b.metadata_field(doc, "ModDate")?,
            })
        })
    }

    /// Materialize the outline (bookmark tree) eagerly.
    ///
    /// Walks the native child/sibling pointer structure with an explicit
    /// worklist, so outline depth never translates into call-stack depth.
    /// Node and sibling order mirror the native traversal exactly: a node
    /// is followed by its child subtree, then by its next sibling. Returns
    /// an empty vector for documents without an outline.
    pub fn bookmarks(&self) -> Result<Vec<BookmarkNode>> {
        let doc = self.handle()?;
        self.engine.with_backend(|b| {
            // Flat arena of (node, parent index); children always carry a
            // higher index than their parent.
            let mut arena: Vec<(BookmarkNode, Option<usize>)> = Vec::new();
            let mut worklist = Vec::new();

            if let Some(first) = b.first_child_bookmark(doc, None)? {
                worklist.push((first, None));
            }

            while let Some((bookmark, parent)) = worklist.pop() {
                if arena.len() >= MAX_OUTLINE_NODES {
                    log::warn!(
                        "outline truncated at {MAX_OUTLINE_NODES} nodes; \
                         document outline is pathologically deep or cyclic"
                    );
                    break;
                }

                let node = BookmarkNode::new(
                    b.bookmark_title(bookmark)?,
                    b.bookmark_dest_index(doc, bookmark)?,
                );
                let index = arena.len();
                arena.push((node, parent));

                // Sibling is pushed below the child so the child subtree is
                // fully materialized first, matching native order.
                if let Some(sibling) = b.sibling_bookmark(doc, bookmark)? {
                    worklist.push((sibling, parent));
                }
                if let Some(child) = b.first_child_bookmark(doc, Some(bookmark))? {
                    worklist.push((child, Some(index)));
                }
            }

            Ok(fold_arena(arena))
        })
    }

    /// Open a page by index.
    ///
    /// The index is validated against the cached page count; the native
    /// open failing for an in-range index still surfaces as an error and is
    /// never clamped to a neighboring page.
    pub fn open_page(&self, index: u32) -> Result<Page> {
        let doc = self.handle()?;
        if index >= self.page_count {
            return Err(Error::PageOutOfRange(index, self.page_count));
        }
        let (page, size) = self.engine.with_backend(|b| b.open_page(doc, index))?;
        self.live_pages.fetch_add(1, Ordering::Relaxed);
        Ok(Page::new(
            Arc::clone(&self.engine),
            page,
            index,
            size,
            Arc::clone(&self.live_pages),
        ))
    }

    /// Release the native document handle and the owned input (buffer or
    /// stream).
    ///
    /// Refuses to close while child pages still hold native handles;
    /// calling `close` on an already-closed document is a no-op. The input
    /// is released only after the native close, so a backend holding
    /// pointers into it never sees them dangle.
    pub fn close(&mut self) -> Result<()> {
        let Some(doc) = self.handle else {
            return Ok(());
        };
        let live = self.live_pages.load(Ordering::Acquire);
        if live > 0 {
            return Err(Error::LiveChildren {
                parent: "document",
                count: live,
            });
        }
        self.handle = None;
        let result = self.engine.with_backend(|b| b.close_document(doc));
        self.buffer = None;
        self.input = None;
        log::debug!("closed document");
        result
    }
}

impl Drop for Document {
    fn drop(&mut self) {
        if self.handle.is_some() {
            if let Err(err) = self.close() {
                // Closing underneath a live page would dangle its handle;
                // leaking the document handle is the safe failure mode.
                log::error!("document dropped while still open: {err}");
            }
        }
    }
}

/// Fold the flat arena produced by the outline walk into an owned tree.
///
/// Nodes are popped highest-index first, so a node's children are all
/// attached before the node itself moves into its parent. Attachment order
/// is reverse document order, fixed by one reversal per child list.
fn fold_arena(mut arena: Vec<(BookmarkNode, Option<usize>)>) -> Vec<BookmarkNode> {
    let mut roots = Vec::new();
    while let Some((mut node, parent)) = arena.pop() {
        node.children.reverse();
        match parent {
            Some(p) => arena[p].0.children.push(node),
            None => roots.push(node),
        }
    }
    roots.reverse();
    roots
}
