//! Native engine abstraction layer.
//!
//! Provides a trait-based interface for the native page-rendering engine,
//! isolating the concrete binding (PDFium, MuPDF, ...) from the lifecycle
//! logic. One trait method per native entry point; implementations translate
//! engine-specific failure codes into [`crate::Error`] values.
//!
//! Handles returned by a backend are opaque capabilities. The backend never
//! hands out a null/zero sentinel; "no such resource" is `Option::None`.

use std::io::{Read, Seek};

use crate::error::Result;
use crate::model::{Point, Rect, Size};

macro_rules! native_handle {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        ///
        /// Opaque token minted by a [`NativeBackend`]. Carries no behavior;
        /// only authorizes calls back into the backend that minted it.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub struct $name(u64);

        impl $name {
            /// Wrap a raw native token. Backend implementations only.
            pub fn from_raw(raw: u64) -> Self {
                Self(raw)
            }

            /// The raw native token.
            pub fn raw(self) -> u64 {
                self.0
            }
        }
    };
}

native_handle!(
    /// Handle to an open native document.
    DocumentHandle
);
native_handle!(
    /// Handle to an open native page.
    PageHandle
);
native_handle!(
    /// Handle to a loaded text layer of a page.
    TextHandle
);
native_handle!(
    /// Handle to an in-progress search cursor.
    SearchHandle
);
native_handle!(
    /// Handle to a node of the native outline tree.
    BookmarkHandle
);
native_handle!(
    /// Handle to a link annotation on a page.
    LinkHandle
);
native_handle!(
    /// Handle to a platform display surface.
    SurfaceHandle
);

/// Search behavior flags.
///
/// Both flags default to unset: case-insensitive, partial-word matching.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchFlags {
    /// Match letter case exactly.
    pub match_case: bool,

    /// Match whole words only.
    pub match_whole_word: bool,
}

impl SearchFlags {
    /// Bitmask value of the match-case flag.
    pub const MATCH_CASE: u32 = 0x0000_0001;

    /// Bitmask value of the whole-word flag.
    pub const MATCH_WHOLE_WORD: u32 = 0x0000_0002;

    /// Enable case-sensitive matching.
    pub fn with_match_case(mut self) -> Self {
        self.match_case = true;
        self
    }

    /// Enable whole-word matching.
    pub fn with_whole_word(mut self) -> Self {
        self.match_whole_word = true;
        self
    }

    /// Encode as the bitmask understood by the native engine.
    pub fn bits(self) -> u32 {
        let mut bits = 0;
        if self.match_case {
            bits |= Self::MATCH_CASE;
        }
        if self.match_whole_word {
            bits |= Self::MATCH_WHOLE_WORD;
        }
        bits
    }
}

/// Seekable input a document can be opened from.
///
/// The wrapper keeps ownership of the stream for the lifetime of the
/// document and drops it on close; the backend reads through it during
/// native calls only.
pub trait InputStream: Read + Seek {}

impl<T: Read + Seek> InputStream for T {}

/// A caller-supplied raster target.
///
/// Pixel format and stride semantics are the backend's concern; this layer
/// only guarantees exclusive access to the bytes for the duration of one
/// render call.
#[derive(Debug)]
pub struct PixelBuffer<'a> {
    /// Raw pixel storage
    pub pixels: &'a mut [u8],

    /// Buffer width in pixels
    pub width: i32,

    /// Buffer height in pixels
    pub height: i32,

    /// Bytes per row
    pub stride: usize,
}

impl<'a> PixelBuffer<'a> {
    /// Create a raster target over caller-owned pixel storage.
    pub fn new(pixels: &'a mut [u8], width: i32, height: i32, stride: usize) -> Self {
        Self {
            pixels,
            width,
            height,
            stride,
        }
    }
}

/// Abstract interface to the native page-rendering engine.
///
/// Every method corresponds to exactly one native entry point and is a
/// synchronous, blocking call. Implementations are **not** required to be
/// thread-safe: the crate serializes all calls through one process-wide
/// gate before any method here runs (see [`crate::engine::Engine`]).
///
/// Implementations must release native resources in the matching `close_*`
/// call and must not retain handles after that call returns.
pub trait NativeBackend: Send {
    /// Open a document from a seekable stream with a known byte length.
    fn open_stream(
        &mut self,
        stream: &mut dyn InputStream,
        len: u64,
        password: Option<&str>,
    ) -> Result<DocumentHandle>;

    /// Open a document from an in-memory buffer.
    ///
    /// The caller keeps `data` allocated and unmodified until the matching
    /// [`close_document`](NativeBackend::close_document), so implementations
    /// backed by engines that parse lazily may retain raw pointers into it
    /// instead of copying.
    fn open_buffer(&mut self, data: &[u8], password: Option<&str>) -> Result<DocumentHandle>;

    /// Release a document handle.
    fn close_document(&mut self, doc: DocumentHandle) -> Result<()>;

    /// Number of pages in the document.
    fn page_count(&mut self, doc: DocumentHandle) -> Result<u32>;

    /// Whether the viewer should scale this document for printing.
    fn scale_for_printing(&mut self, doc: DocumentHandle) -> Result<bool>;

    /// Page dimensions without opening the page.
    fn page_size(&mut self, doc: DocumentHandle, index: u32) -> Result<Size>;

    /// Open a page, returning its handle and dimensions in one round trip.
    fn open_page(&mut self, doc: DocumentHandle, index: u32) -> Result<(PageHandle, Size)>;

    /// Release a page handle.
    fn close_page(&mut self, page: PageHandle) -> Result<()>;

    /// One named information-dictionary field; absent fields are `""`.
    fn metadata_field(&mut self, doc: DocumentHandle, tag: &str) -> Result<String>;

    /// First child of an outline node, or of the outline root when `parent`
    /// is `None`.
    fn first_child_bookmark(
        &mut self,
        doc: DocumentHandle,
        parent: Option<BookmarkHandle>,
    ) -> Result<Option<BookmarkHandle>>;

    /// Next sibling of an outline node.
    fn sibling_bookmark(
        &mut self,
        doc: DocumentHandle,
        bookmark: BookmarkHandle,
    ) -> Result<Option<BookmarkHandle>>;

    /// Title of an outline node.
    fn bookmark_title(&mut self, bookmark: BookmarkHandle) -> Result<String>;

    /// Destination page index of an outline node.
    fn bookmark_dest_index(
        &mut self,
        doc: DocumentHandle,
        bookmark: BookmarkHandle,
    ) -> Result<u32>;

    /// All link annotations on a page.
    fn page_links(&mut self, page: PageHandle) -> Result<Vec<LinkHandle>>;

    /// Destination page index of a link (0 = no internal destination).
    fn link_dest_index(&mut self, page: PageHandle, link: LinkHandle) -> Result<u32>;

    /// URI action of a link, if it has one.
    fn link_uri(&mut self, page: PageHandle, link: LinkHandle) -> Result<Option<String>>;

    /// Bounding rectangle of a link, if resolvable.
    fn link_rect(&mut self, link: LinkHandle) -> Result<Option<Rect>>;

    /// Rasterize a page region into a caller-supplied pixel buffer.
    #[allow(clippy::too_many_arguments)]
    fn render_to_buffer(
        &mut self,
        page: PageHandle,
        target: &mut PixelBuffer<'_>,
        origin_x: i32,
        origin_y: i32,
        width: i32,
        height: i32,
        background: u32,
        render_annotations: bool,
    ) -> Result<()>;

    /// Rasterize a page region onto a platform display surface.
    #[allow(clippy::too_many_arguments)]
    fn render_to_surface(
        &mut self,
        page: PageHandle,
        surface: SurfaceHandle,
        origin_x: i32,
        origin_y: i32,
        width: i32,
        height: i32,
        render_annotations: bool,
    ) -> Result<()>;

    /// Map a point from page space into device space.
    ///
    /// `rotation` is in clockwise quarter turns (0..=3).
    #[allow(clippy::too_many_arguments)]
    fn page_coords_to_device(
        &mut self,
        page: PageHandle,
        origin_x: i32,
        origin_y: i32,
        size_x: i32,
        size_y: i32,
        rotation: i32,
        page_x: f64,
        page_y: f64,
    ) -> Result<Point>;

    /// Load the text layer of a page.
    fn load_text_page(&mut self, page: PageHandle) -> Result<TextHandle>;

    /// Release a text-page handle.
    fn close_text_page(&mut self, text: TextHandle) -> Result<()>;

    /// Number of characters on the text page.
    fn char_count(&mut self, text: TextHandle) -> Result<u32>;

    /// Extract `count` characters starting at `start`. Only called with a
    /// non-zero count.
    fn text_range(&mut self, text: TextHandle, start: u32, count: u32) -> Result<String>;

    /// Number of glyph-run rectangles covering the character range.
    fn count_rects(&mut self, text: TextHandle, start: u32, count: u32) -> Result<u32>;

    /// One rectangle from the set produced by the last [`count_rects`]
    /// call.
    ///
    /// [`count_rects`]: NativeBackend::count_rects
    fn get_rect(&mut self, text: TextHandle, index: u32) -> Result<Rect>;

    /// Start a search. `start_index == -1` means "from the end of the
    /// page"; `flags` uses the [`SearchFlags`] bit layout.
    fn find_start(
        &mut self,
        text: TextHandle,
        query: &str,
        flags: u32,
        start_index: i32,
    ) -> Result<SearchHandle>;

    /// Advance the cursor to the next match. `false` = exhausted forward.
    fn find_next(&mut self, search: SearchHandle) -> Result<bool>;

    /// Move the cursor to the previous match. `false` = exhausted backward.
    fn find_prev(&mut self, search: SearchHandle) -> Result<bool>;

    /// Character index of the current match.
    fn result_index(&mut self, search: SearchHandle) -> Result<u32>;

    /// Character length of the current match.
    fn result_count(&mut self, search: SearchHandle) -> Result<u32>;

    /// Release a search cursor.
    fn close_search(&mut self, search: SearchHandle) -> Result<()>;
}
