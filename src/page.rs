//! Page operations: rendering, link enumeration, coordinate mapping.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::engine::{EngineInner, NativeBackend, PageHandle, PixelBuffer, SurfaceHandle};
use crate::error::{Error, Result};
use crate::model::{Link, Point, Rect, Rotation, Size, Viewport};
use crate::text::Text;

/// White, fully opaque ARGB background.
const DEFAULT_BACKGROUND: u32 = 0xFFFF_FFFF;

/// An open page.
///
/// Created by [`Document::open_page`](crate::Document::open_page); the
/// native open call reports the page dimensions in the same round trip, and
/// they are cached here for the page's lifetime. A page refuses to close
/// while a child [`Text`] is still open.
pub struct Page {
    engine: Arc<EngineInner>,
    handle: Option<PageHandle>,
    index: u32,
    size: Size,
    live_texts: Arc<AtomicUsize>,
    parent_live: Arc<AtomicUsize>,
}

impl Page {
    pub(crate) fn new(
        engine: Arc<EngineInner>,
        handle: PageHandle,
        index: u32,
        size: Size,
        parent_live: Arc<AtomicUsize>,
    ) -> Self {
        Self {
            engine,
            handle: Some(handle),
            index,
            size,
            live_texts: Arc::new(AtomicUsize::new(0)),
            parent_live,
        }
    }

    fn handle(&self) -> Result<PageHandle> {
        self.handle.ok_or(Error::Closed("page"))
    }

    /// Page index within the document.
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Page width, captured at open time.
    pub fn width(&self) -> i32 {
        self.size.width
    }

    /// Page height, captured at open time.
    pub fn height(&self) -> i32 {
        self.size.height
    }

    /// Page dimensions, captured at open time.
    pub fn size(&self) -> Size {
        self.size
    }

    /// Whether this page has been closed.
    pub fn is_closed(&self) -> bool {
        self.handle.is_none()
    }

    /// Rasterize into a caller-supplied pixel buffer.
    ///
    /// `(origin_x, origin_y)` position the page in device space; `width`
    /// and `height` are the draw extent. A fault inside the native renderer
    /// is caught here, logged, and reported as [`Error::Render`]; it never
    /// takes the caller down.
    #[allow(clippy::too_many_arguments)]
    pub fn render_to_buffer(
        &self,
        target: &mut PixelBuffer<'_>,
        origin_x: i32,
        origin_y: i32,
        width: i32,
        height: i32,
        background: u32,
        render_annotations: bool,
    ) -> Result<()> {
        let page = self.handle()?;
        self.engine
            .with_backend(|b| {
                b.render_to_buffer(
                    page,
                    target,
                    origin_x,
                    origin_y,
                    width,
                    height,
                    background,
                    render_annotations,
                )
            })
            .map_err(|err| {
                log::error!("native render fault on page {}: {err}", self.index);
                Error::Render(err.to_string())
            })
    }

    /// [`render_to_buffer`](Page::render_to_buffer) with a white background
    /// and annotations disabled.
    pub fn render_to_buffer_default(
        &self,
        target: &mut PixelBuffer<'_>,
        origin_x: i32,
        origin_y: i32,
        width: i32,
        height: i32,
    ) -> Result<()> {
        self.render_to_buffer(
            target,
            origin_x,
            origin_y,
            width,
            height,
            DEFAULT_BACKGROUND,
            false,
        )
    }

    /// Rasterize onto a platform display surface.
    ///
    /// Same fault containment as [`render_to_buffer`](Page::render_to_buffer).
    pub fn render_to_surface(
        &self,
        surface: SurfaceHandle,
        origin_x: i32,
        origin_y: i32,
        width: i32,
        height: i32,
        render_annotations: bool,
    ) -> Result<()> {
        let page = self.handle()?;
        self.engine
            .with_backend(|b| {
                b.render_to_surface(
                    page,
                    surface,
                    origin_x,
                    origin_y,
                    width,
                    height,
                    render_annotations,
                )
            })
            .map_err(|err| {
                log::error!("native render fault on page {}: {err}", self.index);
                Error::Render(err.to_string())
            })
    }

    /// Load the text layer of this page.
    pub fn open_text(&self) -> Result<Text> {
        let page = self.handle()?;
        let text = self.engine.with_backend(|b| b.load_text_page(page))?;
        self.live_texts.fetch_add(1, Ordering::Relaxed);
        Ok(Text::new(
            Arc::clone(&self.engine),
            text,
            Arc::clone(&self.live_texts),
        ))
    }

    /// Enumerate link annotations on this page.
    ///
    /// A link is surfaced only if its bounding rectangle resolves *and* it
    /// has somewhere to go: a non-zero destination page index or a
    /// non-empty URI. Destination index 0 is the engine's "no internal
    /// destination" sentinel, so a dest-0 link survives only on the
    /// strength of its URI. Malformed links are dropped silently; they are
    /// not an error condition for the caller.
    pub fn links(&self) -> Result<Vec<Link>> {
        let page = self.handle()?;
        self.engine.with_backend(|b| {
            let handles = b.page_links(page)?;
            let mut links = Vec::with_capacity(handles.len());
            for link in handles {
                let Some(bounds) = b.link_rect(link)? else {
                    log::debug!("dropping link without resolvable bounds on page {}", self.index);
                    continue;
                };
                let dest_page_index = b.link_dest_index(page, link)?;
                let uri = b.link_uri(page, link)?.filter(|u| !u.is_empty());
                if dest_page_index == 0 && uri.is_none() {
                    log::debug!("dropping link without destination on page {}", self.index);
                    continue;
                }
                links.push(Link {
                    bounds,
                    dest_page_index,
                    uri,
                });
            }
            Ok(links)
        })
    }

    /// Map a point from page space into device space.
    ///
    /// Pure coordinate transform parameterized by the viewport and a
    /// clockwise quarter-turn rotation; no lifetime side effects beyond the
    /// native call itself.
    pub fn map_page_coords_to_device(
        &self,
        viewport: Viewport,
        rotation: Rotation,
        page_x: f64,
        page_y: f64,
    ) -> Result<Point> {
        let page = self.handle()?;
        self.engine.with_backend(|b| {
            b.page_coords_to_device(
                page,
                viewport.origin.x,
                viewport.origin.y,
                viewport.size.width,
                viewport.size.height,
                rotation.quarter_turns(),
                page_x,
                page_y,
            )
        })
    }

    /// Map a page-space rectangle into device space.
    ///
    /// The two corners are mapped independently — rotation can swap which
    /// device axis an edge lands on — and the result is normalized back
    /// into a well-formed rectangle.
    pub fn map_rect_to_device(
        &self,
        viewport: Viewport,
        rotation: Rotation,
        rect: Rect,
    ) -> Result<Rect> {
        let page = self.handle()?;
        self.engine.with_backend(|b| {
            let map = |b: &mut dyn NativeBackend, x: f64, y: f64| {
                b.page_coords_to_device(
                    page,
                    viewport.origin.x,
                    viewport.origin.y,
                    viewport.size.width,
                    viewport.size.height,
                    rotation.quarter_turns(),
                    x,
                    y,
                )
            };
            let top_left = map(b, rect.left as f64, rect.top as f64)?;
            let bottom_right = map(b, rect.right as f64, rect.bottom as f64)?;
            Ok(Rect::new(
                top_left.x as f32,
                top_left.y as f32,
                bottom_right.x as f32,
                bottom_right.y as f32,
            )
            .normalized())
        })
    }

    /// Release the native page handle.
    ///
    /// Refuses while a child [`Text`] is still open; a second call on an
    /// already-closed page is a no-op.
    pub fn close(&mut self) -> Result<()> {
        let Some(page) = self.handle else {
            return Ok(());
        };
        let live = self.live_texts.load(Ordering::Acquire);
        if live > 0 {
            return Err(Error::LiveChildren {
                parent: "page",
                count: live,
            });
        }
        self.handle = None;
        let result = self.engine.with_backend(|b| b.close_page(page));
        self.parent_live.fetch_sub(1, Ordering::Release);
        log::debug!("closed page {}", self.index);
        result
    }
}

impl Drop for Page {
    fn drop(&mut self) {
        if self.handle.is_some() {
            if let Err(err) = self.close() {
                log::error!("page {} dropped while still open: {err}", self.index);
            }
        }
    }
}
