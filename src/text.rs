//! Text layer: extraction, glyph rectangles, search factory.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::engine::{EngineInner, NativeBackend, SearchFlags, TextHandle};
use crate::error::{Error, Result};
use crate::model::Rect;
use crate::search::Search;

/// Where a search begins on the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchStart {
    /// Start at the given character index.
    Index(u32),
    /// Start from the end of the page (for backward searching).
    End,
}

impl SearchStart {
    /// The sentinel encoding expected by the native engine (`-1` = end).
    ///
    /// Indices beyond `i32::MAX` saturate; a plain cast would wrap into
    /// negative values and `u32::MAX` would alias the end sentinel.
    pub(crate) fn to_raw(self) -> i32 {
        match self {
            SearchStart::Index(index) => index.min(i32::MAX as u32) as i32,
            SearchStart::End => -1,
        }
    }
}

/// The extracted, searchable text layer of one page.
///
/// Created by [`Page::open_text`](crate::Page::open_text). Refuses to close
/// while a child [`Search`] cursor is still open.
pub struct Text {
    engine: Arc<EngineInner>,
    handle: Option<TextHandle>,
    live_searches: Arc<AtomicUsize>,
    parent_live: Arc<AtomicUsize>,
}

impl Text {
    pub(crate) fn new(
        engine: Arc<EngineInner>,
        handle: TextHandle,
        parent_live: Arc<AtomicUsize>,
    ) -> Self {
        Self {
            engine,
            handle: Some(handle),
            live_searches: Arc::new(AtomicUsize::new(0)),
            parent_live,
        }
    }

    fn handle(&self) -> Result<TextHandle> {
        self.handle.ok_or(Error::Closed("text page"))
    }

    /// Whether this text page has been closed.
    pub fn is_closed(&self) -> bool {
        self.handle.is_none()
    }

    /// Number of characters on the page.
    pub fn len(&self) -> Result<u32> {
        let text = self.handle()?;
        self.engine.with_backend(|b| b.char_count(text))
    }

    /// Whether the page has no text.
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Full extracted text of the page.
    ///
    /// A page with zero characters yields `""` without invoking the native
    /// extraction call.
    pub fn text(&self) -> Result<String> {
        let text = self.handle()?;
        self.engine.with_backend(|b| {
            let count = b.char_count(text)?;
            if count == 0 {
                Ok(String::new())
            } else {
                b.text_range(text, 0, count)
            }
        })
    }

    /// Bounding rectangles of the glyph runs covering
    /// `[start, start + count)`.
    ///
    /// A zero-length range short-circuits to an empty vector; so does a
    /// range the engine reports no rectangles for.
    pub fn text_rects(&self, start: u32, count: u32) -> Result<Vec<Rect>> {
        if count == 0 {
            return Ok(Vec::new());
        }
        let text = self.handle()?;
        self.engine.with_backend(|b| {
            let rect_count = b.count_rects(text, start, count)?;
            let mut rects = Vec::with_capacity(rect_count as usize);
            for index in 0..rect_count {
                rects.push(b.get_rect(text, index)?);
            }
            Ok(rects)
        })
    }

    /// Start a search over this page's text.
    ///
    /// The returned cursor is positioned before its first match; call
    /// [`Search::find_next`] or [`Search::find_prev`] to move it.
    pub fn search(&self, query: &str, start: SearchStart, flags: SearchFlags) -> Result<Search> {
        let text = self.handle()?;
        let search = self
            .engine
            .with_backend(|b| b.find_start(text, query, flags.bits(), start.to_raw()))?;
        self.live_searches.fetch_add(1, Ordering::Relaxed);
        Ok(Search::new(
            Arc::clone(&self.engine),
            search,
            Arc::clone(&self.live_searches),
        ))
    }

    /// Release the native text-page handle.
    ///
    /// Refuses while a child [`Search`] is still open; a second call is a
    /// no-op.
    pub fn close(&mut self) -> Result<()> {
        let Some(text) = self.handle else {
            return Ok(());
        };
        let live = self.live_searches.load(Ordering::Acquire);
        if live > 0 {
            return Err(Error::LiveChildren {
                parent: "text page",
                count: live,
            });
        }
        self.handle = None;
        let result = self.engine.with_backend(|b| b.close_text_page(text));
        self.parent_live.fetch_sub(1, Ordering::Release);
        result
    }
}

impl Drop for Text {
    fn drop(&mut self) {
        if self.handle.is_some() {
            if let Err(err) = self.close() {
                log::error!("text page dropped while still open: {err}");
            }
        }
    }
}
