//! Stateful search cursor over a page's text layer.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::engine::{EngineInner, NativeBackend, SearchHandle};
use crate::error::{Error, Result};
use crate::model::SearchResult;

/// A forward/backward match iterator.
///
/// Created by [`Text::search`](crate::Text::search). The cursor is
/// repositioned destructively by every `find_next` / `find_prev` call;
/// read the returned [`SearchResult`] before moving again. Exhaustion in
/// one direction (`Ok(None)`) leaves the cursor at the boundary — the
/// opposite direction may still produce matches.
///
/// The cursor closes independently of its parent [`Text`](crate::Text);
/// it does not keep the text page alive.
pub struct Search {
    engine: Arc<EngineInner>,
    handle: Option<SearchHandle>,
    parent_live: Arc<AtomicUsize>,
}

impl Search {
    pub(crate) fn new(
        engine: Arc<EngineInner>,
        handle: SearchHandle,
        parent_live: Arc<AtomicUsize>,
    ) -> Self {
        Self {
            engine,
            handle: Some(handle),
            parent_live,
        }
    }

    fn handle(&self) -> Result<SearchHandle> {
        self.handle.ok_or(Error::Closed("search"))
    }

    /// Whether this cursor has been closed.
    pub fn is_closed(&self) -> bool {
        self.handle.is_none()
    }

    /// Advance to the next match.
    ///
    /// `Ok(None)` means no further match exists in the forward direction.
    pub fn find_next(&mut self) -> Result<Option<SearchResult>> {
        let search = self.handle()?;
        self.engine.with_backend(|b| {
            if b.find_next(search)? {
                Ok(Some(SearchResult {
                    start_index: b.result_index(search)?,
                    length: b.result_count(search)?,
                }))
            } else {
                Ok(None)
            }
        })
    }

    /// Move back to the previous match.
    ///
    /// `Ok(None)` means no further match exists in the backward direction.
    pub fn find_prev(&mut self) -> Result<Option<SearchResult>> {
        let search = self.handle()?;
        self.engine.with_backend(|b| {
            if b.find_prev(search)? {
                Ok(Some(SearchResult {
                    start_index: b.result_index(search)?,
                    length: b.result_count(search)?,
                }))
            } else {
                Ok(None)
            }
        })
    }

    /// Release the native search cursor.
    ///
    /// A second call is a no-op.
    pub fn close(&mut self) -> Result<()> {
        let Some(search) = self.handle else {
            return Ok(());
        };
        self.handle = None;
        let result = self.engine.with_backend(|b| b.close_search(search));
        self.parent_live.fetch_sub(1, Ordering::Release);
        result
    }
}

impl Drop for Search {
    fn drop(&mut self) {
        if self.handle.is_some() {
            if let Err(err) = self.close() {
                log::error!("search cursor dropped while still open: {err}");
            }
        }
    }
}
