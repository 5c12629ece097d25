//! Shared test engine: a scripted, fully accounted `NativeBackend`.
//!
//! `FakeBackend` serves a single synthetic document described by a
//! [`FakeDoc`] and keeps a ledger of every handle it mints and releases, so
//! tests can assert that resources are released exactly once and never
//! after close.

#![allow(dead_code)]

use std::collections::HashMap;
use std::io::Read;
use std::sync::Arc;

use parking_lot::Mutex;

use pdfgate::{
    BookmarkHandle, DocumentHandle, Error, InputStream, LinkHandle, NativeBackend, PageHandle,
    PixelBuffer, Point, Rect, Result, SearchFlags, SearchHandle, Size, SurfaceHandle, TextHandle,
};

/// Scripted document served by the fake engine.
#[derive(Clone, Default)]
pub struct FakeDoc {
    pub password: Option<String>,
    pub pages: Vec<FakePage>,
    pub metadata: HashMap<String, String>,
    pub outline: Vec<FakeBookmark>,
    pub scale_for_printing: bool,
    /// Fail the page-count query right after a successful open.
    pub fail_page_count: bool,
    /// Make the first root bookmark its own sibling (cyclic outline).
    pub cyclic_outline: bool,
}

impl FakeDoc {
    pub fn with_pages(pages: Vec<FakePage>) -> Self {
        Self {
            pages,
            ..Self::default()
        }
    }
}

#[derive(Clone)]
pub struct FakePage {
    pub width: i32,
    pub height: i32,
    pub text: String,
    pub links: Vec<FakeLink>,
    /// Simulate a fault inside the native renderer.
    pub fail_render: bool,
}

impl FakePage {
    pub fn new(width: i32, height: i32) -> Self {
        Self {
            width,
            height,
            text: String::new(),
            links: Vec::new(),
            fail_render: false,
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }
}

#[derive(Clone)]
pub struct FakeLink {
    pub rect: Option<Rect>,
    pub dest: u32,
    pub uri: Option<String>,
}

#[derive(Clone)]
pub struct FakeBookmark {
    pub title: String,
    pub dest: u32,
    pub children: Vec<FakeBookmark>,
}

impl FakeBookmark {
    pub fn new(title: impl Into<String>, dest: u32) -> Self {
        Self {
            title: title.into(),
            dest,
            children: Vec::new(),
        }
    }

    pub fn with_children(mut self, children: Vec<FakeBookmark>) -> Self {
        self.children = children;
        self
    }
}

/// Handle ledger, shared between the backend (inside the engine) and the
/// test body.
#[derive(Default)]
pub struct Ledger {
    pub opened: usize,
    pub released: usize,
    pub extraction_calls: usize,
    pub render_calls: usize,
}

impl Ledger {
    pub fn live(&self) -> usize {
        self.opened - self.released
    }
}

struct FakeSearch {
    hits: Vec<(u32, u32)>,
    cur: Option<usize>,
    /// Initial character position; `usize::MAX` encodes "end of page".
    from: usize,
}

#[derive(Default)]
struct FakeState {
    fixture: FakeDoc,
    next_raw: u64,
    docs: HashMap<u64, ()>,
    pages: HashMap<u64, usize>,
    texts: HashMap<u64, usize>,
    searches: HashMap<u64, FakeSearch>,
    links: HashMap<u64, (usize, usize)>,
    bookmarks: HashMap<u64, Vec<usize>>,
    last_rects: HashMap<u64, Vec<Rect>>,
    ledger: Ledger,
}

impl FakeState {
    fn mint(&mut self) -> u64 {
        self.next_raw += 1;
        self.next_raw
    }

    fn bookmark_at(&self, path: &[usize]) -> Option<&FakeBookmark> {
        let mut nodes = &self.fixture.outline;
        let mut node = None;
        for &idx in path {
            let next = nodes.get(idx)?;
            nodes = &next.children;
            node = Some(next);
        }
        node
    }

    fn bookmark_handle(&mut self, path: Vec<usize>) -> BookmarkHandle {
        let raw = self.mint();
        self.bookmarks.insert(raw, path);
        BookmarkHandle::from_raw(raw)
    }

    fn page_fixture(&self, page: PageHandle) -> Result<&FakePage> {
        let idx = *self
            .pages
            .get(&page.raw())
            .ok_or_else(|| Error::Native("unknown page handle".into()))?;
        Ok(&self.fixture.pages[idx])
    }

    fn text_page_fixture(&self, text: TextHandle) -> Result<&FakePage> {
        let idx = *self
            .texts
            .get(&text.raw())
            .ok_or_else(|| Error::Native("unknown text handle".into()))?;
        Ok(&self.fixture.pages[idx])
    }
}

/// Scripted `NativeBackend` over one synthetic document.
pub struct FakeBackend {
    state: Arc<Mutex<FakeState>>,
}

/// Test-side view of the backend's ledger.
#[derive(Clone)]
pub struct Stats(Arc<Mutex<FakeState>>);

impl Stats {
    pub fn live_handles(&self) -> usize {
        self.0.lock().ledger.live()
    }

    pub fn opened(&self) -> usize {
        self.0.lock().ledger.opened
    }

    pub fn extraction_calls(&self) -> usize {
        self.0.lock().ledger.extraction_calls
    }

    pub fn render_calls(&self) -> usize {
        self.0.lock().ledger.render_calls
    }
}

impl FakeBackend {
    pub fn new(fixture: FakeDoc) -> (Self, Stats) {
        let state = Arc::new(Mutex::new(FakeState {
            fixture,
            ..FakeState::default()
        }));
        (
            Self {
                state: Arc::clone(&state),
            },
            Stats(state),
        )
    }
}

/// Character-level substring search honoring the engine's flag bits.
fn compute_hits(text: &str, query: &str, flags: u32) -> Vec<(u32, u32)> {
    let match_case = flags & SearchFlags::MATCH_CASE != 0;
    let whole_word = flags & SearchFlags::MATCH_WHOLE_WORD != 0;

    let chars: Vec<char> = text.chars().collect();
    let needle: Vec<char> = query.chars().collect();
    if needle.is_empty() || needle.len() > chars.len() {
        return Vec::new();
    }

    let eq = |a: char, b: char| {
        if match_case {
            a == b
        } else {
            a.eq_ignore_ascii_case(&b)
        }
    };

    let mut hits = Vec::new();
    for start in 0..=(chars.len() - needle.len()) {
        if !needle.iter().enumerate().all(|(i, &q)| eq(chars[start + i], q)) {
            continue;
        }
        if whole_word {
            let before_ok = start == 0 || !chars[start - 1].is_alphanumeric();
            let end = start + needle.len();
            let after_ok = end == chars.len() || !chars[end].is_alphanumeric();
            if !before_ok || !after_ok {
                continue;
            }
        }
        hits.push((start as u32, needle.len() as u32));
    }
    hits
}

impl NativeBackend for FakeBackend {
    fn open_stream(
        &mut self,
        stream: &mut dyn InputStream,
        len: u64,
        password: Option<&str>,
    ) -> Result<DocumentHandle> {
        let mut data = Vec::new();
        stream.take(len).read_to_end(&mut data)?;
        self.open_buffer(&data, password)
    }

    fn open_buffer(&mut self, data: &[u8], password: Option<&str>) -> Result<DocumentHandle> {
        if data.is_empty() {
            return Err(Error::Open("empty input".into()));
        }
        let mut state = self.state.lock();
        if state.fixture.password.as_deref() != password {
            return Err(Error::InvalidPassword);
        }
        let raw = state.mint();
        state.docs.insert(raw, ());
        state.ledger.opened += 1;
        Ok(DocumentHandle::from_raw(raw))
    }

    fn close_document(&mut self, doc: DocumentHandle) -> Result<()> {
        let mut state = self.state.lock();
        state
            .docs
            .remove(&doc.raw())
            .ok_or_else(|| Error::Native("document handle released twice".into()))?;
        state.ledger.released += 1;
        Ok(())
    }

    fn page_count(&mut self, doc: DocumentHandle) -> Result<u32> {
        let state = self.state.lock();
        if !state.docs.contains_key(&doc.raw()) {
            return Err(Error::Native("unknown document handle".into()));
        }
        if state.fixture.fail_page_count {
            return Err(Error::Native("page table corrupt".into()));
        }
        Ok(state.fixture.pages.len() as u32)
    }

    fn scale_for_printing(&mut self, _doc: DocumentHandle) -> Result<bool> {
        Ok(self.state.lock().fixture.scale_for_printing)
    }

    fn page_size(&mut self, _doc: DocumentHandle, index: u32) -> Result<Size> {
        let state = self.state.lock();
        let page = state
            .fixture
            .pages
            .get(index as usize)
            .ok_or_else(|| Error::Native("page index out of range".into()))?;
        Ok(Size::new(page.width, page.height))
    }

    fn open_page(&mut self, doc: DocumentHandle, index: u32) -> Result<(PageHandle, Size)> {
        let mut state = self.state.lock();
        if !state.docs.contains_key(&doc.raw()) {
            return Err(Error::Native("unknown document handle".into()));
        }
        let page = state
            .fixture
            .pages
            .get(index as usize)
            .ok_or_else(|| Error::Native("page index out of range".into()))?;
        let size = Size::new(page.width, page.height);
        let raw = state.mint();
        state.pages.insert(raw, index as usize);
        state.ledger.opened += 1;
        Ok((PageHandle::from_raw(raw), size))
    }

    fn close_page(&mut self, page: PageHandle) -> Result<()> {
        let mut state = self.state.lock();
        state
            .pages
            .remove(&page.raw())
            .ok_or_else(|| Error::Native("page handle released twice".into()))?;
        state.ledger.released += 1;
        Ok(())
    }

    fn metadata_field(&mut self, _doc: DocumentHandle, tag: &str) -> Result<String> {
        Ok(self
            .state
            .lock()
            .fixture
            .metadata
            .get(tag)
            .cloned()
            .unwrap_or_default())
    }

    fn first_child_bookmark(
        &mut self,
        _doc: DocumentHandle,
        parent: Option<BookmarkHandle>,
    ) -> Result<Option<BookmarkHandle>> {
        let mut state = self.state.lock();
        let path = match parent {
            None => Vec::new(),
            Some(handle) => state
                .bookmarks
                .get(&handle.raw())
                .cloned()
                .ok_or_else(|| Error::Native("unknown bookmark handle".into()))?,
        };
        let has_child = if path.is_empty() {
            !state.fixture.outline.is_empty()
        } else {
            state
                .bookmark_at(&path)
                .is_some_and(|b| !b.children.is_empty())
        };
        if !has_child {
            return Ok(None);
        }
        let mut child_path = path;
        child_path.push(0);
        Ok(Some(state.bookmark_handle(child_path)))
    }

    fn sibling_bookmark(
        &mut self,
        _doc: DocumentHandle,
        bookmark: BookmarkHandle,
    ) -> Result<Option<BookmarkHandle>> {
        let mut state = self.state.lock();
        let path = state
            .bookmarks
            .get(&bookmark.raw())
            .cloned()
            .ok_or_else(|| Error::Native("unknown bookmark handle".into()))?;
        if state.fixture.cyclic_outline {
            // Malformed outline: node is its own sibling forever.
            return Ok(Some(state.bookmark_handle(path)));
        }
        let (&last, parent_path) = path.split_last().expect("bookmark path is never empty");
        let sibling_count = if parent_path.is_empty() {
            state.fixture.outline.len()
        } else {
            state
                .bookmark_at(parent_path)
                .map_or(0, |b| b.children.len())
        };
        if last + 1 >= sibling_count {
            return Ok(None);
        }
        let mut sibling_path = parent_path.to_vec();
        sibling_path.push(last + 1);
        Ok(Some(state.bookmark_handle(sibling_path)))
    }

    fn bookmark_title(&mut self, bookmark: BookmarkHandle) -> Result<String> {
        let state = self.state.lock();
        let path = state
            .bookmarks
            .get(&bookmark.raw())
            .ok_or_else(|| Error::Native("unknown bookmark handle".into()))?;
        Ok(state
            .bookmark_at(path)
            .map(|b| b.title.clone())
            .unwrap_or_default())
    }

    fn bookmark_dest_index(
        &mut self,
        _doc: DocumentHandle,
        bookmark: BookmarkHandle,
    ) -> Result<u32> {
        let state = self.state.lock();
        let path = state
            .bookmarks
            .get(&bookmark.raw())
            .ok_or_else(|| Error::Native("unknown bookmark handle".into()))?;
        Ok(state.bookmark_at(path).map(|b| b.dest).unwrap_or_default())
    }

    fn page_links(&mut self, page: PageHandle) -> Result<Vec<LinkHandle>> {
        let mut state = self.state.lock();
        let page_idx = *state
            .pages
            .get(&page.raw())
            .ok_or_else(|| Error::Native("unknown page handle".into()))?;
        let count = state.fixture.pages[page_idx].links.len();
        let mut handles = Vec::with_capacity(count);
        for link_idx in 0..count {
            let raw = state.mint();
            state.links.insert(raw, (page_idx, link_idx));
            handles.push(LinkHandle::from_raw(raw));
        }
        Ok(handles)
    }

    fn link_dest_index(&mut self, _page: PageHandle, link: LinkHandle) -> Result<u32> {
        let state = self.state.lock();
        let &(page_idx, link_idx) = state
            .links
            .get(&link.raw())
            .ok_or_else(|| Error::Native("unknown link handle".into()))?;
        Ok(state.fixture.pages[page_idx].links[link_idx].dest)
    }

    fn link_uri(&mut self, _page: PageHandle, link: LinkHandle) -> Result<Option<String>> {
        let state = self.state.lock();
        let &(page_idx, link_idx) = state
            .links
            .get(&link.raw())
            .ok_or_else(|| Error::Native("unknown link handle".into()))?;
        Ok(state.fixture.pages[page_idx].links[link_idx].uri.clone())
    }

    fn link_rect(&mut self, link: LinkHandle) -> Result<Option<Rect>> {
        let state = self.state.lock();
        let &(page_idx, link_idx) = state
            .links
            .get(&link.raw())
            .ok_or_else(|| Error::Native("unknown link handle".into()))?;
        Ok(state.fixture.pages[page_idx].links[link_idx].rect)
    }

    fn render_to_buffer(
        &mut self,
        page: PageHandle,
        target: &mut PixelBuffer<'_>,
        _origin_x: i32,
        _origin_y: i32,
        _width: i32,
        _height: i32,
        background: u32,
        _render_annotations: bool,
    ) -> Result<()> {
        let mut state = self.state.lock();
        if state.page_fixture(page)?.fail_render {
            return Err(Error::Native("simulated renderer fault".into()));
        }
        target.pixels.fill((background & 0xFF) as u8);
        state.ledger.render_calls += 1;
        Ok(())
    }

    fn render_to_surface(
        &mut self,
        page: PageHandle,
        _surface: SurfaceHandle,
        _origin_x: i32,
        _origin_y: i32,
        _width: i32,
        _height: i32,
        _render_annotations: bool,
    ) -> Result<()> {
        let mut state = self.state.lock();
        if state.page_fixture(page)?.fail_render {
            return Err(Error::Native("simulated renderer fault".into()));
        }
        state.ledger.render_calls += 1;
        Ok(())
    }

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
    ) -> Result<Point> {
        let state = self.state.lock();
        let fixture = state.page_fixture(page)?;
        let u = page_x / fixture.width as f64;
        let v = page_y / fixture.height as f64;
        let (nx, ny) = match rotation {
            0 => (u, v),
            1 => (1.0 - v, u),
            2 => (1.0 - u, 1.0 - v),
            3 => (v, 1.0 - u),
            _ => return Err(Error::Native("invalid rotation".into())),
        };
        Ok(Point::new(
            origin_x + (nx * size_x as f64).round() as i32,
            origin_y + (ny * size_y as f64).round() as i32,
        ))
    }

    fn load_text_page(&mut self, page: PageHandle) -> Result<TextHandle> {
        let mut state = self.state.lock();
        let page_idx = *state
            .pages
            .get(&page.raw())
            .ok_or_else(|| Error::Native("unknown page handle".into()))?;
        let raw = state.mint();
        state.texts.insert(raw, page_idx);
        state.ledger.opened += 1;
        Ok(TextHandle::from_raw(raw))
    }

    fn close_text_page(&mut self, text: TextHandle) -> Result<()> {
        let mut state = self.state.lock();
        state
            .texts
            .remove(&text.raw())
            .ok_or_else(|| Error::Native("text handle released twice".into()))?;
        state.ledger.released += 1;
        Ok(())
    }

    fn char_count(&mut self, text: TextHandle) -> Result<u32> {
        let state = self.state.lock();
        Ok(state.text_page_fixture(text)?.text.chars().count() as u32)
    }

    fn text_range(&mut self, text: TextHandle, start: u32, count: u32) -> Result<String> {
        let mut state = self.state.lock();
        state.ledger.extraction_calls += 1;
        let content = &state.text_page_fixture(text)?.text;
        Ok(content
            .chars()
            .skip(start as usize)
            .take(count as usize)
            .collect())
    }

    fn count_rects(&mut self, text: TextHandle, start: u32, count: u32) -> Result<u32> {
        let mut state = self.state.lock();
        let total = state.text_page_fixture(text)?.text.chars().count() as u32;
        let start = start.min(total);
        let end = (start + count).min(total);
        // One synthetic rectangle per 10-character run.
        let mut rects = Vec::new();
        let mut at = start;
        while at < end {
            let run_end = (at + 10).min(end);
            rects.push(Rect::new(at as f32, 0.0, run_end as f32, 10.0));
            at = run_end;
        }
        let n = rects.len() as u32;
        state.last_rects.insert(text.raw(), rects);
        Ok(n)
    }

    fn get_rect(&mut self, text: TextHandle, index: u32) -> Result<Rect> {
        let state = self.state.lock();
        state
            .last_rects
            .get(&text.raw())
            .and_then(|rects| rects.get(index as usize))
            .copied()
            .ok_or_else(|| Error::Native("rect index out of range".into()))
    }

    fn find_start(
        &mut self,
        text: TextHandle,
        query: &str,
        flags: u32,
        start_index: i32,
    ) -> Result<SearchHandle> {
        let mut state = self.state.lock();
        let content = state.text_page_fixture(text)?.text.clone();
        let hits = compute_hits(&content, query, flags);
        let from = if start_index < 0 {
            usize::MAX
        } else {
            start_index as usize
        };
        let raw = state.mint();
        state.searches.insert(
            raw,
            FakeSearch {
                hits,
                cur: None,
                from,
            },
        );
        state.ledger.opened += 1;
        Ok(SearchHandle::from_raw(raw))
    }

    fn find_next(&mut self, search: SearchHandle) -> Result<bool> {
        let mut state = self.state.lock();
        let s = state
            .searches
            .get_mut(&search.raw())
            .ok_or_else(|| Error::Native("unknown search handle".into()))?;
        let next = match s.cur {
            None => s.hits.iter().position(|h| h.0 as usize >= s.from),
            Some(i) => (i + 1 < s.hits.len()).then_some(i + 1),
        };
        match next {
            Some(i) => {
                s.cur = Some(i);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn find_prev(&mut self, search: SearchHandle) -> Result<bool> {
        let mut state = self.state.lock();
        let s = state
            .searches
            .get_mut(&search.raw())
            .ok_or_else(|| Error::Native("unknown search handle".into()))?;
        let prev = match s.cur {
            None => s.hits.iter().rposition(|h| (h.0 as usize) <= s.from),
            Some(i) => i.checked_sub(1),
        };
        match prev {
            Some(i) => {
                s.cur = Some(i);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn result_index(&mut self, search: SearchHandle) -> Result<u32> {
        let state = self.state.lock();
        let s = state
            .searches
            .get(&search.raw())
            .ok_or_else(|| Error::Native("unknown search handle".into()))?;
        let cur = s
            .cur
            .ok_or_else(|| Error::Native("search cursor not positioned".into()))?;
        Ok(s.hits[cur].0)
    }

    fn result_count(&mut self, search: SearchHandle) -> Result<u32> {
        let state = self.state.lock();
        let s = state
            .searches
            .get(&search.raw())
            .ok_or_else(|| Error::Native("unknown search handle".into()))?;
        let cur = s
            .cur
            .ok_or_else(|| Error::Native("search cursor not positioned".into()))?;
        Ok(s.hits[cur].1)
    }

    fn close_search(&mut self, search: SearchHandle) -> Result<()> {
        let mut state = self.state.lock();
        state
            .searches
            .remove(&search.raw())
            .ok_or_else(|| Error::Native("search handle released twice".into()))?;
        state.ledger.released += 1;
        Ok(())
    }
}
