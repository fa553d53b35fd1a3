use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;

use crate::cache::LruCache;
use crate::key::ViewportKey;
use crate::lazy::{LazyCoordinator, LazyLoader, LoadOutcome, LoadRequest, LoadTicket};
use crate::scroll::ScrollController;
use crate::search::{SearchIndex, SearchMatcher, SearchState, sanitize_matches, substring_matches};
use crate::selection::{SelectOutcome, Selection};
use crate::store::ContentStore;
use crate::{
    Align, CacheStats, Item, ItemKey, ItemRuntimeState, Key, KeyPress, LoadError, ScrollState,
    SelectionMode, ViewportError, ViewportEvent, ViewportOptions, ViewportState, VisibleRange,
};

/// What to paint for one visible row.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RowContent {
    Text(Arc<str>),
    /// The item is `NotLoaded` or `Loading` and nothing is cached for it yet.
    Pending,
    /// The item's lazy load failed; carries the loader's reason.
    Failed(String),
}

impl RowContent {
    pub const PENDING_TEXT: &'static str = "loading...";
    pub const FAILED_TEXT: &'static str = "failed to load";

    /// The line to paint, substituting placeholder text for unresolved rows.
    pub fn text(&self) -> &str {
        match self {
            Self::Text(text) => text,
            Self::Pending => Self::PENDING_TEXT,
            Self::Failed(_) => Self::FAILED_TEXT,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        !matches!(self, Self::Text(_))
    }
}

/// One entry of [`Viewport::render`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderedRow<K = ItemKey> {
    pub index: usize,
    pub identity: K,
    /// Logical rows occupied (always at least one).
    pub height: u32,
    pub content: RowContent,
    pub selected: bool,
    pub highlighted: bool,
    pub search_match: bool,
}

/// A headless virtualized viewport.
///
/// This type is UI-agnostic:
/// - It holds the items, the scroll position, selection, search and lazy load bookkeeping.
/// - The host feeds it decoded input and geometry, and paints the rows returned by
///   [`Self::render`].
/// - Every mutator is synchronous and leaves the state consistent. Notifications queue up as
///   [`ViewportEvent`]s until drained; lazy loads are handed out as [`LoadRequest`]s and
///   completed with [`Self::complete_load`].
///
/// For a callback-style host integration and smooth scrolling, see the `lazyview-adapter` crate.
#[derive(Debug)]
pub struct Viewport<K = ItemKey> {
    options: ViewportOptions,
    store: ContentStore<K>,
    cache: LruCache<K, Arc<str>>,
    lazy: LazyCoordinator<K>,
    index: SearchIndex,
    search: SearchState,
    matcher: SearchMatcher<K>,
    selection: Selection<K>,
    highlighted: Option<K>,
    scroll: ScrollController,

    events: Vec<ViewportEvent<K>>,
    dirty: bool,
    destroyed: bool,

    batch_depth: usize,
    batch_origin: u64,
    scroll_pending: bool,
}

impl<K: ViewportKey> Viewport<K> {
    /// Creates a viewport over `items`.
    ///
    /// Fails if the options are invalid (zero cache capacity or item height) or if two items
    /// share an identity.
    pub fn new(
        options: ViewportOptions,
        items: impl IntoIterator<Item = Item<K>>,
    ) -> Result<Self, ViewportError> {
        options.validate()?;
        let store = ContentStore::from_items(items)?;
        let cache = LruCache::new(options.cache_capacity)?;
        vdebug!(
            count = store.len(),
            cache_capacity = options.cache_capacity,
            lazy_loading = options.lazy_loading,
            virtual_scrolling = options.virtual_scrolling,
            "Viewport::new"
        );
        let mut v = Self {
            store,
            cache,
            lazy: LazyCoordinator::new(),
            index: SearchIndex::new(),
            search: SearchState::default(),
            matcher: SearchMatcher::default(),
            selection: Selection::new(options.selection_mode),
            highlighted: None,
            scroll: ScrollController::new(&options),
            options,
            events: Vec::new(),
            dirty: true,
            destroyed: false,
            batch_depth: 0,
            batch_origin: 0,
            scroll_pending: false,
        };
        v.rebuild_extents();
        v.rebuild_index();
        v.observe_range();
        Ok(v)
    }

    pub fn options(&self) -> &ViewportOptions {
        &self.options
    }

    // ---- content -------------------------------------------------------------------------

    pub fn item_count(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.len() == 0
    }

    pub fn get_item(&self, identity: &K) -> Option<&Item<K>> {
        self.store.get(identity)
    }

    pub fn item_at(&self, index: usize) -> Option<&Item<K>> {
        self.store.item_at(index)
    }

    pub fn index_of(&self, identity: &K) -> Option<usize> {
        self.store.index_of(identity)
    }

    /// Iterates every item in logical order.
    pub fn items(&self) -> impl Iterator<Item = &Item<K>> + '_ {
        self.store.items()
    }

    /// Replaces every item. Lazy state, in-flight loads and cached content are reset.
    ///
    /// On error (duplicate identity) the viewport is left untouched.
    pub fn set_items(&mut self, items: impl IntoIterator<Item = Item<K>>) -> Result<(), ViewportError> {
        if self.destroyed {
            return Err(ViewportError::Destroyed);
        }
        self.store = ContentStore::from_items(items)?;
        vdebug!(count = self.store.len(), "set_items");
        self.lazy.clear();
        self.cache.clear();
        self.events.push(ViewportEvent::ItemsChanged {
            count: self.store.len(),
        });
        self.content_changed();
        Ok(())
    }

    /// Inserts `item` at `index`, or appends when `index` is `None` or past the end.
    ///
    /// Returns the position the item landed at.
    pub fn add_item(&mut self, item: Item<K>, index: Option<usize>) -> Result<usize, ViewportError> {
        if self.destroyed {
            return Err(ViewportError::Destroyed);
        }
        let identity = item.identity.clone();
        let position = self.store.insert(index, item)?;
        self.cache.remove(&identity);
        vtrace!(position, "add_item");
        self.events.push(ViewportEvent::ItemsChanged {
            count: self.store.len(),
        });
        self.content_changed();
        Ok(position)
    }

    /// Removes an item by identity. Selection, highlight and search are pruned accordingly; an
    /// in-flight load for it becomes stale.
    pub fn remove_item(&mut self, identity: &K) -> Option<Item<K>> {
        if self.destroyed {
            return None;
        }
        let record = self.store.remove(identity)?;
        self.cache.remove(identity);
        vtrace!(position = record.position, "remove_item");
        self.events.push(ViewportEvent::ItemsChanged {
            count: self.store.len(),
        });
        self.content_changed();
        Some(record.item)
    }

    /// Replaces the data of an existing identity, returning the previous item.
    ///
    /// The new data counts as realized: an observed item becomes `Loaded` and any in-flight
    /// load for it is superseded.
    pub fn replace_item(&mut self, item: Item<K>) -> Option<Item<K>> {
        if self.destroyed {
            return None;
        }
        let identity = item.identity.clone();
        let old = self.store.replace(item)?;
        let mut was_loading = false;
        if let Some(record) = self.store.record_of_mut(&identity) {
            if let Some(state) = record.state.as_mut() {
                was_loading = *state == ItemRuntimeState::Loading;
                *state = ItemRuntimeState::Loaded;
            }
            record.inflight = None;
        }
        if was_loading {
            self.cache.unpin(&identity);
        }
        self.cache.remove(&identity);
        self.content_changed();
        Some(old)
    }

    // ---- scrolling -----------------------------------------------------------------------

    pub fn scroll_offset(&self) -> u64 {
        self.scroll.offset()
    }

    /// `max(0, total_extent - viewport_extent)`.
    pub fn max_scroll_offset(&self) -> u64 {
        self.scroll.max_offset()
    }

    /// Sum of all item extents, in rows.
    pub fn total_extent(&self) -> u64 {
        self.scroll.total_extent()
    }

    pub fn viewport_extent(&self) -> u64 {
        self.scroll.viewport_extent()
    }

    /// Indices to render, including overscan.
    pub fn visible_range(&self) -> VisibleRange {
        self.scroll.range()
    }

    /// Indices covering `[offset, offset + viewport_extent)`, without overscan.
    pub fn visible_rows(&self) -> VisibleRange {
        self.scroll.rows_in_view(self.scroll.offset())
    }

    /// Start offset of the item at `index`, in rows.
    pub fn item_offset(&self, index: usize) -> Option<u64> {
        self.scroll.item_start(index)
    }

    pub fn index_at_offset(&self, offset: u64) -> Option<usize> {
        self.scroll.index_at_offset(offset)
    }

    /// Scrolls to `offset`, clamped to `[0, max_scroll_offset]`.
    ///
    /// Returns `true` if the offset changed. An unchanged offset emits no notification.
    pub fn scroll_to(&mut self, offset: u64) -> bool {
        self.apply_offset(offset)
    }

    /// Scrolls by `lines` lines of `item_height` rows (negative = up).
    pub fn scroll_by_lines(&mut self, lines: i64) -> bool {
        let target = self.scroll.offset_by_lines(lines);
        self.apply_offset(target)
    }

    pub fn page_up(&mut self) -> bool {
        let page = self.scroll.page_lines() as i64;
        page > 0 && self.scroll_by_lines(-page)
    }

    pub fn page_down(&mut self) -> bool {
        let page = self.scroll.page_lines() as i64;
        page > 0 && self.scroll_by_lines(page)
    }

    pub fn scroll_to_top(&mut self) -> bool {
        self.apply_offset(0)
    }

    pub fn scroll_to_bottom(&mut self) -> bool {
        self.apply_offset(u64::MAX)
    }

    /// Scrolls so the item at `index` is positioned according to `align`.
    ///
    /// Returns `false` if `index` is out of range. Unlike [`Self::scroll_to`], a valid index
    /// returns `true` even when no movement was needed.
    pub fn scroll_to_index(&mut self, index: usize, align: Align) -> bool {
        if self.destroyed {
            return false;
        }
        let Some(target) = self.scroll.offset_for_index(index, align) else {
            return false;
        };
        self.apply_offset(target);
        true
    }

    /// Same as [`Self::scroll_to_index`], addressing the item by identity.
    pub fn scroll_to_item(&mut self, identity: &K, align: Align) -> bool {
        match self.store.index_of(identity) {
            Some(index) => self.scroll_to_index(index, align),
            None => false,
        }
    }

    /// Applies a host resize. The offset is reclamped and the range recomputed.
    ///
    /// Returns `false` if the size is unchanged.
    pub fn resize(&mut self, width: u32, height: u32) -> bool {
        if self.destroyed || (self.options.width == width && self.options.height == height) {
            return false;
        }
        vtrace!(width, height, "resize");
        self.options.width = width;
        self.options.height = height;
        self.scroll.set_viewport(height as u64);
        self.events.push(ViewportEvent::Resized { width, height });
        if self.scroll.reclamp().is_some() {
            self.notify_scrolled();
        }
        self.observe_range();
        self.dirty = true;
        true
    }

    pub fn set_overscan(&mut self, overscan: usize) {
        if self.destroyed {
            return;
        }
        self.options.overscan_count = overscan;
        self.scroll.set_overscan(overscan);
        self.observe_range();
        self.dirty = true;
    }

    /// Batches multiple updates into a single `Scrolled` notification.
    ///
    /// Intermediate offsets are not reported; if the offset ends where it started, nothing is.
    pub fn batch_update(&mut self, f: impl FnOnce(&mut Self)) {
        if self.batch_depth == 0 {
            self.batch_origin = self.scroll.offset();
        }
        self.batch_depth = self.batch_depth.saturating_add(1);

        f(self);

        debug_assert!(self.batch_depth > 0, "batch_depth underflow");
        self.batch_depth = self.batch_depth.saturating_sub(1);
        if self.batch_depth == 0
            && core::mem::take(&mut self.scroll_pending)
            && self.scroll.offset() != self.batch_origin
        {
            self.notify_scrolled();
        }
    }

    pub fn scroll_state(&self) -> ScrollState {
        ScrollState {
            offset: self.scroll.offset(),
            max_offset: self.scroll.max_offset(),
        }
    }

    /// Restores a previously captured scroll position (clamped to the current content).
    pub fn restore_scroll_state(&mut self, scroll: ScrollState) -> bool {
        self.apply_offset(scroll.offset)
    }

    // ---- input ---------------------------------------------------------------------------

    /// Translates a decoded key into viewport operations. Returns `true` if the key was handled.
    ///
    /// | key | action |
    /// |-----|--------|
    /// | Up / `k`, Down / `j` | move the highlight (Shift extends the selection) |
    /// | PageUp / PageDown | scroll one page |
    /// | Home / `g`, End / `G` | jump to the first / last item |
    /// | Enter | activate the highlighted item |
    /// | Space | toggle selection of the highlighted item |
    /// | Ctrl+`a` | select all |
    /// | `n` / `N` | next / previous search result |
    /// | Escape | clear the search, or the selection when no search is active |
    pub fn handle_key(&mut self, press: impl Into<KeyPress>) -> bool {
        if self.destroyed {
            return false;
        }
        let press = press.into();
        let mods = press.modifiers;
        match press.key {
            Key::Char('a') if mods.ctrl => self.select_all(),
            Key::Up | Key::Char('k') => self.step_highlight(-1, mods.shift),
            Key::Down | Key::Char('j') => self.step_highlight(1, mods.shift),
            Key::PageUp => {
                self.page_up();
                !self.is_empty()
            }
            Key::PageDown => {
                self.page_down();
                !self.is_empty()
            }
            Key::Home | Key::Char('g') => {
                self.scroll_to_top();
                self.highlight_index(0)
            }
            Key::End | Key::Char('G') => {
                self.scroll_to_bottom();
                self.highlight_index(self.store.len().saturating_sub(1))
            }
            Key::Enter => match self.highlighted.clone() {
                Some(identity) => self.activate_item(&identity),
                None => false,
            },
            Key::Space => match self.highlighted.clone() {
                Some(identity) => self.toggle_selection(&identity),
                None => false,
            },
            Key::Char('n') => self.next_search_result().is_some(),
            Key::Char('N') => self.previous_search_result().is_some(),
            Key::Escape => {
                if self.search.is_active() {
                    self.search("");
                    true
                } else {
                    self.clear_selection()
                }
            }
            _ => false,
        }
    }

    /// Scrolls by a wheel delta. Positive `delta_y` scrolls down.
    ///
    /// The delta is multiplied by `scroll_sensitivity` and rounded to whole lines; any non-zero
    /// delta moves at least one line.
    pub fn handle_wheel(&mut self, delta_y: f32) -> bool {
        let scaled = delta_y * self.options.scroll_sensitivity;
        if !scaled.is_finite() || scaled == 0.0 {
            return false;
        }
        let rounded = if scaled > 0.0 {
            (scaled + 0.5) as i64
        } else {
            (scaled - 0.5) as i64
        };
        let lines = if rounded == 0 {
            if scaled > 0.0 { 1 } else { -1 }
        } else {
            rounded
        };
        self.scroll_by_lines(lines)
    }

    /// Emits [`ViewportEvent::ItemActivated`] for `identity`.
    pub fn activate_item(&mut self, identity: &K) -> bool {
        if self.destroyed {
            return false;
        }
        let Some(index) = self.store.index_of(identity) else {
            return false;
        };
        self.events.push(ViewportEvent::ItemActivated {
            identity: identity.clone(),
            index,
        });
        true
    }

    // ---- selection -----------------------------------------------------------------------

    pub fn selection_mode(&self) -> SelectionMode {
        self.selection.mode()
    }

    /// Selected identities in selection order.
    pub fn selected(&self) -> &[K] {
        self.selection.items()
    }

    pub fn is_selected(&self, identity: &K) -> bool {
        self.selection.contains(identity)
    }

    pub fn selection_anchor(&self) -> Option<&K> {
        self.selection.anchor()
    }

    /// Bumps on every selection change.
    pub fn selection_revision(&self) -> u64 {
        self.selection.revision()
    }

    /// Selects `identity` (replacing the selection in `Single` mode).
    ///
    /// Fails without side effects if selection is disabled, or if the identity is missing or
    /// not selectable.
    pub fn select_item(&mut self, identity: &K) -> bool {
        if self.destroyed || !self.is_selectable(identity) {
            return false;
        }
        let outcome = self.selection.select(identity.clone());
        self.finish_selection(outcome)
    }

    pub fn deselect_item(&mut self, identity: &K) -> bool {
        if self.destroyed {
            return false;
        }
        let outcome = self.selection.deselect(identity);
        self.finish_selection(outcome)
    }

    pub fn toggle_selection(&mut self, identity: &K) -> bool {
        let selectable = self.selection.contains(identity) || self.is_selectable(identity);
        if self.destroyed || !selectable {
            return false;
        }
        let outcome = self.selection.toggle(identity.clone());
        self.finish_selection(outcome)
    }

    /// Selects every selectable item (`Multiple` mode only).
    pub fn select_all(&mut self) -> bool {
        if self.destroyed {
            return false;
        }
        let keys: Vec<K> = self
            .store
            .items()
            .filter(|item| item.selectable)
            .map(|item| item.identity.clone())
            .collect();
        let outcome = self.selection.select_all(keys);
        self.finish_selection(outcome)
    }

    pub fn clear_selection(&mut self) -> bool {
        if self.destroyed {
            return false;
        }
        let outcome = self.selection.clear();
        self.finish_selection(outcome)
    }

    /// Selects the selectable items between the anchor and `identity` (inclusive), keeping the
    /// anchor. Without an anchor this behaves like [`Self::select_item`]. `Multiple` mode only.
    pub fn extend_selection_to(&mut self, identity: &K) -> bool {
        if self.destroyed
            || self.selection.mode() != SelectionMode::Multiple
            || !self.is_selectable(identity)
        {
            return false;
        }
        let Some(target) = self.store.index_of(identity) else {
            return false;
        };
        let Some(anchor) = self.selection.anchor().and_then(|a| self.store.index_of(a)) else {
            return self.select_item(identity);
        };
        let (lo, hi) = if anchor <= target {
            (anchor, target)
        } else {
            (target, anchor)
        };
        let keys: Vec<K> = (lo..=hi)
            .filter_map(|i| self.store.item_at(i))
            .filter(|item| item.selectable)
            .map(|item| item.identity.clone())
            .collect();
        let outcome = self.selection.replace_keep_anchor(keys);
        self.finish_selection(outcome)
    }

    // ---- highlight -----------------------------------------------------------------------

    pub fn highlighted(&self) -> Option<&K> {
        self.highlighted.as_ref()
    }

    /// Moves keyboard focus to `identity` and scrolls it into view.
    pub fn highlight_item(&mut self, identity: &K) -> bool {
        if self.destroyed {
            return false;
        }
        let Some(index) = self.store.index_of(identity) else {
            return false;
        };
        if self.highlighted.as_ref() != Some(identity) {
            self.highlighted = Some(identity.clone());
            self.events.push(ViewportEvent::HighlightChanged {
                highlighted: self.highlighted.clone(),
            });
            self.dirty = true;
        }
        self.scroll_index_into_view(index);
        true
    }

    pub fn clear_highlight(&mut self) -> bool {
        if self.destroyed || self.highlighted.take().is_none() {
            return false;
        }
        self.events
            .push(ViewportEvent::HighlightChanged { highlighted: None });
        self.dirty = true;
        true
    }

    // ---- search --------------------------------------------------------------------------

    /// Runs `query` through the active matcher. Returns the number of matches.
    ///
    /// An empty query clears the search. Otherwise the first match becomes current and is
    /// scrolled into view.
    pub fn search(&mut self, query: &str) -> usize {
        if self.destroyed {
            return 0;
        }
        if query.is_empty() {
            if self.search.is_active() {
                self.search.clear();
                self.emit_search();
                self.dirty = true;
            }
            return 0;
        }
        let matches = self.run_matcher(query);
        self.search.query = String::from(query);
        self.search.set_matches(matches, true);
        vtrace!(matches = self.search.matches.len(), "search");
        self.emit_search();
        if let Some(index) = self.search.current_index() {
            self.scroll_index_into_view(index);
        }
        self.dirty = true;
        self.search.matches.len()
    }

    /// Advances to the next match (wrapping) and scrolls it into view. Returns its index.
    pub fn next_search_result(&mut self) -> Option<usize> {
        self.step_search(true)
    }

    /// Moves to the previous match (wrapping) and scrolls it into view. Returns its index.
    pub fn previous_search_result(&mut self) -> Option<usize> {
        self.step_search(false)
    }

    pub fn search_query(&self) -> &str {
        &self.search.query
    }

    /// Matching logical indices, ascending.
    pub fn search_matches(&self) -> &[usize] {
        &self.search.matches
    }

    /// Position of the current match within [`Self::search_matches`].
    pub fn current_match(&self) -> Option<usize> {
        self.search.current
    }

    /// Logical index of the current match.
    pub fn current_match_index(&self) -> Option<usize> {
        self.search.current_index()
    }

    pub fn search_index(&self) -> &SearchIndex {
        &self.index
    }

    /// Swaps the matcher and re-evaluates the active query.
    pub fn set_matcher(&mut self, matcher: SearchMatcher<K>) {
        self.matcher = matcher;
        self.refresh_search();
    }

    // ---- lazy loading --------------------------------------------------------------------

    pub fn lazy_state(&self, identity: &K) -> Option<&ItemRuntimeState> {
        self.store.record_of(identity)?.state.as_ref()
    }

    /// Hands out the load requests issued since the last call.
    pub fn take_load_requests(&mut self) -> Vec<LoadRequest<K>> {
        self.lazy.take_requests()
    }

    /// Number of issued loads that have not completed yet.
    pub fn pending_loads(&self) -> usize {
        self.lazy.in_flight()
    }

    /// Number of issued loads not yet handed out by [`Self::take_load_requests`].
    pub fn queued_loads(&self) -> usize {
        self.lazy.queued()
    }

    /// Completes a load, in any order relative to other loads.
    ///
    /// Results are matched by identity; items removed, reset or reloaded since the request was
    /// issued are discarded. A failure moves every still-owned item to `Error` and emits
    /// [`ViewportEvent::LoadFailed`].
    pub fn complete_load(
        &mut self,
        ticket: LoadTicket,
        result: Result<Vec<Item<K>>, LoadError>,
    ) -> LoadOutcome {
        if self.destroyed {
            return LoadOutcome {
                discarded: result.map(|items| items.len()).unwrap_or(0),
                ..LoadOutcome::default()
            };
        }
        let resolution = self.lazy.resolve(&mut self.store, ticket, result);

        for identity in &resolution.loaded {
            self.cache.unpin(identity);
            if let Some(item) = self.store.get(identity) {
                self.cache
                    .put(identity.clone(), Arc::from(item.content.as_str()));
            }
        }
        for identity in &resolution.failed {
            self.cache.unpin(identity);
        }
        if !resolution.failed.is_empty() {
            self.events.push(ViewportEvent::LoadFailed {
                identities: resolution.failed,
                reason: resolution.reason.unwrap_or_default(),
            });
            self.dirty = true;
        }
        if !resolution.loaded.is_empty() {
            self.content_changed();
        }
        resolution.outcome
    }

    /// Services queued requests with a synchronous `loader` until none remain.
    ///
    /// With `std`, a panicking loader is contained and reported as a load failure.
    pub fn drive_loads(&mut self, loader: &mut impl LazyLoader<K>) -> LoadOutcome {
        let mut total = LoadOutcome::default();
        loop {
            let requests = self.lazy.take_requests();
            if requests.is_empty() {
                break;
            }
            for request in requests {
                let result = invoke_loader(loader, &request);
                let outcome = self.complete_load(request.ticket, result);
                total.applied += outcome.applied;
                total.failed += outcome.failed;
                total.discarded += outcome.discarded;
            }
        }
        total
    }

    /// Puts an observed item back to `NotLoaded` so it is requested again while visible.
    pub fn reset_lazy_state(&mut self, identity: &K) -> bool {
        if self.destroyed {
            return false;
        }
        let Some(was_loading) = self.lazy.reset(&mut self.store, identity) else {
            return false;
        };
        if was_loading {
            self.cache.unpin(identity);
        }
        self.observe_range();
        self.dirty = true;
        true
    }

    // ---- rendering -----------------------------------------------------------------------

    /// Returns the rows of the visible range in order, serving content from the cache when
    /// possible. Unresolved rows become placeholders. Clears the dirty flag.
    pub fn render(&mut self) -> Vec<RenderedRow<K>> {
        if self.destroyed {
            return Vec::new();
        }
        let range = self.scroll.range();
        let end = range.end.min(self.store.len());
        let mut rows = Vec::with_capacity(end.saturating_sub(range.start));
        for index in range.start..end {
            let Some(record) = self.store.record_at(index) else {
                continue;
            };
            let identity = &record.item.identity;
            let content = match &record.state {
                None | Some(ItemRuntimeState::Loaded) => match self.cache.get(identity) {
                    Some(text) => RowContent::Text(Arc::clone(text)),
                    None => {
                        let text: Arc<str> = Arc::from(record.item.content.as_str());
                        self.cache.put(identity.clone(), Arc::clone(&text));
                        RowContent::Text(text)
                    }
                },
                Some(ItemRuntimeState::NotLoaded | ItemRuntimeState::Loading) => {
                    match self.cache.get(identity) {
                        Some(text) => RowContent::Text(Arc::clone(text)),
                        None => RowContent::Pending,
                    }
                }
                Some(ItemRuntimeState::Error(reason)) => RowContent::Failed(reason.clone()),
            };
            rows.push(RenderedRow {
                index,
                identity: identity.clone(),
                height: record.item.rows(),
                content,
                selected: self.selection.contains(identity),
                highlighted: self.highlighted.as_ref() == Some(identity),
                search_match: self.search.is_match(index),
            });
        }
        self.dirty = false;
        rows
    }

    /// Items in the visible range, straight from the store (no cache involvement).
    pub fn visible_items(&self) -> Vec<&Item<K>> {
        let range = self.scroll.range();
        (range.start..range.end)
            .filter_map(|i| self.store.item_at(i))
            .collect()
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn cache(&self) -> &LruCache<K, Arc<str>> {
        &self.cache
    }

    /// `true` when something visible changed since the last [`Self::render`].
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    // ---- notifications & lifecycle -------------------------------------------------------

    /// Takes every queued notification, oldest first.
    pub fn drain_events(&mut self) -> Vec<ViewportEvent<K>> {
        core::mem::take(&mut self.events)
    }

    pub fn has_events(&self) -> bool {
        !self.events.is_empty()
    }

    /// Returns a full snapshot of the mutable state.
    pub fn state(&self) -> ViewportState<K> {
        ViewportState {
            scroll: self.scroll_state(),
            visible_range: self.scroll.range(),
            total_extent: self.scroll.total_extent(),
            item_count: self.store.len(),
            selected: self.selection.items().to_vec(),
            anchor: self.selection.anchor().cloned(),
            highlighted: self.highlighted.clone(),
            search_query: self.search.query.clone(),
            search_matches: self.search.matches.clone(),
            current_match: self.search.current,
            lazy: self
                .store
                .records()
                .filter_map(|r| Some((r.item.identity.clone(), r.state.clone()?)))
                .collect(),
            dirty: self.dirty,
        }
    }

    /// Tears the engine down: clears the cache and the index, drops pending loads and queued
    /// events.
    ///
    /// Afterwards the retained items stay readable, but every mutator is inert: content
    /// mutators return [`ViewportError::Destroyed`] or `None`, the rest return `false` (or `0`),
    /// load completions are discarded and `render` returns nothing.
    pub fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        vdebug!(count = self.store.len(), "Viewport::destroy");
        self.destroyed = true;
        self.cache.clear();
        self.index.clear();
        self.search.clear();
        self.lazy.clear();
        self.events.clear();
        self.dirty = false;
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    // ---- internals -----------------------------------------------------------------------

    fn rebuild_extents(&mut self) {
        self.scroll.rebuild(self.store.items().map(|item| item.height));
    }

    fn rebuild_index(&mut self) {
        self.index
            .rebuild(self.store.items().map(|item| item.content.as_str()));
    }

    /// Extents, index, search, selection, highlight and offset after a content mutation.
    fn content_changed(&mut self) {
        self.rebuild_extents();
        self.rebuild_index();
        self.refresh_search();
        self.prune_selection();
        if self
            .highlighted
            .as_ref()
            .is_some_and(|h| !self.store.contains(h))
        {
            self.highlighted = None;
            self.events
                .push(ViewportEvent::HighlightChanged { highlighted: None });
        }
        if self.scroll.reclamp().is_some() {
            self.notify_scrolled();
        }
        self.observe_range();
        self.dirty = true;
    }

    fn observe_range(&mut self) {
        if !self.options.lazy_loading || self.destroyed {
            return;
        }
        let started = self.lazy.scan(&mut self.store, self.scroll.range());
        for identity in &started {
            self.cache.pin(identity);
        }
        if !started.is_empty() {
            self.dirty = true;
        }
    }

    fn apply_offset(&mut self, target: u64) -> bool {
        if self.destroyed || self.scroll.scroll_to(target).is_none() {
            return false;
        }
        vtrace!(
            offset = self.scroll.offset(),
            max = self.scroll.max_offset(),
            "scroll_to"
        );
        self.notify_scrolled();
        self.observe_range();
        self.dirty = true;
        true
    }

    fn notify_scrolled(&mut self) {
        if self.batch_depth > 0 {
            self.scroll_pending = true;
            return;
        }
        self.events.push(ViewportEvent::Scrolled {
            offset: self.scroll.offset(),
            max_offset: self.scroll.max_offset(),
        });
    }

    fn scroll_index_into_view(&mut self, index: usize) {
        if let Some(target) = self.scroll.offset_for_index(index, Align::Auto) {
            self.apply_offset(target);
        }
    }

    fn highlight_index(&mut self, index: usize) -> bool {
        match self.store.item_at(index).map(|item| item.identity.clone()) {
            Some(identity) => self.highlight_item(&identity),
            None => false,
        }
    }

    fn step_highlight(&mut self, delta: i64, extend: bool) -> bool {
        let count = self.store.len();
        if count == 0 {
            return false;
        }
        let current = self
            .highlighted
            .as_ref()
            .and_then(|h| self.store.index_of(h));
        let next = match current {
            Some(i) => (i as i64 + delta).clamp(0, count as i64 - 1) as usize,
            None => self.visible_rows().start.min(count - 1),
        };
        if !self.highlight_index(next) {
            return false;
        }
        if extend && self.selection.mode() == SelectionMode::Multiple {
            if let Some(identity) = self.highlighted.clone() {
                self.extend_selection_to(&identity);
            }
        }
        true
    }

    fn is_selectable(&self, identity: &K) -> bool {
        self.store.get(identity).is_some_and(|item| item.selectable)
    }

    fn finish_selection(&mut self, outcome: SelectOutcome) -> bool {
        if outcome == SelectOutcome::Changed {
            vtrace!(
                selected = self.selection.items().len(),
                revision = self.selection.revision(),
                "selection changed"
            );
            self.events.push(ViewportEvent::SelectionChanged {
                selected: self.selection.items().to_vec(),
            });
            self.dirty = true;
        }
        outcome.succeeded()
    }

    fn prune_selection(&mut self) {
        let store = &self.store;
        let changed = self
            .selection
            .retain(|k| store.get(k).is_some_and(|item| item.selectable));
        if changed {
            self.events.push(ViewportEvent::SelectionChanged {
                selected: self.selection.items().to_vec(),
            });
        }
    }

    fn run_matcher(&self, query: &str) -> Vec<usize> {
        match &self.matcher {
            SearchMatcher::Substring => substring_matches(query, self.store.items()),
            SearchMatcher::Token => self.index.query_tokens(query),
            SearchMatcher::Custom(f) => {
                let items: Vec<&Item<K>> = self.store.items().collect();
                sanitize_matches(f(query, &items), items.len())
            }
        }
    }

    /// Re-evaluates the active query against current content without scrolling.
    fn refresh_search(&mut self) {
        if !self.search.is_active() {
            return;
        }
        let query = core::mem::take(&mut self.search.query);
        let matches = self.run_matcher(&query);
        self.search.query = query;
        if matches != self.search.matches {
            self.search.set_matches(matches, false);
            self.emit_search();
        }
    }

    fn step_search(&mut self, forward: bool) -> Option<usize> {
        let index = self.search.step(forward)?;
        self.emit_search();
        self.scroll_index_into_view(index);
        self.dirty = true;
        Some(index)
    }

    fn emit_search(&mut self) {
        self.events.push(ViewportEvent::SearchChanged {
            query: self.search.query.clone(),
            match_count: self.search.matches.len(),
            current: self.search.current,
        });
    }
}

#[cfg(feature = "std")]
fn invoke_loader<K>(
    loader: &mut impl LazyLoader<K>,
    request: &LoadRequest<K>,
) -> Result<Vec<Item<K>>, LoadError> {
    use std::panic::{AssertUnwindSafe, catch_unwind};

    match catch_unwind(AssertUnwindSafe(|| loader.load(request))) {
        Ok(result) => result,
        Err(payload) => {
            vwarn!(ticket = request.ticket, "lazy loader panicked");
            let reason = if let Some(s) = payload.downcast_ref::<&str>() {
                String::from(*s)
            } else if let Some(s) = payload.downcast_ref::<String>() {
                s.clone()
            } else {
                String::from("loader panicked")
            };
            Err(LoadError::new(reason))
        }
    }
}

#[cfg(not(feature = "std"))]
fn invoke_loader<K>(
    loader: &mut impl LazyLoader<K>,
    request: &LoadRequest<K>,
) -> Result<Vec<Item<K>>, LoadError> {
    loader.load(request)
}
