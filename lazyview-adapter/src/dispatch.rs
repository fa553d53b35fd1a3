use alloc::boxed::Box;
use alloc::vec::Vec;

use lazyview::{
    Item, ItemKey, LoadError, LoadOutcome, LoadRequest, ScrollState, SearchMatcher, Viewport,
    ViewportEvent, ViewportKey,
};

type ScrollFn<K> = Box<dyn FnMut(ScrollState, &Viewport<K>)>;
type SelectionFn<K> = Box<dyn FnMut(&[K], &Viewport<K>)>;
type ActivateFn<K> = Box<dyn FnMut(&K, &Item<K>, &Viewport<K>)>;
type LoadFn<K> = Box<dyn FnMut(&LoadRequest<K>) -> Result<Vec<Item<K>>, LoadError>>;
type ResizeFn<K> = Box<dyn FnMut(u32, u32, &Viewport<K>)>;
type LoadErrorFn<K> = Box<dyn FnMut(&[K], &str, &Viewport<K>)>;
type EventFn<K> = Box<dyn FnMut(&ViewportEvent<K>, &Viewport<K>)>;

/// What one [`Dispatcher::pump`] did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PumpReport {
    /// Events drained from the viewport (dispatched or not).
    pub events: usize,
    pub loads: LoadOutcome,
}

/// Bridges the viewport's event queue to host callbacks.
///
/// The viewport never calls host code itself; a host that prefers callbacks registers them here
/// and calls [`Self::pump`] after each batch of input. Every callback is optional.
pub struct Dispatcher<K = ItemKey> {
    on_scroll: Option<ScrollFn<K>>,
    on_selection_change: Option<SelectionFn<K>>,
    on_item_activate: Option<ActivateFn<K>>,
    on_lazy_load: Option<LoadFn<K>>,
    on_resize: Option<ResizeFn<K>>,
    on_load_error: Option<LoadErrorFn<K>>,
    on_event: Option<EventFn<K>>,
}

impl<K> Default for Dispatcher<K> {
    fn default() -> Self {
        Self {
            on_scroll: None,
            on_selection_change: None,
            on_item_activate: None,
            on_lazy_load: None,
            on_resize: None,
            on_load_error: None,
            on_event: None,
        }
    }
}

impl<K> core::fmt::Debug for Dispatcher<K> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("on_scroll", &self.on_scroll.is_some())
            .field("on_selection_change", &self.on_selection_change.is_some())
            .field("on_item_activate", &self.on_item_activate.is_some())
            .field("on_lazy_load", &self.on_lazy_load.is_some())
            .field("on_resize", &self.on_resize.is_some())
            .field("on_load_error", &self.on_load_error.is_some())
            .field("on_event", &self.on_event.is_some())
            .finish()
    }
}

impl<K: ViewportKey + 'static> Dispatcher<K> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_on_scroll(mut self, f: impl FnMut(ScrollState, &Viewport<K>) + 'static) -> Self {
        self.on_scroll = Some(Box::new(f));
        self
    }

    pub fn with_on_selection_change(
        mut self,
        f: impl FnMut(&[K], &Viewport<K>) + 'static,
    ) -> Self {
        self.on_selection_change = Some(Box::new(f));
        self
    }

    /// Called with the activated identity and its current item data.
    pub fn with_on_item_activate(
        mut self,
        f: impl FnMut(&K, &Item<K>, &Viewport<K>) + 'static,
    ) -> Self {
        self.on_item_activate = Some(Box::new(f));
        self
    }

    /// The loader for lazily materialized items. Without one, load requests stay queued on the
    /// viewport for the host to take.
    pub fn with_on_lazy_load(
        mut self,
        f: impl FnMut(&LoadRequest<K>) -> Result<Vec<Item<K>>, LoadError> + 'static,
    ) -> Self {
        self.on_lazy_load = Some(Box::new(f));
        self
    }

    pub fn with_on_resize(mut self, f: impl FnMut(u32, u32, &Viewport<K>) + 'static) -> Self {
        self.on_resize = Some(Box::new(f));
        self
    }

    /// Error channel for lazy loads: the failed identities and the loader's reason.
    pub fn with_on_load_error(mut self, f: impl FnMut(&[K], &str, &Viewport<K>) + 'static) -> Self {
        self.on_load_error = Some(Box::new(f));
        self
    }

    /// Sees every event, after the specific callback (if any) ran.
    pub fn with_on_event(mut self, f: impl FnMut(&ViewportEvent<K>, &Viewport<K>) + 'static) -> Self {
        self.on_event = Some(Box::new(f));
        self
    }

    /// Services queued load requests and dispatches queued events until both queues are empty.
    pub fn pump(&mut self, viewport: &mut Viewport<K>) -> PumpReport {
        let mut report = PumpReport::default();
        loop {
            if let Some(loader) = self.on_lazy_load.as_mut() {
                let outcome = viewport.drive_loads(loader);
                report.loads.applied += outcome.applied;
                report.loads.failed += outcome.failed;
                report.loads.discarded += outcome.discarded;
            }
            let events = viewport.drain_events();
            if events.is_empty() {
                break;
            }
            report.events += events.len();
            for event in &events {
                self.dispatch(event, viewport);
            }
        }
        report
    }

    fn dispatch(&mut self, event: &ViewportEvent<K>, viewport: &Viewport<K>) {
        match event {
            ViewportEvent::Scrolled { offset, max_offset } => {
                if let Some(f) = self.on_scroll.as_mut() {
                    let state = ScrollState {
                        offset: *offset,
                        max_offset: *max_offset,
                    };
                    f(state, viewport);
                }
            }
            ViewportEvent::SelectionChanged { selected } => {
                if let Some(f) = self.on_selection_change.as_mut() {
                    f(selected, viewport);
                }
            }
            ViewportEvent::ItemActivated { identity, .. } => {
                // The item may have been removed since the event was queued.
                let item = viewport.get_item(identity);
                if let (Some(f), Some(item)) = (self.on_item_activate.as_mut(), item) {
                    f(identity, item, viewport);
                }
            }
            ViewportEvent::Resized { width, height } => {
                if let Some(f) = self.on_resize.as_mut() {
                    f(*width, *height, viewport);
                }
            }
            ViewportEvent::LoadFailed { identities, reason } => {
                if let Some(f) = self.on_load_error.as_mut() {
                    f(identities, reason, viewport);
                }
            }
            ViewportEvent::HighlightChanged { .. }
            | ViewportEvent::SearchChanged { .. }
            | ViewportEvent::ItemsChanged { .. } => {}
        }
        if let Some(f) = self.on_event.as_mut() {
            f(event, viewport);
        }
    }
}

/// Installs a host search callback as the viewport's matcher.
///
/// `on_search` receives the query and every item in logical order and returns matching indices.
/// Output is bounds-checked and re-sorted by the viewport.
pub fn install_search<K: ViewportKey>(
    viewport: &mut Viewport<K>,
    on_search: impl Fn(&str, &[&Item<K>]) -> Vec<usize> + Send + Sync + 'static,
) {
    viewport.set_matcher(SearchMatcher::custom(on_search));
}
