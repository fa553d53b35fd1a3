use lazyview::{Align, Item, ItemKey, KeyPress, ScrollMode, Viewport, ViewportError, ViewportKey};

use crate::{Easing, ScrollAnchor, Tween, set_items_anchored};

/// Wraps a [`Viewport`] and turns its offset changes into a display offset, animated according
/// to `ViewportOptions::scroll_mode`.
///
/// - `Instant` snaps on every change.
/// - `Smooth` tweens every change.
/// - `Auto` tweens jumps of at least one page and snaps smaller moves (wheel, arrows).
///
/// The viewport itself always moves instantly; lazy loads and the visible range follow the
/// real offset. Hosts call [`Self::tick`] each frame and paint at [`Self::display_offset`].
#[derive(Debug)]
pub struct Controller<K = ItemKey> {
    viewport: Viewport<K>,
    tween: Option<Tween>,
    display: u64,
    duration_ms: u64,
    easing: Easing,
}

impl<K: ViewportKey> Controller<K> {
    pub fn new(viewport: Viewport<K>) -> Self {
        Self {
            display: viewport.scroll_offset(),
            viewport,
            tween: None,
            duration_ms: 160,
            easing: Easing::SmoothStep,
        }
    }

    pub fn with_animation(mut self, duration_ms: u64, easing: Easing) -> Self {
        self.duration_ms = duration_ms;
        self.easing = easing;
        self
    }

    pub fn viewport(&self) -> &Viewport<K> {
        &self.viewport
    }

    /// Direct access to the viewport. Offset changes made through it are not animated; the
    /// display offset snaps on the next [`Self::tick`].
    pub fn viewport_mut(&mut self) -> &mut Viewport<K> {
        &mut self.viewport
    }

    pub fn into_viewport(self) -> Viewport<K> {
        self.viewport
    }

    pub fn is_animating(&self) -> bool {
        self.tween.is_some()
    }

    /// Stops any tween and snaps the display offset to the viewport.
    pub fn cancel_animation(&mut self) {
        self.tween = None;
        self.display = self.viewport.scroll_offset();
    }

    /// The offset the host should paint at, as of the last [`Self::tick`].
    pub fn display_offset(&self) -> u64 {
        self.display
    }

    /// Advances the tween. Returns the display offset while animating, `None` when idle.
    pub fn tick(&mut self, now_ms: u64) -> Option<u64> {
        let Some(tween) = self.tween else {
            self.display = self.viewport.scroll_offset();
            return None;
        };
        self.display = tween.sample(now_ms);
        if tween.is_done(now_ms) {
            self.tween = None;
        }
        Some(self.display)
    }

    /// Runs `f` against the viewport and animates whatever offset change it caused.
    pub fn update<R>(&mut self, now_ms: u64, f: impl FnOnce(&mut Viewport<K>) -> R) -> R {
        let from = self.current(now_ms);
        let before = self.viewport.scroll_offset();
        let out = f(&mut self.viewport);
        if self.viewport.scroll_offset() != before {
            self.follow(from, now_ms);
        }
        out
    }

    pub fn scroll_to(&mut self, offset: u64, now_ms: u64) -> bool {
        self.update(now_ms, |v| v.scroll_to(offset))
    }

    pub fn scroll_to_index(&mut self, index: usize, align: Align, now_ms: u64) -> bool {
        self.update(now_ms, |v| v.scroll_to_index(index, align))
    }

    pub fn scroll_to_item(&mut self, identity: &K, align: Align, now_ms: u64) -> bool {
        self.update(now_ms, |v| v.scroll_to_item(identity, align))
    }

    pub fn page_down(&mut self, now_ms: u64) -> bool {
        self.update(now_ms, Viewport::page_down)
    }

    pub fn page_up(&mut self, now_ms: u64) -> bool {
        self.update(now_ms, Viewport::page_up)
    }

    pub fn handle_key(&mut self, press: impl Into<KeyPress>, now_ms: u64) -> bool {
        let press = press.into();
        self.update(now_ms, |v| v.handle_key(press))
    }

    pub fn handle_wheel(&mut self, delta_y: f32, now_ms: u64) -> bool {
        self.update(now_ms, |v| v.handle_wheel(delta_y))
    }

    /// Replaces the items while keeping the first visible item in place. Never animated.
    pub fn set_items_anchored(
        &mut self,
        items: impl IntoIterator<Item = Item<K>>,
    ) -> Result<bool, ViewportError> {
        let applied = set_items_anchored(&mut self.viewport, items)?;
        self.cancel_animation();
        Ok(applied)
    }

    pub fn capture_anchor(&self) -> Option<ScrollAnchor<K>> {
        ScrollAnchor::capture(&self.viewport)
    }

    fn current(&self, now_ms: u64) -> u64 {
        match self.tween {
            Some(tween) => tween.sample(now_ms),
            None => self.display,
        }
    }

    fn follow(&mut self, from: u64, now_ms: u64) {
        let to = self.viewport.scroll_offset();
        let animate = match self.viewport.options().scroll_mode {
            ScrollMode::Instant => false,
            ScrollMode::Smooth => from != to,
            ScrollMode::Auto => {
                let page = self.viewport.viewport_extent().max(1);
                from.abs_diff(to) >= page
            }
        };
        if !animate {
            self.tween = None;
            self.display = to;
            return;
        }
        match self.tween.as_mut() {
            Some(tween) => tween.retarget(now_ms, to, self.duration_ms),
            None => self.tween = Some(Tween::new(from, to, now_ms, self.duration_ms, self.easing)),
        }
        self.display = from;
    }
}
