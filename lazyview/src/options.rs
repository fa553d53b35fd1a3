use crate::{ScrollMode, SelectionMode, ViewportError};

/// Configuration for [`crate::Viewport`].
///
/// All fields are plain data so the options can be cloned, compared and (with
/// `feature = "serde"`) loaded from a config file. Missing fields deserialize to their defaults.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ViewportOptions {
    /// Viewport width in columns. Only reported back to the host.
    pub width: u32,
    /// Viewport height in rows; this is the scroll-axis extent.
    pub height: u32,

    /// When disabled, the visible range always spans every item.
    pub virtual_scrolling: bool,
    /// When enabled, items entering the visible range go through the lazy load state machine.
    pub lazy_loading: bool,

    pub selection_mode: SelectionMode,

    /// Rows per unit of `Item::height`.
    pub item_height: u32,
    /// Extra items materialized on each side of the visible rows.
    pub overscan_count: usize,

    /// Maximum number of realized contents kept in the LRU cache. Must be non-zero.
    pub cache_capacity: usize,

    /// Multiplier applied to wheel deltas before converting them to lines.
    pub scroll_sensitivity: f32,
    /// Animation hint for adapters; never affects the engine's offset.
    pub scroll_mode: ScrollMode,
}

impl Default for ViewportOptions {
    fn default() -> Self {
        Self {
            width: 80,
            height: 24,
            virtual_scrolling: true,
            lazy_loading: false,
            selection_mode: SelectionMode::Single,
            item_height: 1,
            overscan_count: 3,
            cache_capacity: 1000,
            scroll_sensitivity: 1.0,
            scroll_mode: ScrollMode::Instant,
        }
    }
}

impl ViewportOptions {
    /// Creates default options for a `width` × `height` viewport.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ..Self::default()
        }
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn with_virtual_scrolling(mut self, enabled: bool) -> Self {
        self.virtual_scrolling = enabled;
        self
    }

    pub fn with_lazy_loading(mut self, enabled: bool) -> Self {
        self.lazy_loading = enabled;
        self
    }

    pub fn with_selection_mode(mut self, mode: SelectionMode) -> Self {
        self.selection_mode = mode;
        self
    }

    pub fn with_item_height(mut self, item_height: u32) -> Self {
        self.item_height = item_height;
        self
    }

    pub fn with_overscan(mut self, overscan: usize) -> Self {
        self.overscan_count = overscan;
        self
    }

    pub fn with_cache_capacity(mut self, capacity: usize) -> Self {
        self.cache_capacity = capacity;
        self
    }

    pub fn with_scroll_sensitivity(mut self, sensitivity: f32) -> Self {
        self.scroll_sensitivity = sensitivity;
        self
    }

    pub fn with_scroll_mode(mut self, mode: ScrollMode) -> Self {
        self.scroll_mode = mode;
        self
    }

    /// Rows covered by one page (`floor(height / item_height)`).
    pub fn page_lines(&self) -> u32 {
        if self.item_height == 0 {
            return 0;
        }
        self.height / self.item_height
    }

    pub(crate) fn validate(&self) -> Result<(), ViewportError> {
        if self.cache_capacity == 0 {
            return Err(ViewportError::ZeroCacheCapacity);
        }
        if self.item_height == 0 {
            return Err(ViewportError::ZeroItemHeight);
        }
        Ok(())
    }
}
