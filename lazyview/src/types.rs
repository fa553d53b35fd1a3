use alloc::collections::BTreeMap;
use alloc::string::String;

pub type ItemKey = u64;

/// Opaque host-owned key/value bag attached to an item. The engine never reads or mutates it.
pub type Metadata = BTreeMap<String, String>;

/// One logical row of the viewport.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Item<K = ItemKey> {
    pub identity: K,
    pub content: String,
    /// Logical rows occupied, in units of `ViewportOptions::item_height`. Zero is treated as one.
    pub height: u32,
    pub selectable: bool,
    pub metadata: Metadata,
}

impl<K> Item<K> {
    pub fn new(identity: K, content: impl Into<String>) -> Self {
        Self {
            identity,
            content: content.into(),
            height: 1,
            selectable: true,
            metadata: Metadata::new(),
        }
    }

    pub fn with_height(mut self, height: u32) -> Self {
        self.height = height;
        self
    }

    pub fn with_selectable(mut self, selectable: bool) -> Self {
        self.selectable = selectable;
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub(crate) fn rows(&self) -> u32 {
        self.height.max(1)
    }
}

/// Resolution status of a lazily loaded item.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ItemRuntimeState {
    NotLoaded,
    Loading,
    Loaded,
    Error(String),
}

impl ItemRuntimeState {
    /// `true` for `NotLoaded` and `Loading`.
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::NotLoaded | Self::Loading)
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VisibleRange {
    pub start: usize,
    pub end: usize, // exclusive
}

impl VisibleRange {
    pub const EMPTY: Self = Self { start: 0, end: 0 };

    pub fn new(start: usize, end: usize) -> Self {
        Self {
            start,
            end: end.max(start),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn contains(&self, index: usize) -> bool {
        index >= self.start && index < self.end
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Align {
    Start,
    Center,
    End,
    /// Move as little as possible to bring the row fully into view.
    Auto,
}

/// How the host renderer animates between offsets.
///
/// The engine's own offset always changes instantly; this is a hint for adapters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ScrollMode {
    #[default]
    Instant,
    Smooth,
    Auto,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SelectionMode {
    None,
    #[default]
    Single,
    Multiple,
}

/// Counters reported by [`crate::LruCache::stats`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub size: usize,
    pub capacity: usize,
}

impl CacheStats {
    /// `hits / (hits + misses)`, or `0.0` before the first lookup.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits.saturating_add(self.misses);
        if total == 0 {
            return 0.0;
        }
        self.hits as f64 / total as f64
    }
}
