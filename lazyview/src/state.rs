use alloc::string::String;
use alloc::vec::Vec;

use crate::{ItemKey, ItemRuntimeState, VisibleRange};

/// A lightweight, serializable snapshot of the scroll position.
///
/// With `feature = "serde"`, this type implements `Serialize`/`Deserialize`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScrollState {
    pub offset: u64,
    pub max_offset: u64,
}

/// A read-only copy of the viewport's mutable aggregate.
///
/// This is useful for debugging overlays, assertions in host tests, and restoring UI state
/// without coupling the engine to any specific UI framework.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ViewportState<K = ItemKey> {
    pub scroll: ScrollState,
    pub visible_range: VisibleRange,
    pub total_extent: u64,
    pub item_count: usize,
    pub selected: Vec<K>,
    pub anchor: Option<K>,
    pub highlighted: Option<K>,
    pub search_query: String,
    pub search_matches: Vec<usize>,
    pub current_match: Option<usize>,
    /// Lazy state of every observed item, in logical order.
    pub lazy: Vec<(K, ItemRuntimeState)>,
    pub dirty: bool,
}
