use alloc::string::String;
use alloc::vec::Vec;

use crate::ItemKey;

/// Notifications emitted by [`crate::Viewport`] mutators.
///
/// Events queue up inside the viewport until the host drains them with
/// [`crate::Viewport::drain_events`]; the engine never calls back into host code.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ViewportEvent<K = ItemKey> {
    Scrolled {
        offset: u64,
        max_offset: u64,
    },
    /// Carries an owned snapshot of the full selection.
    SelectionChanged {
        selected: Vec<K>,
    },
    HighlightChanged {
        highlighted: Option<K>,
    },
    ItemActivated {
        identity: K,
        index: usize,
    },
    SearchChanged {
        query: String,
        match_count: usize,
        current: Option<usize>,
    },
    /// Error channel for lazy loads. Every listed identity is now in the `Error` state.
    LoadFailed {
        identities: Vec<K>,
        reason: String,
    },
    Resized {
        width: u32,
        height: u32,
    },
    ItemsChanged {
        count: usize,
    },
}
