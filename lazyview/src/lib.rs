//! A headless virtualized content viewport.
//!
//! For host integration (callbacks, smooth scrolling, scroll anchoring), see the
//! `lazyview-adapter` crate.
//!
//! This crate holds the state needed to present very large item lists through a small window
//! at interactive rates: prefix sums over item extents, offset → index lookup, overscanned
//! visible ranges, a bounded LRU content cache, lazy loading of unresolved items, selection,
//! keyboard focus and full-text search.
//!
//! It is UI-agnostic. A TUI/GUI layer is expected to provide:
//! - the viewport size
//! - decoded key presses and wheel deltas
//! - a loader for lazily materialized items (optional)
//!
//! and to paint the rows returned by [`Viewport::render`].
#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]

extern crate alloc;

#[cfg(test)]
extern crate std;

#[macro_use]
mod macros;

mod cache;
mod error;
mod event;
mod fenwick;
mod input;
mod key;
mod lazy;
mod options;
mod scroll;
mod search;
mod selection;
mod state;
mod store;
mod types;
mod viewport;


pub use cache::LruCache;
pub use error::{LoadError, ViewportError};
pub use event::ViewportEvent;
pub use input::{Key, KeyPress, Modifiers};
pub use lazy::{LazyLoader, LoadOutcome, LoadRequest, LoadTicket};
pub use options::ViewportOptions;
pub use search::{CustomMatcher, SearchIndex, SearchMatcher, tokenize};
pub use state::{ScrollState, ViewportState};
pub use types::{
    Align, CacheStats, Item, ItemKey, ItemRuntimeState, Metadata, ScrollMode, SelectionMode,
    VisibleRange,
};
pub use viewport::{RenderedRow, RowContent, Viewport};

#[doc(hidden)]
pub use key::ViewportKey;
