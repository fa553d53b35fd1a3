#[cfg(not(feature = "std"))]
use alloc::collections::BTreeMap;
#[cfg(feature = "std")]
use std::collections::HashMap;

/// Identity → value lookup table used by the store, the cache and the load coordinator.
#[cfg(feature = "std")]
pub(crate) type KeyMap<K, V> = HashMap<K, V>;
#[cfg(not(feature = "std"))]
pub(crate) type KeyMap<K, V> = BTreeMap<K, V>;

/// Bounds required of an item identity.
///
/// With `std` identities are hashed; without it they only need a total order.
#[cfg(feature = "std")]
pub trait ViewportKey: core::hash::Hash + Eq + Clone {}
#[cfg(feature = "std")]
impl<K: core::hash::Hash + Eq + Clone> ViewportKey for K {}

#[cfg(not(feature = "std"))]
pub trait ViewportKey: Ord + Clone {}
#[cfg(not(feature = "std"))]
impl<K: Ord + Clone> ViewportKey for K {}
