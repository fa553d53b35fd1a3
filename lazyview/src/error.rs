use alloc::string::String;
use core::fmt;

/// Errors returned when constructing or structurally mutating a [`crate::Viewport`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViewportError {
    /// `cache_capacity` must be greater than zero.
    ZeroCacheCapacity,
    /// `item_height` must be greater than zero.
    ZeroItemHeight,
    /// An item with the same identity is already present.
    ///
    /// `index` is the position of the rejected item in the input (or the requested insert
    /// position for single inserts).
    DuplicateIdentity { index: usize },
    /// The viewport was torn down with [`crate::Viewport::destroy`].
    Destroyed,
}

impl fmt::Display for ViewportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroCacheCapacity => f.write_str("cache capacity must be greater than zero"),
            Self::ZeroItemHeight => f.write_str("item height must be greater than zero"),
            Self::DuplicateIdentity { index } => {
                write!(f, "duplicate item identity at index {index}")
            }
            Self::Destroyed => f.write_str("viewport has been destroyed"),
        }
    }
}

impl core::error::Error for ViewportError {}

/// A failure reported by a lazy loader for one load request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoadError {
    reason: String,
}

impl LoadError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }

    pub fn into_reason(self) -> String {
        self.reason
    }
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to load: {}", self.reason)
    }
}

impl core::error::Error for LoadError {}

impl From<&str> for LoadError {
    fn from(reason: &str) -> Self {
        Self::new(reason)
    }
}

impl From<String> for LoadError {
    fn from(reason: String) -> Self {
        Self::new(reason)
    }
}
