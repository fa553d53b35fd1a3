use alloc::vec::Vec;

use crate::SelectionMode;
use crate::key::{KeyMap, ViewportKey};

/// Result of a selection operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum SelectOutcome {
    /// Not allowed by the mode (or nothing to act on). No side effects.
    Rejected,
    /// Allowed, but the selection was already in the requested state.
    Unchanged,
    Changed,
}

impl SelectOutcome {
    pub(crate) fn succeeded(self) -> bool {
        !matches!(self, Self::Rejected)
    }
}

/// Selected identities under a fixed [`SelectionMode`], plus the range anchor.
///
/// Keys are kept in selection order in `items`; `members` mirrors them for constant-time
/// membership. Validation that a key exists and is selectable is the caller's job.
#[derive(Clone, Debug)]
pub(crate) struct Selection<K> {
    mode: SelectionMode,
    items: Vec<K>,
    members: KeyMap<K, ()>,
    anchor: Option<K>,
    revision: u64,
}

impl<K: ViewportKey> Selection<K> {
    pub(crate) fn new(mode: SelectionMode) -> Self {
        Self {
            mode,
            items: Vec::new(),
            members: KeyMap::new(),
            anchor: None,
            revision: 0,
        }
    }

    pub(crate) fn mode(&self) -> SelectionMode {
        self.mode
    }

    pub(crate) fn items(&self) -> &[K] {
        &self.items
    }

    pub(crate) fn contains(&self, key: &K) -> bool {
        self.members.contains_key(key)
    }

    #[cfg(test)]
    pub(crate) fn member_count(&self) -> usize {
        self.members.len()
    }

    pub(crate) fn anchor(&self) -> Option<&K> {
        self.anchor.as_ref()
    }

    pub(crate) fn revision(&self) -> u64 {
        self.revision
    }

    pub(crate) fn select(&mut self, key: K) -> SelectOutcome {
        match self.mode {
            SelectionMode::None => SelectOutcome::Rejected,
            SelectionMode::Single => {
                if self.items.len() == 1 && self.contains(&key) {
                    return self.set_anchor(key);
                }
                self.items.clear();
                self.members.clear();
                self.insert(key.clone());
                self.anchor = Some(key);
                self.bump()
            }
            SelectionMode::Multiple => {
                if self.contains(&key) {
                    return self.set_anchor(key);
                }
                self.insert(key.clone());
                self.anchor = Some(key);
                self.bump()
            }
        }
    }

    pub(crate) fn deselect(&mut self, key: &K) -> SelectOutcome {
        if self.mode == SelectionMode::None {
            return SelectOutcome::Rejected;
        }
        if self.members.remove(key).is_none() {
            return SelectOutcome::Rejected;
        }
        if let Some(pos) = self.items.iter().position(|k| k == key) {
            self.items.remove(pos);
        }
        self.anchor = Some(key.clone());
        self.bump()
    }

    pub(crate) fn toggle(&mut self, key: K) -> SelectOutcome {
        if self.contains(&key) {
            self.deselect(&key)
        } else {
            self.select(key)
        }
    }

    /// Adds every key from `selectable` (Multiple mode only). The anchor is left as is.
    pub(crate) fn select_all(&mut self, selectable: impl IntoIterator<Item = K>) -> SelectOutcome {
        if self.mode != SelectionMode::Multiple {
            return SelectOutcome::Rejected;
        }
        let before = self.items.len();
        for key in selectable {
            if !self.contains(&key) {
                self.insert(key);
            }
        }
        if self.items.len() == before {
            return SelectOutcome::Unchanged;
        }
        self.bump()
    }

    /// Replaces the contents with `keys` while keeping the current anchor (range extension).
    pub(crate) fn replace_keep_anchor(&mut self, keys: impl IntoIterator<Item = K>) -> SelectOutcome {
        if self.mode != SelectionMode::Multiple {
            return SelectOutcome::Rejected;
        }
        let mut next: Vec<K> = Vec::new();
        let mut members: KeyMap<K, ()> = KeyMap::new();
        for key in keys {
            if members.insert(key.clone(), ()).is_none() {
                next.push(key);
            }
        }
        if next == self.items {
            return SelectOutcome::Unchanged;
        }
        self.items = next;
        self.members = members;
        self.bump()
    }

    pub(crate) fn clear(&mut self) -> SelectOutcome {
        if self.mode == SelectionMode::None {
            return SelectOutcome::Rejected;
        }
        self.anchor = None;
        if self.items.is_empty() {
            return SelectOutcome::Unchanged;
        }
        self.items.clear();
        self.members.clear();
        self.bump()
    }

    /// Drops keys failing `keep`. Returns `true` if the contents changed.
    pub(crate) fn retain(&mut self, mut keep: impl FnMut(&K) -> bool) -> bool {
        let before = self.items.len();
        let members = &mut self.members;
        self.items.retain(|k| {
            let kept = keep(k);
            if !kept {
                members.remove(k);
            }
            kept
        });
        if self.anchor.as_ref().is_some_and(|a| !keep(a)) {
            self.anchor = None;
        }
        if self.items.len() == before {
            return false;
        }
        self.bump();
        true
    }

    // Re-selecting an already selected key only moves the anchor.
    fn set_anchor(&mut self, key: K) -> SelectOutcome {
        self.anchor = Some(key);
        SelectOutcome::Unchanged
    }

    fn insert(&mut self, key: K) {
        self.members.insert(key.clone(), ());
        self.items.push(key);
    }

    fn bump(&mut self) -> SelectOutcome {
        self.revision = self.revision.wrapping_add(1);
        SelectOutcome::Changed
    }
}
