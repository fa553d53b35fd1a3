use alloc::vec::Vec;

use crate::key::{KeyMap, ViewportKey};
use crate::lazy::LoadTicket;
use crate::{Item, ItemRuntimeState, ViewportError};

/// Stable index of a record in the store arena. Survives inserts/removals of other items.
pub(crate) type SlotId = usize;

#[derive(Clone, Debug)]
pub(crate) struct Record<K> {
    pub(crate) item: Item<K>,
    /// `None` until the item has been observed inside a visible range with lazy loading on.
    pub(crate) state: Option<ItemRuntimeState>,
    /// Ticket of the load currently responsible for this record, if any.
    pub(crate) inflight: Option<LoadTicket>,
    pub(crate) position: usize,
}

impl<K> Record<K> {
    fn new(item: Item<K>, position: usize) -> Self {
        Self {
            item,
            state: None,
            inflight: None,
            position,
        }
    }
}

/// Ordered item storage: an arena of records plus the logical order and an identity lookup.
#[derive(Clone, Debug)]
pub(crate) struct ContentStore<K> {
    slots: Vec<Option<Record<K>>>,
    free: Vec<SlotId>,
    order: Vec<SlotId>,
    lookup: KeyMap<K, SlotId>,
}

impl<K: ViewportKey> ContentStore<K> {
    pub(crate) fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            order: Vec::new(),
            lookup: KeyMap::new(),
        }
    }

    pub(crate) fn from_items(items: impl IntoIterator<Item = Item<K>>) -> Result<Self, ViewportError> {
        let mut store = Self::new();
        for (index, item) in items.into_iter().enumerate() {
            if store.lookup.contains_key(&item.identity) {
                return Err(ViewportError::DuplicateIdentity { index });
            }
            let slot = store.alloc(Record::new(item, index));
            store.order.push(slot);
        }
        Ok(store)
    }

    pub(crate) fn len(&self) -> usize {
        self.order.len()
    }

    pub(crate) fn contains(&self, identity: &K) -> bool {
        self.lookup.contains_key(identity)
    }

    pub(crate) fn slot_of(&self, identity: &K) -> Option<SlotId> {
        self.lookup.get(identity).copied()
    }

    pub(crate) fn slot_at(&self, index: usize) -> Option<SlotId> {
        self.order.get(index).copied()
    }

    pub(crate) fn record(&self, slot: SlotId) -> Option<&Record<K>> {
        self.slots.get(slot).and_then(Option::as_ref)
    }

    pub(crate) fn record_mut(&mut self, slot: SlotId) -> Option<&mut Record<K>> {
        self.slots.get_mut(slot).and_then(Option::as_mut)
    }

    pub(crate) fn record_at(&self, index: usize) -> Option<&Record<K>> {
        self.record(self.slot_at(index)?)
    }

    pub(crate) fn record_of(&self, identity: &K) -> Option<&Record<K>> {
        self.record(self.slot_of(identity)?)
    }

    pub(crate) fn record_of_mut(&mut self, identity: &K) -> Option<&mut Record<K>> {
        let slot = self.slot_of(identity)?;
        self.record_mut(slot)
    }

    pub(crate) fn index_of(&self, identity: &K) -> Option<usize> {
        self.record_of(identity).map(|r| r.position)
    }

    pub(crate) fn get(&self, identity: &K) -> Option<&Item<K>> {
        self.record_of(identity).map(|r| &r.item)
    }

    pub(crate) fn item_at(&self, index: usize) -> Option<&Item<K>> {
        self.record_at(index).map(|r| &r.item)
    }

    /// Iterates records in logical order.
    pub(crate) fn records(&self) -> impl Iterator<Item = &Record<K>> + '_ {
        // `order` only ever references occupied slots.
        self.order
            .iter()
            .filter_map(move |&slot| self.slots.get(slot).and_then(Option::as_ref))
    }

    pub(crate) fn items(&self) -> impl Iterator<Item = &Item<K>> + '_ {
        self.records().map(|r| &r.item)
    }

    /// Inserts `item` at `index` (clamped to append). Returns the applied position.
    pub(crate) fn insert(&mut self, index: Option<usize>, item: Item<K>) -> Result<usize, ViewportError> {
        let position = index.unwrap_or(self.order.len()).min(self.order.len());
        if self.lookup.contains_key(&item.identity) {
            return Err(ViewportError::DuplicateIdentity { index: position });
        }
        let slot = self.alloc(Record::new(item, position));
        self.order.insert(position, slot);
        self.reindex_from(position + 1);
        Ok(position)
    }

    pub(crate) fn remove(&mut self, identity: &K) -> Option<Record<K>> {
        let slot = self.lookup.remove(identity)?;
        let record = self.slots.get_mut(slot)?.take()?;
        self.free.push(slot);
        self.order.remove(record.position);
        self.reindex_from(record.position);
        Some(record)
    }

    /// Swaps in new data for an existing identity, returning the previous item.
    pub(crate) fn replace(&mut self, item: Item<K>) -> Option<Item<K>> {
        let record = self.record_of_mut(&item.identity)?;
        Some(core::mem::replace(&mut record.item, item))
    }

    fn alloc(&mut self, record: Record<K>) -> SlotId {
        let identity = record.item.identity.clone();
        let slot = if let Some(slot) = self.free.pop() {
            self.slots[slot] = Some(record);
            slot
        } else {
            self.slots.push(Some(record));
            self.slots.len() - 1
        };
        self.lookup.insert(identity, slot);
        slot
    }

    fn reindex_from(&mut self, start: usize) {
        for position in start..self.order.len() {
            let slot = self.order[position];
            if let Some(record) = self.slots[slot].as_mut() {
                record.position = position;
            }
        }
    }
}
