use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;

use crate::key::{KeyMap, ViewportKey};
use crate::store::ContentStore;
use crate::{Item, ItemRuntimeState, LoadError, VisibleRange};

/// Identifies one issued load request.
pub type LoadTicket = u64;

/// A contiguous span of unresolved items the host should load.
///
/// `identities[i]` is the identity that sat at `start + i` when the request was issued. Results
/// are matched back by identity, so the positions may have shifted by the time the load
/// completes.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LoadRequest<K> {
    pub ticket: LoadTicket,
    pub start: usize,
    pub count: usize,
    pub identities: Vec<K>,
}

/// Materializes unresolved items for a [`LoadRequest`].
///
/// Implemented for any `FnMut(&LoadRequest<K>) -> Result<Vec<Item<K>>, LoadError>`.
pub trait LazyLoader<K> {
    fn load(&mut self, request: &LoadRequest<K>) -> Result<Vec<Item<K>>, LoadError>;
}

impl<K, F> LazyLoader<K> for F
where
    F: FnMut(&LoadRequest<K>) -> Result<Vec<Item<K>>, LoadError>,
{
    fn load(&mut self, request: &LoadRequest<K>) -> Result<Vec<Item<K>>, LoadError> {
        self(request)
    }
}

/// What happened when a load completed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LoadOutcome {
    /// Items written into the store and marked `Loaded`.
    pub applied: usize,
    /// Items moved to `Error`.
    pub failed: usize,
    /// Results dropped because their identity was removed, reset or reloaded meanwhile.
    pub discarded: usize,
}

#[derive(Debug)]
pub(crate) struct Resolution<K> {
    pub(crate) outcome: LoadOutcome,
    pub(crate) loaded: Vec<K>,
    pub(crate) failed: Vec<K>,
    pub(crate) reason: Option<String>,
}

/// Drives the `NotLoaded → Loading → Loaded | Error` state machine.
#[derive(Clone, Debug)]
pub(crate) struct LazyCoordinator<K> {
    next_ticket: LoadTicket,
    in_flight: KeyMap<LoadTicket, Vec<K>>,
    queued: Vec<LoadRequest<K>>,
}

impl<K: ViewportKey> LazyCoordinator<K> {
    pub(crate) fn new() -> Self {
        Self {
            next_ticket: 1,
            in_flight: KeyMap::new(),
            queued: Vec::new(),
        }
    }

    pub(crate) fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    pub(crate) fn queued(&self) -> usize {
        self.queued.len()
    }

    pub(crate) fn take_requests(&mut self) -> Vec<LoadRequest<K>> {
        core::mem::take(&mut self.queued)
    }

    /// Observes `range`, moving unseen items to `NotLoaded` and issuing one request per
    /// contiguous `NotLoaded` span.
    ///
    /// Returns the identities that just entered `Loading`.
    pub(crate) fn scan(&mut self, store: &mut ContentStore<K>, range: VisibleRange) -> Vec<K> {
        let end = range.end.min(store.len());
        let mut started = Vec::new();
        let mut span_start: Option<usize> = None;
        for index in range.start..end {
            let unresolved = match store.slot_at(index).and_then(|s| store.record_mut(s)) {
                Some(record) => {
                    let state = record.state.get_or_insert(ItemRuntimeState::NotLoaded);
                    *state == ItemRuntimeState::NotLoaded
                }
                None => false,
            };
            match (unresolved, span_start) {
                (true, None) => span_start = Some(index),
                (false, Some(start)) => {
                    self.issue(store, start, index, &mut started);
                    span_start = None;
                }
                _ => {}
            }
        }
        if let Some(start) = span_start {
            self.issue(store, start, end, &mut started);
        }
        started
    }

    fn issue(&mut self, store: &mut ContentStore<K>, start: usize, end: usize, started: &mut Vec<K>) {
        let ticket = self.next_ticket;
        self.next_ticket = self.next_ticket.wrapping_add(1);

        let mut identities = Vec::with_capacity(end - start);
        for index in start..end {
            let Some(record) = store.slot_at(index).and_then(|s| store.record_mut(s)) else {
                continue;
            };
            record.state = Some(ItemRuntimeState::Loading);
            record.inflight = Some(ticket);
            identities.push(record.item.identity.clone());
        }
        vdebug!(ticket, start, count = identities.len(), "lazy load issued");

        started.extend(identities.iter().cloned());
        self.in_flight.insert(ticket, identities.clone());
        self.queued.push(LoadRequest {
            ticket,
            start,
            count: identities.len(),
            identities,
        });
    }

    /// Applies a loader result. Identities that are gone or no longer owned by `ticket` are
    /// discarded.
    pub(crate) fn resolve(
        &mut self,
        store: &mut ContentStore<K>,
        ticket: LoadTicket,
        result: Result<Vec<Item<K>>, LoadError>,
    ) -> Resolution<K> {
        let mut resolution = Resolution {
            outcome: LoadOutcome::default(),
            loaded: Vec::new(),
            failed: Vec::new(),
            reason: None,
        };
        self.queued.retain(|r| r.ticket != ticket);
        let Some(identities) = self.in_flight.remove(&ticket) else {
            vwarn!(ticket, "lazy load completed for an unknown ticket");
            resolution.outcome.discarded = result.map(|items| items.len()).unwrap_or(0);
            return resolution;
        };

        match result {
            Ok(items) => {
                let returned = items.len();
                let mut items = items.into_iter();
                for identity in identities.iter() {
                    let item = items.next();
                    let Some(record) = owned_record(store, identity, ticket) else {
                        resolution.outcome.discarded += 1;
                        continue;
                    };
                    record.inflight = None;
                    match item {
                        Some(item) => {
                            record.item.content = item.content;
                            record.item.height = item.height;
                            record.item.selectable = item.selectable;
                            record.item.metadata = item.metadata;
                            record.state = Some(ItemRuntimeState::Loaded);
                            resolution.loaded.push(identity.clone());
                        }
                        None => {
                            let reason = format!(
                                "loader returned {returned} of {} items",
                                identities.len()
                            );
                            record.state = Some(ItemRuntimeState::Error(reason.clone()));
                            resolution.failed.push(identity.clone());
                            resolution.reason.get_or_insert(reason);
                        }
                    }
                }
            }
            Err(err) => {
                let reason = err.into_reason();
                for identity in identities.iter() {
                    let Some(record) = owned_record(store, identity, ticket) else {
                        resolution.outcome.discarded += 1;
                        continue;
                    };
                    record.inflight = None;
                    record.state = Some(ItemRuntimeState::Error(reason.clone()));
                    resolution.failed.push(identity.clone());
                }
                resolution.reason = Some(reason);
            }
        }

        resolution.outcome.applied = resolution.loaded.len();
        resolution.outcome.failed = resolution.failed.len();
        if resolution.outcome.discarded > 0 {
            vwarn!(
                ticket,
                discarded = resolution.outcome.discarded,
                "lazy load results discarded as stale"
            );
        }
        vdebug!(
            ticket,
            applied = resolution.outcome.applied,
            failed = resolution.outcome.failed,
            "lazy load resolved"
        );
        resolution
    }

    /// Puts an observed item back to `NotLoaded`. Any in-flight result for it becomes stale.
    ///
    /// Returns `Some(was_loading)` when the item exists and has been observed.
    pub(crate) fn reset(&mut self, store: &mut ContentStore<K>, identity: &K) -> Option<bool> {
        let record = store.record_of_mut(identity)?;
        let state = record.state.as_mut()?;
        let was_loading = *state == ItemRuntimeState::Loading;
        *state = ItemRuntimeState::NotLoaded;
        record.inflight = None;
        Some(was_loading)
    }

    /// Forgets every request. Late results will be reported as unknown tickets.
    pub(crate) fn clear(&mut self) {
        self.in_flight.clear();
        self.queued.clear();
    }
}

fn owned_record<'a, K: ViewportKey>(
    store: &'a mut ContentStore<K>,
    identity: &K,
    ticket: LoadTicket,
) -> Option<&'a mut crate::store::Record<K>> {
    store
        .record_of_mut(identity)
        .filter(|r| r.inflight == Some(ticket))
}
