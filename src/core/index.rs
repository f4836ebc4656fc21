//! # Subscription indexes.
//!
//! One [`SubscriptionIndex`] maps exact event types to entries, a second one
//! maps raw pattern strings to entries plus the compiled [`Pattern`]. Both are
//! owned by the broker loop and never touched from anywhere else.
//!
//! ## Rules
//! - A key never maps to an empty entry list: the last removal deletes the key.
//! - Entries are not deduplicated; subscribing twice yields two entries.
//! - Entry order within a key is subscription order.

use std::collections::{BTreeMap, HashMap};

use crate::subscribers::{Subscriber, SubscriberId};

use super::watch::WatchRef;

/// One subscription: who gets the event, and which watch ties it to liveness.
#[derive(Debug, Clone)]
pub(crate) struct Entry {
    pub(crate) subscriber: Subscriber,
    pub(crate) watch: WatchRef,
}

/// Per-key data: optional key metadata plus the entry list.
struct Slot<M> {
    meta: M,
    entries: Vec<Entry>,
}

/// Map from key to subscription entries.
pub(crate) struct SubscriptionIndex<M = ()> {
    slots: HashMap<String, Slot<M>>,
}

impl<M> SubscriptionIndex<M> {
    pub(crate) fn new() -> Self {
        Self {
            slots: HashMap::new(),
        }
    }

    /// Appends an entry, creating the key with `meta()` if needed.
    pub(crate) fn insert_with(&mut self, key: &str, entry: Entry, meta: impl FnOnce() -> M) {
        match self.slots.get_mut(key) {
            Some(slot) => slot.entries.push(entry),
            None => {
                self.slots.insert(
                    key.to_owned(),
                    Slot {
                        meta: meta(),
                        entries: vec![entry],
                    },
                );
            }
        }
    }

    /// Entries registered under `key` (empty if unknown).
    pub(crate) fn get(&self, key: &str) -> &[Entry] {
        self.slots
            .get(key)
            .map(|slot| slot.entries.as_slice())
            .unwrap_or(&[])
    }

    /// Iterates `(key, meta, entries)` over every key.
    pub(crate) fn iter(&self) -> impl Iterator<Item = (&str, &M, &[Entry])> {
        self.slots
            .iter()
            .map(|(key, slot)| (key.as_str(), &slot.meta, slot.entries.as_slice()))
    }

    /// Removes every entry of `subscriber` under `key`; returns their watches.
    pub(crate) fn remove_subscriber(&mut self, key: &str, subscriber: SubscriberId) -> Vec<WatchRef> {
        let Some(slot) = self.slots.get_mut(key) else {
            return Vec::new();
        };

        let mut removed = Vec::new();
        slot.entries.retain(|e| {
            if e.subscriber.id() == subscriber {
                removed.push(e.watch);
                false
            } else {
                true
            }
        });

        if slot.entries.is_empty() {
            self.slots.remove(key);
        }
        removed
    }

    /// Sweeps every key, dropping entries tied to `watch`; returns how many were dropped.
    pub(crate) fn reap(&mut self, watch: WatchRef) -> usize {
        let mut reaped = 0;
        self.slots.retain(|_, slot| {
            let before = slot.entries.len();
            slot.entries.retain(|e| e.watch != watch);
            reaped += before - slot.entries.len();
            !slot.entries.is_empty()
        });
        reaped
    }

    /// Drops every key and entry.
    pub(crate) fn clear(&mut self) {
        self.slots.clear();
    }

    /// Number of keys.
    pub(crate) fn key_count(&self) -> usize {
        self.slots.len()
    }

    /// Number of entries across all keys.
    pub(crate) fn entry_count(&self) -> usize {
        self.slots.values().map(|s| s.entries.len()).sum()
    }

    /// Key → subscriber ids, sorted by key.
    pub(crate) fn snapshot(&self) -> BTreeMap<String, Vec<SubscriberId>> {
        self.slots
            .iter()
            .map(|(key, slot)| {
                let ids = slot.entries.iter().map(|e| e.subscriber.id()).collect();
                (key.clone(), ids)
            })
            .collect()
    }
}
