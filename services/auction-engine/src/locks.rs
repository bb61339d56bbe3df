//! Keyed mutual exclusion
//!
//! One mutex per key, created on first use. Callers that need several keys
//! take them through a `LockSet`, which always acquires in ascending key
//! order. Across the engine the auction lock is taken before any participant
//! lock.

use dashmap::DashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Debug)]
pub struct LockRegistry<K: Eq + Hash> {
    locks: DashMap<K, Arc<Mutex<()>>>,
}

impl<K> LockRegistry<K>
where
    K: Eq + Hash + Ord + Copy,
{
    pub fn new() -> Self {
        Self {
            locks: DashMap::new(),
        }
    }

    fn handle(&self, key: K) -> Arc<Mutex<()>> {
        Arc::clone(self.locks.entry(key).or_default().value())
    }

    /// Lock handles for `keys`, sorted and deduplicated
    pub fn lock_set(&self, keys: impl IntoIterator<Item = K>) -> LockSet {
        let mut keys: Vec<K> = keys.into_iter().collect();
        keys.sort_unstable();
        keys.dedup();
        LockSet {
            handles: keys.into_iter().map(|k| self.handle(k)).collect(),
        }
    }

    pub fn lock_one(&self, key: K) -> LockSet {
        self.lock_set(std::iter::once(key))
    }

    /// Number of keys ever locked
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

impl<K> Default for LockRegistry<K>
where
    K: Eq + Hash + Ord + Copy,
{
    fn default() -> Self {
        Self::new()
    }
}

/// Ordered handles; `hold` blocks until every lock is acquired
#[derive(Debug)]
pub struct LockSet {
    handles: Vec<Arc<Mutex<()>>>,
}

impl LockSet {
    /// The guarded data is `()`, so a poisoned lock carries no broken state.
    pub fn hold(&self) -> Vec<MutexGuard<'_, ()>> {
        self.handles
            .iter()
            .map(|m| m.lock().unwrap_or_else(PoisonError::into_inner))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }
}
