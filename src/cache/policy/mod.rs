//! Eviction Policies
//!
//! Bounded key/value indexes that pick their own eviction victims. Every
//! operation is O(1).

mod lfu;
mod lru;

use std::hash::Hash;

pub use lfu::LfuPolicy;
pub use lru::LruPolicy;

use crate::config::PolicyKind;

// == Eviction Policy Trait ==
/// Capability set shared by all eviction strategies.
///
/// Implementations own their entries. `set` enforces capacity synchronously and
/// hands back whatever it evicted.
pub trait EvictionPolicy<K, V> {
    /// Looks up `key` and records the access (recency or frequency).
    fn get(&mut self, key: &K) -> Option<&V>;

    /// Looks up `key` without recording an access.
    fn peek(&self, key: &K) -> Option<&V>;

    /// Inserts or updates `key`. An update counts as an access. Returns the
    /// evicted entry when inserting a new key overflowed capacity.
    fn set(&mut self, key: K, value: V) -> Option<(K, V)>;

    /// Removes `key`, returning its value. Absent keys are a no-op.
    fn remove(&mut self, key: &K) -> Option<V>;

    /// All keys currently held, in no particular order.
    fn keys(&self) -> Vec<K>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn capacity(&self) -> usize;
}

// == Policy ==
/// The eviction strategy a cache was built with, chosen once and kept for its lifetime.
#[derive(Debug)]
pub enum Policy<K, V> {
    Lru(LruPolicy<K, V>),
    Lfu(LfuPolicy<K, V>),
}

impl<K: Hash + Eq + Clone, V> Policy<K, V> {
    pub fn new(kind: PolicyKind, capacity: usize) -> Self {
        match kind {
            PolicyKind::Lru => Policy::Lru(LruPolicy::new(capacity)),
            PolicyKind::Lfu => Policy::Lfu(LfuPolicy::new(capacity)),
        }
    }

    pub fn kind(&self) -> PolicyKind {
        match self {
            Policy::Lru(_) => PolicyKind::Lru,
            Policy::Lfu(_) => PolicyKind::Lfu,
        }
    }
}

impl<K: Hash + Eq + Clone, V> EvictionPolicy<K, V> for Policy<K, V> {
    fn get(&mut self, key: &K) -> Option<&V> {
        match self {
            Policy::Lru(p) => p.get(key),
            Policy::Lfu(p) => p.get(key),
        }
    }

    fn peek(&self, key: &K) -> Option<&V> {
        match self {
            Policy::Lru(p) => p.peek(key),
            Policy::Lfu(p) => p.peek(key),
        }
    }

    fn set(&mut self, key: K, value: V) -> Option<(K, V)> {
        match self {
            Policy::Lru(p) => p.set(key, value),
            Policy::Lfu(p) => p.set(key, value),
        }
    }

    fn remove(&mut self, key: &K) -> Option<V> {
        match self {
            Policy::Lru(p) => p.remove(key),
            Policy::Lfu(p) => p.remove(key),
        }
    }

    fn keys(&self) -> Vec<K> {
        match self {
            Policy::Lru(p) => p.keys(),
            Policy::Lfu(p) => p.keys(),
        }
    }

    fn len(&self) -> usize {
        match self {
            Policy::Lru(p) => p.len(),
            Policy::Lfu(p) => p.len(),
        }
    }

    fn capacity(&self) -> usize {
        match self {
            Policy::Lru(p) => p.capacity(),
            Policy::Lfu(p) => p.capacity(),
        }
    }
}
