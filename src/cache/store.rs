//! Cache Store Module
//!
//! Cache engine combining an eviction policy with lazy TTL expiration.
//!
//! The store is not thread-safe by itself beyond one detail: recording an access
//! (moving an LRU node, bumping an LFU count) mutates the policy even on reads,
//! so the policy sits behind its own short-held mutex. That lets `get` run with
//! `&self` from a reader section, while every `&mut self` method reaches the
//! policy without locking at all.

use std::hash::Hash;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use tracing::{debug, trace};

use crate::cache::policy::{EvictionPolicy, Policy};
use crate::cache::{CacheEntry, CacheStats, StatsCounter};
use crate::config::PolicyKind;

/// Outcome of a shared-access lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup<V> {
    /// Live entry found
    Hit(V),
    /// Entry found but past its expiry; the caller must discard it exclusively
    Expired,
    Miss,
}

// == Cache Store ==
/// Bounded key-value storage with pluggable eviction and optional TTL.
#[derive(Debug)]
pub struct CacheStore<K, V> {
    policy: Mutex<Policy<K, CacheEntry<V>>>,
    /// TTL applied to every write, None = never expires
    ttl: Option<Duration>,
    stats: StatsCounter,
}

impl<K, V> CacheStore<K, V>
where
    K: Hash + Eq + Clone,
    V: Clone,
{
    // == Constructor ==
    /// Creates a new CacheStore.
    ///
    /// # Arguments
    /// * `kind` - Eviction strategy
    /// * `capacity` - Maximum number of entries the store can hold
    /// * `ttl` - TTL applied to every write, None = entries never expire
    pub fn new(kind: PolicyKind, capacity: usize, ttl: Option<Duration>) -> Self {
        Self {
            policy: Mutex::new(Policy::new(kind, capacity)),
            ttl,
            stats: StatsCounter::default(),
        }
    }

    fn policy(&self) -> MutexGuard<'_, Policy<K, CacheEntry<V>>> {
        self.policy.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn policy_mut(&mut self) -> &mut Policy<K, CacheEntry<V>> {
        self.policy.get_mut().unwrap_or_else(PoisonError::into_inner)
    }

    // == Get ==
    /// Looks up `key` from shared access, recording the access with the policy.
    ///
    /// Expired entries are reported, not removed; removal needs exclusive access.
    pub fn get(&self, key: &K) -> Lookup<V> {
        let mut policy = self.policy();
        let now = Instant::now();
        match policy.get(key) {
            Some(entry) if !entry.is_expired_at(now) => {
                self.stats.record_hit();
                Lookup::Hit(entry.value.clone())
            }
            Some(_) => {
                self.stats.record_miss();
                Lookup::Expired
            }
            None => {
                self.stats.record_miss();
                Lookup::Miss
            }
        }
    }

    // == Get Exclusive ==
    /// Looks up `key` with exclusive access, discarding it if it has expired.
    ///
    /// Does not touch the stats; it serves the double-check after a shared miss.
    pub fn get_exclusive(&mut self, key: &K) -> Option<V> {
        let now = Instant::now();
        let expired = match self.policy_mut().get(key) {
            Some(entry) if !entry.is_expired_at(now) => return Some(entry.value.clone()),
            Some(_) => true,
            None => false,
        };
        if expired {
            self.discard_expired(key);
        }
        None
    }

    // == Discard Expired ==
    /// Removes `key` if it is still expired.
    ///
    /// Between a shared lookup and this call another writer may have replaced the
    /// entry, so expiry is checked again. Returns true if an entry was removed.
    pub fn discard_expired(&mut self, key: &K) -> bool {
        let now = Instant::now();
        let policy = self.policy_mut();
        let expired = policy
            .peek(key)
            .map(|entry| entry.is_expired_at(now))
            .unwrap_or(false);
        if !expired {
            return false;
        }
        policy.remove(key);
        self.stats.record_expiration();
        trace!("discarded expired entry");
        true
    }

    // == Contains ==
    /// Checks for a live entry without recording an access.
    pub fn contains(&self, key: &K) -> bool {
        let now = Instant::now();
        self.policy()
            .peek(key)
            .map(|entry| !entry.is_expired_at(now))
            .unwrap_or(false)
    }

    // == Set ==
    /// Stores a key-value pair, stamping it with the configured TTL.
    ///
    /// If the key already exists, the value is overwritten and its TTL is reset.
    /// If the store is full, the policy's victim is dropped.
    pub fn set(&mut self, key: K, value: V) {
        let entry = CacheEntry::new(value, self.ttl);
        if self.policy_mut().set(key, entry).is_some() {
            self.stats.record_eviction();
        }
    }

    // == Delete ==
    /// Removes an entry by key, returning its value. Absent keys are a no-op.
    pub fn delete(&mut self, key: &K) -> Option<V> {
        self.policy_mut().remove(key).map(|entry| entry.value)
    }

    // == Clear ==
    /// Removes every key known to the policy. Returns how many were removed.
    pub fn clear(&mut self) -> usize {
        let policy = self.policy_mut();
        let keys = policy.keys();
        let count = keys.len();
        for key in keys {
            policy.remove(&key);
        }
        debug!(removed = count, "cleared cache store");
        count
    }

    // == Length ==
    /// Returns the number of entries held, including expired entries not yet discovered.
    pub fn len(&self) -> usize {
        self.policy().len()
    }

    // == Is Empty ==
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.policy().capacity()
    }

    pub fn ttl(&self) -> Option<Duration> {
        self.ttl
    }

    pub fn kind(&self) -> PolicyKind {
        self.policy().kind()
    }

    pub(crate) fn counters(&self) -> &StatsCounter {
        &self.stats
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        let policy = self.policy();
        self.stats.snapshot(policy.len(), policy.capacity())
    }
}
