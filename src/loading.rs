//! Loading Cache Module
//!
//! The thread-safe cache: a [`CacheStore`] and the active loader behind one
//! reader/writer lock.
//!
//! # Locking
//! - Hits on live entries take the read section only and may run concurrently.
//! - `put`, `invalidate`, `invalidate_all`, `set_loader`, lazy removal of an
//!   expired entry, and every loader invocation take the write section.
//! - A loader runs while the write section is held. A slow load of one key
//!   therefore stalls every writer and every miss for all other keys until it
//!   returns. Concurrent misses on the same key queue on the write section and
//!   re-check the store once inside, so the loader normally runs once; this is
//!   not a single-flight guarantee, since the value can be evicted or
//!   invalidated between the two callers. Use
//!   [`ShardedCache`](crate::ShardedCache) to spread that contention over
//!   independently locked shards.

use std::fmt;
use std::hash::Hash;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::builder::CacheBuilder;
use crate::cache::{CacheStats, CacheStore, Lookup};
use crate::config::{CacheConfig, PolicyKind};
use crate::context::LoadContext;
use crate::error::{CacheError, Result};
use crate::traits::{loader_fn, KeyValueCache, Loader, LoadingCache};

/// State guarded by the cache lock.
struct Inner<K, V> {
    store: CacheStore<K, V>,
    loader: Option<Loader<K, V>>,
}

impl<K, V> Inner<K, V>
where
    K: Hash + Eq + Clone,
    V: Clone,
{
    /// Runs the loader and stores its value. Nothing is stored on failure.
    fn load_and_store(&mut self, loader: &Loader<K, V>, ctx: &LoadContext, key: &K) -> Result<V> {
        match loader(ctx, key) {
            Ok(value) => {
                self.store.counters().record_load();
                self.store.set(key.clone(), value.clone());
                Ok(value)
            }
            Err(err) => {
                self.store.counters().record_load_failure();
                debug!(error = %err, "loader failed");
                Err(CacheError::Loader(err))
            }
        }
    }
}

// == Cache ==
/// Bounded, thread-safe loading cache with LRU or LFU eviction and lazy TTL expiry.
pub struct Cache<K, V> {
    inner: RwLock<Inner<K, V>>,
    closed: AtomicBool,
}

impl<K, V> Cache<K, V>
where
    K: Hash + Eq + Clone,
    V: Clone,
{
    // == Constructor ==
    /// Creates an empty cache without a loader.
    pub fn new(config: &CacheConfig) -> Self {
        Self::from_parts(config, None)
    }

    /// Creates an empty cache that loads misses through `loader`.
    pub fn with_loader<F>(config: &CacheConfig, loader: F) -> Self
    where
        F: Fn(&LoadContext, &K) -> anyhow::Result<V> + Send + Sync + 'static,
    {
        Self::from_parts(config, Some(loader_fn(loader)))
    }

    /// Starts a [`CacheBuilder`] with default options.
    pub fn builder() -> CacheBuilder<K, V> {
        CacheBuilder::new()
    }

    pub(crate) fn from_parts(config: &CacheConfig, loader: Option<Loader<K, V>>) -> Self {
        let capacity = config.effective_capacity();
        let ttl = config.effective_ttl();
        debug!(
            policy = %config.policy,
            capacity,
            ttl = ?ttl,
            has_loader = loader.is_some(),
            "cache created"
        );
        Self {
            inner: RwLock::new(Inner {
                store: CacheStore::new(config.policy, capacity, ttl),
                loader,
            }),
            closed: AtomicBool::new(false),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Inner<K, V>> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Inner<K, V>> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replaces the loader with a closure.
    pub fn set_loader_fn<F>(&self, loader: F)
    where
        F: Fn(&LoadContext, &K) -> anyhow::Result<V> + Send + Sync + 'static,
    {
        LoadingCache::set_loader(self, loader_fn(loader));
    }

    /// Removes the loader; later misses report `KeyNotFound`.
    pub fn clear_loader(&self) {
        self.write().loader = None;
    }

    /// Whether misses are currently loaded.
    pub fn has_loader(&self) -> bool {
        self.read().loader.is_some()
    }

    /// Checks for a live entry without counting as an access.
    pub fn contains_key(&self, key: &K) -> bool {
        self.read().store.contains(key)
    }

    /// Number of entries held, including expired entries not yet discovered.
    pub fn len(&self) -> usize {
        self.read().store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Maximum number of entries, after defaulting.
    pub fn capacity(&self) -> usize {
        self.read().store.capacity()
    }

    /// TTL stamped on every write; None when entries never expire.
    pub fn ttl(&self) -> Option<Duration> {
        self.read().store.ttl()
    }

    /// Eviction strategy chosen at construction.
    pub fn policy_kind(&self) -> PolicyKind {
        self.read().store.kind()
    }

    /// Snapshot of the hit, miss, eviction and load counters.
    pub fn stats(&self) -> CacheStats {
        self.read().store.stats()
    }

    /// Whether `close` has been called.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

impl<K, V> KeyValueCache<K, V> for Cache<K, V>
where
    K: Hash + Eq + Clone,
    V: Clone,
{
    fn get_if_present(&self, key: &K) -> Option<V> {
        let lookup = self.read().store.get(key);
        match lookup {
            Lookup::Hit(value) => Some(value),
            Lookup::Expired => {
                self.write().store.discard_expired(key);
                None
            }
            Lookup::Miss => None,
        }
    }

    fn put(&self, key: K, value: V) {
        self.write().store.set(key, value);
    }

    fn invalidate(&self, key: &K) {
        self.write().store.delete(key);
    }

    fn invalidate_all(&self) {
        let removed = self.write().store.clear();
        debug!(removed, "invalidated all entries");
    }

    fn close(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::AcqRel) {
            warn!("cache closed twice");
        } else {
            info!(entries = self.len(), "cache closed");
        }
        Ok(())
    }
}

impl<K, V> LoadingCache<K, V> for Cache<K, V>
where
    K: Hash + Eq + Clone,
    V: Clone,
{
    fn get(&self, ctx: &LoadContext, key: &K) -> Result<V> {
        if let Some(value) = self.get_if_present(key) {
            return Ok(value);
        }

        let mut inner = self.write();
        // Another caller may have stored the key while we waited for the lock.
        if let Some(value) = inner.store.get_exclusive(key) {
            return Ok(value);
        }
        let loader = inner.loader.clone().ok_or(CacheError::KeyNotFound)?;
        inner.load_and_store(&loader, ctx, key)
    }

    fn set_loader(&self, loader: Loader<K, V>) {
        self.write().loader = Some(loader);
    }

    fn refresh(&self, ctx: &LoadContext, key: &K) -> Result<()> {
        let mut inner = self.write();
        let Some(loader) = inner.loader.clone() else {
            debug!("refresh without a loader is a no-op");
            return Ok(());
        };
        inner.load_and_store(&loader, ctx, key).map(|_| ())
    }
}

impl<K, V> fmt::Debug for Cache<K, V>
where
    K: Hash + Eq + Clone,
    V: Clone,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.read();
        f.debug_struct("Cache")
            .field("policy", &inner.store.kind())
            .field("capacity", &inner.store.capacity())
            .field("len", &inner.store.len())
            .field("ttl", &inner.store.ttl())
            .field("has_loader", &inner.loader.is_some())
            .finish()
    }
}
