//! Sharded Cache Module
//!
//! Splits the key space over N independent [`Cache`] shards, each with its own
//! lock, policy and loader handle. Every key is routed to exactly one shard by
//! hash, so per-key semantics are the same as for a single cache while a slow
//! load only blocks the shard that owns its key.
//!
//! Eviction decisions are made per shard: the least recently (or frequently)
//! used entry of the full shard is evicted, not of the whole cache.

use std::collections::hash_map::RandomState;
use std::fmt;
use std::hash::{BuildHasher, Hash};

use tracing::debug;

use crate::cache::CacheStats;
use crate::config::{CacheConfig, PolicyKind};
use crate::context::LoadContext;
use crate::error::Result;
use crate::loading::Cache;
use crate::traits::{loader_fn, KeyValueCache, Loader, LoadingCache};

// == Sharded Cache ==
pub struct ShardedCache<K, V, S = RandomState> {
    shards: Box<[Cache<K, V>]>,
    hasher: S,
}

impl<K, V> ShardedCache<K, V, RandomState>
where
    K: Hash + Eq + Clone,
    V: Clone,
{
    /// Creates a sharded cache using `config.shards` shards.
    pub fn new(config: &CacheConfig) -> Self {
        Self::from_parts(config, None)
    }

    /// Creates a sharded cache whose shards load misses through `loader`.
    pub fn with_loader<F>(config: &CacheConfig, loader: F) -> Self
    where
        F: Fn(&LoadContext, &K) -> anyhow::Result<V> + Send + Sync + 'static,
    {
        Self::from_parts(config, Some(loader_fn(loader)))
    }

    pub(crate) fn from_parts(config: &CacheConfig, loader: Option<Loader<K, V>>) -> Self {
        Self::from_parts_with_hasher(config, loader, RandomState::new())
    }
}

impl<K, V, S> ShardedCache<K, V, S>
where
    K: Hash + Eq + Clone,
    V: Clone,
    S: BuildHasher,
{
    /// Builds the shards. The configured capacity is divided so that shard
    /// capacities add up to it exactly; the shard count is clamped to `1..=capacity`.
    pub(crate) fn from_parts_with_hasher(
        config: &CacheConfig,
        loader: Option<Loader<K, V>>,
        hasher: S,
    ) -> Self {
        let capacity = config.effective_capacity();
        let count = config.shards.clamp(1, capacity);
        let base = capacity / count;
        let remainder = capacity % count;

        let shards = (0..count)
            .map(|i| {
                let shard_config = CacheConfig {
                    capacity: base + usize::from(i < remainder),
                    shards: 1,
                    ..config.clone()
                };
                Cache::from_parts(&shard_config, loader.clone())
            })
            .collect();

        debug!(shards = count, capacity, "sharded cache created");
        Self { shards, hasher }
    }

    fn shard(&self, key: &K) -> &Cache<K, V> {
        let idx = (self.hasher.hash_one(key) % self.shards.len() as u64) as usize;
        &self.shards[idx]
    }

    /// Number of independently locked shards.
    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }

    /// Installs a closure as the loader of every shard.
    pub fn set_loader_fn<F>(&self, loader: F)
    where
        F: Fn(&LoadContext, &K) -> anyhow::Result<V> + Send + Sync + 'static,
    {
        LoadingCache::set_loader(self, loader_fn(loader));
    }

    /// Checks the owning shard for a live entry without touching it.
    pub fn contains_key(&self, key: &K) -> bool {
        self.shard(key).contains_key(key)
    }

    /// Entries held across all shards.
    pub fn len(&self) -> usize {
        self.shards.iter().map(Cache::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.shards.iter().all(Cache::is_empty)
    }

    /// Sum of the shard capacities, equal to the configured capacity.
    pub fn capacity(&self) -> usize {
        self.shards.iter().map(Cache::capacity).sum()
    }

    /// Eviction strategy shared by every shard.
    pub fn policy_kind(&self) -> PolicyKind {
        self.shards[0].policy_kind()
    }

    /// Counters summed over all shards.
    pub fn stats(&self) -> CacheStats {
        self.shards.iter().fold(CacheStats::default(), |mut total, shard| {
            total.merge(&shard.stats());
            total
        })
    }
}

impl<K, V, S> KeyValueCache<K, V> for ShardedCache<K, V, S>
where
    K: Hash + Eq + Clone,
    V: Clone,
    S: BuildHasher,
{
    fn get_if_present(&self, key: &K) -> Option<V> {
        self.shard(key).get_if_present(key)
    }

    fn put(&self, key: K, value: V) {
        self.shard(&key).put(key, value);
    }

    fn invalidate(&self, key: &K) {
        self.shard(key).invalidate(key);
    }

    /// Clears the shards one after another; not atomic across shards.
    fn invalidate_all(&self) {
        for shard in self.shards.iter() {
            shard.invalidate_all();
        }
    }

    fn close(&self) -> Result<()> {
        for shard in self.shards.iter() {
            shard.close()?;
        }
        Ok(())
    }
}

impl<K, V, S> LoadingCache<K, V> for ShardedCache<K, V, S>
where
    K: Hash + Eq + Clone,
    V: Clone,
    S: BuildHasher,
{
    fn get(&self, ctx: &LoadContext, key: &K) -> Result<V> {
        self.shard(key).get(ctx, key)
    }

    /// Installs the loader shard by shard.
    fn set_loader(&self, loader: Loader<K, V>) {
        for shard in self.shards.iter() {
            shard.set_loader(loader.clone());
        }
    }

    fn refresh(&self, ctx: &LoadContext, key: &K) -> Result<()> {
        self.shard(key).refresh(ctx, key)
    }
}

impl<K, V, S> fmt::Debug for ShardedCache<K, V, S>
where
    K: Hash + Eq + Clone,
    V: Clone,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShardedCache")
            .field("shards", &self.shards)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(capacity: usize, shards: usize) -> CacheConfig {
        CacheConfig {
            capacity,
            shards,
            ..CacheConfig::default()
        }
    }

    #[test]
    fn test_capacity_is_split_exactly() {
        let cache: ShardedCache<u32, u32> = ShardedCache::new(&config(10, 3));

        assert_eq!(cache.shard_count(), 3);
        assert_eq!(cache.capacity(), 10);
        let mut caps: Vec<usize> = cache.shards.iter().map(Cache::capacity).collect();
        caps.sort();
        assert_eq!(caps, vec![3, 3, 4]);
    }

    #[test]
    fn test_shard_count_is_clamped() {
        let cache: ShardedCache<u32, u32> = ShardedCache::new(&config(2, 8));
        assert_eq!(cache.shard_count(), 2);

        let cache: ShardedCache<u32, u32> = ShardedCache::new(&config(2, 0));
        assert_eq!(cache.shard_count(), 1);
    }

    #[test]
    fn test_huge_capacity_split_allocates_on_demand() {
        let cache: ShardedCache<u32, u32> = ShardedCache::new(&config(usize::MAX, 4));

        cache.put(1, 1);

        assert_eq!(cache.capacity(), usize::MAX);
        assert_eq!(cache.get_if_present(&1), Some(1));
    }

    #[test]
    fn test_key_routes_to_one_shard() {
        let cache: ShardedCache<u32, u32> = ShardedCache::new(&config(1000, 8));

        for i in 0..100 {
            cache.put(i, i * 10);
        }

        for i in 0..100 {
            assert_eq!(cache.get_if_present(&i), Some(i * 10));
            let holders = cache
                .shards
                .iter()
                .filter(|shard| shard.contains_key(&i))
                .count();
            assert_eq!(holders, 1);
        }
        assert_eq!(cache.len(), 100);
    }

    #[test]
    fn test_capacity_never_exceeded() {
        let cache: ShardedCache<u32, u32> = ShardedCache::new(&config(16, 4));

        for i in 0..500 {
            cache.put(i, i);
            assert!(cache.len() <= 16);
        }
    }

    #[test]
    fn test_loader_shared_by_shards() {
        let cache: ShardedCache<u32, u32> =
            ShardedCache::with_loader(&config(100, 4), |_, k: &u32| Ok(k * 2));
        let ctx = LoadContext::background();

        for i in 0..20 {
            assert_eq!(cache.get(&ctx, &i).unwrap(), i * 2);
        }
        assert_eq!(cache.stats().loads, 20);

        cache.set_loader_fn(|_, k| Ok(k * 3));
        cache.refresh(&ctx, &1).unwrap();
        assert_eq!(cache.get_if_present(&1), Some(3));
    }

    #[test]
    fn test_invalidate_all_and_close() {
        let cache: ShardedCache<u32, u32> = ShardedCache::new(&config(100, 4));
        for i in 0..50 {
            cache.put(i, i);
        }

        cache.invalidate(&7);
        assert!(!cache.contains_key(&7));

        cache.invalidate_all();
        assert!(cache.is_empty());
        assert!(cache.close().is_ok());
    }
}
