//! Fluent construction for [`Cache`] and [`ShardedCache`].
//!
//! ```
//! use std::time::Duration;
//!
//! use loading_cache::{Cache, LoadContext, LoadingCache, PolicyKind};
//!
//! let cache: Cache<u64, u64> = Cache::builder()
//!     .policy(PolicyKind::Lfu)
//!     .capacity(128)
//!     .ttl(Duration::from_secs(30))
//!     .loader(|_, k: &u64| Ok(k * 2))
//!     .build();
//!
//! assert_eq!(cache.get(&LoadContext::background(), &21).unwrap(), 42);
//! ```

use std::hash::{BuildHasher, Hash};
use std::time::Duration;

use crate::config::{CacheConfig, PolicyKind};
use crate::context::LoadContext;
use crate::loading::Cache;
use crate::sharded::ShardedCache;
use crate::traits::{loader_fn, Loader};

pub struct CacheBuilder<K, V> {
    config: CacheConfig,
    loader: Option<Loader<K, V>>,
}

impl<K, V> Default for CacheBuilder<K, V> {
    fn default() -> Self {
        Self {
            config: CacheConfig::default(),
            loader: None,
        }
    }
}

impl<K, V> CacheBuilder<K, V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts from an existing configuration, e.g. one read with `CacheConfig::from_env`.
    pub fn from_config(config: CacheConfig) -> Self {
        Self {
            config,
            loader: None,
        }
    }

    pub fn policy(mut self, policy: PolicyKind) -> Self {
        self.config.policy = policy;
        self
    }

    /// Maximum live entries; 0 selects the default.
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.config.capacity = capacity;
        self
    }

    /// Per-entry time to live; a zero duration means entries never expire.
    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.config.ttl = Some(ttl);
        self
    }

    pub fn shards(mut self, shards: usize) -> Self {
        self.config.shards = shards;
        self
    }

    pub fn loader<F>(mut self, loader: F) -> Self
    where
        F: Fn(&LoadContext, &K) -> anyhow::Result<V> + Send + Sync + 'static,
    {
        self.loader = Some(loader_fn(loader));
        self
    }

    pub fn shared_loader(mut self, loader: Loader<K, V>) -> Self {
        self.loader = Some(loader);
        self
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }
}

impl<K, V> CacheBuilder<K, V>
where
    K: Hash + Eq + Clone,
    V: Clone,
{
    pub fn build(self) -> Cache<K, V> {
        Cache::from_parts(&self.config, self.loader)
    }

    /// Builds a cache split into `shards` independently locked shards.
    pub fn build_sharded(self) -> ShardedCache<K, V> {
        ShardedCache::from_parts(&self.config, self.loader)
    }

    /// Like [`CacheBuilder::build_sharded`] with a custom key hasher.
    pub fn build_sharded_with_hasher<S: BuildHasher>(self, hasher: S) -> ShardedCache<K, V, S> {
        ShardedCache::from_parts_with_hasher(&self.config, self.loader, hasher)
    }
}
