//! Cache Contracts
//!
//! The public cache surface, shared by [`Cache`](crate::Cache) and
//! [`ShardedCache`](crate::ShardedCache).

use std::sync::Arc;

use crate::context::LoadContext;
use crate::error::Result;

/// Produces the value for a key. May block on external I/O and should honor the
/// context's cancellation. Errors are returned to the caller untouched and never cached.
pub type Loader<K, V> = Arc<dyn Fn(&LoadContext, &K) -> anyhow::Result<V> + Send + Sync>;

/// Wraps a closure as a [`Loader`].
pub fn loader_fn<K, V, F>(f: F) -> Loader<K, V>
where
    F: Fn(&LoadContext, &K) -> anyhow::Result<V> + Send + Sync + 'static,
{
    Arc::new(f)
}

// == Key Value Cache ==
/// A key-value cache whose entries stay until evicted, expired or invalidated.
pub trait KeyValueCache<K, V> {
    /// Returns the cached value for `key`, or None if there is no live entry.
    fn get_if_present(&self, key: &K) -> Option<V>;

    /// Associates `value` with `key`, replacing any previous value.
    fn put(&self, key: K, value: V);

    /// Discards the cached value for `key`, if any.
    fn invalidate(&self, key: &K);

    /// Discards all entries.
    fn invalidate_all(&self);

    /// Marks the cache as finished. Callers must ensure the cache is no longer
    /// in use before and after closing; later calls are not guarded.
    fn close(&self) -> Result<()>;
}

// == Loading Cache ==
/// A cache that computes missing values through a [`Loader`].
pub trait LoadingCache<K, V>: KeyValueCache<K, V> {
    /// Returns the value for `key`, loading and storing it on a miss.
    ///
    /// Fails with `KeyNotFound` when the key is absent and no loader is set,
    /// or with `Loader` when the loader fails.
    fn get(&self, ctx: &LoadContext, key: &K) -> Result<V>;

    /// Replaces the loader used by subsequent `get` and `refresh` calls.
    fn set_loader(&self, loader: Loader<K, V>);

    /// Loads a fresh value for `key` and stores it, even if one is cached.
    ///
    /// On failure the previous state is kept and the loader's error returned.
    fn refresh(&self, ctx: &LoadContext, key: &K) -> Result<()>;
}
