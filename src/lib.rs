//! Loading Cache - A bounded in-memory key-value cache
//!
//! Evicts under an LRU or LFU policy when full, optionally expires entries after a
//! TTL (lazily, on access), and computes missing values through a loader.
//!
//! ```
//! use loading_cache::{Cache, CacheConfig, KeyValueCache, LoadContext, LoadingCache};
//!
//! let cache = Cache::with_loader(&CacheConfig::default(), |_, k: &u64| Ok(k * 2));
//!
//! assert_eq!(cache.get(&LoadContext::background(), &5).unwrap(), 10);
//! assert_eq!(cache.get_if_present(&5), Some(10));
//! ```

pub mod builder;
pub mod cache;
pub mod config;
pub mod context;
pub mod error;
pub mod loading;
pub mod sharded;
pub mod traits;

pub use builder::CacheBuilder;
pub use cache::{CacheEntry, CacheStats, EvictionPolicy};
pub use config::{CacheConfig, PolicyKind, DEFAULT_CAPACITY};
pub use context::{ContextError, LoadContext};
pub use error::{CacheError, Result};
pub use loading::Cache;
pub use sharded::ShardedCache;
pub use traits::{loader_fn, KeyValueCache, Loader, LoadingCache};
