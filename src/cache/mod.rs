//! Cache Module
//!
//! Provides bounded in-memory storage with pluggable eviction and lazy TTL expiration.

mod entry;
mod list;
pub mod policy;
mod stats;
mod store;

#[cfg(test)]
mod property_tests;

// Re-export public types
pub use entry::CacheEntry;
pub use policy::{EvictionPolicy, LfuPolicy, LruPolicy, Policy};
pub use stats::CacheStats;
pub use store::{CacheStore, Lookup};

pub(crate) use stats::StatsCounter;
