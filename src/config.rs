//! Configuration Module
//!
//! Construction options for a cache, loadable from environment variables or any
//! serde-compatible configuration source.

use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{CacheError, Result};

/// Capacity used when none (or zero) is configured.
pub const DEFAULT_CAPACITY: usize = 10_000;

// == Policy Kind ==
/// Eviction strategy selected once at construction time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PolicyKind {
    /// Least recently used
    #[default]
    Lru,
    /// Least frequently used, ties broken by oldest insertion
    Lfu,
}

impl FromStr for PolicyKind {
    type Err = CacheError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lru" => Ok(PolicyKind::Lru),
            "lfu" => Ok(PolicyKind::Lfu),
            other => Err(CacheError::InvalidConfig(format!(
                "unknown eviction policy '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for PolicyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PolicyKind::Lru => write!(f, "lru"),
            PolicyKind::Lfu => write!(f, "lfu"),
        }
    }
}

// == Cache Config ==
/// Cache construction parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Eviction strategy
    pub policy: PolicyKind,
    /// Maximum number of live entries, 0 = default
    pub capacity: usize,
    /// Per-entry time to live, None = never expires
    #[serde(rename = "ttl_ms", with = "ttl_millis")]
    pub ttl: Option<Duration>,
    /// Number of independently locked shards, only used by `ShardedCache`
    pub shards: usize,
}

impl CacheConfig {
    /// Creates a new CacheConfig by loading values from environment variables.
    ///
    /// Unparsable values fall back to their defaults.
    ///
    /// # Environment Variables
    /// - `CACHE_POLICY` - `lru` or `lfu` (default: lru)
    /// - `CACHE_CAPACITY` - Maximum live entries (default: 10000)
    /// - `CACHE_TTL_MS` - Entry TTL in milliseconds, 0 = never (default: 0)
    /// - `CACHE_SHARDS` - Shard count for sharded caches (default: 1)
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Like [`CacheConfig::from_env`], but rejects values that cannot be parsed.
    pub fn try_from_env() -> Result<Self> {
        Self::try_from_lookup(|name| env::var(name).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Self {
            policy: lookup("CACHE_POLICY")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.policy),
            capacity: lookup("CACHE_CAPACITY")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.capacity),
            ttl: lookup("CACHE_TTL_MS")
                .and_then(|v| v.parse().ok())
                .map(ttl_from_millis)
                .unwrap_or(defaults.ttl),
            shards: lookup("CACHE_SHARDS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.shards),
        }
    }

    pub(crate) fn try_from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(v) = lookup("CACHE_POLICY") {
            config.policy = v.parse()?;
        }
        if let Some(v) = lookup("CACHE_CAPACITY") {
            config.capacity = parse_number("CACHE_CAPACITY", &v)?;
        }
        if let Some(v) = lookup("CACHE_TTL_MS") {
            config.ttl = ttl_from_millis(parse_number("CACHE_TTL_MS", &v)?);
        }
        if let Some(v) = lookup("CACHE_SHARDS") {
            config.shards = parse_number("CACHE_SHARDS", &v)?;
        }
        Ok(config)
    }

    /// Capacity with the zero-means-default rule applied.
    pub fn effective_capacity(&self) -> usize {
        if self.capacity == 0 {
            DEFAULT_CAPACITY
        } else {
            self.capacity
        }
    }

    /// TTL with the zero-means-never rule applied.
    pub fn effective_ttl(&self) -> Option<Duration> {
        self.ttl.filter(|ttl| !ttl.is_zero())
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            policy: PolicyKind::Lru,
            capacity: DEFAULT_CAPACITY,
            ttl: None,
            shards: 1,
        }
    }
}

fn parse_number<T: FromStr>(name: &str, raw: &str) -> Result<T> {
    raw.trim()
        .parse()
        .map_err(|_| CacheError::InvalidConfig(format!("{} is not a number: '{}'", name, raw)))
}

fn ttl_from_millis(ms: u64) -> Option<Duration> {
    if ms == 0 {
        None
    } else {
        Some(Duration::from_millis(ms))
    }
}

/// TTLs travel as plain millisecond counts, 0 meaning "never". TTLs beyond
/// `u64::MAX` milliseconds are written as `u64::MAX`.
mod ttl_millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(ttl: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let ms = ttl
            .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
            .unwrap_or(0);
        serializer.serialize_u64(ms)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let ms = u64::deserialize(deserializer)?;
        Ok(super::ttl_from_millis(ms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_config_default() {
        let config = CacheConfig::default();
        assert_eq!(config.policy, PolicyKind::Lru);
        assert_eq!(config.capacity, 10_000);
        assert_eq!(config.ttl, None);
        assert_eq!(config.shards, 1);
    }

    #[test]
    fn test_config_from_lookup_defaults() {
        let config = CacheConfig::from_lookup(lookup_from(&[]));
        assert_eq!(config, CacheConfig::default());
    }

    #[test]
    fn test_config_from_lookup_values() {
        let config = CacheConfig::from_lookup(lookup_from(&[
            ("CACHE_POLICY", "LFU"),
            ("CACHE_CAPACITY", "64"),
            ("CACHE_TTL_MS", "1500"),
            ("CACHE_SHARDS", "4"),
        ]));
        assert_eq!(config.policy, PolicyKind::Lfu);
        assert_eq!(config.capacity, 64);
        assert_eq!(config.ttl, Some(Duration::from_millis(1500)));
        assert_eq!(config.shards, 4);
    }

    #[test]
    fn test_config_from_lookup_ignores_garbage() {
        let config = CacheConfig::from_lookup(lookup_from(&[
            ("CACHE_POLICY", "arc"),
            ("CACHE_CAPACITY", "lots"),
        ]));
        assert_eq!(config.policy, PolicyKind::Lru);
        assert_eq!(config.capacity, DEFAULT_CAPACITY);
    }

    #[test]
    fn test_try_from_lookup_rejects_garbage() {
        let result = CacheConfig::try_from_lookup(lookup_from(&[("CACHE_POLICY", "arc")]));
        assert!(matches!(result, Err(CacheError::InvalidConfig(_))));

        let result = CacheConfig::try_from_lookup(lookup_from(&[("CACHE_TTL_MS", "-5")]));
        assert!(matches!(result, Err(CacheError::InvalidConfig(_))));
    }

    #[test]
    fn test_zero_ttl_means_never() {
        let config = CacheConfig::from_lookup(lookup_from(&[("CACHE_TTL_MS", "0")]));
        assert_eq!(config.ttl, None);

        let config = CacheConfig {
            ttl: Some(Duration::ZERO),
            ..CacheConfig::default()
        };
        assert_eq!(config.effective_ttl(), None);
    }

    #[test]
    fn test_zero_capacity_means_default() {
        let config = CacheConfig {
            capacity: 0,
            ..CacheConfig::default()
        };
        assert_eq!(config.effective_capacity(), DEFAULT_CAPACITY);
    }

    #[test]
    fn test_policy_kind_display_roundtrip() {
        for kind in [PolicyKind::Lru, PolicyKind::Lfu] {
            assert_eq!(kind.to_string().parse::<PolicyKind>().unwrap(), kind);
        }
    }

    #[test]
    fn test_ttl_serialization_saturates_at_u64_max_millis() {
        let at_limit = CacheConfig {
            ttl: Some(Duration::from_millis(u64::MAX)),
            ..CacheConfig::default()
        };
        let json = serde_json::to_string(&at_limit).unwrap();
        let back: CacheConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, at_limit);

        let beyond = CacheConfig {
            ttl: Some(Duration::from_secs(u64::MAX / 500)),
            ..CacheConfig::default()
        };
        let json = serde_json::to_string(&beyond).unwrap();
        assert!(json.contains(&format!("\"ttl_ms\":{}", u64::MAX)));
        let back: CacheConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.ttl, Some(Duration::from_millis(u64::MAX)));
    }
}
