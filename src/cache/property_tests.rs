//! Property-Based Tests for Cache Module
//!
//! Uses proptest to check both eviction policies against simple reference models
//! and the store against its capacity and expiry guarantees.

use proptest::prelude::*;
use std::collections::HashMap;
use std::thread::sleep;
use std::time::Duration;

use crate::cache::policy::{EvictionPolicy, LfuPolicy, LruPolicy};
use crate::cache::{CacheStore, Lookup};
use crate::config::PolicyKind;

// == Strategies ==
/// Small key space so operations collide often
fn key_strategy() -> impl Strategy<Value = u8> {
    0u8..8
}

#[derive(Debug, Clone)]
enum PolicyOp {
    Get(u8),
    Set(u8, u32),
    Remove(u8),
}

fn policy_op_strategy() -> impl Strategy<Value = PolicyOp> {
    prop_oneof![
        3 => key_strategy().prop_map(PolicyOp::Get),
        4 => (key_strategy(), any::<u32>()).prop_map(|(k, v)| PolicyOp::Set(k, v)),
        1 => key_strategy().prop_map(PolicyOp::Remove),
    ]
}

fn policy_kind_strategy() -> impl Strategy<Value = PolicyKind> {
    prop_oneof![Just(PolicyKind::Lru), Just(PolicyKind::Lfu)]
}

// == Reference Models ==
/// Recency list, most recently used first.
#[derive(Default)]
struct LruModel {
    order: Vec<(u8, u32)>,
}

impl LruModel {
    fn get(&mut self, key: u8) -> Option<u32> {
        let pos = self.order.iter().position(|(k, _)| *k == key)?;
        let entry = self.order.remove(pos);
        self.order.insert(0, entry);
        Some(entry.1)
    }

    fn set(&mut self, key: u8, value: u32, capacity: usize) -> Option<(u8, u32)> {
        if let Some(pos) = self.order.iter().position(|(k, _)| *k == key) {
            self.order.remove(pos);
            self.order.insert(0, (key, value));
            return None;
        }
        self.order.insert(0, (key, value));
        if self.order.len() > capacity {
            self.order.pop()
        } else {
            None
        }
    }

    fn remove(&mut self, key: u8) -> Option<u32> {
        let pos = self.order.iter().position(|(k, _)| *k == key)?;
        Some(self.order.remove(pos).1)
    }
}

/// Counts plus the tick at which each key last entered its frequency bucket.
#[derive(Default)]
struct LfuModel {
    entries: HashMap<u8, (u32, u64, u64)>,
    tick: u64,
}

impl LfuModel {
    fn next_tick(&mut self) -> u64 {
        self.tick += 1;
        self.tick
    }

    fn get(&mut self, key: u8) -> Option<u32> {
        let tick = self.next_tick();
        let entry = self.entries.get_mut(&key)?;
        entry.1 += 1;
        entry.2 = tick;
        Some(entry.0)
    }

    fn set(&mut self, key: u8, value: u32, capacity: usize) -> Option<(u8, u32)> {
        let tick = self.next_tick();
        if let Some(entry) = self.entries.get_mut(&key) {
            entry.0 = value;
            entry.1 += 1;
            entry.2 = tick;
            return None;
        }
        let mut evicted = None;
        if self.entries.len() >= capacity {
            let victim = self
                .entries
                .iter()
                .min_by_key(|(_, (_, freq, since))| (*freq, *since))
                .map(|(k, _)| *k);
            if let Some(victim) = victim {
                let (v, _, _) = self.entries.remove(&victim).unwrap();
                evicted = Some((victim, v));
            }
        }
        self.entries.insert(key, (value, 1, tick));
        evicted
    }

    fn remove(&mut self, key: u8) -> Option<u32> {
        self.entries.remove(&key).map(|(v, _, _)| v)
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    // LRU agrees with the reference recency list on every result and eviction.
    #[test]
    fn prop_lru_matches_model(
        capacity in 1usize..6,
        ops in prop::collection::vec(policy_op_strategy(), 1..120)
    ) {
        let mut lru = LruPolicy::new(capacity);
        let mut model = LruModel::default();

        for op in ops {
            match op {
                PolicyOp::Get(k) => prop_assert_eq!(lru.get(&k).copied(), model.get(k)),
                PolicyOp::Set(k, v) => prop_assert_eq!(lru.set(k, v), model.set(k, v, capacity)),
                PolicyOp::Remove(k) => prop_assert_eq!(lru.remove(&k), model.remove(k)),
            }
            let expected: Vec<u8> = model.order.iter().map(|(k, _)| *k).collect();
            prop_assert_eq!(lru.keys_by_recency(), expected);
        }
    }

    // LFU agrees with the reference counts, including the oldest-first tie-break,
    // and keeps its bucket bookkeeping consistent after every step.
    #[test]
    fn prop_lfu_matches_model(
        capacity in 1usize..6,
        ops in prop::collection::vec(policy_op_strategy(), 1..120)
    ) {
        let mut lfu = LfuPolicy::new(capacity);
        let mut model = LfuModel::default();

        for op in ops {
            match op {
                PolicyOp::Get(k) => prop_assert_eq!(lfu.get(&k).copied(), model.get(k)),
                PolicyOp::Set(k, v) => prop_assert_eq!(lfu.set(k, v), model.set(k, v, capacity)),
                PolicyOp::Remove(k) => prop_assert_eq!(lfu.remove(&k), model.remove(k)),
            }
            if let Err(msg) = lfu.check_invariants() {
                prop_assert!(false, "LFU invariant broken: {}", msg);
            }
            for (k, (_, freq, _)) in &model.entries {
                prop_assert_eq!(lfu.frequency(k), Some(*freq));
            }
        }
    }

    // The number of entries never exceeds capacity, for either policy.
    #[test]
    fn prop_capacity_enforcement(
        kind in policy_kind_strategy(),
        capacity in 1usize..20,
        ops in prop::collection::vec(policy_op_strategy(), 1..200)
    ) {
        let mut store: CacheStore<u8, u32> = CacheStore::new(kind, capacity, None);

        for op in ops {
            match op {
                PolicyOp::Get(k) => { store.get(&k); }
                PolicyOp::Set(k, v) => store.set(k, v),
                PolicyOp::Remove(k) => { store.delete(&k); }
            }
            prop_assert!(
                store.len() <= capacity,
                "Store size {} exceeds capacity {}",
                store.len(),
                capacity
            );
        }
    }

    // Storing a value and reading it back (before expiry) returns the same value.
    #[test]
    fn prop_overwrite_semantics(
        kind in policy_kind_strategy(),
        key in key_strategy(),
        value1 in any::<u32>(),
        value2 in any::<u32>()
    ) {
        let mut store: CacheStore<u8, u32> = CacheStore::new(kind, 4, None);

        store.set(key, value1);
        store.set(key, value2);

        prop_assert_eq!(store.get(&key), Lookup::Hit(value2));
        prop_assert_eq!(store.len(), 1);
    }

    // Clearing removes everything, and clearing again is harmless.
    #[test]
    fn prop_clear_is_idempotent(
        kind in policy_kind_strategy(),
        keys in prop::collection::vec(key_strategy(), 0..20)
    ) {
        let mut store: CacheStore<u8, u32> = CacheStore::new(kind, 8, None);
        for key in keys {
            store.set(key, u32::from(key));
        }

        store.clear();
        prop_assert!(store.is_empty());
        prop_assert_eq!(store.clear(), 0);
        prop_assert!(store.is_empty());
    }
}

// Separate proptest block with fewer cases for time-sensitive TTL tests
proptest! {
    #![proptest_config(ProptestConfig::with_cases(5))]

    // After the TTL has elapsed the entry is reported expired once, then gone.
    #[test]
    fn prop_ttl_expiration_behavior(
        kind in policy_kind_strategy(),
        key in key_strategy(),
        value in any::<u32>()
    ) {
        let mut store: CacheStore<u8, u32> =
            CacheStore::new(kind, 4, Some(Duration::from_millis(10)));

        store.set(key, value);
        prop_assert_eq!(store.get(&key), Lookup::Hit(value));

        sleep(Duration::from_millis(20));

        prop_assert_eq!(store.get(&key), Lookup::Expired);
        prop_assert!(store.discard_expired(&key));
        prop_assert_eq!(store.get(&key), Lookup::Miss);
        prop_assert!(!store.discard_expired(&key));
    }
}
