//! LFU Policy Module
//!
//! Implements Least Frequently Used eviction with O(1) frequency buckets.
//!
//! Every key sits in exactly one bucket, the one for its access count. Buckets
//! are insertion-ordered lists sharing one node arena, so among keys tied on the
//! lowest count the one that entered that bucket first is evicted.

use std::collections::HashMap;
use std::hash::Hash;

use tracing::trace;

use super::EvictionPolicy;
use crate::cache::list::{Arena, Links, INITIAL_SLOTS};

#[derive(Debug)]
struct Node<K, V> {
    key: K,
    value: V,
    freq: u64,
}

// == LFU Policy ==
#[derive(Debug)]
pub struct LfuPolicy<K, V> {
    /// Key -> arena index
    index: HashMap<K, usize>,
    nodes: Arena<Node<K, V>>,
    /// Access count -> keys at that count, oldest first
    buckets: HashMap<u64, Links>,
    /// Lowest non-empty bucket; None after a delete emptied it, until the next insert
    min_freq: Option<u64>,
    capacity: usize,
}

impl<K: Hash + Eq + Clone, V> LfuPolicy<K, V> {
    // == Constructor ==
    /// Creates a new empty LFU policy holding at most `capacity` entries.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let reserved = capacity.min(INITIAL_SLOTS);
        Self {
            index: HashMap::with_capacity(reserved),
            nodes: Arena::with_capacity(reserved),
            buckets: HashMap::new(),
            min_freq: None,
            capacity,
        }
    }

    /// Access count of `key`, if present.
    pub fn frequency(&self, key: &K) -> Option<u64> {
        let idx = *self.index.get(key)?;
        self.nodes.get(idx).map(|node| node.freq)
    }

    /// The tracked lowest frequency.
    pub fn min_frequency(&self) -> Option<u64> {
        self.min_freq
    }

    // == Bump ==
    /// Moves the node at `idx` from its bucket to the back of the next one.
    fn bump(&mut self, idx: usize) {
        let old = match self.nodes.get_mut(idx) {
            Some(node) => {
                node.freq += 1;
                node.freq - 1
            }
            None => return,
        };

        let emptied = match self.buckets.get_mut(&old) {
            Some(bucket) => {
                self.nodes.unlink(bucket, idx);
                bucket.is_empty()
            }
            None => false,
        };
        if emptied {
            self.buckets.remove(&old);
            if self.min_freq == Some(old) {
                self.min_freq = Some(old + 1);
            }
        }

        let bucket = self.buckets.entry(old + 1).or_default();
        self.nodes.push_back(bucket, idx);
    }

    // == Evict ==
    /// Removes the oldest key of the lowest-frequency bucket.
    fn evict(&mut self) -> Option<(K, V)> {
        // min_freq is only unset right after a delete, when the cache is below
        // capacity, so the scan is a fallback that should not run.
        let min = self
            .min_freq
            .or_else(|| self.buckets.keys().min().copied())?;
        let bucket = self.buckets.get_mut(&min)?;
        let idx = bucket.front()?;
        self.nodes.unlink(bucket, idx);
        if bucket.is_empty() {
            self.buckets.remove(&min);
            self.min_freq = None;
        }

        let node = self.nodes.remove(idx)?;
        self.index.remove(&node.key);
        trace!(freq = node.freq, "lfu evicted least frequently used entry");
        Some((node.key, node.value))
    }

    /// Verifies the bucket bookkeeping; used by tests.
    #[cfg(test)]
    pub(crate) fn check_invariants(&self) -> std::result::Result<(), String> {
        let mut seen = 0;
        for (&freq, bucket) in &self.buckets {
            if bucket.is_empty() {
                return Err(format!("bucket {} is empty but still tracked", freq));
            }
            for node in self.nodes.iter(bucket) {
                if node.freq != freq {
                    return Err(format!("node in bucket {} has freq {}", freq, node.freq));
                }
                if !self.index.contains_key(&node.key) {
                    return Err("bucketed key missing from index".to_string());
                }
                seen += 1;
            }
        }
        if seen != self.index.len() {
            return Err(format!("{} keys bucketed, {} indexed", seen, self.index.len()));
        }
        if let Some(min) = self.min_freq {
            if !self.buckets.contains_key(&min) {
                return Err(format!("min_freq {} points at an empty bucket", min));
            }
            if self.buckets.keys().any(|&f| f < min) {
                return Err(format!("min_freq {} is not the lowest bucket", min));
            }
        }
        if self.index.len() > self.capacity {
            return Err(format!("{} entries exceed capacity {}", self.index.len(), self.capacity));
        }
        Ok(())
    }
}

impl<K: Hash + Eq + Clone, V> EvictionPolicy<K, V> for LfuPolicy<K, V> {
    fn get(&mut self, key: &K) -> Option<&V> {
        let idx = *self.index.get(key)?;
        self.bump(idx);
        self.nodes.get(idx).map(|node| &node.value)
    }

    fn peek(&self, key: &K) -> Option<&V> {
        let idx = *self.index.get(key)?;
        self.nodes.get(idx).map(|node| &node.value)
    }

    fn set(&mut self, key: K, value: V) -> Option<(K, V)> {
        if let Some(&idx) = self.index.get(&key) {
            if let Some(node) = self.nodes.get_mut(idx) {
                node.value = value;
            }
            self.bump(idx);
            return None;
        }

        let evicted = if self.index.len() >= self.capacity {
            self.evict()
        } else {
            None
        };

        let idx = self.nodes.insert(Node {
            key: key.clone(),
            value,
            freq: 1,
        });
        let bucket = self.buckets.entry(1).or_default();
        self.nodes.push_back(bucket, idx);
        self.index.insert(key, idx);
        self.min_freq = Some(1);

        evicted
    }

    fn remove(&mut self, key: &K) -> Option<V> {
        let idx = self.index.remove(key)?;
        let freq = self.nodes.get(idx).map(|node| node.freq)?;

        let emptied = match self.buckets.get_mut(&freq) {
            Some(bucket) => {
                self.nodes.unlink(bucket, idx);
                bucket.is_empty()
            }
            None => false,
        };
        if emptied {
            self.buckets.remove(&freq);
            if self.min_freq == Some(freq) {
                self.min_freq = None;
            }
        }

        self.nodes.remove(idx).map(|node| node.value)
    }

    fn keys(&self) -> Vec<K> {
        self.buckets
            .values()
            .flat_map(|bucket| self.nodes.iter(bucket))
            .map(|node| node.key.clone())
            .collect()
    }

    fn len(&self) -> usize {
        debug_assert_eq!(self.index.len(), self.nodes.len());
        self.index.len()
    }

    fn capacity(&self) -> usize {
        self.capacity
    }
}
