//! LRU Policy Module
//!
//! Implements Least Recently Used eviction with O(1) bookkeeping.

use std::collections::HashMap;
use std::hash::Hash;

use tracing::trace;

use super::EvictionPolicy;
use crate::cache::list::{Arena, Links, INITIAL_SLOTS};

#[derive(Debug)]
struct Node<K, V> {
    key: K,
    value: V,
}

// == LRU Policy ==
/// Tracks access order for LRU eviction.
///
/// Nodes live in an index-addressed arena, threaded on one recency list:
/// - Front = Most recently used
/// - Back = Least recently used
#[derive(Debug)]
pub struct LruPolicy<K, V> {
    /// Key -> arena index
    index: HashMap<K, usize>,
    nodes: Arena<Node<K, V>>,
    recency: Links,
    capacity: usize,
}

impl<K: Hash + Eq + Clone, V> LruPolicy<K, V> {
    // == Constructor ==
    /// Creates a new empty LRU policy holding at most `capacity` entries.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let reserved = capacity.min(INITIAL_SLOTS);
        Self {
            index: HashMap::with_capacity(reserved),
            nodes: Arena::with_capacity(reserved),
            recency: Links::default(),
            capacity,
        }
    }

    // == Peek Oldest ==
    /// Returns the least recently used key without touching it.
    pub fn peek_oldest(&self) -> Option<&K> {
        let idx = self.recency.back()?;
        self.nodes.get(idx).map(|node| &node.key)
    }

    /// Keys from most to least recently used.
    pub fn keys_by_recency(&self) -> Vec<K> {
        self.nodes
            .iter(&self.recency)
            .map(|node| node.key.clone())
            .collect()
    }

    // == Evict Oldest ==
    fn evict_oldest(&mut self) -> Option<(K, V)> {
        let idx = self.recency.back()?;
        self.nodes.unlink(&mut self.recency, idx);
        let node = self.nodes.remove(idx)?;
        self.index.remove(&node.key);
        Some((node.key, node.value))
    }
}

impl<K: Hash + Eq + Clone, V> EvictionPolicy<K, V> for LruPolicy<K, V> {
    fn get(&mut self, key: &K) -> Option<&V> {
        let idx = *self.index.get(key)?;
        self.nodes.move_to_front(&mut self.recency, idx);
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
            self.nodes.move_to_front(&mut self.recency, idx);
            return None;
        }

        let idx = self.nodes.insert(Node {
            key: key.clone(),
            value,
        });
        self.nodes.push_front(&mut self.recency, idx);
        self.index.insert(key, idx);

        if self.index.len() > self.capacity {
            let evicted = self.evict_oldest();
            if evicted.is_some() {
                trace!(len = self.index.len(), "lru evicted least recently used entry");
            }
            evicted
        } else {
            None
        }
    }

    fn remove(&mut self, key: &K) -> Option<V> {
        let idx = self.index.remove(key)?;
        self.nodes.unlink(&mut self.recency, idx);
        self.nodes.remove(idx).map(|node| node.value)
    }

    fn keys(&self) -> Vec<K> {
        self.index.keys().cloned().collect()
    }

    fn len(&self) -> usize {
        debug_assert_eq!(self.index.len(), self.nodes.len());
        debug_assert_eq!(self.index.len(), self.recency.len());
        self.index.len()
    }

    fn capacity(&self) -> usize {
        self.capacity
    }
}
