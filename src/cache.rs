//! Bounded query cache (C9), shared by all fluent query roots of a single
//! [`crate::graph::Graph`] (§4.7).
//!
//! Eviction policy is unspecified by the source system (§9 open question);
//! this implementation uses the `lru` crate for an exact-LRU policy, which
//! trivially satisfies "any bound-respecting policy is acceptable".

use std::num::NonZeroUsize;

use lru::LruCache;

use crate::model::{EdgeId, NodeId};

/// Default capacity when configured with `n <= 0`.
pub const DEFAULT_CAPACITY: usize = 1000;

/// The handful of result shapes the query engine's cacheable operations
/// produce. Closed set, since the cache is internal to this crate and only
/// ever stores results of [`crate::traversal`], [`crate::filter`],
/// [`crate::pathfinder`] and [`crate::events`].
#[derive(Debug, Clone)]
pub enum CacheValue {
    /// A list of individual/family node ids, e.g. ancestor/descendant or
    /// filter results.
    NodeIds(Vec<NodeId>),
    /// A scalar count, e.g. `Count()`/`Exists()`.
    Count(usize),
    /// A reconstructed path, or `None` if the endpoints are disconnected.
    Path(Option<Vec<(NodeId, Option<EdgeId>)>>),
}

/// A key deterministically derived from `(opName, argsTuple)`. Equal
/// argument tuples of equal dynamic types produce equal keys (§4.7).
pub fn cache_key(op: &str, args: &[&str]) -> String {
    let mut key = String::from(op);
    for arg in args {
        key.push('\u{0}');
        key.push_str(arg);
    }
    key
}

/// A single per-graph LRU cache of query results.
pub struct QueryCache {
    inner: LruCache<String, CacheValue>,
}

impl QueryCache {
    /// Create a cache with the given capacity. `capacity <= 0` uses
    /// [`DEFAULT_CAPACITY`].
    pub fn with_capacity(capacity: isize) -> Self {
        let capacity = if capacity <= 0 { DEFAULT_CAPACITY } else { capacity as usize };
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::new(DEFAULT_CAPACITY).unwrap());
        Self { inner: LruCache::new(capacity) }
    }

    /// Look up a cached result.
    pub fn get(&mut self, key: &str) -> Option<CacheValue> {
        self.inner.get(key).cloned()
    }

    /// Insert or update a cached result.
    pub fn put(&mut self, key: String, value: CacheValue) {
        self.inner.put(key, value);
    }

    /// Remove all entries.
    pub fn clear(&mut self) {
        self.inner.clear();
    }

    /// Number of entries currently cached.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::with_capacity(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::SlotMap;

    fn fresh_ids(n: usize) -> Vec<NodeId> {
        let mut map: SlotMap<NodeId, ()> = SlotMap::with_key();
        (0..n).map(|_| map.insert(())).collect()
    }

    #[test]
    fn respects_capacity_bound() {
        let mut cache = QueryCache::with_capacity(5);
        let ids = fresh_ids(10);
        for i in 0..10 {
            cache.put(cache_key("op", &[&i.to_string()]), CacheValue::NodeIds(vec![ids[i]]));
        }
        assert!(cache.len() <= 5);
    }

    #[test]
    fn clear_removes_all_entries() {
        let mut cache = QueryCache::with_capacity(5);
        let ids = fresh_ids(1);
        let key = cache_key("op", &["a"]);
        cache.put(key.clone(), CacheValue::NodeIds(vec![ids[0]]));
        assert_eq!(cache.len(), 1);
        cache.clear();
        assert_eq!(cache.len(), 0);
        assert!(cache.get(&key).is_none());
    }

    #[test]
    fn equal_arg_tuples_produce_equal_keys() {
        assert_eq!(cache_key("ancestors", &["@I1@", "2"]), cache_key("ancestors", &["@I1@", "2"]));
        assert_ne!(cache_key("ancestors", &["@I1@", "2"]), cache_key("ancestors", &["@I1@", "3"]));
    }
}
