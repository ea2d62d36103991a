//! Typed write-through memo cache.
//!
//! The byte-oriented [`CacheKvStore`](crate::CacheKvStore) has a typed
//! sibling for immutable domain values: a plain memoizing map whose lookups
//! fall through to a parent loader on miss. There is no dirty tracking and
//! no flush — values are immutable, so writing through is always safe.

use std::collections::HashMap;
use std::hash::Hash as StdHash;
use std::sync::Mutex;

/// A write-through memoizing map over a parent lookup.
///
/// `get` consults the cache first and memoizes the parent's answer on miss.
/// `put` overwrites unconditionally; in debug builds it asserts that a put
/// never replaces a *distinct* pre-existing value for the same key, which
/// catches aliasing bugs where two copies of a supposedly shared value drift
/// apart.
pub struct MemoCache<K, V> {
    entries: Mutex<HashMap<K, V>>,
}

impl<K, V> Default for MemoCache<K, V> {
    fn default() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }
}

impl<K, V> MemoCache<K, V>
where
    K: Eq + StdHash + Clone,
    V: Clone,
{
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up `key`, loading and memoizing through `load` on miss.
    pub fn get_or_load(&self, key: &K, load: impl FnOnce() -> V) -> V {
        let mut entries = self.entries.lock().unwrap();
        if let Some(value) = entries.get(key) {
            return value.clone();
        }
        let value = load();
        entries.insert(key.clone(), value.clone());
        value
    }

    /// Look up `key` without loading.
    pub fn get(&self, key: &K) -> Option<V> {
        self.entries.lock().unwrap().get(key).cloned()
    }

    /// Visit every memoized entry.
    pub fn for_each(&self, mut f: impl FnMut(&K, &V)) {
        for (key, value) in self.entries.lock().unwrap().iter() {
            f(key, value);
        }
    }

    /// Number of memoized entries.
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.lock().unwrap().is_empty()
    }
}

impl<K, V> MemoCache<K, V>
where
    K: Eq + StdHash + Clone,
    V: Clone + PartialEq,
{
    /// Insert a value, overwriting any previous one.
    ///
    /// In debug builds, replacing a distinct pre-existing value panics —
    /// immutable values must not alias.
    pub fn put(&self, key: K, value: V) {
        let prev = self.entries.lock().unwrap().insert(key, value.clone());
        if let Some(prev) = prev {
            debug_assert!(prev == value, "memo cache put replaces a distinct value");
        }
    }
}
