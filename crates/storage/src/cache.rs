//! Copy-on-write cache store layered over a parent.
//!
//! [`CacheKvStore`] captures writes without modifying the parent store.
//! Reads check the cache first and fall through to the parent on miss,
//! memoizing the result. Writes and deletions are recorded as dirty entries
//! and reach the parent only when [`write`](CacheKvStore::write) copies them
//! through in one logical step; dropping the cache discards them.
//!
//! This is the building block for both execution sandboxing (per-mode state
//! over the committed view) and speculative handler execution (per-tx state
//! over the per-mode state).

use crate::traits::{KvPair, KvStore};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

/// A cached entry: `Some` records a write, `None` a tombstone or a memoized
/// parent miss. Only dirty entries are flushed by `write`.
#[derive(Clone)]
struct CacheEntry {
    value: Option<Vec<u8>>,
    dirty: bool,
}

/// An in-memory write buffer overlaying a parent store.
///
/// Single-writer: concurrent mutation through the same cache is not
/// meaningful (the interior lock prevents data races, not interleaving
/// anomalies). Read-only sharing is fine if the parent permits it.
pub struct CacheKvStore {
    parent: Arc<dyn KvStore>,
    entries: Mutex<BTreeMap<Vec<u8>, CacheEntry>>,
}

impl CacheKvStore {
    /// Create an empty cache over the given parent.
    pub fn new(parent: Arc<dyn KvStore>) -> Self {
        Self {
            parent,
            entries: Mutex::new(BTreeMap::new()),
        }
    }

    /// Copy every dirty entry through to the parent, then reset the cache.
    ///
    /// Entries are flushed in sorted key order so backings that care about
    /// insertion order observe a deterministic sequence. Clean (memoized)
    /// entries are discarded along with the dirty set. A no-op on an empty
    /// cache.
    pub fn write(&self) {
        let mut entries = self.entries.lock().unwrap();
        for (key, entry) in entries.iter() {
            if !entry.dirty {
                continue;
            }
            match &entry.value {
                Some(value) => self.parent.set(key, value),
                None => self.parent.delete(key),
            }
        }
        entries.clear();
    }

    /// Number of entries currently held (dirty and memoized).
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    /// Whether the cache holds no entries at all.
    pub fn is_empty(&self) -> bool {
        self.entries.lock().unwrap().is_empty()
    }

    /// Snapshot the in-range cache entries, ascending.
    fn range_entries(
        &self,
        start: Option<&[u8]>,
        end: Option<&[u8]>,
    ) -> Vec<(Vec<u8>, Option<Vec<u8>>)> {
        self.entries
            .lock()
            .unwrap()
            .iter()
            .filter(|(key, _)| in_range(key, start, end))
            .map(|(key, entry)| (key.clone(), entry.value.clone()))
            .collect()
    }
}

fn in_range(key: &[u8], start: Option<&[u8]>, end: Option<&[u8]>) -> bool {
    start.is_none_or(|s| key >= s) && end.is_none_or(|e| key < e)
}

impl KvStore for CacheKvStore {
    fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        let mut entries = self.entries.lock().unwrap();
        if let Some(entry) = entries.get(key) {
            return entry.value.clone();
        }
        let value = self.parent.get(key);
        entries.insert(
            key.to_vec(),
            CacheEntry {
                value: value.clone(),
                dirty: false,
            },
        );
        value
    }

    fn set(&self, key: &[u8], value: &[u8]) {
        self.entries.lock().unwrap().insert(
            key.to_vec(),
            CacheEntry {
                value: Some(value.to_vec()),
                dirty: true,
            },
        );
    }

    fn delete(&self, key: &[u8]) {
        self.entries.lock().unwrap().insert(
            key.to_vec(),
            CacheEntry {
                value: None,
                dirty: true,
            },
        );
    }

    fn iterator(
        &self,
        start: Option<&[u8]>,
        end: Option<&[u8]>,
    ) -> Box<dyn Iterator<Item = KvPair> + '_> {
        let cache = self.range_entries(start, end);
        let parent = self.parent.iterator(start, end);
        Box::new(MergeIter {
            parent: parent.peekable(),
            cache: cache.into_iter().peekable(),
            reverse: false,
        })
    }

    fn reverse_iterator(
        &self,
        start: Option<&[u8]>,
        end: Option<&[u8]>,
    ) -> Box<dyn Iterator<Item = KvPair> + '_> {
        let mut cache = self.range_entries(start, end);
        cache.reverse();
        let parent = self.parent.reverse_iterator(start, end);
        Box::new(MergeIter {
            parent: parent.peekable(),
            cache: cache.into_iter().peekable(),
            reverse: true,
        })
    }
}

/// Merges the parent iterator with the cache snapshot in the requested
/// order. On key collision the cache wins; tombstoned keys are skipped.
struct MergeIter<'a> {
    parent: std::iter::Peekable<Box<dyn Iterator<Item = KvPair> + 'a>>,
    cache: std::iter::Peekable<std::vec::IntoIter<(Vec<u8>, Option<Vec<u8>>)>>,
    reverse: bool,
}

/// Which stream supplies the next entry.
enum Head {
    Parent,
    Cache,
    /// Key collision: the cache entry shadows the parent's.
    Both,
}

impl Iterator for MergeIter<'_> {
    type Item = KvPair;

    fn next(&mut self) -> Option<KvPair> {
        let reverse = self.reverse;
        loop {
            let head = match (self.parent.peek(), self.cache.peek()) {
                (None, None) => return None,
                (Some(_), None) => Head::Parent,
                (None, Some(_)) => Head::Cache,
                (Some((parent_key, _)), Some((cache_key, _))) => {
                    if cache_key == parent_key {
                        Head::Both
                    } else if (cache_key < parent_key) != reverse {
                        Head::Cache
                    } else {
                        Head::Parent
                    }
                }
            };
            match head {
                Head::Parent => return self.parent.next(),
                Head::Cache => {
                    let (key, value) = self.cache.next().unwrap();
                    if let Some(value) = value {
                        return Some((key, value));
                    }
                    // Tombstone with no parent entry; skip.
                }
                Head::Both => {
                    self.parent.next();
                    let (key, value) = self.cache.next().unwrap();
                    if let Some(value) = value {
                        return Some((key, value));
                    }
                    // Tombstone shadowing a parent entry; skip both.
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::MemKv;

    fn parent_with(pairs: &[(&[u8], &[u8])]) -> Arc<MemKv> {
        let parent = Arc::new(MemKv::default());
        for (k, v) in pairs {
            parent.set(k, v);
        }
        parent
    }

    #[test]
    fn reads_fall_through_and_memoize() {
        let parent = parent_with(&[(b"a", b"1")]);
        let cache = CacheKvStore::new(parent.clone());

        assert_eq!(cache.get(b"a"), Some(b"1".to_vec()));
        assert_eq!(cache.get(b"missing"), None);
        // Both results are memoized, hit or miss.
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn writes_stay_in_cache_until_write() {
        let parent = parent_with(&[]);
        let cache = CacheKvStore::new(parent.clone());

        cache.set(b"k", b"v");
        assert_eq!(cache.get(b"k"), Some(b"v".to_vec()));
        assert_eq!(parent.get(b"k"), None);

        cache.write();
        assert_eq!(parent.get(b"k"), Some(b"v".to_vec()));
        assert!(cache.is_empty());
    }

    #[test]
    fn tombstone_hides_parent_value() {
        let parent = parent_with(&[(b"k", b"v")]);
        let cache = CacheKvStore::new(parent.clone());

        cache.delete(b"k");
        assert_eq!(cache.get(b"k"), None);
        assert!(!cache.has(b"k"));
        assert_eq!(parent.get(b"k"), Some(b"v".to_vec()));

        cache.write();
        assert_eq!(parent.get(b"k"), None);
    }

    #[test]
    fn write_on_empty_cache_is_noop() {
        let parent = parent_with(&[(b"a", b"1")]);
        let cache = CacheKvStore::new(parent.clone());
        cache.write();
        assert_eq!(parent.get(b"a"), Some(b"1".to_vec()));
    }

    #[test]
    fn clean_reads_are_not_flushed() {
        let parent = parent_with(&[(b"a", b"1")]);
        let cache = CacheKvStore::new(parent.clone());

        cache.get(b"a");
        parent.set(b"a", b"2");
        // The memoized read must not overwrite the parent's newer value.
        cache.write();
        assert_eq!(parent.get(b"a"), Some(b"2".to_vec()));
    }

    #[test]
    fn iterator_merges_and_shadows() {
        let parent = parent_with(&[(b"a", b"pa"), (b"c", b"pc"), (b"e", b"pe")]);
        let cache = CacheKvStore::new(parent);

        cache.set(b"b", b"cb");
        cache.set(b"c", b"cc");
        cache.delete(b"e");

        let items: Vec<KvPair> = cache.iterator(None, None).collect();
        assert_eq!(
            items,
            vec![
                (b"a".to_vec(), b"pa".to_vec()),
                (b"b".to_vec(), b"cb".to_vec()),
                (b"c".to_vec(), b"cc".to_vec()),
            ]
        );
    }

    #[test]
    fn iterator_respects_range() {
        let parent = parent_with(&[(b"a", b"1"), (b"b", b"2"), (b"d", b"4")]);
        let cache = CacheKvStore::new(parent);
        cache.set(b"c", b"3");

        let items: Vec<KvPair> = cache.iterator(Some(b"b"), Some(b"d")).collect();
        assert_eq!(
            items,
            vec![(b"b".to_vec(), b"2".to_vec()), (b"c".to_vec(), b"3".to_vec())]
        );
    }

    #[test]
    fn reverse_iterator_descends() {
        let parent = parent_with(&[(b"a", b"1"), (b"c", b"3")]);
        let cache = CacheKvStore::new(parent);
        cache.set(b"b", b"2");

        let keys: Vec<Vec<u8>> = cache.reverse_iterator(None, None).map(|(k, _)| k).collect();
        assert_eq!(keys, vec![b"c".to_vec(), b"b".to_vec(), b"a".to_vec()]);
    }

    #[test]
    fn nested_caches_flush_one_level_at_a_time() {
        let parent = parent_with(&[]);
        let outer = Arc::new(CacheKvStore::new(parent.clone()));
        let inner = CacheKvStore::new(outer.clone());

        inner.set(b"k", b"v");
        inner.write();
        assert_eq!(outer.get(b"k"), Some(b"v".to_vec()));
        assert_eq!(parent.get(b"k"), None);

        outer.write();
        assert_eq!(parent.get(b"k"), Some(b"v".to_vec()));
    }
}
