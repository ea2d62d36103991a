//! Shared test helpers for storage tests.
//!
//! Provides [`MemKv`], a minimal in-memory [`KvStore`] used as the parent in
//! cache and multi-store tests. The real versioned engine lives in
//! `ledgerkit-storage-memory`; this one is deliberately tiny.

use crate::traits::{KvPair, KvStore};
use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::Mutex;

/// A flat in-memory key/value store with no versioning.
#[derive(Default)]
pub struct MemKv {
    entries: Mutex<BTreeMap<Vec<u8>, Vec<u8>>>,
}

impl MemKv {
    fn collect_range(&self, start: Option<&[u8]>, end: Option<&[u8]>) -> Vec<KvPair> {
        let start = start.map_or(Bound::Unbounded, |s| Bound::Included(s.to_vec()));
        let end = end.map_or(Bound::Unbounded, |e| Bound::Excluded(e.to_vec()));
        self.entries
            .lock()
            .unwrap()
            .range((start, end))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

impl KvStore for MemKv {
    fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        self.entries.lock().unwrap().get(key).cloned()
    }

    fn set(&self, key: &[u8], value: &[u8]) {
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_vec(), value.to_vec());
    }

    fn delete(&self, key: &[u8]) {
        self.entries.lock().unwrap().remove(key);
    }

    fn iterator(
        &self,
        start: Option<&[u8]>,
        end: Option<&[u8]>,
    ) -> Box<dyn Iterator<Item = KvPair> + '_> {
        Box::new(self.collect_range(start, end).into_iter())
    }

    fn reverse_iterator(
        &self,
        start: Option<&[u8]>,
        end: Option<&[u8]>,
    ) -> Box<dyn Iterator<Item = KvPair> + '_> {
        Box::new(self.collect_range(start, end).into_iter().rev())
    }
}
