//! In-memory database handle and versioned store engine.

use im::OrdMap;
use ledgerkit_storage::{CommitKvStore, Db, KvPair, KvStore, PruningStrategy, StoreConstructor};
use ledgerkit_types::{AppError, CommitId, Hash, StoreKey};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

/// Version history of one named store: structurally-shared snapshots plus
/// the per-version content hash.
#[derive(Default, Clone)]
struct StoreHistory {
    versions: BTreeMap<i64, OrdMap<Vec<u8>, Vec<u8>>>,
    hashes: BTreeMap<i64, Hash>,
}

#[derive(Default)]
struct MemDbInner {
    meta: Mutex<HashMap<Vec<u8>, Vec<u8>>>,
    histories: Mutex<HashMap<String, StoreHistory>>,
}

/// A shared in-memory database.
///
/// Cloning yields another handle to the same data, so an application can be
/// dropped and re-instantiated over the same `MemDb` and reload its committed
/// state. Store histories are keyed by store *name*: a fresh `StoreKey` of
/// the same name in the new instance finds the old history.
#[derive(Default, Clone)]
pub struct MemDb {
    inner: Arc<MemDbInner>,
}

impl MemDb {
    /// Create an empty database.
    pub fn new() -> Self {
        Self::default()
    }

    fn with_history<R>(&self, name: &str, f: impl FnOnce(&mut StoreHistory) -> R) -> R {
        let mut histories = self.inner.histories.lock().unwrap();
        f(histories.entry(name.to_string()).or_default())
    }
}

impl Db for MemDb {
    fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        self.inner.meta.lock().unwrap().get(key).cloned()
    }

    fn set(&self, key: &[u8], value: &[u8]) {
        self.inner
            .meta
            .lock()
            .unwrap()
            .insert(key.to_vec(), value.to_vec());
    }
}

struct MemStoreInner {
    working: OrdMap<Vec<u8>, Vec<u8>>,
    version: i64,
}

/// A versioned in-memory store over a [`MemDb`].
///
/// The working state is an `im::OrdMap`; committing clones it into the
/// database's history for the store name in O(1) and records a deterministic
/// content hash (blake3 over the version and the sorted entries).
pub struct MemStore {
    db: MemDb,
    name: String,
    inner: Mutex<MemStoreInner>,
}

impl MemStore {
    /// Create a store engine for `key` over the given database.
    ///
    /// The working state starts empty at version 0; the multi-store drives
    /// `load_version` to restore committed content.
    pub fn new(db: MemDb, key: &StoreKey) -> Self {
        Self {
            db,
            name: key.name().to_string(),
            inner: Mutex::new(MemStoreInner {
                working: OrdMap::new(),
                version: 0,
            }),
        }
    }

    /// A mount-time constructor closing over the database handle.
    pub fn constructor(db: MemDb) -> StoreConstructor {
        Arc::new(move |key| {
            let engine: Arc<dyn CommitKvStore> = Arc::new(MemStore::new(db.clone(), key));
            engine
        })
    }

    fn collect_range(&self, start: Option<&[u8]>, end: Option<&[u8]>) -> Vec<KvPair> {
        let inner = self.inner.lock().unwrap();
        inner
            .working
            .iter()
            .filter(|(key, _)| {
                start.is_none_or(|s| key.as_slice() >= s) && end.is_none_or(|e| key.as_slice() < e)
            })
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

/// Deterministic content hash: version plus the length-prefixed sorted
/// entries. Identical content at an identical version always reproduces the
/// identical hash, which is what block replay relies on.
fn content_hash(version: i64, entries: &OrdMap<Vec<u8>, Vec<u8>>) -> Hash {
    let mut bytes = Vec::new();
    bytes.extend_from_slice(&version.to_le_bytes());
    for (key, value) in entries.iter() {
        bytes.extend_from_slice(&(key.len() as u64).to_le_bytes());
        bytes.extend_from_slice(key);
        bytes.extend_from_slice(&(value.len() as u64).to_le_bytes());
        bytes.extend_from_slice(value);
    }
    Hash::from_bytes(&bytes)
}

impl KvStore for MemStore {
    fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        self.inner.lock().unwrap().working.get(key).cloned()
    }

    fn set(&self, key: &[u8], value: &[u8]) {
        self.inner
            .lock()
            .unwrap()
            .working
            .insert(key.to_vec(), value.to_vec());
    }

    fn delete(&self, key: &[u8]) {
        self.inner.lock().unwrap().working.remove(key);
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

impl CommitKvStore for MemStore {
    fn commit(&self, version: i64) -> Hash {
        let mut inner = self.inner.lock().unwrap();
        let snapshot = inner.working.clone();
        let hash = content_hash(version, &snapshot);
        self.db.with_history(&self.name, |history| {
            history.versions.insert(version, snapshot);
            history.hashes.insert(version, hash);
        });
        inner.version = version;
        hash
    }

    fn load_version(&self, version: i64) -> Result<(), AppError> {
        let mut inner = self.inner.lock().unwrap();
        if version == 0 {
            inner.working = OrdMap::new();
            inner.version = 0;
            return Ok(());
        }
        let snapshot = self
            .db
            .with_history(&self.name, |history| history.versions.get(&version).cloned())
            .ok_or_else(|| {
                AppError::InvalidVersion(format!(
                    "store {:?} has no version {version}",
                    self.name
                ))
            })?;
        inner.working = snapshot;
        inner.version = version;
        Ok(())
    }

    fn latest_version(&self) -> i64 {
        self.db.with_history(&self.name, |history| {
            history.versions.keys().next_back().copied().unwrap_or(0)
        })
    }

    fn last_commit_id(&self) -> CommitId {
        let version = self.inner.lock().unwrap().version;
        if version == 0 {
            return CommitId::ZERO;
        }
        let hash = self
            .db
            .with_history(&self.name, |history| history.hashes.get(&version).copied())
            .unwrap_or(Hash::ZERO);
        CommitId::new(version, hash)
    }

    fn get_at_version(&self, key: &[u8], version: i64) -> Result<Option<Vec<u8>>, AppError> {
        self.db.with_history(&self.name, |history| {
            let version = if version == 0 {
                match history.versions.keys().next_back() {
                    Some(latest) => *latest,
                    None => return Ok(None),
                }
            } else {
                version
            };
            let snapshot = history.versions.get(&version).ok_or_else(|| {
                AppError::InvalidVersion(format!(
                    "store {:?} has no version {version}",
                    self.name
                ))
            })?;
            Ok(snapshot.get(key).cloned())
        })
    }

    fn prune(&self, policy: PruningStrategy) {
        self.db.with_history(&self.name, |history| {
            let latest = history.versions.keys().next_back().copied().unwrap_or(0);
            history.versions.retain(|v, _| policy.should_keep(*v, latest));
            history.hashes.retain(|v, _| policy.should_keep(*v, latest));
        });
    }
}
