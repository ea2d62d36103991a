//! Multi-store state management.
//!
//! [`CommitMultiStore`] owns the mounted backing engines and is the only
//! authoritative mutable state in the framework. It is mutated only during
//! `commit()`, which advances every engine to the same new version and
//! produces a combined commit identifier.
//!
//! [`CacheMultiStore`] fans the overlay pattern out across store keys: one
//! [`CacheKvStore`] per mounted key, all layered over the same parent view,
//! flushed together. Nesting a cache multi-store over another yields the
//! per-transaction sandbox.

use crate::cache::CacheKvStore;
use crate::memo::MemoCache;
use crate::pruning::PruningStrategy;
use crate::traits::{CommitKvStore, Db, KvStore, StoreConstructor};
use ledgerkit_types::{AppError, CommitId, Hash, StoreKey};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info};

/// Metadata key holding the latest commit ID.
const LATEST_COMMIT_KEY: &[u8] = b"s/latest";

fn version_commit_key(version: i64) -> Vec<u8> {
    format!("s/{version}").into_bytes()
}

/// A cache store per mounted key, layered over a shared parent view.
///
/// Children are materialized lazily through a typed memo cache; `write`
/// flushes every child that was actually touched. Wrapping a cache
/// multi-store in another gives the per-tx sandbox whose parents are the
/// per-mode caches.
pub struct CacheMultiStore {
    parents: BTreeMap<StoreKey, Arc<dyn KvStore>>,
    children: MemoCache<StoreKey, Arc<CacheKvStore>>,
}

impl CacheMultiStore {
    fn new(parents: BTreeMap<StoreKey, Arc<dyn KvStore>>) -> Self {
        Self {
            parents,
            children: MemoCache::new(),
        }
    }

    fn child(&self, key: &StoreKey) -> Arc<CacheKvStore> {
        let parent = self
            .parents
            .get(key)
            .unwrap_or_else(|| panic!("store {key:?} is not mounted"))
            .clone();
        self.children
            .get_or_load(key, || Arc::new(CacheKvStore::new(parent)))
    }

    /// The cache store mounted under `key`.
    ///
    /// # Panics
    ///
    /// Panics if `key` was never mounted — handlers can only reach stores
    /// they hold a key for, so an unknown key is a wiring bug.
    pub fn store(&self, key: &StoreKey) -> Arc<dyn KvStore> {
        self.child(key)
    }

    /// Flush every materialized child into its parent.
    pub fn write(&self) {
        self.children.for_each(|_, child| child.write());
    }

    /// A fresh cache multi-store whose parents are this one's children.
    pub fn cache_wrap(&self) -> CacheMultiStore {
        let parents = self
            .parents
            .keys()
            .map(|key| {
                let child: Arc<dyn KvStore> = self.child(key);
                (key.clone(), child)
            })
            .collect();
        CacheMultiStore::new(parents)
    }
}

/// Owns the mounted stores and coordinates versioned commits.
///
/// Stores are mounted exactly once, before the first load; loading seals the
/// mount set. Commits advance every engine in key-sorted order and persist
/// the combined `(version, hash)` under dedicated metadata keys in the
/// shared database.
pub struct CommitMultiStore {
    db: Arc<dyn Db>,
    stores: BTreeMap<StoreKey, Arc<dyn CommitKvStore>>,
    pruning: PruningStrategy,
    last_commit_id: CommitId,
    loaded: bool,
}

impl CommitMultiStore {
    /// Create an empty multi-store over the given metadata database.
    pub fn new(db: Arc<dyn Db>) -> Self {
        Self {
            db,
            stores: BTreeMap::new(),
            pruning: PruningStrategy::default(),
            last_commit_id: CommitId::ZERO,
            loaded: false,
        }
    }

    /// Set the retention policy applied to every engine after each commit.
    ///
    /// # Panics
    ///
    /// Panics after the first load: configuration is sealed.
    pub fn set_pruning(&mut self, pruning: PruningStrategy) {
        assert!(!self.loaded, "cannot set pruning after load");
        self.pruning = pruning;
    }

    /// Register a backing engine under `key`.
    ///
    /// # Panics
    ///
    /// Panics after the first load, on a duplicate key, or on a second key
    /// with the same name (names address stores in query paths and persisted
    /// histories, so they must be unique per multi-store).
    pub fn mount(&mut self, key: StoreKey, constructor: &StoreConstructor) {
        assert!(!self.loaded, "cannot mount store {key:?} after load");
        assert!(
            !self.stores.contains_key(&key),
            "store {key:?} is already mounted"
        );
        assert!(
            !self.stores.keys().any(|k| k.name() == key.name()),
            "a store named {:?} is already mounted",
            key.name()
        );
        let engine = constructor(&key);
        self.stores.insert(key, engine);
    }

    /// Load every engine at the highest committed version.
    ///
    /// Every engine must agree with the recorded metadata on what that
    /// version is; a mismatch is [`AppError::InvalidVersion`]. A fresh
    /// multi-store loads at version 0 with the zero commit ID.
    ///
    /// # Panics
    ///
    /// Panics if no stores are mounted.
    pub fn load_latest_version(&mut self) -> Result<(), AppError> {
        assert!(!self.stores.is_empty(), "no stores mounted");
        let recorded = self.read_commit_id(LATEST_COMMIT_KEY).unwrap_or_default();
        for (key, engine) in &self.stores {
            let latest = engine.latest_version();
            if latest != recorded.version {
                return Err(AppError::InvalidVersion(format!(
                    "store {:?} is at version {latest}, recorded latest is {}",
                    key.name(),
                    recorded.version
                )));
            }
        }
        self.load_at(recorded)
    }

    /// Load every engine at a specific version.
    ///
    /// Fails with [`AppError::InvalidVersion`] when `version` is negative,
    /// zero on a non-empty store, or unknown to any engine.
    ///
    /// # Panics
    ///
    /// Panics if no stores are mounted.
    pub fn load_version(&mut self, version: i64) -> Result<(), AppError> {
        if version < 0 {
            return Err(AppError::InvalidVersion(format!(
                "cannot load negative version {version}"
            )));
        }
        if version == 0 {
            if let Some(key) = self.stores.iter().find(|(_, s)| s.latest_version() > 0) {
                return Err(AppError::InvalidVersion(format!(
                    "cannot load version 0: store {:?} has commits",
                    key.0.name()
                )));
            }
            return self.load_at(CommitId::ZERO);
        }
        let recorded = self.read_commit_id(&version_commit_key(version)).ok_or_else(|| {
            AppError::InvalidVersion(format!("no commit metadata for version {version}"))
        })?;
        self.load_at(recorded)
    }

    fn load_at(&mut self, commit_id: CommitId) -> Result<(), AppError> {
        assert!(!self.stores.is_empty(), "no stores mounted");
        if commit_id.version == 0 {
            for (key, engine) in &self.stores {
                if engine.latest_version() != 0 {
                    return Err(AppError::InvalidVersion(format!(
                        "store {:?} has commits but no metadata is recorded",
                        key.name()
                    )));
                }
            }
        } else {
            for (key, engine) in &self.stores {
                engine.load_version(commit_id.version).map_err(|_| {
                    AppError::InvalidVersion(format!(
                        "store {:?} has no version {}",
                        key.name(),
                        commit_id.version
                    ))
                })?;
            }
        }
        self.last_commit_id = commit_id;
        self.loaded = true;
        info!(
            version = commit_id.version,
            hash = %commit_id.hash,
            "loaded multi-store"
        );
        Ok(())
    }

    /// Commit every mounted store at `last_version + 1`.
    ///
    /// Children commit in key-sorted order; the combined hash is computed
    /// over the sorted `(name, hash)` sequence. An engine that fails to
    /// persist panics internally — partial commits are unrecoverable, so the
    /// failure is process-halting by contract.
    pub fn commit(&mut self) -> CommitId {
        let version = self.last_commit_id.version + 1;

        let mut combined = Vec::new();
        for (key, engine) in &self.stores {
            let hash = engine.commit(version);
            let name = key.name().as_bytes();
            combined.extend_from_slice(&(name.len() as u32).to_le_bytes());
            combined.extend_from_slice(name);
            combined.extend_from_slice(hash.as_bytes());
        }
        let commit_id = CommitId::new(version, Hash::from_bytes(&combined));

        let encoded =
            borsh::to_vec(&commit_id).expect("commit id serialization cannot fail");
        self.db.set(LATEST_COMMIT_KEY, &encoded);
        self.db.set(&version_commit_key(version), &encoded);

        for engine in self.stores.values() {
            engine.prune(self.pruning);
        }

        self.last_commit_id = commit_id;
        debug!(version, hash = %commit_id.hash, "committed multi-store");
        commit_id
    }

    /// Identifier of the last committed or loaded version.
    pub fn last_commit_id(&self) -> CommitId {
        self.last_commit_id
    }

    /// The last committed version, `0` if none.
    pub fn latest_version(&self) -> i64 {
        self.last_commit_id.version
    }

    /// A fresh cache multi-store layered over the current committed view.
    pub fn cache_multi_store(&self) -> CacheMultiStore {
        let parents = self
            .stores
            .iter()
            .map(|(key, engine)| {
                let parent: Arc<dyn KvStore> = engine.clone();
                (key.clone(), parent)
            })
            .collect();
        CacheMultiStore::new(parents)
    }

    /// The backing engine mounted under `key`.
    ///
    /// # Panics
    ///
    /// Panics if `key` was never mounted.
    pub fn store(&self, key: &StoreKey) -> Arc<dyn CommitKvStore> {
        self.stores
            .get(key)
            .unwrap_or_else(|| panic!("store {key:?} is not mounted"))
            .clone()
    }

    /// Look up a mounted engine by store name. Used by query dispatch,
    /// where callers address stores by path segment rather than by key.
    pub fn store_by_name(&self, name: &str) -> Option<Arc<dyn CommitKvStore>> {
        self.stores
            .iter()
            .find(|(key, _)| key.name() == name)
            .map(|(_, engine)| engine.clone())
    }

    fn read_commit_id(&self, key: &[u8]) -> Option<CommitId> {
        let bytes = self.db.get(key)?;
        borsh::from_slice(&bytes).ok()
    }
}
