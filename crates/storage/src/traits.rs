//! Store traits for the application core.
//!
//! [`KvStore`] is the read/write surface handlers see through their context;
//! [`CommitKvStore`] is the contract required of backing engines mounted into
//! the commit multi-store. All methods take `&self` — implementations use
//! interior mutability, which lets stores be shared through `Arc` along the
//! overlay parent chain.

use crate::PruningStrategy;
use ledgerkit_types::{AppError, CommitId, Hash, StoreKey};
use std::sync::Arc;

/// An owned key/value pair yielded by store iterators.
pub type KvPair = (Vec<u8>, Vec<u8>);

/// A byte-keyed store.
///
/// Iterators yield pairs in strict key order over `[start, end)`; `None`
/// bounds are open. A write through the same store invalidates any live
/// iterator — callers must not interleave the two.
pub trait KvStore: Send + Sync {
    /// Read a key. `None` means absent.
    fn get(&self, key: &[u8]) -> Option<Vec<u8>>;

    /// Whether a key is present.
    fn has(&self, key: &[u8]) -> bool {
        self.get(key).is_some()
    }

    /// Write a key.
    fn set(&self, key: &[u8], value: &[u8]);

    /// Remove a key. Removing an absent key is a no-op.
    fn delete(&self, key: &[u8]);

    /// Iterate `[start, end)` in ascending key order.
    fn iterator(
        &self,
        start: Option<&[u8]>,
        end: Option<&[u8]>,
    ) -> Box<dyn Iterator<Item = KvPair> + '_>;

    /// Iterate `[start, end)` in descending key order.
    fn reverse_iterator(
        &self,
        start: Option<&[u8]>,
        end: Option<&[u8]>,
    ) -> Box<dyn Iterator<Item = KvPair> + '_>;
}

/// The contract required of a backing engine behind a mounted store.
///
/// Engines provide versioned snapshots and atomic per-version commits. The
/// commit hash must be a deterministic function of content and version:
/// recommitting identical content at the same version yields the identical
/// hash.
pub trait CommitKvStore: KvStore {
    /// Snapshot current content as `version` and return its hash.
    ///
    /// Committing a version that already exists replaces it; replaying a
    /// block must reproduce the original hash.
    fn commit(&self, version: i64) -> Hash;

    /// Reset working content to the snapshot at `version`.
    ///
    /// Version `0` resets to empty; unknown versions are
    /// [`AppError::InvalidVersion`].
    fn load_version(&self, version: i64) -> Result<(), AppError>;

    /// Highest committed version, `0` if none.
    fn latest_version(&self) -> i64;

    /// Identifier of the most recently committed or loaded version.
    fn last_commit_id(&self) -> CommitId;

    /// Read a key from the snapshot at `version` (`0` = latest committed).
    fn get_at_version(&self, key: &[u8], version: i64) -> Result<Option<Vec<u8>>, AppError>;

    /// Drop historical versions per the retention policy.
    fn prune(&self, policy: PruningStrategy);
}

/// Shared database handle used by the multi-store for its commit metadata.
///
/// Backing engines typically persist into the same database; the constructor
/// closure captures whatever handle the engine needs.
pub trait Db: Send + Sync {
    /// Read a metadata key.
    fn get(&self, key: &[u8]) -> Option<Vec<u8>>;

    /// Write a metadata key.
    fn set(&self, key: &[u8], value: &[u8]);
}

/// Factory producing the backing engine for a store key at mount time.
///
/// The database binding is captured by the closure, so one multi-store can
/// mix engines over different databases.
pub type StoreConstructor = Arc<dyn Fn(&StoreKey) -> Arc<dyn CommitKvStore> + Send + Sync>;
