//! Store identity and commit identifiers.

use crate::Hash;
use borsh::{BorshDeserialize, BorshSerialize};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash as StdHash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;

static NEXT_STORE_KEY_ID: AtomicU64 = AtomicU64::new(1);

/// An opaque, process-unique handle identifying a mounted sub-store.
///
/// Equality is identity: two keys constructed with the same name are
/// distinct, and only a clone of the original handle grants access to the
/// store mounted under it. The name is carried for display and for the
/// `/store/<name>/...` query paths.
///
/// Ordering is `(name, id)` so that traversal of a keyed collection is
/// deterministic across processes that mount the same store names.
#[derive(Clone)]
pub struct StoreKey {
    id: u64,
    name: Arc<str>,
}

impl StoreKey {
    /// Allocate a fresh key with the given display name.
    pub fn new(name: &str) -> Self {
        Self {
            id: NEXT_STORE_KEY_ID.fetch_add(1, AtomicOrdering::Relaxed),
            name: Arc::from(name),
        }
    }

    /// The display name. Not unique; identity lives in the handle itself.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl PartialEq for StoreKey {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for StoreKey {}

impl StdHash for StoreKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl PartialOrd for StoreKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for StoreKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.name
            .cmp(&other.name)
            .then_with(|| self.id.cmp(&other.id))
    }
}

impl fmt::Debug for StoreKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StoreKey({}#{})", self.name, self.id)
    }
}

impl fmt::Display for StoreKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// The `(version, hash)` pair identifying the outcome of committing every
/// mounted store at a given height.
#[derive(Debug, Clone, Copy, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct CommitId {
    /// Committed version. Strictly monotonically increasing per multi-store.
    pub version: i64,
    /// Combined hash over all mounted stores at this version.
    pub hash: Hash,
}

impl CommitId {
    /// The zero commit ID of a freshly initialized, never-committed store.
    pub const ZERO: Self = Self {
        version: 0,
        hash: Hash::ZERO,
    };

    /// Create a commit ID.
    pub fn new(version: i64, hash: Hash) -> Self {
        Self { version, hash }
    }
}

impl Default for CommitId {
    fn default() -> Self {
        Self::ZERO
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_name_is_distinct_key() {
        let a = StoreKey::new("main");
        let b = StoreKey::new("main");
        assert_ne!(a, b);
        assert_eq!(a, a.clone());
        assert_eq!(a.name(), b.name());
    }

    #[test]
    fn ordering_is_by_name_first() {
        let b = StoreKey::new("bravo");
        let a = StoreKey::new("alpha");
        assert!(a < b);
    }

    #[test]
    fn zero_commit_id() {
        let id = CommitId::default();
        assert_eq!(id.version, 0);
        assert!(id.hash.is_zero());
    }
}
