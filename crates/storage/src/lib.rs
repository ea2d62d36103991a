//! Storage traits and the multi-store state manager.
//!
//! This crate defines the storage abstraction the application core executes
//! against, along with the cache (overlay) machinery that isolates
//! speculative execution from authoritative state.
//!
//! # Architecture
//!
//! The [`CommitMultiStore`] is the only authoritative mutable state. It owns
//! the mounted backing engines and advances them atomically to a new version
//! on commit. Everything above it is layered overlays:
//!
//! ```text
//! CommitMultiStore (committed version N)
//!      ▲
//! CacheMultiStore (per execution mode: check / deliver)
//!      ▲
//! CacheMultiStore (per transaction, discarded on failure)
//! ```
//!
//! Reads fall through the overlay chain; writes stay in their layer until an
//! explicit `write()` copies them one level down. Nothing reaches a backing
//! engine except through the deliver chain during `Commit`.
//!
//! Backing engines are external collaborators: anything implementing
//! [`CommitKvStore`] (versioned snapshots, atomic per-version commits) can be
//! mounted. The in-memory engine lives in `ledgerkit-storage-memory`.

#![warn(missing_docs)]

mod cache;
mod memo;
mod multi;
mod pruning;
pub mod test_helpers;
mod traits;

pub use cache::CacheKvStore;
pub use memo::MemoCache;
pub use multi::{CacheMultiStore, CommitMultiStore};
pub use pruning::PruningStrategy;
pub use traits::{CommitKvStore, Db, KvPair, KvStore, StoreConstructor};
