//! # In-Memory Storage
//!
//! In-memory backing engine for tests and deterministic simulation.
//!
//! Uses `im::OrdMap` for O(1) structural-sharing clones, so committing a
//! version snapshots the working state without copying the dataset. The
//! database handle ([`MemDb`]) is shared and survives application restarts
//! within a process, which is what the load-commit-reload scenarios need.

mod storage;

pub use storage::{MemDb, MemStore};
