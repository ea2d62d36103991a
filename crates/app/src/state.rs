//! Per-mode execution states.

use crate::context::Context;
use ledgerkit_storage::{CacheMultiStore, CommitMultiStore};
use ledgerkit_types::{BlockHeader, GasPrice};
use std::sync::Arc;

/// Which pipeline a transaction is running through.
///
/// The mode selects the execution state the transaction sandboxes over and
/// whether its writes are committed: check and deliver flush successful
/// transactions into their mode state; simulate always discards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecMode {
    /// Admission check against the check state.
    Check,
    /// Block execution against the deliver state.
    Deliver,
    /// Gas estimation against a throwaway view of the check snapshot.
    Simulate,
}

/// A per-mode snapshot: a cache multi-store over the committed view, plus
/// the context rooted at it.
pub(crate) struct ExecutionState {
    pub ms: Arc<CacheMultiStore>,
    pub ctx: Context,
}

impl ExecutionState {
    /// Branch a fresh state off the multi-store's current committed view.
    pub fn new(
        cms: &CommitMultiStore,
        mode: ExecMode,
        header: BlockHeader,
        chain_id: String,
        min_gas_prices: Arc<Vec<GasPrice>>,
    ) -> Self {
        let ms = Arc::new(cms.cache_multi_store());
        let ctx = Context::new(mode, ms.clone(), header, chain_id, min_gas_prices);
        Self { ms, ctx }
    }
}
