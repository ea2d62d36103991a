//! The immutable execution context handed to handlers.

use crate::state::ExecMode;
use ledgerkit_storage::{CacheMultiStore, KvStore};
use ledgerkit_types::{BlockHeader, GasMeter, GasPrice, StoreKey};
use std::sync::Arc;

/// An immutable bundle of everything a handler may consult: the current
/// block header, chain ID, gas meters, minimum gas prices, and store access
/// rooted at the current mode's cache multi-store.
///
/// Contexts are value types updated functionally: every `with_*` method
/// returns a modified copy, and mutating the copy never affects prior
/// holders. Store handles are shared rather than deep-copied — the stores
/// themselves are already encapsulated behind overlay layers.
#[derive(Clone)]
pub struct Context {
    mode: ExecMode,
    ms: Arc<CacheMultiStore>,
    header: BlockHeader,
    chain_id: String,
    gas_meter: Arc<GasMeter>,
    block_gas_meter: Option<Arc<GasMeter>>,
    min_gas_prices: Arc<Vec<GasPrice>>,
}

impl Context {
    pub(crate) fn new(
        mode: ExecMode,
        ms: Arc<CacheMultiStore>,
        header: BlockHeader,
        chain_id: String,
        min_gas_prices: Arc<Vec<GasPrice>>,
    ) -> Self {
        Self {
            mode,
            ms,
            header,
            chain_id,
            gas_meter: Arc::new(GasMeter::infinite()),
            block_gas_meter: None,
            min_gas_prices,
        }
    }

    /// The execution mode this context runs under.
    pub fn mode(&self) -> ExecMode {
        self.mode
    }

    /// The current block header.
    pub fn header(&self) -> &BlockHeader {
        &self.header
    }

    /// The chain identifier captured at `init_chain`.
    pub fn chain_id(&self) -> &str {
        &self.chain_id
    }

    /// The per-transaction gas meter. Unbounded until the ante handler
    /// installs the real one.
    pub fn gas_meter(&self) -> &Arc<GasMeter> {
        &self.gas_meter
    }

    /// The block-scope gas meter.
    ///
    /// # Panics
    ///
    /// Panics outside deliver mode — only the deliver state carries one.
    pub fn block_gas_meter(&self) -> &Arc<GasMeter> {
        self.block_gas_meter
            .as_ref()
            .expect("block gas meter is only available in deliver mode")
    }

    /// The node's minimum gas price vector (CheckTx admission policy).
    pub fn min_gas_prices(&self) -> &[GasPrice] {
        &self.min_gas_prices
    }

    /// The store mounted under `key`, rooted at this context's cache
    /// multi-store.
    pub fn store(&self, key: &StoreKey) -> Arc<dyn KvStore> {
        self.ms.store(key)
    }

    /// A copy rooted at a different cache multi-store.
    pub fn with_multi_store(&self, ms: Arc<CacheMultiStore>) -> Self {
        Self {
            ms,
            ..self.clone()
        }
    }

    /// A copy with a different per-transaction gas meter.
    pub fn with_gas_meter(&self, gas_meter: Arc<GasMeter>) -> Self {
        Self {
            gas_meter,
            ..self.clone()
        }
    }

    /// A copy with the block-scope gas meter installed.
    pub fn with_block_gas_meter(&self, block_gas_meter: Arc<GasMeter>) -> Self {
        Self {
            block_gas_meter: Some(block_gas_meter),
            ..self.clone()
        }
    }

    /// A copy with a different chain ID.
    pub fn with_chain_id(&self, chain_id: &str) -> Self {
        Self {
            chain_id: chain_id.to_string(),
            ..self.clone()
        }
    }

    /// A copy with a different block header.
    pub fn with_header(&self, header: BlockHeader) -> Self {
        Self {
            header,
            ..self.clone()
        }
    }
}
