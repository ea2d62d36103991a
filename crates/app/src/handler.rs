//! User-injected lifecycle and transaction hooks.

use crate::context::Context;
use ledgerkit_types::{
    AppError, Gas, RequestBeginBlock, RequestEndBlock, RequestInitChain, ResponseBeginBlock,
    ResponseEndBlock, ResponseInitChain, Tx,
};
use std::sync::Arc;

/// What the ante handler hands back to the pipeline.
///
/// The ante installs the per-transaction gas meter by returning a derived
/// context in `new_ctx` — and returns it *even when it also returns an
/// error*, so the boundary can report `gas_used` from the meter it
/// installed. Any non-`None` error aborts the transaction.
pub struct AnteOutcome {
    /// Replacement context (gas meter installed), if the ante derived one.
    pub new_ctx: Option<Context>,
    /// Gas budget to report for the transaction.
    pub gas_wanted: Gas,
    /// Failure, if any. Aborts the transaction regardless of other fields.
    pub error: Option<AppError>,
}

impl AnteOutcome {
    /// Successful outcome with the given reported budget.
    pub fn ok(gas_wanted: Gas) -> Self {
        Self {
            new_ctx: None,
            gas_wanted,
            error: None,
        }
    }

    /// Aborting outcome.
    pub fn err(error: AppError) -> Self {
        Self {
            new_ctx: None,
            gas_wanted: 0,
            error: Some(error),
        }
    }

    /// Attach the derived context.
    pub fn with_ctx(mut self, ctx: Context) -> Self {
        self.new_ctx = Some(ctx);
        self
    }

    /// Set the reported gas budget.
    pub fn with_gas_wanted(mut self, gas_wanted: Gas) -> Self {
        self.gas_wanted = gas_wanted;
        self
    }
}

/// Invoked once per transaction before any message handler. Responsible for
/// signature verification, fee deduction, nonce handling and gas-meter
/// installation. The `bool` flag is true when simulating.
pub type AnteHandler = Arc<dyn Fn(&Context, &Tx, bool) -> AnteOutcome + Send + Sync>;

/// Runs against the deliver state during `init_chain`, typically to write
/// genesis state.
pub type InitChainer =
    Arc<dyn Fn(&Context, &RequestInitChain) -> ResponseInitChain + Send + Sync>;

/// Runs against the deliver state at the start of every block.
pub type BeginBlocker =
    Arc<dyn Fn(&Context, &RequestBeginBlock) -> ResponseBeginBlock + Send + Sync>;

/// Runs against the deliver state at the end of every block.
pub type EndBlocker = Arc<dyn Fn(&Context, &RequestEndBlock) -> ResponseEndBlock + Send + Sync>;
