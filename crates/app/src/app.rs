//! The sealed application core: lifecycle state machine and tx pipeline.

use crate::builder::AppConfig;
use crate::context::Context;
use crate::handler::{AnteHandler, BeginBlocker, EndBlocker, InitChainer};
use crate::router::{Handler, Router};
use crate::state::{ExecMode, ExecutionState};
use ledgerkit_storage::{CacheMultiStore, CommitMultiStore};
use ledgerkit_types::{
    block_gas_limit, AppError, BlockHeader, CommitId, ConsensusParams, GasMeter, GasPrice,
    RequestBeginBlock, RequestCheckTx, RequestDeliverTx, RequestEndBlock, RequestInitChain,
    RequestQuery, ResponseBeginBlock, ResponseCommit, ResponseEndBlock, ResponseInfo,
    ResponseInitChain, ResponseQuery, ResponseSetOption, Tx, TxDecoder, TxResult,
};
use std::sync::Arc;
use tracing::{debug, info, instrument, Level};

/// Lifecycle phases after sealing. Consensus drives the transitions; a call
/// arriving in the wrong phase is a fault of the driver and panics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Sealed,
    Initialized,
    InBlock,
    BetweenBlocks,
    Committed,
}

/// The sealed application core.
///
/// Produced by [`AppBuilder`](crate::AppBuilder); configuration is fixed at
/// this point. Consensus calls are serialized by the caller — `&mut self`
/// methods mark the block-structure transitions, while `check_tx`,
/// `deliver_tx` and `query` take `&self` and rely on each state's interior
/// overlay for mutation.
pub struct App {
    name: String,
    app_version: String,
    cms: CommitMultiStore,
    router: Router,
    tx_decoder: TxDecoder,
    ante_handler: Option<AnteHandler>,
    init_chainer: Option<InitChainer>,
    begin_blocker: Option<BeginBlocker>,
    end_blocker: Option<EndBlocker>,
    min_gas_prices: Arc<Vec<GasPrice>>,
    chain_id: String,
    consensus_params: Option<ConsensusParams>,
    phase: Phase,
    check_state: ExecutionState,
    deliver_state: Option<ExecutionState>,
}

impl App {
    pub(crate) fn seal(cms: CommitMultiStore, config: AppConfig) -> Self {
        let check_state = ExecutionState::new(
            &cms,
            ExecMode::Check,
            BlockHeader::default(),
            String::new(),
            config.min_gas_prices.clone(),
        );
        info!(
            name = %config.name,
            version = cms.last_commit_id().version,
            "application sealed"
        );
        Self {
            name: config.name,
            app_version: config.app_version,
            cms,
            router: config.router,
            tx_decoder: config.tx_decoder,
            ante_handler: config.ante_handler,
            init_chainer: config.init_chainer,
            begin_blocker: config.begin_blocker,
            end_blocker: config.end_blocker,
            min_gas_prices: config.min_gas_prices,
            chain_id: String::new(),
            consensus_params: None,
            phase: Phase::Sealed,
            check_state,
            deliver_state: None,
        }
    }

    /// The configured application name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The configured application version string.
    pub fn app_version(&self) -> &str {
        &self.app_version
    }

    /// Height of the last committed block, `0` if none.
    pub fn last_block_height(&self) -> i64 {
        self.cms.last_commit_id().version
    }

    /// Commit identifier of the last committed version.
    pub fn last_commit_id(&self) -> CommitId {
        self.cms.last_commit_id()
    }

    /// The check state's context. Reflects writes of every admission check
    /// since the last commit.
    pub fn check_context(&self) -> &Context {
        &self.check_state.ctx
    }

    /// The deliver state's context, present from `init_chain`/`begin_block`
    /// until `commit`.
    pub fn deliver_context(&self) -> Option<&Context> {
        self.deliver_state.as_ref().map(|state| &state.ctx)
    }

    pub(crate) fn commit_multi_store(&self) -> &CommitMultiStore {
        &self.cms
    }

    /// Forward a `/custom/<route>/...` query to the handler registered
    /// under `route`, with a throwaway context over the committed view.
    pub(crate) fn query_custom(&self, route: &str, req: &RequestQuery) -> ResponseQuery {
        let Some(handler) = self.router.route(route) else {
            return ResponseQuery::from_error(AppError::UnknownRequest(format!(
                "no route {route:?}"
            )));
        };
        let ctx = Context::new(
            ExecMode::Check,
            Arc::new(self.cms.cache_multi_store()),
            self.check_state.ctx.header().clone(),
            self.chain_id.clone(),
            self.min_gas_prices.clone(),
        );
        handler.query(&ctx, req)
    }

    fn decode_tx(&self, bytes: &[u8]) -> Result<Tx, AppError> {
        (self.tx_decoder)(bytes)
    }

    /// Report the latest committed state.
    pub fn info(&self) -> ResponseInfo {
        let last = self.cms.last_commit_id();
        ResponseInfo {
            data: self.name.clone(),
            app_version: self.app_version.clone(),
            last_block_height: last.version,
            last_block_app_hash: last.hash,
        }
    }

    /// Apply a runtime option. No keys are currently recognized.
    pub fn set_option(&mut self, key: &str, _value: &str) -> ResponseSetOption {
        ResponseSetOption {
            code: AppError::UnknownRequest(String::new()).code(),
            log: format!("unknown option key {key:?}"),
        }
    }

    /// Initialize the chain. Runs once, before any block.
    ///
    /// Captures the consensus parameters, installs the chain ID into both
    /// the check and deliver contexts, and runs the init chainer against the
    /// deliver state. The deliver state is kept so genesis writes reach the
    /// first commit.
    ///
    /// # Panics
    ///
    /// Panics when called twice or after a block has begun.
    pub fn init_chain(&mut self, req: RequestInitChain) -> ResponseInitChain {
        assert!(
            self.phase == Phase::Sealed,
            "init_chain must run once, before any block"
        );
        if let Some(params) = req.consensus_params {
            self.consensus_params = Some(params);
        }
        self.chain_id = req.chain_id.clone();
        self.check_state.ctx = self.check_state.ctx.with_chain_id(&req.chain_id);

        let header = BlockHeader {
            chain_id: req.chain_id.clone(),
            ..Default::default()
        };
        let state = ExecutionState::new(
            &self.cms,
            ExecMode::Deliver,
            header,
            req.chain_id.clone(),
            self.min_gas_prices.clone(),
        );
        if let Some(init_chainer) = &self.init_chainer {
            init_chainer(&state.ctx, &req);
        }
        self.deliver_state = Some(state);
        self.phase = Phase::Initialized;
        info!(chain_id = %req.chain_id, "chain initialized");
        ResponseInitChain::default()
    }

    /// Begin a block: reset the deliver state over the committed view,
    /// install the block gas meter, store the header.
    ///
    /// The deliver state left behind by `init_chain` is reused (header
    /// updated) so genesis writes survive into the first block.
    ///
    /// # Panics
    ///
    /// Panics while a block is already open.
    pub fn begin_block(&mut self, req: RequestBeginBlock) -> ResponseBeginBlock {
        assert!(
            self.phase != Phase::InBlock,
            "begin_block while a block is open"
        );
        let chain_id = if req.header.chain_id.is_empty() {
            self.chain_id.clone()
        } else {
            req.header.chain_id.clone()
        };

        match &mut self.deliver_state {
            None => {
                self.deliver_state = Some(ExecutionState::new(
                    &self.cms,
                    ExecMode::Deliver,
                    req.header.clone(),
                    chain_id,
                    self.min_gas_prices.clone(),
                ));
            }
            Some(state) => {
                state.ctx = state.ctx.with_header(req.header.clone());
            }
        }

        let block_meter = Arc::new(match self.max_block_gas() {
            Some(limit) => GasMeter::new(limit),
            None => GasMeter::infinite(),
        });
        let state = self.deliver_state.as_mut().expect("deliver state just set");
        state.ctx = state.ctx.with_block_gas_meter(block_meter);

        if let Some(begin_blocker) = &self.begin_blocker {
            begin_blocker(&state.ctx, &req);
        }
        debug!(height = req.header.height, "begin block");
        self.phase = Phase::InBlock;
        ResponseBeginBlock::default()
    }

    /// Admission-check raw transaction bytes.
    pub fn check_tx(&self, req: RequestCheckTx) -> TxResult {
        match self.decode_tx(&req.tx) {
            Ok(tx) => self.check(tx),
            Err(error) => TxResult::from_error(error, 0, 0),
        }
    }

    /// Admission-check a decoded transaction.
    pub fn check(&self, tx: Tx) -> TxResult {
        self.run_tx(ExecMode::Check, tx)
    }

    /// Execute raw transaction bytes inside the open block.
    pub fn deliver_tx(&self, req: RequestDeliverTx) -> TxResult {
        match self.decode_tx(&req.tx) {
            Ok(tx) => self.deliver(tx),
            Err(error) => TxResult::from_error(error, 0, 0),
        }
    }

    /// Execute a decoded transaction inside the open block.
    ///
    /// # Panics
    ///
    /// Panics outside an open block.
    pub fn deliver(&self, tx: Tx) -> TxResult {
        assert!(
            self.phase == Phase::InBlock,
            "deliver_tx requires an open block"
        );
        self.run_tx(ExecMode::Deliver, tx)
    }

    /// Run a transaction through the pipeline without persisting anything.
    ///
    /// Derived from the check snapshot; calling it twice returns identical
    /// results.
    pub fn simulate(&self, tx_bytes: &[u8]) -> TxResult {
        match self.decode_tx(tx_bytes) {
            Ok(tx) => self.run_tx(ExecMode::Simulate, tx),
            Err(error) => TxResult::from_error(error, 0, 0),
        }
    }

    /// End the open block, running the end blocker against the deliver
    /// state.
    ///
    /// # Panics
    ///
    /// Panics outside an open block.
    pub fn end_block(&mut self, req: RequestEndBlock) -> ResponseEndBlock {
        assert!(self.phase == Phase::InBlock, "end_block requires an open block");
        if let (Some(end_blocker), Some(state)) = (&self.end_blocker, &self.deliver_state) {
            end_blocker(&state.ctx, &req);
        }
        self.phase = Phase::BetweenBlocks;
        ResponseEndBlock::default()
    }

    /// Commit the block: flush the deliver state through to the multi-store,
    /// advance the version, and reset the check state over the new committed
    /// view.
    ///
    /// # Panics
    ///
    /// Panics before any chain activity (nothing to commit), and if a
    /// backing engine fails to persist (partial commits are unrecoverable).
    #[instrument(level = Level::INFO, skip_all, fields(height = tracing::field::Empty))]
    pub fn commit(&mut self) -> ResponseCommit {
        assert!(
            self.phase != Phase::Sealed,
            "commit before init_chain or begin_block"
        );
        let header = self
            .deliver_state
            .as_ref()
            .map(|state| state.ctx.header().clone())
            .unwrap_or_else(|| self.check_state.ctx.header().clone());

        if let Some(state) = self.deliver_state.take() {
            state.ms.write();
        }
        let commit_id = self.cms.commit();
        tracing::Span::current().record("height", commit_id.version);
        info!(hash = %commit_id.hash, "block committed");

        self.check_state = ExecutionState::new(
            &self.cms,
            ExecMode::Check,
            header,
            self.chain_id.clone(),
            self.min_gas_prices.clone(),
        );
        self.phase = Phase::Committed;
        ResponseCommit {
            hash: commit_id.hash,
        }
    }

    /// The configured block gas ceiling, `None` when unlimited.
    ///
    /// # Panics
    ///
    /// Panics on a malformed (below `-1`) consensus parameter.
    fn max_block_gas(&self) -> Option<u64> {
        let max_gas = self
            .consensus_params
            .map(|params| params.block.max_gas)
            .unwrap_or(0);
        block_gas_limit(max_gas)
    }

    fn state_for(&self, mode: ExecMode) -> &ExecutionState {
        match mode {
            ExecMode::Deliver => self
                .deliver_state
                .as_ref()
                .expect("deliver state exists inside a block"),
            ExecMode::Check | ExecMode::Simulate => &self.check_state,
        }
    }

    /// The shared transaction pipeline.
    ///
    /// Sandbox, ante, message handlers, block-gas accounting, then a single
    /// cache flush on success. Failures at any stage discard the per-tx
    /// cache — ante and handler writes live and die together.
    #[instrument(level = Level::DEBUG, skip_all, fields(mode = ?mode, msgs = tx.msgs.len()))]
    fn run_tx(&self, mode: ExecMode, tx: Tx) -> TxResult {
        let state = self.state_for(mode);
        let block_meter = match mode {
            ExecMode::Deliver => Some(state.ctx.block_gas_meter().clone()),
            _ => None,
        };

        // A block meter already past its limit poisons the rest of the
        // block: every subsequent deliver fails before touching state.
        if let Some(meter) = &block_meter {
            if meter.is_past_limit() {
                return TxResult::from_error(
                    AppError::OutOfGas {
                        descriptor: "block gas meter".to_string(),
                    },
                    0,
                    0,
                );
            }
        }

        if tx.msgs.is_empty() {
            return TxResult::from_error(
                AppError::UnknownRequest("transaction contains no messages".to_string()),
                0,
                0,
            );
        }
        if let Err(error) = tx.validate_basic() {
            return TxResult::from_error(error, 0, 0);
        }
        for msg in &tx.msgs {
            if self.router.route(msg.route()).is_none() {
                return TxResult::from_error(
                    AppError::UnknownRequest(format!(
                        "unrecognized message route {:?}",
                        msg.route()
                    )),
                    0,
                    0,
                );
            }
        }

        let tx_cache = Arc::new(state.ms.cache_wrap());
        let result = self.execute_tx(&state.ctx, tx_cache.clone(), &tx, mode);

        // Block gas is charged for every deliver attempt, success or not;
        // overflowing the block budget fails the tx and discards its writes.
        if let Some(meter) = &block_meter {
            if meter.consume(result.gas_used, "block gas meter").is_err() {
                return TxResult::from_error(
                    AppError::OutOfGas {
                        descriptor: "block gas meter".to_string(),
                    },
                    result.gas_wanted,
                    result.gas_used,
                );
            }
        }

        if result.is_ok() && mode != ExecMode::Simulate {
            tx_cache.write();
        }
        result
    }

    /// Ante plus message handlers inside an established sandbox. Never
    /// flushes the cache — the caller decides that.
    fn execute_tx(
        &self,
        base_ctx: &Context,
        tx_cache: Arc<CacheMultiStore>,
        tx: &Tx,
        mode: ExecMode,
    ) -> TxResult {
        let mut ctx = base_ctx.with_multi_store(tx_cache);
        let mut gas_wanted = tx.fee.gas_wanted;

        if let Some(ante) = &self.ante_handler {
            let outcome = ante(&ctx, tx, mode == ExecMode::Simulate);
            if let Some(new_ctx) = outcome.new_ctx {
                ctx = new_ctx;
            }
            gas_wanted = outcome.gas_wanted;
            if let Some(error) = outcome.error {
                return TxResult::from_error(error, gas_wanted, ctx.gas_meter().consumed());
            }
        }

        let mut data = Vec::new();
        let mut logs = Vec::new();
        for (index, msg) in tx.msgs.iter().enumerate() {
            let handler = self
                .router
                .route(msg.route())
                .expect("routes are checked before execution");
            match handler.process(&ctx, msg.as_ref()) {
                Ok(output) => {
                    data.extend_from_slice(&output.data);
                    if !output.log.is_empty() {
                        logs.push(format!("msg {index}: {}", output.log));
                    }
                }
                Err(error) => {
                    return TxResult::from_error(error, gas_wanted, ctx.gas_meter().consumed());
                }
            }
        }

        TxResult {
            error: None,
            data,
            log: logs.join("\n"),
            gas_wanted,
            gas_used: ctx.gas_meter().consumed(),
        }
    }
}
