//! Consensus lifecycle request and response types.
//!
//! These mirror the ABCI-style wire contract the consensus engine speaks.
//! The core is agnostic to the on-the-wire encoding; the structs here are
//! the decoded form the lifecycle methods consume and produce.

use crate::{AppError, Hash};

/// The block header delivered by `BeginBlock`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockHeader {
    /// Chain identifier.
    pub chain_id: String,
    /// Block height, starting at 1.
    pub height: i64,
    /// Proposer wall-clock time in unix milliseconds.
    pub time_unix_ms: u64,
}

impl BlockHeader {
    /// Header at a height with everything else defaulted.
    pub fn at_height(height: i64) -> Self {
        Self {
            height,
            ..Default::default()
        }
    }
}

/// Block-scope consensus parameters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BlockParams {
    /// Maximum gas per block. `-1` and `0` mean unlimited; values below
    /// `-1` are malformed and halt the process when read.
    pub max_gas: i64,
}

/// Consensus parameters captured at `InitChain`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConsensusParams {
    /// Block-scope parameters.
    pub block: BlockParams,
}

/// Initialize the chain: chain ID, genesis state, consensus parameters.
#[derive(Debug, Clone, Default)]
pub struct RequestInitChain {
    /// Chain identifier, installed into both check and deliver contexts.
    pub chain_id: String,
    /// Opaque genesis payload handed to the init chainer.
    pub app_state_bytes: Vec<u8>,
    /// Consensus parameters, if the engine provides them.
    pub consensus_params: Option<ConsensusParams>,
}

/// Response to `InitChain`.
#[derive(Debug, Clone, Default)]
pub struct ResponseInitChain {}

/// Begin a block.
#[derive(Debug, Clone, Default)]
pub struct RequestBeginBlock {
    /// Header of the block being executed.
    pub header: BlockHeader,
}

/// Response to `BeginBlock`.
#[derive(Debug, Clone, Default)]
pub struct ResponseBeginBlock {}

/// Admission-check a transaction.
#[derive(Debug, Clone, Default)]
pub struct RequestCheckTx {
    /// Raw transaction bytes.
    pub tx: Vec<u8>,
}

/// Execute a transaction inside the current block.
#[derive(Debug, Clone, Default)]
pub struct RequestDeliverTx {
    /// Raw transaction bytes.
    pub tx: Vec<u8>,
}

/// End the current block.
#[derive(Debug, Clone, Default)]
pub struct RequestEndBlock {
    /// Height of the block being ended.
    pub height: i64,
}

/// Response to `EndBlock`.
#[derive(Debug, Clone, Default)]
pub struct ResponseEndBlock {}

/// Query committed state.
#[derive(Debug, Clone, Default)]
pub struct RequestQuery {
    /// Path of the form `/app/<subcommand>` or `/store/<name>/<subcommand>`.
    pub path: String,
    /// Query payload; for `/store/<name>/key` this is the raw key.
    pub data: Vec<u8>,
    /// Version to read; `0` means latest committed.
    pub height: i64,
}

/// Response to `Query`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseQuery {
    /// `0` on success, else the [`AppError::code`] of the failure.
    pub code: u32,
    /// Log line; the error display on failure.
    pub log: String,
    /// Echo of the queried key, when applicable.
    pub key: Vec<u8>,
    /// Result value. Empty when the key is absent.
    pub value: Vec<u8>,
    /// Version the response was read at.
    pub height: i64,
}

impl ResponseQuery {
    /// Whether the query succeeded.
    pub fn is_ok(&self) -> bool {
        self.code == 0
    }

    /// Successful response carrying a value.
    pub fn ok(value: Vec<u8>, height: i64) -> Self {
        Self {
            value,
            height,
            ..Default::default()
        }
    }

    /// Failed response carrying the error's code and log.
    pub fn from_error(error: AppError) -> Self {
        Self {
            code: error.code(),
            log: error.to_string(),
            ..Default::default()
        }
    }
}

/// Response to `Commit`: the combined hash of the new version.
#[derive(Debug, Clone, Default)]
pub struct ResponseCommit {
    /// Combined multi-store hash at the freshly committed version.
    pub hash: Hash,
}

/// Response to `Info`: the latest committed state of the application.
#[derive(Debug, Clone, Default)]
pub struct ResponseInfo {
    /// Application name.
    pub data: String,
    /// Configured application version.
    pub app_version: String,
    /// Height of the last commit, `0` if none.
    pub last_block_height: i64,
    /// Combined hash of the last commit, zero if none.
    pub last_block_app_hash: Hash,
}

/// Response to `SetOption`.
#[derive(Debug, Clone, Default)]
pub struct ResponseSetOption {
    /// `0` on success.
    pub code: u32,
    /// Outcome description.
    pub log: String,
}
