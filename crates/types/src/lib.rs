//! Shared value types for the ledgerkit application core.
//!
//! This crate holds the vocabulary the rest of the workspace speaks:
//! hashes, store identities, commit IDs, gas meters, transactions and
//! messages, error kinds, execution results, and the request/response
//! structs of the consensus-facing lifecycle interface.
//!
//! Everything here is deliberately free of storage and application logic.
//! The storage crates depend on these types for keys and hashing; the app
//! crate depends on them for its entire external surface.

#![warn(missing_docs)]

mod coins;
mod codec;
mod error;
mod gas;
mod hash;
mod requests;
mod result;
mod store;
mod tx;

pub use coins::{parse_gas_prices, Coin, GasPrice};
pub use codec::{MsgCodec, MsgDecoder, TxDecoder};
pub use error::AppError;
pub use gas::{block_gas_limit, Gas, GasMeter, OutOfGasError};
pub use hash::{Hash, HexError};
pub use requests::{
    BlockHeader, BlockParams, ConsensusParams, RequestBeginBlock, RequestCheckTx,
    RequestDeliverTx, RequestEndBlock, RequestInitChain, RequestQuery, ResponseBeginBlock,
    ResponseCommit, ResponseEndBlock, ResponseInfo, ResponseInitChain, ResponseQuery,
    ResponseSetOption,
};
pub use result::{HandlerOutput, TxResult};
pub use store::{CommitId, StoreKey};
pub use tx::{Address, Fee, Msg, Signature, Tx};
