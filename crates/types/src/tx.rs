//! Transactions and the polymorphic message capability set.

use crate::{AppError, Coin, Gas};
use borsh::{BorshDeserialize, BorshSerialize};
use std::fmt;
use std::sync::Arc;

/// A 20-byte account identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, BorshSerialize, BorshDeserialize)]
pub struct Address(pub [u8; 20]);

impl Address {
    /// Hex rendering of the raw bytes.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// An opaque signature blob. Verification is an injected ante concern; the
/// core only carries the bytes through the wire codec.
#[derive(Debug, Clone, PartialEq, Eq, Default, BorshSerialize, BorshDeserialize)]
pub struct Signature(pub Vec<u8>);

/// The fee a transaction offers: a gas budget and a payment for it.
#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct Fee {
    /// Declared gas budget.
    pub gas_wanted: Gas,
    /// Payment offered for the budget.
    pub gas_fee: Coin,
}

impl Fee {
    /// Create a fee.
    pub fn new(gas_wanted: Gas, gas_fee: Coin) -> Self {
        Self { gas_wanted, gas_fee }
    }
}

impl Default for Fee {
    fn default() -> Self {
        Self {
            gas_wanted: 0,
            gas_fee: Coin::new("ugas", 0),
        }
    }
}

/// The capability set of a routable message.
///
/// Messages are polymorphic over route, type tag, basic validation, sign
/// bytes and signers. Concrete message types are registered with a
/// [`MsgCodec`](crate::MsgCodec) by type tag so third-party modules can add
/// their own at startup (open-world dispatch).
pub trait Msg: Send + Sync + 'static {
    /// Name of the handler responsible for this message.
    fn route(&self) -> &str;

    /// Type tag distinguishing message kinds within a route. Keys the wire
    /// codec's decoder registry.
    fn type_tag(&self) -> &str;

    /// Syntactic self-check run before any state access.
    fn validate_basic(&self) -> Result<(), AppError>;

    /// Canonical bytes covered by the signatures.
    fn sign_bytes(&self) -> Vec<u8>;

    /// Accounts that must have signed this message.
    fn signers(&self) -> Vec<Address> {
        Vec::new()
    }

    /// Wire payload for the codec envelope. Must round-trip byte-exactly
    /// through the decoder registered under [`type_tag`](Self::type_tag).
    fn encode(&self) -> Vec<u8>;

    /// Downcast support for handlers that dispatch on the concrete message
    /// type. Implementations return `self`.
    fn as_any(&self) -> &dyn std::any::Any;
}

/// A transaction: an ordered, non-empty message sequence plus fee,
/// signatures and memo. The core never parses beyond this envelope.
#[derive(Clone)]
pub struct Tx {
    /// Messages, processed in order within the per-tx sandbox.
    pub msgs: Vec<Arc<dyn Msg>>,
    /// Offered fee.
    pub fee: Fee,
    /// Signatures over the sign bytes. Opaque to the core.
    pub signatures: Vec<Signature>,
    /// Free-form memo.
    pub memo: String,
}

impl Tx {
    /// Create a transaction from messages and a fee.
    pub fn new(msgs: Vec<Arc<dyn Msg>>, fee: Fee) -> Self {
        Self {
            msgs,
            fee,
            signatures: Vec::new(),
            memo: String::new(),
        }
    }

    /// Run `validate_basic` on every message, in order, returning the first
    /// failure.
    pub fn validate_basic(&self) -> Result<(), AppError> {
        for msg in &self.msgs {
            msg.validate_basic()?;
        }
        Ok(())
    }
}

impl fmt::Debug for Tx {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let routes: Vec<&str> = self.msgs.iter().map(|m| m.route()).collect();
        f.debug_struct("Tx")
            .field("msgs", &routes)
            .field("fee", &self.fee)
            .field("memo", &self.memo)
            .finish()
    }
}
