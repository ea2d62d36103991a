//! Deterministic wire codec for transactions.
//!
//! Transactions travel as borsh envelopes: each message is stored as a
//! `(type_tag, payload)` pair, and decoding resolves the tag against a
//! registry of user-supplied decoders. Registration is open-world — modules
//! add their message types at startup, before the application seals.
//!
//! Encode → decode → encode is byte-equal by construction: the envelope is
//! rebuilt from the same fields the decoder read.

use crate::{AppError, Fee, Msg, Signature, Tx};
use borsh::{BorshDeserialize, BorshSerialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Decodes one message payload back into a message object.
pub type MsgDecoder = Arc<dyn Fn(&[u8]) -> Result<Arc<dyn Msg>, AppError> + Send + Sync>;

/// Decodes raw transaction bytes. The application core consumes one of
/// these; [`MsgCodec::tx_decoder`] adapts a registry into it.
pub type TxDecoder = Arc<dyn Fn(&[u8]) -> Result<Tx, AppError> + Send + Sync>;

#[derive(BorshSerialize, BorshDeserialize)]
struct MsgEnvelope {
    type_tag: String,
    payload: Vec<u8>,
}

#[derive(BorshSerialize, BorshDeserialize)]
struct TxEnvelope {
    msgs: Vec<MsgEnvelope>,
    fee: Fee,
    signatures: Vec<Signature>,
    memo: String,
}

/// Registry of message decoders keyed by type tag.
#[derive(Default)]
pub struct MsgCodec {
    decoders: HashMap<String, MsgDecoder>,
}

impl MsgCodec {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a decoder for a message type tag.
    ///
    /// # Panics
    ///
    /// Panics on a duplicate tag: double registration is a wiring bug.
    pub fn register(&mut self, type_tag: &str, decoder: MsgDecoder) {
        if self
            .decoders
            .insert(type_tag.to_string(), decoder)
            .is_some()
        {
            panic!("duplicate msg decoder for type tag {type_tag:?}");
        }
    }

    /// Encode a transaction into its wire envelope.
    pub fn encode_tx(&self, tx: &Tx) -> Result<Vec<u8>, AppError> {
        let env = TxEnvelope {
            msgs: tx
                .msgs
                .iter()
                .map(|msg| MsgEnvelope {
                    type_tag: msg.type_tag().to_string(),
                    payload: msg.encode(),
                })
                .collect(),
            fee: tx.fee.clone(),
            signatures: tx.signatures.clone(),
            memo: tx.memo.clone(),
        };
        borsh::to_vec(&env).map_err(|e| AppError::Internal(format!("tx encode: {e}")))
    }

    /// Decode wire bytes into a transaction, resolving every message tag
    /// against the registry.
    pub fn decode_tx(&self, bytes: &[u8]) -> Result<Tx, AppError> {
        let env = TxEnvelope::try_from_slice(bytes)
            .map_err(|e| AppError::TxDecode(format!("malformed tx envelope: {e}")))?;

        let mut msgs: Vec<Arc<dyn Msg>> = Vec::with_capacity(env.msgs.len());
        for msg_env in &env.msgs {
            let decoder = self.decoders.get(&msg_env.type_tag).ok_or_else(|| {
                AppError::TxDecode(format!("unregistered msg type tag {:?}", msg_env.type_tag))
            })?;
            msgs.push(decoder(&msg_env.payload)?);
        }

        Ok(Tx {
            msgs,
            fee: env.fee,
            signatures: env.signatures,
            memo: env.memo,
        })
    }

    /// Adapt this registry into the decoder function the application core
    /// consumes.
    pub fn tx_decoder(self) -> TxDecoder {
        let codec = Arc::new(self);
        Arc::new(move |bytes: &[u8]| codec.decode_tx(bytes))
    }
}
