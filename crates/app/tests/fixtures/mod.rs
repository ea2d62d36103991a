//! Shared fixtures for application integration tests.
//!
//! Counter messages and handlers: the ante reads a counter from the tx memo
//! and increments a store key; handlers do the same per message. The
//! equality assertion between the tx counter and the stored counter is a
//! test fixture, not a framework contract — it proves writes persist in the
//! order the tests expect.

#![allow(dead_code)]

use borsh::{BorshDeserialize, BorshSerialize};
use ledgerkit_app::{AnteHandler, AnteOutcome, App, AppBuilder, Context, Handler};
use ledgerkit_storage::KvStore;
use ledgerkit_storage_memory::{MemDb, MemStore};
use ledgerkit_types::{
    AppError, Fee, Gas, GasMeter, HandlerOutput, Msg, MsgCodec, StoreKey, Tx, TxDecoder,
};
use std::sync::Arc;

/// Route handled by [`MsgCounter`].
pub const COUNTER_ROUTE: &str = "msgcounter";
/// Route handled by [`MsgCounter2`].
pub const COUNTER2_ROUTE: &str = "msgcounter2";

/// A counter message. `validate_basic` fails on negative counters;
/// everything else is up to the handlers.
#[derive(Debug, Clone, BorshSerialize, BorshDeserialize)]
pub struct MsgCounter {
    pub counter: i64,
    pub fail_on_handler: bool,
}

impl Msg for MsgCounter {
    fn route(&self) -> &str {
        COUNTER_ROUTE
    }
    fn type_tag(&self) -> &str {
        "counter1"
    }
    fn validate_basic(&self) -> Result<(), AppError> {
        if self.counter >= 0 {
            Ok(())
        } else {
            Err(AppError::InvalidSequence(
                "counter should be a non-negative integer".to_string(),
            ))
        }
    }
    fn sign_bytes(&self) -> Vec<u8> {
        self.encode()
    }
    fn encode(&self) -> Vec<u8> {
        borsh::to_vec(self).unwrap()
    }
    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

/// A second counter message on its own route.
#[derive(Debug, Clone, BorshSerialize, BorshDeserialize)]
pub struct MsgCounter2 {
    pub counter: i64,
}

impl Msg for MsgCounter2 {
    fn route(&self) -> &str {
        COUNTER2_ROUTE
    }
    fn type_tag(&self) -> &str {
        "counter2"
    }
    fn validate_basic(&self) -> Result<(), AppError> {
        if self.counter >= 0 {
            Ok(())
        } else {
            Err(AppError::InvalidSequence(
                "counter should be a non-negative integer".to_string(),
            ))
        }
    }
    fn sign_bytes(&self) -> Vec<u8> {
        self.encode()
    }
    fn encode(&self) -> Vec<u8> {
        borsh::to_vec(self).unwrap()
    }
    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

/// A message whose route is never registered.
#[derive(Debug, Clone, BorshSerialize, BorshDeserialize)]
pub struct MsgNoRoute;

impl Msg for MsgNoRoute {
    fn route(&self) -> &str {
        "noroute"
    }
    fn type_tag(&self) -> &str {
        "noroute"
    }
    fn validate_basic(&self) -> Result<(), AppError> {
        Ok(())
    }
    fn sign_bytes(&self) -> Vec<u8> {
        Vec::new()
    }
    fn encode(&self) -> Vec<u8> {
        Vec::new()
    }
    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

/// Codec with every fixture message type registered.
pub fn test_codec() -> MsgCodec {
    let mut codec = MsgCodec::new();
    codec.register(
        "counter1",
        Arc::new(|bytes| {
            let msg = MsgCounter::try_from_slice(bytes)
                .map_err(|e| AppError::TxDecode(e.to_string()))?;
            let msg: Arc<dyn Msg> = Arc::new(msg);
            Ok(msg)
        }),
    );
    codec.register(
        "counter2",
        Arc::new(|bytes| {
            let msg = MsgCounter2::try_from_slice(bytes)
                .map_err(|e| AppError::TxDecode(e.to_string()))?;
            let msg: Arc<dyn Msg> = Arc::new(msg);
            Ok(msg)
        }),
    );
    codec
}

/// Decoder over [`test_codec`].
pub fn tx_decoder() -> TxDecoder {
    test_codec().tx_decoder()
}

/// Encode a tx with the fixture codec.
pub fn encode_tx(tx: &Tx) -> Vec<u8> {
    test_codec().encode_tx(tx).unwrap()
}

/// Pack the tx-scope counter and the fail-on-ante flag into the memo.
pub fn encode_memo(counter: i64, fail_on_ante: bool) -> String {
    format!("{counter}|{}", u8::from(fail_on_ante))
}

/// Unpack [`encode_memo`].
pub fn decode_memo(memo: &str) -> (i64, bool) {
    let (counter, fail) = memo.split_once('|').expect("fixture memo format");
    (counter.parse().unwrap(), fail == "1")
}

/// A tx with the given tx-scope counter and one [`MsgCounter`] per entry.
pub fn counter_tx(counter: i64, msg_counters: &[i64]) -> Tx {
    let msgs = msg_counters
        .iter()
        .map(|c| {
            let msg: Arc<dyn Msg> = Arc::new(MsgCounter {
                counter: *c,
                fail_on_handler: false,
            });
            msg
        })
        .collect();
    let mut tx = Tx::new(msgs, Fee::default());
    tx.memo = encode_memo(counter, false);
    tx
}

/// Flip the fail-on-ante flag in the memo.
pub fn set_fail_on_ante(tx: &mut Tx) {
    let (counter, _) = decode_memo(&tx.memo);
    tx.memo = encode_memo(counter, true);
}

/// Rebuild every [`MsgCounter`] with the fail-on-handler flag set.
pub fn set_fail_on_handler(tx: &mut Tx) {
    tx.msgs = tx
        .msgs
        .iter()
        .map(|msg| {
            let counter = msg
                .as_any()
                .downcast_ref::<MsgCounter>()
                .expect("fixture tx contains only MsgCounter")
                .counter;
            let msg: Arc<dyn Msg> = Arc::new(MsgCounter {
                counter,
                fail_on_handler: true,
            });
            msg
        })
        .collect();
}

/// Read an i64 from a store key, 0 if absent.
pub fn get_int(store: &dyn KvStore, key: &[u8]) -> i64 {
    match store.get(key) {
        Some(bytes) => i64::from_le_bytes(bytes.try_into().expect("fixture counter encoding")),
        None => 0,
    }
}

/// Write an i64 to a store key.
pub fn set_int(store: &dyn KvStore, key: &[u8], value: i64) {
    store.set(key, &value.to_le_bytes());
}

/// Check the stored counter matches, then increment it.
pub fn incrementing_counter(store: &dyn KvStore, key: &[u8], counter: i64) {
    let stored = get_int(store, key);
    assert_eq!(stored, counter, "stored counter must match the tx counter");
    set_int(store, key, counter + 1);
}

/// Ante that runs [`incrementing_counter`] against `counter_key` with the
/// memo's tx counter, honoring the fail-on-ante flag.
pub fn counter_ante(key: StoreKey, counter_key: &'static [u8]) -> AnteHandler {
    Arc::new(move |ctx: &Context, tx: &Tx, _simulate: bool| {
        let (counter, fail) = decode_memo(&tx.memo);
        if fail {
            return AnteOutcome::err(AppError::Internal("ante handler failure".to_string()));
        }
        let store = ctx.store(&key);
        incrementing_counter(&*store, counter_key, counter);
        AnteOutcome::ok(tx.fee.gas_wanted)
    })
}

/// Ante that installs a finite per-tx gas meter and burns the memo counter
/// against it. Returns the derived context even when the charge fails, so
/// the pipeline reports the cumulative gas figure.
pub fn gas_metered_ante(gas_granted: Gas) -> AnteHandler {
    Arc::new(move |ctx: &Context, tx: &Tx, _simulate: bool| {
        let meter = Arc::new(GasMeter::new(gas_granted));
        let new_ctx = ctx.with_gas_meter(meter.clone());
        let (counter, fail) = decode_memo(&tx.memo);
        if let Err(err) = meter.consume(counter as Gas, "counter-ante") {
            return AnteOutcome::err(err.into())
                .with_ctx(new_ctx)
                .with_gas_wanted(gas_granted);
        }
        if fail {
            return AnteOutcome::err(AppError::Internal("ante handler failure".to_string()))
                .with_ctx(new_ctx)
                .with_gas_wanted(gas_granted);
        }
        AnteOutcome::ok(gas_granted).with_ctx(new_ctx)
    })
}

/// Handler running [`incrementing_counter`] for both counter message types.
pub struct CounterHandler {
    pub key: StoreKey,
    pub counter_key: &'static [u8],
}

impl Handler for CounterHandler {
    fn process(&self, ctx: &Context, msg: &dyn Msg) -> Result<HandlerOutput, AppError> {
        let count = if let Some(msg) = msg.as_any().downcast_ref::<MsgCounter>() {
            if msg.fail_on_handler {
                return Err(AppError::Internal("message handler failure".to_string()));
            }
            msg.counter
        } else if let Some(msg) = msg.as_any().downcast_ref::<MsgCounter2>() {
            msg.counter
        } else {
            return Err(AppError::Internal("unexpected message type".to_string()));
        };
        let store = ctx.store(&self.key);
        incrementing_counter(&*store, self.counter_key, count);
        Ok(HandlerOutput::default())
    }
}

/// Handler that burns the message counter on the per-tx gas meter.
pub struct GasHandler;

impl Handler for GasHandler {
    fn process(&self, ctx: &Context, msg: &dyn Msg) -> Result<HandlerOutput, AppError> {
        let count = msg
            .as_any()
            .downcast_ref::<MsgCounter>()
            .map(|m| m.counter)
            .unwrap_or_default();
        ctx.gas_meter().consume(count as Gas, "counter-handler")?;
        Ok(HandlerOutput::default())
    }
}

/// Handler that accepts everything and does nothing.
pub struct NoopHandler;

impl Handler for NoopHandler {
    fn process(&self, _ctx: &Context, _msg: &dyn Msg) -> Result<HandlerOutput, AppError> {
        Ok(HandlerOutput::default())
    }
}

/// Standard single-store app: fixture decoder installed, `key` mounted over
/// `db`, with extra configuration applied by `configure`.
pub fn setup_app(
    db: &MemDb,
    key: &StoreKey,
    configure: impl FnOnce(AppBuilder) -> AppBuilder,
) -> App {
    let builder = AppBuilder::new("test-app", Arc::new(db.clone()))
        .with_tx_decoder(tx_decoder())
        .mount_store(key.clone(), MemStore::constructor(db.clone()));
    configure(builder).load_latest_version().unwrap()
}
