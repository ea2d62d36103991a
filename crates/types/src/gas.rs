//! Gas metering.
//!
//! Two meters exist per delivered transaction: the per-tx meter installed by
//! the ante handler (finite limit) and the block-scope meter owned by the
//! deliver state (possibly unbounded). Both are the same type; the block
//! variant is constructed with [`GasMeter::infinite`].
//!
//! Exhaustion surfaces as an [`OutOfGasError`] from [`GasMeter::consume`]
//! and is threaded through handler `Result`s to the transaction boundary,
//! where the pipeline converts it into the out-of-gas result.

use std::sync::Mutex;
use thiserror::Error;

/// Abstract resource unit charged by handlers to bound computation.
pub type Gas = u64;

/// Signals that a gas meter's limit was exceeded.
///
/// The descriptor names the charge site and is attached to the resulting
/// transaction log.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("out of gas in {descriptor}")]
pub struct OutOfGasError {
    /// The charge site that pushed the meter past its limit.
    pub descriptor: String,
}

/// Monotonic gas counter with limit enforcement.
///
/// Shared through `Arc` and mutated behind `&self`; all methods use interior
/// mutability. The counter only grows — a failed [`consume`](Self::consume)
/// still records the overage, so the reported figure after an out-of-gas
/// abort is the cumulative amount the transaction attempted to burn.
pub struct GasMeter {
    limit: Option<Gas>,
    consumed: Mutex<Gas>,
}

impl GasMeter {
    /// Create a meter with a finite limit.
    pub fn new(limit: Gas) -> Self {
        Self {
            limit: Some(limit),
            consumed: Mutex::new(0),
        }
    }

    /// Create an unbounded meter. Used for the block scope when the
    /// consensus parameters declare no gas ceiling.
    pub fn infinite() -> Self {
        Self {
            limit: None,
            consumed: Mutex::new(0),
        }
    }

    /// Gas consumed so far, including any overage from a failed consume.
    pub fn consumed(&self) -> Gas {
        *self.consumed.lock().unwrap()
    }

    /// The limit, or `None` when unbounded.
    pub fn limit(&self) -> Option<Gas> {
        self.limit
    }

    /// Gas left before the limit, or `None` when unbounded.
    pub fn remaining(&self) -> Option<Gas> {
        self.limit
            .map(|limit| limit.saturating_sub(self.consumed()))
    }

    /// Add `amount` to the counter, failing if the result exceeds the limit.
    ///
    /// The amount is recorded before the check: after an `Err`, `consumed()`
    /// reports the cumulative figure including the charge that failed.
    pub fn consume(&self, amount: Gas, descriptor: &str) -> Result<(), OutOfGasError> {
        let mut consumed = self.consumed.lock().unwrap();
        *consumed = consumed.saturating_add(amount);
        match self.limit {
            Some(limit) if *consumed > limit => Err(OutOfGasError {
                descriptor: descriptor.to_string(),
            }),
            _ => Ok(()),
        }
    }

    /// Whether consumption has strictly exceeded the limit.
    pub fn is_past_limit(&self) -> bool {
        match self.limit {
            Some(limit) => self.consumed() > limit,
            None => false,
        }
    }

    /// Whether the meter has reached or exceeded its limit.
    pub fn is_out_of_gas(&self) -> bool {
        match self.limit {
            Some(limit) => self.consumed() >= limit,
            None => false,
        }
    }
}

impl std::fmt::Debug for GasMeter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GasMeter")
            .field("limit", &self.limit)
            .field("consumed", &self.consumed())
            .finish()
    }
}

/// Interpret the consensus-parameter block gas field.
///
/// `-1` and `0` both denote an unlimited block; positive values are the hard
/// limit.
///
/// # Panics
///
/// Panics on values below `-1`: a malformed consensus parameter is a
/// process-halting condition.
pub fn block_gas_limit(max_gas: i64) -> Option<Gas> {
    match max_gas {
        -1 | 0 => None,
        g if g > 0 => Some(g as Gas),
        g => panic!("invalid maximum block gas: {g}"),
    }
}
