//! Transaction and handler result types.

use crate::{AppError, Gas};
use borsh::{BorshDeserialize, BorshSerialize};

/// Outcome of running one transaction through the pipeline.
///
/// Returned for Check, Deliver and Simulate alike. Gas accounting is
/// preserved on failure: `gas_used` after an out-of-gas abort reports the
/// cumulative amount the transaction attempted to burn.
#[derive(Debug, Clone, PartialEq, Eq, Default, BorshSerialize, BorshDeserialize)]
pub struct TxResult {
    /// The failure, if any. `None` means the transaction succeeded.
    pub error: Option<AppError>,
    /// Concatenated handler payloads.
    pub data: Vec<u8>,
    /// Human-readable log.
    pub log: String,
    /// Gas budget declared for the transaction.
    pub gas_wanted: Gas,
    /// Gas actually consumed.
    pub gas_used: Gas,
}

impl TxResult {
    /// Whether the transaction succeeded.
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    /// Build a failed result, preserving gas accounting.
    pub fn from_error(error: AppError, gas_wanted: Gas, gas_used: Gas) -> Self {
        let log = error.to_string();
        Self {
            error: Some(error),
            data: Vec::new(),
            log,
            gas_wanted,
            gas_used,
        }
    }

    /// Stable numeric code for consensus responses. `0` means OK.
    pub fn code(&self) -> u32 {
        self.error.as_ref().map_or(0, |e| e.code())
    }
}

/// What a message handler returns on success.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HandlerOutput {
    /// Result payload, appended to the transaction's data.
    pub data: Vec<u8>,
    /// Handler log line, appended to the transaction's log.
    pub log: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use borsh::BorshDeserialize;

    #[test]
    fn result_round_trips_through_borsh() {
        let res = TxResult {
            error: Some(AppError::OutOfGas {
                descriptor: "handler".to_string(),
            }),
            data: vec![1, 2, 3],
            log: "boom".to_string(),
            gas_wanted: 10,
            gas_used: 16,
        };
        let bytes = borsh::to_vec(&res).unwrap();
        let back = TxResult::try_from_slice(&bytes).unwrap();
        assert_eq!(res, back);
        assert!(!back.is_ok());
        assert_eq!(back.code(), 4);
    }

    #[test]
    fn default_is_ok() {
        assert!(TxResult::default().is_ok());
        assert_eq!(TxResult::default().code(), 0);
    }
}
