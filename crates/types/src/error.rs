//! Application error kinds surfaced to consensus callers.

use crate::OutOfGasError;
use borsh::{BorshDeserialize, BorshSerialize};
use thiserror::Error;

/// Tagged error kinds surfaced through transaction results and query
/// responses.
///
/// These are the recoverable failures of the transaction pipeline and the
/// multi-store loader. Structural framework violations (double mount,
/// duplicate route, commit failure) are not represented here — they panic.
#[derive(Debug, Clone, PartialEq, Eq, Error, BorshSerialize, BorshDeserialize)]
pub enum AppError {
    /// Transaction bytes could not be deserialized.
    #[error("tx decode error: {0}")]
    TxDecode(String),

    /// Unrouted message, empty transaction, or unknown query path.
    #[error("unknown request: {0}")]
    UnknownRequest(String),

    /// A message failed its basic validation predicate.
    #[error("invalid sequence: {0}")]
    InvalidSequence(String),

    /// The transaction or block gas meter was exhausted.
    #[error("out of gas in {descriptor}")]
    OutOfGas {
        /// The charge site that exhausted the meter.
        descriptor: String,
    },

    /// A handler-signaled failure.
    #[error("internal error: {0}")]
    Internal(String),

    /// The multi-store was asked to load a version it does not have.
    #[error("invalid version: {0}")]
    InvalidVersion(String),
}

impl AppError {
    /// Stable numeric code for consensus responses. `0` is reserved for OK.
    pub fn code(&self) -> u32 {
        match self {
            AppError::TxDecode(_) => 1,
            AppError::UnknownRequest(_) => 2,
            AppError::InvalidSequence(_) => 3,
            AppError::OutOfGas { .. } => 4,
            AppError::Internal(_) => 5,
            AppError::InvalidVersion(_) => 6,
        }
    }
}

impl From<OutOfGasError> for AppError {
    fn from(err: OutOfGasError) -> Self {
        AppError::OutOfGas {
            descriptor: err.descriptor,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_distinct_and_nonzero() {
        let errs = [
            AppError::TxDecode(String::new()),
            AppError::UnknownRequest(String::new()),
            AppError::InvalidSequence(String::new()),
            AppError::OutOfGas {
                descriptor: String::new(),
            },
            AppError::Internal(String::new()),
            AppError::InvalidVersion(String::new()),
        ];
        let mut codes: Vec<u32> = errs.iter().map(|e| e.code()).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), errs.len());
        assert!(!codes.contains(&0));
    }

    #[test]
    fn out_of_gas_conversion_keeps_descriptor() {
        let err: AppError = OutOfGasError {
            descriptor: "ante".to_string(),
        }
        .into();
        assert_eq!(
            err,
            AppError::OutOfGas {
                descriptor: "ante".to_string()
            }
        );
    }
}
