//! Coin amounts and minimum gas prices.

use crate::{AppError, Gas};
use borsh::{BorshDeserialize, BorshSerialize};
use std::fmt;

/// An amount of a single denomination.
#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct Coin {
    /// Denomination, lowercase ASCII letters only.
    pub denom: String,
    /// Amount in the denomination's base unit.
    pub amount: u64,
}

impl Coin {
    /// Create a coin.
    pub fn new(denom: &str, amount: u64) -> Self {
        Self {
            denom: denom.to_string(),
            amount,
        }
    }
}

impl fmt::Display for Coin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.amount, self.denom)
    }
}

/// A fee rate: `price` of some denomination buys `gas` units of gas.
///
/// Used as the CheckTx admission filter: a node configured with a minimum
/// gas price vector refuses transactions whose fee rate falls below it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GasPrice {
    /// Gas units bought.
    pub gas: Gas,
    /// Price paid for them.
    pub price: Coin,
}

impl fmt::Display for GasPrice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}gas", self.price, self.gas)
    }
}

/// Parse a comma-separated minimum gas price vector, e.g.
/// `"5000stake/10gas,0.1photon/1gas"` without the fractional part —
/// amounts are integral base units: `"5000stake/10gas"`.
pub fn parse_gas_prices(input: &str) -> Result<Vec<GasPrice>, AppError> {
    input
        .split(',')
        .filter(|part| !part.is_empty())
        .map(parse_gas_price)
        .collect()
}

fn parse_gas_price(part: &str) -> Result<GasPrice, AppError> {
    let invalid = || AppError::Internal(format!("invalid gas price: {part:?}"));

    let (price_str, gas_str) = part.split_once('/').ok_or_else(invalid)?;
    let price = parse_coin(price_str).ok_or_else(invalid)?;
    let gas_digits = gas_str.strip_suffix("gas").ok_or_else(invalid)?;
    let gas: Gas = gas_digits.parse().map_err(|_| invalid())?;
    if gas == 0 {
        return Err(invalid());
    }
    Ok(GasPrice { gas, price })
}

fn parse_coin(s: &str) -> Option<Coin> {
    let split = s.find(|c: char| !c.is_ascii_digit())?;
    let amount: u64 = s[..split].parse().ok()?;
    let denom = &s[split..];
    if denom.is_empty() || !denom.chars().all(|c| c.is_ascii_lowercase()) {
        return None;
    }
    Some(Coin::new(denom, amount))
}
