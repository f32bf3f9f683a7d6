//! Exact monetary amounts.
//!
//! All amounts are `rust_decimal::Decimal` rescaled to exactly two fractional
//! digits at ingest. Summation stays in decimal arithmetic end to end; an
//! amount never passes through an f64 on its way to or from disk.

use rust_decimal::{Decimal, RoundingStrategy};

use crate::error::LedgerError;

/// Quantize an amount to scale 2, rounding midpoints away from zero.
pub fn quantize(value: Decimal) -> Decimal {
    let mut v = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    v.rescale(2);
    v
}

/// Parse a raw amount string into a quantized decimal.
///
/// Negative amounts are refunds and are accepted; anything that does not
/// parse as a decimal number is a validation error.
pub fn parse_amount(raw: &str) -> Result<Decimal, LedgerError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(LedgerError::Validation("amount is empty".to_string()));
    }
    let value: Decimal = trimmed
        .parse()
        .map_err(|_| LedgerError::Validation(format!("not a valid amount: {:?}", trimmed)))?;
    Ok(quantize(value))
}

/// Exact decimal sum of an amount iterator.
pub fn sum<'a, I: IntoIterator<Item = &'a Decimal>>(amounts: I) -> Decimal {
    let mut total = Decimal::ZERO;
    for a in amounts {
        total += *a;
    }
    quantize(total)
}
