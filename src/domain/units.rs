//! Fixed-point amount helpers
//!
//! Converts between human decimal amounts and 18-decimal on-chain integers,
//! and draws the randomised amounts used by the trade decision engine.

use alloy::primitives::utils::{format_ether, parse_ether};
use alloy::primitives::U256;
use rand::Rng;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::{Decimal, RoundingStrategy};
use thiserror::Error;

/// Decimals of the chain's native fixed-point representation
pub const NATIVE_DECIMALS: u32 = 18;

/// Decimal places kept on randomly drawn amounts
pub const RANDOM_AMOUNT_DP: u32 = 10;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum UnitsError {
    #[error("Negative amount: {0}")]
    Negative(Decimal),
    #[error("Amount not representable: {0}")]
    Unrepresentable(String),
    #[error("Invalid range [{lo}, {hi}]")]
    InvalidRange { lo: Decimal, hi: Decimal },
}

/// Convert a decimal amount to 18-decimal base units, truncating extra precision.
pub fn to_wei(amount: Decimal) -> Result<U256, UnitsError> {
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(UnitsError::Negative(amount));
    }
    let truncated = amount.round_dp_with_strategy(NATIVE_DECIMALS, RoundingStrategy::ToZero);
    parse_ether(&truncated.normalize().to_string())
        .map_err(|e| UnitsError::Unrepresentable(e.to_string()))
}

/// Render 18-decimal base units as a decimal string.
pub fn format_units(value: U256) -> String {
    format_ether(value)
}

/// Draw a value uniformly from `[lo, hi]` and quantize it to
/// [`RANDOM_AMOUNT_DP`] decimal places.
pub fn random_decimal<R: Rng>(
    lo: Decimal,
    hi: Decimal,
    rng: &mut R,
) -> Result<Decimal, UnitsError> {
    if lo > hi || (lo.is_sign_negative() && !lo.is_zero()) {
        return Err(UnitsError::InvalidRange { lo, hi });
    }
    if lo == hi {
        return Ok(lo);
    }

    let lo_f = lo.to_f64().ok_or_else(|| UnitsError::Unrepresentable(lo.to_string()))?;
    let hi_f = hi.to_f64().ok_or_else(|| UnitsError::Unrepresentable(hi.to_string()))?;
    let drawn = rng.gen_range(lo_f..=hi_f);

    let value = Decimal::from_f64(drawn)
        .ok_or_else(|| UnitsError::Unrepresentable(drawn.to_string()))?
        .round_dp(RANDOM_AMOUNT_DP);

    // Float round-trips can land a hair outside the configured bounds
    Ok(value.clamp(lo, hi))
}

/// Draw a random amount in `[lo, hi]` and return it in 18-decimal base units.
pub fn random_wei<R: Rng>(lo: Decimal, hi: Decimal, rng: &mut R) -> Result<U256, UnitsError> {
    to_wei(random_decimal(lo, hi, rng)?)
}
