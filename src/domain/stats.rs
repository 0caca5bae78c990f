//! Statistics Reducer
//!
//! Folds per-address balances into holder counts and totals.

use alloy::primitives::U256;
use std::fmt;

use super::units::format_units;

/// Counts and sums over one aggregated address list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BalanceTally {
    /// Addresses holding a non-zero token balance
    pub holders: usize,
    /// Addresses with zero token balance
    pub empty: usize,
    pub total_token: U256,
    pub total_native: U256,
    /// True if a sum hit U256::MAX and was clamped
    pub saturated: bool,
}

/// Single pass over positionally aligned token and native balances.
///
/// A missing native entry counts as zero. Sums saturate instead of wrapping.
pub fn reduce(token_balances: &[U256], native_balances: &[U256]) -> BalanceTally {
    let mut tally = BalanceTally::default();

    for (i, token) in token_balances.iter().enumerate() {
        if token.is_zero() {
            tally.empty += 1;
        } else {
            tally.holders += 1;
        }

        let native = native_balances.get(i).copied().unwrap_or(U256::ZERO);
        tally.total_token = checked_add(tally.total_token, *token, &mut tally.saturated);
        tally.total_native = checked_add(tally.total_native, native, &mut tally.saturated);
    }

    tally
}

fn checked_add(acc: U256, value: U256, saturated: &mut bool) -> U256 {
    match acc.checked_add(value) {
        Some(sum) => sum,
        None => {
            *saturated = true;
            U256::MAX
        }
    }
}

/// Final statistics report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatsReport {
    pub token_symbol: String,
    pub quote_symbol: String,
    pub tally: BalanceTally,
    /// Token total priced in the quote currency
    pub token_value: U256,
}

impl StatsReport {
    /// Token value plus native holdings, in quote units
    pub fn total_value(&self) -> U256 {
        self.token_value.saturating_add(self.tally.total_native)
    }

    pub fn address_count(&self) -> usize {
        self.tally.holders + self.tally.empty
    }
}

impl fmt::Display for StatsReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let token = &self.token_symbol;
        let quote = &self.quote_symbol;
        writeln!(f, "Statistics ({} addresses):", self.address_count())?;
        writeln!(f, "- Addresses holding {}: {}", token, self.tally.holders)?;
        writeln!(f, "- Addresses without {}: {}", token, self.tally.empty)?;
        writeln!(f, "- Total {} balance: {}", quote, format_units(self.tally.total_native))?;
        writeln!(f, "- Total {} balance: {}", token, format_units(self.tally.total_token))?;
        writeln!(f, "- Total {} value: {} {}", token, format_units(self.token_value), quote)?;
        write!(f, "- Total value: {} {}", format_units(self.total_value()), quote)?;
        if self.tally.saturated {
            write!(f, "\n  (totals saturated at the uint256 maximum)")?;
        }
        Ok(())
    }
}
