use alloy::primitives::{TxHash, U256};
use std::fmt;

use super::units::format_units;

/// Fixed gas cost of a plain native transfer
pub const NATIVE_TRANSFER_GAS: u64 = 21_000;

/// Result of pushing native balance from the last funded wallet to the next one
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FundingOutcome {
    /// No predecessor (or the predecessor is the successor itself); nothing sent
    Skipped,
    /// The predecessor's balance minus gas was transferred and confirmed
    Transferred { tx_hash: TxHash, amount: U256 },
    /// The predecessor is at or below the minimum, or cannot cover gas.
    /// The rotation has run dry upstream.
    InsufficientPredecessorBalance { balance: U256 },
    /// A read, submission or confirmation failed; worth retrying later
    TransferFailed { reason: String },
}

impl FundingOutcome {
    /// True when the session cannot continue
    pub fn is_hard_stop(&self) -> bool {
        matches!(self, FundingOutcome::InsufficientPredecessorBalance { .. })
    }
}

impl fmt::Display for FundingOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FundingOutcome::Skipped => write!(f, "skipped"),
            FundingOutcome::Transferred { tx_hash, amount } => {
                write!(f, "transferred {} ({})", format_units(*amount), tx_hash)
            }
            FundingOutcome::InsufficientPredecessorBalance { balance } => {
                write!(f, "predecessor balance {} insufficient", format_units(*balance))
            }
            FundingOutcome::TransferFailed { reason } => write!(f, "transfer failed: {}", reason),
        }
    }
}

/// Native amount left after paying for a plain transfer, if any
pub fn transferable_amount(balance: U256, gas_price: u128) -> Option<U256> {
    let gas_cost = U256::from(gas_price).saturating_mul(U256::from(NATIVE_TRANSFER_GAS));
    balance
        .checked_sub(gas_cost)
        .filter(|amount| !amount.is_zero())
}
