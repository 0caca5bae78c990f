use alloy::primitives::{Address, U256};
use std::fmt;

use super::units::format_units;

/// Balances of one wallet, read fresh every orchestrator iteration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WalletBalanceSnapshot {
    pub native: U256,
    pub token: U256,
}

impl WalletBalanceSnapshot {
    pub fn new(native: U256, token: U256) -> Self {
        Self { native, token }
    }
}

impl fmt::Display for WalletBalanceSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "native {} / token {}",
            format_units(self.native),
            format_units(self.token)
        )
    }
}

/// Why a single batch entry could not be read
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeFailure {
    /// The whole aggregate call for the chunk failed
    ChunkFailed(String),
    /// The call returned no data (`0x`)
    EmptyReturn,
    /// The aggregate returned fewer results than calls submitted
    MissingResult,
    /// The return data did not decode as uint256
    Malformed(String),
}

impl fmt::Display for DecodeFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeFailure::ChunkFailed(e) => write!(f, "chunk call failed: {}", e),
            DecodeFailure::EmptyReturn => write!(f, "empty return data"),
            DecodeFailure::MissingResult => write!(f, "no result returned"),
            DecodeFailure::Malformed(e) => write!(f, "decode failed: {}", e),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryValue {
    Value(U256),
    Degraded(DecodeFailure),
}

/// One positional result of a batched balance query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchEntry {
    pub address: Address,
    pub value: EntryValue,
}

impl BatchEntry {
    pub fn ok(address: Address, value: U256) -> Self {
        Self { address, value: EntryValue::Value(value) }
    }

    pub fn degraded(address: Address, failure: DecodeFailure) -> Self {
        Self { address, value: EntryValue::Degraded(failure) }
    }

    /// The decoded value, or zero for a degraded entry
    pub fn amount(&self) -> U256 {
        match self.value {
            EntryValue::Value(v) => v,
            EntryValue::Degraded(_) => U256::ZERO,
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self.value, EntryValue::Degraded(_))
    }
}
