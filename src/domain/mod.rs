//! Domain Layer - Core types and pure logic for wallet rotation
//!
//! No chain access happens here. Balances arrive as plain values and
//! decisions leave as plain values; the application layer wires them to
//! the `ChainPort`.

pub mod balance;
pub mod funding;
pub mod intent;
pub mod stats;
pub mod units;
pub mod wallet;

pub use balance::{BatchEntry, DecodeFailure, EntryValue, WalletBalanceSnapshot};
pub use funding::{transferable_amount, FundingOutcome, NATIVE_TRANSFER_GAS};
pub use intent::{decide, TradeBounds, TradeIntent, TradeKind};
pub use stats::{reduce, BalanceTally, StatsReport};
pub use units::{format_units, random_decimal, random_wei, to_wei, UnitsError};
pub use wallet::{WalletError, WalletRecord};
