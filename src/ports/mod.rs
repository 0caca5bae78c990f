//! Ports Layer - Trait definitions for external dependencies
//!
//! This module defines the interfaces (ports) that adapters must implement:
//! - Chain access (balances, multicall, router quotes, transactions)
//! - Contract ABIs shared by adapters and test doubles

pub mod chain;
pub mod contracts;
pub mod mocks;

// Re-export main traits and types
pub use chain::{
    AggregateCall, ChainError, ChainPort, Confirmation, PendingTx, SwapRequest, TransferRequest,
};
pub use mocks::{FakeChain, RecordedWrite};
