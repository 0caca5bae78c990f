//! Adapters Layer - External System Implementations
//!
//! This module contains implementations of the port traits:
//! - EVM: alloy JSON-RPC client implementing `ChainPort`
//! - Wallets: CSV wallet lists and HD generation
//! - CLI: Command-line interface definitions

pub mod cli;
pub mod evm;
pub mod wallets;

pub use cli::CliApp;
pub use evm::EvmClient;
