//! EVM JSON-RPC adapter
//!
//! Implements `ChainPort` on an alloy HTTP provider.

pub mod client;

pub use client::EvmClient;
