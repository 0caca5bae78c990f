//! Wallet Rotor - multi-wallet EVM toolkit
//!
//! Balance statistics over large wallet lists, a rotating-wallet trading
//! loop against a UniswapV2-style router, and native fund collection.
//!
//! # Modules
//!
//! - `domain`: Core types and pure logic (units, wallets, intents, stats)
//! - `ports`: Chain abstraction (`ChainPort`) and contract bindings
//! - `adapters`: External implementations (alloy client, CSV store, CLI)
//! - `config`: Configuration loading and validation
//! - `application`: Aggregator, funding, execution, orchestrator, collector

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
