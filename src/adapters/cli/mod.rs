//! CLI Adapter
//!
//! Command-line interface for the rotor binary.
//! Uses clap derive macros for argument parsing.

mod commands;

pub use commands::{AddressType, CliApp, CollectCmd, Command, GenerateCmd, StatsCmd, TradeCmd};
