//! CLI Command Definitions
//!
//! Argument surface of the `rotor` binary. Handlers live in `main.rs`.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::adapters::wallets::AddressKind;

/// Rotor - multi-wallet EVM toolkit
#[derive(Parser, Debug)]
#[command(
    name = "rotor",
    version = env!("CARGO_PKG_VERSION"),
    author = env!("CARGO_PKG_AUTHORS"),
    about = "Multi-wallet EVM toolkit: generate, inspect, trade and collect",
    long_about = "Rotor derives HD wallets, aggregates balances across large wallet lists \
                  through Multicall3, runs a randomized rotating-wallet trading loop and \
                  sweeps native funds back to a single receiver."
)]
pub struct CliApp {
    /// The command to execute
    #[command(subcommand)]
    pub command: Command,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Only log warnings and errors
    #[arg(short, long, global = true, conflicts_with = "debug")]
    pub quiet: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Derive addresses from a BIP-39 mnemonic
    Generate(GenerateCmd),

    /// Aggregate token and native balances across a wallet list
    Stats(StatsCmd),

    /// Run the rotating-wallet trading loop
    Trade(TradeCmd),

    /// Sweep native balances to the receiver
    Collect(CollectCmd),
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressType {
    Evm,
    Sol,
}

impl From<AddressType> for AddressKind {
    fn from(value: AddressType) -> Self {
        match value {
            AddressType::Evm => AddressKind::Evm,
            AddressType::Sol => AddressKind::Sol,
        }
    }
}

/// Derive addresses
#[derive(Parser, Debug)]
pub struct GenerateCmd {
    /// Address type
    #[arg(short = 'T', long = "type", value_enum, default_value = "sol")]
    pub address_type: AddressType,

    /// Mnemonic phrase to derive from
    #[arg(short, long, value_name = "PHRASE", required_unless_present = "new_mnemonic")]
    pub mnemonic: Option<String>,

    /// Generate a fresh 24-word mnemonic and print it once
    #[arg(short = 'g', long, conflicts_with = "mnemonic")]
    pub new_mnemonic: bool,

    /// Number of addresses
    #[arg(short = 'n', long, value_name = "N", default_value = "10")]
    pub count: u32,

    /// Export addresses and keys to this CSV file
    #[arg(short, long, value_name = "FILE")]
    pub file: Option<PathBuf>,

    /// Release each address at a random moment within this many hours
    #[arg(short = 't', long, value_name = "HOURS")]
    pub spread_hours: Option<f64>,
}

/// Balance statistics
#[derive(Parser, Debug)]
pub struct StatsCmd {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
    pub config: PathBuf,

    /// Wallet list CSV (address column is enough)
    #[arg(short, long, value_name = "FILE")]
    pub wallets: PathBuf,

    /// Token to inspect instead of the configured one
    #[arg(long, value_name = "ADDRESS")]
    pub token: Option<String>,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,
}

/// Trading loop
#[derive(Parser, Debug)]
pub struct TradeCmd {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
    pub config: PathBuf,

    /// Wallet list CSV with private keys
    #[arg(short, long, value_name = "FILE")]
    pub wallets: PathBuf,

    /// Address of the wallet the session starts from
    #[arg(short, long, value_name = "ADDRESS")]
    pub start: String,

    /// Stop after this many iterations
    #[arg(long, value_name = "N")]
    pub max_iterations: Option<u64>,
}

/// Fund collection
#[derive(Parser, Debug)]
pub struct CollectCmd {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
    pub config: PathBuf,

    /// Wallet list CSV with private keys
    #[arg(short, long, value_name = "FILE")]
    pub wallets: PathBuf,

    /// Receiver overriding `collector.receiver_address`
    #[arg(long, value_name = "ADDRESS")]
    pub to: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_app_parse_generate_defaults() {
        let args = vec!["rotor", "generate", "--mnemonic", "abandon about"];
        let app = CliApp::try_parse_from(args).unwrap();

        match app.command {
            Command::Generate(cmd) => {
                assert_eq!(cmd.address_type, AddressType::Sol);
                assert_eq!(cmd.count, 10);
                assert!(!cmd.new_mnemonic);
                assert!(cmd.file.is_none());
                assert!(cmd.spread_hours.is_none());
            }
            _ => panic!("Expected Generate command"),
        }
    }

    #[test]
    fn test_cli_app_parse_generate_evm_new() {
        let args = vec![
            "rotor", "generate", "-T", "evm", "-g", "-n", "5", "-f", "out.csv", "-t", "1.5",
        ];
        let app = CliApp::try_parse_from(args).unwrap();

        match app.command {
            Command::Generate(cmd) => {
                assert_eq!(cmd.address_type, AddressType::Evm);
                assert!(cmd.new_mnemonic);
                assert_eq!(cmd.count, 5);
                assert_eq!(cmd.file, Some(PathBuf::from("out.csv")));
                assert_eq!(cmd.spread_hours, Some(1.5));
            }
            _ => panic!("Expected Generate command"),
        }
    }

    #[test]
    fn test_cli_app_generate_requires_a_mnemonic_source() {
        assert!(CliApp::try_parse_from(vec!["rotor", "generate"]).is_err());
        assert!(CliApp::try_parse_from(vec!["rotor", "generate", "-g", "-m", "x"]).is_err());
    }

    #[test]
    fn test_cli_app_parse_trade() {
        let args = vec![
            "rotor", "trade", "--config", "bsc.toml", "--wallets", "w.csv",
            "--start", "0xabc", "--max-iterations", "12", "--debug",
        ];
        let app = CliApp::try_parse_from(args).unwrap();

        assert!(app.debug);
        match app.command {
            Command::Trade(cmd) => {
                assert_eq!(cmd.config, PathBuf::from("bsc.toml"));
                assert_eq!(cmd.wallets, PathBuf::from("w.csv"));
                assert_eq!(cmd.start, "0xabc");
                assert_eq!(cmd.max_iterations, Some(12));
            }
            _ => panic!("Expected Trade command"),
        }
    }

    #[test]
    fn test_cli_app_trade_requires_start() {
        let args = vec!["rotor", "trade", "--wallets", "w.csv"];
        assert!(CliApp::try_parse_from(args).is_err());
    }

    #[test]
    fn test_cli_app_parse_stats_and_collect() {
        let app = CliApp::try_parse_from(vec!["rotor", "stats", "-w", "w.csv", "--token", "0x1", "--json"]).unwrap();
        match app.command {
            Command::Stats(cmd) => {
                assert_eq!(cmd.config, PathBuf::from("config.toml"));
                assert_eq!(cmd.token.as_deref(), Some("0x1"));
                assert!(cmd.json);
            }
            _ => panic!("Expected Stats command"),
        }

        let app = CliApp::try_parse_from(vec!["rotor", "collect", "-w", "w.csv", "--to", "0x2", "-q"]).unwrap();
        assert!(app.quiet);
        match app.command {
            Command::Collect(cmd) => assert_eq!(cmd.to.as_deref(), Some("0x2")),
            _ => panic!("Expected Collect command"),
        }
    }

    #[test]
    fn test_cli_app_debug_and_quiet_conflict() {
        let args = vec!["rotor", "--debug", "--quiet", "stats", "-w", "w.csv"];
        assert!(CliApp::try_parse_from(args).is_err());
    }
}
