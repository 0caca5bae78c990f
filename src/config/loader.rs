//! Configuration Loader
//!
//! Loads and validates configuration from TOML files matching config.toml structure.

use alloy::primitives::{address, Address, U256};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

use crate::domain::{to_wei, TradeBounds};

/// Canonical Multicall3 deployment, identical on most EVM chains
pub const DEFAULT_MULTICALL3: Address = address!("cA11bde05977b3631167028862bE2a173976CA11");

/// Main configuration structure matching config.toml
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub chain: ChainSection,
    pub tokens: TokensSection,
    pub router: RouterSection,
    pub trading: TradingSection,
    #[serde(default)]
    pub collector: CollectorSection,
}

/// Chain RPC configuration section
#[derive(Debug, Clone, Deserialize)]
pub struct ChainSection {
    /// JSON-RPC endpoint
    pub rpc_url: String,
    /// Multicall3 contract used for batched balance reads
    #[serde(default = "default_multicall3")]
    pub multicall3_address: String,
}

fn default_multicall3() -> String {
    DEFAULT_MULTICALL3.to_string()
}

impl ChainSection {
    /// Get RPC URL with environment variable override
    /// Checks ROTOR_RPC_URL env var first, falls back to config value
    pub fn get_rpc_url(&self) -> String {
        std::env::var("ROTOR_RPC_URL").unwrap_or_else(|_| self.rpc_url.clone())
    }
}

/// Tokens configuration section
#[derive(Debug, Clone, Deserialize)]
pub struct TokensSection {
    /// Token being traded
    pub token_address: String,
    /// Wrapped native token (WBNB, WETH) on the router path
    pub quote_token_address: String,
    /// Native currency symbol (for reports)
    pub quote_symbol: String,
}

/// Router configuration section
#[derive(Debug, Clone, Deserialize)]
pub struct RouterSection {
    /// UniswapV2-compatible router
    pub address: String,
    /// Minimum-output guard in basis points; unset sends amountOutMin = 0
    #[serde(default)]
    pub slippage_bps: Option<u16>,
}

/// Trading loop configuration section
#[derive(Debug, Clone, Deserialize)]
pub struct TradingSection {
    /// Native balance at or below which a wallet cannot fund or start a session
    pub min_native_balance: Decimal,
    /// Token balance below which a wallet buys instead of selling
    pub min_token_balance: Decimal,
    /// Native amount spent per buy
    pub amount_range: [Decimal; 2],
    /// Token amount kept per sell
    pub balance_range: [Decimal; 2],
    /// Pause between iterations, whole seconds
    pub interval_secs: [u64; 2],
}

/// Collector configuration section (optional)
#[derive(Debug, Clone, Deserialize, Default)]
pub struct CollectorSection {
    /// Destination of the final sweep
    #[serde(default)]
    pub receiver_address: Option<String>,
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Validation failed: {0}")]
    ValidationError(String),
}

/// Load configuration from a TOML file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&content)?;
    config.validate()?;
    Ok(config)
}

fn parse_address(field: &str, value: &str) -> Result<Address, ConfigError> {
    Address::from_str(value.trim()).map_err(|_| {
        ConfigError::ValidationError(format!("{} is not a valid address: '{}'", field, value))
    })
}

fn check_range(field: &str, lo: Decimal, hi: Decimal) -> Result<(), ConfigError> {
    if lo.is_sign_negative() && !lo.is_zero() {
        return Err(ConfigError::ValidationError(format!(
            "{} must be non-negative, got [{}, {}]",
            field, lo, hi
        )));
    }
    if lo > hi {
        return Err(ConfigError::ValidationError(format!(
            "{} must be ordered [lo, hi], got [{}, {}]",
            field, lo, hi
        )));
    }
    Ok(())
}

fn wei(field: &str, value: Decimal) -> Result<U256, ConfigError> {
    to_wei(value).map_err(|e| ConfigError::ValidationError(format!("{}: {}", field, e)))
}

impl Config {
    /// Validate all configuration parameters
    pub fn validate(&self) -> Result<(), ConfigError> {
        // Validate chain section
        if self.chain.rpc_url.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "rpc_url cannot be empty".to_string(),
            ));
        }
        self.multicall3()?;

        // Validate tokens
        self.token()?;
        self.quote_token()?;
        if self.tokens.quote_symbol.is_empty() {
            return Err(ConfigError::ValidationError(
                "quote_symbol cannot be empty".to_string(),
            ));
        }

        // Validate router
        self.router()?;
        if let Some(bps) = self.router.slippage_bps {
            if bps > 10_000 {
                return Err(ConfigError::ValidationError(format!(
                    "slippage_bps must be 0-10000, got {}",
                    bps
                )));
            }
        }

        // Validate trading
        let t = &self.trading;
        check_range("min_native_balance", t.min_native_balance, t.min_native_balance)?;
        check_range("min_token_balance", t.min_token_balance, t.min_token_balance)?;
        check_range("amount_range", t.amount_range[0], t.amount_range[1])?;
        check_range("balance_range", t.balance_range[0], t.balance_range[1])?;
        if t.interval_secs[0] > t.interval_secs[1] {
            return Err(ConfigError::ValidationError(format!(
                "interval_secs must be ordered [lo, hi], got {:?}",
                t.interval_secs
            )));
        }
        self.trade_bounds()?;
        self.min_native_wei()?;

        // Validate collector
        if let Some(receiver) = &self.collector.receiver_address {
            parse_address("receiver_address", receiver)?;
        }

        Ok(())
    }

    pub fn multicall3(&self) -> Result<Address, ConfigError> {
        parse_address("multicall3_address", &self.chain.multicall3_address)
    }

    pub fn token(&self) -> Result<Address, ConfigError> {
        parse_address("token_address", &self.tokens.token_address)
    }

    pub fn quote_token(&self) -> Result<Address, ConfigError> {
        parse_address("quote_token_address", &self.tokens.quote_token_address)
    }

    pub fn router(&self) -> Result<Address, ConfigError> {
        parse_address("router.address", &self.router.address)
    }

    /// Receiver for `collect`; a command-line override wins
    pub fn receiver(&self, overridden: Option<&str>) -> Result<Address, ConfigError> {
        match overridden.or(self.collector.receiver_address.as_deref()) {
            Some(value) => parse_address("receiver_address", value),
            None => Err(ConfigError::ValidationError(
                "receiver_address is required for collection".to_string(),
            )),
        }
    }

    pub fn min_native_wei(&self) -> Result<U256, ConfigError> {
        wei("min_native_balance", self.trading.min_native_balance)
    }

    /// Sizing bounds for the trade decision engine
    pub fn trade_bounds(&self) -> Result<TradeBounds, ConfigError> {
        let t = &self.trading;
        Ok(TradeBounds {
            min_token_balance: wei("min_token_balance", t.min_token_balance)?,
            amount_range: (t.amount_range[0], t.amount_range[1]),
            balance_range: (t.balance_range[0], t.balance_range[1]),
        })
    }

    /// Inclusive pacing interval in seconds
    pub fn interval(&self) -> (u64, u64) {
        (self.trading.interval_secs[0], self.trading.interval_secs[1])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_valid_config() -> String {
        r#"
[chain]
rpc_url = "https://bsc-dataseed.binance.org"

[tokens]
token_address = "0x0E09FaBB73Bd3Ade0a17ECC321fD13a19e81cE82"
quote_token_address = "0xbb4CdB9CBd36B01bD1cBaEBF2De08d9173bc095c"
quote_symbol = "BNB"

[router]
address = "0x10ED43C718714eb63d5aA57B78B54704E256024E"

[trading]
min_native_balance = "0.002"
min_token_balance = 100
amount_range = ["0.001", "0.005"]
balance_range = ["0", "1000"]
interval_secs = [30, 120]

[collector]
receiver_address = "0x000000000000000000000000000000000000dEaD"
"#
        .to_string()
    }

    fn write_config(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_valid_config() {
        let file = write_config(&create_valid_config());
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.tokens.quote_symbol, "BNB");
        assert_eq!(config.trading.min_native_balance, dec!(0.002));
        assert_eq!(config.trading.min_token_balance, dec!(100));
        assert_eq!(config.interval(), (30, 120));
        assert_eq!(config.router.slippage_bps, None);
    }

    #[test]
    fn test_multicall_defaults() {
        let file = write_config(&create_valid_config());
        let config = load_config(file.path()).unwrap();
        assert_eq!(config.multicall3().unwrap(), DEFAULT_MULTICALL3);
    }

    #[test]
    fn test_load_missing_file() {
        let result = load_config("/nonexistent/path/config.toml");
        assert!(result.is_err());
        assert!(matches!(result.unwrap_err(), ConfigError::IoError(_)));
    }

    #[test]
    fn test_missing_section_is_parse_error() {
        let file = write_config("[chain]\nrpc_url = \"http://localhost:8545\"\n");
        assert!(matches!(load_config(file.path()), Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_invalid_token_address() {
        let invalid = create_valid_config().replace(
            "0x0E09FaBB73Bd3Ade0a17ECC321fD13a19e81cE82",
            "0xnot-an-address",
        );
        let file = write_config(&invalid);
        assert!(matches!(
            load_config(file.path()),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_inverted_amount_range() {
        let invalid = create_valid_config()
            .replace(r#"amount_range = ["0.001", "0.005"]"#, r#"amount_range = ["0.005", "0.001"]"#);
        let file = write_config(&invalid);
        assert!(matches!(
            load_config(file.path()),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_inverted_interval() {
        let invalid = create_valid_config().replace("[30, 120]", "[120, 30]");
        let file = write_config(&invalid);
        assert!(matches!(
            load_config(file.path()),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_empty_rpc_url() {
        let invalid = create_valid_config()
            .replace("https://bsc-dataseed.binance.org", "");
        let file = write_config(&invalid);
        assert!(matches!(
            load_config(file.path()),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_trade_bounds_in_wei() {
        let file = write_config(&create_valid_config());
        let config = load_config(file.path()).unwrap();
        let bounds = config.trade_bounds().unwrap();

        assert_eq!(bounds.min_token_balance, U256::from(100u64) * U256::from(10u64).pow(U256::from(18)));
        assert_eq!(bounds.amount_range, (dec!(0.001), dec!(0.005)));
        assert_eq!(config.min_native_wei().unwrap(), U256::from(2_000_000_000_000_000u64));
    }

    #[test]
    fn test_receiver_override_and_missing() {
        let file = write_config(&create_valid_config());
        let config = load_config(file.path()).unwrap();
        let overridden = "0x1111111111111111111111111111111111111111";
        assert_eq!(
            config.receiver(Some(overridden)).unwrap(),
            Address::from_str(overridden).unwrap()
        );

        let without = create_valid_config().replace(
            "[collector]\nreceiver_address = \"0x000000000000000000000000000000000000dEaD\"\n",
            "",
        );
        let file = write_config(&without);
        let config = load_config(file.path()).unwrap();
        assert!(config.receiver(None).is_err());
    }

    #[test]
    fn test_slippage_out_of_range() {
        let invalid = create_valid_config().replace(
            "[router]\naddress = \"0x10ED43C718714eb63d5aA57B78B54704E256024E\"\n",
            "[router]\naddress = \"0x10ED43C718714eb63d5aA57B78B54704E256024E\"\nslippage_bps = 20000\n",
        );
        let file = write_config(&invalid);
        assert!(matches!(
            load_config(file.path()),
            Err(ConfigError::ValidationError(_))
        ));
    }
}
