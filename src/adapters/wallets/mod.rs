//! Wallet files and HD generation

pub mod csv_store;
pub mod generator;

pub use csv_store::{load_addresses, load_wallets, write_wallets, WalletStoreError};
pub use generator::{AddressKind, GenerateError, GeneratedWallet, WalletGenerator};
