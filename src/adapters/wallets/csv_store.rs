//! CSV wallet lists
//!
//! Files have a header row followed by `address,privateKey` rows. Cells are
//! trimmed and blank lines are skipped.

use alloy::primitives::Address;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

use super::generator::GeneratedWallet;
use crate::domain::{WalletError, WalletRecord};

/// Header written above generated wallets
pub const CSV_HEADER: [&str; 2] = ["Address", "Private Key"];

#[derive(Debug, Error)]
pub enum WalletStoreError {
    #[error("Failed to read wallet file: {0}")]
    Read(#[source] csv::Error),
    #[error("Failed to write wallet file: {0}")]
    Write(#[source] csv::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Row {row}: expected address and private key columns")]
    MissingColumn { row: usize },
    #[error("Row {row}: invalid address '{value}'")]
    InvalidAddress { row: usize, value: String },
    #[error("Row {row}: {source}")]
    InvalidWallet {
        row: usize,
        #[source]
        source: WalletError,
    },
    #[error("Wallet file contains no wallets")]
    Empty,
}

fn reader<P: AsRef<Path>>(path: P) -> Result<csv::Reader<std::fs::File>, WalletStoreError> {
    csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path.as_ref())
        .map_err(WalletStoreError::Read)
}

/// Load address + signer pairs for the trading and collection paths.
///
/// Every key must derive its listed address.
pub fn load_wallets<P: AsRef<Path>>(path: P) -> Result<Vec<WalletRecord>, WalletStoreError> {
    let mut reader = reader(path)?;
    let mut wallets = Vec::new();

    for (idx, result) in reader.records().enumerate() {
        // Header is line 1
        let row = idx + 2;
        let record = result.map_err(WalletStoreError::Read)?;
        // Whitespace-only lines trim down to a single empty field
        if record.iter().all(str::is_empty) {
            continue;
        }
        let (Some(address), Some(key)) = (record.get(0), record.get(1)) else {
            return Err(WalletStoreError::MissingColumn { row });
        };
        if address.is_empty() && key.is_empty() {
            continue;
        }
        let wallet = WalletRecord::from_parts(address, key)
            .map_err(|source| WalletStoreError::InvalidWallet { row, source })?;
        wallets.push(wallet);
    }

    if wallets.is_empty() {
        return Err(WalletStoreError::Empty);
    }
    Ok(wallets)
}

/// Load only the first column; enough for read-only statistics.
pub fn load_addresses<P: AsRef<Path>>(path: P) -> Result<Vec<Address>, WalletStoreError> {
    let mut reader = reader(path)?;
    let mut addresses = Vec::new();

    for (idx, result) in reader.records().enumerate() {
        let row = idx + 2;
        let record = result.map_err(WalletStoreError::Read)?;
        let value = record.get(0).unwrap_or_default();
        if value.is_empty() {
            continue;
        }
        let address = Address::from_str(value).map_err(|_| WalletStoreError::InvalidAddress {
            row,
            value: value.to_string(),
        })?;
        addresses.push(address);
    }

    Ok(addresses)
}

/// Write generated wallets under the `Address,Private Key` header.
pub fn write_wallets<P: AsRef<Path>>(
    path: P,
    wallets: &[GeneratedWallet],
) -> Result<(), WalletStoreError> {
    let mut writer = csv::Writer::from_path(path.as_ref()).map_err(WalletStoreError::Write)?;
    writer.write_record(CSV_HEADER).map_err(WalletStoreError::Write)?;
    for wallet in wallets {
        writer
            .write_record([wallet.address.as_str(), wallet.secret()])
            .map_err(WalletStoreError::Write)?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::hex;
    use alloy::signers::local::PrivateKeySigner;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn csv_file(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    fn row(signer: &PrivateKeySigner) -> String {
        format!("{},{}", signer.address(), hex::encode(signer.to_bytes()))
    }

    #[test]
    fn test_load_wallets_skips_header_and_blank_lines() {
        let a = PrivateKeySigner::random();
        let b = PrivateKeySigner::random();
        let file = csv_file(&format!("Address,Private Key\n{}\n\n {} \n", row(&a), row(&b)));

        let wallets = load_wallets(file.path()).unwrap();
        assert_eq!(wallets.len(), 2);
        assert_eq!(wallets[0].address(), a.address());
        assert_eq!(wallets[1].address(), b.address());
    }

    #[test]
    fn test_load_wallets_skips_whitespace_only_rows() {
        let a = PrivateKeySigner::random();
        let file = csv_file(&format!("Address,Private Key\n{}\n   \n\n", row(&a)));

        let wallets = load_wallets(file.path()).unwrap();
        assert_eq!(wallets.len(), 1);
        assert_eq!(wallets[0].address(), a.address());
        assert_eq!(load_addresses(file.path()).unwrap(), vec![a.address()]);
    }

    #[test]
    fn test_load_wallets_rejects_mismatched_key() {
        let a = PrivateKeySigner::random();
        let b = PrivateKeySigner::random();
        let file = csv_file(&format!(
            "Address,Private Key\n{},{}\n",
            a.address(),
            hex::encode(b.to_bytes())
        ));

        let err = load_wallets(file.path()).unwrap_err();
        assert!(matches!(err, WalletStoreError::InvalidWallet { row: 2, .. }));
    }

    #[test]
    fn test_load_wallets_missing_key_column() {
        let a = PrivateKeySigner::random();
        let file = csv_file(&format!("Address,Private Key\n{}\n", a.address()));
        assert!(matches!(
            load_wallets(file.path()),
            Err(WalletStoreError::MissingColumn { row: 2 })
        ));
    }

    #[test]
    fn test_load_wallets_empty_file() {
        let file = csv_file("Address,Private Key\n");
        assert!(matches!(load_wallets(file.path()), Err(WalletStoreError::Empty)));
    }

    #[test]
    fn test_load_addresses_first_column_only() {
        let a = PrivateKeySigner::random();
        let file = csv_file(&format!("Address\n{}\n", a.address()));
        assert_eq!(load_addresses(file.path()).unwrap(), vec![a.address()]);
    }

    #[test]
    fn test_load_addresses_reports_bad_row() {
        let file = csv_file("Address\nnot-an-address\n");
        assert!(matches!(
            load_addresses(file.path()),
            Err(WalletStoreError::InvalidAddress { row: 2, .. })
        ));
    }

    #[test]
    fn test_write_then_load() {
        let signer = PrivateKeySigner::random();
        let generated = GeneratedWallet::new(
            signer.address().to_string(),
            hex::encode_prefixed(signer.to_bytes()),
        );
        let file = NamedTempFile::new().unwrap();

        write_wallets(file.path(), &[generated]).unwrap();
        let text = std::fs::read_to_string(file.path()).unwrap();
        assert!(text.starts_with("Address,Private Key\n"));

        let wallets = load_wallets(file.path()).unwrap();
        assert_eq!(wallets[0].address(), signer.address());
    }
}
