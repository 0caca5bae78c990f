use alloy::primitives::Address;
use alloy::signers::local::PrivateKeySigner;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WalletError {
    #[error("Invalid address '{0}'")]
    InvalidAddress(String),
    #[error("Invalid private key for {0}")]
    InvalidKey(String),
    #[error("Private key does not belong to {listed} (derives {derived})")]
    AddressMismatch { listed: Address, derived: Address },
}

/// A wallet from the loaded list: address plus its signing key.
///
/// The key is only reachable through [`WalletRecord::signer`]; formatting a
/// record never prints it.
#[derive(Clone)]
pub struct WalletRecord {
    address: Address,
    signer: PrivateKeySigner,
}

impl WalletRecord {
    /// Build a record from the listed address and hex private key.
    ///
    /// Fails when the key does not derive the listed address.
    pub fn from_parts(address: &str, private_key: &str) -> Result<Self, WalletError> {
        let listed = Address::from_str(address.trim())
            .map_err(|_| WalletError::InvalidAddress(address.to_string()))?;
        let signer = PrivateKeySigner::from_str(private_key.trim())
            .map_err(|_| WalletError::InvalidKey(listed.to_string()))?;

        if signer.address() != listed {
            return Err(WalletError::AddressMismatch {
                listed,
                derived: signer.address(),
            });
        }

        Ok(Self { address: listed, signer })
    }

    /// Wrap an existing signer
    pub fn from_signer(signer: PrivateKeySigner) -> Self {
        Self {
            address: signer.address(),
            signer,
        }
    }

    /// Create a record with a fresh random key (for testing)
    pub fn new_random() -> Self {
        Self::from_signer(PrivateKeySigner::random())
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn signer(&self) -> &PrivateKeySigner {
        &self.signer
    }
}

impl fmt::Debug for WalletRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WalletRecord")
            .field("address", &self.address)
            .field("signer", &"<redacted>")
            .finish()
    }
}

impl PartialEq for WalletRecord {
    fn eq(&self, other: &Self) -> bool {
        self.address == other.address
    }
}

impl Eq for WalletRecord {}
