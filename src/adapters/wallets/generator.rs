//! HD wallet generation from a BIP-39 phrase
//!
//! EVM addresses follow `m/44'/60'/0'/0/{i}`, Solana addresses
//! `m/44'/501'/{i}'/0'`. Secrets are exported as hex.

use alloy::hex;
use alloy::signers::local::coins_bip39::{English, Mnemonic};
use alloy::signers::local::MnemonicBuilder;
use chrono::Utc;
use rand::Rng;
use solana_sdk::derivation_path::DerivationPath;
use solana_sdk::signature::Signer;
use solana_sdk::signer::keypair::keypair_from_seed_and_derivation_path;
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use tracing::info;

/// Word count of freshly generated phrases
pub const NEW_MNEMONIC_WORDS: usize = 24;

#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("Invalid mnemonic: {0}")]
    InvalidMnemonic(String),
    #[error("Derivation failed at index {index}: {reason}")]
    Derivation { index: u32, reason: String },
    #[error("Invalid spread window: {0} hours")]
    InvalidSpread(f64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressKind {
    Evm,
    Sol,
}

impl AddressKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AddressKind::Evm => "EVM",
            AddressKind::Sol => "SOL",
        }
    }
}

/// Derived address with its exported secret
#[derive(Clone, PartialEq, Eq)]
pub struct GeneratedWallet {
    pub address: String,
    secret: String,
}

impl GeneratedWallet {
    pub fn new(address: String, secret: String) -> Self {
        Self { address, secret }
    }

    /// Hex private key (EVM) or 64-byte keypair (Solana)
    pub fn secret(&self) -> &str {
        &self.secret
    }
}

impl fmt::Debug for GeneratedWallet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeneratedWallet")
            .field("address", &self.address)
            .field("secret", &"<redacted>")
            .finish()
    }
}

pub struct WalletGenerator {
    kind: AddressKind,
    phrase: String,
    seed: [u8; 64],
}

impl WalletGenerator {
    pub fn from_phrase(kind: AddressKind, phrase: &str) -> Result<Self, GenerateError> {
        let phrase = phrase.split_whitespace().collect::<Vec<_>>().join(" ");
        let mnemonic = Mnemonic::<English>::new_from_phrase(&phrase)
            .map_err(|e| GenerateError::InvalidMnemonic(e.to_string()))?;
        let seed = mnemonic
            .to_seed(None)
            .map_err(|e| GenerateError::InvalidMnemonic(e.to_string()))?;
        Ok(Self { kind, phrase, seed })
    }

    /// Fresh 24-word phrase from the thread RNG
    pub fn random(kind: AddressKind) -> Result<Self, GenerateError> {
        let mut rng = rand::thread_rng();
        let mnemonic = Mnemonic::<English>::new_with_count(&mut rng, NEW_MNEMONIC_WORDS)
            .map_err(|e| GenerateError::InvalidMnemonic(e.to_string()))?;
        Self::from_phrase(kind, &mnemonic.to_phrase())
    }

    pub fn kind(&self) -> AddressKind {
        self.kind
    }

    /// The phrase backing every derived wallet. Show it once, never log it.
    pub fn phrase(&self) -> &str {
        &self.phrase
    }

    pub fn derive(&self, index: u32) -> Result<GeneratedWallet, GenerateError> {
        match self.kind {
            AddressKind::Evm => self.derive_evm(index),
            AddressKind::Sol => self.derive_sol(index),
        }
    }

    pub fn derive_many(&self, count: u32) -> Result<Vec<GeneratedWallet>, GenerateError> {
        (0..count).map(|i| self.derive(i)).collect()
    }

    fn derive_evm(&self, index: u32) -> Result<GeneratedWallet, GenerateError> {
        let derivation = |e: alloy::signers::local::LocalSignerError| GenerateError::Derivation {
            index,
            reason: e.to_string(),
        };
        let signer = MnemonicBuilder::<English>::default()
            .phrase(self.phrase.as_str())
            .index(index)
            .map_err(derivation)?
            .build()
            .map_err(derivation)?;

        Ok(GeneratedWallet::new(
            signer.address().to_string(),
            hex::encode_prefixed(signer.to_bytes()),
        ))
    }

    fn derive_sol(&self, index: u32) -> Result<GeneratedWallet, GenerateError> {
        let path = DerivationPath::new_bip44(Some(index), Some(0));
        let keypair = keypair_from_seed_and_derivation_path(&self.seed, Some(path)).map_err(|e| {
            GenerateError::Derivation {
                index,
                reason: e.to_string(),
            }
        })?;

        Ok(GeneratedWallet::new(
            keypair.pubkey().to_string(),
            hex::encode(keypair.to_bytes()),
        ))
    }

    /// Derive `count` wallets, each released at a random moment within
    /// the next `hours`. Wallets come back in index order.
    pub async fn derive_spread<R: Rng>(
        &self,
        count: u32,
        hours: f64,
        rng: &mut R,
    ) -> Result<Vec<GeneratedWallet>, GenerateError> {
        let delays = spread_delays(count as usize, hours, rng)?;
        info!(
            "Generating {} {} addresses over the next {} hours",
            count,
            self.kind.as_str(),
            hours
        );

        let start = tokio::time::Instant::now();
        let mut wallets = Vec::with_capacity(delays.len());
        for (index, delay) in delays.into_iter().enumerate() {
            tokio::time::sleep_until(start + delay).await;
            let wallet = self.derive(index as u32)?;
            info!("{} -> {}", Utc::now().to_rfc3339(), wallet.address);
            wallets.push(wallet);
        }
        Ok(wallets)
    }
}

/// Sorted random offsets within `[0, hours)`
pub fn spread_delays<R: Rng>(
    count: usize,
    hours: f64,
    rng: &mut R,
) -> Result<Vec<Duration>, GenerateError> {
    if !hours.is_finite() || hours <= 0.0 {
        return Err(GenerateError::InvalidSpread(hours));
    }
    let window_ms = (hours * 3_600_000.0) as u64;
    let mut delays = (0..count)
        .map(|_| Duration::from_millis(rng.gen_range(0..window_ms.max(1))))
        .collect::<Vec<_>>();
    delays.sort();
    Ok(delays)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use regex::Regex;

    // Standard BIP-39 test vector phrase
    const PHRASE: &str = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

    #[test]
    fn test_evm_known_first_address() {
        let generator = WalletGenerator::from_phrase(AddressKind::Evm, PHRASE).unwrap();
        let wallet = generator.derive(0).unwrap();
        assert_eq!(
            wallet.address.to_lowercase(),
            "0x9858effd232b4033e47d90003d41ec34ecaeda94"
        );
    }

    #[test]
    fn test_evm_format() {
        let generator = WalletGenerator::from_phrase(AddressKind::Evm, PHRASE).unwrap();
        let wallets = generator.derive_many(3).unwrap();
        let address = Regex::new(r"^0x[0-9a-fA-F]{40}$").unwrap();
        let key = Regex::new(r"^0x[0-9a-f]{64}$").unwrap();

        assert_eq!(wallets.len(), 3);
        for w in &wallets {
            assert!(address.is_match(&w.address), "{}", w.address);
            assert!(key.is_match(w.secret()));
        }
        assert_ne!(wallets[0].address, wallets[1].address);
    }

    #[test]
    fn test_sol_format() {
        let generator = WalletGenerator::from_phrase(AddressKind::Sol, PHRASE).unwrap();
        let wallets = generator.derive_many(2).unwrap();
        let address = Regex::new(r"^[1-9A-HJ-NP-Za-km-z]{32,44}$").unwrap();
        let secret = Regex::new(r"^[0-9a-f]{128}$").unwrap();

        for w in &wallets {
            assert!(address.is_match(&w.address), "{}", w.address);
            assert!(secret.is_match(w.secret()));
        }
        assert_ne!(wallets[0].address, wallets[1].address);
    }

    #[test]
    fn test_derivation_is_deterministic() {
        let a = WalletGenerator::from_phrase(AddressKind::Sol, PHRASE).unwrap();
        let b = WalletGenerator::from_phrase(AddressKind::Sol, PHRASE).unwrap();
        assert_eq!(a.derive(4).unwrap(), b.derive(4).unwrap());
    }

    #[test]
    fn test_invalid_phrase() {
        let result = WalletGenerator::from_phrase(AddressKind::Evm, "not a real mnemonic phrase");
        assert!(matches!(result, Err(GenerateError::InvalidMnemonic(_))));
    }

    #[test]
    fn test_random_phrase_has_24_words() {
        let generator = WalletGenerator::random(AddressKind::Evm).unwrap();
        assert_eq!(generator.phrase().split(' ').count(), NEW_MNEMONIC_WORDS);
    }

    #[test]
    fn test_debug_redacts_secret() {
        let wallet = GeneratedWallet::new("addr".into(), "deadbeef".into());
        assert!(!format!("{:?}", wallet).contains("deadbeef"));
    }

    #[test]
    fn test_spread_delays_sorted_within_window() {
        let mut rng = StdRng::seed_from_u64(3);
        let delays = spread_delays(50, 0.5, &mut rng).unwrap();
        assert_eq!(delays.len(), 50);
        assert!(delays.windows(2).all(|w| w[0] <= w[1]));
        assert!(delays.iter().all(|d| *d < Duration::from_secs(1800)));
        assert!(spread_delays(1, 0.0, &mut rng).is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_derive_spread_returns_in_index_order() {
        let generator = WalletGenerator::from_phrase(AddressKind::Evm, PHRASE).unwrap();
        let mut rng = StdRng::seed_from_u64(9);
        let wallets = generator.derive_spread(3, 1.0, &mut rng).await.unwrap();
        assert_eq!(wallets, generator.derive_many(3).unwrap());
    }
}
