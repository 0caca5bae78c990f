//! Fund Collector
//!
//! One pass over every wallet, sweeping its native balance minus transfer
//! gas to a single receiver. Wallets are independent: a failure is recorded
//! and the pass moves on.

use alloy::primitives::{Address, TxHash, U256};
use std::sync::Arc;

use crate::domain::{format_units, transferable_amount, WalletRecord, NATIVE_TRANSFER_GAS};
use crate::ports::chain::{ChainError, ChainPort, TransferRequest};

/// Result for one wallet
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SweepResult {
    Swept { tx_hash: TxHash, amount: U256 },
    /// Zero balance, nothing sent
    Empty,
    /// Balance does not cover the transfer gas
    BelowGasCost { balance: U256 },
    /// The wallet is the receiver itself
    IsReceiver,
    Failed { reason: String },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollectionReport {
    pub results: Vec<(Address, SweepResult)>,
}

impl CollectionReport {
    pub fn swept_count(&self) -> usize {
        self.results
            .iter()
            .filter(|(_, r)| matches!(r, SweepResult::Swept { .. }))
            .count()
    }

    pub fn failed_count(&self) -> usize {
        self.results
            .iter()
            .filter(|(_, r)| matches!(r, SweepResult::Failed { .. }))
            .count()
    }

    pub fn skipped_count(&self) -> usize {
        self.results.len() - self.swept_count() - self.failed_count()
    }

    pub fn total_swept(&self) -> U256 {
        self.results
            .iter()
            .filter_map(|(_, r)| match r {
                SweepResult::Swept { amount, .. } => Some(*amount),
                _ => None,
            })
            .fold(U256::ZERO, |acc, amount| acc.saturating_add(amount))
    }
}

pub struct FundCollector<C: ChainPort> {
    chain: Arc<C>,
    receiver: Address,
}

impl<C: ChainPort> FundCollector<C> {
    pub fn new(chain: Arc<C>, receiver: Address) -> Self {
        Self { chain, receiver }
    }

    pub async fn collect(&self, wallets: &[WalletRecord]) -> CollectionReport {
        tracing::info!("Collecting {} wallets into {}", wallets.len(), self.receiver);
        let mut report = CollectionReport::default();

        for wallet in wallets {
            let result = match self.sweep(wallet).await {
                Ok(result) => result,
                Err(e) => {
                    tracing::error!("Collection from {} failed: {}", wallet.address(), e);
                    SweepResult::Failed {
                        reason: e.to_string(),
                    }
                }
            };
            report.results.push((wallet.address(), result));
        }

        tracing::info!(
            "Collection done: {} swept ({}), {} skipped, {} failed",
            report.swept_count(),
            format_units(report.total_swept()),
            report.skipped_count(),
            report.failed_count()
        );
        report
    }

    async fn sweep(&self, wallet: &WalletRecord) -> Result<SweepResult, ChainError> {
        if wallet.address() == self.receiver {
            return Ok(SweepResult::IsReceiver);
        }

        let (balance, gas_price) = tokio::try_join!(
            self.chain.native_balance(wallet.address()),
            self.chain.gas_price(),
        )?;
        if balance.is_zero() {
            tracing::debug!("{} is empty", wallet.address());
            return Ok(SweepResult::Empty);
        }
        let Some(amount) = transferable_amount(balance, gas_price) else {
            tracing::debug!("{} holds {}, below gas cost", wallet.address(), format_units(balance));
            return Ok(SweepResult::BelowGasCost { balance });
        };

        let request = TransferRequest {
            to: self.receiver,
            value: amount,
            gas_limit: NATIVE_TRANSFER_GAS,
            gas_price,
        };
        let pending = self.chain.send_transfer(wallet.address(), request).await?;
        let confirmation = self.chain.confirm(pending).await?;

        tracing::info!(
            "Collected {} from {} ({})",
            format_units(amount),
            wallet.address(),
            confirmation.hash
        );
        Ok(SweepResult::Swept {
            tx_hash: confirmation.hash,
            amount,
        })
    }
}
