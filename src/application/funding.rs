//! Funding Propagator
//!
//! Moves the whole native balance of the last funded wallet, net of the
//! transfer's gas, to the wallet about to trade.

use alloy::primitives::U256;
use std::sync::Arc;

use crate::domain::{format_units, transferable_amount, FundingOutcome, WalletRecord, NATIVE_TRANSFER_GAS};
use crate::ports::chain::{ChainError, ChainPort, TransferRequest};

pub struct FundingPropagator<C: ChainPort> {
    chain: Arc<C>,
    min_native_balance: U256,
}

impl<C: ChainPort> FundingPropagator<C> {
    pub fn new(chain: Arc<C>, min_native_balance: U256) -> Self {
        Self {
            chain,
            min_native_balance,
        }
    }

    /// Fund `successor` from `predecessor`.
    ///
    /// Never returns an error: failures are folded into
    /// [`FundingOutcome::TransferFailed`] so the caller can tell a retryable
    /// failure from an exhausted rotation.
    pub async fn apply(
        &self,
        predecessor: Option<&WalletRecord>,
        successor: &WalletRecord,
    ) -> FundingOutcome {
        let Some(predecessor) = predecessor else {
            return FundingOutcome::Skipped;
        };

        match self.transfer(predecessor, successor).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!(
                    "Funding {} from {} failed: {}",
                    successor.address(),
                    predecessor.address(),
                    e
                );
                FundingOutcome::TransferFailed {
                    reason: e.to_string(),
                }
            }
        }
    }

    async fn transfer(
        &self,
        predecessor: &WalletRecord,
        successor: &WalletRecord,
    ) -> Result<FundingOutcome, ChainError> {
        let (balance, gas_price) = tokio::try_join!(
            self.chain.native_balance(predecessor.address()),
            self.chain.gas_price(),
        )?;

        // Inclusive: a predecessor sitting exactly at the minimum is exhausted
        if balance <= self.min_native_balance {
            tracing::warn!(
                "Predecessor {} holds {}, at or below minimum {}",
                predecessor.address(),
                format_units(balance),
                format_units(self.min_native_balance)
            );
            return Ok(FundingOutcome::InsufficientPredecessorBalance { balance });
        }

        if predecessor == successor {
            tracing::debug!("{} is its own funding source, no transfer", successor.address());
            return Ok(FundingOutcome::Skipped);
        }

        let Some(amount) = transferable_amount(balance, gas_price) else {
            return Ok(FundingOutcome::InsufficientPredecessorBalance { balance });
        };

        let request = TransferRequest {
            to: successor.address(),
            value: amount,
            gas_limit: NATIVE_TRANSFER_GAS,
            gas_price,
        };
        let pending = self.chain.send_transfer(predecessor.address(), request).await?;
        let confirmation = self.chain.confirm(pending).await?;

        tracing::info!(
            "Funded {} with {} from {} ({})",
            successor.address(),
            format_units(amount),
            predecessor.address(),
            confirmation.hash
        );
        Ok(FundingOutcome::Transferred {
            tx_hash: confirmation.hash,
            amount,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::chain::MockChainPort;
    use crate::ports::mocks::FakeChain;

    const GWEI: u128 = 1_000_000_000;

    fn min_balance() -> U256 {
        U256::from(2_000_000_000_000_000u64)
    }

    #[tokio::test]
    async fn test_no_predecessor_skips_without_chain_calls() {
        // Any call on a mock without expectations panics
        let mock = MockChainPort::new();
        let propagator = FundingPropagator::new(Arc::new(mock), min_balance());

        let outcome = propagator.apply(None, &WalletRecord::new_random()).await;
        assert_eq!(outcome, FundingOutcome::Skipped);
    }

    #[tokio::test]
    async fn test_predecessor_exactly_at_minimum_is_insufficient() {
        let prev = WalletRecord::new_random();
        let next = WalletRecord::new_random();
        let chain = Arc::new(FakeChain::new().with_native(prev.address(), min_balance()));
        let propagator = FundingPropagator::new(chain.clone(), min_balance());

        let outcome = propagator.apply(Some(&prev), &next).await;
        assert_eq!(
            outcome,
            FundingOutcome::InsufficientPredecessorBalance { balance: min_balance() }
        );
        assert!(chain.writes().is_empty());
    }

    #[tokio::test]
    async fn test_transfers_balance_minus_gas() {
        let prev = WalletRecord::new_random();
        let next = WalletRecord::new_random();
        let balance = U256::from(10_000_000_000_000_000u64);
        let chain = Arc::new(
            FakeChain::new()
                .with_gas_price(5 * GWEI)
                .with_native(prev.address(), balance),
        );
        let propagator = FundingPropagator::new(chain.clone(), min_balance());

        let outcome = propagator.apply(Some(&prev), &next).await;

        let expected = balance - U256::from(5 * GWEI * 21_000);
        assert!(matches!(outcome, FundingOutcome::Transferred { amount, .. } if amount == expected));
        assert_eq!(chain.native_of(next.address()), expected);
        assert_eq!(chain.native_of(prev.address()), U256::ZERO);

        let transfers = chain.transfers();
        assert_eq!(transfers.len(), 1);
        assert_eq!(transfers[0].1.gas_limit, 21_000);
        assert_eq!(transfers[0].1.gas_price, 5 * GWEI);
    }

    #[tokio::test]
    async fn test_gas_cost_above_balance_is_insufficient() {
        let prev = WalletRecord::new_random();
        let next = WalletRecord::new_random();
        let balance = min_balance() + U256::from(1u64);
        let chain = Arc::new(
            FakeChain::new()
                .with_gas_price(1_000 * GWEI)
                .with_native(prev.address(), balance),
        );
        let propagator = FundingPropagator::new(chain.clone(), min_balance());

        let outcome = propagator.apply(Some(&prev), &next).await;
        assert!(outcome.is_hard_stop());
        assert!(chain.writes().is_empty());
    }

    #[tokio::test]
    async fn test_self_funding_is_skipped() {
        let wallet = WalletRecord::new_random();
        let chain = Arc::new(FakeChain::new().with_native(wallet.address(), min_balance() * U256::from(3u64)));
        let propagator = FundingPropagator::new(chain.clone(), min_balance());

        assert_eq!(propagator.apply(Some(&wallet), &wallet).await, FundingOutcome::Skipped);
        assert!(chain.writes().is_empty());
    }

    #[tokio::test]
    async fn test_read_failure_is_transfer_failed() {
        let prev = WalletRecord::new_random();
        let chain = Arc::new(FakeChain::new().fail_native_reads(1));
        let propagator = FundingPropagator::new(chain, min_balance());

        let outcome = propagator.apply(Some(&prev), &WalletRecord::new_random()).await;
        assert!(matches!(outcome, FundingOutcome::TransferFailed { .. }));
        assert!(!outcome.is_hard_stop());
    }

    #[tokio::test]
    async fn test_submission_failure_is_transfer_failed() {
        let prev = WalletRecord::new_random();
        let chain = Arc::new(
            FakeChain::new()
                .with_native(prev.address(), min_balance() * U256::from(5u64))
                .fail_transfers(),
        );
        let propagator = FundingPropagator::new(chain, min_balance());

        let outcome = propagator.apply(Some(&prev), &WalletRecord::new_random()).await;
        assert!(matches!(outcome, FundingOutcome::TransferFailed { reason } if reason.contains("nonce")));
    }
}
