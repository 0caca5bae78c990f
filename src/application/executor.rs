//! Trade Execution
//!
//! Buys spend native currency along `[quote, token]`; sells approve the
//! router, verify the allowance, then swap along `[token, quote]`. Every
//! swap carries a 20 minute deadline and is awaited until mined.

use alloy::primitives::{Address, U256};
use chrono::{Duration, Utc};
use std::sync::Arc;
use thiserror::Error;

use crate::domain::{format_units, TradeIntent, TradeKind, WalletRecord};
use crate::ports::chain::{ChainError, ChainPort, Confirmation, SwapRequest};

/// On-chain deadline applied to every swap
pub const SWAP_DEADLINE_MINUTES: i64 = 20;

const BPS_DENOMINATOR: u64 = 10_000;

#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("Chain error: {0}")]
    Chain(#[from] ChainError),
    #[error("Allowance {allowance} below sell amount {required}")]
    AllowanceShortfall { allowance: U256, required: U256 },
}

/// Addresses and guard settings shared by every trade
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionSettings {
    pub token: Address,
    pub quote_token: Address,
    pub router: Address,
    /// None sends `amountOutMin = 0`
    pub slippage_bps: Option<u16>,
}

pub struct TradeExecutor<C: ChainPort> {
    chain: Arc<C>,
    settings: ExecutionSettings,
}

impl<C: ChainPort> TradeExecutor<C> {
    pub fn new(chain: Arc<C>, settings: ExecutionSettings) -> Self {
        Self { chain, settings }
    }

    /// Carry out `intent` for `wallet`.
    ///
    /// Returns `Ok(None)` when there is nothing to send: a hold, or an
    /// amount that rounded down to zero.
    pub async fn execute(
        &self,
        wallet: &WalletRecord,
        intent: &TradeIntent,
    ) -> Result<Option<Confirmation>, ExecutionError> {
        if intent.kind == TradeKind::Hold {
            return Ok(None);
        }
        if intent.amount.is_zero() {
            tracing::warn!("{} for {} has a zero amount, nothing sent", intent.kind.as_str(), wallet.address());
            return Ok(None);
        }

        let confirmation = match intent.kind {
            TradeKind::Buy => self.buy(wallet, intent.amount).await?,
            TradeKind::SellAll | TradeKind::SellPartial => self.sell(wallet, intent.amount).await?,
            TradeKind::Hold => return Ok(None),
        };
        Ok(Some(confirmation))
    }

    async fn buy(&self, wallet: &WalletRecord, value: U256) -> Result<Confirmation, ExecutionError> {
        let path = vec![self.settings.quote_token, self.settings.token];
        let amount_out_min = self.amount_out_min(value, &path).await?;

        let swap = SwapRequest::NativeForTokens {
            value,
            amount_out_min,
            path,
            deadline: deadline(),
        };
        let pending = self.chain.send_swap(wallet.address(), self.settings.router, swap).await?;
        let confirmation = self.chain.confirm(pending).await?;

        tracing::info!(
            "Bought with {} native from {} ({})",
            format_units(value),
            wallet.address(),
            confirmation.hash
        );
        Ok(confirmation)
    }

    async fn sell(&self, wallet: &WalletRecord, amount: U256) -> Result<Confirmation, ExecutionError> {
        let owner = wallet.address();
        let (token, router) = (self.settings.token, self.settings.router);

        let approval = self.chain.send_approve(owner, token, router, amount).await?;
        let approval = self.chain.confirm(approval).await?;
        tracing::info!("Approved router for {} tokens ({})", format_units(amount), approval.hash);

        let allowance = self.chain.allowance(token, owner, router).await?;
        if allowance < amount {
            return Err(ExecutionError::AllowanceShortfall {
                allowance,
                required: amount,
            });
        }

        let path = vec![token, self.settings.quote_token];
        let amount_out_min = self.amount_out_min(amount, &path).await?;
        let gas_price = self.chain.gas_price().await?;

        let swap = SwapRequest::TokensForNative {
            amount_in: amount,
            amount_out_min,
            path,
            deadline: deadline(),
            gas_price: Some(gas_price),
        };
        let pending = self.chain.send_swap(owner, router, swap).await?;
        let confirmation = self.chain.confirm(pending).await?;

        tracing::info!(
            "Sold {} tokens from {} ({})",
            format_units(amount),
            owner,
            confirmation.hash
        );
        Ok(confirmation)
    }

    async fn amount_out_min(&self, amount_in: U256, path: &[Address]) -> Result<U256, ChainError> {
        let Some(bps) = self.settings.slippage_bps else {
            return Ok(U256::ZERO);
        };
        let amounts = self
            .chain
            .amounts_out(self.settings.router, amount_in, path.to_vec())
            .await?;
        let quoted = amounts.last().copied().unwrap_or_default();
        Ok(apply_slippage(quoted, bps))
    }
}

fn apply_slippage(quoted: U256, bps: u16) -> U256 {
    let keep = BPS_DENOMINATOR.saturating_sub(u64::from(bps));
    quoted.saturating_mul(U256::from(keep)) / U256::from(BPS_DENOMINATOR)
}

fn deadline() -> U256 {
    let at = Utc::now() + Duration::minutes(SWAP_DEADLINE_MINUTES);
    U256::from(at.timestamp().max(0) as u64)
}
