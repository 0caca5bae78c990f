//! Statistics path: aggregate balances, reduce, price the token total.

use alloy::primitives::{Address, U256};
use std::sync::Arc;

use super::aggregator::{BalanceAggregator, BalanceQuery};
use crate::domain::{reduce, StatsReport};
use crate::ports::chain::{ChainError, ChainPort};

pub struct StatisticsService<C: ChainPort> {
    chain: Arc<C>,
    aggregator: BalanceAggregator<C>,
    router: Address,
    quote_token: Address,
}

impl<C: ChainPort> StatisticsService<C> {
    pub fn new(
        chain: Arc<C>,
        aggregator: BalanceAggregator<C>,
        router: Address,
        quote_token: Address,
    ) -> Self {
        Self {
            chain,
            aggregator,
            router,
            quote_token,
        }
    }

    /// Build the report for `addresses` holding `token`.
    ///
    /// `quote_symbol` of `None` reads the symbol of the quote token on chain.
    pub async fn collect(
        &self,
        addresses: &[Address],
        token: Address,
        quote_symbol: Option<String>,
    ) -> Result<StatsReport, ChainError> {
        let token_symbol = self.chain.token_symbol(token).await?;
        let quote_symbol = match quote_symbol {
            Some(symbol) => symbol,
            None => self.chain.token_symbol(self.quote_token).await?,
        };

        tracing::info!("Collecting {} balances for {} addresses", token_symbol, addresses.len());
        let (token_balances, native_balances) = tokio::join!(
            self.aggregator.aggregate(addresses, BalanceQuery::Token(token)),
            self.aggregator.aggregate(addresses, BalanceQuery::Native),
        );

        let tally = reduce(&token_balances, &native_balances);
        if tally.saturated {
            tracing::warn!("Balance totals exceeded uint256 and were clamped");
        }
        let token_value = self.quote_value(token, tally.total_token).await?;

        Ok(StatsReport {
            token_symbol,
            quote_symbol,
            tally,
            token_value,
        })
    }

    /// Router quote of `amount` along `[token, quote]`
    async fn quote_value(&self, token: Address, amount: U256) -> Result<U256, ChainError> {
        // Routers revert on a zero input amount
        if amount.is_zero() {
            return Ok(U256::ZERO);
        }
        let amounts = self
            .chain
            .amounts_out(self.router, amount, vec![token, self.quote_token])
            .await?;
        amounts
            .last()
            .copied()
            .ok_or_else(|| ChainError::Contract("getAmountsOut returned no amounts".to_string()))
    }
}
