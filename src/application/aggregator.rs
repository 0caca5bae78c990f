//! Batched Balance Aggregator
//!
//! Reads one balance per address through Multicall3 `aggregate`, in chunks
//! of at most `batch_size` calls. Chunks are issued together and joined.
//!
//! The output is always positionally aligned with the input: a failed chunk
//! or an undecodable entry degrades to zero and is logged with its address,
//! it never shortens or reorders the result.

use alloy::primitives::{Address, Bytes, U256};
use alloy::sol_types::{SolCall, SolValue};
use futures::future::join_all;
use std::sync::Arc;
use thiserror::Error;

use crate::domain::{BatchEntry, DecodeFailure};
use crate::ports::chain::{AggregateCall, ChainPort};
use crate::ports::contracts::{IMulticall3, IERC20};

/// Calls per aggregate, sized to stay under common call-data and gas caps
pub const DEFAULT_BATCH_SIZE: usize = 300;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AggregatorError {
    #[error("Batch size must be > 0")]
    ZeroBatchSize,
}

/// Which balance to read for every address
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BalanceQuery {
    /// ERC-20 `balanceOf` on the given token
    Token(Address),
    /// Native balance via the multicall contract's `getEthBalance`
    Native,
}

pub struct BalanceAggregator<C: ChainPort> {
    chain: Arc<C>,
    multicall: Address,
    batch_size: usize,
}

impl<C: ChainPort> BalanceAggregator<C> {
    pub fn new(chain: Arc<C>, multicall: Address) -> Self {
        Self {
            chain,
            multicall,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Result<Self, AggregatorError> {
        if batch_size == 0 {
            return Err(AggregatorError::ZeroBatchSize);
        }
        self.batch_size = batch_size;
        Ok(self)
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Balances in input order; degraded entries read as zero
    pub async fn aggregate(&self, addresses: &[Address], query: BalanceQuery) -> Vec<U256> {
        self.aggregate_entries(addresses, query)
            .await
            .iter()
            .map(BatchEntry::amount)
            .collect()
    }

    /// Per-address results, including why an entry degraded
    pub async fn aggregate_entries(
        &self,
        addresses: &[Address],
        query: BalanceQuery,
    ) -> Vec<BatchEntry> {
        let chunks = addresses.chunks(self.batch_size).collect::<Vec<_>>();
        tracing::debug!(
            "Aggregating {} addresses in {} chunks of up to {}",
            addresses.len(),
            chunks.len(),
            self.batch_size
        );

        let results = join_all(chunks.into_iter().map(|chunk| self.aggregate_chunk(chunk, query))).await;
        let entries = results.into_iter().flatten().collect::<Vec<_>>();

        let degraded = entries.iter().filter(|e| e.is_degraded()).count();
        if degraded > 0 {
            tracing::warn!("{} of {} balance entries degraded to zero", degraded, entries.len());
        }
        entries
    }

    async fn aggregate_chunk(&self, chunk: &[Address], query: BalanceQuery) -> Vec<BatchEntry> {
        let calls = chunk
            .iter()
            .map(|address| self.encode(query, *address))
            .collect::<Vec<_>>();

        match self.chain.aggregate(self.multicall, calls).await {
            Ok(results) => chunk
                .iter()
                .enumerate()
                .map(|(i, address)| decode(*address, results.get(i)))
                .collect(),
            Err(e) => {
                tracing::error!("Multicall chunk of {} calls failed: {}", chunk.len(), e);
                let reason = e.to_string();
                chunk
                    .iter()
                    .map(|address| degrade(*address, DecodeFailure::ChunkFailed(reason.clone())))
                    .collect()
            }
        }
    }

    fn encode(&self, query: BalanceQuery, owner: Address) -> AggregateCall {
        match query {
            BalanceQuery::Token(token) => AggregateCall {
                target: token,
                call_data: IERC20::balanceOfCall { owner }.abi_encode().into(),
            },
            BalanceQuery::Native => AggregateCall {
                target: self.multicall,
                call_data: IMulticall3::getEthBalanceCall { addr: owner }.abi_encode().into(),
            },
        }
    }
}

fn decode(address: Address, data: Option<&Bytes>) -> BatchEntry {
    let failure = match data {
        None => DecodeFailure::MissingResult,
        Some(data) if data.is_empty() => DecodeFailure::EmptyReturn,
        Some(data) => match U256::abi_decode(data) {
            Ok(value) => return BatchEntry::ok(address, value),
            Err(e) => DecodeFailure::Malformed(e.to_string()),
        },
    };
    degrade(address, failure)
}

/// Every degraded entry is reported with its own address
fn degrade(address: Address, failure: DecodeFailure) -> BatchEntry {
    tracing::error!("Balance for {} degraded to zero: {}", address, failure);
    BatchEntry::degraded(address, failure)
}
