//! Chain port
//!
//! Every on-chain read and write the rotation engine performs goes through
//! [`ChainPort`]. Writes return a [`PendingTx`] handle; callers decide
//! whether and when to wait on it with [`ChainPort::confirm`].

use alloy::primitives::{Address, Bytes, TxHash, U256};
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ChainError {
    #[error("RPC request failed: {0}")]
    Rpc(String),
    #[error("Contract call failed: {0}")]
    Contract(String),
    #[error("Transaction submission failed: {0}")]
    Submission(String),
    #[error("Transaction {0} reverted")]
    Reverted(TxHash),
    #[error("Confirmation failed for {hash}: {reason}")]
    Confirmation { hash: TxHash, reason: String },
    #[error("Invalid RPC URL: {0}")]
    InvalidUrl(String),
}

/// Handle to a submitted, not yet confirmed transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingTx {
    pub hash: TxHash,
}

impl PendingTx {
    pub fn new(hash: TxHash) -> Self {
        Self { hash }
    }
}

/// Receipt summary of a mined transaction that succeeded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Confirmation {
    pub hash: TxHash,
    pub block_number: Option<u64>,
    pub gas_used: u64,
}

/// One read call inside a multicall aggregate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregateCall {
    pub target: Address,
    pub call_data: Bytes,
}

/// Plain native transfer with explicit gas terms
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferRequest {
    pub to: Address,
    pub value: U256,
    pub gas_limit: u64,
    pub gas_price: u128,
}

/// Router swap, always paid to and from the sending wallet
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SwapRequest {
    /// `swapExactETHForTokens`
    NativeForTokens {
        value: U256,
        amount_out_min: U256,
        path: Vec<Address>,
        deadline: U256,
    },
    /// `swapExactTokensForETH`
    TokensForNative {
        amount_in: U256,
        amount_out_min: U256,
        path: Vec<Address>,
        deadline: U256,
        gas_price: Option<u128>,
    },
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChainPort: Send + Sync {
    /// Native currency balance
    async fn native_balance(&self, owner: Address) -> Result<U256, ChainError>;

    /// ERC-20 `balanceOf`
    async fn token_balance(&self, token: Address, owner: Address) -> Result<U256, ChainError>;

    /// ERC-20 `symbol`
    async fn token_symbol(&self, token: Address) -> Result<String, ChainError>;

    /// ERC-20 `allowance`
    async fn allowance(
        &self,
        token: Address,
        owner: Address,
        spender: Address,
    ) -> Result<U256, ChainError>;

    /// Current network gas price in wei
    async fn gas_price(&self) -> Result<u128, ChainError>;

    /// Multicall3 `aggregate`; returns raw return data in call order
    async fn aggregate(
        &self,
        multicall: Address,
        calls: Vec<AggregateCall>,
    ) -> Result<Vec<Bytes>, ChainError>;

    /// Router `getAmountsOut`
    async fn amounts_out(
        &self,
        router: Address,
        amount_in: U256,
        path: Vec<Address>,
    ) -> Result<Vec<U256>, ChainError>;

    /// Submit a native transfer signed by `from`
    async fn send_transfer(
        &self,
        from: Address,
        request: TransferRequest,
    ) -> Result<PendingTx, ChainError>;

    /// Submit an ERC-20 `approve` signed by `owner`
    async fn send_approve(
        &self,
        owner: Address,
        token: Address,
        spender: Address,
        amount: U256,
    ) -> Result<PendingTx, ChainError>;

    /// Submit a router swap signed by `from`
    async fn send_swap(
        &self,
        from: Address,
        router: Address,
        swap: SwapRequest,
    ) -> Result<PendingTx, ChainError>;

    /// Wait until the transaction is mined; a reverted receipt is an error
    async fn confirm(&self, tx: PendingTx) -> Result<Confirmation, ChainError>;
}
