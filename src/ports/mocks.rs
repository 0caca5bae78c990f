//! In-memory chain for tests
//!
//! `FakeChain` keeps balances in maps, applies transfers and swaps to them
//! and records every write so tests can assert on what was sent.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use alloy::primitives::{Address, Bytes, TxHash, U256};
use alloy::sol_types::{SolCall, SolValue};
use async_trait::async_trait;

use super::chain::{
    AggregateCall, ChainError, ChainPort, Confirmation, PendingTx, SwapRequest, TransferRequest,
};
use super::contracts::{IERC20, IMulticall3};

/// A write the fake accepted
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedWrite {
    Transfer {
        from: Address,
        request: TransferRequest,
    },
    Approve {
        owner: Address,
        token: Address,
        spender: Address,
        amount: U256,
    },
    Swap {
        from: Address,
        router: Address,
        swap: SwapRequest,
    },
}

#[derive(Debug, Default)]
struct FakeState {
    native: HashMap<Address, U256>,
    tokens: HashMap<(Address, Address), U256>,
    allowances: HashMap<(Address, Address, Address), U256>,
    symbols: HashMap<Address, String>,
    gas_price: u128,
    quote_ratio: (u64, u64),
    native_read_failures: usize,
    fail_gas_price: bool,
    fail_transfers: bool,
    fail_swaps: bool,
    ignore_approvals: bool,
    failing_chunks: HashSet<Address>,
    empty_returns: HashSet<Address>,
    writes: Vec<RecordedWrite>,
    aggregate_batches: Vec<usize>,
    native_reads: Vec<Address>,
    nonce: u64,
}

/// Recording in-memory [`ChainPort`]
#[derive(Debug, Clone)]
pub struct FakeChain {
    state: Arc<Mutex<FakeState>>,
}

impl Default for FakeChain {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeChain {
    pub fn new() -> Self {
        let state = FakeState {
            gas_price: 1_000_000_000,
            quote_ratio: (1, 1),
            ..FakeState::default()
        };
        Self { state: Arc::new(Mutex::new(state)) }
    }

    pub fn with_native(self, owner: Address, amount: U256) -> Self {
        self.state.lock().unwrap().native.insert(owner, amount);
        self
    }

    pub fn with_token_balance(self, token: Address, owner: Address, amount: U256) -> Self {
        self.state.lock().unwrap().tokens.insert((token, owner), amount);
        self
    }

    pub fn with_symbol(self, token: Address, symbol: &str) -> Self {
        self.state.lock().unwrap().symbols.insert(token, symbol.to_string());
        self
    }

    pub fn with_gas_price(self, gas_price: u128) -> Self {
        self.state.lock().unwrap().gas_price = gas_price;
        self
    }

    /// `amounts_out` returns `amount_in * num / den` as the final hop
    pub fn with_quote_ratio(self, num: u64, den: u64) -> Self {
        self.state.lock().unwrap().quote_ratio = (num, den);
        self
    }

    /// Fail the next `count` native balance reads
    pub fn fail_native_reads(self, count: usize) -> Self {
        self.state.lock().unwrap().native_read_failures = count;
        self
    }

    pub fn fail_gas_price(self) -> Self {
        self.state.lock().unwrap().fail_gas_price = true;
        self
    }

    pub fn fail_transfers(self) -> Self {
        self.state.lock().unwrap().fail_transfers = true;
        self
    }

    pub fn fail_swaps(self) -> Self {
        self.state.lock().unwrap().fail_swaps = true;
        self
    }

    /// Approvals are mined but never change the allowance
    pub fn ignore_approvals(self) -> Self {
        self.state.lock().unwrap().ignore_approvals = true;
        self
    }

    /// Any aggregate call that queries `owner` fails as a whole
    pub fn fail_chunk_containing(self, owner: Address) -> Self {
        self.state.lock().unwrap().failing_chunks.insert(owner);
        self
    }

    /// Aggregate returns `0x` for calls about `owner`
    pub fn empty_return_for(self, owner: Address) -> Self {
        self.state.lock().unwrap().empty_returns.insert(owner);
        self
    }

    pub fn writes(&self) -> Vec<RecordedWrite> {
        self.state.lock().unwrap().writes.clone()
    }

    pub fn transfers(&self) -> Vec<(Address, TransferRequest)> {
        self.writes()
            .into_iter()
            .filter_map(|w| match w {
                RecordedWrite::Transfer { from, request } => Some((from, request)),
                _ => None,
            })
            .collect()
    }

    pub fn swaps(&self) -> Vec<(Address, SwapRequest)> {
        self.writes()
            .into_iter()
            .filter_map(|w| match w {
                RecordedWrite::Swap { from, swap, .. } => Some((from, swap)),
                _ => None,
            })
            .collect()
    }

    /// Sizes of every aggregate call, in submission order
    pub fn aggregate_batches(&self) -> Vec<usize> {
        self.state.lock().unwrap().aggregate_batches.clone()
    }

    /// Addresses whose native balance was requested, in order
    pub fn native_reads(&self) -> Vec<Address> {
        self.state.lock().unwrap().native_reads.clone()
    }

    pub fn native_of(&self, owner: Address) -> U256 {
        self.state.lock().unwrap().native.get(&owner).copied().unwrap_or_default()
    }

    pub fn token_of(&self, token: Address, owner: Address) -> U256 {
        self.state
            .lock()
            .unwrap()
            .tokens
            .get(&(token, owner))
            .copied()
            .unwrap_or_default()
    }
}

impl FakeState {
    fn next_hash(&mut self) -> TxHash {
        self.nonce += 1;
        TxHash::from(U256::from(self.nonce).to_be_bytes::<32>())
    }

    fn debit_native(&mut self, owner: Address, amount: U256) -> Result<(), ChainError> {
        let balance = self.native.get(&owner).copied().unwrap_or_default();
        let remaining = balance
            .checked_sub(amount)
            .ok_or_else(|| ChainError::Submission("insufficient funds for gas * price + value".into()))?;
        self.native.insert(owner, remaining);
        Ok(())
    }

    fn answer(&self, call: &AggregateCall) -> Option<(Address, Bytes)> {
        let data = call.call_data.as_ref();
        if let Ok(decoded) = IERC20::balanceOfCall::abi_decode(data) {
            let amount = self.tokens.get(&(call.target, decoded.owner)).copied().unwrap_or_default();
            return Some((decoded.owner, Bytes::from(amount.abi_encode())));
        }
        if let Ok(decoded) = IMulticall3::getEthBalanceCall::abi_decode(data) {
            let amount = self.native.get(&decoded.addr).copied().unwrap_or_default();
            return Some((decoded.addr, Bytes::from(amount.abi_encode())));
        }
        None
    }
}

#[async_trait]
impl ChainPort for FakeChain {
    async fn native_balance(&self, owner: Address) -> Result<U256, ChainError> {
        let mut state = self.state.lock().unwrap();
        state.native_reads.push(owner);
        if state.native_read_failures > 0 {
            state.native_read_failures -= 1;
            return Err(ChainError::Rpc("connection reset".into()));
        }
        Ok(state.native.get(&owner).copied().unwrap_or_default())
    }

    async fn token_balance(&self, token: Address, owner: Address) -> Result<U256, ChainError> {
        Ok(self.token_of(token, owner))
    }

    async fn token_symbol(&self, token: Address) -> Result<String, ChainError> {
        self.state
            .lock()
            .unwrap()
            .symbols
            .get(&token)
            .cloned()
            .ok_or_else(|| ChainError::Contract(format!("symbol() reverted on {}", token)))
    }

    async fn allowance(
        &self,
        token: Address,
        owner: Address,
        spender: Address,
    ) -> Result<U256, ChainError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .allowances
            .get(&(token, owner, spender))
            .copied()
            .unwrap_or_default())
    }

    async fn gas_price(&self) -> Result<u128, ChainError> {
        let state = self.state.lock().unwrap();
        if state.fail_gas_price {
            return Err(ChainError::Rpc("eth_gasPrice timed out".into()));
        }
        Ok(state.gas_price)
    }

    async fn aggregate(
        &self,
        _multicall: Address,
        calls: Vec<AggregateCall>,
    ) -> Result<Vec<Bytes>, ChainError> {
        let mut state = self.state.lock().unwrap();
        state.aggregate_batches.push(calls.len());

        let mut results = Vec::with_capacity(calls.len());
        for call in &calls {
            match state.answer(call) {
                Some((owner, _)) if state.failing_chunks.contains(&owner) => {
                    return Err(ChainError::Contract("execution reverted".into()));
                }
                Some((owner, _)) if state.empty_returns.contains(&owner) => results.push(Bytes::new()),
                Some((_, data)) => results.push(data),
                None => results.push(Bytes::from_static(&[0xde, 0xad])),
            }
        }
        Ok(results)
    }

    async fn amounts_out(
        &self,
        _router: Address,
        amount_in: U256,
        path: Vec<Address>,
    ) -> Result<Vec<U256>, ChainError> {
        if amount_in.is_zero() {
            return Err(ChainError::Contract("INSUFFICIENT_INPUT_AMOUNT".into()));
        }
        let (num, den) = self.state.lock().unwrap().quote_ratio;
        let out = amount_in * U256::from(num) / U256::from(den);
        let mut amounts = vec![amount_in; path.len().saturating_sub(1)];
        amounts.push(out);
        Ok(amounts)
    }

    async fn send_transfer(
        &self,
        from: Address,
        request: TransferRequest,
    ) -> Result<PendingTx, ChainError> {
        let mut state = self.state.lock().unwrap();
        if state.fail_transfers {
            return Err(ChainError::Submission("nonce too low".into()));
        }
        let gas_cost = U256::from(request.gas_price) * U256::from(request.gas_limit);
        state.debit_native(from, request.value + gas_cost)?;
        *state.native.entry(request.to).or_default() += request.value;
        state.writes.push(RecordedWrite::Transfer { from, request });
        Ok(PendingTx::new(state.next_hash()))
    }

    async fn send_approve(
        &self,
        owner: Address,
        token: Address,
        spender: Address,
        amount: U256,
    ) -> Result<PendingTx, ChainError> {
        let mut state = self.state.lock().unwrap();
        if !state.ignore_approvals {
            state.allowances.insert((token, owner, spender), amount);
        }
        state.writes.push(RecordedWrite::Approve { owner, token, spender, amount });
        Ok(PendingTx::new(state.next_hash()))
    }

    async fn send_swap(
        &self,
        from: Address,
        router: Address,
        swap: SwapRequest,
    ) -> Result<PendingTx, ChainError> {
        let mut state = self.state.lock().unwrap();
        if state.fail_swaps {
            return Err(ChainError::Submission("execution reverted: PancakeRouter: EXPIRED".into()));
        }

        match &swap {
            SwapRequest::NativeForTokens { value, path, .. } => {
                let token = *path.last().ok_or_else(|| ChainError::Submission("empty path".into()))?;
                state.debit_native(from, *value)?;
                *state.tokens.entry((token, from)).or_default() += *value;
            }
            SwapRequest::TokensForNative { amount_in, path, .. } => {
                let token = *path.first().ok_or_else(|| ChainError::Submission("empty path".into()))?;
                let allowance = state.allowances.get(&(token, from, router)).copied().unwrap_or_default();
                if allowance < *amount_in {
                    return Err(ChainError::Submission("TRANSFER_FROM_FAILED".into()));
                }
                let held = state.tokens.get(&(token, from)).copied().unwrap_or_default();
                let remaining = held
                    .checked_sub(*amount_in)
                    .ok_or_else(|| ChainError::Submission("TRANSFER_FROM_FAILED".into()))?;
                state.tokens.insert((token, from), remaining);
                state.allowances.insert((token, from, router), allowance - *amount_in);
                *state.native.entry(from).or_default() += *amount_in;
            }
        }

        state.writes.push(RecordedWrite::Swap { from, router, swap });
        Ok(PendingTx::new(state.next_hash()))
    }

    async fn confirm(&self, tx: PendingTx) -> Result<Confirmation, ChainError> {
        let state = self.state.lock().unwrap();
        Ok(Confirmation {
            hash: tx.hash,
            block_number: Some(state.nonce),
            gas_used: 21_000,
        })
    }
}
