use alloy::network::{EthereumWallet, ReceiptResponse, TransactionBuilder};
use alloy::primitives::{Address, Bytes, U256};
use alloy::providers::{DynProvider, PendingTransactionBuilder, Provider, ProviderBuilder};
use alloy::rpc::types::TransactionRequest;
use async_trait::async_trait;
use tracing::debug;
use url::Url;

use crate::domain::WalletRecord;
use crate::ports::chain::{
    AggregateCall, ChainError, ChainPort, Confirmation, PendingTx, SwapRequest, TransferRequest,
};
use crate::ports::contracts::{IMulticall3, IUniswapV2Router02, IERC20};

/// JSON-RPC chain client with every loaded wallet registered as a signer.
///
/// Writes pick their signer by setting `from`; a write from an address that
/// was not registered fails at submission.
#[derive(Clone)]
pub struct EvmClient {
    provider: DynProvider,
}

impl EvmClient {
    /// Connect over HTTP. An empty wallet slice gives a read-only client.
    pub fn connect(rpc_url: &str, wallets: &[WalletRecord]) -> Result<Self, ChainError> {
        let url: Url = rpc_url
            .parse()
            .map_err(|e| ChainError::InvalidUrl(format!("{}: {}", rpc_url, e)))?;

        let provider = match wallets.split_first() {
            None => ProviderBuilder::new().connect_http(url).erased(),
            Some((first, rest)) => {
                let mut wallet = EthereumWallet::new(first.signer().clone());
                for record in rest {
                    wallet.register_signer(record.signer().clone());
                }
                ProviderBuilder::new().wallet(wallet).connect_http(url).erased()
            }
        };

        debug!("Connected chain client to {} with {} signers", rpc_url, wallets.len());
        Ok(Self { provider })
    }

    async fn submit(&self, tx: TransactionRequest) -> Result<PendingTx, ChainError> {
        let pending = self
            .provider
            .send_transaction(tx)
            .await
            .map_err(|e| ChainError::Submission(e.to_string()))?;
        Ok(PendingTx::new(*pending.tx_hash()))
    }
}

#[async_trait]
impl ChainPort for EvmClient {
    async fn native_balance(&self, owner: Address) -> Result<U256, ChainError> {
        self.provider
            .get_balance(owner)
            .await
            .map_err(|e| ChainError::Rpc(e.to_string()))
    }

    async fn token_balance(&self, token: Address, owner: Address) -> Result<U256, ChainError> {
        IERC20::new(token, self.provider.clone())
            .balanceOf(owner)
            .call()
            .await
            .map_err(|e| ChainError::Contract(e.to_string()))
    }

    async fn token_symbol(&self, token: Address) -> Result<String, ChainError> {
        IERC20::new(token, self.provider.clone())
            .symbol()
            .call()
            .await
            .map_err(|e| ChainError::Contract(e.to_string()))
    }

    async fn allowance(
        &self,
        token: Address,
        owner: Address,
        spender: Address,
    ) -> Result<U256, ChainError> {
        IERC20::new(token, self.provider.clone())
            .allowance(owner, spender)
            .call()
            .await
            .map_err(|e| ChainError::Contract(e.to_string()))
    }

    async fn gas_price(&self) -> Result<u128, ChainError> {
        self.provider
            .get_gas_price()
            .await
            .map_err(|e| ChainError::Rpc(e.to_string()))
    }

    async fn aggregate(
        &self,
        multicall: Address,
        calls: Vec<AggregateCall>,
    ) -> Result<Vec<Bytes>, ChainError> {
        let calls = calls
            .into_iter()
            .map(|c| IMulticall3::Call {
                target: c.target,
                callData: c.call_data,
            })
            .collect::<Vec<_>>();

        let result = IMulticall3::new(multicall, self.provider.clone())
            .aggregate(calls)
            .call()
            .await
            .map_err(|e| ChainError::Contract(e.to_string()))?;
        Ok(result.returnData)
    }

    async fn amounts_out(
        &self,
        router: Address,
        amount_in: U256,
        path: Vec<Address>,
    ) -> Result<Vec<U256>, ChainError> {
        IUniswapV2Router02::new(router, self.provider.clone())
            .getAmountsOut(amount_in, path)
            .call()
            .await
            .map_err(|e| ChainError::Contract(e.to_string()))
    }

    async fn send_transfer(
        &self,
        from: Address,
        request: TransferRequest,
    ) -> Result<PendingTx, ChainError> {
        let tx = TransactionRequest::default()
            .with_from(from)
            .with_to(request.to)
            .with_value(request.value)
            .with_gas_limit(request.gas_limit)
            .with_gas_price(request.gas_price);
        self.submit(tx).await
    }

    async fn send_approve(
        &self,
        owner: Address,
        token: Address,
        spender: Address,
        amount: U256,
    ) -> Result<PendingTx, ChainError> {
        let pending = IERC20::new(token, self.provider.clone())
            .approve(spender, amount)
            .from(owner)
            .send()
            .await
            .map_err(|e| ChainError::Submission(e.to_string()))?;
        Ok(PendingTx::new(*pending.tx_hash()))
    }

    async fn send_swap(
        &self,
        from: Address,
        router: Address,
        swap: SwapRequest,
    ) -> Result<PendingTx, ChainError> {
        let router = IUniswapV2Router02::new(router, self.provider.clone());
        let sent = match swap {
            SwapRequest::NativeForTokens {
                value,
                amount_out_min,
                path,
                deadline,
            } => {
                router
                    .swapExactETHForTokens(amount_out_min, path, from, deadline)
                    .from(from)
                    .value(value)
                    .send()
                    .await
            }
            SwapRequest::TokensForNative {
                amount_in,
                amount_out_min,
                path,
                deadline,
                gas_price,
            } => {
                let mut call = router
                    .swapExactTokensForETH(amount_in, amount_out_min, path, from, deadline)
                    .from(from);
                if let Some(gas_price) = gas_price {
                    call = call.gas_price(gas_price);
                }
                call.send().await
            }
        };

        let pending = sent.map_err(|e| ChainError::Submission(e.to_string()))?;
        Ok(PendingTx::new(*pending.tx_hash()))
    }

    async fn confirm(&self, tx: PendingTx) -> Result<Confirmation, ChainError> {
        let receipt = PendingTransactionBuilder::new(self.provider.root().clone(), tx.hash)
            .get_receipt()
            .await
            .map_err(|e| ChainError::Confirmation {
                hash: tx.hash,
                reason: e.to_string(),
            })?;

        if !receipt.status() {
            return Err(ChainError::Reverted(tx.hash));
        }

        Ok(Confirmation {
            hash: tx.hash,
            block_number: receipt.block_number(),
            gas_used: receipt.gas_used(),
        })
    }
}
