//! Trading Orchestrator
//!
//! Random walk over the wallet list. Each iteration reads the active
//! wallet's balances, funds it from the last funded wallet when it is about
//! to trade, decides and executes a trade, then picks the next wallet
//! uniformly at random (with replacement) and sleeps a random interval.
//!
//! The only memory carried between iterations is `last_funded_index`.

use alloy::primitives::{Address, U256};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::RwLock;

use super::executor::TradeExecutor;
use super::funding::FundingPropagator;
use crate::domain::{
    decide, format_units, FundingOutcome, TradeBounds, TradeIntent, TradeKind,
    WalletBalanceSnapshot, WalletRecord,
};
use crate::ports::chain::{ChainError, ChainPort};

/// Pause before re-reading balances of the same wallet
pub const BALANCE_RETRY_DELAY: Duration = Duration::from_secs(5);
/// Pause after a failed funding transfer
pub const FUNDING_RETRY_DELAY: Duration = Duration::from_secs(1);

#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("Start address {0} not found in wallet list")]
    StartAddressNotFound(Address),
    #[error("Wallet list is empty")]
    NoWallets,
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Loop state; lives only in memory
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrchestratorState {
    pub current_index: usize,
    pub last_funded_index: Option<usize>,
}

/// Settings of the trading loop
#[derive(Debug, Clone, PartialEq)]
pub struct OrchestratorSettings {
    pub token: Address,
    pub min_native_balance: U256,
    pub bounds: TradeBounds,
    /// Inclusive pacing range in whole seconds
    pub interval_secs: (u64, u64),
    /// Stop cleanly after this many iterations
    pub max_iterations: Option<u64>,
}

/// Why a session ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HaltReason {
    /// The session's first wallet is at or below the minimum with nobody to fund it
    StartingWalletUnderfunded { address: Address, balance: U256 },
    /// The last funded wallet can no longer fund the next one
    PredecessorExhausted { balance: U256 },
    /// Stop was requested
    Stopped,
    IterationLimit,
}

impl std::fmt::Display for HaltReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HaltReason::StartingWalletUnderfunded { address, balance } => write!(
                f,
                "starting wallet {} underfunded ({})",
                address,
                format_units(*balance)
            ),
            HaltReason::PredecessorExhausted { balance } => {
                write!(f, "funding wallet exhausted ({})", format_units(*balance))
            }
            HaltReason::Stopped => write!(f, "stopped"),
            HaltReason::IterationLimit => write!(f, "iteration limit reached"),
        }
    }
}

/// What one iteration did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IterationOutcome {
    /// Balance read failed; the same wallet is retried
    BalanceRetry,
    Halted(HaltReason),
    /// Funding failed; the trade was abandoned
    FundingFailed,
    Held,
    /// The configured bounds could not produce an amount
    DecisionFailed { error: String },
    Executed(TradeIntent),
    /// The intent carried a zero amount; nothing was sent
    Skipped(TradeIntent),
    ExecutionFailed { intent: TradeIntent, error: String },
}

/// Counters returned by [`TradingOrchestrator::run`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSummary {
    pub iterations: u64,
    pub trades: u64,
    pub failures: u64,
    pub halt: HaltReason,
    pub final_state: OrchestratorState,
}

/// Cloneable stop switch for a running orchestrator
#[derive(Debug, Clone)]
pub struct StopHandle {
    is_running: Arc<RwLock<bool>>,
}

impl StopHandle {
    pub async fn stop(&self) {
        *self.is_running.write().await = false;
        tracing::info!("Stop signal sent to orchestrator");
    }
}

pub struct TradingOrchestrator<C: ChainPort> {
    chain: Arc<C>,
    wallets: Vec<WalletRecord>,
    funding: FundingPropagator<C>,
    executor: TradeExecutor<C>,
    settings: OrchestratorSettings,
    state: OrchestratorState,
    rng: StdRng,
    is_running: Arc<RwLock<bool>>,
}

impl<C: ChainPort> TradingOrchestrator<C> {
    /// Create the orchestrator positioned on `start`
    pub fn new(
        chain: Arc<C>,
        wallets: Vec<WalletRecord>,
        start: Address,
        executor: TradeExecutor<C>,
        settings: OrchestratorSettings,
    ) -> Result<Self, OrchestratorError> {
        if wallets.is_empty() {
            return Err(OrchestratorError::NoWallets);
        }
        let (lo, hi) = settings.interval_secs;
        if lo > hi {
            return Err(OrchestratorError::ConfigError(format!(
                "interval [{}, {}] is inverted",
                lo, hi
            )));
        }
        let current_index = wallets
            .iter()
            .position(|w| w.address() == start)
            .ok_or(OrchestratorError::StartAddressNotFound(start))?;

        let funding = FundingPropagator::new(chain.clone(), settings.min_native_balance);
        Ok(Self {
            chain,
            wallets,
            funding,
            executor,
            settings,
            state: OrchestratorState {
                current_index,
                last_funded_index: None,
            },
            rng: StdRng::from_entropy(),
            // Armed at construction so a stop sent before `run` is kept
            is_running: Arc::new(RwLock::new(true)),
        })
    }

    /// Replace the entropy-seeded RNG (deterministic tests)
    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = rng;
        self
    }

    pub fn state(&self) -> OrchestratorState {
        self.state
    }

    pub fn stop_handle(&self) -> StopHandle {
        StopHandle {
            is_running: Arc::clone(&self.is_running),
        }
    }

    /// Run iterations until a halt condition, a stop request or the iteration limit
    pub async fn run(&mut self) -> SessionSummary {
        tracing::info!(
            "Starting trading session at {} over {} wallets",
            self.wallets[self.state.current_index].address(),
            self.wallets.len()
        );

        let mut iterations = 0u64;
        let mut trades = 0u64;
        let mut failures = 0u64;

        let halt = loop {
            if !*self.is_running.read().await {
                break HaltReason::Stopped;
            }
            if self.settings.max_iterations.is_some_and(|max| iterations >= max) {
                break HaltReason::IterationLimit;
            }

            let outcome = self.step().await;
            iterations += 1;

            match outcome {
                IterationOutcome::Halted(reason) => break reason,
                IterationOutcome::Executed(_) => trades += 1,
                IterationOutcome::ExecutionFailed { .. }
                | IterationOutcome::DecisionFailed { .. }
                | IterationOutcome::FundingFailed => failures += 1,
                IterationOutcome::BalanceRetry
                | IterationOutcome::Held
                | IterationOutcome::Skipped(_) => {}
            }
        };

        *self.is_running.write().await = false;
        tracing::warn!("Trading session halted: {}", halt);
        SessionSummary {
            iterations,
            trades,
            failures,
            halt,
            final_state: self.state,
        }
    }

    /// One pass of the state machine, including the pacing sleep
    pub async fn step(&mut self) -> IterationOutcome {
        let index = self.state.current_index;
        let wallet = self.wallets[index].clone();

        // QueryingBalances
        let snapshot = match self.query_balances(wallet.address()).await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::error!("Balance query for {} failed: {}", wallet.address(), e);
                tokio::time::sleep(BALANCE_RETRY_DELAY).await;
                return IterationOutcome::BalanceRetry;
            }
        };
        tracing::info!("Wallet {} [{}]: {}", wallet.address(), index, snapshot);

        if self.state.last_funded_index.is_none() && snapshot.native <= self.settings.min_native_balance {
            return IterationOutcome::Halted(HaltReason::StartingWalletUnderfunded {
                address: wallet.address(),
                balance: snapshot.native,
            });
        }

        // Deciding
        let intent = match decide(&snapshot, &self.settings.bounds, &mut self.rng) {
            Ok(intent) => intent,
            Err(e) => {
                tracing::error!("Trade decision for {} failed: {}", wallet.address(), e);
                self.pace().await;
                return IterationOutcome::DecisionFailed {
                    error: e.to_string(),
                };
            }
        };

        let outcome = if intent.kind == TradeKind::Hold {
            tracing::info!(
                "Keep amount {} exceeds token balance {}, holding",
                format_units(intent.amount),
                format_units(snapshot.token)
            );
            if !snapshot.native.is_zero() {
                self.state.last_funded_index = Some(index);
            }
            IterationOutcome::Held
        } else {
            // Funding
            let predecessor = self.state.last_funded_index.map(|i| self.wallets[i].clone());
            match self.funding.apply(predecessor.as_ref(), &wallet).await {
                FundingOutcome::InsufficientPredecessorBalance { balance } => {
                    return IterationOutcome::Halted(HaltReason::PredecessorExhausted { balance });
                }
                FundingOutcome::TransferFailed { .. } => {
                    tokio::time::sleep(FUNDING_RETRY_DELAY).await;
                    self.pace().await;
                    return IterationOutcome::FundingFailed;
                }
                FundingOutcome::Transferred { .. } => {
                    self.state.last_funded_index = Some(index);
                }
                FundingOutcome::Skipped => {
                    if self.state.last_funded_index.is_none() {
                        self.state.last_funded_index = Some(index);
                    }
                }
            }

            // Executing
            match self.executor.execute(&wallet, &intent).await {
                Ok(Some(_)) => IterationOutcome::Executed(intent),
                Ok(None) => IterationOutcome::Skipped(intent),
                Err(e) => {
                    tracing::error!("{} for {} failed: {}", intent, wallet.address(), e);
                    IterationOutcome::ExecutionFailed {
                        intent,
                        error: e.to_string(),
                    }
                }
            }
        };

        self.pace().await;
        outcome
    }

    async fn query_balances(&self, owner: Address) -> Result<WalletBalanceSnapshot, ChainError> {
        let (native, token) = tokio::try_join!(
            self.chain.native_balance(owner),
            self.chain.token_balance(self.settings.token, owner),
        )?;
        Ok(WalletBalanceSnapshot::new(native, token))
    }

    /// Pick the next wallet and sleep the pacing interval
    async fn pace(&mut self) {
        self.state.current_index = self.rng.gen_range(0..self.wallets.len());
        let (lo, hi) = self.settings.interval_secs;
        let secs = self.rng.gen_range(lo..=hi);
        tracing::debug!("Next wallet index {}, waiting {}s", self.state.current_index, secs);
        tokio::time::sleep(Duration::from_secs(secs)).await;
    }
}
