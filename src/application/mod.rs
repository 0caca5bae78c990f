pub mod aggregator;
pub mod collector;
pub mod executor;
pub mod funding;
pub mod orchestrator;
pub mod statistics;

pub use aggregator::{AggregatorError, BalanceAggregator, BalanceQuery, DEFAULT_BATCH_SIZE};
pub use collector::{CollectionReport, FundCollector, SweepResult};
pub use executor::{ExecutionError, ExecutionSettings, TradeExecutor};
pub use funding::FundingPropagator;
pub use orchestrator::{
    HaltReason, IterationOutcome, OrchestratorError, OrchestratorSettings, OrchestratorState,
    SessionSummary, StopHandle, TradingOrchestrator,
};
pub use statistics::StatisticsService;
