//! Wallet Rotor - multi-wallet EVM toolkit

use alloy::primitives::Address;
use anyhow::{bail, Context, Result};
use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::{fmt, EnvFilter};

use wallet_rotor::adapters::cli::{CliApp, CollectCmd, Command, GenerateCmd, StatsCmd, TradeCmd};
use wallet_rotor::adapters::wallets::{load_addresses, load_wallets, write_wallets, WalletGenerator};
use wallet_rotor::adapters::EvmClient;
use wallet_rotor::application::{
    BalanceAggregator, ExecutionSettings, FundCollector, OrchestratorSettings, StatisticsService,
    TradeExecutor, TradingOrchestrator,
};
use wallet_rotor::config::{load_config, Config};
use wallet_rotor::domain::{format_units, StatsReport};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists (ROTOR_RPC_URL may live here)
    dotenvy::dotenv().ok();

    let app = CliApp::parse();
    init_logging(app.debug, app.quiet)?;

    match app.command {
        Command::Generate(cmd) => generate_command(cmd).await,
        Command::Stats(cmd) => stats_command(cmd).await,
        Command::Trade(cmd) => trade_command(cmd).await,
        Command::Collect(cmd) => collect_command(cmd).await,
    }
}

fn init_logging(debug: bool, quiet: bool) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => {
            let level = if debug {
                "debug"
            } else if quiet {
                "warn"
            } else {
                "info"
            };
            // Transport crates are chatty at debug
            let transport = if debug { "info" } else { level };
            EnvFilter::new(format!(
                "{level},hyper={transport},reqwest={transport},alloy_transport_http={transport}"
            ))
        }
    };

    fmt().with_env_filter(filter).init();
    Ok(())
}

fn expand(path: &Path) -> PathBuf {
    PathBuf::from(shellexpand::tilde(&path.to_string_lossy()).to_string())
}

fn load(path: &Path) -> Result<Config> {
    load_config(expand(path))
        .with_context(|| format!("Failed to load configuration from {}", path.display()))
}

fn parse_address(label: &str, value: &str) -> Result<Address> {
    value
        .trim()
        .parse::<Address>()
        .with_context(|| format!("Invalid {} address: {}", label, value))
}

async fn generate_command(cmd: GenerateCmd) -> Result<()> {
    let kind = cmd.address_type.into();
    let generator = match cmd.mnemonic.as_deref() {
        Some(phrase) => WalletGenerator::from_phrase(kind, phrase)
            .context("Failed to read mnemonic")?,
        None => {
            let generator = WalletGenerator::random(kind).context("Failed to create mnemonic")?;
            // Shown once on stdout, never logged
            println!("Mnemonic: {}", generator.phrase());
            generator
        }
    };

    let wallets = match cmd.spread_hours {
        Some(hours) => {
            let mut rng = StdRng::from_entropy();
            generator
                .derive_spread(cmd.count, hours, &mut rng)
                .await
                .context("Failed to derive addresses")?
        }
        None => {
            let wallets = generator
                .derive_many(cmd.count)
                .context("Failed to derive addresses")?;
            for (i, wallet) in wallets.iter().enumerate() {
                println!("{}: {}", i, wallet.address);
            }
            wallets
        }
    };

    if let Some(file) = cmd.file {
        let path = expand(&file);
        write_wallets(&path, &wallets)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        println!("Wrote {} {} wallets to {}", wallets.len(), generator.kind().as_str(), path.display());
    }
    Ok(())
}

async fn stats_command(cmd: StatsCmd) -> Result<()> {
    let config = load(&cmd.config)?;
    let path = expand(&cmd.wallets);
    let addresses = load_addresses(&path)
        .with_context(|| format!("Failed to load wallet list {}", path.display()))?;

    let (token, quote_symbol) = match cmd.token.as_deref() {
        Some(value) => (parse_address("token", value)?, None),
        None => (config.token()?, Some(config.tokens.quote_symbol.clone())),
    };

    let chain = Arc::new(
        EvmClient::connect(&config.chain.get_rpc_url(), &[])
            .context("Failed to create chain client")?,
    );
    let aggregator = BalanceAggregator::new(chain.clone(), config.multicall3()?);
    let service = StatisticsService::new(chain, aggregator, config.router()?, config.quote_token()?);

    let report = service
        .collect(&addresses, token, quote_symbol)
        .await
        .context("Failed to collect statistics")?;

    if cmd.json {
        println!("{}", serde_json::to_string_pretty(&report_json(&report))?);
    } else {
        println!("{}", report);
    }
    Ok(())
}

fn report_json(report: &StatsReport) -> serde_json::Value {
    serde_json::json!({
        "addresses": report.address_count(),
        "token_symbol": report.token_symbol,
        "quote_symbol": report.quote_symbol,
        "holders": report.tally.holders,
        "empty": report.tally.empty,
        "total_token": format_units(report.tally.total_token),
        "total_native": format_units(report.tally.total_native),
        "token_value": format_units(report.token_value),
        "total_value": format_units(report.total_value()),
        "saturated": report.tally.saturated,
    })
}

async fn trade_command(cmd: TradeCmd) -> Result<()> {
    let config = load(&cmd.config)?;
    let path = expand(&cmd.wallets);
    let wallets = load_wallets(&path)
        .with_context(|| format!("Failed to load wallets from {}", path.display()))?;
    let start = parse_address("start", &cmd.start)?;

    let chain = Arc::new(
        EvmClient::connect(&config.chain.get_rpc_url(), &wallets)
            .context("Failed to create chain client")?,
    );

    let executor = TradeExecutor::new(
        chain.clone(),
        ExecutionSettings {
            token: config.token()?,
            quote_token: config.quote_token()?,
            router: config.router()?,
            slippage_bps: config.router.slippage_bps,
        },
    );
    let settings = OrchestratorSettings {
        token: config.token()?,
        min_native_balance: config.min_native_wei()?,
        bounds: config.trade_bounds()?,
        interval_secs: config.interval(),
        max_iterations: cmd.max_iterations,
    };

    let mut orchestrator = TradingOrchestrator::new(chain, wallets, start, executor, settings)
        .context("Failed to create orchestrator")?;

    // Handle Ctrl+C
    let stop = orchestrator.stop_handle();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        tracing::info!("Received shutdown signal");
        stop.stop().await;
    });

    let summary = orchestrator.run().await;
    println!(
        "Session ended: {} ({} iterations, {} trades, {} failures)",
        summary.halt, summary.iterations, summary.trades, summary.failures
    );
    Ok(())
}

async fn collect_command(cmd: CollectCmd) -> Result<()> {
    let config = load(&cmd.config)?;
    let receiver = config
        .receiver(cmd.to.as_deref())
        .context("No receiver for collection")?;
    let path = expand(&cmd.wallets);
    let wallets = load_wallets(&path)
        .with_context(|| format!("Failed to load wallets from {}", path.display()))?;

    let chain = Arc::new(
        EvmClient::connect(&config.chain.get_rpc_url(), &wallets)
            .context("Failed to create chain client")?,
    );
    let report = FundCollector::new(chain, receiver).collect(&wallets).await;

    println!(
        "Collected {} into {}: {} swept, {} skipped, {} failed",
        format_units(report.total_swept()),
        receiver,
        report.swept_count(),
        report.skipped_count(),
        report.failed_count()
    );
    if report.failed_count() == report.results.len() && !wallets.is_empty() {
        bail!("Every collection transfer failed");
    }
    Ok(())
}
