//! Polymarket tail hunter entry point.

use std::net::SocketAddr;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use tail_hunter::api::{create_router, AppState};
use tail_hunter::config::Config;
use tail_hunter::error::BotError;
use tail_hunter::exchange::PolymarketExchange;
use tail_hunter::metrics;
use tail_hunter::signing::{address_from_private_key, signature_type_name};
use tail_hunter::tail::{RetryPolicy, ScanLoop, TailScanner};
use tail_hunter::utils::shutdown_signal;

/// Polymarket tail-outcome hunter.
#[derive(Parser, Debug)]
#[command(name = "tail-hunter")]
#[command(about = "Buys low-probability Polymarket outcomes with a fixed downside per order")]
#[command(version)]
struct Args {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,

    /// Run in dry-run mode (no real orders).
    #[arg(long)]
    dry_run: Option<bool>,

    /// HTTP server port for health/status.
    #[arg(short, long)]
    port: Option<u16>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the scan loop and status server (default).
    Run {
        /// Run in dry-run mode (no real orders).
        #[arg(long)]
        dry_run: Option<bool>,

        /// HTTP server port for health/status.
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Run a single dry-run scan cycle and print what would be ordered.
    Scan,

    /// Check configuration validity.
    CheckConfig,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI arguments
    let args = Args::parse();

    // Initialize logging
    let filter = if args.verbose {
        EnvFilter::new("tail_hunter=debug,info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    // Initialize metrics
    metrics::init_metrics();

    // Handle subcommands
    match args.command {
        Some(Command::CheckConfig) => cmd_check_config().await,
        Some(Command::Scan) => cmd_scan().await,
        Some(Command::Run { dry_run, port }) => cmd_run(dry_run, port).await,
        None => cmd_run(args.dry_run, args.port).await,
    }
}

/// Load and validate configuration, applying CLI overrides.
fn load_config(dry_run_override: Option<bool>) -> Result<Config, BotError> {
    let mut config = Config::load().inspect_err(|e| {
        error!("Failed to load configuration: {}", e);
    })?;

    if let Some(dry_run) = dry_run_override {
        config.dry_run = dry_run;
    }

    config.validate().map_err(|e| {
        error!("Invalid configuration: {}", e);
        BotError::InvalidConfig(e)
    })?;

    Ok(config)
}

/// Check configuration validity.
async fn cmd_check_config() -> anyhow::Result<()> {
    println!("======================================================================");
    println!("TAIL HUNTER - CONFIGURATION CHECK");
    println!("======================================================================");

    // Load configuration
    print!("Loading configuration... ");
    let config = match Config::load() {
        Ok(c) => {
            println!("OK");
            c
        }
        Err(e) => {
            println!("FAILED");
            println!("  Error: {}", e);
            return Err(anyhow::anyhow!("Configuration load failed"));
        }
    };

    // Validate configuration
    print!("Validating configuration... ");
    match config.validate() {
        Ok(()) => println!("OK"),
        Err(e) => {
            println!("FAILED");
            println!("  Error: {}", e);
            return Err(anyhow::anyhow!("Configuration validation failed"));
        }
    }

    // Check private key
    print!("Checking private key... ");
    match address_from_private_key(&config.polymarket_private_key) {
        Ok(addr) => {
            println!("OK");
            println!("  Wallet address: {}", addr);
        }
        Err(e) => {
            println!("FAILED");
            println!("  Error: {}", e);
            return Err(anyhow::anyhow!("Private key invalid"));
        }
    }

    // Show configuration summary
    println!("----------------------------------------------------------------------");
    println!("Configuration Summary:");
    println!(
        "  Signature Type: {} ({})",
        config.polymarket_signature_type,
        signature_type_name(config.polymarket_signature_type)
    );

    if config.polymarket_signature_type != 0 {
        match &config.polymarket_funder {
            Some(funder) => println!("  Funder Address: {}", funder),
            None => println!("  WARNING: proxy wallets require POLYMARKET_FUNDER to be set!"),
        }
    }

    println!(
        "  API Credentials: {}",
        if config.has_api_credentials() { "Provided" } else { "Derived at startup" }
    );
    println!("  CLOB URL: {}", config.polymarket_clob_url);
    println!("  Chain ID: {}", config.chain_id);
    println!("  Price Band: [{}, {}]", config.price_min, config.price_max);
    println!("  Downside Limit: ${} per order", config.downside_limit);
    println!("  Target Outcome: {}", config.target_outcome);
    match config.max_cycle_spend {
        Some(cap) => println!("  Max Cycle Spend: ${}", cap),
        None => println!("  Max Cycle Spend: unlimited"),
    }
    println!("  Scan Interval: {}s", config.scan_interval_seconds);
    println!("  Error Backoff: {}s", config.error_backoff_seconds);
    match config.max_market_pages {
        Some(max) => println!("  Max Market Pages: {}", max),
        None => println!("  Max Market Pages: unbounded"),
    }
    println!("  Dry Run: {}", config.dry_run);
    println!("======================================================================");
    println!("CONFIGURATION CHECK PASSED");
    println!("======================================================================");

    Ok(())
}

/// Run a single scan cycle in dry-run mode.
async fn cmd_scan() -> anyhow::Result<()> {
    let config = load_config(Some(true))?;

    let exchange = PolymarketExchange::read_only(&config)?;
    let scanner = TailScanner::from_config(exchange, &config);

    let report = scanner.scan_cycle().await?;

    println!("======================================================================");
    println!("TAIL HUNTER - SCAN RESULT");
    println!("======================================================================");
    println!("  Markets listed: {}", report.markets_listed);
    println!("  Markets evaluated: {}", report.markets_evaluated);
    println!("  Skipped (inactive/closed): {}", report.not_tradable);
    println!("  No {} token: {}", config.target_outcome, report.no_target_token);
    println!("  Price failures: {}", report.price_failures);
    println!("  Outside band: {}", report.outside_band);
    println!("----------------------------------------------------------------------");
    println!("  Tail outcomes found: {}", report.opportunities.len());
    for opp in &report.opportunities {
        println!(
            "  - {} @ ${} x {} (${})",
            opp.label, opp.price, opp.quantity.round_dp(2), opp.notional.round_dp(2)
        );
        println!("    Token: {}", opp.token_id);
    }
    println!("======================================================================");

    Ok(())
}

/// Run the scan loop until shutdown.
async fn cmd_run(dry_run_override: Option<bool>, port_override: Option<u16>) -> anyhow::Result<()> {
    // Load configuration
    info!("Loading configuration...");
    let config = load_config(dry_run_override)?;
    let port = port_override.unwrap_or(config.port);

    info!("Configuration loaded successfully");
    info!("Mode: {}", if config.dry_run { "SIMULATION" } else { "LIVE TRADING" });
    info!("Price band: [{}, {}]", config.price_min, config.price_max);
    info!("Downside limit: ${} per order", config.downside_limit);
    info!("Target outcome: {}", config.target_outcome);

    // Connect to the exchange; authenticates only for live trading
    let exchange = PolymarketExchange::connect(&config).await?;
    info!(can_trade = exchange.can_trade(), "Exchange connected");

    // Create app state
    let app_state = AppState::new(config.dry_run);

    // Start HTTP server
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;
    info!("HTTP server listening on {}", addr);

    let router = create_router(app_state.clone());

    // Spawn HTTP server
    let server_handle = tokio::spawn(async move {
        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await
    });

    info!("========================================");
    info!("TAIL HUNTER STARTED");
    info!("========================================");

    let scanner = TailScanner::from_config(exchange, &config);
    let scan_loop =
        ScanLoop::new(scanner, RetryPolicy::from_config(&config)).with_app_state(app_state);

    let stats = scan_loop.run_until(shutdown_signal()).await;

    match tokio::time::timeout(Duration::from_secs(5), server_handle).await {
        Ok(Ok(Err(e))) => warn!("HTTP server error: {}", e),
        Ok(Err(e)) => warn!("HTTP server task failed: {}", e),
        Err(_) => warn!("HTTP server did not stop in time"),
        Ok(Ok(Ok(()))) => {}
    }

    info!("========================================");
    info!("TAIL HUNTER STOPPED");
    info!("  Cycles completed: {}", stats.cycles_completed);
    info!("  Cycles failed: {}", stats.cycles_failed);
    info!("  Orders placed: {}", stats.orders_placed);
    info!("  Orders simulated: {}", stats.orders_simulated);
    info!("  Orders failed: {}", stats.orders_failed);
    info!("  Notional: ${}", stats.notional);
    info!("========================================");

    Ok(())
}
