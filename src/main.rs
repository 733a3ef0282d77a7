//! Mintwatch - social feed token monitor
//!
//! Polls a fixed set of accounts for new posts, filters them by keyword,
//! extracts base58 token mint addresses and for each match attempts a
//! swap through Jupiter and sends an email alert through Resend. A
//! persisted ledger of processed post ids guarantees each post is acted
//! on at most once across restarts.
//!
//! Exit codes:
//!   0 - Clean shutdown (ctrl-c, or --once cycle finished)
//!   1 - Startup error (bad arguments, bad configuration)

mod actuate;
mod cli;
mod config;
mod error;
mod extract;
mod feed;
mod keyword;
mod ledger;
mod models;
mod monitor;
mod notify;
mod scheduler;

use actuate::{JupiterActuator, SwapConfig};
use anyhow::{Context, Result};
use cli::Args;
use config::Config;
use feed::TwitterFeed;
use ledger::LedgerStore;
use monitor::{Monitor, MonitorSettings};
use notify::ResendNotifier;
use scheduler::Scheduler;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse_args();

    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    init_logging(&args);

    info!("Mintwatch v{}", env!("CARGO_PKG_VERSION"));

    match run(args).await {
        Ok(()) => Ok(()),
        Err(e) => {
            error!("Startup failed: {:#}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default mintwatch.toml.
fn handle_init_config() -> Result<()> {
    let path = std::path::Path::new("mintwatch.toml");

    if path.exists() {
        eprintln!("⚠️  mintwatch.toml already exists. Remove it first or edit it manually.");
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content).context("Failed to write mintwatch.toml")?;

    println!("✅ Created mintwatch.toml with default settings.");
    println!("   Fill in accounts, keywords and the notify section;");
    println!("   credentials come from MINTWATCH_* environment variables.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args) {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(args.log_level())
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded config from mintwatch.toml");
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => Err(e),
    }
}

/// Wire everything up and run until shutdown (or for one cycle with
/// --once). Configuration problems are fatal here, before any cycle.
async fn run(args: Args) -> Result<()> {
    let mut config = load_config(&args)?;
    config.merge_with_args(&args);
    config.validate().context("invalid configuration")?;

    if config.monitor.keywords.is_empty() {
        warn!("Keyword list is empty; no post will ever match");
    }

    let store = LedgerStore::new(&config.ledger.path);
    let ledger = store.load();
    println!(
        "📒 Ledger: {} ({} posts processed)",
        config.ledger.path.display(),
        ledger.len()
    );

    let feed = TwitterFeed::new(
        config.feed.api_base.clone(),
        config
            .feed
            .bearer_token
            .clone()
            .context("feed bearer token missing")?,
        Duration::from_secs(config.feed.timeout_seconds),
    )?;

    let notifier = ResendNotifier::new(
        config.notify.api_base.clone(),
        config
            .notify
            .api_key
            .clone()
            .context("Resend API key missing")?,
        config.notify.from.clone(),
        Duration::from_secs(config.notify.timeout_seconds),
    )?;

    let swap_config = SwapConfig {
        quote_api: config.actuate.quote_api.clone(),
        price_api: config.actuate.price_api.clone(),
        rpc_endpoint: config.actuate.rpc_endpoint.clone(),
        slippage_bps: config.actuate.slippage_bps,
        timeout: Duration::from_secs(config.actuate.timeout_seconds),
    };
    let actuator = JupiterActuator::new(
        swap_config,
        config
            .actuate
            .wallet_key
            .as_deref()
            .context("wallet key missing")?,
    )
    .context("invalid wallet key")?;
    info!("Swap wallet: {}", actuator.wallet_address());

    let settings = MonitorSettings {
        accounts: config.monitor.accounts.clone(),
        keywords: config.monitor.keywords.clone(),
        fetch_count: config.monitor.fetch_count,
        notify_recipient: config.notify.recipient.clone(),
        actuate_amount_usd: config.actuate.amount_usd,
    };
    let monitor = Monitor::new(
        Arc::new(feed),
        Arc::new(notifier),
        Arc::new(actuator),
        store,
        settings,
    );

    println!(
        "🔎 Monitoring {} accounts for {} keywords every {}s",
        config.monitor.accounts.len(),
        config.monitor.keywords.len(),
        config.monitor.poll_interval_seconds
    );

    if args.once {
        let mut ledger = ledger;
        let stats = monitor.run_cycle(&mut ledger).await;
        println!(
            "✅ Cycle complete: {} posts seen, {} matched, {} ids in ledger",
            stats.posts_seen,
            stats.posts_matched,
            ledger.len()
        );
        return Ok(());
    }

    let scheduler = Scheduler::new(
        monitor,
        Duration::from_secs(config.monitor.poll_interval_seconds),
    );
    let ledger = scheduler.run(ledger).await;

    println!("👋 Stopped with {} posts processed", ledger.len());
    Ok(())
}
