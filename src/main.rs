//! fetchbench - URL download benchmark across concurrency strategies
//!
//! Downloads a list of URLs once per strategy (sequential, thread pool,
//! process pool, cooperative async) and reports sites downloaded, bytes
//! received and wall-clock time for each.
//!
//! Exit codes:
//!   0 - All selected strategies ran (individual URL failures are tallied)
//!   1 - Invalid arguments, bad config, or a run could not be carried out

mod cli;
mod client;
mod config;
mod error;
mod harness;
mod models;
mod report;

use anyhow::{Context, Result};
use chrono::Utc;
use cli::{Args, OutputFormat};
use client::ReqwestClient;
use config::{Config, CONFIG_FILE};
use harness::{FetchAggregator, ProcessSpawner};
use models::RunReport;
use std::time::Duration;
use tracing::{debug, error, info};
use tracing_subscriber::FmtSubscriber;

fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Worker processes speak JSON on stdout; everything else goes to stderr
    if args.worker {
        init_logging(args.log_level());
        return run_worker();
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Config comes first: it can raise the log level
    let mut config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    };
    config.merge_with_args(&args);

    // Initialize logging
    init_logging(config.log_level(args.quiet));

    info!("fetchbench v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    match run_benchmarks(&config, args.quiet) {
        Ok(()) => Ok(()),
        Err(e) => {
            error!("Benchmark failed: {:#}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .fetchbench.toml.
fn handle_init_config() -> Result<()> {
    let path = std::path::Path::new(CONFIG_FILE);

    if path.exists() {
        eprintln!("⚠️  {} already exists. Remove it first or edit it manually.", CONFIG_FILE);
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content).with_context(|| format!("Failed to write {}", CONFIG_FILE))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE);
    println!("   Edit it to customize strategies, pool sizes and target URLs.");
    Ok(())
}

/// Initialize logging at the given level.
fn init_logging(level: tracing::Level) {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

/// Serve one process-pool job: a `WorkerJob` on stdin, outcome lines on stdout.
fn run_worker() -> Result<()> {
    let stdin = std::io::stdin().lock();
    let stdout = std::io::stdout().lock();

    harness::serve_worker(
        |job| ReqwestClient::new(job.timeout_secs.map(Duration::from_secs)),
        stdin,
        stdout,
    )
    .context("Worker failed")
}

/// Run every configured strategy over the target list and print the report.
fn run_benchmarks(config: &Config, quiet: bool) -> Result<()> {
    let targets = config.target_list();
    let strategies = config.strategies();
    let timeout = config.timeout();

    info!(
        "{} targets, {} strategies, timeout: {}",
        targets.len(),
        strategies.len(),
        timeout.map_or_else(|| "none".to_string(), |t| format!("{}s", t.as_secs()))
    );

    let aggregator = FetchAggregator::new(ReqwestClient::new(timeout), ProcessSpawner::current_exe()?)
        .with_timeout(timeout)
        .with_progress(config.general.progress && !quiet);

    let mut runs = Vec::with_capacity(strategies.len());
    for strategy in strategies {
        let started_at = Utc::now();
        let result = aggregator
            .run(&targets, strategy)
            .with_context(|| format!("{} run aborted", strategy))?;

        let run = RunReport::new(strategy, started_at, targets.len(), result);
        if config.general.format == OutputFormat::Text {
            println!("{}", report::summary_line(&run.strategy, &run.result));
        }
        runs.push(run);
    }

    if config.general.format == OutputFormat::Json {
        println!("{}", report::generate_json_report(&runs)?);
    }

    Ok(())
}

/// Load configuration from file or use defaults.
///
/// Runs before logging is initialized, so problems go straight to stderr.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => Ok(config),
        Ok(None) => Ok(Config::default()),
        Err(e) => {
            eprintln!("⚠️  Failed to load config, using defaults: {:#}", e);
            Ok(Config::default())
        }
    }
}
