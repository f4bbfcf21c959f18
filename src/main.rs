//! Subscan main entry point
//!
//! This is the command-line interface for the Subscan storefront scanner.

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use subscan::config::{
    parsed_env, string_env, validate, validate_merge_config, Config, MergeConfig, ScanConfig,
    ShardConfig, ENV_CONCURRENCY, ENV_INPUT, ENV_OUTPUT, ENV_SHARD_COUNT, ENV_SHARD_INDEX,
};
use subscan::report::run_merge;
use subscan::scanner::run_scan;
use tracing_subscriber::EnvFilter;

/// Subscan: a sharded subscription-commerce storefront scanner
///
/// Subscan sweeps storefront rosters for subscription-provider signals,
/// confirms offerings against each store's structured catalog, and writes
/// per-shard artifacts that the merge stage folds into one final workbook.
#[derive(Parser, Debug)]
#[command(name = "subscan")]
#[command(version = "1.0.0")]
#[command(about = "A sharded subscription-commerce storefront scanner", long_about = None)]
struct Cli {
    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose", global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Scan this worker's shard of the store roster
    Scan(ScanArgs),

    /// Merge shard artifacts into the final workbook
    Merge(MergeArgs),
}

#[derive(Args, Debug)]
struct ScanArgs {
    /// Input roster CSV (or SUBSCAN_INPUT; defaults to stores.csv)
    #[arg(short, long, value_name = "FILE")]
    input: Option<PathBuf>,

    /// Directory shard artifacts land in (or SUBSCAN_OUTPUT; defaults to results)
    #[arg(short, long, value_name = "DIR")]
    output: Option<PathBuf>,

    /// TOML signature table replacing the built-in providers
    #[arg(long, value_name = "FILE")]
    signatures: Option<PathBuf>,

    /// This worker's 0-based shard slot (or SUBSCAN_SHARD_INDEX)
    #[arg(long, value_name = "N")]
    shard_index: Option<usize>,

    /// Total number of parallel workers (or SUBSCAN_SHARD_COUNT)
    #[arg(long, value_name = "K")]
    shard_count: Option<usize>,

    /// Maximum scans in flight at once (or SUBSCAN_CONCURRENCY)
    #[arg(long, value_name = "N")]
    concurrency: Option<usize>,
}

#[derive(Args, Debug)]
struct MergeArgs {
    /// Directory searched for chunk artifacts (also checks its chunks/ subdirectory)
    #[arg(short, long, value_name = "DIR", default_value = "results")]
    dir: PathBuf,

    /// Directory the final workbook lands in (defaults to the search directory)
    #[arg(short, long, value_name = "DIR")]
    output: Option<PathBuf>,

    /// Declared shard total, for missing-shard reporting
    #[arg(long, value_name = "K")]
    shard_count: Option<usize>,

    /// Per-shard domain span, for missing-range estimates
    #[arg(long, value_name = "N")]
    shard_size: Option<usize>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    match cli.command {
        Commands::Scan(args) => handle_scan(args).await,
        Commands::Merge(args) => handle_merge(args),
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("subscan=info,warn"),
            1 => EnvFilter::new("subscan=debug,info"),
            2 => EnvFilter::new("subscan=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the scan subcommand: assembles configuration from flags and
/// environment, then runs this worker's shard
async fn handle_scan(args: ScanArgs) -> anyhow::Result<()> {
    let config = build_scan_config(args)?;

    tracing::info!(
        "Scanning shard {} of {} from {}",
        config.shard.index,
        config.shard.count,
        config.input_path.display()
    );

    match run_scan(config).await {
        Ok(path) => {
            println!("✓ Shard artifact written to: {}", path.display());
            Ok(())
        }
        Err(e) => {
            tracing::error!("Scan failed: {}", e);
            Err(e.into())
        }
    }
}

/// Handles the merge subcommand: aggregates whatever shard artifacts exist
fn handle_merge(args: MergeArgs) -> anyhow::Result<()> {
    let output_dir = args.output.unwrap_or_else(|| args.dir.clone());
    let config = MergeConfig {
        search_dir: args.dir,
        output_dir,
        shard_count: args.shard_count,
        shard_size: args.shard_size,
    };
    validate_merge_config(&config).context("invalid merge configuration")?;

    match run_merge(&config) {
        Ok(path) => {
            println!("✓ Final workbook written to: {}", path.display());
            Ok(())
        }
        Err(e) => {
            tracing::error!("Merge failed: {}", e);
            Err(e.into())
        }
    }
}

/// Folds CLI flags over `SUBSCAN_*` variables over defaults
fn build_scan_config(args: ScanArgs) -> anyhow::Result<Config> {
    let input_path = match args.input {
        Some(path) => path,
        None => string_env(ENV_INPUT)?
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("stores.csv")),
    };
    let output_dir = match args.output {
        Some(path) => path,
        None => string_env(ENV_OUTPUT)?
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("results")),
    };

    let shard = ShardConfig {
        index: resolve(args.shard_index, ENV_SHARD_INDEX)?.unwrap_or(0),
        count: resolve(args.shard_count, ENV_SHARD_COUNT)?.unwrap_or(1),
    };

    let mut scan = ScanConfig::default();
    if let Some(concurrency) = resolve(args.concurrency, ENV_CONCURRENCY)? {
        scan.concurrency = concurrency;
    }

    let config = Config {
        input_path,
        output_dir,
        signature_file: args.signatures,
        shard,
        scan,
    };
    validate(&config).context("invalid scan configuration")?;
    Ok(config)
}

/// A flag value when given, otherwise the environment variable
fn resolve(flag: Option<usize>, variable: &str) -> anyhow::Result<Option<usize>> {
    match flag {
        Some(value) => Ok(Some(value)),
        None => Ok(parsed_env(variable)?),
    }
}
