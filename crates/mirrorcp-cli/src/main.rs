//! mirrorcp - one-way directory mirroring tool
//!
//! Keeps a replica folder byte-identical to a source folder, either once or
//! repeatedly at a fixed interval, logging every action to a log file and to
//! the console.

use anyhow::{Context, Result};
use clap::Parser;
use mirrorcp_config::{Interval, MirrorConfig};
use mirrorcp_sync::{SyncRequest, Synchronizer, TracingSink};
use mirrorcp_types::SyncStats;
use std::path::{Path, PathBuf};
use tracing::{error, info};

mod display;

use display::RunSummary;

/// mirrorcp - one-way directory mirroring tool
#[derive(Parser)]
#[command(
    name = "mirrorcp",
    version = env!("CARGO_PKG_VERSION"),
    about = "One-way directory mirroring tool",
    long_about = "mirrorcp keeps a replica folder identical to a source folder.\n\
                  Each pass copies new and changed files (compared by SHA-256 content\n\
                  digest), removes entries that no longer exist in the source, and logs\n\
                  every action to the log file and the console."
)]
struct Cli {
    /// Path to the source folder
    source: PathBuf,

    /// Path to the replica folder (created if it does not exist)
    replica: PathBuf,

    /// Path to the log file (must be outside the source and replica folders)
    log_file: PathBuf,

    /// Seconds between passes; 0 performs a single pass and exits
    interval: Interval,

    /// Perform exactly one pass and exit, regardless of the interval
    #[arg(long)]
    once: bool,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Quiet mode - only errors on the console
    #[arg(short, long)]
    quiet: bool,

    /// Verbose mode - detailed output
    #[arg(short, long)]
    verbose: bool,

    /// Print the final run summary as JSON
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = MirrorConfig::new(&cli.source, &cli.replica, &cli.log_file, cli.interval)
        .with_run_once(cli.once);
    // Fatal setup errors are reported before any pass runs
    config.validate().context("invalid configuration")?;

    let _guard = init_logging(&cli.log_file, cli.debug, cli.quiet, cli.verbose)?;
    info!("mirrorcp v{} starting", env!("CARGO_PKG_VERSION"));

    let summary = run_driver(&config).await?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else if !cli.quiet {
        display::print_run_summary(&summary);
    }

    Ok(())
}

/// Initialize the console and log-file tracing layers
///
/// The returned guard must stay alive for the duration of the process so
/// buffered log lines are flushed on shutdown.
fn init_logging(
    log_file: &Path,
    debug: bool,
    quiet: bool,
    verbose: bool,
) -> Result<tracing_appender::non_blocking::WorkerGuard> {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

    let console_level = if debug {
        "debug"
    } else if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "info"
    };
    let file_level = if debug { "debug" } else { "info" };

    let console_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(console_level))
        .unwrap();
    let file_filter = EnvFilter::try_new(file_level).unwrap();

    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file)
        .with_context(|| format!("could not open log file '{}'", log_file.display()))?;
    let (file_writer, guard) = tracing_appender::non_blocking(file);

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .with_writer(std::io::stdout)
                .with_filter(console_filter),
        )
        .with(
            fmt::layer()
                .with_target(false)
                .with_ansi(false)
                .with_writer(file_writer)
                .with_filter(file_filter),
        )
        .init();

    Ok(guard)
}

/// Run passes until the configuration says stop or the user interrupts
///
/// Passes never overlap: the sleep starts only after a pass has fully
/// completed. A failed pass is logged and the loop continues; only fatal
/// setup-class errors abort the run.
async fn run_driver(config: &MirrorConfig) -> Result<RunSummary> {
    let engine = Synchronizer::new();
    let sink = TracingSink;
    let mut totals = SyncStats::new();
    let mut passes: u64 = 0;

    loop {
        let request = SyncRequest::new(&config.source, &config.replica);
        match engine.sync(&request, &sink).await {
            Ok(report) => {
                totals.merge(&report.stats);
                passes += 1;
            }
            // Setup failures surface on the first pass. After that the loop
            // keeps ticking: the next pass re-converges whatever a failed
            // one left behind.
            Err(e) if passes == 0 && e.is_fatal() => return Err(e.into()),
            Err(e) => {
                error!("Pass failed: {}", e);
                passes += 1;
            }
        }

        if config.runs_once() {
            break;
        }

        info!("Next pass in {}", config.interval);
        tokio::select! {
            _ = tokio::time::sleep(config.interval.as_duration()) => {}
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted, shutting down after {} passes", passes);
                break;
            }
        }
    }

    Ok(RunSummary { passes, totals })
}
