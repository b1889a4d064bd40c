//! Headless battle runner.
//!
//! Fights preset battles without graphics and prints JSON results.
//!
//! # Usage
//!
//! ```bash
//! # One battle
//! cargo run -p battle_headless -- run --stage plains --army-a balanced --army-b defensive --seed 7
//!
//! # Balance batch
//! cargo run -p battle_headless -- batch --count 1000 --output results/
//!
//! # Determinism check
//! cargo run -p battle_headless -- verify --runs 5
//! ```
//!
//! Reports go to stdout as JSON, logs to stderr.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use battle_headless::batch::default_results_path;
use battle_headless::runner::DEFAULT_MAX_TICKS;
use battle_headless::{load_catalog, run_batch, run_battle, verify_determinism, BatchConfig, Result, RunConfig};

#[derive(Parser)]
#[command(name = "battle_headless")]
#[command(about = "Headless tactical battle runner for balance testing and CI")]
#[command(version)]
struct Cli {
    /// Enable verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Data directory with units.ron, terrain.ron, stages.ron and presets.ron
    #[arg(long, global = true)]
    data: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Matchup options shared by every command.
#[derive(Args)]
struct MatchupArgs {
    /// Stage id
    #[arg(long, default_value = "plains")]
    stage: String,

    /// Preset for side A
    #[arg(long, default_value = "balanced")]
    army_a: String,

    /// Preset for side B
    #[arg(long, default_value = "offensive")]
    army_b: String,

    /// Deployment seed (first seed for batches)
    #[arg(long, default_value = "0")]
    seed: u64,

    /// Stop a battle after this many ticks
    #[arg(long, default_value_t = DEFAULT_MAX_TICKS)]
    max_ticks: u64,
}

impl MatchupArgs {
    fn into_config(self) -> RunConfig {
        RunConfig::new(&self.stage, &self.army_a, &self.army_b)
            .with_seed(self.seed)
            .with_max_ticks(self.max_ticks)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Fight one battle and print its report
    Run {
        #[command(flatten)]
        matchup: MatchupArgs,
    },

    /// Fight many seeds of one matchup for balance testing
    Batch {
        #[command(flatten)]
        matchup: MatchupArgs,

        /// Number of battles to run
        #[arg(short, long, default_value = "100")]
        count: u32,

        /// Maximum parallel battles (0 = auto)
        #[arg(short, long, default_value = "0")]
        parallel: u32,

        /// Directory to save full results in
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Verify determinism by fighting the same seed several times
    Verify {
        #[command(flatten)]
        matchup: MatchupArgs,

        /// Number of verification runs
        #[arg(short, long, default_value = "5")]
        runs: u32,
    },
}

fn main() {
    let cli = Cli::parse();

    // Logs go to stderr; stdout is for reports
    let level = if cli.verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };
    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let outcome = match cli.command {
        Commands::Run { matchup } => cmd_run(cli.data, matchup.into_config()),
        Commands::Batch {
            matchup,
            count,
            parallel,
            output,
        } => cmd_batch(cli.data, matchup.into_config(), count, parallel, output),
        Commands::Verify { matchup, runs } => cmd_verify(cli.data, &matchup.into_config(), runs),
    };

    match outcome {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            tracing::error!(error = %e, "Run failed");
            eprintln!("FATAL: {e}");
            std::process::exit(1);
        }
    }
}

/// Fight one battle
fn cmd_run(data: Option<PathBuf>, config: RunConfig) -> Result<bool> {
    let catalog = load_catalog(data.as_deref())?;
    let report = run_battle(&catalog, &config)?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(true)
}

/// Run a balance batch
fn cmd_batch(
    data: Option<PathBuf>,
    run: RunConfig,
    count: u32,
    parallel: u32,
    output: Option<PathBuf>,
) -> Result<bool> {
    let catalog = load_catalog(data.as_deref())?;
    let results = run_batch(&catalog, BatchConfig::new(run, count).with_parallel(parallel))?;

    if let Some(dir) = output {
        let path = default_results_path(&dir);
        results.save(&path)?;
        eprintln!("Results saved to: {}", path.display());
    }

    let summary = &results.summary;
    eprintln!("\n{}", "=".repeat(50));
    eprintln!("BATCH COMPLETE");
    eprintln!("{}", "=".repeat(50));
    eprintln!("Battles fought: {}", summary.total_battles);
    if !results.errors.is_empty() {
        eprintln!("Battles FAILED: {}", results.errors.len());
        for error in results.errors.iter().take(10) {
            eprintln!("  Battle {} (seed {}): {}", error.index, error.seed, error.message);
        }
    }
    eprintln!("Duration: {:.1}s", results.duration_seconds);
    eprintln!(
        "Side A {:.1}% / Side B {:.1}% / draws {}",
        summary.win_rate_a * 100.0,
        summary.win_rate_b * 100.0,
        summary.draws
    );

    println!("{}", serde_json::to_string_pretty(summary)?);
    Ok(results.errors.is_empty())
}

/// Verify determinism
fn cmd_verify(data: Option<PathBuf>, config: &RunConfig, runs: u32) -> Result<bool> {
    tracing::info!(stage = %config.stage, seed = config.seed, runs, "Verifying determinism");

    let catalog = load_catalog(data.as_deref())?;
    let report = verify_determinism(&catalog, config, runs)?;
    println!("{}", serde_json::to_string_pretty(&report)?);

    if report.deterministic {
        eprintln!("PASS: All {runs} runs produced identical results");
    } else {
        eprintln!("FAIL: Non-determinism detected!");
    }
    Ok(report.deterministic)
}
