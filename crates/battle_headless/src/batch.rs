//! Batch battle runner for balance testing.
//!
//! Runs many seeds of the same matchup in parallel using rayon and
//! aggregates the outcomes.

use std::path::{Path, PathBuf};
use std::time::Instant;

use battle_core::battle::{BattleManager, Winner};
use battle_core::data::DataCatalog;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{Result, RunnerError};
use crate::runner::{run_battle, BattleReport, RunConfig};

/// Configuration for a batch run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Matchup; its seed is the first seed of the batch.
    pub run: RunConfig,
    /// Number of battles.
    pub count: u32,
    /// Worker threads (0 = rayon default).
    pub parallel: u32,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            run: RunConfig::default(),
            count: 100,
            parallel: 0,
        }
    }
}

impl BatchConfig {
    /// `count` battles of `run`, seeds counting up from `run.seed`.
    pub fn new(run: RunConfig, count: u32) -> Self {
        Self {
            run,
            count,
            ..Default::default()
        }
    }

    /// Set the worker thread count.
    pub fn with_parallel(mut self, threads: u32) -> Self {
        self.parallel = threads;
        self
    }

    /// Seed of the `index`-th battle.
    pub fn seed_for(&self, index: u32) -> u64 {
        self.run.seed.wrapping_add(u64::from(index))
    }
}

/// A battle that could not be set up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchError {
    /// Battle index.
    pub index: u32,
    /// Seed used.
    pub seed: u64,
    /// Error message.
    pub message: String,
}

/// Aggregate outcome of a batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    /// Battles completed.
    pub total_battles: u32,
    /// Side A wins.
    pub wins_a: u32,
    /// Side B wins.
    pub wins_b: u32,
    /// Draws.
    pub draws: u32,
    /// Battles that hit the tick cap.
    pub undecided: u32,
    /// Battles decided on health at the time limit.
    pub timed_out: u32,
    /// Side A win rate over completed battles.
    pub win_rate_a: f64,
    /// Side B win rate over completed battles.
    pub win_rate_b: f64,
    /// Average battle length in ticks.
    pub avg_duration_ticks: f64,
    /// Shortest battle.
    pub min_duration_ticks: u64,
    /// Longest battle.
    pub max_duration_ticks: u64,
}

impl BatchSummary {
    /// Aggregate a set of reports.
    #[must_use]
    pub fn from_reports(reports: &[BattleReport]) -> Self {
        if reports.is_empty() {
            return Self::default();
        }

        let mut summary = Self {
            total_battles: u32::try_from(reports.len()).unwrap_or(u32::MAX),
            min_duration_ticks: u64::MAX,
            ..Default::default()
        };

        let mut duration_sum = 0u64;
        for report in reports {
            match report.winner {
                Winner::SideA => summary.wins_a += 1,
                Winner::SideB => summary.wins_b += 1,
                Winner::Draw => summary.draws += 1,
                Winner::Undetermined => summary.undecided += 1,
            }
            if report.timed_out {
                summary.timed_out += 1;
            }

            duration_sum += report.ticks;
            summary.min_duration_ticks = summary.min_duration_ticks.min(report.ticks);
            summary.max_duration_ticks = summary.max_duration_ticks.max(report.ticks);
        }

        let total = f64::from(summary.total_battles);
        summary.win_rate_a = f64::from(summary.wins_a) / total;
        summary.win_rate_b = f64::from(summary.wins_b) / total;
        summary.avg_duration_ticks = duration_sum as f64 / total;
        summary
    }
}

/// Results from a batch run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchResults {
    /// Configuration used.
    pub config: BatchConfig,
    /// Per-battle reports, in seed order.
    pub reports: Vec<BattleReport>,
    /// Aggregate summary.
    pub summary: BatchSummary,
    /// Wall-clock runtime.
    pub duration_seconds: f64,
    /// Battles that failed to set up.
    pub errors: Vec<BatchError>,
}

impl BatchResults {
    /// Save results to a JSON file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let io_err = |source| RunnerError::Io {
            path: path.display().to_string(),
            source,
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json).map_err(io_err)
    }

    /// Load results from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path).map_err(|source| RunnerError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Ok(serde_json::from_str(&json)?)
    }
}

/// Run a batch of battles.
///
/// Battles that fail to set up are collected as [`BatchError`]s; only a
/// worker pool that cannot be built fails the whole batch.
pub fn run_batch(catalog: &DataCatalog, config: BatchConfig) -> Result<BatchResults> {
    let start = Instant::now();

    let mut builder = rayon::ThreadPoolBuilder::new();
    if config.parallel > 0 {
        builder = builder.num_threads(config.parallel as usize);
    }
    let pool = builder.build()?;

    info!(
        stage = %config.run.stage,
        army_a = %config.run.army_a,
        army_b = %config.run.army_b,
        count = config.count,
        threads = pool.current_num_threads(),
        "Starting batch run"
    );

    let outcomes: Vec<std::result::Result<BattleReport, BatchError>> = pool.install(|| {
        (0..config.count)
            .into_par_iter()
            .map(|index| {
                let seed = config.seed_for(index);
                let run = RunConfig {
                    seed,
                    ..config.run.clone()
                };
                run_battle(catalog, &run).map_err(|e| {
                    warn!(index, seed, error = %e, "Battle failed");
                    BatchError {
                        index,
                        seed,
                        message: e.to_string(),
                    }
                })
            })
            .collect()
    });

    let mut reports = Vec::with_capacity(outcomes.len());
    let mut errors = Vec::new();
    for outcome in outcomes {
        match outcome {
            Ok(report) => reports.push(report),
            Err(e) => errors.push(e),
        }
    }

    let summary = BatchSummary::from_reports(&reports);
    let duration_seconds = start.elapsed().as_secs_f64();

    info!(
        battles = reports.len(),
        failed = errors.len(),
        wins_a = summary.wins_a,
        wins_b = summary.wins_b,
        draws = summary.draws,
        duration_secs = format!("{duration_seconds:.1}"),
        "Batch complete"
    );

    Ok(BatchResults {
        config,
        reports,
        summary,
        duration_seconds,
        errors,
    })
}

/// Result of a determinism check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyReport {
    /// Matchup checked.
    pub config: RunConfig,
    /// Final state hash of each run.
    pub hashes: Vec<u64>,
    /// A snapshot taken mid-battle and restored finished identically.
    pub snapshot_consistent: bool,
    /// Every run matched.
    pub deterministic: bool,
}

/// Fight the same battle `runs` times and compare final hashes, then check
/// that a mid-battle snapshot resumes to the same end state.
pub fn verify_determinism(catalog: &DataCatalog, config: &RunConfig, runs: u32) -> Result<VerifyReport> {
    if runs < 2 {
        return Err(RunnerError::InvalidArgument("verify needs at least 2 runs".to_string()));
    }

    let hashes = (0..runs)
        .map(|_| run_battle(catalog, config).map(|r| r.final_state_hash))
        .collect::<Result<Vec<_>>>()?;

    let snapshot_consistent = snapshot_round_trip(catalog, config)?;
    let deterministic = snapshot_consistent && hashes.windows(2).all(|w| w[0] == w[1]);

    if !deterministic {
        warn!(seed = config.seed, ?hashes, snapshot_consistent, "Non-determinism detected");
    }

    Ok(VerifyReport {
        config: config.clone(),
        hashes,
        snapshot_consistent,
        deterministic,
    })
}

fn snapshot_round_trip(catalog: &DataCatalog, config: &RunConfig) -> Result<bool> {
    let mut battle = config.build(catalog)?;
    battle.start_battle();
    for _ in 0..config.max_ticks / 2 {
        battle.tick();
    }

    let mut restored = BattleManager::restore(&battle.snapshot()?)?;
    while battle.is_active() && battle.tick_count() < config.max_ticks {
        battle.tick();
        restored.tick();
    }
    Ok(battle.state_hash() == restored.state_hash())
}

/// Default location for batch results.
pub fn default_results_path(dir: &Path) -> PathBuf {
    dir.join("batch_results.json")
}
