//! Headless battle runner for balance runs and CI verification.
//!
//! Runs preset battles without any presentation layer:
//!
//! - **Single runs**: fight one matchup and report the outcome as JSON
//! - **Batches**: fight many seeds of a matchup in parallel and aggregate
//! - **Verification**: check that a seed replays to the same state hash
//!
//! # Output
//!
//! - **stdout**: JSON reports
//! - **stderr**: logs (human-readable)
//!
//! # Example
//!
//! ```bash
//! cargo run -p battle_headless -- run --stage forest --army-a balanced --army-b offensive
//! cargo run -p battle_headless -- batch --count 500 --output results/
//! cargo run -p battle_headless -- verify --seed 12345 --runs 5
//! ```

pub mod batch;
pub mod error;
pub mod runner;

pub use batch::{run_batch, verify_determinism, BatchConfig, BatchResults, BatchSummary, VerifyReport};
pub use error::{Result, RunnerError};
pub use runner::{load_catalog, run_battle, BattleReport, RunConfig, SideReport};
