//! Error types for the headless runner.

use battle_core::error::BattleError;
use thiserror::Error;

/// Result type alias using [`RunnerError`].
pub type Result<T> = std::result::Result<T, RunnerError>;

/// Everything that can stop a headless run.
#[derive(Debug, Error)]
pub enum RunnerError {
    /// Battle setup or data loading failed.
    #[error(transparent)]
    Battle(#[from] BattleError),

    /// Reading or writing a results file failed.
    #[error("Failed to access '{path}': {source}")]
    Io {
        /// Path that failed.
        path: String,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Results could not be encoded or decoded.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The worker pool for a batch could not be built.
    #[error("Failed to build thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    /// A command-line value that cannot describe a run.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}
