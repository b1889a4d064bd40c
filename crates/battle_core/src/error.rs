//! Error types for battle setup and data loading.
//!
//! Only setup can fail. Per-tick conditions (no target, out of range,
//! cooling down) are ordinary states, not errors.

use thiserror::Error;

/// Result type alias using [`BattleError`].
pub type Result<T> = std::result::Result<T, BattleError>;

/// Top-level error type for battle setup and data errors.
#[derive(Debug, Error)]
pub enum BattleError {
    /// Unit type identifier not present in the unit table.
    #[error("Unknown unit type: {0}")]
    UnknownUnitType(String),

    /// Terrain identifier not present in the terrain table.
    #[error("Unknown terrain: {0}")]
    UnknownTerrain(String),

    /// Stage identifier not present in the stage table.
    #[error("Unknown stage: {0}")]
    UnknownStage(String),

    /// Preset archetype not present in the preset table.
    #[error("Unknown army preset: {0}")]
    UnknownPreset(String),

    /// A unit type config that can never take part in combat.
    #[error("Invalid unit config for '{kind}': {reason}")]
    InvalidUnitConfig {
        /// Unit type identifier.
        kind: String,
        /// What is wrong with it.
        reason: String,
    },

    /// A stage config that cannot host a battle.
    #[error("Invalid stage '{stage}': {reason}")]
    InvalidStage {
        /// Stage identifier.
        stage: String,
        /// What is wrong with it.
        reason: String,
    },

    /// Data file parsing error.
    #[error("Failed to parse data file '{path}': {message}")]
    DataParseError {
        /// Path to the file that failed to parse.
        path: String,
        /// Error message.
        message: String,
    },

    /// Data file could not be read.
    #[error("Failed to read '{path}': {message}")]
    Io {
        /// Path that failed.
        path: String,
        /// Error message.
        message: String,
    },

    /// Snapshot encode/decode failure.
    #[error("Snapshot serialization failed: {0}")]
    Serialization(String),

    /// Invalid battle state for the requested operation.
    #[error("Invalid battle state: {0}")]
    InvalidState(String),
}
