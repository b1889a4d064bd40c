//! Data-driven configuration tables.
//!
//! Unit types, terrains, stages and army presets are authored as RON
//! files and decoded once, before a battle starts. The simulation only
//! ever sees the decoded values.

pub mod catalog;
pub mod preset_data;
pub mod stage_data;
pub mod terrain_data;
pub mod unit_data;

pub use catalog::DataCatalog;
pub use preset_data::{GroupTemplate, PresetTable};
pub use stage_data::{DeploymentPoint, StageConfig, StageTable};
pub use terrain_data::{TerrainConfig, TerrainTable};
pub use unit_data::{UnitTable, UnitTypeConfig};
