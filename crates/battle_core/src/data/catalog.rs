//! Loaded data tables and fail-fast lookups.

use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;

use super::preset_data::{GroupTemplate, PresetTable};
use super::stage_data::{StageConfig, StageTable};
use super::terrain_data::{TerrainConfig, TerrainTable};
use super::unit_data::{UnitTable, UnitTypeConfig};
use crate::battlefield::{INSET_BOTTOM, INSET_LEFT, INSET_RIGHT, INSET_TOP};
use crate::error::{BattleError, Result};
use crate::math::Fixed;
use crate::unit::collision_radius_for;
use crate::unit_kind::UnitKind;

const UNITS_FILE: &str = "units.ron";
const TERRAIN_FILE: &str = "terrain.ron";
const STAGES_FILE: &str = "stages.ron";
const PRESETS_FILE: &str = "presets.ron";

/// Largest stage side and deployment coordinate magnitude accepted.
pub const MAX_STAGE_EXTENT: u32 = 1_000_000;

/// Largest hit-point pool accepted for a unit type.
pub const MAX_UNIT_HP: u32 = 1_000_000;

const BUILTIN_UNITS: &str = include_str!("../../../../assets/data/units.ron");
const BUILTIN_TERRAIN: &str = include_str!("../../../../assets/data/terrain.ron");
const BUILTIN_STAGES: &str = include_str!("../../../../assets/data/stages.ron");
const BUILTIN_PRESETS: &str = include_str!("../../../../assets/data/presets.ron");

/// Every table a battle needs, decoded and validated.
#[derive(Debug, Clone, Default)]
pub struct DataCatalog {
    units: UnitTable,
    terrains: TerrainTable,
    stages: StageTable,
    presets: PresetTable,
}

impl DataCatalog {
    /// Assemble a catalog from already-decoded tables.
    #[must_use]
    pub fn new(
        units: UnitTable,
        terrains: TerrainTable,
        stages: StageTable,
        presets: PresetTable,
    ) -> Self {
        Self {
            units,
            terrains,
            stages,
            presets,
        }
    }

    /// The tables shipped in `assets/data`, compiled into the binary.
    pub fn builtin() -> Result<Self> {
        Self::from_ron_strs(BUILTIN_UNITS, BUILTIN_TERRAIN, BUILTIN_STAGES, BUILTIN_PRESETS)
    }

    /// Decode the four tables from RON text and validate them.
    pub fn from_ron_strs(units: &str, terrain: &str, stages: &str, presets: &str) -> Result<Self> {
        let catalog = Self {
            units: parse(UNITS_FILE, units)?,
            terrains: parse(TERRAIN_FILE, terrain)?,
            stages: parse(STAGES_FILE, stages)?,
            presets: parse(PRESETS_FILE, presets)?,
        };
        catalog.validate()?;
        Ok(catalog)
    }

    /// Load `units.ron`, `terrain.ron`, `stages.ron` and `presets.ron`
    /// from a directory and validate them.
    pub fn load_from_dir(dir: &Path) -> Result<Self> {
        if !dir.is_dir() {
            return Err(BattleError::Io {
                path: dir.display().to_string(),
                message: "not a directory".to_string(),
            });
        }

        let catalog = Self {
            units: load_file(&dir.join(UNITS_FILE))?,
            terrains: load_file(&dir.join(TERRAIN_FILE))?,
            stages: load_file(&dir.join(STAGES_FILE))?,
            presets: load_file(&dir.join(PRESETS_FILE))?,
        };
        catalog.validate()?;

        tracing::info!(
            dir = %dir.display(),
            units = catalog.units.len(),
            terrains = catalog.terrains.len(),
            stages = catalog.stages.len(),
            presets = catalog.presets.len(),
            "Loaded battle data"
        );
        Ok(catalog)
    }

    /// Resolve the data directory.
    ///
    /// Checks, in order:
    /// 1. Environment variable `BATTLE_DATA_DIR`
    /// 2. `./assets/data` (repo root)
    /// 3. `../../assets/data` (running from a crate directory)
    pub fn default_data_dir() -> Option<PathBuf> {
        if let Ok(dir) = std::env::var("BATTLE_DATA_DIR") {
            let path = PathBuf::from(dir);
            if path.is_dir() {
                return Some(path);
            }
        }

        ["assets/data", "../../assets/data"]
            .into_iter()
            .map(PathBuf::from)
            .find(|path| path.is_dir())
    }

    /// Check every cross-cutting invariant the simulation relies on.
    ///
    /// A unit type with `range <= 0` can never strike once collisions have
    /// pushed it apart from its target, so it is rejected here rather than
    /// producing a battle that cannot end.
    pub fn validate(&self) -> Result<()> {
        for (kind, config) in &self.units {
            let invalid = |reason: &str| BattleError::InvalidUnitConfig {
                kind: kind.to_string(),
                reason: reason.to_string(),
            };

            if config.hp == 0 {
                return Err(invalid("hp must be positive"));
            }
            if config.hp > MAX_UNIT_HP {
                return Err(invalid(&format!("hp must not exceed {MAX_UNIT_HP}")));
            }
            if config.size <= Fixed::ZERO {
                return Err(invalid("size must be positive"));
            }
            if config.range <= Fixed::ZERO {
                return Err(invalid("range must be positive or the unit can never attack"));
            }
            if config.speed < Fixed::ZERO {
                return Err(invalid("speed must not be negative"));
            }
            if config.attack_cooldown < Fixed::ZERO {
                return Err(invalid("attack_cooldown must not be negative"));
            }
            if config.sight_range <= collision_radius_for(config.size) {
                return Err(invalid("sight_range must reach past the unit's own body"));
            }

            // Collisions hold bodies exactly touching; the raw range must
            // still reach every possible target from there.
            let own = collision_radius_for(config.size);
            for (other_kind, other) in &self.units {
                if own + collision_radius_for(other.size) >= config.range {
                    return Err(invalid(&format!(
                        "range cannot reach a touching {other_kind}"
                    )));
                }
            }
        }

        for (id, stage) in &self.stages {
            let invalid = |reason: String| BattleError::InvalidStage {
                stage: id.clone(),
                reason,
            };

            if !self.terrains.contains_key(&stage.terrain) {
                return Err(invalid(format!("unknown terrain '{}'", stage.terrain)));
            }
            if stage.width <= INSET_LEFT + INSET_RIGHT || stage.height <= INSET_TOP + INSET_BOTTOM {
                return Err(invalid(format!(
                    "{}x{} leaves no playable area",
                    stage.width, stage.height
                )));
            }
            if stage.width > MAX_STAGE_EXTENT || stage.height > MAX_STAGE_EXTENT {
                return Err(invalid(format!(
                    "{}x{} exceeds the {MAX_STAGE_EXTENT} unit limit",
                    stage.width, stage.height
                )));
            }
            let extent = Fixed::from_num(MAX_STAGE_EXTENT);
            let out_of_bounds = stage
                .deployment_points_a
                .iter()
                .chain(&stage.deployment_points_b)
                .find(|p| p.x.abs() > extent || p.y.abs() > extent);
            if let Some(point) = out_of_bounds {
                return Err(invalid(format!(
                    "deployment point ({}, {}) exceeds the {MAX_STAGE_EXTENT} unit limit",
                    point.x, point.y
                )));
            }
            if stage.time_limit <= Fixed::ZERO {
                return Err(invalid("time_limit must be positive".to_string()));
            }
        }

        Ok(())
    }

    /// Look up a unit type.
    pub fn unit(&self, kind: UnitKind) -> Result<&UnitTypeConfig> {
        self.units
            .get(&kind)
            .ok_or_else(|| BattleError::UnknownUnitType(kind.to_string()))
    }

    /// Look up a terrain.
    pub fn terrain(&self, id: &str) -> Result<&TerrainConfig> {
        self.terrains
            .get(id)
            .ok_or_else(|| BattleError::UnknownTerrain(id.to_string()))
    }

    /// Look up a stage.
    pub fn stage(&self, id: &str) -> Result<&StageConfig> {
        self.stages
            .get(id)
            .ok_or_else(|| BattleError::UnknownStage(id.to_string()))
    }

    /// Look up a preset composition.
    pub fn preset(&self, name: &str) -> Result<&[GroupTemplate]> {
        self.presets
            .get(name)
            .map(Vec::as_slice)
            .ok_or_else(|| BattleError::UnknownPreset(name.to_string()))
    }

    /// The unit table.
    #[must_use]
    pub fn units(&self) -> &UnitTable {
        &self.units
    }

    /// Stage identifiers in sorted order.
    pub fn stage_ids(&self) -> impl Iterator<Item = &str> {
        self.stages.keys().map(String::as_str)
    }

    /// Preset names in sorted order.
    pub fn preset_names(&self) -> impl Iterator<Item = &str> {
        self.presets.keys().map(String::as_str)
    }

    /// Add or replace a unit type.
    pub fn insert_unit(&mut self, kind: UnitKind, config: UnitTypeConfig) {
        self.units.insert(kind, config);
    }

    /// Add or replace a terrain.
    pub fn insert_terrain(&mut self, id: &str, config: TerrainConfig) {
        self.terrains.insert(id.to_string(), config);
    }

    /// Add or replace a stage.
    pub fn insert_stage(&mut self, id: &str, config: StageConfig) {
        self.stages.insert(id.to_string(), config);
    }

    /// Add or replace a preset.
    pub fn insert_preset(&mut self, name: &str, groups: Vec<GroupTemplate>) {
        self.presets.insert(name.to_string(), groups);
    }
}

fn parse<T: DeserializeOwned>(path: &str, contents: &str) -> Result<T> {
    ron::from_str(contents).map_err(|e| BattleError::DataParseError {
        path: path.to_string(),
        message: e.to_string(),
    })
}

fn load_file<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let contents = fs::read_to_string(path).map_err(|e| BattleError::Io {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    parse(&path.display().to_string(), &contents)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_catalog_loads_and_validates() {
        let catalog = DataCatalog::builtin().unwrap();

        for kind in UnitKind::ALL {
            assert!(catalog.unit(kind).is_ok(), "missing unit type {kind}");
        }
        for name in ["balanced", "offensive", "defensive"] {
            assert!(catalog.preset(name).is_ok(), "missing preset {name}");
        }
        assert!(catalog.stage_ids().count() > 0);
    }

    #[test]
    fn test_unknown_lookups_fail_fast() {
        let catalog = DataCatalog::builtin().unwrap();

        assert!(matches!(catalog.terrain("lava"), Err(BattleError::UnknownTerrain(_))));
        assert!(matches!(catalog.stage("moon"), Err(BattleError::UnknownStage(_))));
        assert!(matches!(catalog.preset("turtle"), Err(BattleError::UnknownPreset(_))));

        let empty = DataCatalog::default();
        assert!(matches!(
            empty.unit(UnitKind::Mage),
            Err(BattleError::UnknownUnitType(_))
        ));
    }

    #[test]
    fn test_validate_rejects_zero_range() {
        let mut catalog = DataCatalog::builtin().unwrap();
        let mut config = catalog.unit(UnitKind::Infantry).unwrap().clone();
        config.range = Fixed::ZERO;
        catalog.insert_unit(UnitKind::Infantry, config);

        let err = catalog.validate().unwrap_err();
        assert!(matches!(err, BattleError::InvalidUnitConfig { ref kind, .. } if kind == "infantry"));
    }

    #[test]
    fn test_validate_rejects_range_shorter_than_bodies() {
        let mut catalog = DataCatalog::builtin().unwrap();
        let mut config = catalog.unit(UnitKind::Infantry).unwrap().clone();
        config.range = Fixed::from_num(5);
        catalog.insert_unit(UnitKind::Infantry, config);

        let err = catalog.validate().unwrap_err();
        assert!(err.to_string().contains("touching"), "{err}");
    }

    #[test]
    fn test_validate_rejects_stage_with_unknown_terrain() {
        let mut catalog = DataCatalog::builtin().unwrap();
        let id = catalog.stage_ids().next().unwrap().to_string();
        let mut stage = catalog.stage(&id).unwrap().clone();
        stage.terrain = "swamp_of_doom".to_string();
        catalog.insert_stage(&id, stage);

        assert!(matches!(catalog.validate(), Err(BattleError::InvalidStage { .. })));
    }

    #[test]
    fn test_validate_rejects_huge_hp() {
        let mut catalog = DataCatalog::builtin().unwrap();
        let mut config = catalog.unit(UnitKind::Cavalry).unwrap().clone();
        config.hp = MAX_UNIT_HP + 1;
        catalog.insert_unit(UnitKind::Cavalry, config);

        let err = catalog.validate().unwrap_err();
        assert!(matches!(err, BattleError::InvalidUnitConfig { ref kind, .. } if kind == "cavalry"));
    }

    #[test]
    fn test_validate_bounds_stage_extent() {
        let base = DataCatalog::builtin().unwrap();
        let id = base.stage_ids().next().unwrap().to_string();
        let stage = base.stage(&id).unwrap().clone();

        let mut wide = base.clone();
        let mut too_wide = stage.clone();
        too_wide.width = MAX_STAGE_EXTENT + 1;
        wide.insert_stage(&id, too_wide);
        assert!(matches!(wide.validate(), Err(BattleError::InvalidStage { .. })));

        let mut far = base.clone();
        let mut far_point = stage.clone();
        far_point.deployment_points_b.push(crate::data::DeploymentPoint {
            x: Fixed::from_num(500),
            y: -Fixed::from_num(MAX_STAGE_EXTENT) - Fixed::ONE,
        });
        far.insert_stage(&id, far_point);
        let err = far.validate().unwrap_err();
        assert!(err.to_string().contains("deployment point"), "{err}");

        let mut roomy = base;
        let mut at_limit = stage;
        at_limit.width = MAX_STAGE_EXTENT;
        roomy.insert_stage(&id, at_limit);
        assert!(roomy.validate().is_ok());
    }

    #[test]
    fn test_parse_error_names_the_file() {
        let err = DataCatalog::from_ron_strs("{ not ron", "{}", "{}", "{}").unwrap_err();
        assert!(matches!(err, BattleError::DataParseError { ref path, .. } if path == "units.ron"));
    }

    #[test]
    fn test_load_from_missing_dir() {
        let err = DataCatalog::load_from_dir(Path::new("/definitely/not/here")).unwrap_err();
        assert!(matches!(err, BattleError::Io { .. }));
    }
}
