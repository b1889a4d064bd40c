//! Terrain effect definitions.
//!
//! Terrain is battle-wide: its modifiers are baked into unit stats once,
//! when the unit is created.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::math::{fixed_decimal, fixed_int, Fixed};
use crate::unit_kind::TerrainBonusClass;

/// Stat multipliers applied by a terrain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TerrainConfig {
    /// Display name.
    pub name: String,

    /// Multiplies movement speed.
    #[serde(with = "fixed_decimal", default = "neutral")]
    pub movement_modifier: Fixed,

    /// Multiplies defense.
    #[serde(with = "fixed_decimal", default = "neutral")]
    pub defense_modifier: Fixed,

    /// Multiplies archer attack power.
    #[serde(with = "fixed_decimal", default = "neutral")]
    pub archer_bonus: Fixed,

    /// Multiplies mage attack and magic power.
    #[serde(with = "fixed_decimal", default = "neutral")]
    pub mage_bonus: Fixed,

    /// Multiplies infantry attack power.
    #[serde(with = "fixed_decimal", default = "neutral")]
    pub infantry_bonus: Fixed,
}

const fn neutral() -> Fixed {
    fixed_int(1)
}

impl TerrainConfig {
    /// Terrain with every modifier at 1.0.
    #[must_use]
    pub fn neutral(name: &str) -> Self {
        Self {
            name: name.to_string(),
            movement_modifier: neutral(),
            defense_modifier: neutral(),
            archer_bonus: neutral(),
            mage_bonus: neutral(),
            infantry_bonus: neutral(),
        }
    }

    /// Attack multiplier for a bonus class.
    #[must_use]
    pub fn attack_bonus(&self, class: TerrainBonusClass) -> Fixed {
        match class {
            TerrainBonusClass::Infantry => self.infantry_bonus,
            TerrainBonusClass::Archer => self.archer_bonus,
            TerrainBonusClass::Mage => self.mage_bonus,
        }
    }
}

/// Terrains keyed by identifier.
pub type TerrainTable = BTreeMap<String, TerrainConfig>;
