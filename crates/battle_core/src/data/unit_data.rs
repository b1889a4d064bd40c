//! Unit type definitions.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::math::{fixed_decimal, fixed_int, Fixed};
use crate::unit_kind::UnitKind;

/// Stats shared by every unit of one kind.
///
/// # Example RON
///
/// ```ron
/// (
///     name: "Infantry",
///     hp: 100,
///     attack: 15,
///     defense: 10,
///     speed: 40.0,
///     range: 15.0,
///     sight_range: 5000.0,
///     size: 1.0,
/// )
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitTypeConfig {
    /// Display name.
    pub name: String,

    /// Maximum hit points.
    pub hp: u32,

    /// Physical attack power.
    pub attack: u32,

    /// Flat damage reduction.
    pub defense: u32,

    /// Movement speed in length-units per second.
    #[serde(with = "fixed_decimal")]
    pub speed: Fixed,

    /// Raw attack range, measured between unit centers.
    #[serde(with = "fixed_decimal")]
    pub range: Fixed,

    /// Added to attack power by magic-type units.
    #[serde(default)]
    pub magic_power: u32,

    /// Enemies further than this are never considered as targets.
    #[serde(with = "fixed_decimal", default = "default_sight_range")]
    pub sight_range: Fixed,

    /// Collision radius multiplier.
    #[serde(with = "fixed_decimal", default = "default_size")]
    pub size: Fixed,

    /// Seconds between two attacks.
    #[serde(with = "fixed_decimal", default = "default_attack_cooldown")]
    pub attack_cooldown: Fixed,
}

const fn default_sight_range() -> Fixed {
    fixed_int(5000)
}

const fn default_size() -> Fixed {
    fixed_int(1)
}

const fn default_attack_cooldown() -> Fixed {
    fixed_int(1)
}

/// Unit types keyed by kind.
pub type UnitTable = BTreeMap<UnitKind, UnitTypeConfig>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_fill_optional_fields() {
        let config: UnitTypeConfig = ron::from_str(
            r#"(name: "Infantry", hp: 100, attack: 15, defense: 10, speed: 40.0, range: 15.0)"#,
        )
        .unwrap();

        assert_eq!(config.magic_power, 0);
        assert_eq!(config.sight_range, Fixed::from_num(5000));
        assert_eq!(config.size, Fixed::ONE);
        assert_eq!(config.attack_cooldown, Fixed::ONE);
        assert_eq!(config.range, Fixed::from_num(15));
    }

    #[test]
    fn test_table_keys_are_kind_ids() {
        let table: UnitTable = ron::from_str(
            r#"{
                archer: (name: "Archer", hp: 70, attack: 12, defense: 5, speed: 35.0, range: 80.0),
            }"#,
        )
        .unwrap();

        assert_eq!(table[&UnitKind::Archer].hp, 70);
    }
}
