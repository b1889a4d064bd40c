//! Unit kinds and their per-variant tuning table.
//!
//! Every behavior that depends on "what kind of unit is this" reads it
//! from one place:
//! - [`UnitKind`]: closed set of unit variants, keyed in data files by snake_case ids
//! - [`KindProfile`]: AI tuning, threat priority, terrain bonus class, visual tag
//!
//! Adding a kind means adding one enum variant and one profile row.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::BattleError;
use crate::math::{fixed_int, fixed_ratio, Fixed};

/// Closed set of unit variants.
///
/// # Example
///
/// ```
/// use battle_core::unit_kind::UnitKind;
///
/// let kind: UnitKind = "heavy_infantry".parse().unwrap();
/// assert_eq!(kind, UnitKind::HeavyInfantry);
/// assert!(UnitKind::Archer.profile().ranged);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitKind {
    /// Line melee troops.
    Infantry,
    /// Bow-armed ranged troops.
    Archer,
    /// Spellcasters; add magic power to every strike.
    Mage,
    /// Slow, armored melee troops.
    HeavyInfantry,
    /// Fast mounted melee troops.
    Cavalry,
}

/// Which per-type attack bonus of a terrain applies to a kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TerrainBonusClass {
    /// Uses the terrain's infantry bonus.
    Infantry,
    /// Uses the terrain's archer bonus.
    Archer,
    /// Uses the terrain's mage bonus (attack and magic power).
    Mage,
}

/// Static per-kind tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KindProfile {
    /// Preferred engagement distance as a multiple of attack range.
    pub preferred_range_factor: Fixed,
    /// Aggression scalar (0-1). Kept for tuning; no decision reads it yet.
    pub aggression: Fixed,
    /// Flat bonus added to an enemy's target score when it is of this kind.
    pub target_priority: Fixed,
    /// Backs off when an enemy gets too close.
    pub ranged: bool,
    /// Adds magic power to attack damage.
    pub magic: bool,
    /// Terrain attack bonus that applies to this kind, if any.
    pub terrain_bonus: Option<TerrainBonusClass>,
    /// Shape tag for the presentation layer.
    pub visual_tag: &'static str,
}

const INFANTRY: KindProfile = KindProfile {
    preferred_range_factor: fixed_ratio(3, 2),
    aggression: fixed_ratio(7, 10),
    target_priority: fixed_int(10),
    ranged: false,
    magic: false,
    terrain_bonus: Some(TerrainBonusClass::Infantry),
    visual_tag: "square",
};

const ARCHER: KindProfile = KindProfile {
    preferred_range_factor: fixed_ratio(3, 4),
    aggression: fixed_ratio(1, 2),
    target_priority: fixed_int(15),
    ranged: true,
    magic: false,
    terrain_bonus: Some(TerrainBonusClass::Archer),
    visual_tag: "triangle",
};

const MAGE: KindProfile = KindProfile {
    preferred_range_factor: fixed_ratio(4, 5),
    aggression: fixed_ratio(2, 5),
    target_priority: fixed_int(20),
    ranged: true,
    magic: true,
    terrain_bonus: Some(TerrainBonusClass::Mage),
    visual_tag: "circle",
};

const HEAVY_INFANTRY: KindProfile = KindProfile {
    preferred_range_factor: fixed_ratio(3, 2),
    aggression: fixed_ratio(4, 5),
    target_priority: Fixed::ZERO,
    ranged: false,
    magic: false,
    terrain_bonus: None,
    visual_tag: "hexagon",
};

const CAVALRY: KindProfile = KindProfile {
    preferred_range_factor: fixed_ratio(8, 5),
    aggression: fixed_ratio(9, 10),
    target_priority: Fixed::ZERO,
    ranged: false,
    magic: false,
    terrain_bonus: None,
    visual_tag: "diamond",
};

impl UnitKind {
    /// Every kind, in declaration order.
    pub const ALL: [Self; 5] = [
        Self::Infantry,
        Self::Archer,
        Self::Mage,
        Self::HeavyInfantry,
        Self::Cavalry,
    ];

    /// Tuning row for this kind.
    #[must_use]
    pub const fn profile(self) -> &'static KindProfile {
        match self {
            Self::Infantry => &INFANTRY,
            Self::Archer => &ARCHER,
            Self::Mage => &MAGE,
            Self::HeavyInfantry => &HEAVY_INFANTRY,
            Self::Cavalry => &CAVALRY,
        }
    }

    /// Data-file identifier.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Infantry => "infantry",
            Self::Archer => "archer",
            Self::Mage => "mage",
            Self::HeavyInfantry => "heavy_infantry",
            Self::Cavalry => "cavalry",
        }
    }

    /// Archers and mages keep their distance.
    #[must_use]
    pub const fn is_ranged(self) -> bool {
        self.profile().ranged
    }

    /// Mages add magic power to every strike.
    #[must_use]
    pub const fn is_magic(self) -> bool {
        self.profile().magic
    }
}

impl fmt::Display for UnitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UnitKind {
    type Err = BattleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| BattleError::UnknownUnitType(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_round_trips_every_kind() {
        for kind in UnitKind::ALL {
            assert_eq!(kind.as_str().parse::<UnitKind>().unwrap(), kind);
        }
    }

    #[test]
    fn test_parse_unknown_kind_fails() {
        let err = "dragon".parse::<UnitKind>().unwrap_err();
        assert!(matches!(err, BattleError::UnknownUnitType(ref id) if id == "dragon"));
    }

    #[test]
    fn test_threat_priority_ordering() {
        let mage = UnitKind::Mage.profile().target_priority;
        let archer = UnitKind::Archer.profile().target_priority;
        let infantry = UnitKind::Infantry.profile().target_priority;
        let cavalry = UnitKind::Cavalry.profile().target_priority;

        assert!(mage > archer);
        assert!(archer > infantry);
        assert!(infantry > cavalry);
    }

    #[test]
    fn test_only_archers_and_mages_are_ranged() {
        let ranged: Vec<_> = UnitKind::ALL.into_iter().filter(|k| k.is_ranged()).collect();
        assert_eq!(ranged, vec![UnitKind::Archer, UnitKind::Mage]);
        assert!(UnitKind::Mage.is_magic());
        assert!(!UnitKind::Archer.is_magic());
    }

    #[test]
    fn test_ranged_kinds_prefer_inside_their_range() {
        for kind in UnitKind::ALL {
            let factor = kind.profile().preferred_range_factor;
            if kind.is_ranged() {
                assert!(factor < Fixed::ONE, "{kind} should stand off inside its range");
            } else {
                assert!(factor > Fixed::ONE, "{kind} should close past its range");
            }
        }
    }

    #[test]
    fn test_serde_uses_snake_case_ids() {
        let kind: UnitKind = ron::from_str("heavy_infantry").unwrap();
        assert_eq!(kind, UnitKind::HeavyInfantry);
    }
}
