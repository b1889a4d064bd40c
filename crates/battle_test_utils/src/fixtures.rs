//! Test fixtures and helpers.
//!
//! Pre-built catalogs, stages and battles for consistent testing.

use battle_core::army::Side;
use battle_core::battle::BattleManager;
use battle_core::data::{DataCatalog, DeploymentPoint, GroupTemplate, StageConfig, TerrainConfig, UnitTypeConfig};
use battle_core::math::Vec2Fixed;
use battle_core::unit::UnitId;
use battle_core::unit_kind::UnitKind;
use fixed::types::I32F32;

/// Create a fixed-point number from an integer.
#[must_use]
pub fn fixed(n: i32) -> I32F32 {
    I32F32::from_num(n)
}

/// Create a fixed-point number from a float (for tests only).
///
/// Note: In real simulation code, never use floats.
/// This is only for convenient test setup.
#[must_use]
pub fn fixed_f(n: f64) -> I32F32 {
    I32F32::from_num(n)
}

/// Plain infantry: hp 100, attack 15, defense 10, range 15, size 1.
#[must_use]
pub fn infantry_config() -> UnitTypeConfig {
    UnitTypeConfig {
        name: "Infantry".to_string(),
        hp: 100,
        attack: 15,
        defense: 10,
        speed: fixed(40),
        range: fixed(15),
        magic_power: 0,
        sight_range: fixed(5000),
        size: fixed(1),
        attack_cooldown: fixed(1),
    }
}

/// The shipped data tables.
///
/// # Panics
///
/// Panics if the built-in tables fail to load.
#[must_use]
pub fn builtin_catalog() -> DataCatalog {
    DataCatalog::builtin().expect("built-in data tables must load")
}

/// Built-in catalog with infantry replaced by [`infantry_config`] and an
/// `open` stage on neutral terrain.
#[must_use]
pub fn duel_catalog() -> DataCatalog {
    let mut catalog = builtin_catalog();
    catalog.insert_unit(UnitKind::Infantry, infantry_config());
    catalog.insert_terrain("neutral", TerrainConfig::neutral("Neutral"));
    catalog.insert_stage("open", open_stage(1024, 768));
    catalog
}

/// Neutral-terrain stage with three deployment points per side.
#[must_use]
pub fn open_stage(width: u32, height: u32) -> StageConfig {
    let w = i32::try_from(width).unwrap_or(i32::MAX);
    let h = i32::try_from(height).unwrap_or(i32::MAX);
    let points = |x: i32| -> Vec<DeploymentPoint> {
        [h / 4, h / 2, 3 * h / 4]
            .into_iter()
            .map(|y| DeploymentPoint::from(Vec2Fixed::from_ints(x, y)))
            .collect()
    };

    StageConfig {
        name: "Open Field".to_string(),
        terrain: "neutral".to_string(),
        deployment_points_a: points(w / 6),
        deployment_points_b: points(5 * w / 6),
        time_limit: fixed(180),
        width,
        height,
    }
}

/// Empty battle on the open stage.
#[must_use]
pub fn empty_battle(seed: u64) -> BattleManager {
    BattleManager::new(open_stage(1024, 768), TerrainConfig::neutral("Neutral"), seed)
}

/// Add a leader-only group and return the leader.
///
/// # Panics
///
/// Panics if `kind` is missing from the catalog or the battle started.
pub fn spawn_solo(battle: &mut BattleManager, catalog: &DataCatalog, side: Side, kind: UnitKind, position: Vec2Fixed) -> UnitId {
    battle
        .add_group(side, GroupTemplate::new(kind, kind, 0), position, catalog)
        .expect("solo unit must spawn");
    battle
        .army(side)
        .groups()
        .last()
        .map(|g| g.leader)
        .expect("group was just added")
}

/// One [`infantry_config`] unit per side at the given positions, on
/// neutral terrain. Returns the battle and the two unit ids.
#[must_use]
pub fn infantry_duel(a: Vec2Fixed, b: Vec2Fixed) -> (BattleManager, UnitId, UnitId) {
    let catalog = duel_catalog();
    let mut battle = empty_battle(0);
    let unit_a = spawn_solo(&mut battle, &catalog, Side::A, UnitKind::Infantry, a);
    let unit_b = spawn_solo(&mut battle, &catalog, Side::B, UnitKind::Infantry, b);
    (battle, unit_a, unit_b)
}

/// A full preset battle on a shipped stage.
///
/// # Panics
///
/// Panics on unknown stage or preset names.
#[must_use]
pub fn preset_battle(stage: &str, army_a: &str, army_b: &str, seed: u64) -> BattleManager {
    BattleManager::from_presets(&builtin_catalog(), stage, army_a, army_b, seed)
        .expect("preset battle must build")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duel_catalog_validates() {
        duel_catalog().validate().unwrap();
    }

    #[test]
    fn test_infantry_duel_positions() {
        let (battle, a, b) = infantry_duel(Vec2Fixed::ZERO, Vec2Fixed::from_ints(10, 0));
        assert_eq!(battle.unit(a).unwrap().position, Vec2Fixed::ZERO);
        assert_eq!(battle.unit(b).unwrap().side, Side::B);
        assert_eq!(battle.unit(b).unwrap().stats.attack, 15);
    }

    #[test]
    fn test_open_stage_points_are_playable() {
        let stage = open_stage(1024, 768);
        for point in stage.deployment_a().into_iter().chain(stage.deployment_b()) {
            assert!(point.x > fixed(50) && point.x < fixed(974));
            assert!(point.y > fixed(100) && point.y < fixed(700));
        }
    }
}
