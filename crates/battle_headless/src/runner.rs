//! Single-battle runner.
//!
//! Runs one preset battle from deployment to outcome and reduces it to a
//! serializable [`BattleReport`].

use std::path::Path;

use battle_core::army::{Army, Side};
use battle_core::battle::{BattleManager, Winner, TICK_RATE};
use battle_core::data::DataCatalog;
use battle_core::events::TickEvents;
use battle_core::roster::UnitRoster;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Result, RunnerError};

/// Ten minutes of battle time, well past every shipped stage's time limit.
pub const DEFAULT_MAX_TICKS: u64 = TICK_RATE as u64 * 60 * 10;

/// What to fight.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunConfig {
    /// Stage id.
    pub stage: String,
    /// Preset for side A.
    pub army_a: String,
    /// Preset for side B.
    pub army_b: String,
    /// Deployment seed.
    pub seed: u64,
    /// Stop after this many ticks even without an outcome.
    pub max_ticks: u64,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            stage: "plains".to_string(),
            army_a: "balanced".to_string(),
            army_b: "offensive".to_string(),
            seed: 0,
            max_ticks: DEFAULT_MAX_TICKS,
        }
    }
}

impl RunConfig {
    /// Battle on `stage` between two presets.
    pub fn new(stage: &str, army_a: &str, army_b: &str) -> Self {
        Self {
            stage: stage.to_string(),
            army_a: army_a.to_string(),
            army_b: army_b.to_string(),
            ..Default::default()
        }
    }

    /// Set the deployment seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set the tick cap.
    pub fn with_max_ticks(mut self, max_ticks: u64) -> Self {
        self.max_ticks = max_ticks;
        self
    }

    /// Build the battle, deployed but not started.
    pub fn build(&self, catalog: &DataCatalog) -> Result<BattleManager> {
        if self.max_ticks == 0 {
            return Err(RunnerError::InvalidArgument("max_ticks must be positive".to_string()));
        }
        Ok(BattleManager::from_presets(
            catalog,
            &self.stage,
            &self.army_a,
            &self.army_b,
            self.seed,
        )?)
    }
}

/// One army's state at the end of a battle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SideReport {
    /// Side.
    pub side: Side,
    /// Preset name.
    pub preset: String,
    /// Units deployed.
    pub deployed: usize,
    /// Alive and still fighting.
    pub fighting: usize,
    /// Alive but routed.
    pub routed: usize,
    /// Dead.
    pub dead: usize,
    /// Mean HP fraction, dead units counting zero.
    pub health_fraction: f64,
    /// Damage dealt by this side.
    pub damage_dealt: u64,
    /// Enemy units killed by this side.
    pub kills: u32,
}

impl SideReport {
    fn new(army: &Army, roster: &UnitRoster, tally: SideTally) -> Self {
        let ids = army.all_units();
        let units = || ids.iter().filter_map(|id| roster.get(*id));

        Self {
            side: army.side,
            preset: army.name.clone(),
            deployed: ids.len(),
            fighting: army.alive_count(roster),
            routed: units().filter(|u| u.is_alive() && u.is_retreating()).count(),
            dead: units().filter(|u| !u.is_alive()).count(),
            health_fraction: army.total_health_fraction(roster).to_num(),
            damage_dealt: tally.damage_dealt,
            kills: tally.kills,
        }
    }
}

/// Outcome of one battle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BattleReport {
    /// What was fought.
    pub config: RunConfig,
    /// Outcome; `Undetermined` when the tick cap hit first.
    pub winner: Winner,
    /// Decided on health at the time limit rather than by a wipe.
    pub timed_out: bool,
    /// Ticks simulated.
    pub ticks: u64,
    /// Battle seconds simulated.
    pub elapsed_secs: f64,
    /// Strikes landed by both sides.
    pub attacks: u32,
    /// Side A then side B.
    pub sides: [SideReport; 2],
    /// Final simulation state hash.
    pub final_state_hash: u64,
}

impl BattleReport {
    /// Report for one side.
    pub fn side(&self, side: Side) -> &SideReport {
        &self.sides[side_index(side)]
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct SideTally {
    damage_dealt: u64,
    kills: u32,
}

fn side_index(side: Side) -> usize {
    match side {
        Side::A => 0,
        Side::B => 1,
    }
}

/// Fight one battle to its outcome or the tick cap.
pub fn run_battle(catalog: &DataCatalog, config: &RunConfig) -> Result<BattleReport> {
    let mut battle = config.build(catalog)?;
    battle.start_battle();

    let mut tallies = [SideTally::default(); 2];
    let mut attacks = 0u32;

    while battle.is_active() && battle.tick_count() < config.max_ticks {
        let events = battle.tick();
        attacks += tally(&battle, &events, &mut tallies);
    }

    let winner = battle.winner();
    let report = BattleReport {
        config: config.clone(),
        winner,
        timed_out: winner != Winner::Undetermined && battle.elapsed() >= battle.time_limit(),
        ticks: battle.tick_count(),
        elapsed_secs: battle.elapsed().to_num(),
        attacks,
        sides: [
            SideReport::new(battle.army(Side::A), battle.roster(), tallies[0]),
            SideReport::new(battle.army(Side::B), battle.roster(), tallies[1]),
        ],
        final_state_hash: battle.state_hash(),
    };

    if winner == Winner::Undetermined {
        debug!(seed = config.seed, ticks = report.ticks, "Tick cap reached without an outcome");
    }
    info!(
        stage = %config.stage,
        seed = config.seed,
        %winner,
        ticks = report.ticks,
        "Battle finished"
    );
    Ok(report)
}

fn tally(battle: &BattleManager, events: &TickEvents, tallies: &mut [SideTally; 2]) -> u32 {
    for attack in &events.attacks {
        let Some(side) = battle.unit(attack.attacker).map(|u| u.side) else {
            continue;
        };
        let entry = &mut tallies[side_index(side)];
        entry.damage_dealt += u64::from(attack.damage);
        if attack.killed {
            entry.kills += 1;
        }
    }
    u32::try_from(events.attacks.len()).unwrap_or(u32::MAX)
}

/// Load data tables from `dir`, else the default data directory, else the
/// tables compiled into the binary.
pub fn load_catalog(dir: Option<&Path>) -> Result<DataCatalog> {
    if let Some(dir) = dir {
        return Ok(DataCatalog::load_from_dir(dir)?);
    }
    match DataCatalog::default_data_dir() {
        Some(dir) => Ok(DataCatalog::load_from_dir(&dir)?),
        None => {
            debug!("No data directory found, using built-in tables");
            Ok(DataCatalog::builtin()?)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use battle_core::error::BattleError;
    use battle_test_utils::fixtures::builtin_catalog;

    #[test]
    fn test_run_battle_reaches_outcome() {
        let report = run_battle(&builtin_catalog(), &RunConfig::default()).unwrap();

        assert_ne!(report.winner, Winner::Undetermined);
        assert!(report.ticks > 0);
        assert!(report.attacks > 0);
        for side in Side::BOTH {
            let s = report.side(side);
            assert_eq!(s.deployed, s.fighting + s.routed + s.dead);
        }

        // Kills credited to one side are deaths on the other.
        assert_eq!(report.side(Side::A).kills as usize, report.side(Side::B).dead);
        assert_eq!(report.side(Side::B).kills as usize, report.side(Side::A).dead);
    }

    #[test]
    fn test_same_config_same_report() {
        let config = RunConfig::new("forest", "defensive", "balanced").with_seed(11);
        let catalog = builtin_catalog();
        assert_eq!(run_battle(&catalog, &config).unwrap(), run_battle(&catalog, &config).unwrap());
    }

    #[test]
    fn test_tick_cap_leaves_outcome_undetermined() {
        let config = RunConfig::default().with_max_ticks(5);
        let report = run_battle(&builtin_catalog(), &config).unwrap();

        assert_eq!(report.winner, Winner::Undetermined);
        assert!(!report.timed_out);
        assert_eq!(report.ticks, 5);
    }

    #[test]
    fn test_zero_tick_cap_is_rejected() {
        let config = RunConfig::default().with_max_ticks(0);
        assert!(matches!(
            run_battle(&builtin_catalog(), &config),
            Err(RunnerError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_unknown_preset_is_reported() {
        let config = RunConfig::new("plains", "balanced", "turtle");
        let err = run_battle(&builtin_catalog(), &config).unwrap_err();
        assert!(matches!(err, RunnerError::Battle(BattleError::UnknownPreset(_))));
    }

    #[test]
    fn test_load_catalog_from_missing_dir_fails() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        assert!(matches!(load_catalog(Some(&missing)), Err(RunnerError::Battle(BattleError::Io { .. }))));
    }

    #[test]
    fn test_report_serializes_to_json() {
        let report = run_battle(&builtin_catalog(), &RunConfig::default().with_max_ticks(20)).unwrap();
        let json = serde_json::to_string(&report).unwrap();
        let back: BattleReport = serde_json::from_str(&json).unwrap();
        assert_eq!(back.final_state_hash, report.final_state_hash);
        assert_eq!(back.config, report.config);
    }
}
