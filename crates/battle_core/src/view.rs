//! Read-only snapshots for the presentation layer.
//!
//! Views carry plain `f32` coordinates and string tags so a renderer or a
//! JSON consumer never touches simulation types.

use serde::{Deserialize, Serialize};

use crate::ai::AiAction;
use crate::army::{Army, Side};
use crate::battle::{BattleManager, BattlePhase, Winner};
use crate::roster::UnitRoster;
use crate::unit::{MotionState, Unit, UnitId};
use crate::unit_kind::UnitKind;

/// What a renderer needs to draw one unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitView {
    /// Unit id.
    pub id: UnitId,
    /// Owning side.
    pub side: Side,
    /// Unit kind.
    pub kind: UnitKind,
    /// Display name.
    pub name: String,
    /// Shape tag for iconography.
    pub visual_tag: String,
    /// X position.
    pub x: f32,
    /// Y position.
    pub y: f32,
    /// Current HP.
    pub hp: u32,
    /// Maximum HP.
    pub max_hp: u32,
    /// Attack after terrain.
    pub attack: u32,
    /// Alive flag.
    pub is_alive: bool,
    /// Leader flag.
    pub is_leader: bool,
    /// Retreating flag.
    pub is_retreating: bool,
    /// Last AI action.
    pub action: AiAction,
    /// Pose for animation.
    pub motion: MotionState,
}

impl UnitView {
    /// Snapshot one unit.
    #[must_use]
    pub fn of(unit: &Unit) -> Self {
        let (x, y) = unit.position.to_f32();
        Self {
            id: unit.id,
            side: unit.side,
            kind: unit.kind,
            name: unit.name.clone(),
            visual_tag: unit.kind.profile().visual_tag.to_string(),
            x,
            y,
            hp: unit.health.current,
            max_hp: unit.health.max,
            attack: unit.stats.attack,
            is_alive: unit.is_alive(),
            is_leader: unit.is_leader,
            is_retreating: unit.is_retreating(),
            action: unit.ai.action,
            motion: unit.visual.motion,
        }
    }
}

/// Army-level HUD numbers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArmyView {
    /// Side.
    pub side: Side,
    /// Army name.
    pub name: String,
    /// Mean HP fraction, dead units counting zero.
    pub health_fraction: f32,
    /// Units alive and not retreating.
    pub alive_count: usize,
    /// Units ever deployed.
    pub unit_count: usize,
}

impl ArmyView {
    /// Snapshot one army.
    #[must_use]
    pub fn of(army: &Army, roster: &UnitRoster) -> Self {
        Self {
            side: army.side,
            name: army.name.clone(),
            health_fraction: army.total_health_fraction(roster).to_num(),
            alive_count: army.alive_count(roster),
            unit_count: army.all_units().len(),
        }
    }
}

/// Whole-battle snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BattleView {
    /// Seconds elapsed.
    pub elapsed: f32,
    /// Seconds until the health decision.
    pub time_limit: f32,
    /// Lifecycle phase.
    pub phase: BattlePhase,
    /// Battle is running.
    pub active: bool,
    /// Outcome so far.
    pub winner: Winner,
    /// Battlefield width.
    pub width: f32,
    /// Battlefield height.
    pub height: f32,
    /// Side A then side B.
    pub armies: [ArmyView; 2],
    /// Every unit in id order, dead ones included.
    pub units: Vec<UnitView>,
}

impl BattleView {
    /// Snapshot a battle.
    #[must_use]
    pub fn capture(battle: &BattleManager) -> Self {
        let roster = battle.roster();
        let field = battle.battlefield();
        Self {
            elapsed: battle.elapsed().to_num(),
            time_limit: battle.time_limit().to_num(),
            phase: battle.phase(),
            active: battle.is_active(),
            winner: battle.winner(),
            width: field.width.to_num(),
            height: field.height.to_num(),
            armies: [
                ArmyView::of(battle.army(Side::A), roster),
                ArmyView::of(battle.army(Side::B), roster),
            ],
            units: roster.iter().map(UnitView::of).collect(),
        }
    }

    /// Army view for a side.
    #[must_use]
    pub fn army(&self, side: Side) -> &ArmyView {
        match side {
            Side::A => &self.armies[0],
            Side::B => &self.armies[1],
        }
    }
}
