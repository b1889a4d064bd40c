//! Battle events and observers.
//!
//! The simulation reports what happened in two ways:
//! - every update returns a [`TickEvents`] summary
//! - an optional [`BattleObserver`] is called as events happen, for logging
//!   and tooling that wants them in order
//!
//! Neither path feeds back into the simulation.

use serde::{Deserialize, Serialize};

use crate::ai::AiAction;
use crate::battle::Winner;
use crate::unit::UnitId;

/// A strike that landed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttackEvent {
    /// The unit dealing damage.
    pub attacker: UnitId,
    /// The unit receiving damage.
    pub target: UnitId,
    /// Amount of damage dealt.
    pub damage: u32,
    /// The strike killed the target.
    pub killed: bool,
}

/// Events generated during one update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickEvents {
    /// Strikes in resolution order.
    pub attacks: Vec<AttackEvent>,
    /// Units that died this tick.
    pub deaths: Vec<UnitId>,
    /// Units ordered to retreat this tick.
    pub retreats: Vec<UnitId>,
    /// Set on the tick the battle ends.
    pub outcome: Option<Winner>,
}

impl TickEvents {
    /// Nothing happened.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.attacks.is_empty() && self.deaths.is_empty() && self.retreats.is_empty() && self.outcome.is_none()
    }
}

/// Receives battle events as they happen. Every method defaults to no-op.
pub trait BattleObserver {
    /// A unit made an AI decision.
    fn on_decision(&mut self, _unit: UnitId, _action: AiAction, _target: Option<UnitId>) {}

    /// A strike landed.
    fn on_attack(&mut self, _attacker: UnitId, _target: UnitId, _damage: u32) {}

    /// A unit died.
    fn on_death(&mut self, _unit: UnitId) {}

    /// A unit was ordered to retreat.
    fn on_retreat(&mut self, _unit: UnitId) {}

    /// The battle ended.
    fn on_battle_end(&mut self, _winner: Winner) {}
}

/// Ignores everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullObserver;

impl BattleObserver for NullObserver {}

/// One recorded event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BattleEvent {
    /// See [`BattleObserver::on_decision`].
    Decision {
        /// Deciding unit.
        unit: UnitId,
        /// Chosen action.
        action: AiAction,
        /// Chosen target.
        target: Option<UnitId>,
    },
    /// See [`BattleObserver::on_attack`].
    Attack {
        /// Striking unit.
        attacker: UnitId,
        /// Struck unit.
        target: UnitId,
        /// Damage dealt.
        damage: u32,
    },
    /// See [`BattleObserver::on_death`].
    Death(UnitId),
    /// See [`BattleObserver::on_retreat`].
    Retreat(UnitId),
    /// See [`BattleObserver::on_battle_end`].
    BattleEnd(Winner),
}

/// Records every event in order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventLog {
    /// Everything observed so far.
    pub events: Vec<BattleEvent>,
}

impl EventLog {
    /// Create an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Decisions made by `unit`, oldest first.
    pub fn decisions_of(&self, unit: UnitId) -> impl Iterator<Item = AiAction> + '_ {
        self.events.iter().filter_map(move |e| match *e {
            BattleEvent::Decision { unit: u, action, .. } if u == unit => Some(action),
            _ => None,
        })
    }

    /// Number of strikes recorded.
    #[must_use]
    pub fn attack_count(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, BattleEvent::Attack { .. }))
            .count()
    }

    /// The recorded outcome, if the battle ended.
    #[must_use]
    pub fn winner(&self) -> Option<Winner> {
        self.events.iter().find_map(|e| match *e {
            BattleEvent::BattleEnd(winner) => Some(winner),
            _ => None,
        })
    }
}

impl BattleObserver for EventLog {
    fn on_decision(&mut self, unit: UnitId, action: AiAction, target: Option<UnitId>) {
        self.events.push(BattleEvent::Decision { unit, action, target });
    }

    fn on_attack(&mut self, attacker: UnitId, target: UnitId, damage: u32) {
        self.events.push(BattleEvent::Attack {
            attacker,
            target,
            damage,
        });
    }

    fn on_death(&mut self, unit: UnitId) {
        self.events.push(BattleEvent::Death(unit));
    }

    fn on_retreat(&mut self, unit: UnitId) {
        self.events.push(BattleEvent::Retreat(unit));
    }

    fn on_battle_end(&mut self, winner: Winner) {
        self.events.push(BattleEvent::BattleEnd(winner));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_log_records_in_order() {
        let mut log = EventLog::new();
        log.on_decision(1, AiAction::Approach, Some(2));
        log.on_attack(1, 2, 5);
        log.on_decision(1, AiAction::Hold, Some(2));
        log.on_death(2);
        log.on_battle_end(Winner::SideA);

        assert_eq!(log.decisions_of(1).collect::<Vec<_>>(), vec![AiAction::Approach, AiAction::Hold]);
        assert_eq!(log.attack_count(), 1);
        assert_eq!(log.winner(), Some(Winner::SideA));
        assert_eq!(log.events[3], BattleEvent::Death(2));
    }

    #[test]
    fn test_null_observer_accepts_everything() {
        let mut observer = NullObserver;
        observer.on_attack(1, 2, 3);
        observer.on_battle_end(Winner::Draw);
    }

    #[test]
    fn test_default_tick_events_are_empty() {
        assert!(TickEvents::default().is_empty());
    }
}
