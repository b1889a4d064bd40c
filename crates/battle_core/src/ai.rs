//! Per-unit autonomous decision making.
//!
//! Each unit carries an [`AiBehavior`]. At most once per
//! [`DECISION_COOLDOWN`] it picks a target and an [`AiAction`]; every tick it
//! turns the last decided action into a movement target.
//!
//! # Scoring
//!
//! Targets are scored with a weak distance penalty and no hard distance
//! cutoff beyond sight range:
//!
//! ```text
//! score = 1000 - distance * 0.05
//!       + (1 - health_fraction) * 30
//!       + 50 if leader
//!       + 100 if within effective range
//!       + kind priority
//! ```
//!
//! # Range policy
//!
//! Decisions use the effective range (raw range plus both bodies). The
//! combat pass only strikes at raw range, so [`AiAction::Attack`] charges
//! the target until it is within raw range.

use serde::{Deserialize, Serialize};

use crate::battlefield::Battlefield;
use crate::math::{fixed_int, fixed_ratio, fixed_serde, Fixed, Vec2Fixed};
use crate::unit::{Unit, UnitId};
use crate::unit_kind::UnitKind;

/// Seconds between decisions.
pub const DECISION_COOLDOWN: Fixed = fixed_ratio(1, 10);

const BASE_SCORE: Fixed = fixed_int(1000);
const DISTANCE_PENALTY: Fixed = fixed_ratio(1, 20);
const WOUNDED_WEIGHT: Fixed = fixed_int(30);
const LEADER_BONUS: Fixed = fixed_int(50);
const IN_RANGE_BONUS: Fixed = fixed_int(100);

const APPROACH_THRESHOLD: Fixed = fixed_ratio(6, 5);
const KITE_THRESHOLD: Fixed = fixed_ratio(4, 5);
const APPROACH_STANDOFF: Fixed = fixed_ratio(9, 10);
const RETREAT_STANDOFF: Fixed = fixed_ratio(11, 10);
const MAX_APPROACH_STEP: Fixed = fixed_int(50);
const APPROACH_NUDGE: Fixed = fixed_int(20);

/// The five actions a unit can be in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AiAction {
    /// No target.
    #[default]
    Idle,
    /// Closing on the target.
    Approach,
    /// Ranged unit backing away from a target that got too close.
    Retreat,
    /// In range and ready to strike.
    Attack,
    /// In range but cooling down.
    Hold,
}

impl AiAction {
    /// Lowercase tag for logs and views.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Approach => "approach",
            Self::Retreat => "retreat",
            Self::Attack => "attack",
            Self::Hold => "hold",
        }
    }
}

/// Decision state owned by one unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiBehavior {
    /// Current target. Never trusted without re-checking the live roster.
    pub target: Option<UnitId>,
    /// Preferred engagement distance.
    #[serde(with = "fixed_serde")]
    pub preferred_range: Fixed,
    /// Tuning scalar from the kind profile.
    #[serde(with = "fixed_serde")]
    pub aggression: Fixed,
    /// Last decided action.
    pub action: AiAction,
    #[serde(with = "fixed_serde")]
    decision_timer: Fixed,
    #[serde(with = "fixed_serde")]
    decision_cooldown: Fixed,
}

impl AiBehavior {
    /// Tuning for a unit of `kind` with raw attack `range`.
    ///
    /// The decision timer starts full, so the first update decides.
    #[must_use]
    pub fn for_unit(kind: UnitKind, range: Fixed) -> Self {
        let profile = kind.profile();
        Self {
            target: None,
            preferred_range: range * profile.preferred_range_factor,
            aggression: profile.aggression,
            action: AiAction::Idle,
            decision_timer: DECISION_COOLDOWN,
            decision_cooldown: DECISION_COOLDOWN,
        }
    }

    /// Accumulate `dt`; true when a decision is due.
    fn decision_due(&mut self, dt: Fixed) -> bool {
        self.decision_timer = self.decision_timer.saturating_add(dt);
        if self.decision_timer < self.decision_cooldown {
            return false;
        }
        self.decision_timer = Fixed::ZERO;
        true
    }
}

/// Read-only copy of an enemy taken before the AI pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetView {
    /// Enemy id.
    pub id: UnitId,
    /// Enemy kind, for the priority bonus.
    pub kind: UnitKind,
    /// Position at snapshot time.
    pub position: Vec2Fixed,
    /// Current / max HP.
    pub health_fraction: Fixed,
    /// Leads its group.
    pub is_leader: bool,
    /// Body radius.
    pub collision_radius: Fixed,
    /// Alive and not retreating.
    pub combatant: bool,
}

impl TargetView {
    /// Snapshot a unit.
    #[must_use]
    pub fn of(unit: &Unit) -> Self {
        Self {
            id: unit.id,
            kind: unit.kind,
            position: unit.position,
            health_fraction: unit.health.fraction(),
            is_leader: unit.is_leader,
            collision_radius: unit.collision_radius(),
            combatant: unit.is_combatant(),
        }
    }
}

/// What the deciding unit knows about itself.
#[derive(Debug, Clone, Copy)]
struct SelfView {
    kind: UnitKind,
    position: Vec2Fixed,
    range: Fixed,
    sight_range: Fixed,
    collision_radius: Fixed,
    can_attack: bool,
}

impl SelfView {
    fn of(unit: &Unit) -> Self {
        Self {
            kind: unit.kind,
            position: unit.position,
            range: unit.stats.range,
            sight_range: unit.stats.sight_range,
            collision_radius: unit.collision_radius(),
            can_attack: unit.can_attack(),
        }
    }

    fn effective_range(&self, target: &TargetView) -> Fixed {
        self.range + self.collision_radius + target.collision_radius
    }

    fn effective_distance(&self, target: &TargetView) -> Fixed {
        self.position.distance(target.position) - self.collision_radius - target.collision_radius
    }
}

/// A decision made this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    /// Chosen action.
    pub action: AiAction,
    /// Chosen target, if any.
    pub target: Option<UnitId>,
}

/// Score one candidate.
#[must_use]
pub fn score_target(observer_position: Vec2Fixed, effective_range: Fixed, target: &TargetView) -> Fixed {
    let distance = observer_position.distance(target.position);

    let mut score = BASE_SCORE - distance * DISTANCE_PENALTY;
    score += (Fixed::ONE - target.health_fraction) * WOUNDED_WEIGHT;
    if target.is_leader {
        score += LEADER_BONUS;
    }
    if distance <= effective_range {
        score += IN_RANGE_BONUS;
    }
    score + target.kind.profile().target_priority
}

/// Highest-scoring enemy that is a combatant within sight.
///
/// The first of equally scored enemies wins.
#[must_use]
pub fn select_target<'a>(unit: &Unit, enemies: &'a [TargetView]) -> Option<&'a TargetView> {
    select_for(&SelfView::of(unit), enemies)
}

fn select_for<'a>(me: &SelfView, enemies: &'a [TargetView]) -> Option<&'a TargetView> {
    let mut best: Option<(&TargetView, Fixed)> = None;

    for enemy in enemies.iter().filter(|e| e.combatant) {
        if me.position.distance(enemy.position) > me.sight_range {
            continue;
        }

        let score = score_target(me.position, me.effective_range(enemy), enemy);
        if best.map_or(true, |(_, top)| score > top) {
            best = Some((enemy, score));
        }
    }

    best.map(|(enemy, _)| enemy)
}

/// Action for a unit facing `target`.
#[must_use]
pub fn decide_action(unit: &Unit, target: &TargetView) -> AiAction {
    decide_for(&SelfView::of(unit), unit.ai.preferred_range, target)
}

fn decide_for(me: &SelfView, preferred: Fixed, target: &TargetView) -> AiAction {
    let distance = me.effective_distance(target);
    let in_range = distance <= me.range;

    if in_range && me.can_attack {
        AiAction::Attack
    } else if distance > preferred * APPROACH_THRESHOLD {
        AiAction::Approach
    } else if distance < preferred * KITE_THRESHOLD && me.kind.is_ranged() {
        AiAction::Retreat
    } else if in_range {
        AiAction::Hold
    } else {
        AiAction::Approach
    }
}

/// Run one AI tick for `unit` against a snapshot of the enemy army.
///
/// Returns the decision if one was made this tick. Dead and retreating
/// units are skipped entirely.
pub fn update(unit: &mut Unit, enemies: &[TargetView], dt: Fixed, field: &Battlefield) -> Option<Decision> {
    if !unit.is_combatant() {
        return None;
    }

    let decision = if unit.ai.decision_due(dt) {
        let me = SelfView::of(unit);
        let target = select_for(&me, enemies);
        let action = target.map_or(AiAction::Idle, |t| decide_for(&me, unit.ai.preferred_range, t));

        unit.ai.target = target.map(|t| t.id);
        unit.ai.action = action;
        Some(Decision {
            action,
            target: unit.ai.target,
        })
    } else {
        None
    };

    execute(unit, enemies, field);
    decision
}

/// Turn the last decided action into a movement target.
///
/// A target that has died or routed since the decision makes the unit
/// stand still until the next decision.
pub fn execute(unit: &mut Unit, enemies: &[TargetView], field: &Battlefield) {
    let target = unit
        .ai
        .target
        .and_then(|id| enemies.iter().find(|e| e.id == id && e.combatant));

    let Some(target) = target else {
        unit.halt();
        return;
    };

    let buffer = unit.collision_radius() + target.collision_radius;
    let distance = unit.position.distance(target.position);

    match unit.ai.action {
        AiAction::Approach => {
            let direction = (target.position - unit.position).normalize();
            let standoff = unit.ai.preferred_range * APPROACH_STANDOFF + buffer;
            let step = if distance > standoff {
                (distance - standoff).min(MAX_APPROACH_STEP)
            } else {
                APPROACH_NUDGE
            };
            unit.move_to(unit.position + direction * step);
        }
        AiAction::Retreat => {
            let direction = (unit.position - target.position).normalize();
            let standoff = unit.ai.preferred_range * RETREAT_STANDOFF + buffer;
            if distance < standoff {
                let desired = unit.position + direction * (standoff - distance);
                unit.move_to(field.clamp_playable(desired));
            } else {
                unit.halt();
            }
        }
        AiAction::Attack => {
            if distance > unit.stats.range {
                // Close until the combat pass can land the strike; collisions
                // stop the charge with bodies touching, inside raw range.
                unit.move_to(target.position);
            } else {
                unit.halt();
            }
        }
        AiAction::Hold | AiAction::Idle => unit.halt(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::army::Side;
    use crate::unit::UnitStats;

    fn unit(id: UnitId, kind: UnitKind, x: i32, y: i32, range: i32) -> Unit {
        let stats = UnitStats {
            attack: 15,
            defense: 10,
            magic_power: 0,
            speed: Fixed::from_num(40),
            range: Fixed::from_num(range),
            sight_range: Fixed::from_num(5000),
            size: Fixed::ONE,
            attack_cooldown: Fixed::ONE,
        };
        Unit::new(id, kind, kind.as_str(), 100, stats, Vec2Fixed::from_ints(x, y), Side::A)
    }

    fn view(id: UnitId, kind: UnitKind, x: i32, y: i32) -> TargetView {
        TargetView::of(&unit(id, kind, x, y, 15))
    }

    fn dt() -> Fixed {
        Fixed::from_num(0.05)
    }

    #[test]
    fn test_no_enemies_means_idle_and_halt() {
        let mut me = unit(1, UnitKind::Infantry, 0, 0, 15);
        me.move_to(Vec2Fixed::from_ints(100, 0));

        let decision = update(&mut me, &[], dt(), &Battlefield::default()).unwrap();
        assert_eq!(decision.action, AiAction::Idle);
        assert_eq!(decision.target, None);
        assert_eq!(me.target, me.position);
    }

    #[test]
    fn test_out_of_sight_enemies_are_ignored() {
        let mut me = unit(1, UnitKind::Infantry, 0, 0, 15);
        me.stats.sight_range = Fixed::from_num(100);
        let enemies = [view(2, UnitKind::Infantry, 500, 0)];

        assert!(select_target(&me, &enemies).is_none());
    }

    #[test]
    fn test_far_targets_are_still_selected() {
        let me = unit(1, UnitKind::Infantry, 0, 0, 15);
        let enemies = [view(2, UnitKind::Infantry, 4000, 0)];

        assert_eq!(select_target(&me, &enemies).map(|t| t.id), Some(2));
    }

    #[test]
    fn test_retreating_and_dead_enemies_are_invisible() {
        let me = unit(1, UnitKind::Infantry, 0, 0, 15);
        let mut dead = unit(2, UnitKind::Mage, 10, 0, 15);
        dead.kill();
        let mut routed = unit(3, UnitKind::Mage, 20, 0, 15);
        routed.start_retreating(Vec2Fixed::from_ints(-100, 0));

        let enemies = [TargetView::of(&dead), TargetView::of(&routed)];
        assert!(select_target(&me, &enemies).is_none());
    }

    #[test]
    fn test_priority_prefers_mage_over_archer_at_same_distance() {
        let me = unit(1, UnitKind::Infantry, 0, 0, 15);
        let enemies = [
            view(2, UnitKind::Archer, 200, 0),
            view(3, UnitKind::Mage, 0, 200),
        ];

        assert_eq!(select_target(&me, &enemies).map(|t| t.id), Some(3));
    }

    #[test]
    fn test_leaders_and_wounded_score_higher() {
        let me = unit(1, UnitKind::Infantry, 0, 0, 15);
        let plain = view(2, UnitKind::Infantry, 300, 0);
        let mut leader = view(3, UnitKind::Infantry, 300, 0);
        leader.is_leader = true;
        let mut wounded = view(4, UnitKind::Infantry, 300, 0);
        wounded.health_fraction = Fixed::from_num(0.5);

        let range = Fixed::from_num(21);
        let base = score_target(me.position, range, &plain);
        assert_eq!(score_target(me.position, range, &leader) - base, Fixed::from_num(50));
        assert_eq!(score_target(me.position, range, &wounded) - base, Fixed::from_num(15));
    }

    #[test]
    fn test_ties_go_to_first_encountered() {
        let me = unit(1, UnitKind::Infantry, 0, 0, 15);
        let enemies = [
            view(7, UnitKind::Infantry, 100, 0),
            view(3, UnitKind::Infantry, 0, 100),
        ];

        assert_eq!(select_target(&me, &enemies).map(|t| t.id), Some(7));
    }

    #[test]
    fn test_adjacent_ready_unit_attacks() {
        let me = unit(1, UnitKind::Infantry, 0, 0, 15);
        let target = view(2, UnitKind::Infantry, 10, 0);
        assert_eq!(decide_action(&me, &target), AiAction::Attack);
    }

    #[test]
    fn test_cooling_down_unit_holds() {
        let mut me = unit(1, UnitKind::Infantry, 0, 0, 15);
        let mut victim = unit(2, UnitKind::Infantry, 10, 0, 15);
        me.attack(&mut victim);

        let target = TargetView::of(&victim);
        // Preferred 22.5; effective distance 4 is below 0.8x but infantry
        // never kites.
        assert_eq!(decide_action(&me, &target), AiAction::Hold);
    }

    #[test]
    fn test_distant_target_is_approached() {
        let me = unit(1, UnitKind::Infantry, 0, 0, 15);
        let target = view(2, UnitKind::Infantry, 300, 0);
        assert_eq!(decide_action(&me, &target), AiAction::Approach);
    }

    #[test]
    fn test_ranged_unit_retreats_from_close_enemy() {
        let mut me = unit(1, UnitKind::Archer, 300, 300, 250);
        me.ai = AiBehavior::for_unit(UnitKind::Archer, me.stats.range);
        let mut victim = unit(2, UnitKind::Infantry, 350, 300, 15);
        me.attack(&mut victim);

        let target = TargetView::of(&victim);
        assert_eq!(decide_action(&me, &target), AiAction::Retreat);
    }

    #[test]
    fn test_decisions_are_rate_limited() {
        let mut me = unit(1, UnitKind::Infantry, 0, 0, 15);
        let enemies = [view(2, UnitKind::Infantry, 300, 0)];
        let field = Battlefield::default();

        assert!(update(&mut me, &enemies, dt(), &field).is_some());
        assert!(update(&mut me, &enemies, dt(), &field).is_none());
        assert!(update(&mut me, &enemies, dt(), &field).is_some());
    }

    #[test]
    fn test_approach_steps_at_most_fifty() {
        let mut me = unit(1, UnitKind::Infantry, 0, 0, 15);
        let enemies = [view(2, UnitKind::Infantry, 500, 0)];
        update(&mut me, &enemies, dt(), &Battlefield::default());

        assert_eq!(me.ai.action, AiAction::Approach);
        assert_eq!(me.target, Vec2Fixed::from_ints(50, 0));
    }

    #[test]
    fn test_retreat_is_clamped_to_playable_area() {
        let mut me = unit(1, UnitKind::Archer, 60, 400, 250);
        me.ai = AiBehavior::for_unit(UnitKind::Archer, me.stats.range);
        me.ai.action = AiAction::Retreat;
        me.ai.target = Some(2);
        let enemies = [view(2, UnitKind::Infantry, 90, 400)];

        execute(&mut me, &enemies, &Battlefield::default());
        assert_eq!(me.target.x, Fixed::from_num(50));
        assert_eq!(me.target.y, Fixed::from_num(400));
    }

    #[test]
    fn test_retreat_past_standoff_halts() {
        let mut me = unit(1, UnitKind::Archer, 400, 400, 250);
        me.ai = AiBehavior::for_unit(UnitKind::Archer, me.stats.range);
        me.ai.action = AiAction::Retreat;
        me.ai.target = Some(2);
        me.move_to(Vec2Fixed::from_ints(100, 100));
        // Preferred 187.5, standoff 206.25 + 6 of bodies; the enemy is farther.
        let enemies = [view(2, UnitKind::Infantry, 700, 400)];

        execute(&mut me, &enemies, &Battlefield::default());
        assert_eq!(me.target, me.position);
    }

    #[test]
    fn test_attack_presses_in_to_raw_range() {
        let mut me = unit(1, UnitKind::Infantry, 0, 0, 15);
        me.ai.action = AiAction::Attack;
        me.ai.target = Some(2);
        let enemies = [view(2, UnitKind::Infantry, 19, 0)];

        execute(&mut me, &enemies, &Battlefield::default());
        assert_eq!(me.target, Vec2Fixed::from_ints(19, 0));

        let enemies = [view(2, UnitKind::Infantry, 10, 0)];
        execute(&mut me, &enemies, &Battlefield::default());
        assert_eq!(me.target, me.position);
    }

    #[test]
    fn test_stale_target_halts_until_next_decision() {
        let mut me = unit(1, UnitKind::Infantry, 0, 0, 15);
        me.ai.action = AiAction::Approach;
        me.ai.target = Some(9);
        me.move_to(Vec2Fixed::from_ints(80, 0));

        execute(&mut me, &[view(2, UnitKind::Infantry, 300, 0)], &Battlefield::default());
        assert_eq!(me.target, me.position);
    }

    #[test]
    fn test_retreating_units_skip_ai() {
        let mut me = unit(1, UnitKind::Infantry, 0, 0, 15);
        me.start_retreating(Vec2Fixed::from_ints(-100, 0));
        let enemies = [view(2, UnitKind::Infantry, 10, 0)];

        assert!(update(&mut me, &enemies, dt(), &Battlefield::default()).is_none());
        assert_eq!(me.target, Vec2Fixed::from_ints(-100, 0));
    }
}
