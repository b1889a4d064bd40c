//! Individual combatants.
//!
//! A [`Unit`] owns its stats, position, health, attack timer and AI state.
//! Units are never removed mid-battle: dead units stay in the roster with
//! `is_alive() == false` and every query filters them out.

use serde::{Deserialize, Serialize};

use crate::ai::AiBehavior;
use crate::army::Side;
use crate::data::{TerrainConfig, UnitTypeConfig};
use crate::group::GroupId;
use crate::math::{fixed_int, fixed_ratio, fixed_serde, Fixed, Vec2Fixed};
use crate::unit_kind::UnitKind;

/// Unique unit identifier. Assigned from 1 upward, never reused in a battle.
pub type UnitId = u32;

/// Collision radius of a unit with `size == 1.0`.
///
/// Kept small so that two bodies never outreach the shortest attack range.
pub const BASE_COLLISION_RADIUS: Fixed = fixed_int(3);

/// Fraction of the attack cooldown during which the unit shows as attacking.
const ATTACK_POSE_FRACTION: Fixed = fixed_ratio(7, 10);

/// Minimum damage of any strike that lands.
pub const MIN_DAMAGE: u32 = 1;

/// Collision radius for a size multiplier.
#[must_use]
pub fn collision_radius_for(size: Fixed) -> Fixed {
    BASE_COLLISION_RADIUS * size
}

/// Hit points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Health {
    /// Current health points.
    pub current: u32,
    /// Maximum health points.
    pub max: u32,
}

impl Health {
    /// Create new health at full.
    #[must_use]
    pub const fn new(max: u32) -> Self {
        Self { current: max, max }
    }

    /// Apply damage, returning actual damage dealt.
    /// Uses saturating subtraction to prevent underflow.
    pub fn apply_damage(&mut self, amount: u32) -> u32 {
        let actual = amount.min(self.current);
        self.current = self.current.saturating_sub(actual);
        actual
    }

    /// Current / max, or zero for a zero-max pool.
    #[must_use]
    pub fn fraction(&self) -> Fixed {
        if self.max == 0 {
            return Fixed::ZERO;
        }
        let current = i128::from(self.current.min(self.max));
        Fixed::from_bits(((current << 32) / i128::from(self.max)) as i64)
    }
}

/// Combat and movement stats after terrain modifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UnitStats {
    /// Physical attack power.
    pub attack: u32,
    /// Flat damage reduction.
    pub defense: u32,
    /// Added to attack by magic-type units.
    pub magic_power: u32,
    /// Length-units per second.
    #[serde(with = "fixed_serde")]
    pub speed: Fixed,
    /// Raw attack range between centers.
    #[serde(with = "fixed_serde")]
    pub range: Fixed,
    /// Target acquisition range.
    #[serde(with = "fixed_serde")]
    pub sight_range: Fixed,
    /// Collision radius multiplier.
    #[serde(with = "fixed_serde")]
    pub size: Fixed,
    /// Seconds between attacks.
    #[serde(with = "fixed_serde")]
    pub attack_cooldown: Fixed,
}

impl UnitStats {
    /// Stats straight from a unit type config.
    #[must_use]
    pub fn from_config(config: &UnitTypeConfig) -> Self {
        Self {
            attack: config.attack,
            defense: config.defense,
            magic_power: config.magic_power,
            speed: config.speed,
            range: config.range,
            sight_range: config.sight_range,
            size: config.size,
            attack_cooldown: config.attack_cooldown,
        }
    }

    /// Bake battle-wide terrain modifiers into the stats.
    ///
    /// Integral stats truncate toward zero.
    #[must_use]
    pub fn with_terrain(mut self, kind: UnitKind, terrain: &TerrainConfig) -> Self {
        self.speed *= terrain.movement_modifier;
        self.defense = scale_stat(self.defense, terrain.defense_modifier);

        if let Some(class) = kind.profile().terrain_bonus {
            let bonus = terrain.attack_bonus(class);
            self.attack = scale_stat(self.attack, bonus);
            if kind.is_magic() {
                self.magic_power = scale_stat(self.magic_power, bonus);
            }
        }
        self
    }
}

fn scale_stat(value: u32, factor: Fixed) -> u32 {
    let scaled = Fixed::saturating_from_num(value).saturating_mul(factor);
    scaled.to_num::<i64>().clamp(0, i64::from(u32::MAX)) as u32
}

/// Coarse state published to the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum MotionState {
    /// Standing still.
    #[default]
    Idle,
    /// Walking toward its movement target.
    Moving,
    /// Just struck.
    Attacking,
    /// Dead; the death animation plays out.
    Dying,
}

/// Visual passthrough: current motion and how long it has lasted.
///
/// The simulation only writes this; nothing in combat reads it back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct VisualState {
    /// Current pose.
    pub motion: MotionState,
    /// Seconds spent in the current pose.
    #[serde(with = "fixed_serde")]
    pub elapsed: Fixed,
}

impl VisualState {
    fn set(&mut self, motion: MotionState) {
        if self.motion != motion {
            self.motion = motion;
            self.elapsed = Fixed::ZERO;
        }
    }

    fn advance(&mut self, dt: Fixed) {
        self.elapsed = self.elapsed.saturating_add(dt);
    }
}

/// A single combatant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Unit {
    /// Unique identifier.
    pub id: UnitId,
    /// Unit variant.
    pub kind: UnitKind,
    /// Display name.
    pub name: String,
    /// Hit points.
    pub health: Health,
    /// Stats after terrain modifiers.
    pub stats: UnitStats,
    /// Current position.
    pub position: Vec2Fixed,
    /// Where the unit is walking to.
    pub target: Vec2Fixed,
    /// Leads its group.
    pub is_leader: bool,
    /// Owning group.
    pub group_id: GroupId,
    /// Owning army.
    pub side: Side,
    /// Autonomous decision state.
    pub ai: AiBehavior,
    /// Presentation passthrough.
    pub visual: VisualState,
    alive: bool,
    retreating: bool,
    #[serde(with = "fixed_serde")]
    cooldown_remaining: Fixed,
}

impl Unit {
    /// Create a unit at full health, standing at `position`.
    #[must_use]
    pub fn new(
        id: UnitId,
        kind: UnitKind,
        name: impl Into<String>,
        max_hp: u32,
        stats: UnitStats,
        position: Vec2Fixed,
        side: Side,
    ) -> Self {
        Self {
            id,
            kind,
            name: name.into(),
            health: Health::new(max_hp),
            ai: AiBehavior::for_unit(kind, stats.range),
            stats,
            position,
            target: position,
            is_leader: false,
            group_id: 0,
            side,
            visual: VisualState::default(),
            alive: max_hp > 0,
            retreating: false,
            cooldown_remaining: Fixed::ZERO,
        }
    }

    /// Create a unit from its type config, applying terrain modifiers.
    #[must_use]
    pub fn from_config(
        id: UnitId,
        kind: UnitKind,
        config: &UnitTypeConfig,
        terrain: &TerrainConfig,
        position: Vec2Fixed,
        side: Side,
    ) -> Self {
        let stats = UnitStats::from_config(config).with_terrain(kind, terrain);
        Self::new(id, kind, config.name.clone(), config.hp, stats, position, side)
    }

    /// Alive until HP first reaches zero, then never again.
    #[must_use]
    pub const fn is_alive(&self) -> bool {
        self.alive
    }

    /// Routed toward its exit; never resets.
    #[must_use]
    pub const fn is_retreating(&self) -> bool {
        self.retreating
    }

    /// Alive and still fighting. The only units AI and combat ever see.
    #[must_use]
    pub const fn is_combatant(&self) -> bool {
        self.alive && !self.retreating
    }

    /// Seconds until the next attack is allowed.
    #[must_use]
    pub const fn cooldown_remaining(&self) -> Fixed {
        self.cooldown_remaining
    }

    /// Advance one tick: timers, visual state and movement toward `target`.
    pub fn update(&mut self, dt: Fixed) {
        if !self.alive {
            self.visual.set(MotionState::Dying);
            self.visual.advance(dt);
            return;
        }

        self.cooldown_remaining = self.cooldown_remaining.saturating_sub(dt).max(Fixed::ZERO);

        // Larger bodies settle sooner.
        let remaining = self.position.distance(self.target);
        let moving = remaining > self.collision_radius();

        let motion = if self.cooldown_remaining > self.stats.attack_cooldown * ATTACK_POSE_FRACTION
        {
            MotionState::Attacking
        } else if moving {
            MotionState::Moving
        } else {
            MotionState::Idle
        };
        self.visual.set(motion);
        self.visual.advance(dt);

        if moving {
            // A long frame stops at the target instead of overshooting it.
            let step = self.stats.speed.saturating_mul(dt);
            if step >= remaining {
                self.position = self.target;
            } else {
                let direction = (self.target - self.position).normalize();
                self.position = self.position + direction * step;
            }
        }
    }

    /// Set the movement target.
    pub fn move_to(&mut self, target: Vec2Fixed) {
        self.target = target;
    }

    /// Stop where the unit stands.
    pub fn halt(&mut self) {
        self.target = self.position;
    }

    /// Body radius used for collisions and range padding.
    #[must_use]
    pub fn collision_radius(&self) -> Fixed {
        collision_radius_for(self.stats.size)
    }

    /// Attack range padded by both bodies' radii.
    #[must_use]
    pub fn effective_attack_range(&self, target: &Unit) -> Fixed {
        self.stats.range + self.collision_radius() + target.collision_radius()
    }

    /// Alive and off cooldown.
    #[must_use]
    pub fn can_attack(&self) -> bool {
        self.alive && self.cooldown_remaining <= Fixed::ZERO
    }

    /// Damage a strike on `target` would deal. Never below [`MIN_DAMAGE`].
    #[must_use]
    pub fn damage_against(&self, target: &Unit) -> u32 {
        let mut base = self.stats.attack;
        if self.kind.is_magic() {
            base = base.saturating_add(self.stats.magic_power);
        }
        base.saturating_sub(target.stats.defense).max(MIN_DAMAGE)
    }

    /// Strike `target`, returning the damage dealt.
    ///
    /// Returns 0 and changes nothing when the attacker cannot attack, the
    /// target is dead, or the target is beyond effective range.
    pub fn attack(&mut self, target: &mut Unit) -> u32 {
        if !self.can_attack() || !target.alive {
            return 0;
        }

        let distance = self.position.distance(target.position);
        if distance > self.effective_attack_range(target) {
            return 0;
        }

        let damage = self.damage_against(target);
        target.take_damage(damage);
        self.cooldown_remaining = self.stats.attack_cooldown;
        self.visual.set(MotionState::Attacking);

        damage
    }

    /// Lose `amount` HP. Dead units ignore damage.
    pub fn take_damage(&mut self, amount: u32) {
        if !self.alive {
            return;
        }

        self.health.apply_damage(amount);
        if self.health.current == 0 {
            self.alive = false;
        }
    }

    /// Drop to zero HP immediately.
    pub fn kill(&mut self) {
        self.take_damage(self.health.current);
    }

    /// Rout toward `exit_point`. One-way.
    pub fn start_retreating(&mut self, exit_point: Vec2Fixed) {
        self.retreating = true;
        self.target = exit_point;
    }

    /// Bodies overlap. Dead units never collide.
    #[must_use]
    pub fn is_colliding_with(&self, other: &Unit) -> bool {
        if !self.alive || !other.alive {
            return false;
        }

        let combined = self.collision_radius() + other.collision_radius();
        self.position.distance(other.position) < combined
    }

    /// Push both units apart by half the overlap each, along the line
    /// between them, so they end exactly touching.
    ///
    /// Coincident units are separated along the x axis, `self` to the left.
    /// Returns whether anything moved.
    pub fn resolve_collision(&mut self, other: &mut Unit) -> bool {
        if !self.is_colliding_with(other) {
            return false;
        }

        let distance = self.position.distance(other.position);
        let combined = self.collision_radius() + other.collision_radius();
        let direction = if distance == Fixed::ZERO {
            Vec2Fixed::new(Fixed::ONE, Fixed::ZERO)
        } else {
            (other.position - self.position).normalize()
        };

        let push = direction * ((combined - distance) / 2);
        self.position = self.position - push;
        other.position = other.position + push;
        true
    }
}
