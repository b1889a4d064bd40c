//! The battle manager: setup, the tick pipeline and win conditions.
//!
//! # Tick order
//!
//! Each update runs these steps in this order. Later steps read state the
//! earlier ones wrote, so the order is part of the contract.
//!
//! 1. **Clock**: advance elapsed time
//! 2. **Movement**: every group moves its units toward their current targets
//! 3. **AI**: every fighting unit decides against a snapshot of the enemy,
//!    then formations re-place members
//! 4. **Collisions**: overlapping pairs are pushed apart
//! 5. **Combat**: side A strikes, then side B
//! 6. **Win check**

use std::cmp::Ordering;
use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::ai::{self, TargetView};
use crate::army::{Army, Side};
use crate::battlefield::Battlefield;
use crate::data::{DataCatalog, GroupTemplate, StageConfig, TerrainConfig, UnitTypeConfig};
use crate::error::{BattleError, Result};
use crate::events::{AttackEvent, BattleObserver, NullObserver, TickEvents};
use crate::group::{Group, GroupId};
use crate::math::{fixed_int, fixed_ratio, fixed_serde, Fixed, Vec2Fixed};
use crate::roster::UnitRoster;
use crate::unit::{Unit, UnitId};
use crate::unit_kind::UnitKind;
use crate::view::BattleView;

/// Simulation ticks per second.
pub const TICK_RATE: u32 = 20;

/// Seconds per tick at [`TICK_RATE`].
pub const TICK_DURATION: Fixed = fixed_ratio(1, TICK_RATE as i64);

/// Members spawn within this distance of their leader on each axis.
pub const MEMBER_JITTER: Fixed = fixed_int(20);

/// Battle lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BattlePhase {
    /// Armies may still be deployed.
    #[default]
    NotStarted,
    /// Updates advance the simulation.
    Active,
    /// A winner has been declared; updates do nothing.
    Ended,
}

/// Battle outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Winner {
    /// The battle has not ended.
    #[default]
    Undetermined,
    /// Side A won.
    SideA,
    /// Side B won.
    SideB,
    /// Nobody won.
    Draw,
}

impl Winner {
    /// The winning side, if any.
    #[must_use]
    pub const fn side(self) -> Option<Side> {
        match self {
            Self::SideA => Some(Side::A),
            Self::SideB => Some(Side::B),
            Self::Undetermined | Self::Draw => None,
        }
    }

    const fn from_side(side: Side) -> Self {
        match side {
            Side::A => Self::SideA,
            Side::B => Self::SideB,
        }
    }
}

impl fmt::Display for Winner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Undetermined => "undetermined",
            Self::SideA => "side_a",
            Self::SideB => "side_b",
            Self::Draw => "draw",
        };
        f.write_str(s)
    }
}

/// Owns both armies and every unit, and runs the battle.
///
/// # Example
///
/// ```
/// use battle_core::prelude::*;
///
/// let catalog = DataCatalog::builtin().unwrap();
/// let mut battle = BattleManager::from_presets(&catalog, "plains", "balanced", "offensive", 7).unwrap();
/// battle.start_battle();
/// battle.tick();
/// assert!(battle.elapsed() > Fixed::ZERO);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BattleManager {
    stage: StageConfig,
    terrain: TerrainConfig,
    battlefield: Battlefield,
    roster: UnitRoster,
    army_a: Army,
    army_b: Army,
    #[serde(with = "fixed_serde")]
    clock: Fixed,
    tick: u64,
    phase: BattlePhase,
    winner: Winner,
    next_group_id: GroupId,
    rng: ChaCha8Rng,
}

impl BattleManager {
    /// Empty battle on `stage` with `terrain` baked into every unit spawned.
    #[must_use]
    pub fn new(stage: StageConfig, terrain: TerrainConfig, seed: u64) -> Self {
        Self {
            battlefield: Battlefield::new(stage.width, stage.height),
            stage,
            terrain,
            roster: UnitRoster::new(),
            army_a: Army::new(Side::A, "A"),
            army_b: Army::new(Side::B, "B"),
            clock: Fixed::ZERO,
            tick: 0,
            phase: BattlePhase::NotStarted,
            winner: Winner::Undetermined,
            next_group_id: 1,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Empty battle on a catalog stage.
    ///
    /// # Errors
    ///
    /// Unknown stage, or a stage naming an unknown terrain.
    pub fn from_catalog(catalog: &DataCatalog, stage_id: &str, seed: u64) -> Result<Self> {
        let stage = catalog.stage(stage_id)?;
        let terrain = catalog.terrain(&stage.terrain)?;
        Ok(Self::new(stage.clone(), terrain.clone(), seed))
    }

    /// Battle on a catalog stage with both armies built from presets.
    ///
    /// # Errors
    ///
    /// Any unknown stage, terrain, preset or unit type.
    pub fn from_presets(
        catalog: &DataCatalog,
        stage_id: &str,
        preset_a: &str,
        preset_b: &str,
        seed: u64,
    ) -> Result<Self> {
        let mut battle = Self::from_catalog(catalog, stage_id, seed)?;
        battle.create_preset_army(Side::A, preset_a, catalog)?;
        battle.create_preset_army(Side::B, preset_b, catalog)?;
        Ok(battle)
    }

    /// Deploy a preset army on `side`'s deployment points.
    ///
    /// # Errors
    ///
    /// Unknown preset or unit type. Nothing is spawned on error.
    pub fn create_preset_army(&mut self, side: Side, preset: &str, catalog: &DataCatalog) -> Result<()> {
        let templates = catalog.preset(preset)?;
        self.deploy_groups(side, templates, catalog)?;
        self.army_mut(side).name = preset.to_string();
        Ok(())
    }

    /// Deploy one group per template, the n-th at the n-th deployment point.
    ///
    /// Templates beyond the stage's deployment points are not deployed.
    ///
    /// # Errors
    ///
    /// Unknown unit type or a battle that already started. Nothing is
    /// spawned on error.
    pub fn deploy_groups(&mut self, side: Side, templates: &[GroupTemplate], catalog: &DataCatalog) -> Result<()> {
        self.ensure_not_started()?;

        let points = match side {
            Side::A => self.stage.deployment_a(),
            Side::B => self.stage.deployment_b(),
        };
        if templates.len() > points.len() {
            tracing::warn!(
                %side,
                groups = templates.len(),
                points = points.len(),
                "More groups than deployment points; extra groups not deployed"
            );
        }

        let resolved = templates
            .iter()
            .zip(points)
            .map(|(template, point)| {
                Ok((*template, catalog.unit(template.leader)?, catalog.unit(template.member)?, point))
            })
            .collect::<Result<Vec<_>>>()?;

        for (template, leader, member, point) in resolved {
            self.spawn_group(side, (template.leader, leader), (template.member, member), template.count, point);
        }
        Ok(())
    }

    /// Spawn one group at `position` on `side`.
    ///
    /// # Errors
    ///
    /// Unknown unit type or a battle that already started.
    pub fn add_group(
        &mut self,
        side: Side,
        template: GroupTemplate,
        position: Vec2Fixed,
        catalog: &DataCatalog,
    ) -> Result<GroupId> {
        self.ensure_not_started()?;
        let leader = catalog.unit(template.leader)?;
        let member = catalog.unit(template.member)?;
        Ok(self.spawn_group(side, (template.leader, leader), (template.member, member), template.count, position))
    }

    fn ensure_not_started(&self) -> Result<()> {
        if self.phase == BattlePhase::NotStarted {
            Ok(())
        } else {
            Err(BattleError::InvalidState(
                "armies can only be deployed before the battle starts".to_string(),
            ))
        }
    }

    /// Leader exactly at `position`, members jittered around it.
    fn spawn_group(
        &mut self,
        side: Side,
        (leader_kind, leader_config): (UnitKind, &UnitTypeConfig),
        (member_kind, member_config): (UnitKind, &UnitTypeConfig),
        count: u32,
        position: Vec2Fixed,
    ) -> GroupId {
        let group_id = self.next_group_id;
        self.next_group_id += 1;

        let leader = self.spawn_unit(side, group_id, leader_kind, leader_config, position, true);

        let members = (0..count)
            .map(|_| {
                let offset = Vec2Fixed::new(self.jitter(), self.jitter());
                self.spawn_unit(side, group_id, member_kind, member_config, position + offset, false)
            })
            .collect();

        self.army_mut(side)
            .add_group(Group::new(group_id, side, leader, members, position));

        tracing::debug!(%side, group = group_id, leader = %leader_kind, member = %member_kind, count, "Spawned group");
        group_id
    }

    fn spawn_unit(
        &mut self,
        side: Side,
        group_id: GroupId,
        kind: UnitKind,
        config: &UnitTypeConfig,
        position: Vec2Fixed,
        is_leader: bool,
    ) -> UnitId {
        let terrain = &self.terrain;
        self.roster.spawn(|id| {
            let mut unit = Unit::from_config(id, kind, config, terrain, position, side);
            unit.group_id = group_id;
            unit.is_leader = is_leader;
            if is_leader {
                unit.name = format!("{} Leader", config.name);
            }
            unit
        })
    }

    fn jitter(&mut self) -> Fixed {
        let bound = MEMBER_JITTER.to_bits();
        Fixed::from_bits(self.rng.gen_range(-bound..=bound))
    }

    /// Begin (or restart) the battle: clock, tick counter and winner reset.
    pub fn start_battle(&mut self) {
        self.phase = BattlePhase::Active;
        self.clock = Fixed::ZERO;
        self.tick = 0;
        self.winner = Winner::Undetermined;

        tracing::info!(
            stage = %self.stage.name,
            terrain = %self.terrain.name,
            army_a = %self.army_a.name,
            army_b = %self.army_b.name,
            units = self.roster.len(),
            "Battle started"
        );
    }

    /// Advance one tick of [`TICK_DURATION`].
    pub fn tick(&mut self) -> TickEvents {
        self.update(TICK_DURATION)
    }

    /// Advance by `dt` seconds. No-op unless the battle is active.
    pub fn update(&mut self, dt: Fixed) -> TickEvents {
        self.update_observed(dt, &mut NullObserver)
    }

    /// Advance by `dt` seconds, reporting events to `observer` as they happen.
    pub fn update_observed(&mut self, dt: Fixed, observer: &mut dyn BattleObserver) -> TickEvents {
        let mut events = TickEvents::default();
        if self.phase != BattlePhase::Active {
            return events;
        }

        // Negative steps would run cooldowns backwards.
        let dt = dt.max(Fixed::ZERO);

        // 1. Clock
        self.clock = self.clock.saturating_add(dt);
        self.tick += 1;

        // 2. Movement
        for side in Side::BOTH {
            let routed = match side {
                Side::A => self.army_a.update(&mut self.roster, dt, &self.battlefield),
                Side::B => self.army_b.update(&mut self.roster, dt, &self.battlefield),
            };
            for id in routed {
                observer.on_retreat(id);
                events.retreats.push(id);
            }
        }

        // 3. AI
        self.run_ai(dt, observer);

        // 4. Collisions
        self.resolve_collisions();

        // 5. Combat
        self.resolve_combat(&mut events, observer);

        // 6. Win check
        if let Some(winner) = self.check_win_conditions() {
            observer.on_battle_end(winner);
            events.outcome = Some(winner);
        }

        #[cfg(debug_assertions)]
        {
            let hash = self.state_hash();
            tracing::trace!(tick = self.tick, state_hash = hash, "Battle state hash");
        }

        events
    }

    /// Tick until the battle ends or `max_ticks` ticks have run, starting it
    /// first if needed.
    pub fn run_to_completion(&mut self, max_ticks: u64) -> Winner {
        if self.phase == BattlePhase::NotStarted {
            self.start_battle();
        }

        let mut ticks = 0;
        while self.phase == BattlePhase::Active && ticks < max_ticks {
            self.tick();
            ticks += 1;
        }
        self.winner
    }

    fn run_ai(&mut self, dt: Fixed, observer: &mut dyn BattleObserver) {
        let snapshot_a = self.target_views(Side::A);
        let snapshot_b = self.target_views(Side::B);

        for side in Side::BOTH {
            let enemies = match side {
                Side::A => &snapshot_b,
                Side::B => &snapshot_a,
            };

            for id in self.army(side).alive_units(&self.roster) {
                let Some(unit) = self.roster.get_mut(id) else {
                    continue;
                };
                let Some(decision) = ai::update(unit, enemies, dt, &self.battlefield) else {
                    continue;
                };

                if unit.is_leader {
                    tracing::debug!(
                        unit = id,
                        %side,
                        action = decision.action.as_str(),
                        target = ?decision.target,
                        "Leader decision"
                    );
                }
                observer.on_decision(id, decision.action, decision.target);
            }
        }

        // Formation slots take precedence over members' own decisions.
        self.army_a.apply_formations(&mut self.roster);
        self.army_b.apply_formations(&mut self.roster);
    }

    fn target_views(&self, side: Side) -> Vec<TargetView> {
        self.army(side)
            .alive_units(&self.roster)
            .into_iter()
            .filter_map(|id| self.roster.get(id))
            .map(TargetView::of)
            .collect()
    }

    /// Every unordered pair of fighting units, in a fixed order.
    fn resolve_collisions(&mut self) {
        let mut ids = self.army_a.alive_units(&self.roster);
        ids.extend(self.army_b.alive_units(&self.roster));

        for (i, &first) in ids.iter().enumerate() {
            for &second in &ids[i + 1..] {
                if let Some((a, b)) = self.roster.pair_mut(first, second) {
                    a.resolve_collision(b);
                }
            }
        }
    }

    /// Each ready unit strikes the nearest living enemy within raw range.
    fn resolve_combat(&mut self, events: &mut TickEvents, observer: &mut dyn BattleObserver) {
        for side in Side::BOTH {
            let attackers = self.army(side).alive_units(&self.roster);
            let defenders = self.army(side.opponent()).alive_units(&self.roster);

            for attacker_id in attackers {
                let Some(target_id) = self.nearest_in_range(attacker_id, &defenders) else {
                    continue;
                };
                let Some((attacker, target)) = self.roster.pair_mut(attacker_id, target_id) else {
                    continue;
                };

                let damage = attacker.attack(target);
                if damage == 0 {
                    continue;
                }
                let killed = !target.is_alive();

                if attacker.is_leader {
                    tracing::debug!(attacker = attacker_id, target = target_id, damage, killed, "Leader attack");
                }

                observer.on_attack(attacker_id, target_id, damage);
                events.attacks.push(AttackEvent {
                    attacker: attacker_id,
                    target: target_id,
                    damage,
                    killed,
                });
                if killed {
                    observer.on_death(target_id);
                    events.deaths.push(target_id);
                }
            }
        }
    }

    /// Nearest living defender within the attacker's raw range; the first
    /// of equally near defenders wins.
    fn nearest_in_range(&self, attacker_id: UnitId, defenders: &[UnitId]) -> Option<UnitId> {
        let attacker = self.roster.get(attacker_id).filter(|a| a.can_attack())?;

        let mut best: Option<(UnitId, Fixed)> = None;
        for defender in defenders.iter().filter_map(|id| self.roster.get(*id)) {
            if !defender.is_alive() {
                continue;
            }
            let distance = attacker.position.distance(defender.position);
            if distance > attacker.stats.range {
                continue;
            }
            if best.map_or(true, |(_, nearest)| distance < nearest) {
                best = Some((defender.id, distance));
            }
        }
        best.map(|(id, _)| id)
    }

    fn check_win_conditions(&mut self) -> Option<Winner> {
        let winner = if self.clock >= self.stage.time_limit {
            let health_a = self.army_a.total_health_fraction(&self.roster);
            let health_b = self.army_b.total_health_fraction(&self.roster);
            match health_a.cmp(&health_b) {
                Ordering::Greater => Winner::SideA,
                Ordering::Less => Winner::SideB,
                Ordering::Equal => Winner::Draw,
            }
        } else {
            match (self.army_a.is_defeated(&self.roster), self.army_b.is_defeated(&self.roster)) {
                (true, true) => Winner::Draw,
                (true, false) => Winner::from_side(Side::B),
                (false, true) => Winner::from_side(Side::A),
                (false, false) => return None,
            }
        };

        self.phase = BattlePhase::Ended;
        self.winner = winner;
        tracing::info!(
            %winner,
            elapsed = self.clock.to_num::<f64>(),
            ticks = self.tick,
            alive_a = self.army_a.alive_count(&self.roster),
            alive_b = self.army_b.alive_count(&self.roster),
            "Battle ended"
        );
        Some(winner)
    }

    /// Lifecycle phase.
    #[must_use]
    pub const fn phase(&self) -> BattlePhase {
        self.phase
    }

    /// Outcome so far.
    #[must_use]
    pub const fn winner(&self) -> Winner {
        self.winner
    }

    /// The battle is running.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.phase == BattlePhase::Active
    }

    /// Simulated seconds since the battle started.
    #[must_use]
    pub const fn elapsed(&self) -> Fixed {
        self.clock
    }

    /// Seconds after which the battle is decided on health.
    #[must_use]
    pub const fn time_limit(&self) -> Fixed {
        self.stage.time_limit
    }

    /// Updates run since creation.
    #[must_use]
    pub const fn tick_count(&self) -> u64 {
        self.tick
    }

    /// Every unit.
    #[must_use]
    pub const fn roster(&self) -> &UnitRoster {
        &self.roster
    }

    /// Look up a unit.
    #[must_use]
    pub fn unit(&self, id: UnitId) -> Option<&Unit> {
        self.roster.get(id)
    }

    /// Mutable unit access for scripted scenarios and tests.
    pub fn unit_mut(&mut self, id: UnitId) -> Option<&mut Unit> {
        self.roster.get_mut(id)
    }

    /// One side's army.
    #[must_use]
    pub const fn army(&self, side: Side) -> &Army {
        match side {
            Side::A => &self.army_a,
            Side::B => &self.army_b,
        }
    }

    fn army_mut(&mut self, side: Side) -> &mut Army {
        match side {
            Side::A => &mut self.army_a,
            Side::B => &mut self.army_b,
        }
    }

    /// Battlefield bounds.
    #[must_use]
    pub const fn battlefield(&self) -> &Battlefield {
        &self.battlefield
    }

    /// Stage this battle is fought on.
    #[must_use]
    pub const fn stage(&self) -> &StageConfig {
        &self.stage
    }

    /// Terrain baked into every unit.
    #[must_use]
    pub const fn terrain(&self) -> &TerrainConfig {
        &self.terrain
    }

    /// Presentation snapshot.
    #[must_use]
    pub fn view(&self) -> BattleView {
        BattleView::capture(self)
    }

    /// Hash of the simulation state.
    ///
    /// Two battles with identical state produce identical hashes.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();

        self.tick.hash(&mut hasher);
        self.clock.to_bits().hash(&mut hasher);
        self.phase.hash(&mut hasher);
        self.winner.hash(&mut hasher);

        self.roster.len().hash(&mut hasher);
        for unit in self.roster.iter() {
            unit.id.hash(&mut hasher);
            unit.position.hash(&mut hasher);
            unit.target.hash(&mut hasher);
            unit.health.hash(&mut hasher);
            unit.is_alive().hash(&mut hasher);
            unit.is_retreating().hash(&mut hasher);
            unit.cooldown_remaining().to_bits().hash(&mut hasher);
            unit.ai.action.hash(&mut hasher);
            unit.ai.target.hash(&mut hasher);
        }

        hasher.finish()
    }

    /// Encode the whole battle state.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn snapshot(&self) -> Result<Vec<u8>> {
        bincode::serialize(self)
            .map_err(|e| BattleError::Serialization(format!("Failed to serialize battle: {e}")))
    }

    /// Decode a battle saved with [`snapshot`](Self::snapshot).
    ///
    /// # Errors
    ///
    /// Returns an error if the bytes are not a valid snapshot.
    pub fn restore(data: &[u8]) -> Result<Self> {
        bincode::deserialize(data)
            .map_err(|e| BattleError::Serialization(format!("Failed to deserialize battle: {e}")))
    }
}
