//! Determinism testing utilities.
//!
//! Provides a harness for verifying that battles produce identical results
//! given identical inputs.
//!
//! # Testing Strategy
//!
//! A battle must replay bit-for-bit from its seed. Sources of
//! non-determinism include:
//!
//! - **Floating-point math**: we use fixed-point arithmetic via
//!   [`battle_core::math::Fixed`] throughout the tick.
//!
//! - **HashMap iteration order**: units live in an id-ordered arena and
//!   every pass iterates armies in group order.
//!
//! - **System randomness**: deployment jitter comes from a seeded
//!   `ChaCha8Rng`; nothing else is random.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::thread;

use battle_core::battle::BattleManager;

/// Result of a determinism test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeterminismResult {
    /// Whether all runs produced identical results.
    pub is_deterministic: bool,
    /// Hashes from each run.
    pub hashes: Vec<u64>,
    /// Number of ticks simulated.
    pub ticks: u64,
}

impl DeterminismResult {
    /// Get all unique hashes (should be 1 for a deterministic battle).
    #[must_use]
    pub fn unique_hashes(&self) -> Vec<u64> {
        let mut unique: Vec<u64> = self.hashes.clone();
        unique.sort_unstable();
        unique.dedup();
        unique
    }

    /// Assert that the battle was deterministic, with a detailed error message.
    ///
    /// # Panics
    ///
    /// Panics if runs produced different hashes.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic {
            let unique = self.unique_hashes();
            panic!(
                "Battle is non-deterministic!\n\
                 Runs: {}\n\
                 Ticks: {}\n\
                 Unique hashes: {} (expected 1)\n\
                 All hashes: {:?}",
                self.hashes.len(),
                self.ticks,
                unique.len(),
                self.hashes
            );
        }
    }
}

/// Run a state machine multiple times and verify determinism.
///
/// # Arguments
///
/// * `runs` - Number of times to run
/// * `ticks` - Number of steps per run
/// * `setup` - Creates the initial state
/// * `step` - Advances the state by one tick
/// * `hash` - Computes the state hash
pub fn verify_determinism<S, Setup, Step, HashFn>(
    runs: usize,
    ticks: u64,
    setup: Setup,
    step: Step,
    hash: HashFn,
) -> DeterminismResult
where
    Setup: Fn() -> S,
    Step: Fn(&mut S),
    HashFn: Fn(&S) -> u64,
{
    let mut hashes = Vec::with_capacity(runs);

    for _ in 0..runs {
        let mut state = setup();

        for _ in 0..ticks {
            step(&mut state);
        }

        hashes.push(hash(&state));
    }

    let is_deterministic = hashes.windows(2).all(|w| w[0] == w[1]);

    DeterminismResult {
        is_deterministic,
        hashes,
        ticks,
    }
}

/// Run a battle `runs` times from the same setup and compare final hashes.
///
/// The battle is started if the setup left it unstarted.
pub fn verify_battle_determinism<F>(setup_fn: F, runs: usize, num_ticks: u64) -> DeterminismResult
where
    F: Fn() -> BattleManager,
{
    verify_determinism(
        runs,
        num_ticks,
        || started(setup_fn()),
        |battle| {
            battle.tick();
        },
        BattleManager::state_hash,
    )
}

/// Run battles on scoped threads and collect final hashes.
///
/// Catches non-determinism that only shows under different thread
/// scheduling or memory layout.
///
/// # Panics
///
/// Panics if a battle thread panics.
pub fn run_parallel_battles<F>(setup_fn: F, num_battles: usize, num_ticks: u64) -> DeterminismResult
where
    F: Fn() -> BattleManager + Sync,
{
    let hashes: Vec<u64> = thread::scope(|s| {
        let handles: Vec<_> = (0..num_battles)
            .map(|_| {
                s.spawn(|| {
                    let mut battle = started(setup_fn());
                    for _ in 0..num_ticks {
                        battle.tick();
                    }
                    battle.state_hash()
                })
            })
            .collect();

        handles
            .into_iter()
            .map(|h| h.join().expect("battle thread panicked"))
            .collect()
    });

    DeterminismResult {
        is_deterministic: hashes.windows(2).all(|w| w[0] == w[1]),
        hashes,
        ticks: num_ticks,
    }
}

/// Compare two runs tick-by-tick, finding the first divergence.
///
/// # Returns
///
/// `None` if the runs match, `Some(tick)` if they diverge at that tick.
pub fn find_first_divergence<F>(setup_fn: F, num_ticks: u64) -> Option<u64>
where
    F: Fn() -> BattleManager,
{
    let mut first = started(setup_fn());
    let mut second = started(setup_fn());

    if first.state_hash() != second.state_hash() {
        return Some(0);
    }

    for tick in 1..=num_ticks {
        first.tick();
        second.tick();

        if first.state_hash() != second.state_hash() {
            return Some(tick);
        }
    }

    None
}

/// Snapshot after `num_ticks`, restore, then run both copies another
/// `num_ticks` and compare.
pub fn verify_snapshot_determinism<F>(setup_fn: F, num_ticks: u64) -> bool
where
    F: Fn() -> BattleManager,
{
    let mut battle = started(setup_fn());
    for _ in 0..num_ticks {
        battle.tick();
    }

    let Ok(bytes) = battle.snapshot() else {
        return false;
    };
    let Ok(mut restored) = BattleManager::restore(&bytes) else {
        return false;
    };
    if restored.state_hash() != battle.state_hash() {
        return false;
    }

    for _ in 0..num_ticks {
        battle.tick();
        restored.tick();
    }
    restored.state_hash() == battle.state_hash()
}

/// Compute a simple hash for any hashable value.
pub fn compute_hash<T: Hash>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

fn started(mut battle: BattleManager) -> BattleManager {
    if !battle.is_active() {
        battle.start_battle();
    }
    battle
}

/// Proptest strategies for battle inputs.
pub mod strategies {
    use battle_core::army::Side;
    use battle_core::math::{Fixed, Vec2Fixed};
    use battle_core::unit::{Unit, UnitStats};
    use battle_core::unit_kind::UnitKind;
    use proptest::prelude::*;

    /// Fixed-point coordinate on a typical battlefield.
    ///
    /// Range: -2000 to 2000
    pub fn arb_fixed_position() -> impl Strategy<Value = Fixed> {
        (-2000i32..2000i32).prop_map(Fixed::from_num)
    }

    /// Fixed-point 2D position.
    pub fn arb_vec2_position() -> impl Strategy<Value = Vec2Fixed> {
        (arb_fixed_position(), arb_fixed_position()).prop_map(|(x, y)| Vec2Fixed::new(x, y))
    }

    /// Any unit kind.
    pub fn arb_unit_kind() -> impl Strategy<Value = UnitKind> {
        prop::sample::select(UnitKind::ALL.to_vec())
    }

    /// Health values (1-1000).
    pub fn arb_health() -> impl Strategy<Value = u32> {
        1u32..1000u32
    }

    /// Attack or defense values (0-200).
    pub fn arb_stat() -> impl Strategy<Value = u32> {
        0u32..200u32
    }

    /// Size multiplier in quarter steps (0.25-4.0).
    pub fn arb_size() -> impl Strategy<Value = Fixed> {
        (1i32..=16i32).prop_map(|q| Fixed::from_num(q) / 4)
    }

    /// Attack range (1-300).
    pub fn arb_attack_range() -> impl Strategy<Value = Fixed> {
        (1i32..300i32).prop_map(Fixed::from_num)
    }

    /// Full stat block.
    pub fn arb_unit_stats() -> impl Strategy<Value = UnitStats> {
        (arb_stat(), arb_stat(), arb_stat(), arb_attack_range(), arb_size()).prop_map(
            |(attack, defense, magic_power, range, size)| UnitStats {
                attack,
                defense,
                magic_power,
                speed: Fixed::from_num(40),
                range,
                sight_range: Fixed::from_num(5000),
                size,
                attack_cooldown: Fixed::ONE,
            },
        )
    }

    /// A live unit of any kind at any position.
    pub fn arb_unit(id: u32, side: Side) -> impl Strategy<Value = Unit> {
        (arb_unit_kind(), arb_health(), arb_unit_stats(), arb_vec2_position()).prop_map(
            move |(kind, hp, stats, position)| Unit::new(id, kind, kind.as_str(), hp, stats, position, side),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{infantry_duel, preset_battle};
    use battle_core::math::Vec2Fixed;

    #[test]
    fn test_verify_determinism_simple() {
        let result = verify_determinism(3, 100, || 0u64, |n| *n += 1, |n| *n);

        assert!(result.is_deterministic);
        assert_eq!(result.hashes, vec![100, 100, 100]);
    }

    #[test]
    fn test_detects_nondeterminism() {
        let counter = std::cell::Cell::new(0u64);
        let result = verify_determinism(
            2,
            1,
            || {
                counter.set(counter.get() + 1);
                counter.get()
            },
            |_| {},
            |n| *n,
        );
        assert!(!result.is_deterministic);
        assert_eq!(result.unique_hashes().len(), 2);
    }

    #[test]
    fn test_duel_is_deterministic() {
        let result = verify_battle_determinism(
            || infantry_duel(Vec2Fixed::ZERO, Vec2Fixed::from_ints(10, 0)).0,
            3,
            200,
        );
        result.assert_deterministic();
    }

    #[test]
    fn test_preset_battle_has_no_divergence() {
        assert_eq!(
            find_first_divergence(|| preset_battle("plains", "balanced", "offensive", 7), 300),
            None
        );
    }

    #[test]
    fn test_parallel_battles_match() {
        run_parallel_battles(|| preset_battle("desert", "defensive", "balanced", 3), 4, 200)
            .assert_deterministic();
    }

    #[test]
    fn test_snapshot_round_trip_mid_battle() {
        assert!(verify_snapshot_determinism(
            || preset_battle("forest", "offensive", "offensive", 21),
            100
        ));
    }

    #[test]
    fn test_compute_hash_is_stable() {
        assert_eq!(compute_hash(&(1u32, "a")), compute_hash(&(1u32, "a")));
    }
}
