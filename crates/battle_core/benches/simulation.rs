//! Simulation benchmarks for battle_core.
//!
//! Run with: `cargo bench -p battle_core`

// Benchmark binaries don't need docs on macro-generated functions
#![allow(missing_docs)]

use battle_core::prelude::*;
use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};

fn preset_battle(stage: &str, seed: u64) -> BattleManager {
    let catalog = DataCatalog::builtin().expect("built-in data tables must load");
    let mut battle = BattleManager::from_presets(&catalog, stage, "balanced", "offensive", seed)
        .expect("preset battle must build");
    battle.start_battle();
    battle
}

/// One tick of a freshly deployed preset battle, and the same battle
/// mid-fight after armies have closed.
pub fn tick_benchmark(c: &mut Criterion) {
    let opening = preset_battle("plains", 1);
    c.bench_function("tick_opening", |b| {
        b.iter_batched(
            || opening.clone(),
            |mut battle| black_box(battle.tick()),
            BatchSize::SmallInput,
        )
    });

    let mut engaged = preset_battle("plains", 1);
    for _ in 0..200 {
        engaged.tick();
    }
    c.bench_function("tick_engaged", |b| {
        b.iter_batched(
            || engaged.clone(),
            |mut battle| black_box(battle.tick()),
            BatchSize::SmallInput,
        )
    });
}

/// A whole preset battle from deployment to outcome.
pub fn full_battle_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("full_battle");
    group.sample_size(10);
    for stage in ["plains", "forest"] {
        let battle = preset_battle(stage, 7);
        group.bench_function(stage, |b| {
            b.iter_batched(
                || battle.clone(),
                |mut battle| black_box(battle.run_to_completion(u64::MAX)),
                BatchSize::SmallInput,
            )
        });
    }
    group.finish();
}

/// State hashing, run every tick in debug builds.
pub fn state_hash_benchmark(c: &mut Criterion) {
    let battle = preset_battle("hills", 3);
    c.bench_function("state_hash", |b| b.iter(|| black_box(battle.state_hash())));
}

criterion_group!(benches, tick_benchmark, full_battle_benchmark, state_hash_benchmark);
criterion_main!(benches);
