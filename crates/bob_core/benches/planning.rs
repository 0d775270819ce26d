//! Planning benchmarks for bob_core.
//!
//! Run with: `cargo bench -p bob_core`

// Benchmark binaries don't need docs on macro-generated functions
#![allow(missing_docs)]

use bob_core::data::parse_timeline;
use bob_core::prelude::*;
use bob_test_utils::fixtures::{kind, protoss_registry, FixtureWorld};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

const TIMINGS: &str = include_str!("../../../assets/data/attack/Protoss_timings.txt");

fn world(registry: &UnitKindRegistry) -> FixtureWorld {
    let mut world = FixtureWorld::new();
    world.spawn(kind(registry, "nexus"));
    world.spawn_many(kind(registry, "probe"), 20);
    world.spawn_many(kind(registry, "pylon"), 3);
    world.spawn_many(kind(registry, "zealot"), 6);
    world.set_supply(64, 66);
    world
}

/// Goal computation from a cold timeline and from a cached one.
pub fn build_goal_benchmark(c: &mut Criterion) {
    let registry = protoss_registry();
    let world = world(&registry);

    for (name, config) in [
        ("build_goal_current", PlannerConfig::default()),
        (
            "build_goal_merge_pending",
            PlannerConfig {
                composition_mode: CompositionMode::MergePending,
                ..PlannerConfig::default()
            },
        ),
    ] {
        let resolver = BuildGoalResolver::new(&registry, Race::Protoss, &config);
        let mut timeline = AttackPlanTimeline::new(parse_timeline(TIMINGS));
        let roster = AttackRoster::new();
        c.bench_function(name, |b| {
            b.iter(|| black_box(resolver.compute_goal(&mut timeline, &roster, &world)));
        });
    }
}

/// Opening selection over a catalog with history.
pub fn selection_benchmark(c: &mut Criterion) {
    let labels: Vec<String> = (0..32).map(|i| format!("opening_{i}")).collect();
    let losses: Vec<u32> = (0..32).map(|i| i % 7 + 1).collect();

    c.bench_function("select_strategy_ucb", |b| {
        b.iter(|| {
            let mut catalog = OpeningCatalog::from_labels(labels.iter().cloned());
            catalog.apply_losses(&losses);
            let mut selector = StrategySelector::new(catalog, "bench", &PlannerConfig::default());
            black_box(selector.select_strategy())
        });
    });
}

criterion_group!(benches, build_goal_benchmark, selection_benchmark);
criterion_main!(benches);
