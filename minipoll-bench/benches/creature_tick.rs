//! minipoll benchmark suite.
//!
//! Per-frame budgets the world driver is tuned against:
//!   needs_tick ..................... < 1μs
//!   brain_decide ................... < 2μs
//!   creature_tick .................. < 10μs
//!   world_tick_20_creatures ........ < 200μs
//!   snapshot_json_50_memories ...... < 100μs

use criterion::{Criterion, black_box, criterion_group, criterion_main};

use minipoll_core::brain::{BrainInputs, GoalArbiter, MoodSignals};
use minipoll_core::config::{BrainConfig, MinipollConfig, NeedsConfig};
use minipoll_core::emotion::EmotionKind;
use minipoll_core::memory::InteractionType;
use minipoll_core::needs::NeedsModel;
use minipoll_core::types::{CreatureId, Position};
use minipoll_sim::collaborators::Ambient;
use minipoll_sim::{Collaborators, ConstantAmbient, Creature, CreatureArchetype, World, WorldConfig};

fn busy_creature() -> Creature {
    let mut creature = Creature::new(
        "Bench",
        Position::default(),
        &MinipollConfig::default(),
        7,
        Collaborators::detached(),
    )
    .expect("default config is valid");
    let other = CreatureId::new();
    for i in 0..50 {
        let impact = if i % 3 == 0 { -0.4 } else { 0.3 };
        creature.remember(other, InteractionType::Played, impact);
    }
    creature.receive_emotion(EmotionKind::Curious, 0.6, 0.0, 4.0);
    creature.receive_emotion(EmotionKind::Happy, 0.4, 0.0, 0.0);
    creature
}

fn bench_needs_tick(c: &mut Criterion) {
    let mut needs = NeedsModel::new(&NeedsConfig::default());
    c.bench_function("needs_tick", |b| {
        b.iter(|| {
            let report = needs.tick(black_box(0.016), 1.0);
            needs.fill("hunger", 0.01);
            black_box(report);
        });
    });
}

fn bench_brain_decide(c: &mut Criterion) {
    let mut brain = GoalArbiter::new(&BrainConfig::default());
    let inputs = BrainInputs {
        hunger: Some(0.4),
        thirst: Some(0.6),
        energy: Some(0.8),
        social: Some(0.5),
        threat: 0.1,
        mood: MoodSignals::default(),
    };
    c.bench_function("brain_decide", |b| {
        b.iter(|| black_box(brain.decide(black_box(&inputs))));
    });
}

fn bench_creature_tick(c: &mut Criterion) {
    let mut creature = busy_creature();
    c.bench_function("creature_tick", |b| {
        b.iter(|| black_box(creature.tick(black_box(0.016), Ambient::default())));
    });
}

fn bench_world_tick(c: &mut Criterion) {
    let mut world = World::new(WorldConfig::default(), Collaborators::detached());
    for i in 0..20u8 {
        let x = f32::from(i) * 2.0;
        world
            .spawn("Bench", Position::new(x, 0.0, 0.0), CreatureArchetype::Social)
            .expect("preset config is valid");
    }
    let ambient = ConstantAmbient::default();
    c.bench_function("world_tick_20_creatures", |b| {
        b.iter(|| black_box(world.tick(black_box(0.016), &ambient)));
    });
}

fn bench_snapshot(c: &mut Criterion) {
    let creature = busy_creature();
    c.bench_function("snapshot_json_50_memories", |b| {
        b.iter(|| {
            let bytes = creature.snapshot().to_json().expect("encodes");
            black_box(bytes);
        });
    });
}

criterion_group!(
    benches,
    bench_needs_tick,
    bench_brain_decide,
    bench_creature_tick,
    bench_world_tick,
    bench_snapshot,
);
criterion_main!(benches);
