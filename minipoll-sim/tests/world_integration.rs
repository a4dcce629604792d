//! End-to-end world scenarios: contagion, combat, death, persistence.

use std::sync::Arc;

use parking_lot::Mutex;
use proptest::prelude::*;

use minipoll_core::brain::GoalKind;
use minipoll_core::config::{NeedConfig, PersistenceConfig};
use minipoll_core::emotion::EmotionKind;
use minipoll_core::needs::HUNGER;
use minipoll_core::persistence::SnapshotStore;
use minipoll_core::types::Position;
use minipoll_sim::collaborators::Call;
use minipoll_sim::{
    Collaborators, ConstantAmbient, CreatureArchetype, CreatureEvent, EventKind, Recorder, World, WorldConfig,
};

fn contagious_config() -> WorldConfig {
    let mut config = WorldConfig::default();
    // chance * dt is clamped to 1: every frame spreads.
    config.creature.emotion.spread_chance = 100.0;
    config
}

fn spawn_at(world: &mut World, name: &str, x: f32) -> minipoll_core::types::CreatureId {
    world
        .spawn(name, Position::new(x, 0.0, 0.0), CreatureArchetype::Balanced)
        .expect("spawn")
}

#[test]
fn fear_spreads_at_half_intensity_to_neighbours_only() {
    let mut world = World::new(contagious_config(), Collaborators::detached());
    let source = spawn_at(&mut world, "Source", 0.0);
    let near = spawn_at(&mut world, "Near", 3.0);
    let far = spawn_at(&mut world, "Far", 50.0);

    world
        .get_mut(source)
        .expect("present")
        .receive_emotion(EmotionKind::Afraid, 0.8, 0.0, 5.0);
    let tick = world.tick(0.1, &ConstantAmbient::default());
    assert_eq!(tick.pulses_delivered, 1);

    let level = |id| {
        world
            .get(id)
            .and_then(|c| c.emotions())
            .map_or(0.0, |e| e.level_of(EmotionKind::Afraid))
    };
    assert!((level(near) - 0.4).abs() < 1e-5, "near {}", level(near));
    assert_eq!(level(far), 0.0);
    assert!((level(source) - 0.8).abs() < 1e-5, "source never receives its own pulse");
    assert_eq!(world.counters().snapshot().emotion_spreads, 1);
}

#[test]
fn attack_records_memory_and_relationship() {
    let recorder = Recorder::new();
    let mut world = World::new(WorldConfig::default(), Collaborators::recording(&recorder));
    let wolf = spawn_at(&mut world, "Wolf", 0.0);
    let pip = spawn_at(&mut world, "Pip", 1.0);

    let dealt = world.attack(wolf, pip, 30.0).expect("both present");
    assert!((dealt - 28.0).abs() < 1e-5);

    let victim = world.get(pip).expect("present");
    let memory = victim.memory().expect("enabled");
    assert_eq!(memory.about(wolf).count(), 1);
    assert!(memory.sentiment_toward(wolf) < 0.0);
    assert_eq!(
        recorder.count(|c| matches!(c, Call::Relationship { from, toward, delta } if *from == pip && *toward == wolf && *delta < 0.0)),
        1
    );
    assert_eq!(world.counters().snapshot().damage_events, 1);
}

#[test]
fn dead_attacker_deals_no_damage() {
    let mut world = World::new(WorldConfig::default(), Collaborators::detached());
    let wolf = spawn_at(&mut world, "Wolf", 0.0);
    let pip = spawn_at(&mut world, "Pip", 1.0);
    assert!(world.get_mut(wolf).expect("present").kill(None));

    assert_eq!(world.attack(wolf, pip, 30.0).expect("both present"), 0.0);
    let victim = world.get(pip).expect("present");
    assert_eq!(victim.health(), victim.max_health());
    assert_eq!(victim.memory().expect("enabled").about(wolf).count(), 0);
    assert_eq!(world.counters().snapshot().damage_events, 0);
}

#[test]
fn non_finite_config_rejects_spawn() {
    let mut config = WorldConfig::default();
    config.creature.emotion.spread_chance = f32::NAN;
    let mut world = World::new(config, Collaborators::detached());
    assert!(world.spawn("Pip", Position::default(), CreatureArchetype::Balanced).is_err());
    assert!(world.is_empty());
    world.tick(0.1, &ConstantAmbient::default());

    let mut config = WorldConfig::default();
    config.creature.stats.stats[0].min = f32::NAN;
    let mut world = World::new(config, Collaborators::detached());
    assert!(world.spawn("Pip", Position::default(), CreatureArchetype::Balanced).is_err());
}

#[test]
fn killed_creature_is_removed_after_delay() {
    let recorder = Recorder::new();
    let mut world = World::new(WorldConfig::default(), Collaborators::recording(&recorder));
    let wolf = spawn_at(&mut world, "Wolf", 0.0);
    let pip = spawn_at(&mut world, "Pip", 1.0);

    let died = Arc::new(Mutex::new(Vec::new()));
    let d = died.clone();
    world
        .get_mut(pip)
        .expect("present")
        .subscribe_to(EventKind::Died, move |e| d.lock().push(e.clone()));

    let ambient = ConstantAmbient::default();
    while world.get(pip).is_some_and(|c| c.is_alive()) {
        world.attack(wolf, pip, 60.0).expect("both present");
        // Let the invulnerability window pass.
        world.tick(1.0, &ambient);
    }
    assert_eq!(
        died.lock().as_slice(),
        [CreatureEvent::Died {
            creature: pip,
            killer: Some(wolf)
        }]
    );
    assert_eq!(world.get(pip).map(|c| c.current_action()), Some("dead"));
    assert_eq!(recorder.count(|c| matches!(c, Call::Death { creature } if *creature == pip)), 1);

    for _ in 0..11 {
        world.tick(1.0, &ambient);
    }
    assert!(world.get(pip).is_none());
    assert_eq!(recorder.count(|c| matches!(c, Call::Removed { creature } if *creature == pip)), 1);
    assert_eq!(world.counters().snapshot().deaths, 1);
}

#[test]
fn revive_before_removal_keeps_creature() {
    let mut world = World::new(WorldConfig::default(), Collaborators::detached());
    let pip = spawn_at(&mut world, "Pip", 0.0);
    world.get_mut(pip).expect("present").kill(None);
    world.tick(5.0, &ConstantAmbient::default());
    assert!(world.revive(pip, 0.5).expect("present"));
    for _ in 0..20 {
        world.tick(1.0, &ConstantAmbient::default());
    }
    assert!(world.get(pip).is_some_and(|c| c.is_alive()));
    assert_eq!(world.counters().snapshot().revives, 1);
}

#[test]
fn hunger_drives_goal_and_events() {
    let mut config = WorldConfig::default();
    config.creature.needs.needs = vec![NeedConfig {
        name: HUNGER.to_string(),
        initial_value: 30.0,
        decrease_rate: 2.0,
        critical_threshold: 20.0,
        health_damage_rate: 1.0,
    }];
    let recorder = Recorder::new();
    let mut world = World::new(config, Collaborators::recording(&recorder));
    let pip = spawn_at(&mut world, "Pip", 0.0);

    let critical = Arc::new(Mutex::new(0));
    let c = critical.clone();
    world
        .get_mut(pip)
        .expect("present")
        .subscribe_to(EventKind::NeedCritical, move |_| *c.lock() += 1);

    for _ in 0..10 {
        world.tick(1.0, &ConstantAmbient::default());
    }
    let creature = world.get(pip).expect("present");
    assert_eq!(*critical.lock(), 1);
    assert_eq!(creature.current_goal(), Some(GoalKind::FindFood));
    assert!(creature.health() < creature.max_health());
    assert!(recorder.count(|c| matches!(c, Call::Move { intent, .. } if intent.goal == GoalKind::FindFood)) > 0);

    world.get_mut(pip).expect("present").interact(GoalKind::FindFood, 85.0);
    assert!(world.get(pip).expect("present").need_value(HUNGER) > 90.0);
}

#[test]
fn world_save_and_load() {
    let store = SnapshotStore::open_in_memory(&PersistenceConfig::default()).expect("store");
    let mut world = World::new(WorldConfig::default(), Collaborators::detached());
    let wolf = spawn_at(&mut world, "Wolf", 0.0);
    let pip = spawn_at(&mut world, "Pip", 2.0);
    world.attack(wolf, pip, 40.0).expect("present");
    world.tick(1.0, &ConstantAmbient::default());
    assert_eq!(world.save_all(&store).expect("save"), 2);

    let mut restored = World::new(WorldConfig::default(), Collaborators::detached());
    assert_eq!(restored.load_into(&store).expect("load"), 2);
    let original = world.get(pip).expect("present");
    let copy = restored.get(pip).expect("restored with same id");
    assert!((copy.health() - original.health()).abs() < 1e-4);
    assert_eq!(copy.position(), original.position());
    assert_eq!(copy.memory().expect("enabled").about(wolf).count(), 1);
    assert_eq!(world.counters().snapshot().saves_completed, 2);

    // Loading again restores in place.
    assert_eq!(restored.load_into(&store).expect("load"), 2);
    assert_eq!(restored.len(), 2);
}

#[test]
fn load_rebuilds_saved_preset() {
    let store = SnapshotStore::open_in_memory(&PersistenceConfig::default()).expect("store");
    let mut world = World::new(WorldConfig::default(), Collaborators::detached());
    let wisp = world
        .spawn("Wisp", Position::default(), CreatureArchetype::Fragile)
        .expect("spawn");
    world.save_all(&store).expect("save");

    let mut restored = World::new(WorldConfig::default(), Collaborators::detached());
    restored.load_into(&store).expect("load");
    assert_eq!(restored.get(wisp).and_then(|c| c.profile()), Some("Fragile"));

    // Fragile needs drain faster than Balanced ones; the copy must keep pace.
    world.tick(10.0, &ConstantAmbient::default());
    restored.tick(10.0, &ConstantAmbient::default());
    let hunger = |w: &World| w.get(wisp).expect("present").need_value(HUNGER);
    assert!((hunger(&world) - hunger(&restored)).abs() < 1e-4);
}

#[test]
fn populate_uses_spawn_list() {
    let config = WorldConfig::from_toml(
        r#"
        [[spawn]]
        name = "Pip"

        [[spawn]]
        name = "Wisp"
        archetype = "Skittish"
        position = [3.0, 0.0, 0.0]
        "#,
    )
    .expect("config");
    let mut world = World::new(config, Collaborators::detached());
    assert_eq!(world.populate(), 2);
    assert_eq!(world.creatures()[1].name(), "Wisp");
    assert_eq!(world.alive(), 2);
}

fn run_levels(seed: u64) -> Vec<f32> {
    let mut config = WorldConfig {
        seed,
        ..WorldConfig::default()
    };
    config.creature.emotion.spread_chance = 0.5;
    let mut world = World::new(config, Collaborators::detached());
    let ids: Vec<_> = (0..4).map(|i| spawn_at(&mut world, "C", i as f32)).collect();
    world
        .get_mut(ids[0])
        .expect("present")
        .receive_emotion(EmotionKind::Afraid, 1.0, 0.01, 10.0);
    for _ in 0..30 {
        world.tick(0.2, &ConstantAmbient::default());
    }
    ids.iter()
        .map(|id| {
            world
                .get(*id)
                .and_then(|c| c.emotions())
                .map_or(0.0, |e| e.level_of(EmotionKind::Afraid))
        })
        .collect()
}

#[test]
fn same_seed_same_run() {
    assert_eq!(run_levels(7), run_levels(7));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn attacks_keep_health_in_bounds(hits in prop::collection::vec((0.0..150.0f32, 0.0..2.0f32), 1..20)) {
        let mut world = World::new(WorldConfig::default(), Collaborators::detached());
        let wolf = spawn_at(&mut world, "Wolf", 0.0);
        let pip = spawn_at(&mut world, "Pip", 1.0);
        for (amount, dt) in hits {
            if world.get(pip).is_none() {
                break;
            }
            world.attack(wolf, pip, amount).expect("present");
            world.tick(dt, &ConstantAmbient::default());
            if let Some(c) = world.get(pip) {
                prop_assert!(c.health() >= 0.0 && c.health() <= c.max_health());
                prop_assert_eq!(c.is_alive(), c.health() > 0.0);
            }
        }
    }
}
