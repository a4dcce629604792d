//! Integration tests: model scenarios, persistence on disk, config files.

use chrono::Utc;
use minipoll_core::brain::GoalKind;
use minipoll_core::config::{
    HealthConfig, MemoryConfig, MinipollConfig, NeedConfig, NeedsConfig, PersistenceConfig, StatsConfig,
};
use minipoll_core::emotion::{EmotionInstance, EmotionKind, EmotionModel};
use minipoll_core::health::{DamageType, HealthModel};
use minipoll_core::memory::{InteractionType, MemoryStore};
use minipoll_core::needs::{HUNGER, NeedsModel};
use minipoll_core::persistence::SnapshotStore;
use minipoll_core::snapshot::{CreatureSnapshot, HealthSnapshot, NeedValue, SNAPSHOT_VERSION};
use minipoll_core::stats::{Modifier, StatBlock, StatKind};
use minipoll_core::types::{CreatureId, Position};

fn snapshot(name: &str, memories: usize) -> CreatureSnapshot {
    let mut store = MemoryStore::new(&MemoryConfig::default());
    let other = CreatureId::new();
    for i in 0..memories {
        let kind = if i % 2 == 0 { InteractionType::Played } else { InteractionType::Attacked };
        let impact = if i % 2 == 0 { 0.3 } else { -0.6 };
        store.remember_interaction(other, kind, impact);
    }
    CreatureSnapshot {
        version: SNAPSHOT_VERSION,
        id: CreatureId::new(),
        name: name.to_string(),
        position: Position::new(4.0, -2.0, 0.0),
        saved_at: Utc::now(),
        stats: StatBlock::new(&StatsConfig::default()).base_values(),
        needs: NeedsModel::new(&NeedsConfig::default())
            .needs()
            .iter()
            .map(|n| NeedValue {
                name: n.name.clone(),
                value: n.value,
            })
            .collect(),
        emotions: vec![EmotionInstance {
            kind: EmotionKind::Afraid,
            intensity: 0.7,
            decay_rate: 0.05,
            spread_radius: 5.0,
        }],
        memories: store.iter().cloned().collect(),
        memory_clock: store.clock(),
        health: HealthSnapshot {
            current: 20.0,
            max: 100.0,
            critical: true,
            dead: false,
        },
        current_goal: Some(GoalKind::Escape),
        profile: None,
    }
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

#[test]
fn starving_for_200_seconds() {
    let config = NeedsConfig {
        needs: vec![NeedConfig {
            name: HUNGER.to_string(),
            initial_value: 60.0,
            decrease_rate: 0.3,
            critical_threshold: 10.0,
            health_damage_rate: 0.5,
        }],
        ..NeedsConfig::default()
    };
    let mut needs = NeedsModel::new(&config);
    let mut health = HealthModel::new(&HealthConfig::default(), 100.0);
    let mut damaging_ticks = 0;
    for _ in 0..200 {
        let report = needs.tick(1.0, 1.0);
        if needs.value(HUNGER) <= 10.0 {
            assert!((report.damage - 0.5).abs() < 1e-6);
            damaging_ticks += 1;
        } else {
            assert_eq!(report.damage, 0.0);
        }
        health.drain(report.damage, DamageType::Starvation);
        health.tick(1.0);
    }
    assert!(needs.value(HUNGER) < 1e-3);
    needs.tick(1.0, 1.0);
    assert_eq!(needs.value(HUNGER), 0.0);
    assert_eq!(damaging_ticks, 34);
    // Regeneration stays blocked while the drain keeps restarting the delay.
    assert!((health.current() - 83.0).abs() < 1e-3, "health {}", health.current());
}

#[test]
fn happy_twice_merges_into_one_instance() {
    let mut model = EmotionModel::new();
    model.add(EmotionKind::Happy, 0.6, 0.02, 0.0);
    let level = model.add(EmotionKind::Happy, 0.6, 0.02, 0.0);
    assert_eq!(level, 1.0);
    assert_eq!(model.len(), 1);
}

#[test]
fn fifty_damage_against_ten_defense() {
    let mut health = HealthModel::new(&HealthConfig::default(), 100.0);
    let dealt = health.take_damage(50.0, 10.0, None, DamageType::Physical);
    assert_eq!(dealt, 40.0);
    assert_eq!(health.current(), 60.0);
    assert!(health.is_invulnerable());
}

#[test]
fn capacity_two_keeps_last_two() {
    let mut store = MemoryStore::new(&MemoryConfig {
        max_capacity: 2,
        retention_window: 600.0,
    });
    store.add("first", None, true, 0.1);
    store.add("second", None, true, 0.1);
    store.add("third", None, false, 0.1);
    let kept: Vec<_> = store.iter().map(|m| m.description.as_str()).collect();
    assert_eq!(kept, ["second", "third"]);
}

#[test]
fn timed_modifier_expires() {
    let mut stats = StatBlock::new(&StatsConfig::default());
    let base = stats.get_effective(StatKind::Strength);
    stats.add_modifier(StatKind::Strength, Modifier::flat(5.0, "potion").lasting(2.0));
    assert!((stats.get_effective(StatKind::Strength) - base - 5.0).abs() < 1e-5);
    assert!(stats.tick(1.0).is_empty());
    assert_eq!(stats.tick(1.5).len(), 1);
    assert!((stats.get_effective(StatKind::Strength) - base).abs() < 1e-5);
}

// ---------------------------------------------------------------------------
// Persistence
// ---------------------------------------------------------------------------

#[test]
fn snapshots_survive_reopen() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("creatures.db");
    let config = PersistenceConfig::default();
    let pip = snapshot("Pip", 4);
    let bo = snapshot("Bo", 0);
    {
        let store = SnapshotStore::open(&path, &config).expect("open");
        assert_eq!(store.save_batch([&pip, &bo]).expect("save"), 2);
    }
    let store = SnapshotStore::open(&path, &config).expect("reopen");
    assert_eq!(store.count().expect("count"), 2);
    assert!(store.integrity_check().expect("integrity"));
    let loaded = store.load(pip.id).expect("load").expect("present");
    assert_eq!(loaded, pip);
    assert_eq!(loaded.memories.len(), 4);

    let backup = dir.path().join("backup.db");
    store.backup(&backup).expect("backup");
    let copy = SnapshotStore::open(&backup, &config).expect("open backup");
    assert_eq!(copy.list().expect("list").len(), 2);
}

#[test]
fn save_overwrites_same_creature() {
    let store = SnapshotStore::open_in_memory(&PersistenceConfig::default()).expect("open");
    let mut pip = snapshot("Pip", 1);
    store.save(&pip).expect("save");
    pip.health.current = 90.0;
    store.save(&pip).expect("save again");
    assert_eq!(store.count().expect("count"), 1);
    let loaded = store.load(pip.id).expect("load").expect("present");
    assert_eq!(loaded.health.current, 90.0);
    assert!(store.delete(pip.id).expect("delete"));
    assert!(store.load(pip.id).expect("load").is_none());
}

#[test]
fn compact_encoding_is_smaller_than_json() {
    let snap = snapshot("Pip", 20);
    let json = snap.to_json().expect("json");
    let compact = bincode::serialize(&snap).expect("bincode");
    assert!(compact.len() < json.len(), "bincode {} vs json {}", compact.len(), json.len());
    // 50 memories must stay well under a frame's I/O budget.
    let full = snapshot("Full", 50);
    assert!(full.to_json().expect("json").len() < 64 * 1024);
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

#[test]
fn config_file_round_trip() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("minipoll.toml");
    std::fs::write(
        &path,
        r#"
        [memory]
        max_capacity = 12

        [health]
        regen_rate = 3.0

        [[needs.needs]]
        name = "hunger"
        initial_value = 50.0
        decrease_rate = 1.0
        "#,
    )
    .expect("write");
    let config = MinipollConfig::from_file(&path).expect("parse");
    assert_eq!(config.memory.max_capacity, 12);
    assert_eq!(config.needs.needs.len(), 1);
    assert!(config.validate().is_ok());

    assert!(MinipollConfig::from_file(&dir.path().join("missing.toml")).is_err());
}
