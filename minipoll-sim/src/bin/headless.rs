//! Headless world runner.
//!
//! Usage: `minipoll-headless [world.toml]`
//!
//! Without a config file a small demo population is used. Movement is not
//! simulated: any creature pursuing a need-serving goal is treated as having
//! reached its target and is served a small amount every frame.

use std::path::Path;

use anyhow::{Context, bail};
use minipoll_core::brain::GoalKind;
use minipoll_core::needs::{ENERGY, HUNGER, THIRST};
use minipoll_core::persistence::SnapshotStore;
use minipoll_core::types::CreatureId;
use minipoll_sim::collaborators::Call;
use minipoll_sim::config::SpawnSpec;
use minipoll_sim::{
    AmbientSource, Collaborators, ConstantAmbient, CreatureArchetype, DayNightCycle, Recorder, World, WorldConfig,
    telemetry,
};
use tracing::info;

/// Need points served per second to a creature at its target.
const SERVE_RATE: f32 = 6.0;

fn demo_config() -> WorldConfig {
    let spawn = |name: &str, archetype, x| SpawnSpec {
        name: name.to_string(),
        archetype,
        position: [x, 0.0, 0.0],
    };
    WorldConfig {
        spawn: vec![
            spawn("Pip", CreatureArchetype::Balanced, 0.0),
            spawn("Bramble", CreatureArchetype::Hardy, 2.0),
            spawn("Wisp", CreatureArchetype::Skittish, 4.0),
            spawn("Tansy", CreatureArchetype::Social, 6.0),
        ],
        ..WorldConfig::default()
    }
}

fn serve_intents(world: &mut World, recorder: &Recorder, dt: f32) {
    let mut latest: Vec<(CreatureId, GoalKind)> = Vec::new();
    for call in recorder.calls() {
        if let Call::Move { creature, intent } = call {
            match latest.iter_mut().find(|(id, _)| *id == creature) {
                Some(entry) => entry.1 = intent.goal,
                None => latest.push((creature, intent.goal)),
            }
        }
    }
    recorder.clear();
    for (id, goal) in latest {
        if let Some(creature) = world.get_mut(id) {
            creature.interact(goal, SERVE_RATE * dt);
        }
    }
}

fn main() -> anyhow::Result<()> {
    let config = match std::env::args().nth(1) {
        Some(path) => WorldConfig::from_file(Path::new(&path)).with_context(|| format!("loading {path}"))?,
        None => demo_config(),
    };
    telemetry::init_tracing(&config.creature.general.log_level, config.creature.general.json_logs);

    let recorder = Recorder::new();
    let mut world = World::new(config.clone(), Collaborators::recording(&recorder));
    if world.populate() == 0 {
        bail!("no creature could be spawned");
    }
    info!(creatures = world.len(), ticks = config.run.ticks, "Starting headless run");

    let ambient: Box<dyn AmbientSource> = if config.run.day_length > 0.0 {
        Box::new(DayNightCycle {
            day_length: config.run.day_length,
            ..DayNightCycle::default()
        })
    } else {
        Box::new(ConstantAmbient::default())
    };

    for _ in 0..config.run.ticks {
        let tick = world.tick(config.run.dt, ambient.as_ref());
        for id in &tick.deaths {
            info!(creature = %id, elapsed = world.elapsed(), "Death");
        }
        serve_intents(&mut world, &recorder, config.run.dt);
    }

    if let Some(path) = &config.run.save_path {
        let store = SnapshotStore::open(path, &config.creature.persistence)
            .with_context(|| format!("opening {path}"))?;
        world.save_all(&store)?;
    }

    println!("{:<10} {:>7} {:>7} {:>7} {:>7}  action", "name", "health", "hunger", "thirst", "energy");
    for creature in world.creatures() {
        println!(
            "{:<10} {:>7.1} {:>7.1} {:>7.1} {:>7.1}  {}",
            creature.name(),
            creature.health(),
            creature.need_value(HUNGER),
            creature.need_value(THIRST),
            creature.need_value(ENERGY),
            creature.current_action(),
        );
    }
    let timing = world.timings().summary();
    println!(
        "\n{} frames, avg {:.3} ms, max {:.3} ms, {:.1}% over budget\n",
        timing.frames,
        timing.average_ms,
        timing.max_ms,
        timing.over_budget_ratio * 100.0
    );
    print!("{}", world.counters().snapshot().to_prometheus());
    Ok(())
}
