//! Multi-creature tick driver.
//!
//! A frame runs in four phases so that the result does not depend on the
//! order creatures are stored in:
//!
//! 1. take a position snapshot of every living creature
//! 2. tick each creature's own models
//! 3. deliver the emotion pulses collected in (2), looking neighbours up in
//!    the snapshot from (1)
//! 4. remove creatures whose removal timer fired

use std::sync::Arc;

use minipoll_core::error::{MinipollError, Result};
use minipoll_core::metrics::{SimCounters, TickTimings, spans};
use minipoll_core::persistence::SnapshotStore;
use minipoll_core::types::{CreatureId, Position};
use tracing::{Level, debug, info, span, warn};

use crate::collaborators::{AmbientSource, Collaborators, ProximityQuery};
use crate::config::{CreatureArchetype, WorldConfig};
use crate::creature::Creature;

/// Positions of living creatures at the start of a frame.
#[derive(Debug, Clone, Default)]
pub struct PositionSnapshot {
    entries: Vec<(CreatureId, Position)>,
}

impl PositionSnapshot {
    /// Capture living creatures.
    #[must_use]
    pub fn capture(creatures: &[Creature]) -> Self {
        Self {
            entries: creatures
                .iter()
                .filter(|c| c.is_alive())
                .map(|c| (c.id(), c.position()))
                .collect(),
        }
    }

    /// Number of captured creatures.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing was captured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl ProximityQuery for PositionSnapshot {
    fn within(&self, origin: Position, radius: f32, exclude: CreatureId) -> Vec<CreatureId> {
        self.entries
            .iter()
            .filter(|(id, pos)| *id != exclude && pos.distance(&origin) <= radius)
            .map(|(id, _)| *id)
            .collect()
    }

    fn position_of(&self, creature: CreatureId) -> Option<Position> {
        self.entries
            .iter()
            .find(|(id, _)| *id == creature)
            .map(|(_, pos)| *pos)
    }
}

/// Summary of one world frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorldTick {
    /// Emotion pulses that reached a receiver.
    pub pulses_delivered: usize,
    /// Creatures that died this frame.
    pub deaths: Vec<CreatureId>,
    /// Creatures removed this frame.
    pub removed: Vec<CreatureId>,
}

/// A population of creatures sharing one set of collaborators.
pub struct World {
    config: WorldConfig,
    collaborators: Collaborators,
    creatures: Vec<Creature>,
    elapsed: f64,
    spawned: u64,
    counters: Arc<SimCounters>,
    timings: TickTimings,
}

impl std::fmt::Debug for World {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("World")
            .field("creatures", &self.creatures.len())
            .field("elapsed", &self.elapsed)
            .finish_non_exhaustive()
    }
}

impl World {
    /// Empty world.
    #[must_use]
    pub fn new(config: WorldConfig, collaborators: Collaborators) -> Self {
        let timings = TickTimings::new(config.frame_budget_ms);
        Self {
            config,
            collaborators,
            creatures: Vec::new(),
            elapsed: 0.0,
            spawned: 0,
            counters: Arc::new(SimCounters::new()),
            timings,
        }
    }

    /// Spawn every creature listed in the config. Rejected spawns are logged
    /// and skipped. Returns the number spawned.
    pub fn populate(&mut self) -> usize {
        let specs = self.config.spawn.clone();
        specs
            .iter()
            .filter(|spec| {
                let [x, y, z] = spec.position;
                self.spawn(&spec.name, Position::new(x, y, z), spec.archetype).is_ok()
            })
            .count()
    }

    /// Add a creature.
    ///
    /// # Errors
    /// Returns `MinipollError::Config` if the archetype's config is invalid;
    /// the world is left unchanged.
    pub fn spawn(&mut self, name: &str, position: Position, archetype: CreatureArchetype) -> Result<CreatureId> {
        let config = self.config.creature_config(archetype);
        let seed = self.next_seed();
        match Creature::new(name, position, &config, seed, self.collaborators.clone()) {
            Ok(mut creature) => {
                creature.set_profile(archetype.name());
                let id = creature.id();
                info!(creature = %id, name, ?archetype, "Spawned");
                self.creatures.push(creature);
                Ok(id)
            }
            Err(e) => {
                warn!(name, ?archetype, error = %e, "Spawn rejected");
                Err(e)
            }
        }
    }

    fn next_seed(&mut self) -> u64 {
        let seed = self
            .config
            .seed
            .wrapping_add(self.spawned.wrapping_mul(0x9E37_79B9_7F4A_7C15));
        self.spawned += 1;
        seed
    }

    /// Run one frame.
    pub fn tick(&mut self, dt: f32, environment: &dyn AmbientSource) -> WorldTick {
        let _timing = self.timings.begin();
        let frame = span!(Level::DEBUG, spans::WORLD_TICK, creatures = self.creatures.len());
        let _enter = frame.enter();

        let ambient = environment.ambient(self.elapsed);
        let snapshot = PositionSnapshot::capture(&self.creatures);
        let mut report = WorldTick::default();

        let mut outgoing = Vec::new();
        for creature in &mut self.creatures {
            let was_alive = creature.is_alive();
            let tick = creature.tick(dt, ambient);
            if was_alive {
                SimCounters::add(&self.counters.creature_ticks, 1);
            }
            SimCounters::add(&self.counters.goal_switches, u64::from(tick.goal_switches));
            SimCounters::add(&self.counters.memories_evicted, tick.memories_forgotten as u64);
            if tick.died {
                SimCounters::add(&self.counters.deaths, 1);
                report.deaths.push(creature.id());
            }
            let origin = creature.position();
            outgoing.extend(tick.pulses.into_iter().map(|p| (creature.id(), origin, p)));
        }

        {
            let spread = span!(Level::DEBUG, spans::SPREAD, pulses = outgoing.len());
            let _enter = spread.enter();
            for (source, origin, pulse) in outgoing {
                for receiver in snapshot.within(origin, pulse.radius, source) {
                    if let Some(creature) = self.creatures.iter_mut().find(|c| c.id() == receiver)
                        && creature.receive_emotion(pulse.kind, pulse.intensity, pulse.decay_rate, pulse.radius) > 0.0
                    {
                        report.pulses_delivered += 1;
                    }
                }
            }
        }
        SimCounters::add(&self.counters.emotion_spreads, report.pulses_delivered as u64);

        let mut kept = Vec::with_capacity(self.creatures.len());
        for mut creature in self.creatures.drain(..) {
            if creature.ready_for_removal() {
                debug!(creature = %creature.id(), "Removing creature");
                report.removed.push(creature.id());
                creature.teardown();
            } else {
                kept.push(creature);
            }
        }
        self.creatures = kept;

        self.elapsed += f64::from(dt.max(0.0));
        report
    }

    /// `attacker` hits `target` for `amount`. Returns the damage dealt;
    /// a dead attacker deals none.
    ///
    /// # Errors
    /// Returns `MinipollError::CreatureNotFound` if either creature is missing.
    pub fn attack(&mut self, attacker: CreatureId, target: CreatureId, amount: f32) -> Result<f32> {
        let attacker_alive = self
            .get(attacker)
            .ok_or(MinipollError::CreatureNotFound(attacker))?
            .is_alive();
        if self.get(target).is_none() {
            return Err(MinipollError::CreatureNotFound(target));
        }
        if !attacker_alive {
            let error = MinipollError::InvariantViolation("attack by a dead creature".to_string());
            debug!(%attacker, %target, %error, "Attack ignored");
            return Ok(0.0);
        }
        let victim = self
            .get_mut(target)
            .ok_or(MinipollError::CreatureNotFound(target))?;
        let was_alive = victim.is_alive();
        let dealt = victim.take_damage(amount, Some(attacker));
        let died = was_alive && !victim.is_alive();
        if dealt > 0.0 {
            SimCounters::add(&self.counters.damage_events, 1);
        }
        if died {
            SimCounters::add(&self.counters.deaths, 1);
        }
        Ok(dealt)
    }

    /// Revive a dead creature that has not been removed yet.
    ///
    /// # Errors
    /// Returns `MinipollError::CreatureNotFound` if the creature is gone.
    pub fn revive(&mut self, id: CreatureId, fraction: f32) -> Result<bool> {
        let creature = self.get_mut(id).ok_or(MinipollError::CreatureNotFound(id))?;
        let revived = creature.revive(fraction);
        if revived {
            SimCounters::add(&self.counters.revives, 1);
        }
        Ok(revived)
    }

    /// Write every creature to `store` in one transaction. Returns the count.
    ///
    /// # Errors
    /// Returns any database or serialization error.
    pub fn save_all(&self, store: &SnapshotStore) -> Result<usize> {
        let save = span!(Level::DEBUG, spans::PERSIST_SAVE, creatures = self.creatures.len());
        let _enter = save.enter();
        let snapshots: Vec<_> = self.creatures.iter().map(Creature::snapshot).collect();
        let saved = store.save_batch(snapshots.iter())?;
        SimCounters::add(&self.counters.saves_completed, saved as u64);
        info!(saved, "World saved");
        Ok(saved)
    }

    /// Load every stored snapshot: existing creatures are restored in place,
    /// unknown ids are rebuilt with the preset recorded in the snapshot
    /// (Balanced when none or unknown). Returns the count.
    ///
    /// # Errors
    /// Returns any database or serialization error.
    pub fn load_into(&mut self, store: &SnapshotStore) -> Result<usize> {
        let snapshots = store.load_all()?;
        for snapshot in &snapshots {
            if let Some(existing) = self.get_mut(snapshot.id) {
                existing.restore(snapshot);
            } else {
                let archetype = match snapshot.profile.as_deref() {
                    None => CreatureArchetype::Balanced,
                    Some(name) => CreatureArchetype::from_name(name).unwrap_or_else(|| {
                        warn!(creature = %snapshot.id, profile = name, "Unknown preset in snapshot, using Balanced");
                        CreatureArchetype::Balanced
                    }),
                };
                let config = self.config.creature_config(archetype);
                let seed = self.next_seed();
                let mut creature = Creature::from_snapshot(snapshot, &config, seed, self.collaborators.clone())?;
                creature.set_profile(archetype.name());
                self.creatures.push(creature);
            }
        }
        info!(loaded = snapshots.len(), "World loaded");
        Ok(snapshots.len())
    }

    /// Creature by id.
    #[must_use]
    pub fn get(&self, id: CreatureId) -> Option<&Creature> {
        self.creatures.iter().find(|c| c.id() == id)
    }

    /// Mutable creature by id.
    pub fn get_mut(&mut self, id: CreatureId) -> Option<&mut Creature> {
        self.creatures.iter_mut().find(|c| c.id() == id)
    }

    /// Creatures in spawn order.
    #[must_use]
    pub fn creatures(&self) -> &[Creature] {
        &self.creatures
    }

    /// Number of creatures, dead ones awaiting removal included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.creatures.len()
    }

    /// Whether the world is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.creatures.is_empty()
    }

    /// Living creatures.
    #[must_use]
    pub fn alive(&self) -> usize {
        self.creatures.iter().filter(|c| c.is_alive()).count()
    }

    /// Simulated seconds so far.
    #[must_use]
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    /// Shared counters.
    #[must_use]
    pub fn counters(&self) -> &Arc<SimCounters> {
        &self.counters
    }

    /// Frame timings.
    #[must_use]
    pub fn timings(&self) -> &TickTimings {
        &self.timings
    }

    /// World config.
    #[must_use]
    pub fn config(&self) -> &WorldConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::ConstantAmbient;

    fn world() -> World {
        World::new(WorldConfig::default(), Collaborators::detached())
    }

    #[test]
    fn proximity_excludes_source_and_far_creatures() {
        let mut w = world();
        let a = w.spawn("A", Position::new(0.0, 0.0, 0.0), CreatureArchetype::Balanced).expect("spawn");
        let b = w.spawn("B", Position::new(3.0, 0.0, 0.0), CreatureArchetype::Balanced).expect("spawn");
        let _c = w.spawn("C", Position::new(30.0, 0.0, 0.0), CreatureArchetype::Balanced).expect("spawn");
        let snapshot = PositionSnapshot::capture(w.creatures());
        assert_eq!(snapshot.within(Position::default(), 5.0, a), vec![b]);
        assert_eq!(snapshot.position_of(b), Some(Position::new(3.0, 0.0, 0.0)));
    }

    #[test]
    fn invalid_spawn_leaves_world_unchanged() {
        let mut config = WorldConfig::default();
        config.creature.brain.decision_interval = -1.0;
        let mut w = World::new(config, Collaborators::detached());
        assert!(w.spawn("Bad", Position::default(), CreatureArchetype::Balanced).is_err());
        assert!(w.is_empty());
    }

    #[test]
    fn attack_unknown_target_errors() {
        let mut w = world();
        let a = w.spawn("A", Position::default(), CreatureArchetype::Balanced).expect("spawn");
        let err = w.attack(a, CreatureId::new(), 10.0).expect_err("missing target");
        assert!(matches!(err, MinipollError::CreatureNotFound(_)));
    }

    #[test]
    fn dead_creatures_are_removed_after_delay() {
        let mut w = world();
        let a = w.spawn("A", Position::default(), CreatureArchetype::Balanced).expect("spawn");
        w.get_mut(a).expect("present").kill(None);
        let ambient = ConstantAmbient::default();
        let mut removed = Vec::new();
        for _ in 0..12 {
            removed.extend(w.tick(1.0, &ambient).removed);
        }
        assert_eq!(removed, vec![a]);
        assert!(w.is_empty());
    }

    #[test]
    fn elapsed_and_timings_advance() {
        let mut w = world();
        w.spawn("A", Position::default(), CreatureArchetype::Balanced).expect("spawn");
        let ambient = ConstantAmbient::default();
        for _ in 0..5 {
            w.tick(0.5, &ambient);
        }
        assert!((w.elapsed() - 2.5).abs() < 1e-9);
        assert_eq!(w.timings().frame_count(), 5);
        assert_eq!(w.counters().snapshot().creature_ticks, 5);
    }
}
