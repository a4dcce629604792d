//! Contracts with the systems around a creature.
//!
//! A creature never looks anything up globally. Everything it talks to is
//! handed over at construction as a trait object in [`Collaborators`]:
//!
//! - [`SocialSink`] receives calls for help and relationship deltas
//! - [`MovementSink`] receives the movement intent of the active goal
//! - [`CreatureRegistry`] is told about deaths and removals
//!
//! The world additionally answers proximity queries through
//! [`ProximityQuery`] and supplies ambient conditions through
//! [`AmbientSource`].

use std::sync::Arc;

use minipoll_core::brain::GoalKind;
use minipoll_core::emotion::mapping::SocialMood;
use minipoll_core::types::{CreatureId, Position};
use parking_lot::Mutex;

// ---------------------------------------------------------------------------
// Outbound contracts
// ---------------------------------------------------------------------------

/// Social / tribe system.
pub trait SocialSink: Send + Sync {
    /// `caller` is in trouble at `position` and wants help within `radius`.
    fn call_for_help(&self, caller: CreatureId, position: Position, radius: f32);

    /// `from`'s feeling toward `toward` moved by `delta` (negative = worse).
    fn relationship_delta(&self, from: CreatureId, toward: CreatureId, delta: f32);

    /// `creature`'s outward mood changed.
    fn mood_changed(&self, _creature: CreatureId, _mood: SocialMood) {}
}

/// Where the active goal wants the creature to go.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MovementIntent {
    /// Goal the movement serves.
    pub goal: GoalKind,
    /// Destination, if known.
    pub target: Option<Position>,
    /// Creature to approach or avoid, if any.
    pub target_entity: Option<CreatureId>,
    /// Effective speed stat.
    pub speed: f32,
}

/// Navigation / interaction system.
///
/// When the creature reaches its target the collaborator calls back into
/// `Creature::interact` with the goal it was serving.
pub trait MovementSink: Send + Sync {
    /// Latest intent for `creature`; replaces any earlier one.
    fn move_toward(&self, creature: CreatureId, intent: MovementIntent);

    /// `creature` should stop moving (dead, or no active goal).
    fn stop(&self, creature: CreatureId);
}

/// External bookkeeping of live creatures.
pub trait CreatureRegistry: Send + Sync {
    /// `creature` died.
    fn on_death(&self, creature: CreatureId, name: &str);

    /// `creature` was removed from the world.
    fn on_removed(&self, creature: CreatureId);
}

// ---------------------------------------------------------------------------
// Inbound contracts
// ---------------------------------------------------------------------------

/// Read-only "who is near" lookup.
pub trait ProximityQuery {
    /// Creatures within `radius` of `origin`, excluding `exclude`.
    fn within(&self, origin: Position, radius: f32, exclude: CreatureId) -> Vec<CreatureId>;

    /// Position of `creature`, if known.
    fn position_of(&self, creature: CreatureId) -> Option<Position>;
}

/// Ambient conditions for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ambient {
    /// Hour of day in `[0, 24)`.
    pub time_of_day: f32,
    /// Multiplier on need decay.
    pub needs_multiplier: f32,
}

impl Default for Ambient {
    fn default() -> Self {
        Self {
            time_of_day: 12.0,
            needs_multiplier: 1.0,
        }
    }
}

/// Time-of-day provider.
pub trait AmbientSource {
    /// Conditions after `elapsed` simulated seconds.
    fn ambient(&self, elapsed: f64) -> Ambient;
}

/// Ambient conditions that never change.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConstantAmbient(pub Ambient);

impl AmbientSource for ConstantAmbient {
    fn ambient(&self, _elapsed: f64) -> Ambient {
        self.0
    }
}

/// A day/night cycle: needs decay slower at night.
#[derive(Debug, Clone, Copy)]
pub struct DayNightCycle {
    /// Real seconds per in-game day.
    pub day_length: f64,
    /// Hour the simulation starts at.
    pub start_hour: f32,
    /// Needs multiplier between 20:00 and 06:00.
    pub night_multiplier: f32,
}

impl Default for DayNightCycle {
    fn default() -> Self {
        Self {
            day_length: 1200.0,
            start_hour: 8.0,
            night_multiplier: 0.5,
        }
    }
}

impl AmbientSource for DayNightCycle {
    #[allow(clippy::cast_possible_truncation)]
    fn ambient(&self, elapsed: f64) -> Ambient {
        let hours = f64::from(self.start_hour) + elapsed / self.day_length.max(1.0) * 24.0;
        let time_of_day = hours.rem_euclid(24.0) as f32;
        let night = !(6.0..20.0).contains(&time_of_day);
        Ambient {
            time_of_day,
            needs_multiplier: if night { self.night_multiplier } else { 1.0 },
        }
    }
}

// ---------------------------------------------------------------------------
// Bundle
// ---------------------------------------------------------------------------

/// Everything a creature is wired to.
#[derive(Clone)]
pub struct Collaborators {
    /// Social system.
    pub social: Arc<dyn SocialSink>,
    /// Movement system.
    pub movement: Arc<dyn MovementSink>,
    /// Creature registry.
    pub registry: Arc<dyn CreatureRegistry>,
}

impl std::fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collaborators").finish_non_exhaustive()
    }
}

impl Collaborators {
    /// Collaborators that ignore everything.
    #[must_use]
    pub fn detached() -> Self {
        let null = Arc::new(Detached);
        Self {
            social: null.clone(),
            movement: null.clone(),
            registry: null,
        }
    }

    /// Route all three contracts to one recorder.
    #[must_use]
    pub fn recording(recorder: &Arc<Recorder>) -> Self {
        Self {
            social: recorder.clone(),
            movement: recorder.clone(),
            registry: recorder.clone(),
        }
    }
}

/// No-op collaborator.
#[derive(Debug, Clone, Copy, Default)]
pub struct Detached;

impl SocialSink for Detached {
    fn call_for_help(&self, _caller: CreatureId, _position: Position, _radius: f32) {}
    fn relationship_delta(&self, _from: CreatureId, _toward: CreatureId, _delta: f32) {}
}

impl MovementSink for Detached {
    fn move_toward(&self, _creature: CreatureId, _intent: MovementIntent) {}
    fn stop(&self, _creature: CreatureId) {}
}

impl CreatureRegistry for Detached {
    fn on_death(&self, _creature: CreatureId, _name: &str) {}
    fn on_removed(&self, _creature: CreatureId) {}
}

/// One call received by a [`Recorder`].
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    /// [`SocialSink::call_for_help`].
    CallForHelp {
        /// Caller.
        caller: CreatureId,
        /// Caller's position.
        position: Position,
        /// Signal radius.
        radius: f32,
    },
    /// [`SocialSink::relationship_delta`].
    Relationship {
        /// Whose feeling changed.
        from: CreatureId,
        /// Toward whom.
        toward: CreatureId,
        /// Change.
        delta: f32,
    },
    /// [`SocialSink::mood_changed`].
    Mood {
        /// Creature.
        creature: CreatureId,
        /// New mood.
        mood: SocialMood,
    },
    /// [`MovementSink::move_toward`].
    Move {
        /// Creature.
        creature: CreatureId,
        /// Intent.
        intent: MovementIntent,
    },
    /// [`MovementSink::stop`].
    Stop {
        /// Creature.
        creature: CreatureId,
    },
    /// [`CreatureRegistry::on_death`].
    Death {
        /// Creature.
        creature: CreatureId,
    },
    /// [`CreatureRegistry::on_removed`].
    Removed {
        /// Creature.
        creature: CreatureId,
    },
}

/// Collaborator that records every call, for tests and the headless runner.
#[derive(Debug, Default)]
pub struct Recorder {
    calls: Mutex<Vec<Call>>,
}

impl Recorder {
    /// Empty recorder.
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Copy of every call so far.
    #[must_use]
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    /// Calls matching `pred`.
    #[must_use]
    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls.lock().iter().filter(|c| pred(c)).count()
    }

    /// Forget recorded calls.
    pub fn clear(&self) {
        self.calls.lock().clear();
    }

    fn push(&self, call: Call) {
        self.calls.lock().push(call);
    }
}

impl SocialSink for Recorder {
    fn call_for_help(&self, caller: CreatureId, position: Position, radius: f32) {
        self.push(Call::CallForHelp {
            caller,
            position,
            radius,
        });
    }

    fn relationship_delta(&self, from: CreatureId, toward: CreatureId, delta: f32) {
        self.push(Call::Relationship { from, toward, delta });
    }

    fn mood_changed(&self, creature: CreatureId, mood: SocialMood) {
        self.push(Call::Mood { creature, mood });
    }
}

impl MovementSink for Recorder {
    fn move_toward(&self, creature: CreatureId, intent: MovementIntent) {
        self.push(Call::Move { creature, intent });
    }

    fn stop(&self, creature: CreatureId) {
        self.push(Call::Stop { creature });
    }
}

impl CreatureRegistry for Recorder {
    fn on_death(&self, creature: CreatureId, _name: &str) {
        self.push(Call::Death { creature });
    }

    fn on_removed(&self, creature: CreatureId) {
        self.push(Call::Removed { creature });
    }
}
