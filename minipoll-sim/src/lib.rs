//! # minipoll-sim
//!
//! Integration layer over `minipoll-core`: the per-creature orchestrator,
//! its external contracts, a typed event bus and a multi-creature world
//! driver.
//!
//! ```text
//! World::tick
//!   ├─ PositionSnapshot::capture
//!   ├─ Creature::tick           (own models only)
//!   ├─ deliver SpreadPulses     (against the snapshot)
//!   └─ remove expired corpses
//! ```

#![deny(clippy::unwrap_used)]
#![deny(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod collaborators;
pub mod config;
pub mod creature;
pub mod events;
pub mod telemetry;
pub mod world;

pub use collaborators::{
    Ambient, AmbientSource, Collaborators, ConstantAmbient, CreatureRegistry, DayNightCycle, MovementIntent,
    MovementSink, ProximityQuery, Recorder, SocialSink,
};
pub use config::{CreatureArchetype, WorldConfig};
pub use creature::{Capabilities, Creature, CreatureTick};
pub use events::{CreatureEvent, EventBus, EventKind, SubscriptionId};
pub use world::{PositionSnapshot, World, WorldTick};
