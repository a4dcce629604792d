//! # Minipoll Core Library
//!
//! Engine-agnostic internal models for autonomous creatures ("minipolls").
//!
//! Each creature owns one instance of every model:
//!
//! - [`StatBlock`]: named attributes with stacking, expiring modifiers
//! - [`NeedsModel`]: decaying 0–100 needs and their critical bands
//! - [`EmotionModel`]: decaying emotions, contagion pulses, PAD mood
//! - [`MemoryStore`]: bounded, time-limited log of interactions
//! - [`HealthModel`]: hit points and the Alive → Critical → Dead machine
//! - [`GoalArbiter`]: scores a fixed goal catalog and picks one
//!
//! Wiring the models together into a creature, and driving many creatures
//! in a world, lives in `minipoll-sim`.
//!
//! ## Failure policy
//!
//! Nothing here aborts a tick. Unknown names, out-of-range values and
//! actions on dead creatures are absorbed at the model boundary and logged;
//! [`MinipollError`] is only returned by configuration, parsing and
//! persistence.

#![deny(clippy::unwrap_used)]
#![deny(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod brain;
pub mod config;
pub mod emotion;
pub mod error;
pub mod health;
pub mod memory;
pub mod metrics;
pub mod needs;
pub mod persistence;
pub mod snapshot;
pub mod stats;
pub mod timer;
pub mod types;

pub use brain::{GoalArbiter, GoalKind};
pub use config::MinipollConfig;
pub use emotion::{EmotionKind, EmotionModel};
pub use error::MinipollError;
pub use health::{DamageType, HealthModel};
pub use memory::{InteractionType, MemoryStore};
pub use needs::NeedsModel;
pub use snapshot::CreatureSnapshot;
pub use stats::{StatBlock, StatKind};
pub use types::*;
