//! Health model: hit points, regeneration and the Alive → Critical → Dead
//! state machine.
//!
//! ```text
//!            current <= max*critical_fraction
//!   Alive ───────────────────────────────────▶ Critical
//!     ▲  ◀───────────────────────────────────    │
//!     │          current rises above            │ current <= 0
//!     │                                         ▼
//!     └──────────────── revive ─────────────── Dead
//! ```
//!
//! Dead is terminal for everything except [`HealthModel::revive`]. Timed
//! effects (invulnerability after a hit, the delay before regeneration)
//! live in a [`TimerTable`]; a new hit restarts both.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::HealthConfig;
use crate::error::MinipollError;
use crate::timer::TimerTable;
use crate::types::CreatureId;

/// Category of incoming damage, used for resistances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DamageType {
    /// Bites, blows, falls.
    Physical,
    /// Burning.
    Fire,
    /// Freezing.
    Cold,
    /// Toxins.
    Poison,
    /// Unmet physiological needs.
    Starvation,
}

/// Coarse health state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HealthState {
    /// Above the critical threshold.
    Alive,
    /// Alive but at or below the critical threshold.
    Critical,
    /// No hit points left.
    Dead,
}

/// Something observable that happened to a creature's health.
#[derive(Debug, Clone, PartialEq)]
pub enum HealthEvent {
    /// A hit landed.
    Damaged {
        /// Damage actually applied after reductions.
        amount: f32,
        /// Who dealt it, if anyone.
        source: Option<CreatureId>,
        /// Category of the hit.
        damage_type: DamageType,
    },
    /// Hit points were restored by an explicit heal.
    Healed {
        /// Health actually restored.
        amount: f32,
        /// Who healed, if anyone.
        source: Option<CreatureId>,
    },
    /// Current health moved.
    Changed {
        /// Value before.
        old: f32,
        /// Value after.
        new: f32,
    },
    /// Entered the critical band.
    EnteredCritical,
    /// Left the critical band while still alive.
    LeftCritical,
    /// Health reached zero.
    Died {
        /// Killer, if any.
        source: Option<CreatureId>,
    },
    /// Brought back from death.
    Revived,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HealthTimer {
    Invulnerability,
    RegenDelay,
}

/// Per-creature hit points and life state.
#[derive(Debug, Clone)]
pub struct HealthModel {
    current: f32,
    max: f32,
    state: HealthState,
    regen_rate: f32,
    regen_delay: f32,
    invulnerability_duration: f32,
    critical_fraction: f32,
    resistances: Vec<(DamageType, f32)>,
    timers: TimerTable<HealthTimer>,
    events: Vec<HealthEvent>,
}

impl HealthModel {
    /// Create a creature at full health.
    #[must_use]
    pub fn new(config: &HealthConfig, max_health: f32) -> Self {
        let max = max_health.max(1.0);
        Self {
            current: max,
            max,
            state: HealthState::Alive,
            regen_rate: config.regen_rate.max(0.0),
            regen_delay: config.regen_delay.max(0.0),
            invulnerability_duration: config.invulnerability_duration.max(0.0),
            critical_fraction: config.critical_fraction.clamp(0.0, 1.0),
            resistances: config
                .resistances
                .iter()
                .map(|r| (r.damage_type, r.fraction.clamp(0.0, 1.0)))
                .collect(),
            timers: TimerTable::new(),
            events: Vec::new(),
        }
    }

    /// Apply a hit. Returns the damage actually dealt (0 when ignored).
    ///
    /// Ignored while dead or invulnerable, and for non-positive amounts.
    /// Otherwise the resistance fraction for `damage_type` is removed first,
    /// then `defense` is subtracted with a floor of 1.
    pub fn take_damage(
        &mut self,
        amount: f32,
        defense: f32,
        source: Option<CreatureId>,
        damage_type: DamageType,
    ) -> f32 {
        if self.is_dead() || self.is_invulnerable() || amount.is_nan() || amount <= 0.0 {
            return 0.0;
        }
        let resisted = amount * (1.0 - self.resistance(damage_type));
        let dealt = (resisted - defense.max(0.0)).max(1.0);

        let old = self.current;
        self.current = (self.current - dealt).max(0.0);
        let dealt = old - self.current;
        self.timers.schedule(HealthTimer::Invulnerability, self.invulnerability_duration);
        self.timers.schedule(HealthTimer::RegenDelay, self.regen_delay);

        debug!(dealt, health = self.current, ?damage_type, "Damage taken");
        self.events.push(HealthEvent::Damaged {
            amount: dealt,
            source,
            damage_type,
        });
        self.events.push(HealthEvent::Changed { old, new: self.current });
        self.update_state(source);
        dealt
    }

    /// Continuous damage from unmet needs.
    ///
    /// Bypasses invulnerability and defense and does not open an
    /// invulnerability window, but it does hold off regeneration.
    pub fn drain(&mut self, amount: f32, damage_type: DamageType) -> f32 {
        if self.is_dead() || amount.is_nan() || amount <= 0.0 {
            return 0.0;
        }
        let amount = amount * (1.0 - self.resistance(damage_type));
        let old = self.current;
        self.current = (self.current - amount).max(0.0);
        self.timers.schedule(HealthTimer::RegenDelay, self.regen_delay);
        if (old - self.current).abs() > f32::EPSILON {
            self.events.push(HealthEvent::Changed { old, new: self.current });
        }
        self.update_state(None);
        old - self.current
    }

    /// Restore up to `amount`. Returns the health actually restored.
    pub fn heal(&mut self, amount: f32, source: Option<CreatureId>) -> f32 {
        if self.is_dead() || amount.is_nan() || amount <= 0.0 {
            return 0.0;
        }
        let old = self.current;
        self.current = (self.current + amount).min(self.max);
        let healed = self.current - old;
        if healed > 0.0 {
            self.events.push(HealthEvent::Healed { amount: healed, source });
            self.events.push(HealthEvent::Changed { old, new: self.current });
            self.update_state(None);
        }
        healed
    }

    /// Force death. Returns `false` if already dead.
    pub fn kill(&mut self, source: Option<CreatureId>) -> bool {
        if self.is_dead() {
            debug!("Kill ignored: already dead");
            return false;
        }
        let old = self.current;
        self.current = 0.0;
        self.events.push(HealthEvent::Changed { old, new: 0.0 });
        self.update_state(source);
        true
    }

    /// Bring a dead creature back with `max * fraction` health.
    ///
    /// Returns `false` (and does nothing) if the creature is alive.
    pub fn revive(&mut self, fraction: f32) -> bool {
        if !self.is_dead() {
            let error = MinipollError::InvariantViolation("revive on a living creature".to_string());
            debug!(%error, "Revive ignored");
            return false;
        }
        if !(0.0..=1.0).contains(&fraction) {
            let error = MinipollError::OutOfRange {
                field: "revive fraction".to_string(),
                value: f64::from(fraction),
                min: 0.0,
                max: 1.0,
            };
            warn!(%error, "Revive fraction clamped");
        }
        let fraction = if fraction.is_nan() { 1.0 } else { fraction.clamp(0.0, 1.0) };
        self.current = (self.max * fraction).max(1.0).min(self.max);
        self.timers.clear();
        self.state = HealthState::Alive;
        info!(health = self.current, "Revived");
        self.events.push(HealthEvent::Revived);
        self.events.push(HealthEvent::Changed { old: 0.0, new: self.current });
        self.update_state(None);
        true
    }

    /// Advance timers and regenerate when the regen delay has elapsed.
    pub fn tick(&mut self, dt: f32) {
        let dt = dt.max(0.0);
        self.timers.advance(dt);
        if self.is_dead()
            || self.timers.is_active(HealthTimer::RegenDelay)
            || self.current >= self.max
            || self.regen_rate <= 0.0
        {
            return;
        }
        let old = self.current;
        self.current = (self.current + self.regen_rate * dt).min(self.max);
        if self.current > old {
            self.events.push(HealthEvent::Changed { old, new: self.current });
            self.update_state(None);
        }
    }

    /// Change max health, keeping the current fraction.
    pub fn set_max_health(&mut self, new_max: f32) {
        let new_max = new_max.max(1.0);
        if (new_max - self.max).abs() <= f32::EPSILON {
            return;
        }
        let fraction = self.fraction();
        let old = self.current;
        self.max = new_max;
        if !self.is_dead() {
            self.current = (new_max * fraction).clamp(0.0, new_max);
            self.events.push(HealthEvent::Changed { old, new: self.current });
            self.update_state(None);
        }
    }

    /// Open an invulnerability window of `seconds`, replacing any current one.
    pub fn grant_invulnerability(&mut self, seconds: f32) {
        self.timers.schedule(HealthTimer::Invulnerability, seconds);
    }

    /// Restore saved values. A zero `current` restores a dead creature.
    pub fn restore(&mut self, current: f32, max: f32) {
        self.max = max.max(1.0);
        self.current = current.clamp(0.0, self.max);
        self.timers.clear();
        self.state = if self.current <= 0.0 {
            HealthState::Dead
        } else if self.current <= self.critical_threshold() {
            HealthState::Critical
        } else {
            HealthState::Alive
        };
    }

    /// Current hit points.
    #[must_use]
    pub fn current(&self) -> f32 {
        self.current
    }

    /// Maximum hit points.
    #[must_use]
    pub fn max(&self) -> f32 {
        self.max
    }

    /// `current / max`.
    #[must_use]
    pub fn fraction(&self) -> f32 {
        self.current / self.max
    }

    /// Coarse state.
    #[must_use]
    pub fn state(&self) -> HealthState {
        self.state
    }

    /// Whether health has reached zero.
    #[must_use]
    pub fn is_dead(&self) -> bool {
        self.state == HealthState::Dead
    }

    /// Whether the creature is in the critical band.
    #[must_use]
    pub fn is_critical(&self) -> bool {
        self.state == HealthState::Critical
    }

    /// Whether hits are currently ignored.
    #[must_use]
    pub fn is_invulnerable(&self) -> bool {
        self.timers.is_active(HealthTimer::Invulnerability)
    }

    /// Whether regeneration is on hold after a recent hit.
    #[must_use]
    pub fn regen_blocked(&self) -> bool {
        self.timers.is_active(HealthTimer::RegenDelay)
    }

    /// Health at or below which the creature is critical.
    #[must_use]
    pub fn critical_threshold(&self) -> f32 {
        self.max * self.critical_fraction
    }

    /// Take the events recorded since the last call.
    pub fn drain_events(&mut self) -> Vec<HealthEvent> {
        std::mem::take(&mut self.events)
    }

    fn resistance(&self, damage_type: DamageType) -> f32 {
        self.resistances
            .iter()
            .find(|(t, _)| *t == damage_type)
            .map_or(0.0, |(_, r)| *r)
    }

    fn update_state(&mut self, source: Option<CreatureId>) {
        let next = if self.current <= 0.0 {
            HealthState::Dead
        } else if self.current <= self.critical_threshold() {
            HealthState::Critical
        } else {
            HealthState::Alive
        };
        if next == self.state {
            return;
        }
        match (self.state, next) {
            (_, HealthState::Dead) => {
                info!(?source, "Died");
                self.timers.clear();
                self.events.push(HealthEvent::Died { source });
            }
            (_, HealthState::Critical) => {
                debug!(health = self.current, "Entered critical health");
                self.events.push(HealthEvent::EnteredCritical);
            }
            (HealthState::Critical, HealthState::Alive) => {
                debug!(health = self.current, "Left critical health");
                self.events.push(HealthEvent::LeftCritical);
            }
            _ => {}
        }
        self.state = next;
    }
}
