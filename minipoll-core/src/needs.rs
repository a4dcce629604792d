//! Needs: decaying 0–100 physiological values.
//!
//! The model only knows how needs decay and when they are critical. What a
//! critical need *does* (health damage, forced goals, emotions) is decided
//! by the orchestrator from the [`NeedsTick`] report.

use tracing::{debug, warn};

use crate::config::{NeedConfig, NeedsConfig};

/// Hunger need name.
pub const HUNGER: &str = "hunger";
/// Thirst need name.
pub const THIRST: &str = "thirst";
/// Energy need name.
pub const ENERGY: &str = "energy";
/// Social need name.
pub const SOCIAL: &str = "social";
/// Hygiene need name.
pub const HYGIENE: &str = "hygiene";

const MAX_VALUE: f32 = 100.0;

/// One physiological need.
#[derive(Debug, Clone)]
pub struct Need {
    /// Need name.
    pub name: String,
    /// Current value in `[0, 100]`.
    pub value: f32,
    /// Units lost per second at multiplier 1.0.
    pub decrease_rate: f32,
    /// At or below this value the need is critical.
    pub critical_threshold: f32,
    /// Health damage per second while critical.
    pub health_damage_rate: f32,
}

impl Need {
    fn from_config(config: &NeedConfig) -> Self {
        Self {
            name: config.name.clone(),
            value: config.initial_value.clamp(0.0, MAX_VALUE),
            decrease_rate: config.decrease_rate.max(0.0),
            critical_threshold: config.critical_threshold,
            health_damage_rate: config.health_damage_rate.max(0.0),
        }
    }

    /// Whether the value is at or below the critical threshold.
    #[must_use]
    pub fn is_critical(&self) -> bool {
        self.value <= self.critical_threshold
    }

    /// Value scaled to `[0, 1]`.
    #[must_use]
    pub fn normalized(&self) -> f32 {
        self.value / MAX_VALUE
    }
}

/// What happened during one [`NeedsModel::tick`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NeedsTick {
    /// Health damage requested by critical needs this step.
    pub damage: f32,
    /// Needs that crossed into the critical band this step.
    pub newly_critical: Vec<String>,
    /// Needs that left the critical band this step.
    pub recovered: Vec<String>,
}

/// Result of filling a need.
#[derive(Debug, Clone, PartialEq)]
pub struct NeedFill {
    /// Value before the fill.
    pub old: f32,
    /// Value after the fill.
    pub new: f32,
    /// Whether the fill crossed up through the satisfied threshold.
    pub satisfied: bool,
}

/// A creature's named set of needs.
#[derive(Debug, Clone)]
pub struct NeedsModel {
    needs: Vec<Need>,
    critical: Vec<bool>,
    enable_critical_damage: bool,
    satisfied_threshold: f32,
}

impl NeedsModel {
    /// Build the need set from config, in declaration order.
    #[must_use]
    pub fn new(config: &NeedsConfig) -> Self {
        let needs: Vec<Need> = config.needs.iter().map(Need::from_config).collect();
        let critical = needs.iter().map(Need::is_critical).collect();
        Self {
            needs,
            critical,
            enable_critical_damage: config.enable_critical_damage,
            satisfied_threshold: config.satisfied_threshold,
        }
    }

    /// Decay every need by `rate * multiplier * dt`, clamped at 0.
    ///
    /// Critical-band transitions are reported once per edge, including edges
    /// caused by `fill`/`decrease` since the previous tick.
    pub fn tick(&mut self, dt: f32, environment_multiplier: f32) -> NeedsTick {
        let dt = dt.max(0.0);
        let multiplier = environment_multiplier.max(0.0);
        let mut report = NeedsTick::default();

        for (need, was_critical) in self.needs.iter_mut().zip(self.critical.iter_mut()) {
            need.value = (need.value - need.decrease_rate * multiplier * dt).clamp(0.0, MAX_VALUE);

            let critical = need.is_critical();
            if critical && self.enable_critical_damage {
                report.damage += need.health_damage_rate * dt;
            }
            if critical != *was_critical {
                if critical {
                    debug!(need = %need.name, value = need.value, "Need became critical");
                    report.newly_critical.push(need.name.clone());
                } else {
                    debug!(need = %need.name, value = need.value, "Need recovered");
                    report.recovered.push(need.name.clone());
                }
                *was_critical = critical;
            }
        }
        report
    }

    /// Increase `name` by `amount`, toward 100.
    ///
    /// Returns `None` for unknown names. Negative amounts count as 0.
    pub fn fill(&mut self, name: &str, amount: f32) -> Option<NeedFill> {
        let threshold = self.satisfied_threshold;
        let need = self.find_mut(name)?;
        let old = need.value;
        need.value = (old + amount.max(0.0)).clamp(0.0, MAX_VALUE);
        let new = need.value;
        Some(NeedFill {
            old,
            new,
            satisfied: old < threshold && new >= threshold,
        })
    }

    /// Decrease `name` by `amount`, toward 0. Returns the new value.
    pub fn decrease(&mut self, name: &str, amount: f32) -> Option<f32> {
        let need = self.find_mut(name)?;
        need.value = (need.value - amount.max(0.0)).clamp(0.0, MAX_VALUE);
        Some(need.value)
    }

    /// Overwrite a need's value (clamped). Used when restoring a snapshot.
    pub fn set_value(&mut self, name: &str, value: f32) -> bool {
        match self.find_mut(name) {
            Some(need) => {
                need.value = value.clamp(0.0, MAX_VALUE);
                true
            }
            None => false,
        }
    }

    /// Raw value of `name` (0 for unknown names).
    #[must_use]
    pub fn value(&self, name: &str) -> f32 {
        self.find(name).map_or(0.0, |n| n.value)
    }

    /// Value of `name` scaled to `[0, 1]`, or `None` if unknown.
    #[must_use]
    pub fn normalized(&self, name: &str) -> Option<f32> {
        self.find(name).map(Need::normalized)
    }

    /// Whether `name` is at or below its critical threshold.
    #[must_use]
    pub fn is_critical(&self, name: &str) -> bool {
        self.find(name).is_some_and(Need::is_critical)
    }

    /// Whether the model knows a need called `name`.
    #[must_use]
    pub fn has(&self, name: &str) -> bool {
        self.needs.iter().any(|n| n.name == name)
    }

    /// The need with the lowest normalized value.
    #[must_use]
    pub fn most_urgent(&self) -> Option<&Need> {
        self.needs
            .iter()
            .min_by(|a, b| a.value.total_cmp(&b.value))
    }

    /// All needs in declaration order.
    #[must_use]
    pub fn needs(&self) -> &[Need] {
        &self.needs
    }

    fn find(&self, name: &str) -> Option<&Need> {
        let found = self.needs.iter().find(|n| n.name == name);
        if found.is_none() {
            warn!(need = name, "Unknown need");
        }
        found
    }

    fn find_mut(&mut self, name: &str) -> Option<&mut Need> {
        let found = self.needs.iter_mut().find(|n| n.name == name);
        if found.is_none() {
            warn!(need = name, "Unknown need");
        }
        found
    }
}
