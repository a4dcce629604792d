//! Stat Block: named numeric attributes with stacking modifiers.
//!
//! Effective value of a stat:
//!
//! ```text
//! effective = clamp((base + Σ flat) × (1 + Σ percent / 100), min, max)
//! ```
//!
//! Timed modifiers expire through the block's [`TimerTable`], advanced by
//! [`StatBlock::tick`]. Removing a modifier early cancels its timer.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::StatsConfig;
use crate::error::MinipollError;
use crate::timer::TimerTable;

/// Smallest base-value delta that counts as a change.
const CHANGE_EPSILON: f32 = 0.001;

/// The closed set of creature attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum StatKind {
    /// Maximum hit points.
    HealthCap,
    /// Movement speed.
    Speed,
    /// Physical strength.
    Strength,
    /// Flat damage reduction.
    Defense,
    /// Problem solving.
    Intelligence,
    /// Social pull.
    Charisma,
    /// Fortune.
    Luck,
    /// Reproductive chance.
    Fertility,
    /// Lifespan.
    Longevity,
}

impl StatKind {
    /// Every stat kind, in declaration order.
    pub const ALL: [Self; 9] = [
        Self::HealthCap,
        Self::Speed,
        Self::Strength,
        Self::Defense,
        Self::Intelligence,
        Self::Charisma,
        Self::Luck,
        Self::Fertility,
        Self::Longevity,
    ];

    /// Stable lowercase name used in config files and logs.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::HealthCap => "health_cap",
            Self::Speed => "speed",
            Self::Strength => "strength",
            Self::Defense => "defense",
            Self::Intelligence => "intelligence",
            Self::Charisma => "charisma",
            Self::Luck => "luck",
            Self::Fertility => "fertility",
            Self::Longevity => "longevity",
        }
    }
}

impl fmt::Display for StatKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for StatKind {
    type Err = MinipollError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|k| k.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| MinipollError::UnknownKey {
                kind: "stat",
                key: s.to_string(),
            })
    }
}

/// Unique identifier for a modifier instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModifierId(pub Uuid);

impl ModifierId {
    /// Create a new random modifier ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ModifierId {
    fn default() -> Self {
        Self::new()
    }
}

/// How a modifier combines with the base value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModifierKind {
    /// Added to the base before percentages.
    Flat,
    /// Summed with other percentages and applied as `(1 + Σ/100)`.
    Percentage,
}

/// A flat or percentage adjustment to one stat.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Modifier {
    /// Identifier assigned by [`StatBlock::add_modifier`]; every attach
    /// gets a fresh one, so clones never share an id.
    pub id: ModifierId,
    /// Flat or percentage.
    pub kind: ModifierKind,
    /// Amount (units for flat, percent for percentage).
    pub value: f32,
    /// What applied it ("critical_health", "food_buff", ...).
    pub source: String,
    /// Seconds until expiry; `None` or non-positive means permanent.
    pub duration: Option<f32>,
}

impl Modifier {
    /// A permanent flat modifier.
    #[must_use]
    pub fn flat(value: f32, source: impl Into<String>) -> Self {
        Self {
            id: ModifierId::new(),
            kind: ModifierKind::Flat,
            value,
            source: source.into(),
            duration: None,
        }
    }

    /// A permanent percentage modifier.
    #[must_use]
    pub fn percentage(value: f32, source: impl Into<String>) -> Self {
        Self {
            id: ModifierId::new(),
            kind: ModifierKind::Percentage,
            value,
            source: source.into(),
            duration: None,
        }
    }

    /// Make the modifier expire after `seconds`.
    #[must_use]
    pub fn lasting(mut self, seconds: f32) -> Self {
        self.duration = Some(seconds);
        self
    }

    fn is_timed(&self) -> bool {
        self.duration.is_some_and(|d| d > 0.0)
    }
}

/// A change in a stat's effective value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatChange {
    /// Which stat changed.
    pub kind: StatKind,
    /// Effective value before.
    pub old: f32,
    /// Effective value after.
    pub new: f32,
}

/// One registered stat.
#[derive(Debug, Clone)]
struct Stat {
    base: f32,
    min: f32,
    max: f32,
    modifiers: Vec<Modifier>,
}

impl Stat {
    fn effective(&self) -> f32 {
        let flat: f32 = self
            .modifiers
            .iter()
            .filter(|m| m.kind == ModifierKind::Flat)
            .map(|m| m.value)
            .sum();
        let percent: f32 = self
            .modifiers
            .iter()
            .filter(|m| m.kind == ModifierKind::Percentage)
            .map(|m| m.value)
            .sum();
        ((self.base + flat) * (1.0 + percent / 100.0)).clamp(self.min, self.max)
    }
}

/// Per-creature stat table.
#[derive(Debug, Clone)]
pub struct StatBlock {
    stats: HashMap<StatKind, Stat>,
    expiry: TimerTable<ModifierId>,
    owners: HashMap<ModifierId, StatKind>,
    changes: Vec<StatChange>,
}

impl StatBlock {
    /// Build a block with the stats listed in `config`.
    #[must_use]
    pub fn new(config: &StatsConfig) -> Self {
        let stats = config
            .stats
            .iter()
            .map(|s| {
                (
                    s.kind,
                    Stat {
                        base: s.base.clamp(s.min, s.max),
                        min: s.min,
                        max: s.max,
                        modifiers: Vec::new(),
                    },
                )
            })
            .collect();
        Self {
            stats,
            expiry: TimerTable::new(),
            owners: HashMap::new(),
            changes: Vec::new(),
        }
    }

    /// Whether `kind` is registered in this block.
    #[must_use]
    pub fn has(&self, kind: StatKind) -> bool {
        self.stats.contains_key(&kind)
    }

    /// Effective value of `kind`; unregistered kinds read as 0.
    #[must_use]
    pub fn get_effective(&self, kind: StatKind) -> f32 {
        match self.stats.get(&kind) {
            Some(stat) => stat.effective(),
            None => {
                warn!(stat = %kind, "Stat not registered, using 0");
                0.0
            }
        }
    }

    /// Base value of `kind`, if registered.
    #[must_use]
    pub fn base(&self, kind: StatKind) -> Option<f32> {
        self.stats.get(&kind).map(|s| s.base)
    }

    /// Set the base value, clamped to the stat's bounds.
    ///
    /// Records a [`StatChange`] when the base moved by more than a small epsilon.
    pub fn set_base(&mut self, kind: StatKind, value: f32) {
        let Some(stat) = self.stats.get_mut(&kind) else {
            warn!(stat = %kind, "Cannot set base of unregistered stat");
            return;
        };
        let old_base = stat.base;
        let old = stat.effective();
        stat.base = value.clamp(stat.min, stat.max);
        if (stat.base - old_base).abs() > CHANGE_EPSILON {
            let new = stat.effective();
            self.changes.push(StatChange { kind, old, new });
        }
    }

    /// Attach a modifier to `kind` under a fresh id and return that id.
    ///
    /// Returns `None` when the stat is not registered.
    pub fn add_modifier(&mut self, kind: StatKind, mut modifier: Modifier) -> Option<ModifierId> {
        let Some(stat) = self.stats.get_mut(&kind) else {
            warn!(stat = %kind, source = %modifier.source, "Cannot modify unregistered stat");
            return None;
        };
        let id = ModifierId::new();
        modifier.id = id;
        if let (true, Some(seconds)) = (modifier.is_timed(), modifier.duration) {
            self.expiry.schedule(id, seconds);
        }
        let old = stat.effective();
        stat.modifiers.push(modifier);
        let new = stat.effective();
        self.owners.insert(id, kind);
        self.record(kind, old, new);
        Some(id)
    }

    /// Remove one modifier. Returns `true` if it existed.
    pub fn remove_modifier(&mut self, id: ModifierId) -> bool {
        let Some(kind) = self.owners.remove(&id) else {
            return false;
        };
        self.expiry.cancel(id);
        let Some(stat) = self.stats.get_mut(&kind) else {
            return false;
        };
        let old = stat.effective();
        stat.modifiers.retain(|m| m.id != id);
        let new = stat.effective();
        self.record(kind, old, new);
        true
    }

    /// Remove every modifier applied by `source`. Returns how many were removed.
    pub fn remove_all_from_source(&mut self, source: &str) -> usize {
        let ids: Vec<ModifierId> = self
            .stats
            .values()
            .flat_map(|s| s.modifiers.iter())
            .filter(|m| m.source == source)
            .map(|m| m.id)
            .collect();
        ids.into_iter().filter(|id| self.remove_modifier(*id)).count()
    }

    /// Modifiers currently attached to `kind`.
    #[must_use]
    pub fn modifiers(&self, kind: StatKind) -> &[Modifier] {
        self.stats.get(&kind).map_or(&[], |s| s.modifiers.as_slice())
    }

    /// Advance modifier timers, dropping the expired ones. Returns the expired ids.
    pub fn tick(&mut self, dt: f32) -> Vec<ModifierId> {
        let expired = self.expiry.advance(dt);
        for id in &expired {
            debug!(modifier = ?id, "Modifier expired");
            self.remove_modifier(*id);
        }
        expired
    }

    /// Take the changes recorded since the last call.
    pub fn drain_changes(&mut self) -> Vec<StatChange> {
        std::mem::take(&mut self.changes)
    }

    /// Base values of every registered stat, sorted by kind.
    #[must_use]
    pub fn base_values(&self) -> Vec<(StatKind, f32)> {
        let mut values: Vec<_> = self.stats.iter().map(|(k, s)| (*k, s.base)).collect();
        values.sort_by_key(|(k, _)| *k);
        values
    }

    fn record(&mut self, kind: StatKind, old: f32, new: f32) {
        if (new - old).abs() > CHANGE_EPSILON {
            self.changes.push(StatChange { kind, old, new });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block() -> StatBlock {
        StatBlock::new(&StatsConfig::default())
    }

    #[test]
    fn flat_then_percentage_then_clamp() {
        let mut stats = block();
        stats.set_base(StatKind::Strength, 10.0);
        stats.add_modifier(StatKind::Strength, Modifier::flat(5.0, "training"));
        stats.add_modifier(StatKind::Strength, Modifier::percentage(20.0, "food"));
        stats.add_modifier(StatKind::Strength, Modifier::percentage(30.0, "mood"));
        // (10 + 5) * 1.5
        assert!((stats.get_effective(StatKind::Strength) - 22.5).abs() < 1e-4);

        stats.add_modifier(StatKind::Strength, Modifier::flat(500.0, "cheat"));
        assert!((stats.get_effective(StatKind::Strength) - 100.0).abs() < 1e-4);
    }

    #[test]
    fn set_base_clamps_and_records_change() {
        let mut stats = block();
        stats.drain_changes();
        stats.set_base(StatKind::Fertility, 7.0);
        assert_eq!(stats.base(StatKind::Fertility), Some(1.0));
        let changes = stats.drain_changes();
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].kind, StatKind::Fertility);
    }

    #[test]
    fn tiny_base_change_is_not_recorded() {
        let mut stats = block();
        let base = stats.base(StatKind::Luck).expect("luck registered");
        stats.set_base(StatKind::Luck, base + 0.0001);
        assert!(stats.drain_changes().is_empty());
    }

    #[test]
    fn timed_modifier_expires() {
        let mut stats = block();
        let before = stats.get_effective(StatKind::Speed);
        let id = stats
            .add_modifier(StatKind::Speed, Modifier::percentage(-50.0, "mud").lasting(2.0))
            .expect("speed registered");
        assert!(stats.get_effective(StatKind::Speed) < before);

        assert!(stats.tick(1.0).is_empty());
        assert_eq!(stats.tick(1.0), vec![id]);
        assert!((stats.get_effective(StatKind::Speed) - before).abs() < 1e-4);
        assert!(stats.modifiers(StatKind::Speed).is_empty());
    }

    #[test]
    fn removing_a_timed_modifier_cancels_its_timer() {
        let mut stats = block();
        let id = stats
            .add_modifier(StatKind::Speed, Modifier::flat(1.0, "wind").lasting(1.0))
            .expect("speed registered");
        assert!(stats.remove_modifier(id));
        assert!(stats.tick(5.0).is_empty());
        assert!(!stats.remove_modifier(id));
    }

    #[test]
    fn cloned_modifier_on_two_stats_is_removable() {
        let mut stats = block();
        let speed = stats.get_effective(StatKind::Speed);
        let luck = stats.get_effective(StatKind::Luck);
        let gust = Modifier::flat(1.0, "gust");
        let a = stats.add_modifier(StatKind::Speed, gust.clone()).expect("speed registered");
        let b = stats.add_modifier(StatKind::Luck, gust).expect("luck registered");
        assert_ne!(a, b);

        assert!(stats.remove_modifier(a));
        assert!(stats.remove_modifier(b));
        assert!(stats.modifiers(StatKind::Speed).is_empty());
        assert!(stats.modifiers(StatKind::Luck).is_empty());
        assert!((stats.get_effective(StatKind::Speed) - speed).abs() < 1e-5);
        assert!((stats.get_effective(StatKind::Luck) - luck).abs() < 1e-5);
    }

    #[test]
    fn remove_all_from_source() {
        let mut stats = block();
        stats.add_modifier(StatKind::Speed, Modifier::flat(1.0, "blessing"));
        stats.add_modifier(StatKind::Luck, Modifier::flat(1.0, "blessing"));
        stats.add_modifier(StatKind::Luck, Modifier::flat(1.0, "charm"));
        assert_eq!(stats.remove_all_from_source("blessing"), 2);
        assert_eq!(stats.modifiers(StatKind::Luck).len(), 1);
    }

    #[test]
    fn unregistered_stat_reads_zero() {
        let config = StatsConfig { stats: Vec::new() };
        let mut stats = StatBlock::new(&config);
        assert_eq!(stats.get_effective(StatKind::Luck), 0.0);
        assert!(stats.add_modifier(StatKind::Luck, Modifier::flat(1.0, "x")).is_none());
    }

    #[test]
    fn parse_names() {
        assert_eq!("defense".parse::<StatKind>().expect("known"), StatKind::Defense);
        assert_eq!("Health_Cap".parse::<StatKind>().expect("known"), StatKind::HealthCap);
        assert!("charm".parse::<StatKind>().is_err());
    }
}
