//! Configuration for a minipoll creature.
//!
//! Maps directly to a `minipoll.toml` file. Every field has a serde default,
//! so a partial file (or an empty one) yields a working creature.

use serde::{Deserialize, Serialize};

use crate::brain::{GoalKind, GoalPriority};
use crate::error::{MinipollError, Result};
use crate::health::DamageType;
use crate::needs::{ENERGY, HUNGER, HYGIENE, SOCIAL, THIRST};
use crate::stats::StatKind;

/// Top-level creature configuration, loadable from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MinipollConfig {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,
    /// Base stat values and bounds.
    #[serde(default)]
    pub stats: StatsConfig,
    /// Physiological needs.
    #[serde(default)]
    pub needs: NeedsConfig,
    /// Emotion decay and contagion.
    #[serde(default)]
    pub emotion: EmotionConfig,
    /// Interaction memory limits.
    #[serde(default)]
    pub memory: MemoryConfig,
    /// Hit points, regeneration and critical state.
    #[serde(default)]
    pub health: HealthConfig,
    /// Goal arbitration timing and catalog.
    #[serde(default)]
    pub brain: BrainConfig,
    /// Strength of the cross-model reactions wired by the orchestrator.
    #[serde(default)]
    pub reactions: ReactionsConfig,
    /// Persistence / save settings.
    #[serde(default)]
    pub persistence: PersistenceConfig,
}

impl MinipollConfig {
    /// Load configuration from a TOML string.
    ///
    /// # Errors
    /// Returns `MinipollError::Config` if the TOML is invalid.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        toml::from_str(toml_str).map_err(|e| MinipollError::Config(e.to_string()))
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Check that every value is usable by the models.
    ///
    /// # Errors
    /// Returns `MinipollError::Config` describing the first bad value.
    pub fn validate(&self) -> Result<()> {
        if let Some((name, value)) = self.float_values().into_iter().find(|(_, v)| !v.is_finite()) {
            return Err(MinipollError::Config(format!("{name} is {value}, expected a finite number")));
        }
        if self.memory.retention_window.is_nan() {
            return Err(MinipollError::Config("memory.retention_window is NaN".to_string()));
        }
        for stat in &self.stats.stats {
            if stat.min > stat.max {
                return Err(MinipollError::Config(format!(
                    "stat {} has min {} above max {}",
                    stat.kind, stat.min, stat.max
                )));
            }
        }
        for need in &self.needs.needs {
            if need.name.trim().is_empty() {
                return Err(MinipollError::Config("need with empty name".to_string()));
            }
            if !(0.0..=100.0).contains(&need.critical_threshold) {
                return Err(MinipollError::Config(format!(
                    "need {} critical_threshold {} outside 0..=100",
                    need.name, need.critical_threshold
                )));
            }
            if need.decrease_rate < 0.0 || need.health_damage_rate < 0.0 {
                return Err(MinipollError::Config(format!(
                    "need {} has a negative rate",
                    need.name
                )));
            }
        }
        if !(0.0..=100.0).contains(&self.needs.satisfied_threshold) {
            return Err(MinipollError::Config(format!(
                "satisfied_threshold {} outside 0..=100",
                self.needs.satisfied_threshold
            )));
        }
        if self.memory.max_capacity == 0 {
            return Err(MinipollError::Config("memory.max_capacity must be positive".to_string()));
        }
        if !(0.0..=1.0).contains(&self.health.critical_fraction) {
            return Err(MinipollError::Config(format!(
                "health.critical_fraction {} outside 0..=1",
                self.health.critical_fraction
            )));
        }
        for r in &self.health.resistances {
            if !(0.0..=1.0).contains(&r.fraction) {
                return Err(MinipollError::Config(format!(
                    "resistance to {:?} is {} (expected 0..=1)",
                    r.damage_type, r.fraction
                )));
            }
        }
        if self.brain.decision_interval <= 0.0 {
            return Err(MinipollError::Config("brain.decision_interval must be positive".to_string()));
        }
        if !(0.0..=1.0).contains(&self.brain.urgent_multiplier) || self.brain.urgent_multiplier == 0.0 {
            return Err(MinipollError::Config(format!(
                "brain.urgent_multiplier {} outside (0, 1]",
                self.brain.urgent_multiplier
            )));
        }
        if self.emotion.spread_chance < 0.0 {
            return Err(MinipollError::Config("emotion.spread_chance must not be negative".to_string()));
        }
        Ok(())
    }

    fn float_values(&self) -> Vec<(String, f32)> {
        let mut values = Vec::new();
        for stat in &self.stats.stats {
            values.push((format!("stats.{}.base", stat.kind), stat.base));
            values.push((format!("stats.{}.min", stat.kind), stat.min));
            values.push((format!("stats.{}.max", stat.kind), stat.max));
        }
        for need in &self.needs.needs {
            values.push((format!("needs.{}.initial_value", need.name), need.initial_value));
            values.push((format!("needs.{}.decrease_rate", need.name), need.decrease_rate));
            values.push((format!("needs.{}.critical_threshold", need.name), need.critical_threshold));
            values.push((format!("needs.{}.health_damage_rate", need.name), need.health_damage_rate));
        }
        for r in &self.health.resistances {
            values.push((format!("health.resistance.{:?}", r.damage_type), r.fraction));
        }
        let (n, e, h, b, r) = (&self.needs, &self.emotion, &self.health, &self.brain, &self.reactions);
        let fixed = [
            ("needs.satisfied_threshold", n.satisfied_threshold),
            ("emotion.spread_chance", e.spread_chance),
            ("emotion.default_decay_rate", e.default_decay_rate),
            ("emotion.fear_spread_radius", e.fear_spread_radius),
            ("health.regen_rate", h.regen_rate),
            ("health.regen_delay", h.regen_delay),
            ("health.invulnerability_duration", h.invulnerability_duration),
            ("health.critical_fraction", h.critical_fraction),
            ("brain.decision_interval", b.decision_interval),
            ("brain.urgent_multiplier", b.urgent_multiplier),
            ("brain.urgent_threshold", b.urgent_threshold),
            ("brain.completion_urgency", b.completion_urgency),
            ("reactions.critical_need_intensity", r.critical_need_intensity),
            ("reactions.satisfied_intensity", r.satisfied_intensity),
            ("reactions.damage_intensity", r.damage_intensity),
            ("reactions.fear_health_fraction", r.fear_health_fraction),
            ("reactions.heal_intensity", r.heal_intensity),
            ("reactions.critical_health_fear", r.critical_health_fear),
            ("reactions.critical_speed_penalty", r.critical_speed_penalty),
            ("reactions.call_for_help_radius", r.call_for_help_radius),
            ("reactions.removal_delay", r.removal_delay),
            ("reactions.attacked_memory_impact", r.attacked_memory_impact),
            ("reactions.healed_memory_impact", r.healed_memory_impact),
        ];
        values.extend(fixed.into_iter().map(|(name, v)| (name.to_string(), v)));
        values
    }
}

// ---------------------------------------------------------------------------
// Sub-configs
// ---------------------------------------------------------------------------

/// General system settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Log level: trace, debug, info, warn, error.
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Emit JSON log lines instead of human-readable ones.
    #[serde(default)]
    pub json_logs: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
        }
    }
}

/// One stat's base value and clamp bounds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatConfig {
    /// Which stat.
    pub kind: StatKind,
    /// Base value before modifiers.
    pub base: f32,
    /// Lower clamp bound for base and effective value.
    #[serde(default)]
    pub min: f32,
    /// Upper clamp bound for base and effective value.
    #[serde(default = "default_stat_max")]
    pub max: f32,
}

/// Which stats a creature has and their starting values.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsConfig {
    /// Registered stats. Kinds missing here read as 0 with a warning.
    #[serde(default = "default_stats")]
    pub stats: Vec<StatConfig>,
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            stats: default_stats(),
        }
    }
}

/// One physiological need.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NeedConfig {
    /// Need name (`hunger`, `thirst`, ...).
    pub name: String,
    /// Value at spawn (0–100).
    #[serde(default = "default_need_initial")]
    pub initial_value: f32,
    /// Units lost per second at multiplier 1.0.
    #[serde(default = "default_0_2")]
    pub decrease_rate: f32,
    /// At or below this value the need is critical.
    #[serde(default = "default_20_f32")]
    pub critical_threshold: f32,
    /// Health damage per second while critical.
    #[serde(default)]
    pub health_damage_rate: f32,
}

impl NeedConfig {
    fn standard(name: &str, initial: f32, rate: f32, threshold: f32, damage: f32) -> Self {
        Self {
            name: name.to_string(),
            initial_value: initial,
            decrease_rate: rate,
            critical_threshold: threshold,
            health_damage_rate: damage,
        }
    }
}

/// The creature's need set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NeedsConfig {
    /// Needs in evaluation order.
    #[serde(default = "default_needs")]
    pub needs: Vec<NeedConfig>,
    /// Whether critical needs hurt the creature.
    #[serde(default = "default_true")]
    pub enable_critical_damage: bool,
    /// Filling a need up through this value counts as "satisfied".
    #[serde(default = "default_90")]
    pub satisfied_threshold: f32,
}

impl Default for NeedsConfig {
    fn default() -> Self {
        Self {
            needs: default_needs(),
            enable_critical_damage: true,
            satisfied_threshold: 90.0,
        }
    }
}

/// Emotion decay and contagion settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmotionConfig {
    /// Probability per second that a spreadable emotion propagates.
    #[serde(default = "default_0_1")]
    pub spread_chance: f32,
    /// Decay rate used by reactions that do not specify one.
    #[serde(default = "default_0_05")]
    pub default_decay_rate: f32,
    /// Radius given to fear when the creature is hurt (0 disables contagion).
    #[serde(default = "default_5_0")]
    pub fear_spread_radius: f32,
}

impl Default for EmotionConfig {
    fn default() -> Self {
        Self {
            spread_chance: 0.1,
            default_decay_rate: 0.05,
            fear_spread_radius: 5.0,
        }
    }
}

/// Interaction memory limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// Hard cap on remembered events; oldest are evicted first.
    #[serde(default = "default_50")]
    pub max_capacity: usize,
    /// Seconds an event is kept before it is forgotten.
    #[serde(default = "default_600")]
    pub retention_window: f64,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            max_capacity: 50,
            retention_window: 600.0,
        }
    }
}

/// Fractional damage reduction against one damage type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resistance {
    /// Damage type resisted.
    pub damage_type: DamageType,
    /// Fraction removed (0 = none, 1 = immune).
    pub fraction: f32,
}

/// Hit points, regeneration and critical state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthConfig {
    /// Health regenerated per second once the regen delay has passed.
    #[serde(default = "default_1_0")]
    pub regen_rate: f32,
    /// Seconds after the last hit before regeneration resumes.
    #[serde(default = "default_5_0")]
    pub regen_delay: f32,
    /// Seconds of invulnerability after each hit.
    #[serde(default = "default_0_5")]
    pub invulnerability_duration: f32,
    /// Fraction of max health at or below which the creature is critical.
    #[serde(default = "default_0_25")]
    pub critical_fraction: f32,
    /// Per-type damage resistances.
    #[serde(default)]
    pub resistances: Vec<Resistance>,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            regen_rate: 1.0,
            regen_delay: 5.0,
            invulnerability_duration: 0.5,
            critical_fraction: 0.25,
            resistances: Vec::new(),
        }
    }
}

/// A goal in the creature's catalog.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GoalSpec {
    /// Which goal.
    pub kind: GoalKind,
    /// Its base priority.
    pub priority: GoalPriority,
}

/// Goal arbitration timing and catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrainConfig {
    /// Seconds between decisions.
    #[serde(default = "default_1_0")]
    pub decision_interval: f32,
    /// Interval multiplier applied while any goal is urgent.
    #[serde(default = "default_0_5")]
    pub urgent_multiplier: f32,
    /// Urgency above which the brain decides faster.
    #[serde(default = "default_0_8")]
    pub urgent_threshold: f32,
    /// The active goal completes once its urgency drops below this, and
    /// goals below it are not selected.
    #[serde(default = "default_0_1")]
    pub completion_urgency: f32,
    /// The fixed goal catalog.
    #[serde(default = "default_goals")]
    pub goals: Vec<GoalSpec>,
}

impl Default for BrainConfig {
    fn default() -> Self {
        Self {
            decision_interval: 1.0,
            urgent_multiplier: 0.5,
            urgent_threshold: 0.8,
            completion_urgency: 0.1,
            goals: default_goals(),
        }
    }
}

/// Intensities of the orchestrator's cross-model reactions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReactionsConfig {
    /// Emotion intensity when a need turns critical.
    #[serde(default = "default_0_4")]
    pub critical_need_intensity: f32,
    /// Happiness added when a need is satisfied.
    #[serde(default = "default_0_3")]
    pub satisfied_intensity: f32,
    /// Fear/anger intensity per hit.
    #[serde(default = "default_0_5")]
    pub damage_intensity: f32,
    /// Below this health fraction a hit causes fear, above it anger.
    #[serde(default = "default_0_5")]
    pub fear_health_fraction: f32,
    /// Happiness added when healed.
    #[serde(default = "default_0_3")]
    pub heal_intensity: f32,
    /// Fear intensity on entering critical health.
    #[serde(default = "default_0_7")]
    pub critical_health_fear: f32,
    /// Percentage speed penalty while health is critical (negative).
    #[serde(default = "default_speed_penalty")]
    pub critical_speed_penalty: f32,
    /// Radius of the call-for-help signal.
    #[serde(default = "default_15_0")]
    pub call_for_help_radius: f32,
    /// Seconds between death and removal from the world.
    #[serde(default = "default_10_0")]
    pub removal_delay: f32,
    /// Memory impact recorded for being attacked (magnitude).
    #[serde(default = "default_0_6")]
    pub attacked_memory_impact: f32,
    /// Memory impact recorded for being healed.
    #[serde(default = "default_0_4")]
    pub healed_memory_impact: f32,
}

impl Default for ReactionsConfig {
    fn default() -> Self {
        Self {
            critical_need_intensity: 0.4,
            satisfied_intensity: 0.3,
            damage_intensity: 0.5,
            fear_health_fraction: 0.5,
            heal_intensity: 0.3,
            critical_health_fear: 0.7,
            critical_speed_penalty: -50.0,
            call_for_help_radius: 15.0,
            removal_delay: 10.0,
            attacked_memory_impact: 0.6,
            healed_memory_impact: 0.4,
        }
    }
}

/// Persistence / save configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistenceConfig {
    /// Use WAL mode for concurrent reads.
    #[serde(default = "default_true")]
    pub wal_mode: bool,
    /// Detect save corruption via checksums.
    #[serde(default = "default_true")]
    pub checksum_enabled: bool,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            wal_mode: true,
            checksum_enabled: true,
        }
    }
}

// ---------------------------------------------------------------------------
// Serde default helpers
// ---------------------------------------------------------------------------

fn default_stats() -> Vec<StatConfig> {
    let stat = |kind, base, min, max| StatConfig { kind, base, min, max };
    vec![
        stat(StatKind::HealthCap, 100.0, 1.0, 1000.0),
        stat(StatKind::Speed, 3.5, 0.0, 20.0),
        stat(StatKind::Strength, 10.0, 0.0, 100.0),
        stat(StatKind::Defense, 2.0, 0.0, 100.0),
        stat(StatKind::Intelligence, 10.0, 0.0, 100.0),
        stat(StatKind::Charisma, 10.0, 0.0, 100.0),
        stat(StatKind::Luck, 5.0, 0.0, 100.0),
        stat(StatKind::Fertility, 0.5, 0.0, 1.0),
        stat(StatKind::Longevity, 100.0, 1.0, 1000.0),
    ]
}

fn default_needs() -> Vec<NeedConfig> {
    vec![
        NeedConfig::standard(HUNGER, 80.0, 0.3, 20.0, 0.5),
        NeedConfig::standard(THIRST, 80.0, 0.4, 20.0, 0.8),
        NeedConfig::standard(ENERGY, 100.0, 0.2, 15.0, 0.3),
        NeedConfig::standard(SOCIAL, 70.0, 0.15, 10.0, 0.0),
        NeedConfig::standard(HYGIENE, 90.0, 0.1, 10.0, 0.0),
    ]
}

fn default_goals() -> Vec<GoalSpec> {
    let goal = |kind, priority| GoalSpec { kind, priority };
    vec![
        goal(GoalKind::FindFood, GoalPriority::High),
        goal(GoalKind::FindWater, GoalPriority::High),
        goal(GoalKind::Rest, GoalPriority::Medium),
        goal(GoalKind::Socialize, GoalPriority::Medium),
        goal(GoalKind::Explore, GoalPriority::Low),
        goal(GoalKind::Escape, GoalPriority::Critical),
    ]
}

fn default_true() -> bool { true }
fn default_log_level() -> String { "info".to_string() }
fn default_stat_max() -> f32 { 100.0 }
fn default_need_initial() -> f32 { 100.0 }
fn default_speed_penalty() -> f32 { -50.0 }
fn default_0_05() -> f32 { 0.05 }
fn default_0_1() -> f32 { 0.1 }
fn default_0_2() -> f32 { 0.2 }
fn default_0_25() -> f32 { 0.25 }
fn default_0_3() -> f32 { 0.3 }
fn default_0_4() -> f32 { 0.4 }
fn default_0_5() -> f32 { 0.5 }
fn default_0_6() -> f32 { 0.6 }
fn default_0_7() -> f32 { 0.7 }
fn default_0_8() -> f32 { 0.8 }
fn default_1_0() -> f32 { 1.0 }
fn default_5_0() -> f32 { 5.0 }
fn default_10_0() -> f32 { 10.0 }
fn default_15_0() -> f32 { 15.0 }
fn default_20_f32() -> f32 { 20.0 }
fn default_90() -> f32 { 90.0 }
fn default_50() -> usize { 50 }
fn default_600() -> f64 { 600.0 }

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_gives_defaults() {
        let config = MinipollConfig::from_toml("").expect("empty config parses");
        assert_eq!(config.needs.needs.len(), 5);
        assert_eq!(config.brain.goals.len(), 6);
        assert_eq!(config.memory.max_capacity, 50);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_toml_overrides_only_given_fields() {
        let config = MinipollConfig::from_toml(
            r#"
            [memory]
            max_capacity = 2

            [health]
            regen_delay = 2.5

            [[health.resistances]]
            damage_type = "Fire"
            fraction = 0.5
            "#,
        )
        .expect("valid config");
        assert_eq!(config.memory.max_capacity, 2);
        assert!((config.memory.retention_window - 600.0).abs() < f64::EPSILON);
        assert!((config.health.regen_delay - 2.5).abs() < f32::EPSILON);
        assert_eq!(config.health.resistances.len(), 1);
    }

    #[test]
    fn custom_need_list_parses() {
        let config = MinipollConfig::from_toml(
            r#"
            [needs]
            enable_critical_damage = false

            [[needs.needs]]
            name = "hunger"
            initial_value = 60.0
            decrease_rate = 0.3
            critical_threshold = 10.0
            health_damage_rate = 1.0
            "#,
        )
        .expect("valid config");
        assert_eq!(config.needs.needs.len(), 1);
        assert!(!config.needs.enable_critical_damage);
        assert!((config.needs.satisfied_threshold - 90.0).abs() < f32::EPSILON);
    }

    #[test]
    fn invalid_toml_is_a_config_error() {
        let err = MinipollConfig::from_toml("[memory\nmax_capacity = ").expect_err("truncated toml");
        assert!(matches!(err, MinipollError::Config(_)));
    }

    #[test]
    fn validate_rejects_bad_values() {
        let mut config = MinipollConfig::default();
        config.memory.max_capacity = 0;
        assert!(config.validate().is_err());

        let mut config = MinipollConfig::default();
        config.needs.needs[0].critical_threshold = 150.0;
        assert!(config.validate().is_err());

        let mut config = MinipollConfig::default();
        config.health.critical_fraction = 2.0;
        assert!(config.validate().is_err());

        let mut config = MinipollConfig::default();
        config.brain.decision_interval = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_non_finite_values() {
        let cases: [fn(&mut MinipollConfig); 7] = [
            |c| c.emotion.spread_chance = f32::NAN,
            |c| c.emotion.spread_chance = f32::INFINITY,
            |c| c.stats.stats[0].min = f32::NAN,
            |c| c.stats.stats[0].max = f32::NAN,
            |c| c.needs.needs[0].decrease_rate = f32::NAN,
            |c| c.brain.decision_interval = f32::NAN,
            |c| c.reactions.removal_delay = f32::INFINITY,
        ];
        for (i, break_it) in cases.into_iter().enumerate() {
            let mut config = MinipollConfig::default();
            break_it(&mut config);
            assert!(config.validate().is_err(), "case {i}");
        }

        let config = MinipollConfig::from_toml("[emotion]\nspread_chance = nan\n").expect("parses");
        assert!(config.validate().is_err());
    }
}
