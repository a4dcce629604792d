//! World-level configuration and creature archetypes.
//!
//! Archetypes are presets applied on top of the base creature config, so one
//! `minipoll.toml` can describe a whole population.

use std::path::Path;

use minipoll_core::config::{MinipollConfig, Resistance};
use minipoll_core::error::{MinipollError, Result};
use minipoll_core::health::DamageType;
use minipoll_core::needs::SOCIAL;
use minipoll_core::stats::StatKind;
use serde::{Deserialize, Serialize};

/// Creature presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CreatureArchetype {
    /// The base config unchanged.
    #[default]
    Balanced,
    /// Tough and slow-burning: more health, defense and regeneration.
    Hardy,
    /// Low health and defense, needs drain faster.
    Fragile,
    /// Gregarious: social need matters more, emotions spread further.
    Social,
    /// Jumpy: long fear radius, quick decisions, gets scared early.
    Skittish,
}

impl CreatureArchetype {
    /// Every preset.
    pub const ALL: [Self; 5] = [Self::Balanced, Self::Hardy, Self::Fragile, Self::Social, Self::Skittish];

    /// Name as written in config files and snapshots.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Balanced => "Balanced",
            Self::Hardy => "Hardy",
            Self::Fragile => "Fragile",
            Self::Social => "Social",
            Self::Skittish => "Skittish",
        }
    }

    /// Preset with the given [`name`](Self::name).
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.name() == name)
    }

    /// One-line description.
    #[must_use]
    pub fn description(self) -> &'static str {
        match self {
            Self::Balanced => "Balanced: default tuning",
            Self::Hardy => "Hardy: durable, regenerates quickly",
            Self::Fragile => "Fragile: low health, hungry often",
            Self::Social => "Social: lonely quickly, contagious moods",
            Self::Skittish => "Skittish: easily frightened, flees early",
        }
    }

    /// Apply this preset to `base`.
    #[must_use]
    pub fn apply(self, base: &MinipollConfig) -> MinipollConfig {
        let mut config = base.clone();
        match self {
            Self::Balanced => {}
            Self::Hardy => {
                scale_stat(&mut config, StatKind::HealthCap, 1.5);
                scale_stat(&mut config, StatKind::Defense, 2.0);
                config.health.regen_rate *= 2.0;
                config.health.regen_delay *= 0.6;
                config.health.resistances.push(Resistance {
                    damage_type: DamageType::Cold,
                    fraction: 0.3,
                });
            }
            Self::Fragile => {
                scale_stat(&mut config, StatKind::HealthCap, 0.6);
                scale_stat(&mut config, StatKind::Defense, 0.5);
                for need in &mut config.needs.needs {
                    need.decrease_rate *= 1.3;
                }
            }
            Self::Social => {
                if let Some(social) = config.needs.needs.iter_mut().find(|n| n.name == SOCIAL) {
                    social.decrease_rate *= 2.0;
                    social.critical_threshold = social.critical_threshold.max(20.0);
                }
                scale_stat(&mut config, StatKind::Charisma, 1.5);
                config.emotion.spread_chance *= 2.0;
            }
            Self::Skittish => {
                config.emotion.fear_spread_radius *= 2.0;
                config.reactions.fear_health_fraction = 0.9;
                config.brain.decision_interval *= 0.5;
                scale_stat(&mut config, StatKind::Speed, 1.3);
            }
        }
        config
    }
}

fn scale_stat(config: &mut MinipollConfig, kind: StatKind, factor: f32) {
    if let Some(stat) = config.stats.stats.iter_mut().find(|s| s.kind == kind) {
        stat.base = (stat.base * factor).clamp(stat.min, stat.max);
    }
}

/// A creature to place at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpawnSpec {
    /// Display name.
    pub name: String,
    /// Preset to apply.
    #[serde(default)]
    pub archetype: CreatureArchetype,
    /// Starting position.
    #[serde(default)]
    pub position: [f32; 3],
}

/// Headless-run settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Frames to simulate.
    #[serde(default = "default_ticks")]
    pub ticks: u32,
    /// Seconds per frame.
    #[serde(default = "default_dt")]
    pub dt: f32,
    /// Real seconds per in-game day (0 disables the day/night cycle).
    #[serde(default = "default_day_length")]
    pub day_length: f64,
    /// Where to save snapshots at the end, if anywhere.
    #[serde(default)]
    pub save_path: Option<String>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            ticks: default_ticks(),
            dt: default_dt(),
            day_length: default_day_length(),
            save_path: None,
        }
    }
}

/// Top-level world configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorldConfig {
    /// Seed for every creature's RNG (mixed with spawn order).
    #[serde(default = "default_seed")]
    pub seed: u64,
    /// Frame budget in milliseconds for timing reports.
    #[serde(default = "default_budget")]
    pub frame_budget_ms: f64,
    /// Base creature tuning.
    #[serde(default)]
    pub creature: MinipollConfig,
    /// Initial population.
    #[serde(default)]
    pub spawn: Vec<SpawnSpec>,
    /// Headless-run settings.
    #[serde(default)]
    pub run: RunConfig,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            seed: default_seed(),
            frame_budget_ms: default_budget(),
            creature: MinipollConfig::default(),
            spawn: Vec::new(),
            run: RunConfig::default(),
        }
    }
}

impl WorldConfig {
    /// Parse from TOML.
    ///
    /// # Errors
    /// Returns `MinipollError::Config` on invalid TOML.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        toml::from_str(toml_str).map_err(|e| MinipollError::Config(e.to_string()))
    }

    /// Read and parse a TOML file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        Self::from_toml(&std::fs::read_to_string(path)?)
    }

    /// Creature config for `archetype`.
    #[must_use]
    pub fn creature_config(&self, archetype: CreatureArchetype) -> MinipollConfig {
        archetype.apply(&self.creature)
    }
}

fn default_seed() -> u64 { 42 }
fn default_budget() -> f64 { 2.0 }
fn default_ticks() -> u32 { 600 }
fn default_dt() -> f32 { 0.1 }
fn default_day_length() -> f64 { 1200.0 }

#[cfg(test)]
mod tests {
    use super::*;

    fn base_stat(config: &MinipollConfig, kind: StatKind) -> f32 {
        config
            .stats
            .stats
            .iter()
            .find(|s| s.kind == kind)
            .map_or(0.0, |s| s.base)
    }

    #[test]
    fn archetypes_tune_the_base() {
        let base = MinipollConfig::default();
        let hardy = CreatureArchetype::Hardy.apply(&base);
        assert!(base_stat(&hardy, StatKind::HealthCap) > base_stat(&base, StatKind::HealthCap));
        assert_eq!(hardy.health.resistances.len(), 1);

        let fragile = CreatureArchetype::Fragile.apply(&base);
        assert!(fragile.needs.needs[0].decrease_rate > base.needs.needs[0].decrease_rate);

        let balanced = CreatureArchetype::Balanced.apply(&base);
        assert_eq!(balanced.needs.needs.len(), base.needs.needs.len());
        for archetype in [
            CreatureArchetype::Balanced,
            CreatureArchetype::Hardy,
            CreatureArchetype::Fragile,
            CreatureArchetype::Social,
            CreatureArchetype::Skittish,
        ] {
            assert!(archetype.apply(&base).validate().is_ok(), "{}", archetype.description());
        }
    }

    #[test]
    fn world_toml_parses() {
        let config = WorldConfig::from_toml(
            r#"
            seed = 7

            [creature.memory]
            max_capacity = 10

            [[spawn]]
            name = "Pip"
            archetype = "Skittish"
            position = [1.0, 2.0, 0.0]

            [[spawn]]
            name = "Bo"

            [run]
            ticks = 50
            "#,
        )
        .expect("valid config");
        assert_eq!(config.seed, 7);
        assert_eq!(config.creature.memory.max_capacity, 10);
        assert_eq!(config.spawn.len(), 2);
        assert_eq!(config.spawn[1].archetype, CreatureArchetype::Balanced);
        assert_eq!(config.run.ticks, 50);
        assert!((config.run.dt - 0.1).abs() < f32::EPSILON);
    }
}
