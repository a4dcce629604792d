//! Flat save/load snapshot of one creature.
//!
//! Only model state is captured: stat bases, need values, live emotions,
//! memories and health. Position is kept so a loaded world can be rebuilt,
//! but no other transform or physics state is saved.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::brain::GoalKind;
use crate::emotion::EmotionInstance;
use crate::error::{MinipollError, Result};
use crate::memory::MemoryEvent;
use crate::stats::StatKind;
use crate::types::{CreatureId, Position};

/// Current snapshot format.
pub const SNAPSHOT_VERSION: u32 = 1;

/// A saved need value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NeedValue {
    /// Need name.
    pub name: String,
    /// Value in `[0, 100]`.
    pub value: f32,
}

/// Saved health state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HealthSnapshot {
    /// Current hit points.
    pub current: f32,
    /// Maximum hit points.
    pub max: f32,
    /// Whether the creature was in the critical band.
    pub critical: bool,
    /// Whether the creature was dead.
    pub dead: bool,
}

/// Everything needed to restore a creature's internal state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatureSnapshot {
    /// Format version.
    pub version: u32,
    /// Creature identity.
    pub id: CreatureId,
    /// Display name.
    pub name: String,
    /// Last known position.
    pub position: Position,
    /// When the snapshot was taken.
    pub saved_at: DateTime<Utc>,
    /// Base stat values.
    pub stats: Vec<(StatKind, f32)>,
    /// Need values in declaration order.
    pub needs: Vec<NeedValue>,
    /// Live emotions.
    pub emotions: Vec<EmotionInstance>,
    /// Remembered events, oldest first.
    pub memories: Vec<MemoryEvent>,
    /// Memory store clock.
    pub memory_clock: f64,
    /// Health state.
    pub health: HealthSnapshot,
    /// Active goal.
    pub current_goal: Option<GoalKind>,
    /// Preset the host built the creature from, if any.
    #[serde(default)]
    pub profile: Option<String>,
}

impl CreatureSnapshot {
    /// Encode as JSON bytes.
    ///
    /// # Errors
    /// Returns [`MinipollError::Serialization`] if encoding fails.
    pub fn to_json(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self).map_err(|e| MinipollError::Serialization(e.to_string()))
    }

    /// Decode from JSON bytes, rejecting unknown format versions.
    ///
    /// # Errors
    /// Returns [`MinipollError::Serialization`] on malformed input or a
    /// version newer than [`SNAPSHOT_VERSION`].
    pub fn from_json(bytes: &[u8]) -> Result<Self> {
        let snapshot: Self =
            serde_json::from_slice(bytes).map_err(|e| MinipollError::Serialization(e.to_string()))?;
        if snapshot.version > SNAPSHOT_VERSION {
            return Err(MinipollError::Serialization(format!(
                "snapshot version {} is newer than supported {SNAPSHOT_VERSION}",
                snapshot.version
            )));
        }
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emotion::EmotionKind;

    fn sample() -> CreatureSnapshot {
        CreatureSnapshot {
            version: SNAPSHOT_VERSION,
            id: CreatureId::new(),
            name: "Pip".to_string(),
            position: Position::new(1.0, 2.0, 0.0),
            saved_at: Utc::now(),
            stats: vec![(StatKind::Speed, 3.5)],
            needs: vec![NeedValue {
                name: "hunger".to_string(),
                value: 42.0,
            }],
            emotions: vec![EmotionInstance {
                kind: EmotionKind::Curious,
                intensity: 0.4,
                decay_rate: 0.05,
                spread_radius: 0.0,
            }],
            memories: Vec::new(),
            memory_clock: 12.5,
            health: HealthSnapshot {
                current: 80.0,
                max: 100.0,
                critical: false,
                dead: false,
            },
            current_goal: Some(GoalKind::Explore),
            profile: Some("Skittish".to_string()),
        }
    }

    #[test]
    fn json_round_trip() {
        let snapshot = sample();
        let bytes = snapshot.to_json().expect("encode");
        assert_eq!(CreatureSnapshot::from_json(&bytes).expect("decode"), snapshot);
    }

    #[test]
    fn missing_profile_decodes_as_none() {
        let mut value = serde_json::to_value(sample()).expect("encode");
        value.as_object_mut().expect("object").remove("profile");
        let bytes = serde_json::to_vec(&value).expect("encode");
        assert_eq!(CreatureSnapshot::from_json(&bytes).expect("decode").profile, None);
    }

    #[test]
    fn future_version_is_rejected() {
        let mut snapshot = sample();
        snapshot.version = SNAPSHOT_VERSION + 1;
        let bytes = snapshot.to_json().expect("encode");
        assert!(CreatureSnapshot::from_json(&bytes).is_err());
    }
}
