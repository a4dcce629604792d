//! Emotion model: decaying intensity per emotion kind, with contagion.
//!
//! A creature holds at most one live [`EmotionInstance`] per [`EmotionKind`].
//! Adding an emotion that is already present reinforces it: intensities are
//! summed (capped at 1.0) and the decay rate and spread radius keep the larger
//! of the old and new values.
//!
//! ## Contagion
//!
//! Instances with a spread radius are rolled once per tick with probability
//! `spread_chance * dt`. A successful roll yields a [`SpreadPulse`] at half
//! the source intensity; the world delivers it to every other creature in
//! range through the receiver's own [`EmotionModel::add`].
//!
//! ## Mood
//!
//! Each kind has a PAD profile (Russell & Mehrabian, 1977). The creature's
//! mood is the intensity-weighted sum of those profiles, clamped per axis.

pub mod mapping;

use std::fmt;
use std::str::FromStr;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::MinipollError;
use crate::types::PADState;

/// The closed set of local emotions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EmotionKind {
    /// Contentment, pleasure.
    Happy,
    /// Sorrow, loss.
    Sad,
    /// Fear of a threat.
    Afraid,
    /// Interest in the unknown.
    Curious,
    /// Hostility.
    Angry,
    /// Revulsion.
    Disgusted,
    /// Sudden unexpectedness.
    Surprised,
    /// Confidence in others.
    Trusting,
    /// Attachment.
    Loving,
    /// Resentment of a rival.
    Jealous,
    /// Social discomfort.
    Embarrassed,
    /// Acute fright.
    Scared,
    /// High positive arousal.
    Excited,
}

impl EmotionKind {
    /// Every emotion kind, in declaration order.
    pub const ALL: [Self; 13] = [
        Self::Happy,
        Self::Sad,
        Self::Afraid,
        Self::Curious,
        Self::Angry,
        Self::Disgusted,
        Self::Surprised,
        Self::Trusting,
        Self::Loving,
        Self::Jealous,
        Self::Embarrassed,
        Self::Scared,
        Self::Excited,
    ];

    /// Stable lowercase name.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Happy => "happy",
            Self::Sad => "sad",
            Self::Afraid => "afraid",
            Self::Curious => "curious",
            Self::Angry => "angry",
            Self::Disgusted => "disgusted",
            Self::Surprised => "surprised",
            Self::Trusting => "trusting",
            Self::Loving => "loving",
            Self::Jealous => "jealous",
            Self::Embarrassed => "embarrassed",
            Self::Scared => "scared",
            Self::Excited => "excited",
        }
    }

    /// Whether this kind is one of the fear emotions.
    #[must_use]
    pub fn is_fear(self) -> bool {
        matches!(self, Self::Afraid | Self::Scared)
    }

    /// PAD coordinates of this emotion at full intensity.
    #[must_use]
    pub fn pad_profile(self) -> PADState {
        let (p, a, d) = match self {
            Self::Happy => (0.8, 0.3, 0.4),
            Self::Sad => (-0.7, -0.4, -0.4),
            Self::Afraid => (-0.6, 0.6, -0.6),
            Self::Curious => (0.3, 0.5, 0.2),
            Self::Angry => (-0.5, 0.7, 0.5),
            Self::Disgusted => (-0.6, 0.2, 0.3),
            Self::Surprised => (0.1, 0.8, -0.1),
            Self::Trusting => (0.5, -0.2, 0.1),
            Self::Loving => (0.9, 0.2, 0.1),
            Self::Jealous => (-0.5, 0.4, -0.2),
            Self::Embarrassed => (-0.4, 0.3, -0.6),
            Self::Scared => (-0.7, 0.8, -0.7),
            Self::Excited => (0.6, 0.9, 0.3),
        };
        PADState::new(p, a, d)
    }
}

impl fmt::Display for EmotionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for EmotionKind {
    type Err = MinipollError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|k| k.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| MinipollError::UnknownKey {
                kind: "emotion",
                key: s.to_string(),
            })
    }
}

/// One live emotion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmotionInstance {
    /// Which emotion.
    pub kind: EmotionKind,
    /// Current intensity in `(0, 1]`.
    pub intensity: f32,
    /// Intensity lost per second.
    pub decay_rate: f32,
    /// Contagion radius (0 = does not spread).
    pub spread_radius: f32,
}

/// An emotion leaving a creature toward its neighbours.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpreadPulse {
    /// Which emotion spreads.
    pub kind: EmotionKind,
    /// Intensity delivered to each receiver (half the source's).
    pub intensity: f32,
    /// Decay rate carried to the receiver.
    pub decay_rate: f32,
    /// Radius around the source within which receivers are reached.
    pub radius: f32,
}

/// Per-creature set of live emotions.
#[derive(Debug, Clone, Default)]
pub struct EmotionModel {
    instances: Vec<EmotionInstance>,
}

impl EmotionModel {
    /// Create an empty model.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or reinforce an emotion. Returns the resulting intensity.
    pub fn add(&mut self, kind: EmotionKind, intensity: f32, decay_rate: f32, spread_radius: f32) -> f32 {
        let intensity = if intensity.is_nan() { 0.0 } else { intensity.clamp(0.0, 1.0) };
        let decay_rate = decay_rate.max(0.0);
        let spread_radius = spread_radius.max(0.0);

        if let Some(existing) = self.instances.iter_mut().find(|e| e.kind == kind) {
            existing.intensity = (existing.intensity + intensity).min(1.0);
            existing.decay_rate = existing.decay_rate.max(decay_rate);
            existing.spread_radius = existing.spread_radius.max(spread_radius);
            return existing.intensity;
        }
        if intensity <= 0.0 {
            return 0.0;
        }
        self.instances.push(EmotionInstance {
            kind,
            intensity,
            decay_rate,
            spread_radius,
        });
        intensity
    }

    /// Decay every instance and drop the ones that reach zero.
    ///
    /// Returns the kinds that were removed.
    pub fn tick(&mut self, dt: f32) -> Vec<EmotionKind> {
        let dt = dt.max(0.0);
        let mut faded = Vec::new();
        self.instances.retain_mut(|e| {
            e.intensity -= e.decay_rate * dt;
            if e.intensity <= 0.0 {
                debug!(emotion = %e.kind, "Emotion faded");
                faded.push(e.kind);
                false
            } else {
                true
            }
        });
        faded
    }

    /// The most intense live emotion; ties go to the earliest added.
    #[must_use]
    pub fn dominant(&self) -> Option<&EmotionInstance> {
        self.instances.iter().fold(None, |best: Option<&EmotionInstance>, e| match best {
            Some(b) if b.intensity >= e.intensity => Some(b),
            _ => Some(e),
        })
    }

    /// Intensity of `kind`, 0 when absent.
    #[must_use]
    pub fn level_of(&self, kind: EmotionKind) -> f32 {
        self.instances
            .iter()
            .find(|e| e.kind == kind)
            .map_or(0.0, |e| e.intensity)
    }

    /// Whether `kind` currently has a live instance.
    #[must_use]
    pub fn has(&self, kind: EmotionKind) -> bool {
        self.instances.iter().any(|e| e.kind == kind)
    }

    /// Remove `kind` outright. Returns `true` if it was live.
    pub fn remove(&mut self, kind: EmotionKind) -> bool {
        let before = self.instances.len();
        self.instances.retain(|e| e.kind != kind);
        before != self.instances.len()
    }

    /// Drop every emotion.
    pub fn clear(&mut self) {
        self.instances.clear();
    }

    /// Roll contagion for every spreadable instance.
    ///
    /// Each instance with a positive radius spreads with probability
    /// `spread_chance * dt`; a product that is not positive (NaN included)
    /// spreads nothing. Pulses carry half the source intensity.
    pub fn roll_spread<R: Rng + ?Sized>(&self, dt: f32, spread_chance: f32, rng: &mut R) -> Vec<SpreadPulse> {
        let chance = spread_chance * dt;
        if chance.is_nan() || chance <= 0.0 {
            return Vec::new();
        }
        let probability = f64::from(chance.min(1.0));
        self.instances
            .iter()
            .filter(|e| e.spread_radius > 0.0)
            .filter(|_| rng.gen_bool(probability))
            .map(|e| SpreadPulse {
                kind: e.kind,
                intensity: e.intensity * 0.5,
                decay_rate: e.decay_rate,
                radius: e.spread_radius,
            })
            .filter(|p| p.intensity > 0.0)
            .collect()
    }

    /// Intensity-weighted PAD blend of every live emotion.
    #[must_use]
    pub fn mood(&self) -> PADState {
        let (p, a, d) = self.instances.iter().fold((0.0, 0.0, 0.0), |(p, a, d), e| {
            let profile = e.kind.pad_profile();
            (
                p + profile.pleasure * e.intensity,
                a + profile.arousal * e.intensity,
                d + profile.dominance * e.intensity,
            )
        });
        PADState::new(p, a, d)
    }

    /// Pleasure axis of [`Self::mood`].
    #[must_use]
    pub fn valence(&self) -> f32 {
        self.mood().pleasure
    }

    /// Live instances in insertion order.
    #[must_use]
    pub fn instances(&self) -> &[EmotionInstance] {
        &self.instances
    }

    /// Number of live emotions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.instances.len()
    }

    /// Whether no emotion is live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }
}
