//! Mapping between local emotions and the taxonomies of collaborating systems.
//!
//! The memory / world-event systems speak [`MemoryEmotion`] (Plutchik's eight
//! primaries plus neutral); the social system speaks [`SocialMood`]. Every
//! function here is total: unmapped inputs fall back to [`EmotionKind::Happy`]
//! coming in and to the neutral member going out.

use serde::{Deserialize, Serialize};

use super::EmotionKind;

/// Emotion taxonomy used by memory and world-event producers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MemoryEmotion {
    /// Joy.
    Joy,
    /// Sadness.
    Sadness,
    /// Fear.
    Fear,
    /// Anger.
    Anger,
    /// Surprise.
    Surprise,
    /// Disgust.
    Disgust,
    /// Trust.
    Trust,
    /// Anticipation.
    Anticipation,
    /// No particular emotion.
    Neutral,
}

/// Mood vocabulary of the social relationship system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SocialMood {
    /// Open to interaction.
    Friendly,
    /// Seeking closeness.
    Affectionate,
    /// Cautious.
    Wary,
    /// Aggressive.
    Hostile,
    /// Avoiding others.
    Withdrawn,
    /// No particular mood.
    Neutral,
}

/// Local emotion → memory taxonomy.
#[must_use]
pub fn to_memory_emotion(kind: EmotionKind) -> MemoryEmotion {
    match kind {
        EmotionKind::Happy => MemoryEmotion::Joy,
        EmotionKind::Sad => MemoryEmotion::Sadness,
        EmotionKind::Afraid | EmotionKind::Scared => MemoryEmotion::Fear,
        EmotionKind::Angry | EmotionKind::Jealous => MemoryEmotion::Anger,
        EmotionKind::Surprised => MemoryEmotion::Surprise,
        EmotionKind::Disgusted => MemoryEmotion::Disgust,
        EmotionKind::Trusting | EmotionKind::Loving => MemoryEmotion::Trust,
        EmotionKind::Curious | EmotionKind::Excited => MemoryEmotion::Anticipation,
        EmotionKind::Embarrassed => MemoryEmotion::Neutral,
    }
}

/// Memory taxonomy → local emotion.
#[must_use]
pub fn from_memory_emotion(emotion: MemoryEmotion) -> EmotionKind {
    match emotion {
        MemoryEmotion::Sadness => EmotionKind::Sad,
        MemoryEmotion::Fear => EmotionKind::Afraid,
        MemoryEmotion::Anger => EmotionKind::Angry,
        MemoryEmotion::Surprise => EmotionKind::Surprised,
        MemoryEmotion::Disgust => EmotionKind::Disgusted,
        MemoryEmotion::Trust => EmotionKind::Trusting,
        MemoryEmotion::Anticipation => EmotionKind::Excited,
        MemoryEmotion::Joy | MemoryEmotion::Neutral => EmotionKind::Happy,
    }
}

/// Local emotion → social mood.
#[must_use]
pub fn to_social_mood(kind: EmotionKind) -> SocialMood {
    match kind {
        EmotionKind::Happy | EmotionKind::Trusting | EmotionKind::Excited => SocialMood::Friendly,
        EmotionKind::Loving => SocialMood::Affectionate,
        EmotionKind::Afraid | EmotionKind::Scared | EmotionKind::Jealous => SocialMood::Wary,
        EmotionKind::Angry | EmotionKind::Disgusted => SocialMood::Hostile,
        EmotionKind::Sad | EmotionKind::Embarrassed => SocialMood::Withdrawn,
        EmotionKind::Curious | EmotionKind::Surprised => SocialMood::Neutral,
    }
}

/// Social mood → local emotion.
#[must_use]
pub fn from_social_mood(mood: SocialMood) -> EmotionKind {
    match mood {
        SocialMood::Affectionate => EmotionKind::Loving,
        SocialMood::Wary => EmotionKind::Afraid,
        SocialMood::Hostile => EmotionKind::Angry,
        SocialMood::Withdrawn => EmotionKind::Sad,
        SocialMood::Friendly | SocialMood::Neutral => EmotionKind::Happy,
    }
}

/// Map an optional dominant emotion to a social mood (none → neutral).
#[must_use]
pub fn social_mood_of(dominant: Option<EmotionKind>) -> SocialMood {
    dominant.map_or(SocialMood::Neutral, to_social_mood)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primaries_round_trip_through_memory_taxonomy() {
        for emotion in [
            MemoryEmotion::Joy,
            MemoryEmotion::Sadness,
            MemoryEmotion::Fear,
            MemoryEmotion::Anger,
            MemoryEmotion::Surprise,
            MemoryEmotion::Disgust,
            MemoryEmotion::Trust,
            MemoryEmotion::Anticipation,
        ] {
            assert_eq!(to_memory_emotion(from_memory_emotion(emotion)), emotion);
        }
    }

    #[test]
    fn unmapped_inputs_default() {
        assert_eq!(from_memory_emotion(MemoryEmotion::Neutral), EmotionKind::Happy);
        assert_eq!(from_social_mood(SocialMood::Neutral), EmotionKind::Happy);
        assert_eq!(to_memory_emotion(EmotionKind::Embarrassed), MemoryEmotion::Neutral);
        assert_eq!(social_mood_of(None), SocialMood::Neutral);
    }

    #[test]
    fn every_local_kind_maps_somewhere() {
        for kind in EmotionKind::ALL {
            let _ = to_memory_emotion(kind);
            let _ = to_social_mood(kind);
        }
        assert_eq!(to_social_mood(EmotionKind::Scared), SocialMood::Wary);
        assert_eq!(from_social_mood(SocialMood::Hostile), EmotionKind::Angry);
    }
}
