//! Memory store: a bounded, time-limited log of interaction events.
//!
//! Entries are stamped with the store's own clock, which advances with
//! [`MemoryStore::tick`]. Anything older than the retention window is
//! forgotten, and the store never holds more than `max_capacity` entries:
//! the oldest-inserted entry is always the first to go, whatever its impact.

use std::collections::VecDeque;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::config::MemoryConfig;
use crate::types::{CreatureId, MemoryId};

/// Kind of interaction between two creatures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InteractionType {
    /// Was hit by the other creature.
    Attacked,
    /// Was healed by the other creature.
    Healed,
    /// Was given food.
    Fed,
    /// Played together.
    Played,
    /// Was groomed.
    Groomed,
    /// First encounter.
    Met,
    /// Received help.
    Helped,
    /// Was threatened.
    Threatened,
    /// Shared something.
    Shared,
}

impl InteractionType {
    fn verb(self) -> &'static str {
        match self {
            Self::Attacked => "Was attacked by",
            Self::Healed => "Was healed by",
            Self::Fed => "Was fed by",
            Self::Played => "Played with",
            Self::Groomed => "Was groomed by",
            Self::Met => "Met",
            Self::Helped => "Was helped by",
            Self::Threatened => "Was threatened by",
            Self::Shared => "Shared with",
        }
    }
}

impl fmt::Display for InteractionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// One remembered event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryEvent {
    /// Unique id.
    pub id: MemoryId,
    /// Human-readable description.
    pub description: String,
    /// The other creature involved, if any. Never owned.
    pub related: Option<CreatureId>,
    /// Store clock (seconds) when the event was recorded.
    pub timestamp: f64,
    /// Whether the experience was good.
    pub positive: bool,
    /// Emotional impact magnitude in `[0, 1]`.
    pub impact: f32,
    /// Interaction that produced this memory, if any.
    pub interaction: Option<InteractionType>,
}

impl MemoryEvent {
    /// Impact with sign: positive memories count up, negative ones down.
    #[must_use]
    pub fn signed_impact(&self) -> f32 {
        if self.positive { self.impact } else { -self.impact }
    }
}

/// Per-creature interaction memory.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    entries: VecDeque<MemoryEvent>,
    clock: f64,
    max_capacity: usize,
    retention_window: f64,
    evicted_total: u64,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new(config: &MemoryConfig) -> Self {
        Self {
            entries: VecDeque::with_capacity(config.max_capacity.min(256)),
            clock: 0.0,
            max_capacity: config.max_capacity.max(1),
            retention_window: config.retention_window,
            evicted_total: 0,
        }
    }

    /// Record an event. Capacity is enforced immediately.
    pub fn add(
        &mut self,
        description: impl Into<String>,
        related: Option<CreatureId>,
        positive: bool,
        impact: f32,
    ) -> MemoryId {
        self.push(description.into(), related, positive, impact, None)
    }

    /// Record an interaction with `other`; the sign of `impact` decides polarity.
    pub fn remember_interaction(
        &mut self,
        other: CreatureId,
        interaction: InteractionType,
        impact: f32,
    ) -> MemoryId {
        let description = format!("{} {other}", interaction.verb());
        self.push(description, Some(other), impact >= 0.0, impact.abs(), Some(interaction))
    }

    /// Advance the clock, forget expired entries, then trim to capacity.
    ///
    /// Returns how many entries were removed.
    pub fn tick(&mut self, dt: f64) -> usize {
        self.clock += dt.max(0.0);
        let cutoff = self.clock - self.retention_window;
        let before = self.entries.len();
        self.entries.retain(|e| e.timestamp >= cutoff);
        let expired = before - self.entries.len();
        let removed = expired + self.enforce_capacity();
        if removed > 0 {
            trace!(removed, remaining = self.entries.len(), "Memories forgotten");
        }
        self.evicted_total += expired as u64;
        removed
    }

    /// Memories involving `other`, oldest first.
    pub fn about(&self, other: CreatureId) -> impl Iterator<Item = &MemoryEvent> {
        self.entries.iter().filter(move |e| e.related == Some(other))
    }

    /// Net feeling toward `other`, in `[-1, 1]`.
    #[must_use]
    pub fn sentiment_toward(&self, other: CreatureId) -> f32 {
        self.about(other)
            .map(MemoryEvent::signed_impact)
            .sum::<f32>()
            .clamp(-1.0, 1.0)
    }

    /// The `n` most recent memories, newest first.
    #[must_use]
    pub fn recent(&self, n: usize) -> Vec<&MemoryEvent> {
        self.entries.iter().rev().take(n).collect()
    }

    /// All memories, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &MemoryEvent> {
        self.entries.iter()
    }

    /// Number of memories held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Current store clock in seconds.
    #[must_use]
    pub fn clock(&self) -> f64 {
        self.clock
    }

    /// Total entries dropped by expiry or eviction since creation.
    #[must_use]
    pub fn evicted_total(&self) -> u64 {
        self.evicted_total
    }

    /// Replace the contents with saved entries and clock.
    pub fn restore(&mut self, entries: Vec<MemoryEvent>, clock: f64) {
        self.entries = entries.into();
        self.clock = clock;
        self.enforce_capacity();
    }

    fn push(
        &mut self,
        description: String,
        related: Option<CreatureId>,
        positive: bool,
        impact: f32,
        interaction: Option<InteractionType>,
    ) -> MemoryId {
        let id = MemoryId::new();
        self.entries.push_back(MemoryEvent {
            id,
            description,
            related,
            timestamp: self.clock,
            positive,
            impact: if impact.is_nan() { 0.0 } else { impact.clamp(0.0, 1.0) },
            interaction,
        });
        self.enforce_capacity();
        id
    }

    fn enforce_capacity(&mut self) -> usize {
        let mut evicted = 0;
        while self.entries.len() > self.max_capacity {
            self.entries.pop_front();
            evicted += 1;
        }
        self.evicted_total += evicted as u64;
        evicted
    }
}
