//! Runtime counters and frame timing.
//!
//! Counters are lock-free `AtomicU64`s bumped from the hot path and read on
//! export. Frame timings keep a small ring buffer behind a
//! `parking_lot::Mutex`; it is only locked once per frame and on reads.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use parking_lot::Mutex;

// ---------------------------------------------------------------------------
// Counters
// ---------------------------------------------------------------------------

/// Atomic counters for simulation events.
#[derive(Debug)]
pub struct SimCounters {
    /// Creature ticks run.
    pub creature_ticks: AtomicU64,
    /// Creatures that died.
    pub deaths: AtomicU64,
    /// Creatures brought back.
    pub revives: AtomicU64,
    /// Hits that dealt damage.
    pub damage_events: AtomicU64,
    /// Emotion pulses delivered to a receiver.
    pub emotion_spreads: AtomicU64,
    /// Memories dropped by expiry or capacity.
    pub memories_evicted: AtomicU64,
    /// Active-goal changes.
    pub goal_switches: AtomicU64,
    /// Snapshots written.
    pub saves_completed: AtomicU64,
}

impl SimCounters {
    /// Zeroed counters.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            creature_ticks: AtomicU64::new(0),
            deaths: AtomicU64::new(0),
            revives: AtomicU64::new(0),
            damage_events: AtomicU64::new(0),
            emotion_spreads: AtomicU64::new(0),
            memories_evicted: AtomicU64::new(0),
            goal_switches: AtomicU64::new(0),
            saves_completed: AtomicU64::new(0),
        }
    }

    /// Add `n` to `counter`.
    pub fn add(counter: &AtomicU64, n: u64) {
        counter.fetch_add(n, Ordering::Relaxed);
    }

    /// Read every counter.
    #[must_use]
    pub fn snapshot(&self) -> CounterSnapshot {
        CounterSnapshot {
            creature_ticks: self.creature_ticks.load(Ordering::Relaxed),
            deaths: self.deaths.load(Ordering::Relaxed),
            revives: self.revives.load(Ordering::Relaxed),
            damage_events: self.damage_events.load(Ordering::Relaxed),
            emotion_spreads: self.emotion_spreads.load(Ordering::Relaxed),
            memories_evicted: self.memories_evicted.load(Ordering::Relaxed),
            goal_switches: self.goal_switches.load(Ordering::Relaxed),
            saves_completed: self.saves_completed.load(Ordering::Relaxed),
        }
    }
}

impl Default for SimCounters {
    fn default() -> Self {
        Self::new()
    }
}

/// Counter values at one point in time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CounterSnapshot {
    /// Creature ticks run.
    pub creature_ticks: u64,
    /// Deaths.
    pub deaths: u64,
    /// Revives.
    pub revives: u64,
    /// Damaging hits.
    pub damage_events: u64,
    /// Delivered emotion pulses.
    pub emotion_spreads: u64,
    /// Evicted memories.
    pub memories_evicted: u64,
    /// Goal switches.
    pub goal_switches: u64,
    /// Snapshots written.
    pub saves_completed: u64,
}

impl CounterSnapshot {
    /// Prometheus text exposition.
    #[must_use]
    pub fn to_prometheus(&self) -> String {
        let metrics = [
            ("minipoll_creature_ticks_total", "Creature ticks run", self.creature_ticks),
            ("minipoll_deaths_total", "Creatures that died", self.deaths),
            ("minipoll_revives_total", "Creatures revived", self.revives),
            ("minipoll_damage_events_total", "Hits that dealt damage", self.damage_events),
            ("minipoll_emotion_spreads_total", "Emotion pulses delivered", self.emotion_spreads),
            ("minipoll_memories_evicted_total", "Memories forgotten", self.memories_evicted),
            ("minipoll_goal_switches_total", "Active goal changes", self.goal_switches),
            ("minipoll_saves_completed_total", "Snapshots written", self.saves_completed),
        ];
        let mut out = String::new();
        for (name, help, value) in metrics {
            out.push_str(&format!("# HELP {name} {help}\n# TYPE {name} counter\n{name} {value}\n"));
        }
        out
    }
}

// ---------------------------------------------------------------------------
// Frame timings
// ---------------------------------------------------------------------------

const HISTORY_LEN: usize = 128;

/// Rolling history of world-tick durations.
#[derive(Debug)]
pub struct TickTimings {
    budget_ms: f64,
    history: Mutex<History>,
}

#[derive(Debug)]
struct History {
    timings: Vec<f64>,
    write_idx: usize,
    count: u64,
}

impl TickTimings {
    /// Track frames against a budget in milliseconds.
    #[must_use]
    pub fn new(budget_ms: f64) -> Self {
        Self {
            budget_ms,
            history: Mutex::new(History {
                timings: vec![0.0; HISTORY_LEN],
                write_idx: 0,
                count: 0,
            }),
        }
    }

    /// Start timing; the duration is recorded when the guard drops.
    pub fn begin(&self) -> TickGuard<'_> {
        TickGuard {
            timings: self,
            start: Instant::now(),
        }
    }

    /// Record one frame (milliseconds).
    pub fn record(&self, ms: f64) {
        let mut h = self.history.lock();
        let idx = h.write_idx;
        h.timings[idx] = ms;
        h.write_idx = (idx + 1) % HISTORY_LEN;
        h.count += 1;
    }

    /// Average and maximum over the retained window.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn summary(&self) -> TimingSummary {
        let h = self.history.lock();
        let n = usize::try_from(h.count).unwrap_or(HISTORY_LEN).min(HISTORY_LEN);
        if n == 0 {
            return TimingSummary::default();
        }
        let window = &h.timings[..n];
        let total: f64 = window.iter().sum();
        let max = window.iter().copied().fold(0.0, f64::max);
        let over = window.iter().filter(|&&t| t > self.budget_ms).count();
        TimingSummary {
            frames: h.count,
            average_ms: total / n as f64,
            max_ms: max,
            over_budget_ratio: over as f64 / n as f64,
        }
    }

    /// Frames recorded since creation.
    #[must_use]
    pub fn frame_count(&self) -> u64 {
        self.history.lock().count
    }

    /// Budget in milliseconds.
    #[must_use]
    pub fn budget_ms(&self) -> f64 {
        self.budget_ms
    }
}

/// Records elapsed time into its [`TickTimings`] on drop.
pub struct TickGuard<'a> {
    timings: &'a TickTimings,
    start: Instant,
}

impl Drop for TickGuard<'_> {
    fn drop(&mut self) {
        self.timings.record(self.start.elapsed().as_secs_f64() * 1000.0);
    }
}

/// Aggregate frame timings.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TimingSummary {
    /// Frames recorded in total.
    pub frames: u64,
    /// Mean over the window.
    pub average_ms: f64,
    /// Slowest frame in the window.
    pub max_ms: f64,
    /// Share of window frames over budget.
    pub over_budget_ratio: f64,
}

/// Span names used with `tracing::span!`.
pub mod spans {
    /// One world frame.
    pub const WORLD_TICK: &str = "minipoll::world::tick";
    /// One creature's own-model update.
    pub const CREATURE_TICK: &str = "minipoll::creature::tick";
    /// Delivering emotion pulses.
    pub const SPREAD: &str = "minipoll::world::spread";
    /// Writing snapshots.
    pub const PERSIST_SAVE: &str = "minipoll::persist::save";
}
