//! Scheduled timers driven by the simulation clock.
//!
//! Timed effects (invulnerability windows, delayed regeneration, modifier
//! expiry, removal after death) are entries in a per-owner table keyed by
//! effect kind. Scheduling a key that is already live replaces the old
//! timer; nothing runs unless the owner calls [`TimerTable::advance`].

/// A single pending timer.
#[derive(Debug, Clone, Copy)]
struct Pending<K> {
    key: K,
    remaining: f32,
}

/// Table of cancellable countdown timers, at most one per key.
#[derive(Debug, Clone)]
pub struct TimerTable<K> {
    pending: Vec<Pending<K>>,
}

impl<K: Copy + Eq> TimerTable<K> {
    /// Create an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self {
            pending: Vec::new(),
        }
    }

    /// Schedule `key` to fire after `seconds`, cancelling any live timer for it.
    pub fn schedule(&mut self, key: K, seconds: f32) {
        self.cancel(key);
        self.pending.push(Pending {
            key,
            remaining: seconds.max(0.0),
        });
    }

    /// Cancel the timer for `key`. Returns `true` if one was live.
    pub fn cancel(&mut self, key: K) -> bool {
        let before = self.pending.len();
        self.pending.retain(|p| p.key != key);
        before != self.pending.len()
    }

    /// Whether a timer for `key` is still counting down.
    #[must_use]
    pub fn is_active(&self, key: K) -> bool {
        self.pending.iter().any(|p| p.key == key)
    }

    /// Seconds left on the timer for `key`, if live.
    #[must_use]
    pub fn remaining(&self, key: K) -> Option<f32> {
        self.pending.iter().find(|p| p.key == key).map(|p| p.remaining)
    }

    /// Advance every timer by `dt` seconds and return the keys that fired,
    /// in the order they were scheduled.
    pub fn advance(&mut self, dt: f32) -> Vec<K> {
        let dt = dt.max(0.0);
        let mut fired = Vec::new();
        self.pending.retain_mut(|p| {
            p.remaining -= dt;
            if p.remaining <= 0.0 {
                fired.push(p.key);
                false
            } else {
                true
            }
        });
        fired
    }

    /// Drop every pending timer.
    pub fn clear(&mut self) {
        self.pending.clear();
    }

    /// Number of live timers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Whether no timers are live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

impl<K: Copy + Eq> Default for TimerTable<K> {
    fn default() -> Self {
        Self::new()
    }
}
