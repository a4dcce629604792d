//! Typed publish/subscribe for creature events.
//!
//! Each creature owns an [`EventBus`]. Handlers are boxed closures keyed by a
//! [`SubscriptionId`]; unsubscribing removes the handler immediately and
//! tearing the creature down clears every handler.

use minipoll_core::brain::GoalKind;
use minipoll_core::types::CreatureId;

/// Something observable that happened to a creature.
#[derive(Debug, Clone, PartialEq)]
pub enum CreatureEvent {
    /// Current health moved.
    HealthChanged {
        /// Creature.
        creature: CreatureId,
        /// Previous value.
        old: f32,
        /// New value.
        new: f32,
    },
    /// The active goal (and so the current action) changed.
    ActionChanged {
        /// Creature.
        creature: CreatureId,
        /// Previous goal.
        from: Option<GoalKind>,
        /// New goal.
        to: Option<GoalKind>,
    },
    /// A need entered its critical band.
    NeedCritical {
        /// Creature.
        creature: CreatureId,
        /// Need name.
        need: String,
    },
    /// A need was filled up through the satisfied threshold.
    NeedSatisfied {
        /// Creature.
        creature: CreatureId,
        /// Need name.
        need: String,
    },
    /// Health entered the critical band.
    HealthCritical {
        /// Creature.
        creature: CreatureId,
    },
    /// The creature died.
    Died {
        /// Creature.
        creature: CreatureId,
        /// Killer, if any.
        killer: Option<CreatureId>,
    },
    /// The creature was revived.
    Revived {
        /// Creature.
        creature: CreatureId,
    },
}

/// Discriminant of [`CreatureEvent`], used to filter subscriptions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// [`CreatureEvent::HealthChanged`].
    HealthChanged,
    /// [`CreatureEvent::ActionChanged`].
    ActionChanged,
    /// [`CreatureEvent::NeedCritical`].
    NeedCritical,
    /// [`CreatureEvent::NeedSatisfied`].
    NeedSatisfied,
    /// [`CreatureEvent::HealthCritical`].
    HealthCritical,
    /// [`CreatureEvent::Died`].
    Died,
    /// [`CreatureEvent::Revived`].
    Revived,
}

impl CreatureEvent {
    /// The event's kind.
    #[must_use]
    pub fn kind(&self) -> EventKind {
        match self {
            Self::HealthChanged { .. } => EventKind::HealthChanged,
            Self::ActionChanged { .. } => EventKind::ActionChanged,
            Self::NeedCritical { .. } => EventKind::NeedCritical,
            Self::NeedSatisfied { .. } => EventKind::NeedSatisfied,
            Self::HealthCritical { .. } => EventKind::HealthCritical,
            Self::Died { .. } => EventKind::Died,
            Self::Revived { .. } => EventKind::Revived,
        }
    }
}

/// Handle returned by [`EventBus::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Handler = Box<dyn FnMut(&CreatureEvent) + Send>;

struct Subscription {
    id: SubscriptionId,
    filter: Option<EventKind>,
    handler: Handler,
}

/// Per-creature event dispatcher.
#[derive(Default)]
pub struct EventBus {
    subscriptions: Vec<Subscription>,
    next_id: u64,
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriptions", &self.subscriptions.len())
            .finish()
    }
}

impl EventBus {
    /// Empty bus.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Receive every event.
    pub fn subscribe(&mut self, handler: impl FnMut(&CreatureEvent) + Send + 'static) -> SubscriptionId {
        self.add(None, Box::new(handler))
    }

    /// Receive only events of `kind`.
    pub fn subscribe_to(
        &mut self,
        kind: EventKind,
        handler: impl FnMut(&CreatureEvent) + Send + 'static,
    ) -> SubscriptionId {
        self.add(Some(kind), Box::new(handler))
    }

    /// Remove a handler. Returns `true` if it was registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscriptions.len();
        self.subscriptions.retain(|s| s.id != id);
        before != self.subscriptions.len()
    }

    /// Deliver `event` to every matching handler, in subscription order.
    pub fn publish(&mut self, event: &CreatureEvent) {
        let kind = event.kind();
        for sub in &mut self.subscriptions {
            if sub.filter.is_none_or(|f| f == kind) {
                (sub.handler)(event);
            }
        }
    }

    /// Drop every handler.
    pub fn clear(&mut self) {
        self.subscriptions.clear();
    }

    /// Number of live handlers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.subscriptions.len()
    }

    /// Whether no handler is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }

    fn add(&mut self, filter: Option<EventKind>, handler: Handler) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.subscriptions.push(Subscription { id, filter, handler });
        id
    }
}
