//! The creature orchestrator.
//!
//! A [`Creature`] owns one instance of every core model and wires their
//! cross-effects with plain method calls:
//!
//! | Trigger              | Effects                                                        |
//! |----------------------|----------------------------------------------------------------|
//! | need turns critical  | force the matching goal, add an emotion                        |
//! | need satisfied       | happiness                                                      |
//! | hit taken            | fear or anger, memory of the attacker, relationship delta      |
//! | healed               | happiness, memory of the healer                                |
//! | health critical      | speed penalty, fear, call for help, force Escape               |
//! | death                | stop ticking, notify registry, schedule removal                |
//!
//! One frame runs, in order: stats → needs → critical-need damage →
//! emotion decay → memory → health → brain decision → goal execution →
//! contagion roll. Contagion pulses are returned to the world, which
//! delivers them after every creature has run its own frame.

use minipoll_core::brain::{BrainInputs, GoalArbiter, GoalKind, GoalSwitch, MoodSignals};
use minipoll_core::config::MinipollConfig;
use minipoll_core::emotion::mapping::{SocialMood, social_mood_of};
use minipoll_core::emotion::{EmotionKind, EmotionModel, SpreadPulse};
use minipoll_core::error::{MinipollError, Result};
use minipoll_core::health::{DamageType, HealthEvent, HealthModel};
use minipoll_core::memory::{InteractionType, MemoryStore};
use minipoll_core::needs::{ENERGY, HUNGER, HYGIENE, NeedsModel, SOCIAL, THIRST};
use minipoll_core::snapshot::{CreatureSnapshot, HealthSnapshot, NeedValue, SNAPSHOT_VERSION};
use minipoll_core::stats::{Modifier, ModifierId, StatBlock, StatKind};
use minipoll_core::timer::TimerTable;
use minipoll_core::types::{CreatureId, Position};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{debug, info, warn};

use crate::collaborators::{Ambient, Collaborators, MovementIntent};
use crate::events::{CreatureEvent, EventBus, EventKind, SubscriptionId};

const CRITICAL_HEALTH_SOURCE: &str = "critical_health";

/// Which optional models a creature runs. Decided once at construction.
///
/// Stats and health are always present.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(clippy::struct_excessive_bools)]
pub struct Capabilities {
    /// Needs decay and critical-need reactions.
    pub needs: bool,
    /// Emotions, mood and contagion.
    pub emotions: bool,
    /// Interaction memory.
    pub memory: bool,
    /// Goal arbitration and movement intents.
    pub brain: bool,
}

impl Capabilities {
    /// Every model enabled.
    pub const ALL: Self = Self {
        needs: true,
        emotions: true,
        memory: true,
        brain: true,
    };
}

impl Default for Capabilities {
    fn default() -> Self {
        Self::ALL
    }
}

/// What one frame produced that the world cares about.
#[derive(Debug, Clone, Default)]
pub struct CreatureTick {
    /// Emotions leaving this creature, to deliver to neighbours.
    pub pulses: Vec<SpreadPulse>,
    /// Memories dropped this frame.
    pub memories_forgotten: usize,
    /// Active-goal changes this frame.
    pub goal_switches: u32,
    /// Whether the creature died during this frame.
    pub died: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CreatureTimer {
    Removal,
}

/// One autonomous creature.
pub struct Creature {
    id: CreatureId,
    name: String,
    position: Position,
    config: MinipollConfig,
    capabilities: Capabilities,

    stats: StatBlock,
    needs: Option<NeedsModel>,
    emotions: Option<EmotionModel>,
    memory: Option<MemoryStore>,
    health: HealthModel,
    brain: Option<GoalArbiter>,

    collaborators: Collaborators,
    events: EventBus,
    rng: StdRng,
    timers: TimerTable<CreatureTimer>,
    critical_modifier: Option<ModifierId>,
    social_mood: SocialMood,
    active: bool,
    ready_for_removal: bool,
    frame_switches: u32,
    died_this_frame: bool,
    profile: Option<String>,
}

impl std::fmt::Debug for Creature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Creature")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("position", &self.position)
            .field("health", &self.health.current())
            .field("action", &self.current_action())
            .finish_non_exhaustive()
    }
}

impl Creature {
    /// Build a creature with every model enabled.
    ///
    /// # Errors
    /// Returns `MinipollError::Config` if `config` does not validate.
    pub fn new(
        name: impl Into<String>,
        position: Position,
        config: &MinipollConfig,
        seed: u64,
        collaborators: Collaborators,
    ) -> Result<Self> {
        Self::with_capabilities(name, position, config, seed, collaborators, Capabilities::ALL)
    }

    /// Build a creature running only the models in `capabilities`.
    ///
    /// # Errors
    /// Returns `MinipollError::Config` if `config` does not validate.
    pub fn with_capabilities(
        name: impl Into<String>,
        position: Position,
        config: &MinipollConfig,
        seed: u64,
        collaborators: Collaborators,
        capabilities: Capabilities,
    ) -> Result<Self> {
        config.validate()?;
        let stats = StatBlock::new(&config.stats);
        let health = HealthModel::new(&config.health, stats.get_effective(StatKind::HealthCap));
        let mut creature = Self {
            id: CreatureId::new(),
            name: name.into(),
            position,
            config: config.clone(),
            capabilities,
            stats,
            needs: capabilities.needs.then(|| NeedsModel::new(&config.needs)),
            emotions: capabilities.emotions.then(EmotionModel::new),
            memory: capabilities.memory.then(|| MemoryStore::new(&config.memory)),
            health,
            brain: capabilities.brain.then(|| GoalArbiter::new(&config.brain)),
            collaborators,
            events: EventBus::new(),
            rng: StdRng::seed_from_u64(seed),
            timers: TimerTable::new(),
            critical_modifier: None,
            social_mood: SocialMood::Neutral,
            active: true,
            ready_for_removal: false,
            frame_switches: 0,
            died_this_frame: false,
            profile: None,
        };
        creature.stats.drain_changes();
        debug!(creature = %creature.id, name = %creature.name, ?capabilities, "Creature created");
        Ok(creature)
    }

    /// Rebuild a saved creature, keeping its id.
    ///
    /// # Errors
    /// Returns `MinipollError::Config` if `config` does not validate.
    pub fn from_snapshot(
        snapshot: &CreatureSnapshot,
        config: &MinipollConfig,
        seed: u64,
        collaborators: Collaborators,
    ) -> Result<Self> {
        let mut creature = Self::new(snapshot.name.clone(), snapshot.position, config, seed, collaborators)?;
        creature.id = snapshot.id;
        creature.profile.clone_from(&snapshot.profile);
        creature.restore(snapshot);
        Ok(creature)
    }

    // ------------------------------------------------------------------
    // Frame
    // ------------------------------------------------------------------

    /// Run one frame of this creature's own models.
    pub fn tick(&mut self, dt: f32, ambient: Ambient) -> CreatureTick {
        let dt = dt.max(0.0);
        self.frame_switches = 0;
        self.died_this_frame = false;

        if !self.active {
            if self.timers.advance(dt).contains(&CreatureTimer::Removal) {
                debug!(creature = %self.id, "Ready for removal");
                self.ready_for_removal = true;
            }
            return CreatureTick::default();
        }

        self.stats.tick(dt);
        self.sync_stats();

        let mut memories_forgotten = 0;
        if let Some(report) = self.needs.as_mut().map(|n| n.tick(dt, ambient.needs_multiplier)) {
            if report.damage > 0.0 {
                self.health.drain(report.damage, DamageType::Starvation);
            }
            for need in report.newly_critical {
                self.on_need_critical(&need);
            }
        }
        if let Some(emotions) = self.emotions.as_mut() {
            emotions.tick(dt);
        }
        if let Some(memory) = self.memory.as_mut() {
            memories_forgotten = memory.tick(f64::from(dt));
        }
        self.health.tick(dt);
        self.process_health_events();

        if !self.active {
            return self.frame_report(Vec::new(), memories_forgotten);
        }

        self.decide(dt);
        self.execute();
        self.update_social_mood();

        let pulses = match self.emotions.as_ref() {
            Some(emotions) => emotions.roll_spread(dt, self.config.emotion.spread_chance, &mut self.rng),
            None => Vec::new(),
        };
        self.frame_report(pulses, memories_forgotten)
    }

    fn frame_report(&self, pulses: Vec<SpreadPulse>, memories_forgotten: usize) -> CreatureTick {
        CreatureTick {
            pulses,
            memories_forgotten,
            goal_switches: self.frame_switches,
            died: self.died_this_frame,
        }
    }

    fn decide(&mut self, dt: f32) {
        let inputs = self.brain_inputs();
        let switch = self.brain.as_mut().and_then(|b| b.tick(dt, &inputs));
        if let Some(switch) = switch {
            self.publish_switch(switch);
        }
    }

    fn brain_inputs(&self) -> BrainInputs {
        let normalized = |name: &str| self.needs.as_ref().and_then(|n| n.normalized(name));
        let mood = self
            .emotions
            .as_ref()
            .map(MoodSignals::from_emotions)
            .unwrap_or_default();
        let wounded = if self.health.is_critical() {
            1.0 - self.health.fraction()
        } else {
            0.0
        };
        BrainInputs {
            hunger: normalized(HUNGER),
            thirst: normalized(THIRST),
            energy: normalized(ENERGY),
            social: normalized(SOCIAL),
            threat: mood.fear.max(wounded),
            mood,
        }
    }

    fn execute(&mut self) {
        let Some(brain) = self.brain.as_ref() else {
            return;
        };
        match brain.execute() {
            Some(action) => self.collaborators.movement.move_toward(
                self.id,
                MovementIntent {
                    goal: action.goal,
                    target: action.target,
                    target_entity: action.target_entity,
                    speed: self.stats.get_effective(StatKind::Speed),
                },
            ),
            None => self.collaborators.movement.stop(self.id),
        }
    }

    fn update_social_mood(&mut self) {
        let Some(emotions) = self.emotions.as_ref() else {
            return;
        };
        let mood = social_mood_of(emotions.dominant().map(|e| e.kind));
        if mood != self.social_mood {
            self.social_mood = mood;
            self.collaborators.social.mood_changed(self.id, mood);
        }
    }

    // ------------------------------------------------------------------
    // Cross-effects
    // ------------------------------------------------------------------

    fn on_need_critical(&mut self, need: &str) {
        debug!(creature = %self.id, need, "Need critical");
        self.events.publish(&CreatureEvent::NeedCritical {
            creature: self.id,
            need: need.to_string(),
        });
        let (emotion, goal) = match need {
            HUNGER => (Some(EmotionKind::Angry), Some(GoalKind::FindFood)),
            THIRST => (Some(EmotionKind::Afraid), Some(GoalKind::FindWater)),
            ENERGY => (Some(EmotionKind::Sad), Some(GoalKind::Rest)),
            SOCIAL => (Some(EmotionKind::Sad), Some(GoalKind::Socialize)),
            HYGIENE => (Some(EmotionKind::Disgusted), None),
            _ => (None, None),
        };
        if let Some(kind) = emotion {
            self.add_emotion(kind, self.config.reactions.critical_need_intensity, 0.0);
        }
        if let Some(goal) = goal {
            self.force_goal(goal);
        }
    }

    fn on_need_filled(&mut self, need: &str, amount: f32) -> f32 {
        let Some(needs) = self.needs.as_mut() else {
            let error = MinipollError::MissingDependency("needs model".to_string());
            warn!(creature = %self.id, need, %error, "Fill ignored");
            return 0.0;
        };
        if !self.active {
            let error = MinipollError::InvariantViolation("fill on a dead creature".to_string());
            debug!(creature = %self.id, need, %error, "Fill ignored");
            return needs.value(need);
        }
        let Some(fill) = needs.fill(need, amount) else {
            return 0.0;
        };
        if fill.satisfied {
            debug!(creature = %self.id, need, "Need satisfied");
            self.add_emotion(EmotionKind::Happy, self.config.reactions.satisfied_intensity, 0.0);
            self.events.publish(&CreatureEvent::NeedSatisfied {
                creature: self.id,
                need: need.to_string(),
            });
        }
        fill.new
    }

    fn on_health_critical(&mut self) {
        info!(creature = %self.id, health = self.health.current(), "Health critical");
        if self.critical_modifier.is_none() {
            self.critical_modifier = self.stats.add_modifier(
                StatKind::Speed,
                Modifier::percentage(self.config.reactions.critical_speed_penalty, CRITICAL_HEALTH_SOURCE),
            );
        }
        self.add_emotion(
            EmotionKind::Afraid,
            self.config.reactions.critical_health_fear,
            self.config.emotion.fear_spread_radius,
        );
        self.collaborators.social.call_for_help(
            self.id,
            self.position,
            self.config.reactions.call_for_help_radius,
        );
        self.force_goal(GoalKind::Escape);
        self.events.publish(&CreatureEvent::HealthCritical { creature: self.id });
    }

    fn on_left_critical(&mut self) {
        if let Some(id) = self.critical_modifier.take() {
            self.stats.remove_modifier(id);
        }
    }

    fn on_death(&mut self, killer: Option<CreatureId>) {
        info!(creature = %self.id, name = %self.name, ?killer, "Creature died");
        self.active = false;
        self.died_this_frame = true;
        if let Some(switch) = self.brain.as_mut().and_then(GoalArbiter::clear) {
            self.publish_switch(switch);
        }
        self.collaborators.movement.stop(self.id);
        self.collaborators.registry.on_death(self.id, &self.name);
        self.timers
            .schedule(CreatureTimer::Removal, self.config.reactions.removal_delay);
        self.events.publish(&CreatureEvent::Died {
            creature: self.id,
            killer,
        });
    }

    fn on_revived(&mut self) {
        info!(creature = %self.id, "Creature revived");
        self.active = true;
        self.ready_for_removal = false;
        self.timers.cancel(CreatureTimer::Removal);
        self.on_left_critical();
        self.events.publish(&CreatureEvent::Revived { creature: self.id });
    }

    fn process_health_events(&mut self) {
        for event in self.health.drain_events() {
            match event {
                HealthEvent::Changed { old, new } => self.events.publish(&CreatureEvent::HealthChanged {
                    creature: self.id,
                    old,
                    new,
                }),
                HealthEvent::EnteredCritical => self.on_health_critical(),
                HealthEvent::LeftCritical => self.on_left_critical(),
                HealthEvent::Died { source } => self.on_death(source),
                HealthEvent::Revived => self.on_revived(),
                HealthEvent::Damaged { .. } | HealthEvent::Healed { .. } => {}
            }
        }
    }

    fn sync_stats(&mut self) {
        for change in self.stats.drain_changes() {
            if change.kind == StatKind::HealthCap {
                self.health.set_max_health(change.new);
            }
        }
    }

    fn add_emotion(&mut self, kind: EmotionKind, intensity: f32, spread_radius: f32) {
        if let Some(emotions) = self.emotions.as_mut() {
            emotions.add(kind, intensity, self.config.emotion.default_decay_rate, spread_radius);
        }
    }

    fn force_goal(&mut self, goal: GoalKind) {
        if let Some(switch) = self.brain.as_mut().and_then(|b| b.force_goal(goal)) {
            self.publish_switch(switch);
        }
    }

    fn publish_switch(&mut self, switch: GoalSwitch) {
        self.frame_switches += 1;
        self.events.publish(&CreatureEvent::ActionChanged {
            creature: self.id,
            from: switch.from,
            to: switch.to,
        });
    }

    // ------------------------------------------------------------------
    // Public contract: care
    // ------------------------------------------------------------------

    /// Give food. Returns the new hunger value.
    pub fn feed(&mut self, amount: f32) -> f32 {
        self.on_need_filled(HUNGER, amount)
    }

    /// Drink from a water source. Returns the new thirst value.
    pub fn drink(&mut self, amount: f32) -> f32 {
        self.on_need_filled(THIRST, amount)
    }

    /// Water handed over by someone else. Returns the new thirst value.
    pub fn give_water(&mut self, amount: f32) -> f32 {
        self.drink(amount)
    }

    /// Sleep. Returns the new energy value.
    pub fn sleep(&mut self, amount: f32) -> f32 {
        self.on_need_filled(ENERGY, amount)
    }

    /// Rest without sleeping; recovers energy at half the rate of sleep.
    pub fn rest(&mut self, amount: f32) -> f32 {
        self.on_need_filled(ENERGY, amount * 0.5)
    }

    /// Spend time with company. Returns the new social value.
    pub fn socialize(&mut self, amount: f32) -> f32 {
        self.on_need_filled(SOCIAL, amount)
    }

    /// Wash. Returns the new hygiene value.
    pub fn clean(&mut self, amount: f32) -> f32 {
        self.on_need_filled(HYGIENE, amount)
    }

    /// Movement collaborator callback: the target of `goal` was reached.
    pub fn interact(&mut self, goal: GoalKind, amount: f32) {
        match goal {
            GoalKind::FindFood => {
                self.feed(amount);
            }
            GoalKind::FindWater => {
                self.drink(amount);
            }
            GoalKind::Rest => {
                self.sleep(amount);
            }
            GoalKind::Socialize => {
                self.socialize(amount);
            }
            GoalKind::Explore => {
                if self.active {
                    self.add_emotion(EmotionKind::Curious, (amount / 100.0).clamp(0.0, 1.0), 0.0);
                }
            }
            GoalKind::Escape => {}
        }
    }

    // ------------------------------------------------------------------
    // Public contract: health
    // ------------------------------------------------------------------

    /// Physical hit. Returns the damage dealt.
    pub fn take_damage(&mut self, amount: f32, source: Option<CreatureId>) -> f32 {
        self.take_typed_damage(amount, source, DamageType::Physical)
    }

    /// Typed hit, subject to resistance, defense and invulnerability.
    /// Returns the damage dealt.
    pub fn take_typed_damage(&mut self, amount: f32, source: Option<CreatureId>, damage_type: DamageType) -> f32 {
        let defense = self.stats.get_effective(StatKind::Defense);
        let dealt = self.health.take_damage(amount, defense, source, damage_type);
        if dealt <= 0.0 {
            return 0.0;
        }

        let reactions = &self.config.reactions;
        let (kind, radius) = if self.health.fraction() < reactions.fear_health_fraction {
            (EmotionKind::Afraid, self.config.emotion.fear_spread_radius)
        } else {
            (EmotionKind::Angry, 0.0)
        };
        let intensity = reactions.damage_intensity;
        let impact = reactions.attacked_memory_impact;
        self.add_emotion(kind, intensity, radius);

        if let Some(attacker) = source {
            if let Some(memory) = self.memory.as_mut() {
                memory.remember_interaction(attacker, InteractionType::Attacked, -impact);
            }
            if let Some(brain) = self.brain.as_mut() {
                brain.set_target_entity(GoalKind::Escape, Some(attacker));
            }
            self.collaborators.social.relationship_delta(self.id, attacker, -impact);
        }
        self.process_health_events();
        dealt
    }

    /// Restore health. Returns the amount restored.
    pub fn heal(&mut self, amount: f32, source: Option<CreatureId>) -> f32 {
        let healed = self.health.heal(amount, source);
        if healed <= 0.0 {
            return 0.0;
        }
        self.add_emotion(EmotionKind::Happy, self.config.reactions.heal_intensity, 0.0);
        if let Some(healer) = source {
            let impact = self.config.reactions.healed_memory_impact;
            if let Some(memory) = self.memory.as_mut() {
                memory.remember_interaction(healer, InteractionType::Healed, impact);
            }
            self.collaborators.social.relationship_delta(self.id, healer, impact);
        }
        self.process_health_events();
        healed
    }

    /// Force death. Returns `false` if already dead.
    pub fn kill(&mut self, source: Option<CreatureId>) -> bool {
        let killed = self.health.kill(source);
        self.process_health_events();
        killed
    }

    /// Bring back a dead creature with `fraction` of max health.
    /// Returns `false` if the creature is alive.
    pub fn revive(&mut self, fraction: f32) -> bool {
        let revived = self.health.revive(fraction);
        self.process_health_events();
        revived
    }

    // ------------------------------------------------------------------
    // Public contract: emotions, memory, modifiers
    // ------------------------------------------------------------------

    /// Emotion arriving from outside (contagion, world events).
    /// Returns the resulting intensity.
    pub fn receive_emotion(&mut self, kind: EmotionKind, intensity: f32, decay_rate: f32, spread_radius: f32) -> f32 {
        if !self.active {
            return 0.0;
        }
        match self.emotions.as_mut() {
            Some(emotions) => emotions.add(kind, intensity, decay_rate, spread_radius),
            None => 0.0,
        }
    }

    /// Record an interaction with `other`.
    pub fn remember(&mut self, other: CreatureId, interaction: InteractionType, impact: f32) {
        match self.memory.as_mut() {
            Some(memory) => {
                memory.remember_interaction(other, interaction, impact);
            }
            None => {
                let error = MinipollError::MissingDependency("memory model".to_string());
                warn!(creature = %self.id, %error, "Interaction not remembered");
            }
        }
    }

    /// Attach a stat modifier; HealthCap changes resize max health.
    pub fn add_modifier(&mut self, kind: StatKind, modifier: Modifier) -> Option<ModifierId> {
        let id = self.stats.add_modifier(kind, modifier);
        self.sync_stats();
        self.process_health_events();
        id
    }

    /// Remove a stat modifier.
    pub fn remove_modifier(&mut self, id: ModifierId) -> bool {
        let removed = self.stats.remove_modifier(id);
        self.sync_stats();
        self.process_health_events();
        removed
    }

    // ------------------------------------------------------------------
    // Public contract: events
    // ------------------------------------------------------------------

    /// Receive every event from this creature.
    pub fn subscribe(&mut self, handler: impl FnMut(&CreatureEvent) + Send + 'static) -> SubscriptionId {
        self.events.subscribe(handler)
    }

    /// Receive events of one kind.
    pub fn subscribe_to(
        &mut self,
        kind: EventKind,
        handler: impl FnMut(&CreatureEvent) + Send + 'static,
    ) -> SubscriptionId {
        self.events.subscribe_to(kind, handler)
    }

    /// Remove a handler.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.events.unsubscribe(id)
    }

    /// Drop every subscription and tell the registry the creature is gone.
    pub fn teardown(&mut self) {
        self.events.clear();
        self.collaborators.registry.on_removed(self.id);
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Stable id.
    #[must_use]
    pub fn id(&self) -> CreatureId {
        self.id
    }

    /// Display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current position.
    #[must_use]
    pub fn position(&self) -> Position {
        self.position
    }

    /// Move the creature (called by the movement collaborator).
    pub fn set_position(&mut self, position: Position) {
        self.position = position;
    }

    /// Raw value of a need (0 when unknown or needs are disabled).
    #[must_use]
    pub fn need_value(&self, name: &str) -> f32 {
        match self.needs.as_ref() {
            Some(needs) => needs.value(name),
            None => {
                let error = MinipollError::MissingDependency("needs model".to_string());
                warn!(creature = %self.id, need = name, %error, "Need value unavailable");
                0.0
            }
        }
    }

    /// Description of what the creature is doing.
    #[must_use]
    pub fn current_action(&self) -> &'static str {
        if self.health.is_dead() {
            return "dead";
        }
        self.current_goal().map_or("idle", GoalKind::action_name)
    }

    /// Active goal.
    #[must_use]
    pub fn current_goal(&self) -> Option<GoalKind> {
        self.brain.as_ref().and_then(GoalArbiter::current)
    }

    /// Whether the creature is alive.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        !self.health.is_dead()
    }

    /// Current hit points.
    #[must_use]
    pub fn health(&self) -> f32 {
        self.health.current()
    }

    /// Maximum hit points.
    #[must_use]
    pub fn max_health(&self) -> f32 {
        self.health.max()
    }

    /// Whether the removal delay after death has elapsed.
    #[must_use]
    pub fn ready_for_removal(&self) -> bool {
        self.ready_for_removal
    }

    /// Enabled models.
    #[must_use]
    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    /// Stat block.
    #[must_use]
    pub fn stats(&self) -> &StatBlock {
        &self.stats
    }

    /// Needs, if enabled.
    #[must_use]
    pub fn needs(&self) -> Option<&NeedsModel> {
        self.needs.as_ref()
    }

    /// Emotions, if enabled.
    #[must_use]
    pub fn emotions(&self) -> Option<&EmotionModel> {
        self.emotions.as_ref()
    }

    /// Memory, if enabled.
    #[must_use]
    pub fn memory(&self) -> Option<&MemoryStore> {
        self.memory.as_ref()
    }

    /// Health model.
    #[must_use]
    pub fn health_model(&self) -> &HealthModel {
        &self.health
    }

    /// Brain, if enabled.
    #[must_use]
    pub fn brain(&self) -> Option<&GoalArbiter> {
        self.brain.as_ref()
    }

    /// Outward mood last reported to the social system.
    #[must_use]
    pub fn social_mood(&self) -> SocialMood {
        self.social_mood
    }

    /// Preset this creature was built from, carried through snapshots.
    #[must_use]
    pub fn profile(&self) -> Option<&str> {
        self.profile.as_deref()
    }

    /// Record the preset this creature was built from.
    pub fn set_profile(&mut self, profile: impl Into<String>) {
        self.profile = Some(profile.into());
    }

    // ------------------------------------------------------------------
    // Persistence
    // ------------------------------------------------------------------

    /// Flat snapshot of model state.
    #[must_use]
    pub fn snapshot(&self) -> CreatureSnapshot {
        CreatureSnapshot {
            version: SNAPSHOT_VERSION,
            id: self.id,
            name: self.name.clone(),
            position: self.position,
            saved_at: chrono::Utc::now(),
            stats: self.stats.base_values(),
            needs: self
                .needs
                .as_ref()
                .map(|n| {
                    n.needs()
                        .iter()
                        .map(|need| NeedValue {
                            name: need.name.clone(),
                            value: need.value,
                        })
                        .collect()
                })
                .unwrap_or_default(),
            emotions: self
                .emotions
                .as_ref()
                .map(|e| e.instances().to_vec())
                .unwrap_or_default(),
            memories: self
                .memory
                .as_ref()
                .map(|m| m.iter().cloned().collect())
                .unwrap_or_default(),
            memory_clock: self.memory.as_ref().map_or(0.0, MemoryStore::clock),
            health: HealthSnapshot {
                current: self.health.current(),
                max: self.health.max(),
                critical: self.health.is_critical(),
                dead: self.health.is_dead(),
            },
            current_goal: self.current_goal(),
            profile: self.profile.clone(),
        }
    }

    /// Overwrite model state from `snapshot`. Identity is left unchanged.
    pub fn restore(&mut self, snapshot: &CreatureSnapshot) {
        for (kind, base) in &snapshot.stats {
            self.stats.set_base(*kind, *base);
        }
        self.stats.drain_changes();
        if let Some(needs) = self.needs.as_mut() {
            for need in &snapshot.needs {
                needs.set_value(&need.name, need.value);
            }
        }
        if let Some(emotions) = self.emotions.as_mut() {
            emotions.clear();
            for e in &snapshot.emotions {
                emotions.add(e.kind, e.intensity, e.decay_rate, e.spread_radius);
            }
        }
        if let Some(memory) = self.memory.as_mut() {
            memory.restore(snapshot.memories.clone(), snapshot.memory_clock);
        }
        self.position = snapshot.position;
        self.health.restore(snapshot.health.current, snapshot.health.max);
        self.health.drain_events();
        self.on_left_critical();
        if self.health.is_critical() {
            self.critical_modifier = self.stats.add_modifier(
                StatKind::Speed,
                Modifier::percentage(self.config.reactions.critical_speed_penalty, CRITICAL_HEALTH_SOURCE),
            );
            self.stats.drain_changes();
        }
        if let Some(brain) = self.brain.as_mut() {
            brain.clear();
            if let Some(goal) = snapshot.current_goal {
                brain.force_goal(goal);
            }
        }
        self.active = !self.health.is_dead();
        self.ready_for_removal = false;
        self.timers.clear();
        if !self.active {
            self.timers
                .schedule(CreatureTimer::Removal, self.config.reactions.removal_delay);
        }
        debug!(creature = %self.id, "Creature restored");
    }
}
