//! Goal arbitration: the creature's "brain".
//!
//! A fixed catalog of goals is scored on every decision tick:
//!
//! ```text
//! score = (priority / 10 + urgency) × mood_influence
//! ```
//!
//! The highest score wins. The active goal is only replaced by a strictly
//! higher score, so equal scores never make the creature oscillate; with no
//! active goal, the first goal in catalog order wins a tie. Goals whose
//! urgency is below `completion_urgency` are already satisfied and cannot
//! be selected; when none is left the creature idles.
//!
//! Decisions happen every `decision_interval` seconds, or every
//! `decision_interval × urgent_multiplier` while the last decision saw any
//! urgency above `urgent_threshold`. A goal may be forced from outside; it
//! holds until the next natural decision.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::{BrainConfig, GoalSpec};
use crate::emotion::{EmotionKind, EmotionModel};
use crate::error::MinipollError;
use crate::types::{CreatureId, Position, Score};

/// Catalog entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GoalKind {
    /// Satisfy hunger.
    FindFood,
    /// Satisfy thirst.
    FindWater,
    /// Recover energy.
    Rest,
    /// Seek company.
    Socialize,
    /// Wander and look around.
    Explore,
    /// Run from danger.
    Escape,
}

impl GoalKind {
    /// Present-participle description used as the creature's current action.
    #[must_use]
    pub fn action_name(self) -> &'static str {
        match self {
            Self::FindFood => "searching for food",
            Self::FindWater => "searching for water",
            Self::Rest => "resting",
            Self::Socialize => "socializing",
            Self::Explore => "exploring",
            Self::Escape => "fleeing",
        }
    }
}

impl fmt::Display for GoalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Base priority of a goal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum GoalPriority {
    /// 1
    Low,
    /// 2
    Medium,
    /// 3
    High,
    /// 4
    Critical,
}

impl GoalPriority {
    /// Ordinal used in the score formula.
    #[must_use]
    pub fn value(self) -> f32 {
        match self {
            Self::Low => 1.0,
            Self::Medium => 2.0,
            Self::High => 3.0,
            Self::Critical => 4.0,
        }
    }
}

/// A catalog goal and its last computed state.
#[derive(Debug, Clone)]
pub struct Goal {
    /// Which goal.
    pub kind: GoalKind,
    /// Base priority.
    pub priority: GoalPriority,
    /// Urgency from the last decision, in `[0, 1]`.
    pub urgency: f32,
    /// Score from the last decision.
    pub score: f32,
    /// Where to go, if known.
    pub target: Option<Position>,
    /// Whom to approach or avoid, if known.
    pub target_entity: Option<CreatureId>,
}

/// The bound action of the active goal, handed to the movement collaborator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GoalAction {
    /// Goal being pursued.
    pub goal: GoalKind,
    /// Target location, if any.
    pub target: Option<Position>,
    /// Target creature, if any.
    pub target_entity: Option<CreatureId>,
}

/// Emotion levels the brain cares about, each in `[0, 1]`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MoodSignals {
    /// Strongest of Afraid / Scared.
    pub fear: f32,
    /// Strongest of Curious / Excited.
    pub curiosity: f32,
    /// Strongest of Happy / Loving / Trusting.
    pub warmth: f32,
    /// Sad.
    pub sadness: f32,
    /// Angry.
    pub anger: f32,
}

impl MoodSignals {
    /// Read the signals off a creature's emotions.
    #[must_use]
    pub fn from_emotions(emotions: &EmotionModel) -> Self {
        let strongest = |kinds: &[EmotionKind]| {
            kinds
                .iter()
                .map(|k| emotions.level_of(*k))
                .fold(0.0_f32, f32::max)
        };
        Self {
            fear: strongest(&[EmotionKind::Afraid, EmotionKind::Scared]),
            curiosity: strongest(&[EmotionKind::Curious, EmotionKind::Excited]),
            warmth: strongest(&[EmotionKind::Happy, EmotionKind::Loving, EmotionKind::Trusting]),
            sadness: emotions.level_of(EmotionKind::Sad),
            anger: emotions.level_of(EmotionKind::Angry),
        }
    }

    /// Multiplicative influence of the mood on `kind`, in `[0.5, 1.5]`.
    #[must_use]
    pub fn influence(&self, kind: GoalKind) -> f32 {
        let raw = match kind {
            GoalKind::Escape => 1.0 + 0.5 * self.fear,
            GoalKind::Explore => 1.0 + 0.5 * self.curiosity,
            GoalKind::Socialize => 1.0 + 0.5 * self.warmth - 0.5 * self.sadness,
            GoalKind::Rest => 1.0 - 0.5 * self.anger,
            GoalKind::FindFood | GoalKind::FindWater => 1.0,
        };
        raw.clamp(0.5, 1.5)
    }
}

/// Everything a decision needs, gathered by the orchestrator.
///
/// Need values are normalized to `[0, 1]`; `None` means the creature has no
/// such need.
#[derive(Debug, Clone, Copy, Default)]
pub struct BrainInputs {
    /// Normalized hunger.
    pub hunger: Option<f32>,
    /// Normalized thirst.
    pub thirst: Option<f32>,
    /// Normalized energy.
    pub energy: Option<f32>,
    /// Normalized social need.
    pub social: Option<f32>,
    /// Perceived danger in `[0, 1]`.
    pub threat: f32,
    /// Emotional signals.
    pub mood: MoodSignals,
}

/// Active-goal change produced by a decision or a force.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GoalSwitch {
    /// Previously active goal.
    pub from: Option<GoalKind>,
    /// Newly active goal.
    pub to: Option<GoalKind>,
}

/// Scores the goal catalog and tracks the active goal.
#[derive(Debug, Clone)]
pub struct GoalArbiter {
    goals: Vec<Goal>,
    current: Option<GoalKind>,
    forced: bool,
    until_decision: f32,
    any_urgent: bool,
    decision_interval: f32,
    urgent_multiplier: f32,
    urgent_threshold: f32,
    completion_urgency: f32,
    warned_missing: Vec<GoalKind>,
}

impl GoalArbiter {
    /// Build the catalog. The first decision happens on the first tick.
    #[must_use]
    pub fn new(config: &BrainConfig) -> Self {
        let mut goals: Vec<Goal> = Vec::with_capacity(config.goals.len());
        for GoalSpec { kind, priority } in &config.goals {
            if goals.iter().any(|g| g.kind == *kind) {
                warn!(goal = %kind, "Duplicate goal in catalog ignored");
                continue;
            }
            goals.push(Goal {
                kind: *kind,
                priority: *priority,
                urgency: 0.0,
                score: 0.0,
                target: None,
                target_entity: None,
            });
        }
        Self {
            goals,
            current: None,
            forced: false,
            until_decision: 0.0,
            any_urgent: false,
            decision_interval: config.decision_interval.max(f32::EPSILON),
            urgent_multiplier: config.urgent_multiplier.clamp(f32::EPSILON, 1.0),
            urgent_threshold: config.urgent_threshold,
            completion_urgency: config.completion_urgency,
            warned_missing: Vec::new(),
        }
    }

    /// Count down to the next decision and decide when it is due.
    pub fn tick(&mut self, dt: f32, inputs: &BrainInputs) -> Option<GoalSwitch> {
        self.until_decision -= dt.max(0.0);
        if self.until_decision > 0.0 {
            return None;
        }
        let switch = self.decide(inputs);
        self.until_decision = self.current_interval();
        switch
    }

    /// Run a decision now: recompute urgencies and scores, complete the
    /// active goal if it is no longer needed, then pick the best goal among
    /// those still needed.
    pub fn decide(&mut self, inputs: &BrainInputs) -> Option<GoalSwitch> {
        self.forced = false;
        for i in 0..self.goals.len() {
            let kind = self.goals[i].kind;
            let urgency = self.urgency_for(kind, inputs);
            let goal = &mut self.goals[i];
            goal.urgency = urgency;
            goal.score = (goal.priority.value() / 10.0 + urgency) * inputs.mood.influence(kind);
        }
        self.any_urgent = self.goals.iter().any(|g| g.urgency > self.urgent_threshold);

        let previous = self.current;
        if let Some(active) = self.current
            && self.goal(active).is_some_and(|g| g.urgency < self.completion_urgency)
        {
            debug!(goal = %active, "Goal completed");
            self.current = None;
        }

        let mut best: Option<(GoalKind, Score)> = self
            .current
            .and_then(|k| self.goal(k))
            .map(|g| (g.kind, Score::new(g.score)));
        for goal in self.goals.iter().filter(|g| g.urgency >= self.completion_urgency) {
            let score = Score::new(goal.score);
            if best.is_none_or(|(_, s)| score > s) {
                best = Some((goal.kind, score));
            }
        }
        self.current = best.map(|(k, _)| k);

        if self.current == previous {
            return None;
        }
        debug!(from = ?previous, to = ?self.current, "Goal switched");
        Some(GoalSwitch {
            from: previous,
            to: self.current,
        })
    }

    /// Make `kind` active until the next natural decision.
    ///
    /// Returns the switch, or `None` if `kind` is not in the catalog or
    /// already active.
    pub fn force_goal(&mut self, kind: GoalKind) -> Option<GoalSwitch> {
        if self.goal(kind).is_none() {
            warn!(goal = %kind, "Cannot force goal missing from catalog");
            return None;
        }
        self.forced = true;
        if self.current == Some(kind) {
            return None;
        }
        let from = self.current.replace(kind);
        debug!(from = ?from, to = %kind, "Goal forced");
        Some(GoalSwitch { from, to: Some(kind) })
    }

    /// The bound action of the active goal.
    #[must_use]
    pub fn execute(&self) -> Option<GoalAction> {
        let goal = self.goal(self.current?)?;
        Some(GoalAction {
            goal: goal.kind,
            target: goal.target,
            target_entity: goal.target_entity,
        })
    }

    /// Drop the active goal without deciding.
    pub fn clear(&mut self) -> Option<GoalSwitch> {
        self.forced = false;
        let from = self.current.take()?;
        Some(GoalSwitch { from: Some(from), to: None })
    }

    /// Set where `kind` should lead.
    pub fn set_target(&mut self, kind: GoalKind, target: Option<Position>) {
        if let Some(goal) = self.goals.iter_mut().find(|g| g.kind == kind) {
            goal.target = target;
        }
    }

    /// Set whom `kind` concerns.
    pub fn set_target_entity(&mut self, kind: GoalKind, entity: Option<CreatureId>) {
        if let Some(goal) = self.goals.iter_mut().find(|g| g.kind == kind) {
            goal.target_entity = entity;
        }
    }

    /// Active goal.
    #[must_use]
    pub fn current(&self) -> Option<GoalKind> {
        self.current
    }

    /// Whether the active goal was forced.
    #[must_use]
    pub fn is_forced(&self) -> bool {
        self.forced
    }

    /// Catalog with last computed urgencies and scores.
    #[must_use]
    pub fn goals(&self) -> &[Goal] {
        &self.goals
    }

    /// Catalog entry for `kind`.
    #[must_use]
    pub fn goal(&self, kind: GoalKind) -> Option<&Goal> {
        self.goals.iter().find(|g| g.kind == kind)
    }

    /// Seconds until the next decision.
    #[must_use]
    pub fn until_decision(&self) -> f32 {
        self.until_decision
    }

    /// Interval used after the last decision.
    #[must_use]
    pub fn current_interval(&self) -> f32 {
        if self.any_urgent {
            self.decision_interval * self.urgent_multiplier
        } else {
            self.decision_interval
        }
    }

    fn urgency_for(&mut self, kind: GoalKind, inputs: &BrainInputs) -> f32 {
        let need = match kind {
            GoalKind::FindFood => inputs.hunger,
            GoalKind::FindWater => inputs.thirst,
            GoalKind::Rest => inputs.energy,
            GoalKind::Socialize => inputs.social,
            GoalKind::Explore => return (0.2 + 0.5 * inputs.mood.curiosity).clamp(0.0, 1.0),
            GoalKind::Escape => return inputs.threat.clamp(0.0, 1.0),
        };
        match need {
            Some(value) => (1.0 - value).clamp(0.0, 1.0),
            None => {
                if !self.warned_missing.contains(&kind) {
                    let error = MinipollError::MissingDependency(format!("need behind goal {kind}"));
                    warn!(goal = %kind, %error, "Urgency fixed at 0");
                    self.warned_missing.push(kind);
                }
                0.0
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs(hunger: f32, thirst: f32, energy: f32, social: f32) -> BrainInputs {
        BrainInputs {
            hunger: Some(hunger),
            thirst: Some(thirst),
            energy: Some(energy),
            social: Some(social),
            threat: 0.0,
            mood: MoodSignals::default(),
        }
    }

    #[test]
    fn picks_highest_score() {
        let mut brain = GoalArbiter::new(&BrainConfig::default());
        brain.tick(0.0, &inputs(0.9, 0.2, 0.9, 0.9));
        assert_eq!(brain.current(), Some(GoalKind::FindWater));
        let water = brain.goal(GoalKind::FindWater).expect("in catalog");
        assert!((water.score - 1.1).abs() < 1e-5);
    }

    #[test]
    fn ties_keep_the_active_goal() {
        let mut brain = GoalArbiter::new(&BrainConfig::default());
        // FindFood and FindWater tie; first in catalog wins.
        brain.decide(&inputs(0.5, 0.5, 1.0, 1.0));
        assert_eq!(brain.current(), Some(GoalKind::FindFood));

        brain.force_goal(GoalKind::FindWater);
        assert_eq!(brain.decide(&inputs(0.5, 0.5, 1.0, 1.0)), None);
        assert_eq!(brain.current(), Some(GoalKind::FindWater));
    }

    #[test]
    fn forced_goal_holds_until_next_decision() {
        let mut brain = GoalArbiter::new(&BrainConfig::default());
        let calm = inputs(1.0, 1.0, 1.0, 1.0);
        brain.tick(0.0, &calm);
        assert_eq!(brain.current(), Some(GoalKind::Explore));
        let switch = brain.force_goal(GoalKind::Rest).expect("switches");
        assert_eq!(switch.to, Some(GoalKind::Rest));
        assert!(brain.is_forced());

        brain.tick(0.5, &calm);
        assert_eq!(brain.current(), Some(GoalKind::Rest));
        brain.tick(0.5, &calm);
        assert!(!brain.is_forced());
        assert_eq!(brain.current(), Some(GoalKind::Explore));
    }

    #[test]
    fn urgency_shortens_interval() {
        let mut brain = GoalArbiter::new(&BrainConfig::default());
        brain.tick(0.0, &inputs(0.9, 0.9, 0.9, 0.9));
        assert!((brain.until_decision() - 1.0).abs() < 1e-6);
        brain.decide(&inputs(0.05, 0.9, 0.9, 0.9));
        assert!((brain.current_interval() - 0.5).abs() < 1e-6);
    }

    #[test]
    fn satisfied_goal_completes() {
        let mut brain = GoalArbiter::new(&BrainConfig::default());
        brain.decide(&inputs(0.0, 1.0, 1.0, 1.0));
        assert_eq!(brain.current(), Some(GoalKind::FindFood));
        let switch = brain.decide(&inputs(0.95, 1.0, 1.0, 1.0)).expect("completes");
        assert_eq!(switch.from, Some(GoalKind::FindFood));
        assert_eq!(switch.to, Some(GoalKind::Explore));
    }

    #[test]
    fn satisfied_goals_are_not_selected() {
        let mut brain = GoalArbiter::new(&BrainConfig::default());
        brain.decide(&inputs(1.0, 1.0, 1.0, 1.0));
        // Escape has the top priority but no threat behind it.
        assert_eq!(brain.current(), Some(GoalKind::Explore));
        assert!(brain.goal(GoalKind::Escape).expect("in catalog").score > brain.goal(GoalKind::Explore).expect("in catalog").score);

        let config = BrainConfig {
            goals: BrainConfig::default()
                .goals
                .into_iter()
                .filter(|g| g.kind != GoalKind::Explore)
                .collect(),
            ..BrainConfig::default()
        };
        let mut brain = GoalArbiter::new(&config);
        assert_eq!(brain.decide(&inputs(1.0, 1.0, 1.0, 1.0)), None);
        assert_eq!(brain.current(), None);
    }

    #[test]
    fn fear_drives_escape() {
        let mut brain = GoalArbiter::new(&BrainConfig::default());
        let mut scared = inputs(0.3, 0.3, 1.0, 1.0);
        scared.threat = 0.8;
        scared.mood.fear = 1.0;
        brain.decide(&scared);
        assert_eq!(brain.current(), Some(GoalKind::Escape));
        assert_eq!(
            brain.execute().map(|a| a.goal),
            Some(GoalKind::Escape)
        );
    }

    #[test]
    fn influence_is_clamped() {
        let mood = MoodSignals {
            warmth: 1.0,
            sadness: 0.0,
            anger: 1.0,
            ..MoodSignals::default()
        };
        assert!((mood.influence(GoalKind::Socialize) - 1.5).abs() < 1e-6);
        assert!((mood.influence(GoalKind::Rest) - 0.5).abs() < 1e-6);
        assert!((mood.influence(GoalKind::FindFood) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn missing_need_scores_priority_only() {
        let mut brain = GoalArbiter::new(&BrainConfig::default());
        let mut sparse = inputs(0.9, 0.9, 0.9, 0.9);
        sparse.social = None;
        brain.decide(&sparse);
        let social = brain.goal(GoalKind::Socialize).expect("in catalog");
        assert_eq!(social.urgency, 0.0);
        assert!((social.score - 0.2).abs() < 1e-6);
    }
}
