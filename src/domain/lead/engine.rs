//! Stage transition engine.
//!
//! Decides which stage a session moves to given its current stage and the
//! signals extracted from one inbound message. `transition` is pure: the
//! same stage and signals always yield the same result.

use std::sync::Arc;

use serde::Serialize;

use super::extractor::{ExtractionEngine, KeywordExtractionEngine, PainPoint};
use super::stage::Stage;
use crate::domain::foundation::StateMachine;

/// Signals extracted from a single message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageSignals {
    pub name: Option<String>,
    pub email: Option<String>,
    pub pain_points: Vec<PainPoint>,
    pub interested: bool,
}

impl MessageSignals {
    /// Runs every extractor the stage rules depend on.
    pub fn extract(engine: &dyn ExtractionEngine, message: &str) -> Self {
        Self {
            name: engine.extract_name(message),
            email: engine.extract_email(message),
            pain_points: engine.extract_pain_points(message),
            interested: engine.expresses_interest(message),
        }
    }
}

/// Side effects requested by a transition.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitionTriggers {
    /// Set only on the EMAIL_CAPTURE -> BACKGROUND_RESEARCH edge.
    pub should_trigger_research: bool,
    /// Set only when entering CALL_TO_ACTION from another stage.
    pub should_send_follow_up: bool,
}

/// Result of evaluating one message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageTransition {
    pub previous_stage: Stage,
    pub next_stage: Stage,
    /// Every stage entered by this message, in order. Empty when unchanged.
    pub path: Vec<Stage>,
    pub triggers: TransitionTriggers,
}

impl StageTransition {
    /// Returns true if the message moved the session.
    pub fn changed(&self) -> bool {
        self.previous_stage != self.next_stage
    }
}

/// Applies the stage rules in a fixed order.
#[derive(Clone)]
pub struct StageTransitionEngine {
    extractor: Arc<dyn ExtractionEngine>,
}

impl std::fmt::Debug for StageTransitionEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StageTransitionEngine").finish_non_exhaustive()
    }
}

impl Default for StageTransitionEngine {
    fn default() -> Self {
        Self::new(Arc::new(KeywordExtractionEngine::new()))
    }
}

impl StageTransitionEngine {
    /// Creates an engine that extracts signals with the given extractor.
    pub fn new(extractor: Arc<dyn ExtractionEngine>) -> Self {
        Self { extractor }
    }

    /// The extractor backing [`evaluate`](Self::evaluate).
    pub fn extractor(&self) -> &Arc<dyn ExtractionEngine> {
        &self.extractor
    }

    /// Extracts signals from `message` and applies [`transition`](Self::transition).
    pub fn evaluate(&self, stage: Stage, message: &str) -> (StageTransition, MessageSignals) {
        let signals = MessageSignals::extract(self.extractor.as_ref(), message);
        (Self::transition(stage, &signals), signals)
    }

    /// Computes the next stage for a message with the given signals.
    ///
    /// After leaving a pass-through stage the same signals are applied to the
    /// stage just entered, so one message can cross several edges.
    pub fn transition(stage: Stage, signals: &MessageSignals) -> StageTransition {
        let mut current = stage;
        let mut path = Vec::new();
        let mut triggers = TransitionTriggers::default();

        loop {
            let next = Self::step(current, signals);
            debug_assert!(current.can_transition_to(&next), "{current} -> {next}");

            if next == current {
                break;
            }

            path.push(next);
            if current == Stage::EmailCapture && next == Stage::BackgroundResearch {
                triggers.should_trigger_research = true;
            }
            if next == Stage::CallToAction {
                triggers.should_send_follow_up = true;
            }

            let leaving_pass_through = current.is_pass_through();
            current = next;
            if !leaving_pass_through {
                break;
            }
        }

        StageTransition {
            previous_stage: stage,
            next_stage: current,
            path,
            triggers,
        }
    }

    fn step(stage: Stage, signals: &MessageSignals) -> Stage {
        match stage {
            Stage::Greeting => Stage::NameCollection,
            Stage::NameCollection if signals.name.is_some() => Stage::EmailCapture,
            Stage::EmailCapture if signals.email.is_some() => Stage::BackgroundResearch,
            Stage::BackgroundResearch => Stage::ProblemDiscovery,
            Stage::ProblemDiscovery if !signals.pain_points.is_empty() => {
                Stage::SolutionPresentation
            }
            Stage::SolutionPresentation if signals.interested => Stage::CallToAction,
            other => other,
        }
    }
}
