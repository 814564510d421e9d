//! Conversation stage state machine.
//!
//! Defines the qualification stages a session moves through and the edges
//! between them. The rules deciding *when* to move live in
//! [`StageTransitionEngine`](super::StageTransitionEngine).

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::StateMachine;

/// The qualification stage of a session.
///
/// Sessions move strictly forward:
/// - `Greeting`: No message received yet
/// - `NameCollection`: Waiting for the visitor's name
/// - `EmailCapture`: Waiting for a contact email
/// - `BackgroundResearch`: Research kicked off, next message moves on
/// - `ProblemDiscovery`: Waiting for a concrete pain point
/// - `SolutionPresentation`: Solution pitched, waiting for interest
/// - `CallToAction`: Absorbing, visitor expressed interest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Stage {
    #[default]
    Greeting,
    NameCollection,
    EmailCapture,
    BackgroundResearch,
    ProblemDiscovery,
    SolutionPresentation,
    CallToAction,
}

impl Stage {
    /// All stages in conversation order.
    pub const ALL: [Stage; 7] = [
        Stage::Greeting,
        Stage::NameCollection,
        Stage::EmailCapture,
        Stage::BackgroundResearch,
        Stage::ProblemDiscovery,
        Stage::SolutionPresentation,
        Stage::CallToAction,
    ];

    /// Position of this stage in the conversation (0-based).
    pub fn ordinal(&self) -> usize {
        match self {
            Stage::Greeting => 0,
            Stage::NameCollection => 1,
            Stage::EmailCapture => 2,
            Stage::BackgroundResearch => 3,
            Stage::ProblemDiscovery => 4,
            Stage::SolutionPresentation => 5,
            Stage::CallToAction => 6,
        }
    }

    /// Wire name, identical to the serialized form.
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Greeting => "GREETING",
            Stage::NameCollection => "NAME_COLLECTION",
            Stage::EmailCapture => "EMAIL_CAPTURE",
            Stage::BackgroundResearch => "BACKGROUND_RESEARCH",
            Stage::ProblemDiscovery => "PROBLEM_DISCOVERY",
            Stage::SolutionPresentation => "SOLUTION_PRESENTATION",
            Stage::CallToAction => "CALL_TO_ACTION",
        }
    }

    /// Stages left as soon as a message arrives, whatever it says.
    ///
    /// The message that moves a session out of a pass-through stage is also
    /// evaluated against the rule of the stage it lands in.
    pub fn is_pass_through(&self) -> bool {
        matches!(self, Stage::BackgroundResearch)
    }

    /// Returns true once the visitor's identity (name and email) is known.
    pub fn has_identity(&self) -> bool {
        self.ordinal() >= Stage::BackgroundResearch.ordinal()
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl StateMachine for Stage {
    fn can_transition_to(&self, target: &Self) -> bool {
        use Stage::*;
        matches!(
            (self, target),
            (Greeting, NameCollection)
                | (NameCollection, NameCollection)
                | (NameCollection, EmailCapture)
                | (EmailCapture, EmailCapture)
                | (EmailCapture, BackgroundResearch)
                | (BackgroundResearch, ProblemDiscovery)
                | (ProblemDiscovery, ProblemDiscovery)
                | (ProblemDiscovery, SolutionPresentation)
                | (SolutionPresentation, SolutionPresentation)
                | (SolutionPresentation, CallToAction)
                | (CallToAction, CallToAction)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use Stage::*;
        match self {
            Greeting => vec![NameCollection],
            NameCollection => vec![NameCollection, EmailCapture],
            EmailCapture => vec![EmailCapture, BackgroundResearch],
            BackgroundResearch => vec![ProblemDiscovery],
            ProblemDiscovery => vec![ProblemDiscovery, SolutionPresentation],
            SolutionPresentation => vec![SolutionPresentation, CallToAction],
            CallToAction => vec![CallToAction],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod definition {
        use super::*;

        #[test]
        fn default_stage_is_greeting() {
            assert_eq!(Stage::default(), Stage::Greeting);
        }

        #[test]
        fn serializes_to_screaming_snake_case() {
            let json = serde_json::to_string(&Stage::BackgroundResearch).unwrap();
            assert_eq!(json, "\"BACKGROUND_RESEARCH\"");
        }

        #[test]
        fn as_str_matches_serialized_form() {
            for stage in Stage::ALL {
                let json = serde_json::to_string(&stage).unwrap();
                assert_eq!(json, format!("\"{}\"", stage.as_str()));
            }
        }

        #[test]
        fn ordinals_follow_declaration_order() {
            for (i, stage) in Stage::ALL.iter().enumerate() {
                assert_eq!(stage.ordinal(), i);
            }
        }

        #[test]
        fn only_background_research_is_pass_through() {
            let pass_through: Vec<_> = Stage::ALL.iter().filter(|s| s.is_pass_through()).collect();
            assert_eq!(pass_through, vec![&Stage::BackgroundResearch]);
        }
    }

    mod state_machine_trait {
        use super::*;

        #[test]
        fn call_to_action_is_absorbing() {
            assert!(Stage::CallToAction.is_terminal());
            assert_eq!(Stage::CallToAction.valid_transitions(), vec![Stage::CallToAction]);
        }

        #[test]
        fn greeting_cannot_skip_ahead() {
            assert!(!Stage::Greeting.can_transition_to(&Stage::EmailCapture));
            assert!(Stage::Greeting.transition_to(Stage::CallToAction).is_err());
        }

        #[test]
        fn stages_never_move_backwards() {
            for from in Stage::ALL {
                for to in from.valid_transitions() {
                    assert!(to.ordinal() >= from.ordinal(), "{from} -> {to}");
                }
            }
        }

        #[test]
        fn valid_transitions_matches_can_transition_to() {
            for from in Stage::ALL {
                for to in Stage::ALL {
                    assert_eq!(
                        from.can_transition_to(&to),
                        from.valid_transitions().contains(&to),
                        "{from} -> {to}"
                    );
                }
            }
        }
    }
}
