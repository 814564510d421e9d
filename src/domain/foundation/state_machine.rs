//! Declared transition graphs for enum states.

use super::ValidationError;

/// An enum whose legal moves are declared up front.
///
/// Implementors list their outgoing edges; the checked move and terminal
/// test are derived from that list.
pub trait StateMachine: Sized + Copy + PartialEq + std::fmt::Debug {
    fn can_transition_to(&self, target: &Self) -> bool;

    /// Targets reachable in one move. A terminal state lists only itself.
    fn valid_transitions(&self) -> Vec<Self>;

    fn transition_to(&self, target: Self) -> Result<Self, ValidationError> {
        if !self.can_transition_to(&target) {
            return Err(ValidationError::invalid_format(
                "stage",
                format!("no edge from {:?} to {:?}", self, target),
            ));
        }
        Ok(target)
    }

    fn is_terminal(&self) -> bool {
        self.valid_transitions().iter().all(|t| t == self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Light {
        Off,
        On,
        Broken,
    }

    impl StateMachine for Light {
        fn can_transition_to(&self, target: &Self) -> bool {
            self.valid_transitions().contains(target)
        }

        fn valid_transitions(&self) -> Vec<Self> {
            match self {
                Light::Off => vec![Light::On],
                Light::On => vec![Light::Off, Light::Broken],
                Light::Broken => vec![Light::Broken],
            }
        }
    }

    #[test]
    fn declared_edge_is_allowed() {
        assert_eq!(Light::Off.transition_to(Light::On), Ok(Light::On));
    }

    #[test]
    fn undeclared_edge_names_both_states() {
        let err = Light::Off.transition_to(Light::Broken).unwrap_err();
        assert!(err.to_string().contains("no edge from Off to Broken"));
    }

    #[test]
    fn self_loop_only_is_terminal() {
        assert!(Light::Broken.is_terminal());
        assert!(!Light::On.is_terminal());
    }
}
