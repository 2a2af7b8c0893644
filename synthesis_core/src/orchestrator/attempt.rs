//! Lifecycle of a single synthesis attempt.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::SynthesisError;

/// Phase of a synthesis attempt.
///
/// `Received -> Matching -> (Resolved | Delegating) -> (Previewed | Committed) -> Done`,
/// with `Failed` reachable from any phase before `Done`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttemptPhase {
    Received,
    Matching,
    /// A recipe matched.
    Resolved,
    /// The assistant (or the placeholder fallback) produced the output.
    Delegating,
    Previewed,
    Committed,
    Done,
    Failed,
}

impl AttemptPhase {
    pub fn is_terminal(self) -> bool {
        matches!(self, AttemptPhase::Done | AttemptPhase::Failed)
    }

    pub fn can_advance_to(self, next: AttemptPhase) -> bool {
        use AttemptPhase::*;
        match (self, next) {
            (from, Failed) => !from.is_terminal(),
            (Received, Matching) => true,
            (Matching, Resolved | Delegating) => true,
            (Resolved | Delegating, Previewed | Committed) => true,
            (Previewed | Committed, Done) => true,
            _ => false,
        }
    }
}

/// Tracks the phases of one attempt for logging.
#[derive(Debug)]
pub(crate) struct Attempt {
    id: Uuid,
    phase: AttemptPhase,
    trail: Vec<AttemptPhase>,
}

impl Attempt {
    pub(crate) fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            phase: AttemptPhase::Received,
            trail: vec![AttemptPhase::Received],
        }
    }

    pub(crate) fn advance(&mut self, next: AttemptPhase) {
        debug_assert!(
            self.phase.can_advance_to(next),
            "illegal attempt transition {:?} -> {:?}",
            self.phase,
            next
        );
        debug!(
            target: "forge::synthesis",
            attempt = %self.id,
            from = ?self.phase,
            to = ?next,
            "synthesis.attempt.transition"
        );
        self.phase = next;
        self.trail.push(next);
    }

    pub(crate) fn fail(&mut self, err: &SynthesisError) {
        warn!(
            target: "forge::synthesis",
            attempt = %self.id,
            phase = ?self.phase,
            kind = ?err.kind(),
            error = %err,
            "synthesis.attempt.failed"
        );
        self.advance(AttemptPhase::Failed);
    }

    pub(crate) fn into_trail(self) -> Vec<AttemptPhase> {
        self.trail
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use AttemptPhase::*;

    #[test]
    fn test_legal_paths() {
        for path in [
            vec![Received, Matching, Resolved, Committed, Done],
            vec![Received, Matching, Delegating, Previewed, Done],
            vec![Received, Matching, Failed],
        ] {
            for pair in path.windows(2) {
                assert!(pair[0].can_advance_to(pair[1]), "{:?} -> {:?}", pair[0], pair[1]);
            }
        }
    }

    #[test]
    fn test_illegal_transitions() {
        assert!(!Received.can_advance_to(Committed));
        assert!(!Matching.can_advance_to(Done));
        assert!(!Previewed.can_advance_to(Committed));
        assert!(!Done.can_advance_to(Failed));
        assert!(!Failed.can_advance_to(Failed));
    }

    #[test]
    fn test_attempt_trail() {
        let mut attempt = Attempt::new();
        attempt.advance(Matching);
        attempt.fail(&SynthesisError::NoRecipe("人+人".into()));

        assert_eq!(attempt.phase, Failed);
        assert_eq!(attempt.into_trail(), vec![Received, Matching, Failed]);
    }
}
