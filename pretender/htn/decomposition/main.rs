//! Decomposition methods, the contract every candidate must meet, and
//! the uniform-cost search that picks the shortest valid candidate.

/// Methods, preconditions and the decomposition contract.
pub mod method;
/// Shortest-first search over method candidates.
pub mod search;

pub use method::{validate_sequence, ContractViolation, DecompositionMethod, Precondition, Projection};
pub use search::{DecompositionSearch, SearchKey, SearchOutcome};

/// Counter bounding decomposition attempts (method openings and oracle
/// consultations) within one planning run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecompositionBudget {
    remaining: usize,
}

impl DecompositionBudget {
    /// Creates a budget with `remaining` attempts.
    #[must_use]
    pub fn new(remaining: usize) -> Self {
        Self { remaining }
    }

    /// Attempts left.
    #[must_use]
    pub fn remaining(self) -> usize {
        self.remaining
    }

    /// True when no attempt is left.
    #[must_use]
    pub fn is_exhausted(self) -> bool {
        self.remaining == 0
    }

    /// Consumes one attempt; false when already exhausted.
    pub fn try_consume(&mut self) -> bool {
        if self.remaining == 0 {
            return false;
        }
        self.remaining -= 1;
        true
    }
}
