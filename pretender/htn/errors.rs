use thiserror::Error;

use crate::state::Predicate;

/// Errors surfaced by registration, decomposition and execution.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PlanningError {
    /// Predicate text could not be parsed.
    #[error("invalid predicate `{0}`")]
    InvalidPredicate(String),
    /// An effect set both asserts and retracts the same predicate.
    #[error("effect set asserts and retracts {predicate}")]
    EffectConflict {
        /// Predicate appearing on both sides.
        predicate: Predicate,
    },
    /// No method candidate satisfies the decomposition contract.
    #[error("no decomposition found for `{task}`")]
    NoDecompositionFound {
        /// Compound task being decomposed.
        task: String,
    },
    /// The task oracle errored or returned unusable output.
    #[error("oracle failed for `{task}`: {reason}")]
    OracleFailure {
        /// Compound task being decomposed.
        task: String,
        /// Human readable detail.
        reason: String,
    },
    /// The task oracle did not answer in time.
    #[error("oracle timed out for `{task}` after {timeout_ms}ms")]
    OracleTimeout {
        /// Compound task being decomposed.
        task: String,
        /// Configured deadline.
        timeout_ms: u64,
    },
    /// The decomposition budget reached zero.
    #[error("decomposition budget exhausted while resolving `{task}`")]
    BudgetExhausted {
        /// Task being resolved when the budget ran out.
        task: String,
    },
    /// A task or method name is already registered.
    #[error("duplicate name `{0}`")]
    DuplicateName(String),
    /// A name does not resolve to a registered task.
    #[error("unknown task `{0}`")]
    UnknownTask(String),
    /// A method cannot be registered as given.
    #[error("invalid method `{method}`: {reason}")]
    InvalidMethod {
        /// Method name.
        method: String,
        /// Why the method was rejected.
        reason: String,
    },
    /// A compound task was executed before it was decomposed.
    #[error("compound task `{0}` has no committed subtasks")]
    NotDecomposed(String),
    /// Expansion nested deeper than the configured limit.
    #[error("expansion of `{task}` exceeded depth {depth}")]
    DepthExceeded {
        /// Task whose expansion hit the limit.
        task: String,
        /// Configured limit.
        depth: usize,
    },
    /// A parameterised task was bound with the wrong number of arguments.
    #[error("task `{task}` expects {expected} argument(s), got {found}")]
    ArityMismatch {
        /// Task template.
        task: String,
        /// Declared parameter count.
        expected: usize,
        /// Supplied argument count.
        found: usize,
    },
}

impl PlanningError {
    /// Decomposition-time failures the planner recovers from by backtracking.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::NoDecompositionFound { .. }
                | Self::OracleFailure { .. }
                | Self::OracleTimeout { .. }
                | Self::DepthExceeded { .. }
                | Self::EffectConflict { .. }
        )
    }
}
