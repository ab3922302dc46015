use serde::{Deserialize, Serialize};

use crate::{decomposition::SearchOutcome, errors::PlanningError};

/// One or more task names planned in sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Goal {
    /// A single task.
    Single(String),
    /// Tasks planned in order; each result state feeds the next goal.
    Sequence(Vec<String>),
}

impl Goal {
    /// Task names in planning order.
    #[must_use]
    pub fn tasks(&self) -> Vec<&str> {
        match self {
            Self::Single(name) => vec![name.as_str()],
            Self::Sequence(names) => names.iter().map(String::as_str).collect(),
        }
    }
}

impl From<&str> for Goal {
    fn from(value: &str) -> Self {
        Self::Single(value.to_string())
    }
}

impl From<String> for Goal {
    fn from(value: String) -> Self {
        Self::Single(value)
    }
}

impl From<Vec<String>> for Goal {
    fn from(value: Vec<String>) -> Self {
        Self::Sequence(value)
    }
}

impl From<Vec<&str>> for Goal {
    fn from(value: Vec<&str>) -> Self {
        Self::Sequence(value.into_iter().map(str::to_string).collect())
    }
}

impl<const N: usize> From<[&str; N]> for Goal {
    fn from(value: [&str; N]) -> Self {
        Self::Sequence(value.into_iter().map(str::to_string).collect())
    }
}

/// Planner-level policy applied while executing compound tasks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionPolicy {
    /// Stop executing remaining siblings after an effect mismatch.
    pub halt_on_mismatch: bool,
}

impl ExecutionPolicy {
    /// Keeps executing siblings after a mismatch.
    #[must_use]
    pub fn lenient() -> Self {
        Self {
            halt_on_mismatch: false,
        }
    }

    /// Halts the enclosing compound at the first mismatch.
    #[must_use]
    pub fn strict() -> Self {
        Self {
            halt_on_mismatch: true,
        }
    }
}

/// Where a compound task is in its decomposition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecompositionPhase {
    /// Running the search over registered methods.
    Searching,
    /// Consulting the oracle; `attempt` counts prior consultations for the task.
    AwaitingOracle {
        /// Consultations already made for this task in the run.
        attempt: usize,
    },
    /// A candidate sequence was accepted.
    Decomposed(SearchOutcome),
    /// Decomposition failed for this branch.
    Failed(PlanningError),
}

impl DecompositionPhase {
    /// Returns label for logging.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Searching => "searching",
            Self::AwaitingOracle { .. } => "awaiting_oracle",
            Self::Decomposed(_) => "decomposed",
            Self::Failed(_) => "failed",
        }
    }

    /// True for `Decomposed` and `Failed`.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Decomposed(_) | Self::Failed(_))
    }
}
