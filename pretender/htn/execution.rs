use std::{collections::BTreeSet, fmt, path::Path};

use anyhow::Result;
use chrono::{DateTime, Utc};
use pretender_journal::{read_journal, JsonLinesJournal};
use serde::{Deserialize, Serialize};

use crate::{errors::PlanningError, state::Predicate};

/// Result recorded for one task or decomposition attempt.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// Primitive executed and its declared effects hold.
    Ok,
    /// Primitive executed but its actual result diverged from its declared effects.
    EffectMismatch,
    /// No method candidate satisfied the decomposition contract.
    NoDecompositionFound,
    /// The oracle errored, timed out or returned output that failed validation.
    OracleFailure,
    /// The decomposition budget ran out.
    BudgetExhausted,
}

impl Outcome {
    /// Returns label for logging.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::EffectMismatch => "effect_mismatch",
            Self::NoDecompositionFound => "no_decomposition_found",
            Self::OracleFailure => "oracle_failure",
            Self::BudgetExhausted => "budget_exhausted",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One append-only record of a planning run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExecutionLogEntry {
    /// Task the record refers to.
    pub task: String,
    /// What happened.
    pub outcome: Outcome,
    /// Predicates expected but missing (mismatches) or otherwise relevant to the outcome.
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub diff: BTreeSet<Predicate>,
    /// Free-form explanation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    /// When the record was appended.
    pub recorded_at: DateTime<Utc>,
}

impl ExecutionLogEntry {
    /// Creates an entry stamped with the current time.
    #[must_use]
    pub fn new(task: impl Into<String>, outcome: Outcome, diff: BTreeSet<Predicate>) -> Self {
        Self {
            task: task.into(),
            outcome,
            diff,
            detail: None,
            recorded_at: Utc::now(),
        }
    }

    /// Successful primitive execution.
    #[must_use]
    pub fn ok(task: impl Into<String>) -> Self {
        Self::new(task, Outcome::Ok, BTreeSet::new())
    }

    /// Records a decomposition-time failure.
    #[must_use]
    pub fn from_error(task: impl Into<String>, error: &PlanningError) -> Self {
        let outcome = match error {
            PlanningError::BudgetExhausted { .. } => Outcome::BudgetExhausted,
            PlanningError::OracleFailure { .. } | PlanningError::OracleTimeout { .. } => {
                Outcome::OracleFailure
            }
            _ => Outcome::NoDecompositionFound,
        };
        Self::new(task, outcome, BTreeSet::new()).with_detail(error.to_string())
    }

    /// Attaches an explanation.
    #[must_use]
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

/// Ordered record of per-task outcomes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExecutionLog {
    entries: Vec<ExecutionLogEntry>,
}

impl ExecutionLog {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one entry.
    pub fn push(&mut self, entry: ExecutionLogEntry) {
        self.entries.push(entry);
    }

    /// Appends every entry of another log, preserving order.
    pub fn extend(&mut self, other: Self) {
        self.entries.extend(other.entries);
    }

    /// Entries in execution order.
    #[must_use]
    pub fn entries(&self) -> &[ExecutionLogEntry] {
        &self.entries
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of entries with the given outcome.
    #[must_use]
    pub fn count(&self, outcome: Outcome) -> usize {
        self.entries.iter().filter(|e| e.outcome == outcome).count()
    }

    /// True when any primitive diverged from its declared effects.
    #[must_use]
    pub fn has_mismatch(&self) -> bool {
        self.count(Outcome::EffectMismatch) > 0
    }

    /// Names of tasks with the given outcome, in order.
    #[must_use]
    pub fn tasks_with(&self, outcome: Outcome) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|e| e.outcome == outcome)
            .map(|e| e.task.as_str())
            .collect()
    }

    /// Appends the log to a JSON-lines journal.
    pub fn persist(&self, path: impl AsRef<Path>) -> Result<usize> {
        let journal = JsonLinesJournal::open(path)?;
        journal.append_all(&self.entries)
    }

    /// Loads a log previously written with [`ExecutionLog::persist`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self {
            entries: read_journal(path)?,
        })
    }
}

impl IntoIterator for ExecutionLog {
    type Item = ExecutionLogEntry;
    type IntoIter = std::vec::IntoIter<ExecutionLogEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<'a> IntoIterator for &'a ExecutionLog {
    type Item = &'a ExecutionLogEntry;
    type IntoIter = std::slice::Iter<'a, ExecutionLogEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
