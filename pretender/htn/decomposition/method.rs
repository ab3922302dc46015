use std::{fmt, sync::Arc};

use indexmap::IndexMap;
use thiserror::Error;

use crate::{
    registry::TaskLookup,
    state::{apply_validated, Predicate, State, Term},
    task::Task,
};

/// Why a candidate sequence failed the decomposition contract.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ContractViolation {
    /// The candidate names no subtasks.
    #[error("empty subtask sequence")]
    EmptySequence,
    /// The method's preconditions are false in the current state.
    #[error("preconditions of `{method}` do not hold")]
    PreconditionFailed {
        /// Method whose guard failed.
        method: String,
    },
    /// A subtask name resolves to no registered task.
    #[error("unknown subtask `{0}`")]
    UnknownSubtask(String),
    /// A subtask's term is not satisfiable at its position in the sequence.
    #[error("`{subtask}` requires `{term}`")]
    UnsatisfiedTerm {
        /// Subtask that cannot apply.
        subtask: String,
        /// Rendered term.
        term: String,
    },
    /// A subtask's declared effects assert and retract the same predicate.
    #[error("`{subtask}` asserts and retracts {predicate}")]
    EffectConflict {
        /// Offending subtask.
        subtask: String,
        /// Predicate on both sides.
        predicate: Predicate,
    },
    /// The sequence never establishes a declared effect of the parent.
    #[error("declared effect {0} is never established")]
    MissingEffect(Predicate),
    /// The sequence leaves a predicate the parent declares retracted.
    #[error("declared retraction {0} still holds")]
    LingeringEffect(Predicate),
}

type PreconditionFn = dyn Fn(&State) -> bool + Send + Sync;

/// Boolean guard over a state.
#[derive(Clone)]
pub struct Precondition {
    label: String,
    check: Arc<PreconditionFn>,
}

impl Precondition {
    /// Requires a term to be satisfied by the state.
    #[must_use]
    pub fn holds(term: Term) -> Self {
        let label = format!("holds {term}");
        Self {
            label,
            check: Arc::new(move |state: &State| term.satisfied_by(state, &[])),
        }
    }

    /// Requires a predicate to be absent.
    #[must_use]
    pub fn absent(predicate: Predicate) -> Self {
        let label = format!("absent {predicate}");
        Self {
            label,
            check: Arc::new(move |state: &State| !state.holds(&predicate)),
        }
    }

    /// Arbitrary guard.
    pub fn custom<F>(label: impl Into<String>, check: F) -> Self
    where
        F: Fn(&State) -> bool + Send + Sync + 'static,
    {
        Self {
            label: label.into(),
            check: Arc::new(check),
        }
    }

    /// Evaluates the guard.
    #[must_use]
    pub fn evaluate(&self, state: &State) -> bool {
        (self.check)(state)
    }

    /// Human readable description.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }
}

impl fmt::Debug for Precondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Precondition").field(&self.label).finish()
    }
}

/// Named rule offering candidate subtask sequences for one compound task.
#[derive(Debug, Clone)]
pub struct DecompositionMethod {
    name: String,
    task: String,
    registration_index: usize,
    preconditions: Vec<Precondition>,
    candidates: Vec<Vec<String>>,
}

impl DecompositionMethod {
    /// Creates an unbound method; the planner binds it at registration.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            task: String::new(),
            registration_index: 0,
            preconditions: Vec::new(),
            candidates: Vec::new(),
        }
    }

    /// Adds a guard; all guards must hold.
    #[must_use]
    pub fn precondition(mut self, precondition: Precondition) -> Self {
        self.preconditions.push(precondition);
        self
    }

    /// Adds a candidate subtask sequence.
    #[must_use]
    pub fn candidate<I, S>(mut self, subtasks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.candidates
            .push(subtasks.into_iter().map(Into::into).collect());
        self
    }

    pub(crate) fn bind_to(mut self, task: impl Into<String>, registration_index: usize) -> Self {
        self.task = task.into();
        self.registration_index = registration_index;
        self
    }

    /// Copy whose candidates have `?param` words replaced by bound arguments.
    #[must_use]
    pub fn instantiate(&self, bindings: &IndexMap<String, String>) -> Self {
        if bindings.is_empty() {
            return self.clone();
        }
        let candidates = self
            .candidates
            .iter()
            .map(|candidate| {
                candidate
                    .iter()
                    .map(|descriptor| {
                        descriptor
                            .split_whitespace()
                            .map(|word| bindings.get(word).map_or(word, String::as_str))
                            .collect::<Vec<_>>()
                            .join(" ")
                    })
                    .collect()
            })
            .collect();
        Self {
            candidates,
            ..self.clone()
        }
    }

    /// Method name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Compound task the method decomposes.
    #[must_use]
    pub fn task(&self) -> &str {
        &self.task
    }

    /// Global registration order, used to break ties.
    #[must_use]
    pub fn registration_index(&self) -> usize {
        self.registration_index
    }

    /// Candidate sequences in declaration order.
    #[must_use]
    pub fn candidates(&self) -> &[Vec<String>] {
        &self.candidates
    }

    /// True when every precondition holds.
    #[must_use]
    pub fn applicable(&self, state: &State) -> bool {
        self.preconditions.iter().all(|p| p.evaluate(state))
    }

    /// First failing guard, if any.
    #[must_use]
    pub fn failing_precondition(&self, state: &State) -> Option<&Precondition> {
        self.preconditions.iter().find(|p| !p.evaluate(state))
    }

    /// Shortest candidate (declaration order on ties) meeting the contract.
    ///
    /// Unbudgeted form of one method's share of [`DecompositionSearch`]; both
    /// pick the same candidate.
    ///
    /// [`DecompositionSearch`]: super::DecompositionSearch
    #[must_use]
    pub fn try_apply(
        &self,
        task: &Task,
        state: &State,
        lookup: &dyn TaskLookup,
    ) -> Option<Vec<String>> {
        if !self.applicable(state) {
            return None;
        }
        let mut ordered: Vec<&Vec<String>> = self.candidates.iter().collect();
        ordered.sort_by_key(|candidate| candidate.len());
        ordered
            .into_iter()
            .find(|candidate| validate_sequence(task, candidate, state, lookup).is_ok())
            .cloned()
    }
}

/// Simulated walk through a candidate sequence using declared effects.
#[derive(Debug, Clone)]
pub struct Projection {
    state: State,
    resolved: Vec<Arc<Task>>,
}

impl Projection {
    /// Starts from the state the parent is decomposed in.
    #[must_use]
    pub fn start(state: &State) -> Self {
        Self {
            state: state.clone(),
            resolved: Vec::new(),
        }
    }

    /// Resolves the next subtask, checks its terms, and applies its declared effects.
    pub fn advance(
        &mut self,
        parent: &Task,
        subtask: &str,
        lookup: &dyn TaskLookup,
    ) -> Result<(), ContractViolation> {
        let task = lookup
            .lookup(subtask)
            .ok_or_else(|| ContractViolation::UnknownSubtask(subtask.to_string()))?;
        if let Some(term) = task
            .terms()
            .iter()
            .find(|term| !term.satisfied_by(&self.state, parent.terms()))
        {
            return Err(ContractViolation::UnsatisfiedTerm {
                subtask: subtask.to_string(),
                term: term.to_string(),
            });
        }
        let effects = task.declared_effects();
        if let Some(predicate) = effects.conflict() {
            return Err(ContractViolation::EffectConflict {
                subtask: subtask.to_string(),
                predicate: predicate.clone(),
            });
        }
        self.state = apply_validated(&self.state, effects);
        self.resolved.push(task);
        Ok(())
    }

    /// Checks that the projected state establishes the parent's declared effects.
    pub fn finish(&self, parent: &Task) -> Result<(), ContractViolation> {
        if self.resolved.is_empty() {
            return Err(ContractViolation::EmptySequence);
        }
        let declared = parent.declared_effects();
        if let Some(missing) = declared.additions.iter().find(|p| !self.state.holds(p)) {
            return Err(ContractViolation::MissingEffect(missing.clone()));
        }
        if let Some(lingering) = declared.retractions.iter().find(|p| self.state.holds(p)) {
            return Err(ContractViolation::LingeringEffect(lingering.clone()));
        }
        Ok(())
    }

    /// Projected state so far.
    #[must_use]
    pub fn state(&self) -> &State {
        &self.state
    }

    /// Subtasks resolved so far.
    #[must_use]
    pub fn resolved(&self) -> &[Arc<Task>] {
        &self.resolved
    }
}

/// Checks a whole sequence against the decomposition contract.
///
/// Shared by registered methods and oracle output; returns the resolved subtasks.
pub fn validate_sequence(
    parent: &Task,
    sequence: &[String],
    state: &State,
    lookup: &dyn TaskLookup,
) -> Result<Vec<Arc<Task>>, ContractViolation> {
    if sequence.is_empty() {
        return Err(ContractViolation::EmptySequence);
    }
    let mut projection = Projection::start(state);
    for subtask in sequence {
        projection.advance(parent, subtask, lookup)?;
    }
    projection.finish(parent)?;
    Ok(projection.resolved)
}
