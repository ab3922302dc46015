use std::{
    cmp::{Ordering, Reverse},
    collections::{BinaryHeap, HashSet},
};

use serde::{Deserialize, Serialize};

use crate::{
    errors::PlanningError,
    registry::TaskLookup,
    state::State,
    task::Task,
};

use super::{
    method::{ContractViolation, DecompositionMethod, Projection},
    DecompositionBudget,
};

/// Frontier ordering: fewest subtasks emitted first, then earliest registered
/// method, then earliest declared candidate.
///
/// The derived `Ord` compares fields in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SearchKey {
    /// Subtasks emitted so far by the attempt.
    pub emitted: usize,
    /// Global registration index of the method.
    pub method_index: usize,
    /// Candidate position within the method.
    pub candidate_index: usize,
}

impl SearchKey {
    /// Identity of the candidate, independent of progress.
    #[must_use]
    pub fn candidate(self) -> (usize, usize) {
        (self.method_index, self.candidate_index)
    }
}

/// Accepted decomposition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchOutcome {
    /// Method name, or `oracle` for oracle-sourced decompositions.
    pub method: String,
    /// Candidate key; `None` for oracle output.
    pub key: Option<SearchKey>,
    /// Ordered subtask names to commit.
    pub subtasks: Vec<String>,
}

#[derive(Debug)]
struct Attempt {
    key: SearchKey,
    method_pos: usize,
    projection: Projection,
    complete: bool,
}

impl PartialEq for Attempt {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for Attempt {}

impl PartialOrd for Attempt {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Attempt {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key.cmp(&other.key)
    }
}

/// Uniform-cost search over every candidate of every method registered for a task.
///
/// Each attempt emits one subtask per expansion; the first attempt popped in a
/// complete, contract-satisfying state is the shortest one. Opening an attempt
/// costs one unit of budget.
#[derive(Debug)]
pub struct DecompositionSearch<'a> {
    task: &'a Task,
    methods: &'a [DecompositionMethod],
    excluded: &'a HashSet<(usize, usize)>,
    rejections: Vec<(String, ContractViolation)>,
    opened: usize,
}

impl<'a> DecompositionSearch<'a> {
    /// Prepares a search; `excluded` holds `(method_index, candidate_index)` pairs to skip.
    #[must_use]
    pub fn new(
        task: &'a Task,
        methods: &'a [DecompositionMethod],
        excluded: &'a HashSet<(usize, usize)>,
    ) -> Self {
        Self {
            task,
            methods,
            excluded,
            rejections: Vec::new(),
            opened: 0,
        }
    }

    /// Runs the search from `state`.
    ///
    /// Returns `BudgetExhausted` as soon as an attempt must be opened with no budget
    /// left, and `NoDecompositionFound` once the frontier empties.
    pub fn run(
        &mut self,
        state: &State,
        lookup: &dyn TaskLookup,
        budget: &mut DecompositionBudget,
    ) -> Result<SearchOutcome, PlanningError> {
        let mut frontier = BinaryHeap::new();
        for (method_pos, method) in self.methods.iter().enumerate() {
            for (candidate_index, candidate) in method.candidates().iter().enumerate() {
                let key = SearchKey {
                    emitted: 0,
                    method_index: method.registration_index(),
                    candidate_index,
                };
                if candidate.is_empty() || self.excluded.contains(&key.candidate()) {
                    continue;
                }
                frontier.push(Reverse(Attempt {
                    key,
                    method_pos,
                    projection: Projection::start(state),
                    complete: false,
                }));
            }
        }

        while let Some(Reverse(mut attempt)) = frontier.pop() {
            let method = &self.methods[attempt.method_pos];
            let candidate = &method.candidates()[attempt.key.candidate_index];
            if attempt.complete {
                return Ok(SearchOutcome {
                    method: method.name().to_string(),
                    key: Some(attempt.key),
                    subtasks: candidate.clone(),
                });
            }
            if attempt.key.emitted == 0 {
                if !budget.try_consume() {
                    return Err(PlanningError::BudgetExhausted {
                        task: self.task.name().to_string(),
                    });
                }
                self.opened += 1;
                if !method.applicable(state) {
                    self.reject(
                        method,
                        ContractViolation::PreconditionFailed {
                            method: method.name().to_string(),
                        },
                    );
                    continue;
                }
            }
            let next = &candidate[attempt.key.emitted];
            if let Err(violation) = attempt.projection.advance(self.task, next, lookup) {
                self.reject(method, violation);
                continue;
            }
            attempt.key.emitted += 1;
            if attempt.key.emitted == candidate.len() {
                if let Err(violation) = attempt.projection.finish(self.task) {
                    self.reject(method, violation);
                    continue;
                }
                attempt.complete = true;
            }
            frontier.push(Reverse(attempt));
        }

        Err(PlanningError::NoDecompositionFound {
            task: self.task.name().to_string(),
        })
    }

    fn reject(&mut self, method: &DecompositionMethod, violation: ContractViolation) {
        self.rejections.push((method.name().to_string(), violation));
    }

    /// Rejected candidates as `(method, reason)`, in the order they were dropped.
    #[must_use]
    pub fn rejections(&self) -> &[(String, ContractViolation)] {
        &self.rejections
    }

    /// Attempts opened (budget units charged) so far.
    #[must_use]
    pub fn opened(&self) -> usize {
        self.opened
    }
}
