use std::{
    collections::{BTreeSet, HashSet},
    sync::Arc,
};

use indexmap::IndexMap;
use pretender_journal::LogLevel;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::{
    config::PlannerConfig,
    decomposition::{validate_sequence, DecompositionBudget, DecompositionSearch, SearchOutcome},
    errors::PlanningError,
    execution::{ExecutionLog, ExecutionLogEntry, Outcome},
    module::DecompositionPhase,
    oracle::{parse_suggestions, OracleBridge, OracleRequest},
    planner::{PlanFailure, PlanReport},
    registry::Catalog,
    state::{apply_validated, State},
    task::Task,
    telemetry::PlanningTelemetry,
};

/// Retry bookkeeping for one compound task while its parent backtracks.
#[derive(Debug, Default)]
struct Retry {
    excluded: HashSet<(usize, usize)>,
    search_exhausted: bool,
    oracle_attempts: usize,
}

/// State of a single `plan()` call.
///
/// Holds the only mutable values of planning: the budget, the committed
/// decompositions (name to subtask names, in commit order) and the log.
pub struct PlanRun<'a> {
    catalog: &'a Catalog,
    config: &'a PlannerConfig,
    oracle: Option<&'a OracleBridge>,
    telemetry: Option<&'a PlanningTelemetry>,
    run_id: String,
    budget: DecompositionBudget,
    committed: IndexMap<String, Vec<String>>,
    in_progress: Vec<String>,
    log: ExecutionLog,
}

impl<'a> PlanRun<'a> {
    pub fn new(
        catalog: &'a Catalog,
        config: &'a PlannerConfig,
        oracle: Option<&'a OracleBridge>,
        telemetry: Option<&'a PlanningTelemetry>,
        budget: usize,
    ) -> Self {
        Self {
            catalog,
            config,
            oracle,
            telemetry,
            run_id: format!("plan-{}", Uuid::new_v4()),
            budget: DecompositionBudget::new(budget),
            committed: IndexMap::new(),
            in_progress: Vec::new(),
            log: ExecutionLog::new(),
        }
    }

    /// Expands then executes one goal from `state`.
    ///
    /// Returns the actual resulting state and whether any primitive mismatched.
    pub fn pursue(&mut self, goal: &str, state: &State) -> Result<(State, bool), PlanningError> {
        let task = self.catalog.resolve(goal)?;
        self.emit(
            LogLevel::Info,
            "planning.goal.begin",
            json!({ "goal": task.name(), "budget": self.budget.remaining() }),
        );
        self.expand(&task, state, 0)?;
        let tree = self.assemble(&task)?;
        let (next, log) = tree.execute(state, &self.config.execution_policy())?;
        let mismatches = log.count(Outcome::EffectMismatch);
        self.emit(
            if mismatches == 0 {
                LogLevel::Info
            } else {
                LogLevel::Warn
            },
            "planning.goal.completed",
            json!({
                "goal": task.name(),
                "entries": log.len(),
                "mismatches": mismatches,
                "budget": self.budget.remaining(),
            }),
        );
        self.log.extend(log);
        Ok((next, mismatches > 0))
    }

    fn expand(&mut self, task: &Arc<Task>, state: &State, depth: usize) -> Result<(), PlanningError> {
        if task.is_primitive() || self.committed.contains_key(task.name()) {
            return Ok(());
        }
        if self.in_progress.iter().any(|name| name == task.name()) {
            self.log.push(
                ExecutionLogEntry::new(task.name(), Outcome::NoDecompositionFound, BTreeSet::new())
                    .with_detail("task appears in its own expansion"),
            );
            return Err(PlanningError::NoDecompositionFound {
                task: task.name().to_string(),
            });
        }
        if depth >= self.config.max_depth {
            return Err(PlanningError::DepthExceeded {
                task: task.name().to_string(),
                depth: self.config.max_depth,
            });
        }
        self.in_progress.push(task.name().to_string());
        let result = self.expand_compound(task, state, depth);
        self.in_progress.pop();
        result
    }

    fn expand_compound(
        &mut self,
        task: &Task,
        state: &State,
        depth: usize,
    ) -> Result<(), PlanningError> {
        let mark = self.committed.len();
        let mut retry = Retry::default();
        loop {
            let outcome = self.decompose(task, state, &mut retry)?;
            match self.expand_sequence(&outcome.subtasks, state, depth + 1) {
                Ok(()) => {
                    self.emit(
                        LogLevel::Info,
                        "planning.search.committed",
                        json!({
                            "task": task.name(),
                            "method": outcome.method,
                            "subtasks": outcome.subtasks,
                        }),
                    );
                    self.committed
                        .insert(task.name().to_string(), outcome.subtasks);
                    return Ok(());
                }
                Err(err) if err.is_recoverable() => {
                    self.committed.truncate(mark);
                    self.log.push(
                        ExecutionLogEntry::from_error(task.name(), &err)
                            .with_detail(format!("backtracking from `{}`: {err}", outcome.method)),
                    );
                    self.emit(
                        LogLevel::Warn,
                        "planning.search.backtrack",
                        json!({
                            "task": task.name(),
                            "method": outcome.method,
                            "reason": err.to_string(),
                        }),
                    );
                    // Oracle answers carry no key; the next pass consults again.
                    if let Some(key) = outcome.key {
                        retry.excluded.insert(key.candidate());
                    }
                }
                Err(err) => return Err(err),
            }
        }
    }

    fn expand_sequence(
        &mut self,
        subtasks: &[String],
        state: &State,
        depth: usize,
    ) -> Result<(), PlanningError> {
        let mut projected = state.clone();
        for name in subtasks {
            let subtask = self.catalog.resolve(name)?;
            self.expand(&subtask, &projected, depth)?;
            projected = apply_validated(&projected, subtask.declared_effects());
        }
        Ok(())
    }

    fn decompose(
        &mut self,
        task: &Task,
        state: &State,
        retry: &mut Retry,
    ) -> Result<SearchOutcome, PlanningError> {
        let mut phase = if retry.search_exhausted {
            DecompositionPhase::AwaitingOracle {
                attempt: retry.oracle_attempts,
            }
        } else {
            DecompositionPhase::Searching
        };
        let mut stage = phase.label();
        loop {
            if !phase.is_terminal() {
                stage = phase.label();
            }
            phase = match phase {
                DecompositionPhase::Searching => self.search(task, state, retry),
                DecompositionPhase::AwaitingOracle { attempt } => {
                    self.consult(task, state, attempt, retry)
                }
                DecompositionPhase::Decomposed(outcome) => return Ok(outcome),
                DecompositionPhase::Failed(err) => {
                    self.log.push(ExecutionLogEntry::from_error(task.name(), &err));
                    self.emit(
                        LogLevel::Warn,
                        "planning.search.failed",
                        json!({ "task": task.name(), "stage": stage, "reason": err.to_string() }),
                    );
                    return Err(err);
                }
            };
        }
    }

    fn search(&mut self, task: &Task, state: &State, retry: &mut Retry) -> DecompositionPhase {
        let methods = self.catalog.methods_for_task(task);
        let mut search = DecompositionSearch::new(task, &methods, &retry.excluded);
        match search.run(state, self.catalog, &mut self.budget) {
            Ok(outcome) => {
                self.emit(
                    LogLevel::Debug,
                    "planning.search.selected",
                    json!({
                        "task": task.name(),
                        "method": outcome.method,
                        "subtasks": outcome.subtasks,
                        "opened": search.opened(),
                    }),
                );
                DecompositionPhase::Decomposed(outcome)
            }
            Err(PlanningError::NoDecompositionFound { .. }) => {
                let rejections: Vec<String> = search
                    .rejections()
                    .iter()
                    .map(|(method, violation)| format!("{method}: {violation}"))
                    .collect();
                self.emit(
                    LogLevel::Debug,
                    "planning.search.exhausted",
                    json!({
                        "task": task.name(),
                        "methods": methods.len(),
                        "rejections": rejections,
                    }),
                );
                retry.search_exhausted = true;
                DecompositionPhase::AwaitingOracle {
                    attempt: retry.oracle_attempts,
                }
            }
            Err(err) => DecompositionPhase::Failed(err),
        }
    }

    fn consult(
        &mut self,
        task: &Task,
        state: &State,
        attempt: usize,
        retry: &mut Retry,
    ) -> DecompositionPhase {
        let max_attempts = self.config.max_oracle_attempts;
        let Some(oracle) = self.oracle.filter(|_| attempt < max_attempts) else {
            return DecompositionPhase::Failed(if self.budget.is_exhausted() {
                PlanningError::BudgetExhausted {
                    task: task.name().to_string(),
                }
            } else {
                PlanningError::NoDecompositionFound {
                    task: task.name().to_string(),
                }
            });
        };
        if !self.budget.try_consume() {
            return DecompositionPhase::Failed(PlanningError::BudgetExhausted {
                task: task.name().to_string(),
            });
        }
        retry.oracle_attempts += 1;
        let request = OracleRequest {
            task: task.name().to_string(),
            state: state.clone(),
            capabilities: self.catalog.capabilities(),
            remaining_budget: self.budget.remaining(),
            attempt,
        };
        self.emit(
            LogLevel::Info,
            "planning.oracle.request",
            json!({
                "task": task.name(),
                "attempt": attempt,
                "remaining_budget": request.remaining_budget,
                "timeout_ms": u64::try_from(oracle.timeout().as_millis()).unwrap_or(u64::MAX),
            }),
        );
        match oracle
            .consult(request)
            .and_then(|raw| self.accept(task, state, &raw))
        {
            Ok(subtasks) => {
                self.emit(
                    LogLevel::Info,
                    "planning.oracle.accepted",
                    json!({ "task": task.name(), "subtasks": subtasks }),
                );
                DecompositionPhase::Decomposed(SearchOutcome {
                    method: "oracle".into(),
                    key: None,
                    subtasks,
                })
            }
            Err(err) => {
                self.log.push(ExecutionLogEntry::from_error(task.name(), &err));
                self.emit(
                    LogLevel::Warn,
                    "planning.oracle.rejected",
                    json!({
                        "task": task.name(),
                        "attempt": attempt,
                        "reason": err.to_string(),
                    }),
                );
                DecompositionPhase::AwaitingOracle {
                    attempt: attempt + 1,
                }
            }
        }
    }

    /// Resolves and validates raw oracle output; returns canonical subtask names.
    fn accept(&self, task: &Task, state: &State, raw: &[String]) -> Result<Vec<String>, PlanningError> {
        let reject = |reason: String| PlanningError::OracleFailure {
            task: task.name().to_string(),
            reason,
        };
        let mut names = Vec::new();
        for descriptor in raw.iter().flat_map(|item| parse_suggestions(item)) {
            let resolved = self
                .catalog
                .resolve(&descriptor)
                .map_err(|err| reject(format!("unusable subtask `{descriptor}`: {err}")))?;
            names.push(resolved.name().to_string());
        }
        validate_sequence(task, &names, state, self.catalog)
            .map_err(|violation| reject(violation.to_string()))?;
        Ok(names)
    }

    /// Rebuilds the committed tree of `task` from the decompositions of this run.
    fn assemble(&self, task: &Arc<Task>) -> Result<Arc<Task>, PlanningError> {
        if task.is_primitive() {
            return Ok(Arc::clone(task));
        }
        let subtasks = self
            .committed
            .get(task.name())
            .ok_or_else(|| PlanningError::NotDecomposed(task.name().to_string()))?;
        let children = subtasks
            .iter()
            .map(|name| {
                self.catalog
                    .resolve(name)
                    .and_then(|child| self.assemble(&child))
            })
            .collect::<Result<Vec<_>, _>>()?;
        task.with_subtasks(children).map(Arc::new)
    }

    fn emit(&self, level: LogLevel, event: &str, mut payload: Value) {
        if let Some(telemetry) = self.telemetry {
            if let Value::Object(map) = &mut payload {
                map.insert("run_id".into(), Value::String(self.run_id.clone()));
            }
            let _ = telemetry.log(&self.run_id, level, event, payload.clone());
            let _ = telemetry.event(event, payload);
        }
    }

    /// Successful end of the run.
    pub fn complete(self, state: State, halted: bool) -> PlanReport {
        self.emit(
            LogLevel::Info,
            "planning.completed",
            json!({ "entries": self.log.len(), "halted": halted }),
        );
        PlanReport {
            run_id: self.run_id,
            state,
            log: self.log,
            committed: self.committed,
            budget_remaining: self.budget.remaining(),
            halted,
        }
    }

    /// Failed end of the run; the log is kept for diagnosis.
    pub fn fail(self, error: PlanningError) -> PlanFailure {
        self.emit(
            LogLevel::Error,
            "planning.failed",
            json!({ "error": error.to_string(), "entries": self.log.len() }),
        );
        PlanFailure {
            run_id: self.run_id,
            error,
            log: self.log,
        }
    }
}
