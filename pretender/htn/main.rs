use std::{path::Path, sync::Arc};

use anyhow::Result;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    config::PlannerConfig,
    decomposition::DecompositionMethod,
    errors::PlanningError,
    execution::ExecutionLog,
    module::Goal,
    oracle::{OracleBridge, TaskOracle},
    registry::Catalog,
    run::PlanRun,
    state::State,
    task::Task,
    telemetry::PlanningTelemetry,
};

/// Result of a successful `plan()` call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanReport {
    /// Identifier shared by the run's telemetry.
    pub run_id: String,
    /// Actual state after executing every goal.
    pub state: State,
    /// Ordered execution log.
    pub log: ExecutionLog,
    /// Compound task name to committed subtask names, in commit order.
    pub committed: IndexMap<String, Vec<String>>,
    /// Decomposition budget left.
    pub budget_remaining: usize,
    /// True when a mismatch stopped the remaining goals.
    pub halted: bool,
}

/// Unreachable goal; carries the full log for diagnosis.
#[derive(Debug, Clone, Error)]
#[error("planning run {run_id} failed: {error}")]
pub struct PlanFailure {
    /// Identifier shared by the run's telemetry.
    pub run_id: String,
    /// Error that ended the run.
    #[source]
    pub error: PlanningError,
    /// Everything logged before the failure.
    pub log: ExecutionLog,
}

/// Hierarchical task network planner.
///
/// Registries are filled at setup and read-only while planning, so one
/// planner serves any number of independent `plan()` calls.
#[derive(Debug)]
pub struct Planner {
    catalog: Catalog,
    config: PlannerConfig,
    oracle: Option<OracleBridge>,
    telemetry: Option<PlanningTelemetry>,
}

impl Default for Planner {
    fn default() -> Self {
        Self::new(PlannerConfig::default())
    }
}

impl Planner {
    /// Creates an empty planner.
    #[must_use]
    pub fn new(config: PlannerConfig) -> Self {
        Self {
            catalog: Catalog::default(),
            config,
            oracle: None,
            telemetry: None,
        }
    }

    /// Creates a planner from a TOML configuration file.
    pub fn from_config_file(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::new(PlannerConfig::load(path)?))
    }

    /// Installs the fallback oracle, bounded by the configured timeout.
    #[must_use]
    pub fn with_oracle(mut self, oracle: Arc<dyn TaskOracle>) -> Self {
        self.oracle = Some(OracleBridge::new(oracle, self.config.oracle_timeout()));
        self
    }

    /// Installs telemetry sinks.
    #[must_use]
    pub fn with_telemetry(mut self, telemetry: PlanningTelemetry) -> Self {
        self.telemetry = Some(telemetry);
        self
    }

    /// Registers a task; names are unique.
    pub fn register_task(&mut self, task: Task) -> Result<(), PlanningError> {
        self.catalog.register_task(task)
    }

    /// Registers a decomposition method for a compound task.
    pub fn register_method(
        &mut self,
        task_name: &str,
        method: DecompositionMethod,
    ) -> Result<(), PlanningError> {
        self.catalog.register_method(task_name, method)
    }

    /// Registered tasks and methods.
    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    /// Plans and executes `goal` from `initial` with a decomposition budget.
    ///
    /// Goals run in order, each starting from the state the previous one left.
    /// Decomposition failures are retried by backtracking; only a goal that no
    /// method, prior decomposition or oracle answer can reach fails the call.
    pub fn plan(
        &self,
        goal: impl Into<Goal>,
        initial: &State,
        budget: usize,
    ) -> Result<PlanReport, PlanFailure> {
        let goal = goal.into();
        let mut run = PlanRun::new(
            &self.catalog,
            &self.config,
            self.oracle.as_ref(),
            self.telemetry.as_ref(),
            budget,
        );
        let mut state = initial.clone();
        let mut halted = false;
        for name in goal.tasks() {
            match run.pursue(name, &state) {
                Ok((next, mismatched)) => {
                    state = next;
                    if mismatched && self.config.halt_on_mismatch {
                        halted = true;
                        break;
                    }
                }
                Err(error) => return Err(run.fail(error)),
            }
        }
        Ok(run.complete(state, halted))
    }

    /// [`Planner::plan`] with the configured default budget.
    pub fn plan_default(
        &self,
        goal: impl Into<Goal>,
        initial: &State,
    ) -> Result<PlanReport, PlanFailure> {
        self.plan(goal, initial, self.config.default_budget)
    }
}

#[cfg(test)]
mod tests {
    use std::{collections::BTreeSet, time::Duration};

    use pretender_journal::MemoryEventBus;
    use tempfile::tempdir;

    use super::*;
    use crate::{
        decomposition::Precondition,
        execution::Outcome,
        oracle::ScriptedOracle,
        state::{apply_effects, EffectSet, Predicate, Term},
        task::Capability,
    };

    fn p(text: &str) -> Predicate {
        Predicate::parse(text).unwrap()
    }

    /// Primitive whose capability does exactly what it declares.
    fn faithful(name: &str, adds: &[&str]) -> Task {
        let effects = EffectSet::parse(adds, &[]).unwrap();
        let applied = effects.clone();
        Task::primitive(
            name,
            Capability::from_fn(move |state| apply_effects(state, &applied).unwrap()),
        )
        .effects(effects)
    }

    fn compound(name: &str, adds: &[&str]) -> Task {
        Task::compound(name).effects(EffectSet::parse(adds, &[]).unwrap())
    }

    /// Kitchen vocabulary: `Go to`, `Pick Up`, `Turn On` and an undecomposed `MakeCoffee`.
    fn kitchen(config: PlannerConfig) -> Planner {
        let mut planner = Planner::new(config);
        planner
            .register_task(
                Task::primitive(
                    "Go to",
                    Capability::new(|state, args| {
                        let at = Predicate::new("at", ["Robot", args[0].as_str()]);
                        apply_effects(state, &EffectSet::new().add(at)).unwrap()
                    }),
                )
                .parameters(["?target"])
                .effects(EffectSet::parse(&["at(Robot, ?target)"], &[]).unwrap()),
            )
            .unwrap();
        planner
            .register_task(
                Task::primitive(
                    "Pick Up",
                    Capability::new(|state, args| {
                        let holding = Predicate::new("holding", ["Robot", args[0].as_str()]);
                        apply_effects(state, &EffectSet::new().add(holding)).unwrap()
                    }),
                )
                .parameters(["?item"])
                .requires(Term::parse("at(Robot, ?item)").unwrap())
                .effects(EffectSet::parse(&["holding(Robot, ?item)"], &[]).unwrap()),
            )
            .unwrap();
        planner
            .register_task(
                Task::primitive(
                    "Turn On",
                    Capability::new(|state, args| {
                        let on = Predicate::new("on", [args[0].as_str()]);
                        apply_effects(state, &EffectSet::new().add(on)).unwrap()
                    }),
                )
                .parameters(["?device"])
                .requires(Term::parse("at(Robot, ?device)").unwrap())
                .effects(EffectSet::parse(&["on(?device)"], &[]).unwrap()),
            )
            .unwrap();
        planner
            .register_task(compound("MakeCoffee", &["on(CoffeeMachine)"]))
            .unwrap();
        planner
    }

    fn in_kitchen() -> State {
        State::parse(&["at(Robot, Kitchen)"]).unwrap()
    }

    fn quick_config() -> PlannerConfig {
        PlannerConfig {
            oracle_timeout_ms: 50,
            ..PlannerConfig::default()
        }
    }

    #[test]
    fn shortest_decomposition_is_committed() {
        let mut planner = Planner::default();
        for task in [
            faithful("A", &["a"]),
            faithful("B", &["b"]),
            faithful("C", &["c"]),
            faithful("D", &["done"]),
            faithful("E", &["done"]),
            compound("T", &["done"]),
        ] {
            planner.register_task(task).unwrap();
        }
        planner
            .register_method("T", DecompositionMethod::new("long").candidate(["A", "B", "C", "D"]))
            .unwrap();
        planner
            .register_method("T", DecompositionMethod::new("short").candidate(["A", "E"]))
            .unwrap();

        let report = planner.plan("T", &State::empty(), 2).unwrap();
        assert_eq!(report.committed["T"], ["A", "E"]);
        assert_eq!(report.log.tasks_with(Outcome::Ok), ["A", "E"]);
        assert!(report.state.holds(&p("done")));
        assert_eq!(report.budget_remaining, 0);
    }

    #[test]
    fn effect_mismatch_is_logged_and_siblings_still_run() {
        let mut planner = Planner::default();
        planner
            .register_task(
                Task::primitive("Go(Kitchen)", Capability::from_fn(State::clone))
                    .effects(EffectSet::new().add(p("at(Robot, Kitchen)"))),
            )
            .unwrap();
        planner.register_task(faithful("Wave", &["waved(Robot)"])).unwrap();
        planner
            .register_task(compound("Greet", &["waved(Robot)"]))
            .unwrap();
        planner
            .register_method(
                "Greet",
                DecompositionMethod::new("walk-and-wave").candidate(["Go(Kitchen)", "Wave"]),
            )
            .unwrap();

        let report = planner.plan("Greet", &State::empty(), 4).unwrap();
        let entries = report.log.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].task, "Go(Kitchen)");
        assert_eq!(entries[0].outcome, Outcome::EffectMismatch);
        assert_eq!(entries[0].diff, BTreeSet::from([p("at(Robot, Kitchen)")]));
        assert_eq!(entries[1].outcome, Outcome::Ok);
        assert!(report.state.holds(&p("waved(Robot)")));
        assert!(!report.halted);
    }

    #[test]
    fn halting_policy_stops_after_a_mismatch() {
        let mut planner = Planner::new(PlannerConfig {
            halt_on_mismatch: true,
            ..PlannerConfig::default()
        });
        planner
            .register_task(
                Task::primitive("Go(Kitchen)", Capability::from_fn(State::clone))
                    .effects(EffectSet::new().add(p("at(Robot, Kitchen)"))),
            )
            .unwrap();
        planner.register_task(faithful("Wave", &["waved(Robot)"])).unwrap();

        let report = planner
            .plan(["Go(Kitchen)", "Wave"], &State::empty(), 1)
            .unwrap();
        assert!(report.halted);
        assert_eq!(report.log.len(), 1);
        assert!(!report.state.holds(&p("waved(Robot)")));
    }

    #[test]
    fn zero_budget_fails_without_consulting_the_oracle() {
        let oracle = Arc::new(ScriptedOracle::new().suggest(["Go to CoffeeMachine"]));
        let planner = kitchen(quick_config()).with_oracle(oracle.clone());

        let failure = planner.plan("MakeCoffee", &in_kitchen(), 0).unwrap_err();
        assert_eq!(
            failure.error,
            PlanningError::BudgetExhausted {
                task: "MakeCoffee".into()
            }
        );
        assert_eq!(oracle.calls(), 0);
        assert_eq!(failure.log.count(Outcome::BudgetExhausted), 1);
    }

    #[test]
    fn oracle_fills_in_when_no_method_is_registered() {
        let oracle = Arc::new(
            ScriptedOracle::new().suggest(["Go to CoffeeMachine", "Turn On CoffeeMachine"]),
        );
        let planner = kitchen(quick_config()).with_oracle(oracle.clone());

        let report = planner.plan("MakeCoffee", &in_kitchen(), 3).unwrap();
        assert_eq!(
            report.log.tasks_with(Outcome::Ok),
            ["Go to CoffeeMachine", "Turn On CoffeeMachine"]
        );
        assert_eq!(report.log.len(), 2);
        assert!(report.state.holds(&p("on(CoffeeMachine)")));
        assert_eq!(report.budget_remaining, 2);

        let requests = oracle.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].capabilities, ["Go to", "Pick Up", "Turn On"]);
        assert_eq!(requests[0].remaining_budget, 2);
        assert!(requests[0].state.holds(&p("at(Robot, Kitchen)")));
    }

    #[test]
    fn oracle_timeout_consumes_budget_and_is_retried() {
        let oracle = Arc::new(
            ScriptedOracle::new()
                .delayed(Duration::from_millis(500), ["Go to CoffeeMachine"])
                .suggest(["Go to CoffeeMachine", "Turn On CoffeeMachine"]),
        );
        let planner = kitchen(quick_config()).with_oracle(oracle.clone());

        let report = planner.plan("MakeCoffee", &in_kitchen(), 5).unwrap();
        assert_eq!(oracle.calls(), 2);
        assert_eq!(report.budget_remaining, 3);
        let first = &report.log.entries()[0];
        assert_eq!(first.outcome, Outcome::OracleFailure);
        assert!(first.detail.as_deref().unwrap().contains("timed out"));
        assert_eq!(report.log.count(Outcome::Ok), 2);
    }

    #[test]
    fn invalid_oracle_answers_are_rejected_until_one_validates() {
        let oracle = Arc::new(
            ScriptedOracle::new()
                .suggest(["Juggle"])
                .text("1. Turn On the CoffeeMachine.")
                .text("[Go to the CoffeeMachine], [Turn On CoffeeMachine]"),
        );
        let planner = kitchen(quick_config()).with_oracle(oracle.clone());

        let report = planner.plan("MakeCoffee", &in_kitchen(), 8).unwrap();
        assert_eq!(report.log.count(Outcome::OracleFailure), 2);
        assert_eq!(
            report.committed["MakeCoffee"],
            ["Go to CoffeeMachine", "Turn On CoffeeMachine"]
        );
        assert_eq!(oracle.requests()[2].attempt, 2);
    }

    #[test]
    fn oracle_attempts_are_capped() {
        let oracle = Arc::new(ScriptedOracle::new().suggest(["Juggle"]).suggest(["Juggle"]));
        let planner = kitchen(PlannerConfig {
            max_oracle_attempts: 1,
            ..quick_config()
        })
        .with_oracle(oracle.clone());

        let failure = planner.plan("MakeCoffee", &in_kitchen(), 8).unwrap_err();
        assert_eq!(
            failure.error,
            PlanningError::NoDecompositionFound {
                task: "MakeCoffee".into()
            }
        );
        assert_eq!(oracle.calls(), 1);
        assert_eq!(failure.log.count(Outcome::OracleFailure), 1);
        assert_eq!(failure.log.count(Outcome::NoDecompositionFound), 1);
    }

    #[test]
    fn bare_template_suggestions_are_rejected() {
        let oracle = Arc::new(
            ScriptedOracle::new()
                .suggest(["Go to", "Turn On CoffeeMachine"])
                .suggest(["Go to CoffeeMachine", "Turn On CoffeeMachine"]),
        );
        let planner = kitchen(quick_config()).with_oracle(oracle.clone());

        let report = planner.plan("MakeCoffee", &in_kitchen(), 4).unwrap();
        assert_eq!(oracle.calls(), 2);
        assert_eq!(report.log.count(Outcome::OracleFailure), 1);
        assert_eq!(report.log.count(Outcome::EffectMismatch), 0);
        assert_eq!(
            report.committed["MakeCoffee"],
            ["Go to CoffeeMachine", "Turn On CoffeeMachine"]
        );

        let failure = planner.plan("Go to", &in_kitchen(), 1).unwrap_err();
        assert!(matches!(
            failure.error,
            PlanningError::ArityMismatch { expected: 1, found: 0, .. }
        ));
        assert!(failure.log.is_empty());
    }

    #[test]
    fn oracle_runs_inside_a_current_thread_runtime() {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        let oracle = Arc::new(
            ScriptedOracle::new().suggest(["Go to CoffeeMachine", "Turn On CoffeeMachine"]),
        );
        let planner = kitchen(quick_config()).with_oracle(oracle.clone());

        let report = runtime
            .block_on(async { planner.plan("MakeCoffee", &in_kitchen(), 3) })
            .unwrap();
        assert_eq!(oracle.calls(), 1);
        assert!(report.state.holds(&p("on(CoffeeMachine)")));
        assert_eq!(report.budget_remaining, 2);
    }

    #[test]
    fn nested_failure_backtracks_to_the_next_method() {
        let mut planner = Planner::default();
        for task in [
            faithful("Fetch", &["has(Tea)"]),
            faithful("Heat", &["hot(Tea)"]),
            faithful("Deliver", &["served(Tea)"]),
            compound("Brew", &["hot(Tea)"]),
            compound("Serve", &["served(Tea)"]),
        ] {
            planner.register_task(task).unwrap();
        }
        planner
            .register_task(
                faithful("Boil", &["hot(Tea)"]).requires(Term::parse("Kettle").unwrap()),
            )
            .unwrap();
        planner
            .register_method("Brew", DecompositionMethod::new("kettle").candidate(["Boil"]))
            .unwrap();
        planner
            .register_method("Serve", DecompositionMethod::new("quick").candidate(["Brew", "Deliver"]))
            .unwrap();
        planner
            .register_method(
                "Serve",
                DecompositionMethod::new("slow").candidate(["Fetch", "Heat", "Deliver"]),
            )
            .unwrap();

        let report = planner.plan("Serve", &State::empty(), 10).unwrap();
        assert_eq!(report.committed.keys().collect::<Vec<_>>(), ["Serve"]);
        assert_eq!(report.committed["Serve"], ["Fetch", "Heat", "Deliver"]);
        assert_eq!(report.log.tasks_with(Outcome::Ok), ["Fetch", "Heat", "Deliver"]);
        assert_eq!(
            report.log.tasks_with(Outcome::NoDecompositionFound),
            ["Brew", "Serve"]
        );
        assert_eq!(report.budget_remaining, 6);
    }

    #[test]
    fn preconditions_gate_methods() {
        let mut planner = Planner::default();
        planner.register_task(faithful("Knock", &["inside"])).unwrap();
        planner.register_task(faithful("Enter", &["inside"])).unwrap();
        planner.register_task(compound("GoIn", &["inside"])).unwrap();
        planner
            .register_method(
                "GoIn",
                DecompositionMethod::new("open-door")
                    .precondition(Precondition::holds(Term::parse("open(Door)").unwrap()))
                    .candidate(["Enter"]),
            )
            .unwrap();
        planner
            .register_method("GoIn", DecompositionMethod::new("closed-door").candidate(["Knock"]))
            .unwrap();

        let closed = planner.plan("GoIn", &State::empty(), 4).unwrap();
        assert_eq!(closed.committed["GoIn"], ["Knock"]);
        let open = planner
            .plan("GoIn", &State::parse(&["open(Door)"]).unwrap(), 4)
            .unwrap();
        assert_eq!(open.committed["GoIn"], ["Enter"]);
    }

    #[test]
    fn goals_thread_state_and_reuse_decompositions() {
        let mut planner = Planner::default();
        planner.register_task(faithful("Wake", &["has(Tea)"])).unwrap();
        planner
            .register_task(faithful("Heat", &["hot(Tea)"]).requires(Term::parse("has(Tea)").unwrap()))
            .unwrap();
        planner.register_task(compound("MakeTea", &["hot(Tea)"])).unwrap();
        planner
            .register_method("MakeTea", DecompositionMethod::new("heat").candidate(["Heat"]))
            .unwrap();

        let report = planner
            .plan(["Wake", "MakeTea", "MakeTea"], &State::empty(), 1)
            .unwrap();
        assert_eq!(report.log.tasks_with(Outcome::Ok), ["Wake", "Heat", "Heat"]);
        assert_eq!(report.budget_remaining, 0);

        let failure = planner.plan("MakeTea", &State::empty(), 2).unwrap_err();
        assert_eq!(
            failure.error,
            PlanningError::NoDecompositionFound {
                task: "MakeTea".into()
            }
        );
    }

    #[test]
    fn parameterised_compounds_bind_their_methods() {
        let mut planner = kitchen(quick_config());
        planner
            .register_task(
                Task::compound("Bring")
                    .parameters(["?item"])
                    .effects(EffectSet::parse(&["holding(Robot, ?item)"], &[]).unwrap()),
            )
            .unwrap();
        planner
            .register_method(
                "Bring",
                DecompositionMethod::new("walk-and-grab").candidate(["Go to ?item", "Pick Up ?item"]),
            )
            .unwrap();

        let report = planner.plan("Bring the Mug", &in_kitchen(), 2).unwrap();
        assert_eq!(report.committed["Bring Mug"], ["Go to Mug", "Pick Up Mug"]);
        assert!(report.state.holds(&p("holding(Robot, Mug)")));
    }

    #[test]
    fn self_recursive_and_deep_expansions_fail_cleanly() {
        let mut planner = Planner::new(PlannerConfig {
            max_depth: 2,
            ..PlannerConfig::default()
        });
        planner.register_task(faithful("Step", &["moved"])).unwrap();
        planner.register_task(compound("Walk", &["moved"])).unwrap();
        planner
            .register_method("Walk", DecompositionMethod::new("again").candidate(["Step", "Walk"]))
            .unwrap();
        let failure = planner.plan("Walk", &State::empty(), 8).unwrap_err();
        assert!(matches!(failure.error, PlanningError::NoDecompositionFound { .. }));

        for name in ["L0", "L1", "L2"] {
            planner.register_task(compound(name, &["moved"])).unwrap();
        }
        planner
            .register_method("L0", DecompositionMethod::new("down").candidate(["L1"]))
            .unwrap();
        planner
            .register_method("L1", DecompositionMethod::new("down").candidate(["L2"]))
            .unwrap();
        planner
            .register_method("L2", DecompositionMethod::new("step").candidate(["Step"]))
            .unwrap();
        let failure = planner.plan("L0", &State::empty(), 8).unwrap_err();
        assert_eq!(
            failure.error,
            PlanningError::NoDecompositionFound { task: "L0".into() }
        );
        assert!(failure
            .log
            .entries()
            .iter()
            .any(|entry| entry.detail.as_deref().is_some_and(|d| d.contains("exceeded depth 2"))));
    }

    #[test]
    fn setup_rejects_duplicates_and_unknown_goals_fail() {
        let mut planner = Planner::default();
        planner.register_task(faithful("Wave", &["waved"])).unwrap();
        assert_eq!(
            planner.register_task(faithful("Wave", &["waved"])).unwrap_err(),
            PlanningError::DuplicateName("Wave".into())
        );
        let failure = planner.plan("Dance", &State::empty(), 1).unwrap_err();
        assert_eq!(failure.error, PlanningError::UnknownTask("Dance".into()));
        assert!(failure.log.is_empty());
    }

    #[test]
    fn telemetry_and_persisted_log_capture_the_run() {
        let tmp = tempdir().unwrap();
        let bus = Arc::new(MemoryEventBus::new(64));
        let telemetry = PlanningTelemetry::builder("planner")
            .log_path(tmp.path().join("planning.log"))
            .event_publisher(bus.clone())
            .build()
            .unwrap();
        let oracle = Arc::new(
            ScriptedOracle::new().suggest(["Go to CoffeeMachine", "Turn On CoffeeMachine"]),
        );
        let planner = kitchen(quick_config())
            .with_oracle(oracle)
            .with_telemetry(telemetry);

        let report = planner.plan_default("MakeCoffee", &in_kitchen()).unwrap();
        assert_eq!(report.budget_remaining, PlannerConfig::default().default_budget - 1);
        for event in [
            "planning.goal.begin",
            "planning.oracle.request",
            "planning.oracle.accepted",
            "planning.goal.completed",
        ] {
            assert_eq!(bus.events_of(event).len(), 1, "{event}");
        }
        assert_eq!(bus.events_of("planning.oracle.request")[0].payload["timeout_ms"], 50);
        let journal = std::fs::read_to_string(tmp.path().join("planning.log")).unwrap();
        assert!(journal.contains(&report.run_id));

        let path = tmp.path().join("run.jsonl");
        assert_eq!(report.log.persist(&path).unwrap(), 2);
        assert_eq!(ExecutionLog::load(&path).unwrap(), report.log);

        planner.plan("MakeCoffee", &in_kitchen(), 0).unwrap_err();
        let failed = bus.events_of("planning.search.failed");
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].payload["stage"], "awaiting_oracle");
    }

    #[test]
    fn planner_reads_its_config_file() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("planner.toml");
        std::fs::write(&path, "default_budget = 4\nmax_depth = 3\n").unwrap();
        let planner = Planner::from_config_file(&path).unwrap();
        assert_eq!(planner.config().default_budget, 4);
        assert_eq!(planner.config().max_oracle_attempts, 3);
        assert!(planner.catalog().is_empty());
    }
}
