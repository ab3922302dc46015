#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    rust_2018_idioms
)]

//! Hierarchical task network planner: immutable world states, primitive and
//! compound tasks, budgeted decomposition search, and a validated fallback to
//! a generative task oracle.

/// Planner configuration loaded from TOML.
#[path = "../config.rs"]
pub mod config;
/// Decomposition methods and the shortest-first search over them.
#[path = "../decomposition/main.rs"]
pub mod decomposition;
/// Error taxonomy shared by every planning stage.
#[path = "../errors.rs"]
pub mod errors;
/// Ordered execution log produced by planning runs.
#[path = "../execution.rs"]
pub mod execution;
/// Goals, execution policy and decomposition phases.
#[path = "../module.rs"]
pub mod module;
/// Task oracle interface and the blocking bridge that drives it.
#[path = "../oracle/main.rs"]
pub mod oracle;
/// Planner entry point orchestrating expansion and execution.
#[path = "../main.rs"]
pub mod planner;
/// Task and method registries.
#[path = "../registry.rs"]
pub mod registry;
#[path = "../run.rs"]
mod run;
/// World state model.
#[path = "../state.rs"]
pub mod state;
/// Primitive and compound tasks.
#[path = "../task.rs"]
pub mod task;
/// Telemetry helpers for planning.
#[path = "../telemetry.rs"]
pub mod telemetry;

pub use config::PlannerConfig;
pub use decomposition::{
    validate_sequence, ContractViolation, DecompositionBudget, DecompositionMethod,
    DecompositionSearch, Precondition, Projection, SearchKey, SearchOutcome,
};
pub use errors::PlanningError;
pub use execution::{ExecutionLog, ExecutionLogEntry, Outcome};
pub use module::{DecompositionPhase, ExecutionPolicy, Goal};
pub use oracle::{
    match_template, normalize, parse_suggestions, OracleBridge, OracleRequest, ScriptedOracle,
    TaskOracle,
};
pub use planner::{PlanFailure, PlanReport, Planner};
pub use registry::{Catalog, TaskLookup};
pub use state::{apply_effects, diff, EffectSet, Predicate, State, Term};
pub use task::{Capability, Task, TaskKind};
pub use telemetry::{PlanningTelemetry, PlanningTelemetryBuilder};
