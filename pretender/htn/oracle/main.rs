//! Boundary to the generative collaborator that proposes decompositions when
//! no registered method applies. Its answers are untrusted: every suggestion
//! is resolved against the catalog and checked like a registered method.

/// Blocking, timeout-bounded driver for async oracles.
pub mod bridge;
/// Replayable oracle for tests and demos.
pub mod scripted;
/// Parsing and resolution of free-text subtask descriptors.
pub mod vocabulary;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::state::State;

pub use bridge::OracleBridge;
pub use scripted::ScriptedOracle;
pub use vocabulary::{match_template, normalize, parse_suggestions};

/// Everything the oracle is told about the task it should decompose.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OracleRequest {
    /// Compound task name.
    pub task: String,
    /// State the decomposition must start from.
    pub state: State,
    /// Primitive capability names the answer may use.
    pub capabilities: Vec<String>,
    /// Decomposition budget left after this consultation.
    pub remaining_budget: usize,
    /// Zero-based consultation count for this task in the run.
    pub attempt: usize,
}

/// External collaborator proposing ordered subtask descriptors.
#[async_trait]
pub trait TaskOracle: Send + Sync {
    /// Suggests subtasks for `request.task`, in execution order.
    async fn suggest_subtasks(&self, request: OracleRequest) -> Result<Vec<String>>;
}
