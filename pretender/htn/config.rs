use std::{fs, path::Path, time::Duration};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::module::ExecutionPolicy;

/// Planner knobs, loadable from TOML.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannerConfig {
    /// Budget used by [`crate::Planner::plan_default`].
    #[serde(default = "default_budget")]
    pub default_budget: usize,
    /// Deadline for a single oracle consultation.
    #[serde(default = "default_oracle_timeout_ms")]
    pub oracle_timeout_ms: u64,
    /// Oracle consultations allowed per compound task and run.
    #[serde(default = "default_max_oracle_attempts")]
    pub max_oracle_attempts: usize,
    /// Maximum nesting of compound expansion.
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
    /// Stop a compound's remaining subtasks after an effect mismatch.
    #[serde(default)]
    pub halt_on_mismatch: bool,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            default_budget: default_budget(),
            oracle_timeout_ms: default_oracle_timeout_ms(),
            max_oracle_attempts: default_max_oracle_attempts(),
            max_depth: default_max_depth(),
            halt_on_mismatch: false,
        }
    }
}

impl PlannerConfig {
    /// Loads configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .with_context(|| format!("reading planner config {}", path.display()))?;
        Self::from_toml(&raw).with_context(|| format!("parsing {}", path.display()))
    }

    /// Parses and validates a TOML document.
    pub fn from_toml(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects settings that would make planning impossible.
    pub fn validate(&self) -> Result<()> {
        if self.max_depth == 0 {
            bail!("max_depth must be at least 1");
        }
        if self.max_oracle_attempts == 0 {
            bail!("max_oracle_attempts must be at least 1");
        }
        if self.oracle_timeout_ms == 0 {
            bail!("oracle_timeout_ms must be positive");
        }
        Ok(())
    }

    /// Oracle deadline as a duration.
    #[must_use]
    pub fn oracle_timeout(&self) -> Duration {
        Duration::from_millis(self.oracle_timeout_ms)
    }

    /// Execution policy derived from the config.
    #[must_use]
    pub fn execution_policy(&self) -> ExecutionPolicy {
        ExecutionPolicy {
            halt_on_mismatch: self.halt_on_mismatch,
        }
    }
}

fn default_budget() -> usize {
    32
}

fn default_oracle_timeout_ms() -> u64 {
    5_000
}

fn default_max_oracle_attempts() -> usize {
    3
}

fn default_max_depth() -> usize {
    16
}
