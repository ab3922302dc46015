use std::{fmt, future::Future, sync::Arc, time::Duration};

use parking_lot::Mutex;
use tokio::runtime::{Builder, Handle, Runtime, RuntimeFlavor};

use crate::errors::PlanningError;

use super::{OracleRequest, TaskOracle};

/// Drives an async [`TaskOracle`] from synchronous planning code.
///
/// Inside a multi-threaded tokio runtime the call is parked with
/// `block_in_place`. Inside a current-thread runtime it runs on a scoped
/// helper thread with its own runtime. Elsewhere a private runtime is
/// created on first use.
pub struct OracleBridge {
    oracle: Arc<dyn TaskOracle>,
    timeout: Duration,
    runtime: Mutex<Option<Runtime>>,
}

impl fmt::Debug for OracleBridge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OracleBridge")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl OracleBridge {
    /// Wraps an oracle with a per-consultation deadline.
    #[must_use]
    pub fn new(oracle: Arc<dyn TaskOracle>, timeout: Duration) -> Self {
        Self {
            oracle,
            timeout,
            runtime: Mutex::new(None),
        }
    }

    /// Deadline applied to each consultation.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Asks the oracle for subtasks, mapping errors and timeouts to planning errors.
    pub fn consult(&self, request: OracleRequest) -> Result<Vec<String>, PlanningError> {
        let task = request.task.clone();
        let oracle = Arc::clone(&self.oracle);
        let timeout = self.timeout;
        let call = async move { tokio::time::timeout(timeout, oracle.suggest_subtasks(request)).await };
        let outcome = self.block_on(call).map_err(|err| PlanningError::OracleFailure {
            task: task.clone(),
            reason: format!("oracle runtime unavailable: {err}"),
        })?;
        match outcome {
            Ok(Ok(subtasks)) => Ok(subtasks),
            Ok(Err(err)) => Err(PlanningError::OracleFailure {
                task,
                reason: format!("{err:#}"),
            }),
            Err(_) => Err(PlanningError::OracleTimeout {
                task,
                timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
            }),
        }
    }

    fn block_on<F>(&self, future: F) -> std::io::Result<F::Output>
    where
        F: Future + Send,
        F::Output: Send,
    {
        if let Ok(handle) = Handle::try_current() {
            if handle.runtime_flavor() == RuntimeFlavor::MultiThread {
                return Ok(tokio::task::block_in_place(|| handle.block_on(future)));
            }
            // A current-thread runtime cannot block in place; the helper
            // runtime is built and dropped on the helper thread.
            return std::thread::scope(|scope| {
                scope
                    .spawn(|| {
                        Builder::new_current_thread()
                            .enable_all()
                            .build()
                            .map(|runtime| runtime.block_on(future))
                    })
                    .join()
                    .unwrap_or_else(|_| Err(std::io::Error::other("oracle thread panicked")))
            });
        }
        let mut slot = self.runtime.lock();
        let runtime = match slot.take() {
            Some(runtime) => runtime,
            None => Runtime::new()?,
        };
        let output = runtime.block_on(future);
        *slot = Some(runtime);
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{oracle::ScriptedOracle, state::State};

    fn request() -> OracleRequest {
        OracleRequest {
            task: "MakeCoffee".into(),
            state: State::empty(),
            capabilities: vec!["Go to".into()],
            remaining_budget: 3,
            attempt: 0,
        }
    }

    #[test]
    fn answers_pass_through() {
        let oracle = Arc::new(ScriptedOracle::new().suggest(["Go to CoffeeMachine"]));
        let bridge = OracleBridge::new(oracle.clone(), Duration::from_secs(1));
        assert_eq!(bridge.consult(request()).unwrap(), ["Go to CoffeeMachine"]);
        assert_eq!(oracle.calls(), 1);
    }

    #[test]
    fn slow_answers_time_out() {
        let oracle = Arc::new(
            ScriptedOracle::new().delayed(Duration::from_millis(500), ["Go to CoffeeMachine"]),
        );
        let bridge = OracleBridge::new(oracle, Duration::from_millis(20));
        assert_eq!(
            bridge.consult(request()).unwrap_err(),
            PlanningError::OracleTimeout {
                task: "MakeCoffee".into(),
                timeout_ms: 20
            }
        );
    }

    #[test]
    fn errors_become_oracle_failures() {
        let bridge = OracleBridge::new(
            Arc::new(ScriptedOracle::new().fail("model offline")),
            Duration::from_secs(1),
        );
        match bridge.consult(request()).unwrap_err() {
            PlanningError::OracleFailure { task, reason } => {
                assert_eq!(task, "MakeCoffee");
                assert!(reason.contains("model offline"));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn works_inside_a_multi_thread_runtime() {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .unwrap();
        let bridge = OracleBridge::new(
            Arc::new(ScriptedOracle::new().suggest(["Wave"])),
            Duration::from_secs(1),
        );
        let answer = runtime
            .block_on(async move { tokio::spawn(async move { bridge.consult(request()) }).await })
            .unwrap();
        assert_eq!(answer.unwrap(), ["Wave"]);
    }

    #[test]
    fn works_inside_a_current_thread_runtime() {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        let oracle = Arc::new(ScriptedOracle::new().suggest(["Wave"]));
        let bridge = OracleBridge::new(oracle.clone(), Duration::from_secs(1));
        let answer = runtime.block_on(async { bridge.consult(request()) });
        assert_eq!(answer.unwrap(), ["Wave"]);
        assert_eq!(oracle.calls(), 1);
    }

    #[tokio::test]
    async fn timeouts_still_apply_on_the_test_runtime() {
        let oracle = Arc::new(
            ScriptedOracle::new().delayed(Duration::from_millis(500), ["Wave"]),
        );
        let bridge = OracleBridge::new(oracle, Duration::from_millis(20));
        assert!(matches!(
            bridge.consult(request()),
            Err(PlanningError::OracleTimeout { timeout_ms: 20, .. })
        ));
    }
}
