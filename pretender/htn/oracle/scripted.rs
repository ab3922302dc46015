use std::{collections::VecDeque, time::Duration};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use parking_lot::Mutex;

use super::{parse_suggestions, OracleRequest, TaskOracle};

#[derive(Debug, Clone)]
enum Reply {
    Subtasks(Vec<String>),
    Text(String),
    Failure(String),
    Delayed(Duration, Vec<String>),
}

/// Oracle that replays queued replies in order and records every request.
#[derive(Debug, Default)]
pub struct ScriptedOracle {
    replies: Mutex<VecDeque<Reply>>,
    requests: Mutex<Vec<OracleRequest>>,
}

impl ScriptedOracle {
    /// Creates an oracle with no replies queued.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn push(self, reply: Reply) -> Self {
        self.replies.lock().push_back(reply);
        self
    }

    /// Queues a list of subtask descriptors.
    #[must_use]
    pub fn suggest<I, S>(self, subtasks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.push(Reply::Subtasks(subtasks.into_iter().map(Into::into).collect()))
    }

    /// Queues a free-text answer, parsed with [`parse_suggestions`].
    #[must_use]
    pub fn text(self, answer: impl Into<String>) -> Self {
        self.push(Reply::Text(answer.into()))
    }

    /// Queues an error.
    #[must_use]
    pub fn fail(self, reason: impl Into<String>) -> Self {
        self.push(Reply::Failure(reason.into()))
    }

    /// Queues descriptors delivered after `delay`.
    #[must_use]
    pub fn delayed<I, S>(self, delay: Duration, subtasks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.push(Reply::Delayed(
            delay,
            subtasks.into_iter().map(Into::into).collect(),
        ))
    }

    /// Number of consultations received.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.requests.lock().len()
    }

    /// Requests received, oldest first.
    #[must_use]
    pub fn requests(&self) -> Vec<OracleRequest> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl TaskOracle for ScriptedOracle {
    async fn suggest_subtasks(&self, request: OracleRequest) -> Result<Vec<String>> {
        let task = request.task.clone();
        self.requests.lock().push(request);
        let reply = self.replies.lock().pop_front();
        match reply {
            Some(Reply::Subtasks(subtasks)) => Ok(subtasks),
            Some(Reply::Text(answer)) => Ok(parse_suggestions(&answer)),
            Some(Reply::Failure(reason)) => Err(anyhow!(reason)),
            Some(Reply::Delayed(delay, subtasks)) => {
                tokio::time::sleep(delay).await;
                Ok(subtasks)
            }
            None => Err(anyhow!("no scripted reply left for `{task}`")),
        }
    }
}
