// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Deploy job record and state machine.

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

crate::define_id! {
    /// Unique identifier for a deploy job.
    ///
    /// Each run gets its own ID, used to derive the relay channel and to
    /// reference the job in logs and events.
    pub struct JobId("job-");
}

/// Relay channel carrying all traffic for one job.
///
/// Broadcast lines are published on the channel name itself; pending control
/// input lives under the derived [`input_key`](Channel::input_key). The
/// default name is `deploy:{job_id}` so observers can subscribe knowing only
/// the job ID.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Channel(SmolStr);

impl Channel {
    /// Channel derived from a job ID.
    pub fn for_job(id: &JobId) -> Self {
        Self(SmolStr::new(format!("deploy:{id}")))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Store key holding the pending control value for this channel.
    pub fn input_key(&self) -> String {
        format!("{}:input", self.0)
    }
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Channel {
    fn from(s: &str) -> Self {
        Self(SmolStr::new(s))
    }
}

impl From<String> for Channel {
    fn from(s: String) -> Self {
        Self(SmolStr::new(s))
    }
}

impl AsRef<str> for Channel {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Lifecycle state of a [`Job`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    /// Created, not yet picked up by a deploy session
    Pending,
    /// A deploy session is driving it
    Running,
    /// Every command exited zero
    Succeeded,
    /// A command failed, the run was stopped, or setup broke down
    Failed,
}

impl JobState {
    /// Check if the job has reached a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Succeeded | JobState::Failed)
    }
}

crate::simple_display! {
    JobState {
        Pending => "pending",
        Running => "running",
        Succeeded => "succeeded",
        Failed => "failed",
    }
}

/// Rejected state transition; the job keeps its current state.
///
/// Transitions are monotonic: `Pending -> Running -> {Succeeded, Failed}`,
/// exactly one terminal state per job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("invalid job state transition: {from} -> {to}")]
pub struct TransitionError {
    pub from: JobState,
    pub to: JobState,
}

/// One deploy run: what to deploy, where, and everything it printed.
///
/// The log is append-only accumulated text; every published line lands here
/// with a trailing newline. The record only mutates in memory; persisting it
/// is the [`JobStore`](crate::store::JobStore) collaborator's concern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    /// Project being deployed (names the checkout directory on the target)
    pub project: String,
    /// Deployment environment, e.g. "staging"
    pub environment: String,
    /// Commit reference to deploy
    pub commit: String,
    pub channel: Channel,
    pub state: JobState,
    #[serde(default)]
    pub log: String,
}

impl Job {
    /// Create a pending job; the relay channel is derived from the new ID.
    pub fn new(
        project: impl Into<String>,
        environment: impl Into<String>,
        commit: impl Into<String>,
    ) -> Self {
        let id = JobId::new();
        let channel = Channel::for_job(&id);
        Self {
            id,
            project: project.into(),
            environment: environment.into(),
            commit: commit.into(),
            channel,
            state: JobState::Pending,
            log: String::new(),
        }
    }

    /// Append one line to the log; a trailing newline is added.
    pub fn append_line(&mut self, line: &str) {
        self.log.push_str(line);
        self.log.push('\n');
    }

    /// `Pending -> Running`
    pub fn start(&mut self) -> Result<(), TransitionError> {
        self.transition(JobState::Pending, JobState::Running)
    }

    /// `Running -> Succeeded`
    pub fn succeed(&mut self) -> Result<(), TransitionError> {
        self.transition(JobState::Running, JobState::Succeeded)
    }

    /// `Running -> Failed`
    pub fn fail(&mut self) -> Result<(), TransitionError> {
        self.transition(JobState::Running, JobState::Failed)
    }

    fn transition(&mut self, expected: JobState, to: JobState) -> Result<(), TransitionError> {
        if self.state != expected {
            return Err(TransitionError {
                from: self.state,
                to,
            });
        }
        self.state = to;
        Ok(())
    }
}

crate::builder! {
    pub struct JobBuilder => Job {
        into {
            project: String = "web",
            environment: String = "staging",
            commit: String = "a1b2c3d",
            channel: Channel = "deploy:test",
        }
        computed {
            id: JobId = JobId::new(),
            state: JobState = JobState::Pending,
            log: String = String::new(),
        }
    }
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
