// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! One deployment end-to-end: credential handshake, agent bootstrap,
//! connect, execute, finalize.

use crate::agent::{AgentBootstrap, AgentError};
use crate::commands;
use crate::config::DeployConfig;
use crate::handler::DeployHandler;
use crate::output::{self, LineObserver, TracingObserver};
use sw_core::{Clock, Job, JobId, JobStore, JobStoreError, Secret, SessionCredential};
use sw_exec::{
    CommandSession, ConnectOptions, SessionError, SessionFactory, ShellExecutor,
};
use sw_relay::Relay;
use tokio_util::sync::CancellationToken;

/// First line published on the job's channel; answered via the mailbox.
pub const PASSPHRASE_PROMPT: &str = "Please enter your passphrase:";
/// Terminal line for every stop-requested path.
pub const STOPPED_LINE: &str = "Deploy stopped.";
/// Terminal line when the credential agent never came up.
pub const AGENT_FAILED_LINE: &str = "SSH Agent failed to start.";

/// Error a deploy run surfaces to its caller.
///
/// Command failures do not show up here; they are recovered into the job log
/// and a `Failed` outcome. Only session establishment and persistence of the
/// job record itself propagate.
#[derive(Debug, thiserror::Error)]
pub enum DeployError {
    #[error("job store: {0}")]
    Store(#[from] JobStoreError),
    #[error("connection failed: {0}")]
    Connect(#[from] SessionError),
}

/// How a deploy run ended. `Stopped` persists as a failed job with its own
/// log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeployOutcome {
    Succeeded,
    Failed,
    Stopped,
}

sw_core::simple_display! {
    DeployOutcome {
        Succeeded => "succeeded",
        Failed => "failed",
        Stopped => "stopped",
    }
}

/// Outcome plus the finalized job record (state and accumulated log).
#[derive(Debug)]
pub struct DeployReport {
    pub outcome: DeployOutcome,
    pub job: Job,
}

/// Cloneable stop control for a running deploy.
///
/// `stop` only ever trips the sticky flag: safe from any thread, safe to call
/// repeatedly, a no-op once the run has finished or if it never starts.
#[derive(Debug, Clone)]
pub struct DeployHandle {
    job_id: JobId,
    cancel: CancellationToken,
}

impl DeployHandle {
    /// Request a cooperative stop; observed at the session's next tick.
    pub fn stop(&self) {
        if self.cancel.is_cancelled() {
            return;
        }
        tracing::info!(job_id = %self.job_id, "deploy stop requested");
        self.cancel.cancel();
    }

    pub fn is_stop_requested(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

/// Position in the deploy state machine, for tracing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Init,
    AwaitingCredential,
    AgentBootstrap,
    Connecting,
    Executing,
}

sw_core::simple_display! {
    Phase {
        Init => "init",
        AwaitingCredential => "awaiting_credential",
        AgentBootstrap => "agent_bootstrap",
        Connecting => "connecting",
        Executing => "executing",
    }
}

/// Drives one job from `Pending` to exactly one terminal state.
///
/// `Init -> AwaitingCredential -> (AgentBootstrap?) -> Connecting ->
/// Executing -> {Succeeded | Failed}`, with `Stopped` reachable from every
/// waiting phase via [`DeployHandle::stop`]. Single-flight per job is the
/// invoking scheduler's responsibility; this type assumes it is the only
/// writer to its job.
pub struct DeploySession<F, R, S, C>
where
    F: SessionFactory,
    R: Relay,
    S: JobStore,
    C: Clock,
{
    job: Job,
    config: DeployConfig,
    factory: F,
    relay: R,
    store: S,
    clock: C,
    observer: Box<dyn LineObserver>,
    cancel: CancellationToken,
    #[cfg(any(test, feature = "test-support"))]
    command_override: Option<Vec<String>>,
}

impl<F, R, S, C> DeploySession<F, R, S, C>
where
    F: SessionFactory,
    R: Relay,
    S: JobStore,
    C: Clock,
{
    pub fn new(job: Job, config: DeployConfig, factory: F, relay: R, store: S, clock: C) -> Self {
        Self {
            job,
            config,
            factory,
            relay,
            store,
            clock,
            observer: Box::new(TracingObserver),
            cancel: CancellationToken::new(),
            #[cfg(any(test, feature = "test-support"))]
            command_override: None,
        }
    }

    /// Replace the operational-log mirror.
    pub fn with_observer(mut self, observer: impl LineObserver + 'static) -> Self {
        self.observer = Box::new(observer);
        self
    }

    /// Run these commands instead of the deploy template, so specs can drive
    /// real processes with harmless commands.
    #[cfg(any(test, feature = "test-support"))]
    pub fn override_commands(mut self, commands: Vec<String>) -> Self {
        self.command_override = Some(commands);
        self
    }

    /// Stop control; valid before, during, and after the run.
    pub fn handle(&self) -> DeployHandle {
        DeployHandle {
            job_id: self.job.id.clone(),
            cancel: self.cancel.clone(),
        }
    }

    /// Drive the deployment to its terminal state.
    ///
    /// The job is finalized (exactly one terminal transition, persisted)
    /// before any error is returned; a `Connect` error therefore reaches the
    /// caller with the job already marked failed.
    pub async fn run(mut self) -> Result<DeployReport, DeployError> {
        self.enter(Phase::Init);
        self.store.mark_running(&mut self.job).await?;

        // Grace period so a subscriber attaching on job start sees the
        // prompt; a UX accommodation, not a correctness requirement.
        tokio::time::sleep(self.config.timing.subscriber_grace()).await;
        self.emit(PASSPHRASE_PROMPT).await;
        self.store.save(&self.job).await?;

        let result = self.deploy().await;
        let outcome = match &result {
            Ok(outcome) => *outcome,
            Err(_) => DeployOutcome::Failed,
        };
        self.finalize(outcome).await?;
        result?;
        Ok(DeployReport {
            outcome,
            job: self.job,
        })
    }

    async fn deploy(&mut self) -> Result<DeployOutcome, DeployError> {
        self.enter(Phase::AwaitingCredential);
        let passphrase = match self.await_credential().await {
            Some(passphrase) => passphrase,
            None => return Ok(self.stopped().await),
        };
        tracing::info!(job_id = %self.job.id, "passphrase received, continuing deploy");

        let mut credential = SessionCredential::new(passphrase);
        if let Some(pem) = &self.config.target.key_data {
            credential = credential.key_data(pem.clone());
        }

        if let Some(agent_config) = self.config.agent.clone() {
            self.enter(Phase::AgentBootstrap);
            let bootstrap = AgentBootstrap::new(agent_config, self.clock.clone());
            match bootstrap.start(&credential.passphrase, &self.cancel).await {
                Ok(socket) => credential = credential.agent_socket(socket),
                Err(AgentError::Aborted) => return Ok(self.stopped().await),
                Err(err) => {
                    tracing::error!(job_id = %self.job.id, error = %err, "agent bootstrap failed");
                    self.emit(AGENT_FAILED_LINE).await;
                    return Ok(DeployOutcome::Failed);
                }
            }
        }

        self.enter(Phase::Connecting);
        let options = ConnectOptions::new(
            self.config.target.host.clone(),
            self.config.target.user.clone(),
            credential,
        )
        .port(self.config.target.port)
        .forward_agent(self.config.target.forward_agent);

        let mut session = match self.factory.connect(&options).await {
            Ok(session) => session,
            Err(err) => {
                tracing::error!(job_id = %self.job.id, error = %err, "connect failed");
                let line = format!("Failed to connect to {}.", self.config.target.host);
                self.emit(&line).await;
                return Err(DeployError::Connect(err));
            }
        };

        self.enter(Phase::Executing);
        let commands = self.commands();
        let executor = ShellExecutor::new().tick_interval(self.config.timing.tick_interval());
        let success = {
            let mut handler = DeployHandler::new(
                &mut self.job,
                &self.relay,
                &self.store,
                self.observer.as_mut(),
                &self.cancel,
            );
            executor.execute(&mut session, &commands, &mut handler).await
        };
        if let Err(err) = session.close().await {
            tracing::debug!(job_id = %self.job.id, error = %err, "session close failed");
        }

        if success {
            Ok(DeployOutcome::Succeeded)
        } else if self.cancel.is_cancelled() {
            Ok(self.stopped().await)
        } else {
            Ok(DeployOutcome::Failed)
        }
    }

    /// Wait for the operator's passphrase. Unbounded by design; only a stop
    /// request ends it early (`None`).
    async fn await_credential(&mut self) -> Option<Secret> {
        loop {
            if self.cancel.is_cancelled() {
                return None;
            }
            match self.relay.take_input(&self.job.channel).await {
                Ok(Some(value)) => return Some(Secret::new(value)),
                Ok(None) => {}
                Err(err) => {
                    tracing::warn!(job_id = %self.job.id, error = %err, "relay input poll failed");
                }
            }
            tokio::select! {
                _ = self.cancel.cancelled() => return None,
                _ = tokio::time::sleep(self.config.timing.input_poll()) => {}
            }
        }
    }

    async fn stopped(&mut self) -> DeployOutcome {
        tracing::info!(job_id = %self.job.id, "deploy stopped");
        self.emit(STOPPED_LINE).await;
        DeployOutcome::Stopped
    }

    /// The single terminal transition for this run.
    async fn finalize(&mut self, outcome: DeployOutcome) -> Result<(), DeployError> {
        let result = match outcome {
            DeployOutcome::Succeeded => self.store.mark_succeeded(&mut self.job).await,
            DeployOutcome::Failed | DeployOutcome::Stopped => {
                self.store.mark_failed(&mut self.job).await
            }
        };
        if let Err(err) = self.relay.close().await {
            tracing::warn!(job_id = %self.job.id, error = %err, "relay close failed");
        }
        tracing::info!(
            job_id = %self.job.id,
            outcome = %outcome,
            state = %self.job.state,
            "deploy finished"
        );
        result.map_err(DeployError::Store)
    }

    async fn emit(&mut self, line: &str) {
        output::emit_line(&mut self.job, &self.relay, self.observer.as_mut(), line).await;
    }

    fn commands(&self) -> Vec<String> {
        #[cfg(any(test, feature = "test-support"))]
        if let Some(commands) = &self.command_override {
            return commands.clone();
        }
        commands::deploy_commands(&self.job)
    }

    fn enter(&self, phase: Phase) {
        tracing::debug!(job_id = %self.job.id, phase = %phase, "deploy phase");
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
