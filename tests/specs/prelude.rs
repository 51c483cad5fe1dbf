// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared harness for the deploy specs.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use sw_core::{Job, MemoryJobStore, SystemClock};
use sw_engine::{
    DeployConfig, DeployError, DeployHandle, DeployReport, DeploySession, RecordingObserver,
    TargetConfig, TimingConfig,
};
use sw_exec::LocalFactory;
use sw_relay::{MemoryRelay, Relay as _};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

pub use sw_core::JobState;
pub use sw_engine::DeployOutcome;

pub const SPEC_WAIT: Duration = Duration::from_secs(10);

fn init_tracing() {
    // One subscriber for the whole test binary; later calls are no-ops.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn spec_config() -> DeployConfig {
    DeployConfig {
        target: TargetConfig {
            host: "localhost".into(),
            user: "deployer".into(),
            port: 2222,
            forward_agent: true,
            key_file: None,
            key_data: None,
        },
        agent: None,
        timing: TimingConfig {
            subscriber_grace_ms: 5,
            input_poll_ms: 5,
            tick_ms: 5,
        },
    }
}

/// One in-flight deployment running real local processes.
pub struct Deploy {
    pub relay: Arc<MemoryRelay>,
    pub store: Arc<MemoryJobStore>,
    pub job: Job,
    pub observer: RecordingObserver,
    pub handle: DeployHandle,
    lines: broadcast::Receiver<String>,
    task: JoinHandle<Result<DeployReport, DeployError>>,
}

impl Deploy {
    /// Start a deploy that runs `commands` instead of the remote template.
    pub fn start(commands: &[&str]) -> Self {
        Self::start_in(commands, None)
    }

    /// Start a deploy whose commands run in the given working directory.
    pub fn start_in(commands: &[&str], cwd: Option<&Path>) -> Self {
        init_tracing();

        let relay = Arc::new(MemoryRelay::new());
        let store = Arc::new(MemoryJobStore::new());
        let job = Job::builder().build();
        let lines = relay.subscribe(&job.channel);
        let observer = RecordingObserver::new();
        let factory = match cwd {
            Some(dir) => LocalFactory::with_cwd(dir),
            None => LocalFactory::new(),
        };

        let session = DeploySession::new(
            job.clone(),
            spec_config(),
            factory,
            Arc::clone(&relay),
            Arc::clone(&store),
            SystemClock,
        )
        .with_observer(observer.clone())
        .override_commands(commands.iter().map(|s| s.to_string()).collect());
        let handle = session.handle();
        let task = tokio::spawn(session.run());

        Self {
            relay,
            store,
            job,
            observer,
            handle,
            lines,
            task,
        }
    }

    /// Next line broadcast on the job's channel.
    pub async fn next_line(&mut self) -> String {
        tokio::time::timeout(SPEC_WAIT, self.lines.recv())
            .await
            .expect("timed out waiting for a broadcast line")
            .expect("broadcast channel closed")
    }

    /// Wait for the prompt, then answer it.
    pub async fn send_passphrase(&mut self, value: &str) {
        let prompt = self.next_line().await;
        assert_eq!(prompt, "Please enter your passphrase:");
        self.relay.put_input(&self.job.channel, value).await.unwrap();
    }

    /// Wait for the run to end.
    pub async fn finish(self) -> Result<DeployReport, DeployError> {
        tokio::time::timeout(SPEC_WAIT, self.task)
            .await
            .expect("deploy did not finish")
            .expect("deploy task panicked")
    }
}
