// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scripted sessions for tests: per-command outcomes, recorded commands and
//! stdin writes.

use crate::session::{
    CommandEvent, CommandSession, ConnectOptions, RunningCommand, SessionError, SessionFactory,
};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Scripted outcome for one spawned command.
#[derive(Debug, Clone)]
pub struct ScriptedCommand {
    stdout: Vec<String>,
    stderr: Vec<String>,
    exit_code: i32,
    delay: Option<Duration>,
    hang: bool,
    close_abruptly: bool,
}

impl ScriptedCommand {
    /// Command that exits zero with no output.
    pub fn succeeding() -> Self {
        Self::exiting(0)
    }

    /// Command that exits with the given code.
    pub fn exiting(code: i32) -> Self {
        Self {
            stdout: Vec::new(),
            stderr: Vec::new(),
            exit_code: code,
            delay: None,
            hang: false,
            close_abruptly: false,
        }
    }

    /// Command that emits its output and then never exits; only an abort ends
    /// it.
    pub fn hanging() -> Self {
        let mut script = Self::succeeding();
        script.hang = true;
        script
    }

    /// Command whose transport dies before reporting an exit.
    pub fn closing() -> Self {
        let mut script = Self::succeeding();
        script.close_abruptly = true;
        script
    }

    /// Add a stdout chunk.
    pub fn stdout(mut self, chunk: impl Into<String>) -> Self {
        self.stdout.push(chunk.into());
        self
    }

    /// Add a stderr chunk.
    pub fn stderr(mut self, chunk: impl Into<String>) -> Self {
        self.stderr.push(chunk.into());
        self
    }

    /// Wait before emitting output or exiting.
    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

#[derive(Debug, Default)]
struct Recorded {
    executed: Vec<String>,
    stdin: Vec<String>,
    last_options: Option<ConnectOptions>,
}

/// Shared recorder: what commands ran, what stdin they received, and the
/// options the factory last connected with.
#[derive(Debug, Clone, Default)]
pub struct FakeRecorder {
    inner: Arc<Mutex<Recorded>>,
}

impl FakeRecorder {
    /// Commands in spawn order.
    pub fn executed(&self) -> Vec<String> {
        self.inner.lock().executed.clone()
    }

    /// Stdin writes in arrival order, across all commands.
    pub fn stdin_writes(&self) -> Vec<String> {
        self.inner.lock().stdin.clone()
    }

    /// Options passed to the most recent `connect`.
    pub fn last_options(&self) -> Option<ConnectOptions> {
        self.inner.lock().last_options.clone()
    }
}

/// [`CommandSession`] that replays scripted outcomes instead of running
/// anything. Commands beyond the script succeed silently.
#[derive(Debug)]
pub struct FakeSession {
    script: Arc<Mutex<VecDeque<ScriptedCommand>>>,
    recorder: FakeRecorder,
    open: bool,
}

impl FakeSession {
    pub fn new(script: Vec<ScriptedCommand>) -> Self {
        Self {
            script: Arc::new(Mutex::new(script.into())),
            recorder: FakeRecorder::default(),
            open: true,
        }
    }

    pub fn recorder(&self) -> FakeRecorder {
        self.recorder.clone()
    }
}

#[async_trait]
impl CommandSession for FakeSession {
    async fn spawn(&mut self, command: &str) -> Result<RunningCommand, SessionError> {
        if !self.open {
            return Err(SessionError::Closed);
        }

        let script = self
            .script
            .lock()
            .pop_front()
            .unwrap_or_else(ScriptedCommand::succeeding);
        self.recorder.inner.lock().executed.push(command.to_string());

        let (event_tx, event_rx) = mpsc::channel(64);
        let (stdin_tx, mut stdin_rx) = mpsc::channel::<String>(8);
        let cancel = CancellationToken::new();

        let recorder = self.recorder.clone();
        let pump_cancel = cancel.clone();
        tokio::spawn(async move {
            let run = async {
                if let Some(delay) = script.delay {
                    tokio::time::sleep(delay).await;
                }
                for chunk in script.stdout {
                    let _ = event_tx.send(CommandEvent::Stdout(chunk)).await;
                }
                for chunk in script.stderr {
                    let _ = event_tx.send(CommandEvent::Stderr(chunk)).await;
                }
                if script.hang {
                    std::future::pending::<()>().await;
                }
                if !script.close_abruptly {
                    let _ = event_tx.send(CommandEvent::Exited(script.exit_code)).await;
                }
                // Dropping event_tx without Exited surfaces as Closed.
            };
            tokio::pin!(run);
            loop {
                tokio::select! {
                    _ = pump_cancel.cancelled() => return,
                    Some(data) = stdin_rx.recv() => {
                        recorder.inner.lock().stdin.push(data);
                    }
                    _ = &mut run => return,
                }
            }
        });

        Ok(RunningCommand::new(event_rx, stdin_tx, cancel))
    }

    fn is_open(&self) -> bool {
        self.open
    }

    async fn close(&mut self) -> Result<(), SessionError> {
        self.open = false;
        Ok(())
    }
}

/// Factory handing out [`FakeSession`]s that share one script and recorder.
#[derive(Clone, Default)]
pub struct FakeFactory {
    script: Arc<Mutex<VecDeque<ScriptedCommand>>>,
    recorder: FakeRecorder,
    connect_error: Option<String>,
}

impl FakeFactory {
    /// Factory whose sessions succeed at everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Factory whose sessions replay the given script in order.
    pub fn with_script(script: Vec<ScriptedCommand>) -> Self {
        Self {
            script: Arc::new(Mutex::new(script.into())),
            ..Self::default()
        }
    }

    /// Factory whose `connect` always fails.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            connect_error: Some(message.into()),
            ..Self::default()
        }
    }

    pub fn recorder(&self) -> FakeRecorder {
        self.recorder.clone()
    }
}

#[async_trait]
impl SessionFactory for FakeFactory {
    type Session = FakeSession;

    async fn connect(&self, options: &ConnectOptions) -> Result<FakeSession, SessionError> {
        self.recorder.inner.lock().last_options = Some(options.clone());
        if let Some(message) = &self.connect_error {
            return Err(SessionError::Connect(message.clone()));
        }
        Ok(FakeSession {
            script: Arc::clone(&self.script),
            recorder: self.recorder.clone(),
            open: true,
        })
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
