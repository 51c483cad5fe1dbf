// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Local process sessions: commands run through `sh -c` on this host.

use crate::session::{
    CommandEvent, CommandSession, ConnectOptions, RunningCommand, SessionError, SessionFactory,
};
use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::process::{Child, Command};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

const READ_BUF_SIZE: usize = 8192;

/// Session that runs commands as local child processes.
///
/// Fills the [`CommandSession`] seam for tests and for deploys targeting the
/// host the engine itself runs on; no credentials involved. Unlike remote
/// sessions, aborting a command kills the local child.
pub struct LocalSession {
    cwd: Option<PathBuf>,
    open: bool,
}

impl LocalSession {
    pub fn new() -> Self {
        Self {
            cwd: None,
            open: true,
        }
    }

    /// Run commands with the given working directory.
    pub fn with_cwd(dir: impl Into<PathBuf>) -> Self {
        Self {
            cwd: Some(dir.into()),
            open: true,
        }
    }
}

impl Default for LocalSession {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CommandSession for LocalSession {
    async fn spawn(&mut self, command: &str) -> Result<RunningCommand, SessionError> {
        if !self.open {
            return Err(SessionError::Closed);
        }

        let mut cmd = Command::new("sh");
        cmd.arg("-c")
            .arg(command)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = &self.cwd {
            cmd.current_dir(dir);
        }

        let mut child = cmd
            .spawn()
            .map_err(|e| SessionError::Spawn(format!("failed to spawn `sh -c`: {e}")))?;

        let (event_tx, event_rx) = mpsc::channel(64);
        let (stdin_tx, stdin_rx) = mpsc::channel(8);
        let cancel = CancellationToken::new();

        let stdout_task = child
            .stdout
            .take()
            .map(|out| tokio::spawn(pump_stream(out, event_tx.clone(), CommandEvent::Stdout)));
        let stderr_task = child
            .stderr
            .take()
            .map(|err| tokio::spawn(pump_stream(err, event_tx.clone(), CommandEvent::Stderr)));

        tokio::spawn(drive_child(
            child,
            stdin_rx,
            event_tx,
            cancel.clone(),
            stdout_task,
            stderr_task,
        ));

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

/// Forward raw read chunks as demultiplexed events until EOF.
async fn pump_stream<R>(
    mut reader: R,
    tx: mpsc::Sender<CommandEvent>,
    wrap: fn(String) -> CommandEvent,
) where
    R: tokio::io::AsyncRead + Unpin + Send,
{
    let mut buf = [0u8; READ_BUF_SIZE];
    loop {
        match reader.read(&mut buf).await {
            Ok(0) | Err(_) => break,
            Ok(n) => {
                let chunk = String::from_utf8_lossy(&buf[..n]).into_owned();
                if tx.send(wrap(chunk)).await.is_err() {
                    break;
                }
            }
        }
    }
}

/// Own the child: feed stdin, wait for exit, kill on cancel. `Exited` is sent
/// only after both output pumps drained to EOF, keeping it the last event.
async fn drive_child(
    mut child: Child,
    mut stdin_rx: mpsc::Receiver<String>,
    event_tx: mpsc::Sender<CommandEvent>,
    cancel: CancellationToken,
    stdout_task: Option<JoinHandle<()>>,
    stderr_task: Option<JoinHandle<()>>,
) {
    // Keep our stdin handle out of `wait()`'s reach so mid-command input
    // still works while the process runs.
    let mut stdin = child.stdin.take();

    let code = loop {
        tokio::select! {
            status = child.wait() => {
                break status.ok().and_then(|s| s.code()).unwrap_or(-1);
            }
            Some(data) = stdin_rx.recv() => {
                if let Some(pipe) = stdin.as_mut() {
                    let _ = pipe.write_all(data.as_bytes()).await;
                    let _ = pipe.flush().await;
                }
            }
            _ = cancel.cancelled() => {
                let _ = child.start_kill();
                let _ = child.wait().await;
                return;
            }
        }
    };

    if let Some(task) = stdout_task {
        let _ = task.await;
    }
    if let Some(task) = stderr_task {
        let _ = task.await;
    }
    let _ = event_tx.send(CommandEvent::Exited(code)).await;
}

/// Factory handing out [`LocalSession`]s; the target host in the options is
/// ignored, this is the localhost short-circuit.
#[derive(Clone, Default)]
pub struct LocalFactory {
    cwd: Option<PathBuf>,
}

impl LocalFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sessions start commands in the given working directory.
    pub fn with_cwd(dir: impl Into<PathBuf>) -> Self {
        Self {
            cwd: Some(dir.into()),
        }
    }
}

#[async_trait]
impl SessionFactory for LocalFactory {
    type Session = LocalSession;

    async fn connect(&self, options: &ConnectOptions) -> Result<LocalSession, SessionError> {
        tracing::debug!(host = %options.host, "opening local session");
        Ok(match &self.cwd {
            Some(dir) => LocalSession::with_cwd(dir.clone()),
            None => LocalSession::new(),
        })
    }
}

#[cfg(test)]
#[path = "local_tests.rs"]
mod tests;
