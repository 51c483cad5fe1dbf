// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session boundary: one open connection, commands spawned on it.

use async_trait::async_trait;
use sw_core::SessionCredential;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Remote service port used when none is configured.
pub const DEFAULT_PORT: u16 = 2222;

/// Error from session transports.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("connect failed: {0}")]
    Connect(String),
    #[error("authentication failed for {user}@{host}")]
    Auth { user: String, host: String },
    #[error("failed to spawn command: {0}")]
    Spawn(String),
    #[error("session closed")]
    Closed,
    #[error("stdin rejected: {0}")]
    Stdin(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Where and how to open a session.
#[derive(Debug, Clone)]
pub struct ConnectOptions {
    pub host: String,
    pub port: u16,
    pub user: String,
    /// Ask the transport to forward the credential agent into the session.
    pub forward_agent: bool,
    pub credential: SessionCredential,
}

impl ConnectOptions {
    pub fn new(
        host: impl Into<String>,
        user: impl Into<String>,
        credential: SessionCredential,
    ) -> Self {
        Self {
            host: host.into(),
            port: DEFAULT_PORT,
            user: user.into(),
            forward_agent: true,
            credential,
        }
    }

    sw_core::setters! {
        set {
            port: u16,
            forward_agent: bool,
        }
    }
}

/// One demultiplexed observation from a running command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandEvent {
    /// Raw stdout chunk; may be a partial line or several lines.
    Stdout(String),
    /// Raw stderr chunk.
    Stderr(String),
    /// Process finished; always the last event, after all of its output.
    Exited(i32),
    /// Transport died before the command reported an exit.
    Closed,
}

/// Handle on one spawned command.
///
/// Events arrive demultiplexed and in order. Dropping or aborting the handle
/// stops the local pump; the remote process is not guaranteed to be killed,
/// only local waiting ends.
#[derive(Debug)]
pub struct RunningCommand {
    events: mpsc::Receiver<CommandEvent>,
    stdin_tx: mpsc::Sender<String>,
    cancel: CancellationToken,
}

impl RunningCommand {
    /// Pair a transport's pump task with a handle. The pump sends events on
    /// `events`, consumes `stdin_tx`'s receiver, and stops when `cancel`
    /// trips.
    pub fn new(
        events: mpsc::Receiver<CommandEvent>,
        stdin_tx: mpsc::Sender<String>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            events,
            stdin_tx,
            cancel,
        }
    }

    /// Next event from the command; `Closed` if the pump went away.
    pub async fn next_event(&mut self) -> CommandEvent {
        self.events.recv().await.unwrap_or(CommandEvent::Closed)
    }

    /// Queue data for the command's stdin.
    pub async fn send_stdin(&self, data: &str) -> Result<(), SessionError> {
        self.stdin_tx
            .send(data.to_string())
            .await
            .map_err(|_| SessionError::Stdin("command is no longer accepting input".into()))
    }

    /// Abandon the command without waiting for it to finish.
    pub fn abort(self) {
        self.cancel.cancel();
    }
}

impl Drop for RunningCommand {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// One open session to a target; commands spawn on it one at a time.
#[async_trait]
pub trait CommandSession: Send {
    /// Start a command on this session.
    async fn spawn(&mut self, command: &str) -> Result<RunningCommand, SessionError>;

    /// Whether the underlying connection is still usable.
    fn is_open(&self) -> bool;

    /// Tear down the connection.
    async fn close(&mut self) -> Result<(), SessionError>;
}

/// Opens sessions: the only seam a connection failure can come out of.
#[async_trait]
pub trait SessionFactory: Send + Sync {
    type Session: CommandSession + Send;

    async fn connect(&self, options: &ConnectOptions) -> Result<Self::Session, SessionError>;
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
