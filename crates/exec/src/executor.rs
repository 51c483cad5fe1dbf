// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Ordered, fail-fast command execution over one open session.

use crate::session::{CommandEvent, CommandSession, SessionError};
use async_trait::async_trait;
use std::time::Duration;
use sw_core::Control;

/// Pause between control ticks while a command stays quiet.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(100);

/// Callbacks driven by [`ShellExecutor::execute`].
///
/// Output arrives as raw chunks that may span partial or multiple lines; line
/// handling is the caller's concern. `on_tick` runs once per scheduler cycle
/// while a command is in flight, so a stop request is observed within one
/// cycle even when the command never prints.
#[async_trait]
pub trait ExecHandler: Send {
    async fn on_output(&mut self, chunk: &str);
    async fn on_error_output(&mut self, chunk: &str);
    async fn on_tick(&mut self) -> Control;
}

enum CommandOutcome {
    Exited(i32),
    Aborted,
    SpawnFailed(SessionError),
}

/// Runs a command sequence in order, stopping at the first failure.
#[derive(Debug, Clone)]
pub struct ShellExecutor {
    tick_interval: Duration,
}

impl Default for ShellExecutor {
    fn default() -> Self {
        Self {
            tick_interval: DEFAULT_TICK_INTERVAL,
        }
    }
}

impl ShellExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    sw_core::setters! {
        set {
            tick_interval: Duration,
        }
    }

    /// Run `commands` in order on `session`.
    ///
    /// Returns true only if every command exited zero. A nonzero exit, a
    /// spawn failure, a dead transport, or a `Stop` verdict synthesizes a
    /// `Failed to execute "{command}"` line through `on_error_output` and
    /// returns false without starting later commands. An empty sequence is
    /// vacuously true.
    pub async fn execute<S, H>(&self, session: &mut S, commands: &[String], handler: &mut H) -> bool
    where
        S: CommandSession,
        H: ExecHandler,
    {
        for command in commands {
            tracing::debug!(%command, "running deploy command");
            match self.run_command(session, command, handler).await {
                CommandOutcome::Exited(0) => {}
                CommandOutcome::Exited(code) => {
                    tracing::debug!(%command, code, "command failed");
                    handler.on_error_output(&failure_line(command)).await;
                    return false;
                }
                CommandOutcome::Aborted => {
                    tracing::debug!(%command, "command abandoned by stop request");
                    handler.on_error_output(&failure_line(command)).await;
                    return false;
                }
                CommandOutcome::SpawnFailed(err) => {
                    tracing::debug!(%command, error = %err, "command spawn failed");
                    handler.on_error_output(&format!("{err}\n")).await;
                    handler.on_error_output(&failure_line(command)).await;
                    return false;
                }
            }
        }
        true
    }

    async fn run_command<S, H>(
        &self,
        session: &mut S,
        command: &str,
        handler: &mut H,
    ) -> CommandOutcome
    where
        S: CommandSession,
        H: ExecHandler,
    {
        let mut running = match session.spawn(command).await {
            Ok(running) => running,
            Err(err) => return CommandOutcome::SpawnFailed(err),
        };

        loop {
            match handler.on_tick().await {
                Control::Continue => {}
                Control::Stop => {
                    running.abort();
                    return CommandOutcome::Aborted;
                }
                Control::Input(value) => {
                    // Stdin may already be gone; that only matters if the
                    // command still expected the value.
                    if let Err(err) = running.send_stdin(&format!("{value}\n")).await {
                        tracing::warn!(%command, error = %err, "stdin write failed");
                    }
                }
            }

            match tokio::time::timeout(self.tick_interval, running.next_event()).await {
                // Quiet cycle: no event within the tick interval, tick again.
                Err(_) => {}
                Ok(CommandEvent::Stdout(chunk)) => handler.on_output(&chunk).await,
                Ok(CommandEvent::Stderr(chunk)) => handler.on_error_output(&chunk).await,
                Ok(CommandEvent::Exited(code)) => return CommandOutcome::Exited(code),
                Ok(CommandEvent::Closed) => {
                    tracing::warn!(%command, "session closed mid-command");
                    return CommandOutcome::Exited(-1);
                }
            }
        }
    }
}

/// Line announcing a failed or abandoned command.
fn failure_line(command: &str) -> String {
    format!("Failed to execute \"{command}\"\n")
}

#[cfg(test)]
#[path = "executor_tests.rs"]
mod tests;
