// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Local credential agent bootstrap: spawn the helper, wait for its socket.

use crate::config::AgentConfig;
use std::path::PathBuf;
use std::process::Stdio;
use sw_core::{Clock, Secret};
use tokio::process::Command;
use tokio_util::sync::CancellationToken;

/// Error bootstrapping the credential agent.
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    #[error("failed to spawn agent helper: {0}")]
    Spawn(String),
    #[error("agent socket did not appear within {0:?}")]
    StartTimeout(std::time::Duration),
    #[error("stopped while waiting for the agent")]
    Aborted,
}

/// Spawns the helper process and polls for its socket.
///
/// The helper holds the decrypted key material in memory and exposes it via a
/// Unix socket; readiness is the socket path existing. The passphrase travels
/// as a direct argv element, never through a shell string.
pub struct AgentBootstrap<C: Clock> {
    config: AgentConfig,
    clock: C,
}

impl<C: Clock> AgentBootstrap<C> {
    pub fn new(config: AgentConfig, clock: C) -> Self {
        Self { config, clock }
    }

    /// Start the helper and wait for the socket, bounded by the configured
    /// startup timeout and the stop token.
    ///
    /// Returns the socket path resolved through one level of symlink, ready
    /// for agent-forwarded authentication.
    pub async fn start(
        &self,
        passphrase: &Secret,
        stop: &CancellationToken,
    ) -> Result<PathBuf, AgentError> {
        // A socket left over from an earlier run would satisfy the poll
        // before the new helper is ready.
        let _ = tokio::fs::remove_file(&self.config.socket).await;

        let child = Command::new(&self.config.helper)
            .arg(passphrase.expose())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| AgentError::Spawn(e.to_string()))?;

        // Reaper: collect the helper whenever it exits so it cannot zombie.
        let helper = self.config.helper.clone();
        tokio::spawn(async move {
            match child.wait_with_output().await {
                Ok(output) if output.status.success() => {
                    tracing::debug!(helper = %helper.display(), "agent helper exited");
                }
                Ok(output) => {
                    let stderr = String::from_utf8_lossy(&output.stderr);
                    tracing::warn!(
                        helper = %helper.display(),
                        exit_status = %output.status,
                        stderr = %stderr,
                        "agent helper exited"
                    );
                }
                Err(e) => {
                    tracing::error!(helper = %helper.display(), error = %e, "failed to wait on agent helper");
                }
            }
        });

        tracing::info!(
            helper = %self.config.helper.display(),
            socket = %self.config.socket.display(),
            "agent helper spawned"
        );
        self.wait_for_socket(stop).await
    }

    async fn wait_for_socket(&self, stop: &CancellationToken) -> Result<PathBuf, AgentError> {
        let timeout = self.config.startup_timeout();
        let started = self.clock.now();

        loop {
            if stop.is_cancelled() {
                return Err(AgentError::Aborted);
            }
            if self.config.socket.exists() {
                let resolved = match tokio::fs::read_link(&self.config.socket).await {
                    Ok(target) => target,
                    Err(_) => self.config.socket.clone(),
                };
                tracing::info!(socket = %resolved.display(), "agent socket ready");
                return Ok(resolved);
            }
            if self.clock.now().duration_since(started) >= timeout {
                tracing::error!(
                    socket = %self.config.socket.display(),
                    ?timeout,
                    "agent socket never appeared"
                );
                return Err(AgentError::StartTimeout(timeout));
            }
            tokio::select! {
                _ = stop.cancelled() => return Err(AgentError::Aborted),
                _ = tokio::time::sleep(self.config.poll_interval()) => {}
            }
        }
    }
}

#[cfg(test)]
#[path = "agent_tests.rs"]
mod tests;
