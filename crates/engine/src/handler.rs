// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The executor-facing side of a deploy: line fan-out and the tick verdict.

use crate::output::{self, LineObserver, ERR_PREFIX};
use async_trait::async_trait;
use sw_core::{Control, Job, JobStore};
use sw_exec::ExecHandler;
use sw_relay::Relay;
use tokio_util::sync::CancellationToken;

/// [`ExecHandler`] wiring command output and ticks into one running job.
///
/// Output chunks become trimmed, blank-free lines fanned out to the job log,
/// the relay channel, and the observer; stderr lines carry the `**ERR`
/// marker. Each tick checks the stop token, persists the job if its log grew
/// since the last save, and otherwise drains one pending relay input for the
/// running command's stdin.
pub(crate) struct DeployHandler<'a> {
    job: &'a mut Job,
    relay: &'a dyn Relay,
    store: &'a dyn JobStore,
    observer: &'a mut dyn LineObserver,
    stop: &'a CancellationToken,
    persisted_len: usize,
}

impl<'a> DeployHandler<'a> {
    pub(crate) fn new(
        job: &'a mut Job,
        relay: &'a dyn Relay,
        store: &'a dyn JobStore,
        observer: &'a mut dyn LineObserver,
        stop: &'a CancellationToken,
    ) -> Self {
        let persisted_len = job.log.len();
        Self {
            job,
            relay,
            store,
            observer,
            stop,
            persisted_len,
        }
    }

    async fn emit_chunk(&mut self, chunk: &str, prefix: Option<&str>) {
        for line in output::split_lines(chunk) {
            let line = match prefix {
                Some(prefix) => format!("{prefix}{line}"),
                None => line,
            };
            output::emit_line(self.job, self.relay, self.observer, &line).await;
        }
    }
}

#[async_trait]
impl ExecHandler for DeployHandler<'_> {
    async fn on_output(&mut self, chunk: &str) {
        self.emit_chunk(chunk, None).await;
    }

    async fn on_error_output(&mut self, chunk: &str) {
        self.emit_chunk(chunk, Some(ERR_PREFIX)).await;
    }

    async fn on_tick(&mut self) -> Control {
        if self.stop.is_cancelled() {
            return Control::Stop;
        }

        // The log only grows, so length is the dirty check.
        if self.job.log.len() != self.persisted_len {
            match self.store.save(self.job).await {
                Ok(()) => self.persisted_len = self.job.log.len(),
                // Log streaming must not kill the run; retried next tick.
                Err(err) => {
                    tracing::warn!(job_id = %self.job.id, error = %err, "mid-run save failed");
                }
            }
            return Control::Continue;
        }

        match self.relay.take_input(&self.job.channel).await {
            Ok(Some(value)) => Control::Input(value),
            Ok(None) => Control::Continue,
            Err(err) => {
                tracing::warn!(job_id = %self.job.id, error = %err, "relay input poll failed");
                Control::Continue
            }
        }
    }
}

#[cfg(test)]
#[path = "handler_tests.rs"]
mod tests;
