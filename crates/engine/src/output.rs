// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Line pipeline: chunk splitting and the fan-out of each published line.

use sw_core::{Job, JobId};
use sw_relay::Relay;

/// Marker prefixed to every stderr-derived line.
pub const ERR_PREFIX: &str = "**ERR";

/// Split a raw output chunk into publishable lines.
///
/// Line breaks are any of `\r\n`, `\r`, `\n`; leading whitespace is stripped
/// and blank lines dropped. Splitting on the two characters individually is
/// equivalent to splitting on the three break forms once blanks are rejected.
pub fn split_lines(chunk: &str) -> Vec<String> {
    chunk
        .split(['\r', '\n'])
        .map(str::trim_start)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Secondary listener on the line event stream.
///
/// Every line a deploy publishes is mirrored here after it lands in the job
/// log and on the relay. The default observer forwards to the operational
/// log; tests record.
pub trait LineObserver: Send {
    fn observe(&mut self, job_id: &JobId, line: &str);
}

/// Default observer: mirrors each line to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl LineObserver for TracingObserver {
    fn observe(&mut self, job_id: &JobId, line: &str) {
        tracing::info!(job_id = %job_id, "{line}");
    }
}

/// Fan one line out: append to the job log, broadcast on the job's channel,
/// mirror to the observer. A relay failure must not kill the deploy, so it is
/// traced and swallowed here.
pub(crate) async fn emit_line(
    job: &mut Job,
    relay: &dyn Relay,
    observer: &mut dyn LineObserver,
    line: &str,
) {
    job.append_line(line);
    if let Err(err) = relay.publish(&job.channel, line).await {
        tracing::warn!(job_id = %job.id, error = %err, "relay publish failed");
    }
    observer.observe(&job.id, line);
}

/// Observer that records every line, for assertions.
#[cfg(any(test, feature = "test-support"))]
#[derive(Debug, Clone, Default)]
pub struct RecordingObserver {
    lines: std::sync::Arc<parking_lot::Mutex<Vec<String>>>,
}

#[cfg(any(test, feature = "test-support"))]
impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().clone()
    }
}

#[cfg(any(test, feature = "test-support"))]
impl LineObserver for RecordingObserver {
    fn observe(&mut self, _job_id: &JobId, line: &str) {
        self.lines.lock().push(line.to_string());
    }
}

#[cfg(test)]
#[path = "output_tests.rs"]
mod tests;
