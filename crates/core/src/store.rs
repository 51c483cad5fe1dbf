// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Persistence boundary for jobs.

use crate::job::{Job, JobId, JobState, TransitionError};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;

/// Error from a [`JobStore`] backend.
#[derive(Debug, thiserror::Error)]
pub enum JobStoreError {
    #[error(transparent)]
    Transition(#[from] TransitionError),
    #[error("store backend: {0}")]
    Backend(String),
}

/// Where in-flight and finished jobs are persisted.
///
/// The deploy engine mutates the [`Job`] in memory and calls [`save`]
/// (JobStore::save) at control points. The `mark_*` helpers bundle the state
/// transition with the save so a terminal state cannot land unpersisted; a
/// rejected transition returns before anything is written.
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Persist the job's current in-memory state, including its log.
    async fn save(&self, job: &Job) -> Result<(), JobStoreError>;

    /// `Pending -> Running`, persisted.
    async fn mark_running(&self, job: &mut Job) -> Result<(), JobStoreError> {
        job.start()?;
        self.save(job).await
    }

    /// `Running -> Succeeded`, persisted.
    async fn mark_succeeded(&self, job: &mut Job) -> Result<(), JobStoreError> {
        job.succeed()?;
        self.save(job).await
    }

    /// `Running -> Failed`, persisted.
    async fn mark_failed(&self, job: &mut Job) -> Result<(), JobStoreError> {
        job.fail()?;
        self.save(job).await
    }
}

// Shared handles delegate, so a deploy session can own `Arc<S>` while the
// invoking runner keeps a handle on the same store.
#[async_trait]
impl<S: JobStore + ?Sized> JobStore for std::sync::Arc<S> {
    async fn save(&self, job: &Job) -> Result<(), JobStoreError> {
        (**self).save(job).await
    }
}

#[derive(Default)]
struct MemoryStoreInner {
    jobs: HashMap<JobId, Job>,
    saved_states: Vec<JobState>,
}

/// In-memory [`JobStore`] that records every save for inspection.
#[derive(Default)]
pub struct MemoryJobStore {
    inner: Mutex<MemoryStoreInner>,
}

impl MemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last persisted snapshot of the job, if any.
    pub fn get(&self, id: &JobId) -> Option<Job> {
        self.inner.lock().jobs.get(id).cloned()
    }

    /// Job states in save order, one entry per `save` call.
    pub fn saved_states(&self) -> Vec<JobState> {
        self.inner.lock().saved_states.clone()
    }

    pub fn save_count(&self) -> usize {
        self.inner.lock().saved_states.len()
    }
}

#[async_trait]
impl JobStore for MemoryJobStore {
    async fn save(&self, job: &Job) -> Result<(), JobStoreError> {
        let mut inner = self.inner.lock();
        inner.saved_states.push(job.state);
        inner.jobs.insert(job.id.clone(), job.clone());
        Ok(())
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
