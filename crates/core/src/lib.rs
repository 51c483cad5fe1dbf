// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! sw-core: shared types for the Slipway deploy engine

pub mod macros;

pub mod clock;
pub mod control;
pub mod credential;
pub mod id;
pub mod job;
pub mod store;

pub use clock::{Clock, FakeClock, SystemClock};
pub use control::Control;
pub use credential::{Secret, SessionCredential};
#[cfg(any(test, feature = "test-support"))]
pub use job::JobBuilder;
pub use job::{Channel, Job, JobId, JobState, TransitionError};
pub use store::{JobStore, JobStoreError, MemoryJobStore};
