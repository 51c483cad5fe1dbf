// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! sw-exec: command sessions and the ordered shell executor

pub mod executor;
pub mod local;
pub mod session;
pub mod ssh;

#[cfg(any(test, feature = "test-support"))]
pub mod fake;

pub use executor::{ExecHandler, ShellExecutor, DEFAULT_TICK_INTERVAL};
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeFactory, FakeRecorder, FakeSession, ScriptedCommand};
pub use local::{LocalFactory, LocalSession};
pub use session::{
    CommandEvent, CommandSession, ConnectOptions, RunningCommand, SessionError, SessionFactory,
    DEFAULT_PORT,
};
pub use ssh::{SshFactory, SshSession};
