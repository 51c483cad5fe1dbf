// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! sw-engine: the deploy session orchestrator.
//!
//! Composes the relay, the job store, and the shell executor into one
//! end-to-end deployment: credential handshake over the relay, optional
//! ssh-agent bootstrap, remote session, the fixed command sequence, and
//! exactly one terminal job transition.

pub mod agent;
pub mod commands;
pub mod config;
mod handler;
pub mod output;
pub mod session;

pub use agent::{AgentBootstrap, AgentError};
pub use commands::{deploy_commands, parameterize};
pub use config::{AgentConfig, ConfigError, DeployConfig, TargetConfig, TimingConfig};
#[cfg(any(test, feature = "test-support"))]
pub use output::RecordingObserver;
pub use output::{LineObserver, TracingObserver, ERR_PREFIX};
pub use session::{DeployError, DeployHandle, DeployOutcome, DeployReport, DeploySession};
