// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! sw-relay: line broadcast and control mailbox for deploy jobs

use async_trait::async_trait;
use sw_core::Channel;

pub mod memory;

pub use memory::MemoryRelay;

/// Error from a relay backend.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("relay backend: {0}")]
    Backend(String),
}

/// Fan-out of log lines plus a one-shot control mailbox, keyed by channel.
///
/// `publish` is broadcast with at-most-once delivery: subscribers present at
/// publish time see the line, nobody blocks on missing or slow subscribers.
/// The mailbox holds at most one pending value per channel under the
/// `{channel}:input` key; `put_input` overwrites an unread value and
/// `take_input` consumes atomically, so a stored value is observed at most
/// once. Any external store with pub/sub and atomic get-and-delete can back
/// this trait.
#[async_trait]
pub trait Relay: Send + Sync {
    /// Broadcast one line to the channel's current subscribers.
    async fn publish(&self, channel: &Channel, line: &str) -> Result<(), RelayError>;

    /// Read-and-clear the pending control value, if any.
    async fn take_input(&self, channel: &Channel) -> Result<Option<String>, RelayError>;

    /// Store a control value for the channel, replacing any unread one.
    async fn put_input(&self, channel: &Channel, value: &str) -> Result<(), RelayError>;

    /// Release client resources. Default: nothing to release.
    async fn close(&self) -> Result<(), RelayError> {
        Ok(())
    }
}

// Shared handles delegate, so a session can own `Arc<R>` while observers and
// operators keep using the same backend. `close` stays the no-op default:
// dropping the handle releases this holder's share, and closing the backend
// under the other holders is never a shared handle's call to make.
#[async_trait]
impl<R: Relay + ?Sized> Relay for std::sync::Arc<R> {
    async fn publish(&self, channel: &Channel, line: &str) -> Result<(), RelayError> {
        (**self).publish(channel, line).await
    }

    async fn take_input(&self, channel: &Channel) -> Result<Option<String>, RelayError> {
        (**self).take_input(channel).await
    }

    async fn put_input(&self, channel: &Channel, value: &str) -> Result<(), RelayError> {
        (**self).put_input(channel, value).await
    }
}

#[cfg(test)]
#[path = "relay_tests.rs"]
mod tests;
