// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-process relay backend over tokio broadcast channels.

use crate::{Relay, RelayError};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use sw_core::Channel;
use tokio::sync::broadcast;

/// Buffered lines per topic. Subscribers that fall further behind lose the
/// oldest lines, consistent with at-most-once delivery.
const TOPIC_CAPACITY: usize = 256;

#[derive(Default)]
struct MemoryRelayInner {
    topics: HashMap<String, broadcast::Sender<String>>,
    mailboxes: HashMap<String, String>,
}

/// In-memory [`Relay`]: a per-channel `tokio::sync::broadcast` topic plus a
/// mutexed mailbox map. Process-local stand-in for an external pub/sub store;
/// tests and single-node embeddings use it directly.
#[derive(Default)]
pub struct MemoryRelay {
    inner: Mutex<MemoryRelayInner>,
}

impl MemoryRelay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to a channel's line broadcast.
    ///
    /// Creates the topic if nobody published yet, so subscribing before the
    /// deploy session starts cannot miss lines.
    pub fn subscribe(&self, channel: &Channel) -> broadcast::Receiver<String> {
        self.sender(channel).subscribe()
    }

    fn sender(&self, channel: &Channel) -> broadcast::Sender<String> {
        let mut inner = self.inner.lock();
        inner
            .topics
            .entry(channel.as_str().to_string())
            .or_insert_with(|| broadcast::channel(TOPIC_CAPACITY).0)
            .clone()
    }
}

#[async_trait]
impl Relay for MemoryRelay {
    async fn publish(&self, channel: &Channel, line: &str) -> Result<(), RelayError> {
        // A send error only means nobody is subscribed right now.
        let _ = self.sender(channel).send(line.to_string());
        Ok(())
    }

    async fn take_input(&self, channel: &Channel) -> Result<Option<String>, RelayError> {
        Ok(self.inner.lock().mailboxes.remove(&channel.input_key()))
    }

    async fn put_input(&self, channel: &Channel, value: &str) -> Result<(), RelayError> {
        self.inner
            .lock()
            .mailboxes
            .insert(channel.input_key(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;
