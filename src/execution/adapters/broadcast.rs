//! Per-user progress channels backed by `tokio::sync::broadcast`.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tokio::sync::broadcast;

use crate::execution::{
    domain::{ChannelKey, ProgressEvent, UserId},
    ports::{ProgressPublisher, PublishError, PublishResult},
};

/// Default number of undelivered events a slow subscriber may lag behind.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 256;

/// In-process pub/sub hub with one broadcast channel per channel key.
///
/// Channels are created on first subscription and removed once their last
/// receiver is gone. Events published to a channel nobody listens on are
/// dropped, and late subscribers never see earlier events.
#[derive(Debug, Clone)]
pub struct BroadcastProgressHub {
    capacity: usize,
    channels: Arc<RwLock<HashMap<ChannelKey, broadcast::Sender<ProgressEvent>>>>,
}

impl Default for BroadcastProgressHub {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }
}

impl BroadcastProgressHub {
    /// Creates a hub with the default per-channel capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a hub whose channels buffer up to `capacity` events per
    /// subscriber. A zero capacity is raised to one.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            channels: Arc::default(),
        }
    }

    /// Joins the channel of `user_id`.
    ///
    /// # Errors
    ///
    /// Returns [`PublishError`] when the channel table lock is poisoned.
    pub fn subscribe(&self, user_id: UserId) -> PublishResult<broadcast::Receiver<ProgressEvent>> {
        let key = ChannelKey::for_user(user_id);
        let mut channels = self
            .channels
            .write()
            .map_err(|err| PublishError::transport(std::io::Error::other(err.to_string())))?;
        channels.retain(|_, sender| sender.receiver_count() > 0);
        let sender = channels
            .entry(key)
            .or_insert_with(|| broadcast::channel(self.capacity).0);
        Ok(sender.subscribe())
    }

    /// Returns the number of channels that currently hold a sender.
    #[must_use]
    pub fn channel_count(&self) -> usize {
        self.channels.read().map_or(0, |channels| channels.len())
    }

    fn prune_if_idle(&self, channel: &ChannelKey) -> PublishResult<()> {
        let mut channels = self
            .channels
            .write()
            .map_err(|err| PublishError::transport(std::io::Error::other(err.to_string())))?;
        // A subscriber may have joined between the send and this lock.
        if channels
            .get(channel)
            .is_some_and(|sender| sender.receiver_count() == 0)
        {
            channels.remove(channel);
        }
        Ok(())
    }
}

#[async_trait]
impl ProgressPublisher for BroadcastProgressHub {
    async fn publish(&self, channel: &ChannelKey, event: &ProgressEvent) -> PublishResult<()> {
        let idle = {
            let channels = self
                .channels
                .read()
                .map_err(|err| PublishError::transport(std::io::Error::other(err.to_string())))?;
            channels.get(channel).is_some_and(|sender| {
                // A send error only means every receiver has gone away.
                sender.send(event.clone()).is_err()
            })
        };
        if idle {
            tracing::trace!(channel = %channel, "no active subscribers, dropping channel");
            self.prune_if_idle(channel)?;
        }
        Ok(())
    }
}
