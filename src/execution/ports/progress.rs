//! Realtime progress publishing port.

use crate::execution::domain::{ChannelKey, ProgressEvent};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for publish operations.
pub type PublishResult<T> = Result<T, PublishError>;

/// Fire-and-forget publisher for per-user progress channels.
///
/// Delivery is best effort: no acknowledgement, no buffering for absent
/// subscribers, no replay.
#[async_trait]
pub trait ProgressPublisher: Send + Sync {
    /// Publishes `event` to every current subscriber of `channel`.
    ///
    /// # Errors
    ///
    /// Returns [`PublishError`] when the underlying transport rejects the
    /// event. Callers are expected to log and continue.
    async fn publish(&self, channel: &ChannelKey, event: &ProgressEvent) -> PublishResult<()>;
}

/// Errors returned by progress publishers.
#[derive(Debug, Clone, Error)]
pub enum PublishError {
    /// Transport failure.
    #[error("progress transport error: {0}")]
    Transport(Arc<dyn std::error::Error + Send + Sync>),
}

impl PublishError {
    /// Wraps a transport error.
    pub fn transport(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Transport(Arc::new(err))
    }
}
