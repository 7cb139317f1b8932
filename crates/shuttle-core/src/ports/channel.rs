//! Channel ports - host との通信

use async_trait::async_trait;

use crate::domain::{HostMessage, WorkerMessage};

#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("channel i/o failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid message: {0}")]
    InvalidMessage(String),

    #[error("channel closed")]
    Closed,
}

/// Outbound half: readiness, logs and the result.
///
/// Injected into the lifecycle controller and handed down to everything
/// that logs; never reached through global state.
#[async_trait]
pub trait MessageSink: Send + Sync {
    async fn send(&self, message: WorkerMessage) -> Result<(), ChannelError>;

    /// Whether the host end is still usable.
    fn is_connected(&self) -> bool;
}

/// Inbound half.
///
/// `recv` must be cancel safe: the lifecycle races it against the running
/// task and drops whichever loses.
#[async_trait]
pub trait MessageSource: Send {
    /// `Ok(None)` means the host closed the channel.
    async fn recv(&mut self) -> Result<Option<HostMessage>, ChannelError>;
}
