//! In-process channel for embedding a worker or driving it from tests.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::domain::{DispatchPayload, HostMessage, WorkerMessage};
use crate::ports::{ChannelError, MessageSink, MessageSource};

/// Create a connected host end and worker end.
pub fn memory_channel() -> (HostEnd, MemorySource, Arc<MemorySink>) {
    let (to_worker, from_host) = mpsc::unbounded_channel();
    let (to_host, from_worker) = mpsc::unbounded_channel();
    (
        HostEnd {
            to_worker: Some(to_worker),
            from_worker,
        },
        MemorySource { from_host },
        Arc::new(MemorySink { to_host }),
    )
}

/// The host side: send dispatches, read what the worker emits.
pub struct HostEnd {
    to_worker: Option<UnboundedSender<HostMessage>>,
    from_worker: UnboundedReceiver<WorkerMessage>,
}

impl HostEnd {
    pub fn send(&self, message: HostMessage) -> Result<(), ChannelError> {
        self.to_worker
            .as_ref()
            .ok_or(ChannelError::Closed)?
            .send(message)
            .map_err(|_| ChannelError::Closed)
    }

    pub fn dispatch(&self, payload: DispatchPayload) -> Result<(), ChannelError> {
        self.send(HostMessage::Dispatch { payload })
    }

    /// Close the host → worker direction, like a host hanging up.
    pub fn disconnect(&mut self) {
        self.to_worker.take();
    }

    pub async fn next(&mut self) -> Option<WorkerMessage> {
        self.from_worker.recv().await
    }

    /// Everything the worker has emitted so far.
    pub fn drain(&mut self) -> Vec<WorkerMessage> {
        let mut messages = Vec::new();
        while let Ok(message) = self.from_worker.try_recv() {
            messages.push(message);
        }
        messages
    }
}

pub struct MemorySource {
    from_host: UnboundedReceiver<HostMessage>,
}

#[async_trait]
impl MessageSource for MemorySource {
    async fn recv(&mut self) -> Result<Option<HostMessage>, ChannelError> {
        Ok(self.from_host.recv().await)
    }
}

pub struct MemorySink {
    to_host: UnboundedSender<WorkerMessage>,
}

#[async_trait]
impl MessageSink for MemorySink {
    async fn send(&self, message: WorkerMessage) -> Result<(), ChannelError> {
        self.to_host.send(message).map_err(|_| ChannelError::Closed)
    }

    fn is_connected(&self) -> bool {
        !self.to_host.is_closed()
    }
}
