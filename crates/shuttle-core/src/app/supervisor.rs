//! Supervisor - パニックを task failure に変換する
//!
//! A panic in the worker or dispatch task is caught at its `JoinHandle` and
//! reported to the host as an `Uncaught Exception` failure. Panics in
//! detached tasks arrive through a [`FaultWatch`] as `Unhandled Rejection`.
//! Either way at most one result is sent and the process exits non-zero.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::task::JoinError;

use super::faults::{FaultWatch, panic_reason, supervised};
use super::lifecycle::Worker;
use crate::domain::WorkerMessage;
use crate::error::TaskError;
use crate::ports::{ChannelError, MessageSink, MessageSource};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerExit {
    /// Host disconnected or the task finished normally.
    Clean,
    /// Unexpected fault.
    Fault,
}

impl WorkerExit {
    /// Process exit status.
    pub fn code(self) -> i32 {
        match self {
            Self::Clean => 0,
            Self::Fault => 1,
        }
    }
}

/// Sink wrapper that lets through at most one result message.
pub struct ResultLatch {
    inner: Arc<dyn MessageSink>,
    sent: AtomicBool,
}

impl ResultLatch {
    pub fn new(inner: Arc<dyn MessageSink>) -> Self {
        Self {
            inner,
            sent: AtomicBool::new(false),
        }
    }

    pub fn result_sent(&self) -> bool {
        self.sent.load(Ordering::Acquire)
    }
}

#[async_trait]
impl MessageSink for ResultLatch {
    async fn send(&self, message: WorkerMessage) -> Result<(), ChannelError> {
        if message.is_result() && self.sent.swap(true, Ordering::AcqRel) {
            return Err(ChannelError::InvalidMessage(
                "a result was already sent".to_string(),
            ));
        }
        self.inner.send(message).await
    }

    fn is_connected(&self) -> bool {
        self.inner.is_connected()
    }
}

/// Turn a failed join into the fault reported to the host.
pub(crate) fn uncaught(err: JoinError) -> TaskError {
    if !err.is_panic() {
        return TaskError::Unexpected("task was cancelled".to_string());
    }
    let reason = panic_reason(err.into_panic().as_ref());
    TaskError::Unexpected(format!("Uncaught Exception: {reason}"))
}

/// Run `worker` to completion with panics converted to a failure result.
pub async fn run_supervised<S>(worker: Worker, source: S, sink: Arc<dyn MessageSink>) -> WorkerExit
where
    S: MessageSource + 'static,
{
    let latch = Arc::new(ResultLatch::new(sink));
    let faults = FaultWatch::install();
    let handle = tokio::spawn(supervised(worker.run(source, latch.clone(), faults)));

    match handle.await {
        Ok(exit) => exit,
        Err(err) => {
            let fault = uncaught(err);
            tracing::error!(error = %fault, "worker panicked");
            if latch.is_connected()
                && !latch.result_sent()
                && let Err(err) = latch.send(fault.to_message()).await
            {
                tracing::warn!(error = %err, "failed to report fault");
            }
            WorkerExit::Fault
        }
    }
}
