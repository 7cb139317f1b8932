//! Task-level logging.
//!
//! Log lines go two ways: to the host as `{ "type": "log" }` messages, and
//! to the local tracing subscriber (stderr in the worker binary).

use std::sync::Arc;

use crate::domain::{LogLevel, WorkerMessage};
use crate::ports::MessageSink;

#[derive(Clone)]
pub struct TaskLogger {
    sink: Arc<dyn MessageSink>,
    module: &'static str,
}

impl TaskLogger {
    pub fn new(sink: Arc<dyn MessageSink>, module: &'static str) -> Self {
        Self { sink, module }
    }

    pub async fn log(&self, level: LogLevel, message: impl Into<String>) {
        let message = message.into();
        match level {
            LogLevel::Debug => tracing::debug!(module = self.module, "{message}"),
            LogLevel::Info => tracing::info!(module = self.module, "{message}"),
            LogLevel::Warn => tracing::warn!(module = self.module, "{message}"),
            LogLevel::Error => tracing::error!(module = self.module, "{message}"),
        }

        // host への転送は best-effort
        if !self.sink.is_connected() {
            return;
        }
        if let Err(err) = self.sink.send(WorkerMessage::log(level, message)).await {
            tracing::warn!(error = %err, "failed to forward log message");
        }
    }

    pub async fn debug(&self, message: impl Into<String>) {
        self.log(LogLevel::Debug, message).await
    }

    pub async fn info(&self, message: impl Into<String>) {
        self.log(LogLevel::Info, message).await
    }

    pub async fn warn(&self, message: impl Into<String>) {
        self.log(LogLevel::Warn, message).await
    }

    pub async fn error(&self, message: impl Into<String>) {
        self.log(LogLevel::Error, message).await
    }
}
