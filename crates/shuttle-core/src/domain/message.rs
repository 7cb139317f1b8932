//! Wire messages between host and worker.
//!
//! Host → worker messages are tagged with `type`. Worker → host messages use
//! two shapes: status messages tagged with `status` (readiness and the single
//! result) and log messages tagged with `type: "log"`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::variables::VariableStore;

/// The unit of work sent to a worker.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchPayload {
    /// Element descriptor; its `settings` become the task configuration.
    #[serde(default)]
    pub element: Value,

    #[serde(default = "VariableStore::detached", alias = "savedObjects")]
    pub variable_store: VariableStore,

    /// Browser endpoint, present only for browser-capable workers.
    #[serde(default, alias = "wsEndpoint")]
    pub session_endpoint: Option<String>,
}

/// HostMessage は host から worker へのメッセージ
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum HostMessage {
    Dispatch { payload: DispatchPayload },
    Disconnect,
}

impl HostMessage {
    /// Parse one inbound JSON value.
    ///
    /// An object carrying a `payload` but no `type` is taken as a dispatch,
    /// which is what older hosts send.
    pub fn from_value(mut value: Value) -> Result<Self, serde_json::Error> {
        if let Value::Object(map) = &mut value
            && !map.contains_key("type")
            && map.contains_key("payload")
        {
            map.insert("type".to_string(), Value::String("dispatch".to_string()));
        }
        serde_json::from_value(value)
    }

    pub fn parse(line: &str) -> Result<Self, serde_json::Error> {
        let value: Value = serde_json::from_str(line)?;
        Self::from_value(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

/// Readiness and result messages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum StatusMessage {
    Ready,
    Success {
        result: Value,
    },
    Error {
        message: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        trace: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
enum LogTag {
    #[serde(rename = "log")]
    Log,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogMessage {
    #[serde(rename = "type")]
    tag: LogTag,
    pub level: LogLevel,
    pub message: String,
}

impl LogMessage {
    pub fn new(level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            tag: LogTag::Log,
            level,
            message: message.into(),
        }
    }
}

/// WorkerMessage は worker から host へのメッセージ
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WorkerMessage {
    Status(StatusMessage),
    Log(LogMessage),
}

impl WorkerMessage {
    pub fn ready() -> Self {
        Self::Status(StatusMessage::Ready)
    }

    pub fn success(result: Value) -> Self {
        Self::Status(StatusMessage::Success { result })
    }

    pub fn failure(message: impl Into<String>, trace: Option<String>) -> Self {
        Self::Status(StatusMessage::Error {
            message: message.into(),
            trace,
        })
    }

    pub fn log(level: LogLevel, message: impl Into<String>) -> Self {
        Self::Log(LogMessage::new(level, message))
    }

    /// Success or error; at most one of these per worker lifetime.
    pub fn is_result(&self) -> bool {
        matches!(
            self,
            Self::Status(StatusMessage::Success { .. } | StatusMessage::Error { .. })
        )
    }
}
