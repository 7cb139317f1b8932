use std::time::Duration;

use thiserror::Error;

use crate::deadline::Stage;
use crate::domain::WorkerMessage;
use crate::ports::DriverError;

/// TaskError は task 実行時のエラー分類
///
/// Every variant ends up as the single error result sent to the host.
/// Locator misses never appear here; only the cascade's empty outcome does.
#[derive(Debug, Error)]
pub enum TaskError {
    /// Missing or unusable required setting.
    #[error("{0}")]
    Configuration(String),

    #[error("session endpoint not provided. Start browser before using this module.")]
    SessionNotProvided,

    #[error("No available pages in browser")]
    NoPagesAvailable,

    #[error("{stage} timeout after {}ms", .after.as_millis())]
    OperationTimeout { stage: Stage, after: Duration },

    #[error("Target element text is empty or element not found")]
    EmptyExtraction,

    #[error(transparent)]
    Driver(#[from] DriverError),

    #[error("{0}")]
    Unexpected(String),
}

impl TaskError {
    /// Unexpected faults make the worker exit non-zero.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Unexpected(_))
    }

    /// Only unexpected faults carry a trace; business failures are
    /// described by their message alone.
    pub fn trace(&self) -> Option<String> {
        self.is_fatal().then(|| format!("{self:?}"))
    }

    pub fn to_message(&self) -> WorkerMessage {
        WorkerMessage::failure(self.to_string(), self.trace())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::StatusMessage;

    #[test]
    fn timeout_message_names_the_stage() {
        let err = TaskError::OperationTimeout {
            stage: Stage::ReadingText,
            after: Duration::from_millis(2500),
        };
        assert_eq!(err.to_string(), "Reading text timeout after 2500ms");
    }

    #[test]
    fn business_failures_have_no_trace() {
        let WorkerMessage::Status(StatusMessage::Error { message, trace }) =
            TaskError::EmptyExtraction.to_message()
        else {
            panic!("expected error status");
        };
        assert_eq!(message, "Target element text is empty or element not found");
        assert_eq!(trace, None);
    }

    #[test]
    fn unexpected_faults_carry_a_trace() {
        let err = TaskError::Unexpected("result channel broke".to_string());
        assert!(err.is_fatal());
        assert!(err.trace().unwrap().contains("result channel broke"));
    }

    #[test]
    fn session_error_mentions_not_provided() {
        assert!(TaskError::SessionNotProvided.to_string().contains("not provided"));
    }
}
