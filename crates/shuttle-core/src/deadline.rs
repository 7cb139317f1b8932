//! Hard deadlines around task stages.
//!
//! The deadline races the stage against a timer. The losing stage future is
//! dropped, so nothing it would have produced reaches the caller; resources
//! it held must be released by their own guards.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use crate::error::TaskError;

/// Stage label used in timeout messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    OpeningTarget,
    ReadingText,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::OpeningTarget => "Opening target",
            Stage::ReadingText => "Reading text",
        })
    }
}

pub async fn with_deadline<F, T>(stage: Stage, after: Duration, work: F) -> Result<T, TaskError>
where
    F: Future<Output = Result<T, TaskError>>,
{
    match tokio::time::timeout(after, work).await {
        Ok(result) => result,
        Err(_elapsed) => {
            tracing::warn!(%stage, after_ms = after.as_millis() as u64, "stage deadline elapsed");
            Err(TaskError::OperationTimeout { stage, after })
        }
    }
}
