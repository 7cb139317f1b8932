//! Worker lifecycle states.

use std::fmt;

/// WorkerState はワーカープロセスの状態
///
/// # 状態遷移
/// - Starting → Ready: readiness signal を送った時
/// - Ready → Dispatched: 最初の dispatch を受け取った時
/// - 任意の状態 → Terminating: result 送信後、host の切断、致命的な障害
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Starting,
    Ready,
    Dispatched,
    Terminating,
}

impl WorkerState {
    pub fn can_transition_to(self, next: WorkerState) -> bool {
        use WorkerState::*;
        matches!(
            (self, next),
            (Starting, Ready) | (Ready, Dispatched) | (_, Terminating)
        ) && self != Terminating
    }
}

impl fmt::Display for WorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WorkerState::Starting => "starting",
            WorkerState::Ready => "ready",
            WorkerState::Dispatched => "dispatched",
            WorkerState::Terminating => "terminating",
        };
        f.write_str(name)
    }
}
