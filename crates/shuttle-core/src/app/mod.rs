//! App - アプリケーション層
//!
//! ports と modules を組み合わせて worker プロセスの振る舞いを実装します。
//!
//! # 主要コンポーネント
//! - **WorkerBuilder**: module の選択と起動時検証
//! - **Worker**: readiness → dispatch → result のライフサイクル
//! - **run_supervised**: パニックを failure result と exit code に変換
//! - **FaultWatch**: 切り離された task のパニックを worker に届ける

pub mod builder;
pub mod faults;
pub mod lifecycle;
pub mod supervisor;

pub use self::builder::{BuildError, WorkerBuilder};
pub use self::faults::FaultWatch;
pub use self::lifecycle::Worker;
pub use self::supervisor::{ResultLatch, WorkerExit, run_supervised};
