//! Impls - ports の実装
//!
//! # 含まれる実装
//! - **LineSource / LineSink**: 改行区切り JSON（worker バイナリは stdin/stdout）
//! - **memory_channel**: 組み込み・テスト用のプロセス内チャネル
//! - **ChromiumDriver**: chromiumoxide (CDP) によるブラウザ接続

pub mod chromium;
pub mod memory_channel;
pub mod stdio_channel;

pub use self::chromium::ChromiumDriver;
pub use self::memory_channel::{HostEnd, MemorySink, MemorySource, memory_channel};
pub use self::stdio_channel::{LineSink, LineSource};
