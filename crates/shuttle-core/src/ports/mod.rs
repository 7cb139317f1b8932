//! Ports - 外部とのインターフェース
//!
//! The worker talks to two external systems: the host (over a message
//! channel) and, for browser modules, a browser automation driver. Both are
//! traits here so the lifecycle and the locator can be driven by in-memory
//! fakes in tests.

pub mod browser;
pub mod channel;

pub use self::browser::{BrowserDriver, BrowserSession, DriverError, PageHandle, Probe, Query};
pub use self::channel::{ChannelError, MessageSink, MessageSource};
