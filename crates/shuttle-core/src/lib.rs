//! shuttle-core
//!
//! Building blocks for single-task worker processes driven by a host over a
//! message channel.
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（wire messages, settings, variable store, state, ids）
//! - **ports**: 抽象化レイヤー（MessageSink / MessageSource, BrowserDriver）
//! - **modules**: worker が実行する処理（text-transform, request, browser-extract）
//! - **app**: ライフサイクル、起動時検証、supervisor
//! - **impls**: 実装（NDJSON channel, in-memory channel, chromiumoxide driver）
//! - **placeholder / locator / deadline / session**: modules が使う部品

pub mod app;
pub mod config;
pub mod deadline;
pub mod domain;
pub mod error;
pub mod impls;
pub mod locator;
pub mod modules;
pub mod observability;
pub mod placeholder;
pub mod ports;
pub mod session;

#[cfg(test)]
mod testing;
