//! Task modules - worker が実行する処理単位
//!
//! A worker process runs exactly one module, chosen by name at startup.
//! Each module turns the loose [`Settings`] into its own typed config once,
//! at entry, then does its work against the borrowed [`VariableStore`].

pub mod browser_extract;
pub mod registry;
pub mod request;
pub mod text_transform;

use async_trait::async_trait;
use serde_json::Value;

use crate::config::LocatorConfig;
use crate::domain::{Settings, VariableStore};
use crate::error::TaskError;
use crate::observability::TaskLogger;
use crate::placeholder::PlaceholderResolver;

pub use self::browser_extract::{BrowserExtract, BrowserExtractConfig};
pub use self::registry::{ModuleRegistry, RegistryError};
pub use self::request::{RequestConfig, RequestPassthrough};
pub use self::text_transform::{Operation, TextTransform, TextTransformConfig, transform};

/// Everything a module may use besides its settings and the store.
#[derive(Clone)]
pub struct TaskContext {
    pub session_endpoint: Option<String>,
    pub resolver: PlaceholderResolver,
    /// Component defaults; settings may override them per task.
    pub locator: LocatorConfig,
    pub logger: TaskLogger,
}

#[async_trait]
pub trait TaskModule: Send + Sync {
    /// Name used to select the module at worker startup.
    fn name(&self) -> &'static str;

    async fn execute(
        &self,
        settings: &Settings,
        store: &mut VariableStore,
        ctx: &TaskContext,
    ) -> Result<Value, TaskError>;
}

/// Write `value` under `save_to` when a target name was given.
pub(crate) async fn save_result(
    store: &mut VariableStore,
    save_to: &str,
    value: &Value,
    logger: &TaskLogger,
) {
    if save_to.is_empty() || store.is_detached() {
        return;
    }
    store.set(save_to, value.clone());
    logger.info(format!("Result saved to variable: {save_to}")).await;
}
