//! WorkerBuilder - worker の構築とワイヤリング
//!
//! # Fail-fast 設計
//! - 起動時に module 名を解決する
//! - 未登録の名前なら readiness を送る前に BuildError を返す

use std::sync::Arc;

use super::lifecycle::Worker;
use crate::config::WorkerConfig;
use crate::modules::{ModuleRegistry, RegistryError, TaskModule};

/// WorkerBuilder は 1 つの module を選んで Worker を構築
///
/// # 使用例
/// ```ignore
/// let worker = WorkerBuilder::new(WorkerConfig::new("text-transform")).build()?;
/// let exit = run_supervised(worker, LineSource::stdin(), Arc::new(LineSink::stdout())).await;
/// ```
pub struct WorkerBuilder {
    registry: ModuleRegistry,
    config: WorkerConfig,
}

#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

impl WorkerBuilder {
    /// Starts from the built-in modules.
    pub fn new(config: WorkerConfig) -> Self {
        Self {
            registry: ModuleRegistry::builtin(),
            config,
        }
    }

    /// Replace the registry, e.g. to run with fakes.
    pub fn with_registry(mut self, registry: ModuleRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn register(mut self, module: Arc<dyn TaskModule>) -> Result<Self, BuildError> {
        self.registry.register(module)?;
        Ok(self)
    }

    pub fn build(self) -> Result<Worker, BuildError> {
        let module = self.registry.select(&self.config.module)?;
        tracing::debug!(module = module.name(), "module selected");
        Ok(Worker::new(module, self.config))
    }
}
