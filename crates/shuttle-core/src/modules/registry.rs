//! ModuleRegistry - モジュールの登録と選択
//!
//! A worker runs one module, picked by name when the process starts. The
//! registry holds the type-erased modules and resolves that name.

use std::collections::HashMap;
use std::sync::Arc;

use super::TaskModule;
use super::browser_extract::BrowserExtract;
use super::request::RequestPassthrough;
use super::text_transform::TextTransform;

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("module '{0}' is already registered")]
    AlreadyRegistered(String),

    #[error("unknown module '{name}' (registered: {})", registered.join(", "))]
    UnknownModule { name: String, registered: Vec<String> },
}

#[derive(Default)]
pub struct ModuleRegistry {
    modules: HashMap<&'static str, Arc<dyn TaskModule>>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The modules shipped with the worker.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        let modules: [Arc<dyn TaskModule>; 3] = [
            Arc::new(TextTransform),
            Arc::new(RequestPassthrough),
            Arc::new(BrowserExtract::chromium()),
        ];
        for module in modules {
            let registered = registry.register(module);
            debug_assert!(registered.is_ok(), "builtin module names collide: {registered:?}");
        }
        registry
    }

    pub fn register(&mut self, module: Arc<dyn TaskModule>) -> Result<(), RegistryError> {
        let name = module.name();
        if self.modules.contains_key(name) {
            return Err(RegistryError::AlreadyRegistered(name.to_string()));
        }
        self.modules.insert(name, module);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn TaskModule>> {
        self.modules.get(name).cloned()
    }

    /// Like [`get`](Self::get), but an unknown name is an error naming the
    /// alternatives.
    pub fn select(&self, name: &str) -> Result<Arc<dyn TaskModule>, RegistryError> {
        self.get(name).ok_or_else(|| RegistryError::UnknownModule {
            name: name.to_string(),
            registered: self.registered_names(),
        })
    }

    /// Sorted.
    pub fn registered_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.modules.keys().map(|name| name.to_string()).collect();
        names.sort();
        names
    }
}
