//! `text-transform`: apply a simple string operation to the input text.

use async_trait::async_trait;
use serde_json::Value;

use super::{TaskContext, TaskModule, save_result};
use crate::domain::{Settings, VariableStore};
use crate::error::TaskError;
use crate::placeholder::PlaceholderResolver;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Uppercase,
    Lowercase,
    Length,
    Trim,
}

impl Operation {
    /// Unknown names fall back to `Trim`.
    pub fn parse(name: &str) -> Self {
        match name {
            "uppercase" => Self::Uppercase,
            "lowercase" => Self::Lowercase,
            "length" => Self::Length,
            _ => Self::Trim,
        }
    }

    pub fn apply(self, text: &str) -> Value {
        match self {
            Self::Uppercase => Value::String(text.to_uppercase()),
            Self::Lowercase => Value::String(text.to_lowercase()),
            Self::Length => Value::from(text.chars().count() as u64),
            Self::Trim => Value::String(text.trim().to_string()),
        }
    }
}

pub fn transform(text: &str, operation: &str) -> Value {
    Operation::parse(operation).apply(text)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextTransformConfig {
    pub input_text: String,
    pub operation: Operation,
    pub save_to: String,
}

impl TextTransformConfig {
    pub fn from_settings(
        settings: &Settings,
        resolver: &PlaceholderResolver,
        store: &VariableStore,
    ) -> Self {
        Self {
            input_text: settings.text("inputText", "", resolver, store),
            operation: Operation::parse(&settings.text("operation", "trim", resolver, store)),
            save_to: settings.text("saveTo", "", resolver, store),
        }
    }
}

pub struct TextTransform;

#[async_trait]
impl TaskModule for TextTransform {
    fn name(&self) -> &'static str {
        "text-transform"
    }

    async fn execute(
        &self,
        settings: &Settings,
        store: &mut VariableStore,
        ctx: &TaskContext,
    ) -> Result<Value, TaskError> {
        let config = TextTransformConfig::from_settings(settings, &ctx.resolver, store);
        let result = config.operation.apply(&config.input_text);
        save_result(store, &config.save_to, &result, &ctx.logger).await;
        Ok(result)
    }
}
