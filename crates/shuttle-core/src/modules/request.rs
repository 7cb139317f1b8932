//! `request`: validate and pass a model request through.
//!
//! The module settles its settings the same way a model-calling module
//! would and hands the normalized request text back to the host. The model
//! call itself belongs to the host.

use async_trait::async_trait;
use serde_json::Value;

use super::{TaskContext, TaskModule, save_result};
use crate::domain::{Settings, VariableStore};
use crate::error::TaskError;
use crate::placeholder::PlaceholderResolver;

pub const DEFAULT_MODEL: &str = "Hermes-3-Llama-3.1-70B";
pub const DEFAULT_MAX_TOKENS: u32 = 256;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestConfig {
    pub model: String,
    pub api_key: String,
    /// Trimmed request text.
    pub request: String,
    pub max_tokens: u32,
    pub save_to: String,
}

impl RequestConfig {
    pub fn from_settings(
        settings: &Settings,
        resolver: &PlaceholderResolver,
        store: &VariableStore,
    ) -> Self {
        // 0 も既定値に戻す
        let max_tokens = match settings.number("maxTokens", f64::from(DEFAULT_MAX_TOKENS)) {
            n if n >= 1.0 => n.min(f64::from(u32::MAX)) as u32,
            _ => DEFAULT_MAX_TOKENS,
        };
        Self {
            model: settings.text("model", DEFAULT_MODEL, resolver, store),
            api_key: settings.text("api", "", resolver, store),
            request: settings.text("request", "", resolver, store).trim().to_string(),
            max_tokens,
            save_to: settings.text("saveTo", "", resolver, store),
        }
    }
}

pub struct RequestPassthrough;

#[async_trait]
impl TaskModule for RequestPassthrough {
    fn name(&self) -> &'static str {
        "request"
    }

    async fn execute(
        &self,
        settings: &Settings,
        store: &mut VariableStore,
        ctx: &TaskContext,
    ) -> Result<Value, TaskError> {
        let config = RequestConfig::from_settings(settings, &ctx.resolver, store);
        if config.request.is_empty() {
            return Err(TaskError::Configuration("request is required".to_string()));
        }

        ctx.logger
            .info(format!(
                "Using model={}, maxTokens={}, apiKeyProvided={}",
                config.model,
                config.max_tokens,
                !config.api_key.is_empty()
            ))
            .await;

        let result = Value::String(config.request);
        save_result(store, &config.save_to, &result, &ctx.logger).await;
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LocatorConfig;
    use crate::domain::LogLevel;
    use crate::observability::TaskLogger;
    use crate::testing::RecordingSink;
    use rstest::rstest;
    use serde_json::json;

    fn ctx(sink: std::sync::Arc<RecordingSink>) -> TaskContext {
        TaskContext {
            session_endpoint: None,
            resolver: PlaceholderResolver::default(),
            locator: LocatorConfig::default(),
            logger: TaskLogger::new(sink, "request"),
        }
    }

    fn settings(value: Value) -> Settings {
        Settings::from_element(&json!({ "settings": value }))
    }

    #[rstest]
    #[case(json!(512), 512)]
    #[case(json!("64"), 64)]
    #[case(json!(0), DEFAULT_MAX_TOKENS)]
    #[case(json!("lots"), DEFAULT_MAX_TOKENS)]
    fn max_tokens_defaults(#[case] raw: Value, #[case] expected: u32) {
        let config = RequestConfig::from_settings(
            &settings(json!({ "maxTokens": raw })),
            &PlaceholderResolver::default(),
            &VariableStore::new(),
        );
        assert_eq!(config.max_tokens, expected);
        assert_eq!(config.model, DEFAULT_MODEL);
    }

    #[tokio::test]
    async fn empty_request_is_a_configuration_error() {
        let sink = RecordingSink::new();
        let mut store = VariableStore::new();
        let err = RequestPassthrough
            .execute(
                &settings(json!({ "request": "  ${missing} ", "saveTo": "out" })),
                &mut store,
                &ctx(sink),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, TaskError::Configuration(_)));
        assert_eq!(err.to_string(), "request is required");
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn request_is_trimmed_saved_and_key_is_not_logged() {
        let sink = RecordingSink::new();
        let mut store = VariableStore::from_value(json!({ "topic": "tides" }));
        let result = RequestPassthrough
            .execute(
                &settings(json!({
                    "request": "  explain ${topic} ",
                    "api": "sk-secret",
                    "saveTo": "prompt",
                })),
                &mut store,
                &ctx(sink.clone()),
            )
            .await
            .unwrap();

        assert_eq!(result, json!("explain tides"));
        assert_eq!(store.get("prompt"), Some(&json!("explain tides")));

        let info = sink.logs(LogLevel::Info);
        assert!(info[0].contains("apiKeyProvided=true"));
        assert!(info.iter().all(|line| !line.contains("sk-secret")));
    }
}
