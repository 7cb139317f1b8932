//! `browser-extract`: read the text of an element on the current browser page.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use super::{TaskContext, TaskModule, save_result};
use crate::config::{LocatorConfig, SettleDelay};
use crate::deadline::{Stage, with_deadline};
use crate::domain::{Settings, VariableStore};
use crate::error::TaskError;
use crate::impls::ChromiumDriver;
use crate::locator::{ElementWaiter, Target, current_page};
use crate::placeholder::PlaceholderResolver;
use crate::ports::{BrowserDriver, BrowserSession};
use crate::session::SessionGuard;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(10_000);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrowserExtractConfig {
    pub target_url: Option<String>,
    pub target: Target,
    /// Hard deadline for each of navigation and locate-and-read.
    pub timeout: Duration,
    pub locator: LocatorConfig,
    pub save_to: String,
}

impl BrowserExtractConfig {
    /// String fields get placeholder substitution; numeric fields do not.
    pub fn from_settings(
        settings: &Settings,
        resolver: &PlaceholderResolver,
        store: &VariableStore,
        defaults: &LocatorConfig,
    ) -> Self {
        let target_url = settings.text("targetUrl", "", resolver, store);
        let settle = SettleDelay::new(
            settings.millis("postActionWaitMinMs", defaults.settle.min()),
            settings.millis("postActionWaitMaxMs", defaults.settle.max()),
        );
        Self {
            target_url: (!target_url.trim().is_empty()).then_some(target_url),
            target: Target::new(
                settings.text("targetSelector", "h1", resolver, store),
                settings.text("targetXpath", "//h1", resolver, store),
            ),
            timeout: settings.millis("timeoutMs", DEFAULT_TIMEOUT),
            locator: LocatorConfig {
                element_wait: settings.millis("uiElementWaitMs", defaults.element_wait),
                poll_interval: defaults.poll_interval,
                settle,
            },
            save_to: settings.text("saveTo", "", resolver, store),
        }
    }
}

pub struct BrowserExtract {
    driver: Arc<dyn BrowserDriver>,
}

impl BrowserExtract {
    pub fn new(driver: Arc<dyn BrowserDriver>) -> Self {
        Self { driver }
    }

    /// Backed by a CDP connection.
    pub fn chromium() -> Self {
        Self::new(Arc::new(ChromiumDriver))
    }

    async fn extract(
        &self,
        session: &dyn BrowserSession,
        config: &BrowserExtractConfig,
        ctx: &TaskContext,
    ) -> Result<String, TaskError> {
        let page = current_page(session).await?;

        if let Some(url) = &config.target_url {
            ctx.logger.info(format!("Opening {url}")).await;
            with_deadline(Stage::OpeningTarget, config.timeout, async {
                page.navigate(url).await.map_err(TaskError::from)
            })
            .await?;
        }

        let waiter = ElementWaiter::new(config.locator);
        let text = with_deadline(Stage::ReadingText, config.timeout, async {
            Ok(waiter.read_text(page.as_ref(), &config.target).await)
        })
        .await?;

        if text.is_empty() {
            return Err(TaskError::EmptyExtraction);
        }
        Ok(text)
    }
}

#[async_trait]
impl TaskModule for BrowserExtract {
    fn name(&self) -> &'static str {
        "browser-extract"
    }

    async fn execute(
        &self,
        settings: &Settings,
        store: &mut VariableStore,
        ctx: &TaskContext,
    ) -> Result<Value, TaskError> {
        let Some(endpoint) = ctx
            .session_endpoint
            .as_deref()
            .filter(|endpoint| !endpoint.is_empty())
        else {
            return Err(TaskError::SessionNotProvided);
        };

        let config = BrowserExtractConfig::from_settings(settings, &ctx.resolver, store, &ctx.locator);
        ctx.logger
            .debug(format!(
                "Query selector='{}', xpath='{}', timeoutMs={}",
                config.target.selector.as_deref().unwrap_or_default(),
                config.target.xpath.as_deref().unwrap_or_default(),
                config.timeout.as_millis()
            ))
            .await;

        let mut guard = SessionGuard::new(self.driver.connect(endpoint).await?);
        let outcome = match guard.session() {
            Some(session) => self.extract(session, &config, ctx).await,
            None => Err(TaskError::Unexpected("browser session released early".to_string())),
        };
        guard.release().await;

        let result = Value::String(outcome?);
        save_result(store, &config.save_to, &result, &ctx.logger).await;
        Ok(result)
    }
}
