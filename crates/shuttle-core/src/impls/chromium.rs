//! ChromiumDriver - CDP (chromiumoxide) による BrowserDriver 実装
//!
//! Connects to an already running browser through its DevTools websocket.
//! The remote browser is never closed by the worker; releasing a session only
//! stops the local CDP handler and drops the connection.

use std::sync::Arc;

use async_trait::async_trait;
use chromiumoxide::browser::Browser;
use chromiumoxide::element::Element;
use chromiumoxide::page::Page;
use futures::StreamExt;
use serde_json::Value;
use tokio::task::JoinHandle;

use crate::ports::{BrowserDriver, BrowserSession, DriverError, PageHandle, Probe, Query};

/// Returns the element's text when it is rendered and visible, `null` otherwise.
/// XPath matches may be text nodes, so fall back to the parent element.
const READ_VISIBLE_TEXT: &str = r#"function() {
    const el = this.nodeType === 1 ? this : this.parentElement;
    if (!el) return null;
    const style = window.getComputedStyle(el);
    const rect = el.getBoundingClientRect();
    const visible = style.visibility !== 'hidden'
        && style.display !== 'none'
        && (rect.width > 0 || rect.height > 0);
    return visible ? (this.textContent || '') : null;
}"#;

pub struct ChromiumDriver;

#[async_trait]
impl BrowserDriver for ChromiumDriver {
    async fn connect(&self, endpoint: &str) -> Result<Box<dyn BrowserSession>, DriverError> {
        let (mut browser, mut handler) = Browser::connect(endpoint)
            .await
            .map_err(|e| DriverError::Connect(e.to_string()))?;
        // 切り離された task なので panic は FaultWatch に届く
        let pump = tokio::spawn(async move { while handler.next().await.is_some() {} });

        // 既存のタブを attach させる
        if let Err(err) = browser.fetch_targets().await {
            tracing::debug!(error = %err, "fetching existing targets failed");
        }

        tracing::debug!(endpoint, "connected to browser");
        Ok(Box::new(ChromiumSession {
            browser: Some(browser),
            pump,
        }))
    }
}

pub struct ChromiumSession {
    browser: Option<Browser>,
    pump: JoinHandle<()>,
}

#[async_trait]
impl BrowserSession for ChromiumSession {
    async fn pages(&self) -> Result<Vec<Arc<dyn PageHandle>>, DriverError> {
        let browser = self.browser.as_ref().ok_or(DriverError::Closed)?;
        if self.pump.is_finished() {
            // handler が止まると CDP の応答は二度と来ない
            return Err(DriverError::Closed);
        }
        let pages = browser
            .pages()
            .await
            .map_err(|e| DriverError::Evaluation(e.to_string()))?;
        Ok(pages
            .into_iter()
            .map(|page| Arc::new(ChromiumPage { page }) as Arc<dyn PageHandle>)
            .collect())
    }

    async fn disconnect(&mut self) {
        if self.pump.is_finished() {
            tracing::debug!("CDP handler already stopped");
        }
        self.pump.abort();
        self.browser.take();
    }
}

pub struct ChromiumPage {
    page: Page,
}

impl ChromiumPage {
    async fn find(&self, query: &Query) -> Option<Element> {
        let found = match query {
            Query::Css(selector) => self.page.find_element(selector.as_str()).await,
            Query::XPath(path) => self.page.find_xpath(path.as_str()).await,
        };
        found.ok()
    }
}

#[async_trait]
impl PageHandle for ChromiumPage {
    async fn url(&self) -> Result<String, DriverError> {
        self.page
            .url()
            .await
            .map(Option::unwrap_or_default)
            .map_err(|e| DriverError::Evaluation(e.to_string()))
    }

    async fn is_closed(&self) -> bool {
        self.page.url().await.is_err()
    }

    async fn is_document_visible(&self) -> Result<bool, DriverError> {
        let result = self
            .page
            .evaluate("!document.hidden")
            .await
            .map_err(|e| DriverError::Evaluation(e.to_string()))?;
        result
            .into_value::<bool>()
            .map_err(|e| DriverError::Evaluation(e.to_string()))
    }

    async fn navigate(&self, url: &str) -> Result<(), DriverError> {
        self.page
            .goto(url)
            .await
            .map_err(|e| DriverError::Navigation(e.to_string()))?;
        self.page
            .wait_for_navigation()
            .await
            .map_err(|e| DriverError::Navigation(e.to_string()))?;
        Ok(())
    }

    async fn probe(&self, query: &Query) -> Result<Probe, DriverError> {
        // 見つからない場合も CDP はエラーを返すので Missing として扱う
        let Some(element) = self.find(query).await else {
            return Ok(Probe::Missing);
        };
        let returns = element
            .call_js_fn(READ_VISIBLE_TEXT, false)
            .await
            .map_err(|e| DriverError::Evaluation(e.to_string()))?;
        match returns.result.value {
            Some(Value::String(text)) => Ok(Probe::Visible(text)),
            _ => Ok(Probe::Hidden),
        }
    }
}
