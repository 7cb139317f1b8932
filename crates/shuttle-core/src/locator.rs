//! UI locator and waiter.
//!
//! Reads the text of a page element the way a patient human would: pick the
//! page the user is looking at, wait for the element to be visible, try the
//! CSS selector first and the XPath second, then pause a little before the
//! next interaction.

use std::sync::Arc;

use tokio::time::{Instant, sleep};

use crate::config::LocatorConfig;
use crate::error::TaskError;
use crate::ports::{BrowserSession, PageHandle, Probe, Query};

/// Address prefixes of pages that never hold user content.
pub const INTERNAL_SCHEMES: &[&str] = &[
    "chrome-extension://",
    "moz-extension://",
    "about:",
    "chrome://",
    "edge://",
];

pub fn is_internal_url(url: &str) -> bool {
    INTERNAL_SCHEMES.iter().any(|scheme| url.starts_with(scheme))
}

/// Pick the page the task should act on.
///
/// Preference order: the first regular page whose document is visible, then
/// the first regular page, then the session's first page of any kind.
pub async fn current_page(session: &dyn BrowserSession) -> Result<Arc<dyn PageHandle>, TaskError> {
    let pages = session.pages().await?;
    let Some(first) = pages.first().cloned() else {
        return Err(TaskError::NoPagesAvailable);
    };

    let mut regular = Vec::with_capacity(pages.len());
    for page in &pages {
        if page.is_closed().await {
            continue;
        }
        // url が読めないページは閉じているものとして扱う
        match page.url().await {
            Ok(url) if !is_internal_url(&url) => regular.push(Arc::clone(page)),
            _ => {}
        }
    }

    for page in &regular {
        if page.is_document_visible().await.unwrap_or(false) {
            return Ok(Arc::clone(page));
        }
    }

    Ok(regular.into_iter().next().unwrap_or(first))
}

/// What to read: a CSS selector, an XPath, or both.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Target {
    pub selector: Option<String>,
    pub xpath: Option<String>,
}

impl Target {
    /// Empty strings mean "not given".
    pub fn new(selector: impl Into<String>, xpath: impl Into<String>) -> Self {
        let non_empty = |s: String| (!s.is_empty()).then_some(s);
        Self {
            selector: non_empty(selector.into()),
            xpath: non_empty(xpath.into()),
        }
    }

    /// Queries in cascade order.
    pub fn queries(&self) -> impl Iterator<Item = Query> + '_ {
        self.selector
            .iter()
            .cloned()
            .map(Query::Css)
            .chain(self.xpath.iter().cloned().map(Query::XPath))
    }
}

#[derive(Debug, Clone)]
pub struct ElementWaiter {
    config: LocatorConfig,
}

impl ElementWaiter {
    pub fn new(config: LocatorConfig) -> Self {
        Self { config }
    }

    /// Poll until an element matching `query` is visible, then return its
    /// trimmed text. `None` when the wait bound elapses first.
    ///
    /// Probe errors are treated like a miss and polling continues.
    pub async fn wait_for_text(&self, page: &dyn PageHandle, query: &Query) -> Option<String> {
        let deadline = Instant::now() + self.config.element_wait;
        loop {
            match page.probe(query).await {
                Ok(Probe::Visible(text)) => return Some(text.trim().to_string()),
                Ok(Probe::Missing | Probe::Hidden) => {}
                Err(err) => tracing::debug!(%query, error = %err, "probe failed"),
            }

            let now = Instant::now();
            if now >= deadline {
                tracing::debug!(%query, "element did not become visible in time");
                return None;
            }
            sleep(self.config.poll_interval.min(deadline - now)).await;
        }
    }

    /// Selector first, XPath second; the first non-empty text wins.
    pub async fn locate_text(&self, page: &dyn PageHandle, target: &Target) -> Option<String> {
        for query in target.queries() {
            match self.wait_for_text(page, &query).await {
                Some(text) if !text.is_empty() => return Some(text),
                _ => tracing::debug!(%query, "no text, trying next locator"),
            }
        }
        None
    }

    /// Run the cascade and settle after a hit. Empty text when nothing matched.
    pub async fn read_text(&self, page: &dyn PageHandle, target: &Target) -> String {
        match self.locate_text(page, target).await {
            Some(text) => {
                self.settle().await;
                text
            }
            None => String::new(),
        }
    }

    pub async fn settle(&self) {
        let delay = self.config.settle.sample();
        tracing::trace!(delay_ms = delay.as_millis() as u64, "settling");
        sleep(delay).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SettleDelay;
    use crate::testing::{FakeElement, FakePage, FakeSession};
    use std::time::Duration;

    fn css(s: &str) -> Query {
        Query::Css(s.to_string())
    }

    fn xpath(s: &str) -> Query {
        Query::XPath(s.to_string())
    }

    fn waiter() -> ElementWaiter {
        ElementWaiter::new(LocatorConfig {
            element_wait: Duration::from_millis(1000),
            poll_interval: Duration::from_millis(100),
            settle: SettleDelay::new(Duration::from_millis(200), Duration::from_millis(400)),
        })
    }

    async fn pick(pages: Vec<FakePage>) -> Result<String, TaskError> {
        let session = FakeSession::new(pages.into_iter().map(Arc::new).collect());
        let page = current_page(&session).await?;
        Ok(page.url().await.unwrap_or_else(|_| "<closed>".to_string()))
    }

    #[test]
    fn internal_schemes_are_recognized() {
        assert!(is_internal_url("chrome-extension://abc/popup.html"));
        assert!(is_internal_url("about:blank"));
        assert!(is_internal_url("edge://settings"));
        assert!(!is_internal_url("https://example.com"));
    }

    #[test]
    fn target_skips_empty_locators() {
        let target = Target::new("", "//h1");
        assert_eq!(target.queries().collect::<Vec<_>>(), vec![xpath("//h1")]);
    }

    #[tokio::test]
    async fn no_pages_is_an_error() {
        let err = pick(vec![]).await.unwrap_err();
        assert!(matches!(err, TaskError::NoPagesAvailable));
    }

    #[tokio::test]
    async fn prefers_visible_regular_page() {
        let url = pick(vec![
            FakePage::new("chrome://newtab"),
            FakePage::new("https://a.example").hidden_document(),
            FakePage::new("https://b.example"),
        ])
        .await
        .unwrap();
        assert_eq!(url, "https://b.example");
    }

    #[tokio::test]
    async fn falls_back_to_first_regular_page() {
        let url = pick(vec![
            FakePage::new("about:blank"),
            FakePage::new("https://a.example").hidden_document(),
            FakePage::new("https://b.example").hidden_document(),
        ])
        .await
        .unwrap();
        assert_eq!(url, "https://a.example");
    }

    #[tokio::test]
    async fn falls_back_to_first_page_when_nothing_regular() {
        let url = pick(vec![
            FakePage::new("chrome-extension://x/bg.html"),
            FakePage::new("https://gone.example").closed(),
        ])
        .await
        .unwrap();
        assert_eq!(url, "chrome-extension://x/bg.html");
    }

    #[tokio::test(start_paused = true)]
    async fn waits_for_element_to_appear() {
        let page = FakePage::new("https://a.example")
            .with(css("h1"), FakeElement::visible("  Hello  ").after(3));
        let text = waiter().wait_for_text(&page, &css("h1")).await;
        assert_eq!(text.as_deref(), Some("Hello"));
        assert_eq!(page.probes(&css("h1")), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn hidden_element_is_never_read() {
        let page = FakePage::new("https://a.example").with(css("h1"), FakeElement::hidden("secret"));
        let start = Instant::now();
        assert_eq!(waiter().wait_for_text(&page, &css("h1")).await, None);
        assert!(start.elapsed() >= Duration::from_millis(1000));
    }

    #[tokio::test(start_paused = true)]
    async fn selector_timeout_falls_back_to_xpath() {
        let page = FakePage::new("https://a.example")
            .with(xpath("//h1"), FakeElement::visible("Hello"));
        let text = waiter().read_text(&page, &Target::new("h1", "//h1")).await;
        assert_eq!(text, "Hello");
        assert!(page.probes(&css("h1")) > 1);
    }

    #[tokio::test(start_paused = true)]
    async fn empty_selector_text_falls_back_to_xpath() {
        let page = FakePage::new("https://a.example")
            .with(css("h1"), FakeElement::visible("   "))
            .with(xpath("//h1"), FakeElement::visible("From xpath"));
        let text = waiter().read_text(&page, &Target::new("h1", "//h1")).await;
        assert_eq!(text, "From xpath");
        assert_eq!(page.probes(&css("h1")), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn selector_hit_skips_xpath() {
        let page = FakePage::new("https://a.example")
            .with(css("h1"), FakeElement::visible("Title"))
            .with(xpath("//h1"), FakeElement::visible("Other"));
        let text = waiter().read_text(&page, &Target::new("h1", "//h1")).await;
        assert_eq!(text, "Title");
        assert_eq!(page.probes(&xpath("//h1")), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn settles_only_after_success() {
        let hit = FakePage::new("https://a.example").with(css("h1"), FakeElement::visible("x"));
        let start = Instant::now();
        waiter().read_text(&hit, &Target::new("h1", "")).await;
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(200) && elapsed <= Duration::from_millis(400));

        let miss = FakePage::new("https://a.example");
        let start = Instant::now();
        let text = waiter().read_text(&miss, &Target::new("h1", "")).await;
        assert_eq!(text, "");
        // one element wait, no settle
        assert!(start.elapsed() < Duration::from_millis(1100));
    }

    #[tokio::test(start_paused = true)]
    async fn nothing_found_yields_empty_text() {
        let page = FakePage::new("https://a.example");
        let text = waiter().read_text(&page, &Target::new("h1", "//h1")).await;
        assert_eq!(text, "");
        assert!(page.probes(&css("h1")) > 0);
        assert!(page.probes(&xpath("//h1")) > 0);
    }
}
