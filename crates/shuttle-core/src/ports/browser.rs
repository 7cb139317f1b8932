//! Browser driver ports.
//!
//! Only what the locator needs from an automation driver: list pages, read a
//! page's address and visibility, navigate, and probe for a visible element.
//! Waiting and fallback policy live in [`crate::locator`], not in drivers.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    #[error("failed to connect to browser: {0}")]
    Connect(String),

    #[error("navigation failed: {0}")]
    Navigation(String),

    #[error("page evaluation failed: {0}")]
    Evaluation(String),

    #[error("browser session closed")]
    Closed,
}

/// How to find an element on a page.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Query {
    Css(String),
    XPath(String),
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Query::Css(selector) => write!(f, "css:{selector}"),
            Query::XPath(path) => write!(f, "xpath:{path}"),
        }
    }
}

/// Result of a single element lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Probe {
    Missing,
    Hidden,
    /// Raw text content of the first visible match, untrimmed.
    Visible(String),
}

#[async_trait]
pub trait BrowserDriver: Send + Sync {
    async fn connect(&self, endpoint: &str) -> Result<Box<dyn BrowserSession>, DriverError>;
}

/// A live connection to a browser, scoped to one task.
#[async_trait]
pub trait BrowserSession: Send + Sync {
    async fn pages(&self) -> Result<Vec<Arc<dyn PageHandle>>, DriverError>;

    /// Drop the connection without closing the remote browser.
    async fn disconnect(&mut self);
}

#[async_trait]
pub trait PageHandle: Send + Sync {
    async fn url(&self) -> Result<String, DriverError>;

    async fn is_closed(&self) -> bool;

    /// `!document.hidden`, evaluated in the page.
    async fn is_document_visible(&self) -> Result<bool, DriverError>;

    /// Navigate and wait for the load to finish.
    async fn navigate(&self, url: &str) -> Result<(), DriverError>;

    async fn probe(&self, query: &Query) -> Result<Probe, DriverError>;
}
