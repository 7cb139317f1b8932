//! In-memory fakes for the ports, shared by the unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::domain::{LogLevel, StatusMessage, WorkerMessage};
use crate::ports::{
    BrowserDriver, BrowserSession, ChannelError, DriverError, MessageSink, PageHandle, Probe,
    Query,
};

/// Sink that keeps every message it is given.
pub struct RecordingSink {
    messages: Mutex<Vec<WorkerMessage>>,
    connected: AtomicBool,
}

impl RecordingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            messages: Mutex::new(Vec::new()),
            connected: AtomicBool::new(true),
        })
    }

    pub fn disconnected() -> Arc<Self> {
        let sink = Self::new();
        sink.connected.store(false, Ordering::SeqCst);
        sink
    }

    pub fn messages(&self) -> Vec<WorkerMessage> {
        self.messages.lock().unwrap().clone()
    }

    pub fn logs(&self, level: LogLevel) -> Vec<String> {
        self.messages()
            .into_iter()
            .filter_map(|m| match m {
                WorkerMessage::Log(log) if log.level == level => Some(log.message),
                _ => None,
            })
            .collect()
    }

    pub fn statuses(&self) -> Vec<StatusMessage> {
        self.messages()
            .into_iter()
            .filter_map(|m| match m {
                WorkerMessage::Status(status) => Some(status),
                WorkerMessage::Log(_) => None,
            })
            .collect()
    }
}

#[async_trait]
impl MessageSink for RecordingSink {
    async fn send(&self, message: WorkerMessage) -> Result<(), ChannelError> {
        if !self.is_connected() {
            return Err(ChannelError::Closed);
        }
        self.messages.lock().unwrap().push(message);
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }
}

/// An element the fake page can report.
#[derive(Debug, Clone)]
pub struct FakeElement {
    pub text: String,
    pub visible: bool,
    /// Number of probes that miss before the element shows up.
    pub appears_after: usize,
}

impl FakeElement {
    pub fn visible(text: &str) -> Self {
        Self {
            text: text.to_string(),
            visible: true,
            appears_after: 0,
        }
    }

    pub fn hidden(text: &str) -> Self {
        Self {
            visible: false,
            ..Self::visible(text)
        }
    }

    pub fn after(mut self, probes: usize) -> Self {
        self.appears_after = probes;
        self
    }
}

pub struct FakePage {
    pub url: String,
    pub closed: bool,
    pub document_visible: bool,
    pub elements: HashMap<Query, FakeElement>,
    pub navigation_delay: Option<Duration>,
    pub probe_counts: Mutex<HashMap<Query, usize>>,
    pub navigations: Mutex<Vec<String>>,
}

impl FakePage {
    pub fn new(url: &str) -> Self {
        Self {
            url: url.to_string(),
            closed: false,
            document_visible: true,
            elements: HashMap::new(),
            navigation_delay: None,
            probe_counts: Mutex::new(HashMap::new()),
            navigations: Mutex::new(Vec::new()),
        }
    }

    pub fn hidden_document(mut self) -> Self {
        self.document_visible = false;
        self
    }

    pub fn closed(mut self) -> Self {
        self.closed = true;
        self
    }

    pub fn with(mut self, query: Query, element: FakeElement) -> Self {
        self.elements.insert(query, element);
        self
    }

    pub fn slow_navigation(mut self, delay: Duration) -> Self {
        self.navigation_delay = Some(delay);
        self
    }

    pub fn probes(&self, query: &Query) -> usize {
        self.probe_counts
            .lock()
            .unwrap()
            .get(query)
            .copied()
            .unwrap_or(0)
    }
}

#[async_trait]
impl PageHandle for FakePage {
    async fn url(&self) -> Result<String, DriverError> {
        if self.closed {
            return Err(DriverError::Closed);
        }
        Ok(self.url.clone())
    }

    async fn is_closed(&self) -> bool {
        self.closed
    }

    async fn is_document_visible(&self) -> Result<bool, DriverError> {
        Ok(self.document_visible)
    }

    async fn navigate(&self, url: &str) -> Result<(), DriverError> {
        if let Some(delay) = self.navigation_delay {
            tokio::time::sleep(delay).await;
        }
        self.navigations.lock().unwrap().push(url.to_string());
        Ok(())
    }

    async fn probe(&self, query: &Query) -> Result<Probe, DriverError> {
        let seen = {
            let mut counts = self.probe_counts.lock().unwrap();
            let count = counts.entry(query.clone()).or_insert(0);
            *count += 1;
            *count
        };
        let Some(element) = self.elements.get(query) else {
            return Ok(Probe::Missing);
        };
        if seen <= element.appears_after {
            return Ok(Probe::Missing);
        }
        if !element.visible {
            return Ok(Probe::Hidden);
        }
        Ok(Probe::Visible(element.text.clone()))
    }
}

pub struct FakeSession {
    pages: Vec<Arc<FakePage>>,
    disconnects: Arc<AtomicUsize>,
}

#[async_trait]
impl BrowserSession for FakeSession {
    async fn pages(&self) -> Result<Vec<Arc<dyn PageHandle>>, DriverError> {
        Ok(self
            .pages
            .iter()
            .map(|page| Arc::clone(page) as Arc<dyn PageHandle>)
            .collect())
    }

    async fn disconnect(&mut self) {
        self.disconnects.fetch_add(1, Ordering::SeqCst);
    }
}

impl FakeSession {
    pub fn new(pages: Vec<Arc<FakePage>>) -> Self {
        Self {
            pages,
            disconnects: Arc::new(AtomicUsize::new(0)),
        }
    }
}

#[derive(Clone)]
pub struct FakeDriver {
    pub pages: Vec<Arc<FakePage>>,
    pub connects: Arc<AtomicUsize>,
    pub disconnects: Arc<AtomicUsize>,
    pub refuse: bool,
}

impl FakeDriver {
    pub fn new(pages: Vec<Arc<FakePage>>) -> Self {
        Self {
            pages,
            connects: Arc::new(AtomicUsize::new(0)),
            disconnects: Arc::new(AtomicUsize::new(0)),
            refuse: false,
        }
    }

    pub fn refusing() -> Self {
        Self {
            refuse: true,
            ..Self::new(Vec::new())
        }
    }

    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    pub fn disconnects(&self) -> usize {
        self.disconnects.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BrowserDriver for FakeDriver {
    async fn connect(&self, endpoint: &str) -> Result<Box<dyn BrowserSession>, DriverError> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        if self.refuse {
            return Err(DriverError::Connect(format!("{endpoint}: connection refused")));
        }
        Ok(Box::new(FakeSession {
            pages: self.pages.clone(),
            disconnects: Arc::clone(&self.disconnects),
        }))
    }
}
