//! Scoped ownership of a browser session.

use crate::ports::BrowserSession;

/// SessionGuard は browser session を一度だけ解放する
///
/// Normal paths call [`SessionGuard::release`]. If the owning future is
/// dropped first (deadline lost, host hung up) the `Drop` impl hands the
/// disconnect to the runtime instead.
pub struct SessionGuard {
    session: Option<Box<dyn BrowserSession>>,
}

impl SessionGuard {
    pub fn new(session: Box<dyn BrowserSession>) -> Self {
        Self {
            session: Some(session),
        }
    }

    /// The guarded session, or `None` once released.
    pub fn session(&self) -> Option<&dyn BrowserSession> {
        self.session.as_deref()
    }

    pub fn is_released(&self) -> bool {
        self.session.is_none()
    }

    pub async fn release(&mut self) {
        if let Some(mut session) = self.session.take() {
            session.disconnect().await;
            tracing::debug!("browser session released");
        }
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        let Some(mut session) = self.session.take() else {
            return;
        };
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    session.disconnect().await;
                    tracing::debug!("browser session released after cancellation");
                });
            }
            Err(_) => tracing::warn!("no runtime left to release browser session"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeDriver;
    use crate::ports::BrowserDriver;

    #[tokio::test]
    async fn release_happens_once() {
        let driver = FakeDriver::new(Vec::new());
        let mut guard = SessionGuard::new(driver.connect("ws://x").await.unwrap());
        guard.release().await;
        guard.release().await;
        drop(guard);
        tokio::task::yield_now().await;
        assert_eq!(driver.disconnects(), 1);
    }

    #[tokio::test]
    async fn dropping_unreleased_guard_still_disconnects() {
        let driver = FakeDriver::new(Vec::new());
        let guard = SessionGuard::new(driver.connect("ws://x").await.unwrap());
        assert!(!guard.is_released());
        drop(guard);
        for _ in 0..4 {
            tokio::task::yield_now().await;
        }
        assert_eq!(driver.disconnects(), 1);
    }
}
