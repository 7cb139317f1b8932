//! Faults - 切り離された task のパニックを worker に届ける
//!
//! The dispatch task and the worker task are joined, so their panics are
//! seen at the join. Anything else a module or driver spawns (the CDP
//! handler pump, a late session release, a module's own background work)
//! is detached: its panic would only be printed by the runtime. A panic hook
//! catches those and forwards them to the [`FaultWatch`] of the worker
//! running on the same thread, which turns them into an `Unhandled Rejection`
//! fault.
//!
//! Tasks wrapped in [`supervised`] are skipped by the hook since their
//! panics reach a `JoinHandle`.

use std::any::Any;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, Once};
use std::thread::ThreadId;

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::error::TaskError;

tokio::task_local! {
    static JOINED: ();
}

struct Route {
    id: u64,
    thread: ThreadId,
    tx: UnboundedSender<String>,
}

static ROUTES: Mutex<Vec<Route>> = Mutex::new(Vec::new());
static NEXT_ROUTE: AtomicU64 = AtomicU64::new(0);
static HOOK: Once = Once::new();

fn routes() -> MutexGuard<'static, Vec<Route>> {
    ROUTES.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Readable reason from a panic payload.
pub(crate) fn panic_reason(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

fn install_hook() {
    HOOK.call_once(|| {
        let previous = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            previous(info);
            if JOINED.try_with(|_| ()).is_ok() {
                return;
            }
            forward(panic_reason(info.payload()));
        }));
    });
}

fn forward(reason: String) {
    let routes = routes();
    let here = std::thread::current().id();
    let local: Vec<&Route> = routes.iter().filter(|r| r.thread == here).collect();
    // multi-thread runtime では別スレッドで panic するので全 worker に届ける
    let targets = if local.is_empty() {
        routes.iter().collect()
    } else {
        local
    };
    for route in targets {
        if route.tx.send(reason.clone()).is_err() {
            tracing::debug!(route = route.id, "fault route already closed");
        }
    }
}

/// Mark a future whose panics are observed through its `JoinHandle`.
pub(crate) fn supervised<F: Future>(future: F) -> impl Future<Output = F::Output> {
    JOINED.scope((), future)
}

/// Receives panics from detached tasks on the worker's thread.
pub struct FaultWatch {
    rx: UnboundedReceiver<String>,
    route: u64,
}

impl FaultWatch {
    /// Watch detached tasks spawned from the current thread.
    pub fn install() -> Self {
        install_hook();
        let (tx, rx) = mpsc::unbounded_channel();
        let id = NEXT_ROUTE.fetch_add(1, Ordering::Relaxed);
        routes().push(Route {
            id,
            thread: std::thread::current().id(),
            tx,
        });
        Self { rx, route: id }
    }

    /// Wait for the next detached fault. Cancel safe.
    pub async fn next(&mut self) -> TaskError {
        match self.rx.recv().await {
            Some(reason) => TaskError::Unexpected(format!("Unhandled Rejection: {reason}")),
            // 送信側は自分の route だけなので drop までは閉じない
            None => std::future::pending().await,
        }
    }
}

impl Drop for FaultWatch {
    fn drop(&mut self) {
        let id = self.route;
        routes().retain(|route| route.id != id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    async fn explode(reason: &'static str) {
        panic!("{reason}")
    }

    #[tokio::test]
    async fn detached_panic_reaches_the_watch() {
        let mut watch = FaultWatch::install();
        tokio::spawn(explode("background fault"));

        let fault = tokio::time::timeout(Duration::from_secs(5), watch.next())
            .await
            .unwrap();
        assert!(fault.is_fatal());
        assert_eq!(fault.to_string(), "Unhandled Rejection: background fault");
    }

    #[tokio::test]
    async fn joined_panic_is_left_to_the_join() {
        let mut watch = FaultWatch::install();
        let joined = tokio::spawn(supervised(explode("seen at join"))).await;
        assert!(joined.unwrap_err().is_panic());

        let fault = tokio::time::timeout(Duration::from_millis(50), watch.next()).await;
        assert!(fault.is_err());
    }

    #[tokio::test]
    async fn dropped_watch_unregisters() {
        let watch = FaultWatch::install();
        let id = watch.route;
        drop(watch);
        assert!(routes().iter().all(|route| route.id != id));
    }

    #[test]
    fn reason_from_payload() {
        assert_eq!(panic_reason(&"static"), "static");
        assert_eq!(panic_reason(&String::from("owned")), "owned");
        assert_eq!(panic_reason(&42_u8), "unknown panic");
    }
}
