//! Worker - ワーカーのライフサイクル
//!
//! # フロー
//! 1. readiness を送る（host が接続している場合のみ）
//! 2. 最初の dispatch を待つ（不正な行は warn してスキップ）
//! 3. module を別 task で実行し、その間も host の切断を監視する
//! 4. result を 1 回だけ送る
//! 5. 既定では host が切断するまで待ち、余分な dispatch は無視する
//!
//! どの段階でも切り離された task が panic したら fault として終了する。

use std::sync::Arc;

use serde_json::Value;
use tokio::task::JoinHandle;
use tracing::Instrument;

use super::faults::{FaultWatch, supervised};
use super::supervisor::{WorkerExit, uncaught};
use crate::config::WorkerConfig;
use crate::domain::{DispatchPayload, HostMessage, RunId, Settings, WorkerMessage, WorkerState};
use crate::error::TaskError;
use crate::modules::{TaskContext, TaskModule};
use crate::observability::TaskLogger;
use crate::ports::{ChannelError, MessageSink, MessageSource};

enum Inbound {
    Dispatch(DispatchPayload),
    Disconnect,
    Skip,
}

impl Inbound {
    fn classify(received: Result<Option<HostMessage>, ChannelError>) -> Self {
        match received {
            Ok(Some(HostMessage::Dispatch { payload })) => Self::Dispatch(payload),
            Ok(Some(HostMessage::Disconnect)) | Ok(None) => Self::Disconnect,
            Err(ChannelError::InvalidMessage(reason)) => {
                tracing::warn!(%reason, "skipping invalid inbound message");
                Self::Skip
            }
            Err(err) => {
                tracing::warn!(error = %err, "host channel failed");
                Self::Disconnect
            }
        }
    }
}

pub struct Worker {
    module: Arc<dyn TaskModule>,
    config: WorkerConfig,
    run_id: RunId,
    state: WorkerState,
}

impl Worker {
    pub fn new(module: Arc<dyn TaskModule>, config: WorkerConfig) -> Self {
        Self {
            module,
            config,
            run_id: RunId::generate(),
            state: WorkerState::Starting,
        }
    }

    pub fn run_id(&self) -> RunId {
        self.run_id
    }

    pub fn state(&self) -> WorkerState {
        self.state
    }

    pub fn module_name(&self) -> &'static str {
        self.module.name()
    }

    /// Drive one worker lifetime over the given channel.
    ///
    /// Panics of this future are not caught here; see
    /// [`run_supervised`](super::run_supervised). Panics of detached tasks
    /// arrive through `faults` and end the worker with [`WorkerExit::Fault`].
    pub async fn run<S: MessageSource>(
        mut self,
        mut source: S,
        sink: Arc<dyn MessageSink>,
        mut faults: FaultWatch,
    ) -> WorkerExit {
        let span = tracing::info_span!("worker", run_id = %self.run_id, module = self.module.name());
        async move {
            let exit = self.lifecycle(&mut source, sink, &mut faults).await;
            self.transition(WorkerState::Terminating);
            tracing::info!(code = exit.code(), "worker exiting");
            exit
        }
        .instrument(span)
        .await
    }

    async fn lifecycle<S: MessageSource>(
        &mut self,
        source: &mut S,
        sink: Arc<dyn MessageSink>,
        faults: &mut FaultWatch,
    ) -> WorkerExit {
        self.transition(WorkerState::Ready);
        if sink.is_connected() {
            if let Err(err) = sink.send(WorkerMessage::ready()).await {
                tracing::warn!(error = %err, "failed to send readiness");
            }
        } else {
            tracing::debug!("host not connected; readiness not sent");
        }

        let payload = loop {
            let received = tokio::select! {
                biased;
                fault = faults.next() => {
                    tracing::error!(error = %fault, "background task failed before dispatch");
                    if sink.is_connected()
                        && let Err(err) = sink.send(fault.to_message()).await
                    {
                        tracing::warn!(error = %err, "failed to report fault");
                    }
                    return WorkerExit::Fault;
                }
                received = source.recv() => received,
            };
            match Inbound::classify(received) {
                Inbound::Dispatch(payload) => break payload,
                Inbound::Disconnect => {
                    tracing::info!("host disconnected before dispatch");
                    return WorkerExit::Clean;
                }
                Inbound::Skip => {}
            }
        };
        self.transition(WorkerState::Dispatched);
        tracing::info!("dispatch received");

        let logger = TaskLogger::new(Arc::clone(&sink), self.module.name());
        let mut task = self.spawn_task(payload, logger.clone());

        let outcome = loop {
            tokio::select! {
                biased;
                fault = faults.next() => {
                    task.abort();
                    break Err(fault);
                }
                joined = &mut task => break joined.map_err(uncaught).and_then(|result| result),
                received = source.recv() => match Inbound::classify(received) {
                    Inbound::Dispatch(_) => tracing::warn!("ignoring dispatch while a task is running"),
                    Inbound::Disconnect => {
                        task.abort();
                        tracing::info!("host disconnected while task was running");
                        return WorkerExit::Clean;
                    }
                    Inbound::Skip => {}
                },
            }
        };

        let (result, exit) = match outcome {
            Ok(value) => (WorkerMessage::success(value), WorkerExit::Clean),
            Err(err) => {
                logger.error(format!("Module error: {err}")).await;
                let exit = if err.is_fatal() {
                    WorkerExit::Fault
                } else {
                    WorkerExit::Clean
                };
                (err.to_message(), exit)
            }
        };

        self.transition(WorkerState::Terminating);
        if let Err(err) = sink.send(result).await {
            tracing::error!(error = %err, "failed to send result");
            return WorkerExit::Fault;
        }
        if exit == WorkerExit::Fault || self.config.exit_after_result {
            return exit;
        }

        loop {
            let received = tokio::select! {
                biased;
                fault = faults.next() => {
                    // result は送信済みなので log でだけ伝える
                    logger.error(format!("Module error: {fault}")).await;
                    return WorkerExit::Fault;
                }
                received = source.recv() => received,
            };
            match Inbound::classify(received) {
                Inbound::Dispatch(_) => {
                    tracing::warn!("ignoring dispatch; this worker already produced its result")
                }
                Inbound::Disconnect => return exit,
                Inbound::Skip => {}
            }
        }
    }

    fn spawn_task(&self, payload: DispatchPayload, logger: TaskLogger) -> JoinHandle<Result<Value, TaskError>> {
        let module = Arc::clone(&self.module);
        let settings = Settings::from_element(&payload.element);
        let mut store = payload.variable_store;
        let ctx = TaskContext {
            session_endpoint: payload.session_endpoint,
            resolver: self.config.resolver(),
            locator: self.config.locator,
            logger,
        };
        tokio::spawn(supervised(
            async move { module.execute(&settings, &mut store, &ctx).await }.in_current_span(),
        ))
    }

    fn transition(&mut self, next: WorkerState) {
        if self.state == next {
            return;
        }
        if !self.state.can_transition_to(next) {
            tracing::warn!(from = %self.state, to = %next, "invalid state transition");
            return;
        }
        tracing::debug!(from = %self.state, to = %next, "state transition");
        self.state = next;
    }
}
