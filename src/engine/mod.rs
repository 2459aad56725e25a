// src/engine/mod.rs
// =============================================================================
// The engine: a dynamic task queue feeding a fixed pool of fetch workers.
//
// Moving parts (one file each):
// - task: a (target, handler) pair
// - intake: the drain loop bridging unbounded intake to bounded dispatch
// - worker: the fetch-and-handle loop, N copies of it
// - tracker: outstanding-task counter plus the lifecycle phase
//
// Lifecycle: Idle -> Running -> Draining -> Closed
// - Idle: constructed, tasks may already be submitted (they wait in intake)
// - Running: `run` spawned the drain loop, the workers and the lifecycle task
// - Draining: the outstanding count hit zero; submit now fails, the intake
//   channel is closed, which ends the drain loop, which closes dispatch,
//   which ends the workers
// - Closed: every task has joined and the completion signal has fired
//
// Rust concepts:
// - Arc<Inner>: Engine is a cheap handle, cloned into every worker and
//   passed to handlers by reference so they can submit more work
// - oneshot channel: the single completion signal
// - JoinSet: owns the worker tasks so shutdown can wait for all of them
// =============================================================================

mod intake;
mod task;
mod tracker;
mod worker;

pub use task::{handler, Handler, Task};
pub use tracker::Phase;

use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::fetch::{Fetcher, HttpFetcher};
use parking_lot::Mutex;
use serde::Serialize;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::sync::{mpsc, oneshot};
use tokio::task::{JoinHandle, JoinSet};
use tracker::Tracker;

/// Handle to a fetch engine. Clones share the same engine.
#[derive(Clone)]
pub struct Engine {
    inner: Arc<Inner>,
}

struct Inner {
    config: EngineConfig,
    fetcher: Arc<dyn Fetcher>,
    tracker: Tracker,
    stats: Stats,
    // Taken (and so dropped) by the lifecycle task to close intake
    intake_tx: Mutex<Option<mpsc::UnboundedSender<Task>>>,
    // Taken by `run` and moved into the drain loop
    intake_rx: Mutex<Option<mpsc::UnboundedReceiver<Task>>>,
}

/// Failure counters, bumped by the workers
#[derive(Debug, Default)]
pub(crate) struct Stats {
    fetch_failures: AtomicU64,
    handler_failures: AtomicU64,
}

impl Stats {
    pub(crate) fn record_fetch_failure(&self) {
        self.fetch_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_handler_failure(&self) {
        self.handler_failures.fetch_add(1, Ordering::Relaxed);
    }
}

/// What the completion signal carries
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    /// Tasks accepted by `submit`
    pub submitted: u64,
    /// Tasks a worker finished with, whatever the outcome
    pub completed: u64,
    /// Tasks whose fetch failed (handler not invoked)
    pub fetch_failures: u64,
    /// Tasks whose handler returned an error or panicked
    pub handler_failures: u64,
}

impl Summary {
    /// True when every task was fetched and handled without error
    pub fn is_clean(&self) -> bool {
        self.fetch_failures == 0 && self.handler_failures == 0
    }
}

impl Engine {
    /// Creates an idle engine that fetches through `fetcher`
    pub fn new(config: EngineConfig, fetcher: Arc<dyn Fetcher>) -> Result<Self, EngineError> {
        config.validate()?;

        let (intake_tx, intake_rx) = mpsc::unbounded_channel();

        Ok(Self {
            inner: Arc::new(Inner {
                config,
                fetcher,
                tracker: Tracker::new(),
                stats: Stats::default(),
                intake_tx: Mutex::new(Some(intake_tx)),
                intake_rx: Mutex::new(Some(intake_rx)),
            }),
        })
    }

    /// Creates an idle engine backed by an HTTP client built from `config`
    pub fn http(config: EngineConfig) -> Result<Self, EngineError> {
        let fetcher = HttpFetcher::new(&config)?;
        Self::new(config, Arc::new(fetcher))
    }

    pub fn config(&self) -> &EngineConfig {
        &self.inner.config
    }

    pub fn phase(&self) -> Phase {
        self.inner.tracker.phase()
    }

    /// Queues `target` to be fetched and its body passed to `handler`.
    ///
    /// Never waits for a worker. Fails with [`EngineError::Closed`] once the
    /// engine has started shutting down.
    pub fn submit<H>(&self, target: impl Into<String>, handler: H) -> Result<(), EngineError>
    where
        H: Fn(&Engine, &str, &str) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.submit_task(Task::new(target, Arc::new(handler)))
    }

    /// Like [`Engine::submit`] for a handler that is already shared
    pub fn submit_shared(&self, target: impl Into<String>, handler: Handler) -> Result<(), EngineError> {
        self.submit_task(Task::new(target, handler))
    }

    pub fn submit_task(&self, task: Task) -> Result<(), EngineError> {
        // Count first: no worker can finish this task before it is counted
        self.inner.tracker.register()?;

        // The count is now above zero, so the lifecycle task cannot reach
        // Draining and take `intake_tx` until this task has finished
        let intake = self.inner.intake_tx.lock();
        let tx = intake.as_ref().ok_or(EngineError::Aborted)?;
        tx.send(task).map_err(|_| EngineError::Aborted)
    }

    /// Starts the drain loop and the workers and returns at once.
    ///
    /// The returned [`Completion`] resolves exactly once, after the last
    /// outstanding task finished and every worker has stopped. Must be called
    /// from inside a tokio runtime ([`EngineError::NoRuntime`] otherwise), and
    /// only once per engine.
    pub fn run(&self) -> Result<Completion, EngineError> {
        // Checked before leaving Idle so a failed call leaves the engine usable
        if tokio::runtime::Handle::try_current().is_err() {
            return Err(EngineError::NoRuntime);
        }
        self.inner.tracker.start()?;
        let intake_rx = self
            .inner
            .intake_rx
            .lock()
            .take()
            .ok_or(EngineError::AlreadyStarted)?;

        let (dispatch_tx, dispatch_rx) = mpsc::channel(self.inner.config.dispatch_capacity);
        let drainer = tokio::spawn(intake::drain(intake_rx, dispatch_tx));

        let dispatch_rx: worker::SharedReceiver = Arc::new(tokio::sync::Mutex::new(dispatch_rx));
        let mut workers = JoinSet::new();
        for id in 0..self.inner.config.workers {
            workers.spawn(worker::run(id, self.clone(), Arc::clone(&dispatch_rx)));
        }

        tracing::info!(
            workers = self.inner.config.workers,
            queued = self.inner.tracker.outstanding(),
            "engine running"
        );

        let (done_tx, done_rx) = oneshot::channel();
        tokio::spawn(self.clone().shut_down_when_idle(drainer, workers, done_tx));

        Ok(Completion { rx: done_rx })
    }

    /// Counters so far; final once the engine is Closed
    pub fn summary(&self) -> Summary {
        Summary {
            submitted: self.inner.tracker.submitted(),
            completed: self.inner.tracker.completed(),
            fetch_failures: self.inner.stats.fetch_failures.load(Ordering::Relaxed),
            handler_failures: self.inner.stats.handler_failures.load(Ordering::Relaxed),
        }
    }

    async fn shut_down_when_idle(
        self,
        drainer: JoinHandle<()>,
        mut workers: JoinSet<()>,
        done: oneshot::Sender<Summary>,
    ) {
        self.inner.tracker.wait_for_zero().await;
        tracing::debug!("no outstanding tasks, closing channels");

        // Intake first: the drain loop may still be flushing into dispatch,
        // and it closes dispatch itself when it returns
        drop(self.inner.intake_tx.lock().take());
        if let Err(e) = drainer.await {
            tracing::error!(error = %e, "drain loop ended abnormally");
        }

        while let Some(joined) = workers.join_next().await {
            if let Err(e) = joined {
                tracing::error!(error = %e, "worker ended abnormally");
            }
        }

        self.inner.tracker.close();

        let summary = self.summary();
        tracing::info!(
            submitted = summary.submitted,
            fetch_failures = summary.fetch_failures,
            handler_failures = summary.handler_failures,
            "engine finished"
        );

        // Nobody may be listening any more; that is fine
        let _ = done.send(summary);
    }

    pub(crate) fn fetcher(&self) -> &dyn Fetcher {
        self.inner.fetcher.as_ref()
    }

    pub(crate) fn tracker(&self) -> &Tracker {
        &self.inner.tracker
    }

    pub(crate) fn stats(&self) -> &Stats {
        &self.inner.stats
    }
}

/// One-shot completion signal returned by [`Engine::run`]
#[derive(Debug)]
#[must_use = "the engine runs in the background; await the completion to know when it is done"]
pub struct Completion {
    rx: oneshot::Receiver<Summary>,
}

impl Future for Completion {
    type Output = Result<Summary, EngineError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx)
            .poll(cx)
            .map(|received| received.map_err(|_| EngineError::Aborted))
    }
}
