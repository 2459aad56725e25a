// src/engine/worker.rs
// =============================================================================
// A single worker of the pool.
//
// Each worker loops:
// 1. Take one task from the shared dispatch receiver (waits if empty)
// 2. Stop if the channel is closed and empty
// 3. Fetch the target, run the handler on success
// 4. Mark the task finished on the completion tracker
//
// Failures stay inside the task: fetch errors, handler errors and panics in
// either are logged and counted, then the worker moves on. A worker only
// exits once the dispatch channel is closed.
// =============================================================================

use super::{Engine, Task};
use futures::FutureExt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};

/// The dispatch receiver, shared by every worker
pub(crate) type SharedReceiver = Arc<Mutex<mpsc::Receiver<Task>>>;

pub(crate) async fn run(id: usize, engine: Engine, dispatch: SharedReceiver) {
    tracing::trace!(worker = id, "worker started");

    loop {
        // The lock is only held while waiting for the next task
        let next = dispatch.lock().await.recv().await;
        let Some(task) = next else {
            break;
        };

        execute(id, &engine, task).await;
        engine.tracker().finish();
    }

    tracing::trace!(worker = id, "worker stopped");
}

async fn execute(id: usize, engine: &Engine, task: Task) {
    let target = task.target();
    tracing::debug!(worker = id, url = target, "fetching");

    let fetched = AssertUnwindSafe(engine.fetcher().fetch(target))
        .catch_unwind()
        .await;
    let body = match fetched {
        Ok(Ok(body)) => body,
        Ok(Err(e)) => {
            tracing::warn!(worker = id, url = target, error = %e, "fetch failed");
            engine.stats().record_fetch_failure();
            return;
        }
        Err(_) => {
            tracing::error!(worker = id, url = target, "fetcher panicked");
            engine.stats().record_fetch_failure();
            return;
        }
    };

    let handler = task.handler();
    match panic::catch_unwind(AssertUnwindSafe(|| handler(engine, target, &body))) {
        Ok(Ok(())) => {}
        Ok(Err(e)) => {
            tracing::warn!(worker = id, url = target, error = %e, "handler failed");
            engine.stats().record_handler_failure();
        }
        Err(_) => {
            tracing::error!(worker = id, url = target, "handler panicked");
            engine.stats().record_handler_failure();
        }
    }
}
