// src/testing.rs
// =============================================================================
// Test support: a scripted Fetcher that never touches the network.
//
// - Bodies come from a map (anything unknown gets a generated body)
// - Chosen targets fail with FetchError::Failed
// - An optional delay keeps fetches in flight long enough to observe overlap
// - Every call is recorded in order
// - A TaskGauge counts whole tasks in flight: a task enters when its fetch
//   starts and leaves when its handler calls `leave`
// =============================================================================

use crate::fetch::{FetchError, Fetcher};
use futures::future::{BoxFuture, FutureExt};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// High-water mark of tasks between fetch start and handler end
#[derive(Debug, Default)]
pub(crate) struct TaskGauge {
    now: AtomicUsize,
    max: AtomicUsize,
}

impl TaskGauge {
    fn enter(&self) {
        let now = self.now.fetch_add(1, Ordering::SeqCst) + 1;
        self.max.fetch_max(now, Ordering::SeqCst);
    }

    /// Called by a handler as its last step
    pub(crate) fn leave(&self) {
        self.now.fetch_sub(1, Ordering::SeqCst);
    }

    pub(crate) fn max(&self) -> usize {
        self.max.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Default)]
pub(crate) struct StubFetcher {
    pages: HashMap<String, String>,
    failing: HashSet<String>,
    delay: Duration,
    calls: Mutex<Vec<String>>,
    gauge: Option<Arc<TaskGauge>>,
}

impl StubFetcher {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_page(mut self, target: &str, body: &str) -> Self {
        self.pages.insert(target.to_string(), body.to_string());
        self
    }

    pub(crate) fn failing(mut self, target: &str) -> Self {
        self.failing.insert(target.to_string());
        self
    }

    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Every fetch enters `gauge`; handlers must leave it
    pub(crate) fn with_gauge(mut self, gauge: &Arc<TaskGauge>) -> Self {
        self.gauge = Some(Arc::clone(gauge));
        self
    }

    /// Targets fetched so far, in call order
    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    async fn respond(&self, target: &str) -> Result<String, FetchError> {
        self.calls.lock().push(target.to_string());
        if let Some(gauge) = &self.gauge {
            gauge.enter();
        }

        if self.delay.is_zero() {
            tokio::task::yield_now().await;
        } else {
            tokio::time::sleep(self.delay).await;
        }

        if self.failing.contains(target) {
            return Err(FetchError::Failed {
                url: target.to_string(),
                message: "scripted failure".to_string(),
            });
        }

        Ok(self
            .pages
            .get(target)
            .cloned()
            .unwrap_or_else(|| format!("body of {target}")))
    }
}

impl Fetcher for StubFetcher {
    fn fetch<'a>(&'a self, target: &'a str) -> BoxFuture<'a, Result<String, FetchError>> {
        self.respond(target).boxed()
    }
}
