// src/engine/task.rs
// =============================================================================
// One unit of work: a target URL plus the handler that receives its body.
//
// A Task is created by `Engine::submit`, moved into the intake queue, then
// into the dispatch channel, and finally into exactly one worker. It is never
// cloned, so no two workers can ever hold the same task.
// =============================================================================

use super::Engine;
use std::fmt;
use std::sync::Arc;

/// Callback invoked with `(engine, target, body)` after a successful fetch.
///
/// Handlers run inline on a worker and may call `Engine::submit` to add more
/// work. An `Err` is logged and counted, it never stops the engine.
pub type Handler = Arc<dyn Fn(&Engine, &str, &str) -> anyhow::Result<()> + Send + Sync>;

/// Wraps a closure as a [`Handler`].
///
/// Going through this function lets the compiler infer the closure's
/// argument types from the `Fn` bound.
pub fn handler<F>(f: F) -> Handler
where
    F: Fn(&Engine, &str, &str) -> anyhow::Result<()> + Send + Sync + 'static,
{
    Arc::new(f)
}

pub struct Task {
    target: String,
    handler: Handler,
}

impl Task {
    pub fn new(target: impl Into<String>, handler: Handler) -> Self {
        Self {
            target: target.into(),
            handler,
        }
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub(crate) fn handler(&self) -> &Handler {
        &self.handler
    }
}

// Handlers are opaque, so only the target is printed
impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task").field("target", &self.target).finish_non_exhaustive()
    }
}
