// src/error.rs
// =============================================================================
// Errors returned by the engine's public API.
//
// Individual task failures never show up here: a failed fetch or a failing
// handler is logged and counted in the Summary. These variants are caller
// errors (misuse of the lifecycle) or setup failures.
// =============================================================================

use crate::engine::Phase;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    /// A task was submitted after the engine stopped accepting work
    #[error("engine no longer accepts work (phase: {phase:?})")]
    Closed { phase: Phase },

    /// `run` was called more than once
    #[error("engine has already been started")]
    AlreadyStarted,

    /// `run` was called outside a tokio runtime
    #[error("engine must be run from inside a tokio runtime")]
    NoRuntime,

    #[error("invalid engine configuration: {0}")]
    InvalidConfig(String),

    /// The lifecycle task went away without emitting the completion signal,
    /// or the intake channel vanished under a counted submission
    #[error("engine lifecycle aborted")]
    Aborted,

    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}
