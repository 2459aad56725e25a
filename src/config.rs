// src/config.rs
// =============================================================================
// Engine configuration.
//
// The CLI builds one of these from its flags (see cli.rs); library users can
// start from `EngineConfig::default()` and override what they need.
// =============================================================================

use crate::error::EngineError;
use std::time::Duration;

/// Default number of concurrent workers
pub const DEFAULT_WORKERS: usize = 32;

/// Default capacity of the bounded dispatch channel between the intake
/// drain loop and the workers
pub const DEFAULT_DISPATCH_CAPACITY: usize = 1000;

#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Number of workers; at most this many tasks execute at once
    pub workers: usize,
    /// Capacity of the dispatch channel
    pub dispatch_capacity: usize,
    /// Per-request timeout used by the HTTP fetcher
    pub request_timeout: Duration,
    /// Redirects the HTTP fetcher follows before giving up
    pub max_redirects: usize,
    /// User-Agent header sent by the HTTP fetcher
    pub user_agent: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            dispatch_capacity: DEFAULT_DISPATCH_CAPACITY,
            request_timeout: Duration::from_secs(10),
            max_redirects: 5,
            user_agent: concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl EngineConfig {
    /// Default configuration with a different worker count
    pub fn with_workers(workers: usize) -> Self {
        Self {
            workers,
            ..Self::default()
        }
    }

    /// Rejects settings the engine cannot run with.
    ///
    /// tokio's bounded channel panics on a zero capacity, and zero workers
    /// would never finish any task.
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.workers == 0 {
            return Err(EngineError::InvalidConfig(
                "worker count must be at least 1".to_string(),
            ));
        }
        if self.dispatch_capacity == 0 {
            return Err(EngineError::InvalidConfig(
                "dispatch capacity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
