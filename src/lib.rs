// src/lib.rs
// =============================================================================
// url-scraper: a concurrent URL-fetching engine.
//
// Callers submit (URL, handler) pairs at any time, a fixed pool of workers
// fetches each URL and hands the body to its handler, and the caller awaits a
// single completion signal once no work remains. Handlers may submit more
// work, which is how the crawler in `crawl` walks a site.
//
// Modules:
// - config: engine tunables (worker count, channel size, HTTP settings)
// - error: the engine's error type
// - engine: intake queue, worker pool, completion tracker, lifecycle
// - fetch: the Fetcher trait and the reqwest-backed implementation
// - crawl: link extraction and the crawl/fetch drivers used by the CLI
// =============================================================================

pub mod config;
pub mod crawl;
pub mod engine;
pub mod error;
pub mod fetch;

#[cfg(test)]
pub(crate) mod testing;

pub use config::EngineConfig;
pub use engine::{Completion, Engine, Handler, Phase, Summary, Task};
pub use error::EngineError;
pub use fetch::{FetchError, Fetcher, HttpFetcher};
