// src/fetch/mod.rs
// =============================================================================
// The fetch collaborator: turns a target URL into a response body.
//
// The engine does not care how a body is obtained. It calls `Fetcher::fetch`
// once per task and either hands the body to the task's handler or, on
// failure, logs the error and treats the task as finished. This keeps the
// engine testable with a scripted fetcher and lets callers plug in their own
// transport.
//
// Submodules:
// - http: the default fetcher, built on reqwest
// =============================================================================

mod http;

pub use http::HttpFetcher;

use futures::future::BoxFuture;
use thiserror::Error;

/// Retrieves the full body for a target.
///
/// The trait returns a boxed future so it can be used as `Arc<dyn Fetcher>`.
pub trait Fetcher: Send + Sync {
    fn fetch<'a>(&'a self, target: &'a str) -> BoxFuture<'a, Result<String, FetchError>>;
}

/// Why a fetch did not produce a body
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to '{url}' timed out")]
    Timeout { url: String },

    #[error("too many redirects opening '{url}'")]
    TooManyRedirects { url: String },

    #[error("could not connect to '{url}': {source}")]
    Connect {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("error opening '{url}': {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("error reading body of '{url}': {source}")]
    Body {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Failure reported by a non-HTTP fetcher
    #[error("failed to fetch '{url}': {message}")]
    Failed { url: String, message: String },
}

impl FetchError {
    /// The target the failure belongs to
    pub fn url(&self) -> &str {
        match self {
            FetchError::Timeout { url }
            | FetchError::TooManyRedirects { url }
            | FetchError::Connect { url, .. }
            | FetchError::Request { url, .. }
            | FetchError::Body { url, .. }
            | FetchError::Failed { url, .. } => url,
        }
    }
}
