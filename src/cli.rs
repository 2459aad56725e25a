// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// Engine tuning flags are shared by every subcommand (flattened EngineArgs);
// each subcommand then says what to feed the engine.
// =============================================================================

use clap::{Args, Parser, Subcommand};
use std::time::Duration;
use url_scraper::config::{DEFAULT_DISPATCH_CAPACITY, DEFAULT_WORKERS};
use url_scraper::EngineConfig;

#[derive(Parser, Debug)]
#[command(
    name = "url-scraper",
    version,
    about = "Fetch URLs or crawl a website with a bounded pool of concurrent workers",
    long_about = "url-scraper fetches pages with a fixed number of concurrent workers. \
                  In crawl mode every fetched page feeds its same-domain links back into \
                  the queue until the depth limit is reached."
)]
pub struct Cli {
    #[command(flatten)]
    pub engine: EngineArgs,

    /// Output results in JSON format instead of a table
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Args, Debug)]
pub struct EngineArgs {
    /// Number of concurrent workers
    #[arg(long, default_value_t = DEFAULT_WORKERS, global = true)]
    pub workers: usize,

    /// Capacity of the channel between the intake queue and the workers
    #[arg(long, default_value_t = DEFAULT_DISPATCH_CAPACITY, global = true)]
    pub dispatch_capacity: usize,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = 10, global = true)]
    pub timeout_secs: u64,
}

impl EngineArgs {
    pub fn to_config(&self) -> EngineConfig {
        EngineConfig {
            workers: self.workers,
            dispatch_capacity: self.dispatch_capacity,
            request_timeout: Duration::from_secs(self.timeout_secs),
            ..EngineConfig::default()
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch each URL once
    ///
    /// Example: url-scraper fetch https://example.com https://www.rust-lang.org
    Fetch {
        /// URLs to fetch
        #[arg(required = true)]
        urls: Vec<String>,
    },

    /// Crawl a website, following links on the same domain
    ///
    /// Example: url-scraper crawl https://example.com --max-depth 3
    Crawl {
        /// Website URL to start from (e.g., https://example.com)
        start_url: String,

        /// Maximum crawl depth
        ///
        /// Depth 1 = just the starting page
        /// Depth 2 = starting page + all pages it links to
        #[arg(long, default_value_t = 2)]
        max_depth: usize,
    },
}
