// src/main.rs
// =============================================================================
// This is the entry point of the url-scraper CLI.
//
// What happens here:
// 1. Install the log subscriber (stderr, filtered by RUST_LOG)
// 2. Parse command-line arguments using clap
// 3. Build an engine from the flags and hand it to the chosen driver
// 4. Print the page reports and summary
// 5. Exit with proper code (0 = all fetched, 1 = some failed, 2 = error)
// =============================================================================

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use url_scraper::crawl::{self, CrawlReport, PageReport};
use url_scraper::Engine;

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "url_scraper=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let exit_code = match run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            2
        }
    };

    std::process::exit(exit_code);
}

// Returns:
//   Ok(0) = every page fetched and handled
//   Ok(1) = some fetches or handlers failed
//   Err = unexpected error (exit code 2)
async fn run() -> Result<i32> {
    let cli = Cli::parse();

    let engine = Engine::http(cli.engine.to_config()).context("could not set up the engine")?;

    let report = match &cli.command {
        Commands::Fetch { urls } => {
            if !cli.json {
                println!("🌐 Fetching {} URL(s) with {} worker(s)\n", urls.len(), engine.config().workers);
            }
            crawl::fetch_all(&engine, urls).await?
        }
        Commands::Crawl { start_url, max_depth } => {
            if !cli.json {
                println!("🔍 Crawling website: {}", start_url);
                println!("📊 Max crawl depth: {}\n", max_depth);
            }
            crawl::crawl_site(&engine, start_url, *max_depth).await?
        }
    };

    print_report(&report, cli.json)?;

    if report.summary.is_clean() {
        Ok(0)
    } else {
        Ok(1)
    }
}

fn print_report(report: &CrawlReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
    } else {
        print_table(&report.pages);
        print_summary(report);
    }
    Ok(())
}

// Prints pages as a human-readable table in the terminal
fn print_table(pages: &[PageReport]) {
    println!("{:<70} {:>6} {:>10} {:>7}", "URL", "DEPTH", "BYTES", "LINKS");
    println!("{}", "=".repeat(96));

    for page in pages {
        // Truncate URL if too long for display
        let url_display = if page.url.chars().count() > 67 {
            format!("{}...", page.url.chars().take(67).collect::<String>())
        } else {
            page.url.clone()
        };

        println!("{:<70} {:>6} {:>10} {:>7}", url_display, page.depth, page.bytes, page.links);
    }

    println!();
}

fn print_summary(report: &CrawlReport) {
    let summary = &report.summary;

    println!("📊 Summary:");
    println!("   📋 Submitted: {}", summary.submitted);
    println!("   ✅ Fetched: {}", report.pages.len());
    println!("   ❌ Fetch failures: {}", summary.fetch_failures);
    println!("   ⚠️  Handler failures: {}", summary.handler_failures);
}
