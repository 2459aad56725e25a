// src/crawl/mod.rs
// =============================================================================
// Drivers that put the engine to work, as used by the CLI.
//
// Features:
// - Site crawling: each page's handler submits the same-domain links it
//   finds, so the engine keeps running until the whole site (up to a depth
//   limit) has been fetched
// - Plain batch fetching of a list of URLs
//
// Submodules:
// - links: link extraction from HTML
// - site: the crawl and batch drivers and their report types
// =============================================================================

mod links;
mod site;

pub use links::{extract_links, is_same_domain};
pub use site::{crawl_site, fetch_all, CrawlReport, PageReport};
