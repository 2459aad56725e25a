// src/crawl/site.rs
// =============================================================================
// Website crawling on top of the engine.
//
// How it works:
// 1. Submit the starting URL at depth 1
// 2. When a page arrives, its handler records a PageReport
// 3. If the page is shallower than max_depth, the handler submits every
//    same-domain link that has not been seen yet, at depth + 1
// 4. The engine signals completion once no page is left in flight
//
// The engine itself does no deduplication; the `visited` set lives here, in
// the crawl state shared by all handlers.
// =============================================================================

use super::links::{extract_links, is_same_domain};
use crate::engine::{handler, Engine, Handler, Summary};
use anyhow::{anyhow, ensure, Result};
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use url::Url;

/// One fetched page
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageReport {
    pub url: String,
    /// 1 for the starting page (or for every URL of a batch fetch)
    pub depth: usize,
    /// Size of the body in bytes
    pub bytes: usize,
    /// Number of http(s) links found in the body
    pub links: usize,
}

/// Everything a crawl or batch fetch produced
#[derive(Debug, Clone, Serialize)]
pub struct CrawlReport {
    /// Pages sorted by depth, then URL
    pub pages: Vec<PageReport>,
    pub summary: Summary,
}

// Shared by every page handler of one crawl
struct CrawlState {
    domain: String,
    max_depth: usize,
    visited: Mutex<HashSet<String>>,
    pages: Mutex<Vec<PageReport>>,
}

impl CrawlState {
    fn record(&self, url: &str, depth: usize, body: &str, links: usize) {
        self.pages.lock().push(PageReport {
            url: url.to_string(),
            depth,
            bytes: body.len(),
            links,
        });
    }

    fn into_report(self: Arc<Self>, summary: Summary) -> CrawlReport {
        let mut pages = std::mem::take(&mut *self.pages.lock());
        pages.sort_by(|a, b| a.depth.cmp(&b.depth).then_with(|| a.url.cmp(&b.url)));
        CrawlReport { pages, summary }
    }
}

// Crawls a website starting from a URL, staying on its domain
//
// Parameters:
//   engine: an idle engine; this function runs it to completion
//   start_url: The URL to start crawling from
//   max_depth: Maximum crawl depth (1 = just the starting page)
pub async fn crawl_site(engine: &Engine, start_url: &str, max_depth: usize) -> Result<CrawlReport> {
    ensure!(max_depth >= 1, "max depth must be at least 1");

    let start = Url::parse(start_url).map_err(|e| anyhow!("Invalid URL '{}': {}", start_url, e))?;
    let domain = start
        .domain()
        .ok_or_else(|| anyhow!("URL has no domain: {}", start_url))?
        .to_string();

    tracing::info!(start = %start, max_depth, "crawling site");

    let state = Arc::new(CrawlState {
        domain,
        max_depth,
        visited: Mutex::new(HashSet::from([start.to_string()])),
        pages: Mutex::new(Vec::new()),
    });

    engine.submit_shared(start.as_str(), page_handler(Arc::clone(&state), 1))?;
    let summary = engine.run()?.await?;

    Ok(state.into_report(summary))
}

fn page_handler(state: Arc<CrawlState>, depth: usize) -> Handler {
    handler(move |engine, url, body| {
        let links = extract_links(body, url);
        state.record(url, depth, body, links.len());

        if depth >= state.max_depth {
            return Ok(());
        }

        for link in links {
            if !is_same_domain(&link, &state.domain) {
                continue;
            }
            // insert() is false when another page already queued this link
            if state.visited.lock().insert(link.clone()) {
                engine.submit_shared(link, page_handler(Arc::clone(&state), depth + 1))?;
            }
        }
        Ok(())
    })
}

// Fetches every URL once (duplicates are skipped) and reports on each page
pub async fn fetch_all(engine: &Engine, urls: &[String]) -> Result<CrawlReport> {
    let state = Arc::new(CrawlState {
        domain: String::new(),
        max_depth: 1,
        visited: Mutex::new(HashSet::new()),
        pages: Mutex::new(Vec::new()),
    });

    let record: Handler = {
        let state = Arc::clone(&state);
        handler(move |_, url, body| {
            state.record(url, 1, body, extract_links(body, url).len());
            Ok(())
        })
    };

    for url in urls {
        if state.visited.lock().insert(url.clone()) {
            engine.submit_shared(url.as_str(), Arc::clone(&record))?;
        }
    }
    // The engine holds its own clones until it is done
    drop(record);

    let summary = engine.run()?.await?;
    Ok(state.into_report(summary))
}
