// src/crawl/links.rs
// =============================================================================
// Extracts links from fetched HTML pages.
//
// We use the `scraper` crate to find every <a href> in the page and the `url`
// crate to:
// - Resolve relative hrefs against the page URL
// - Drop #fragments so the same page is not crawled twice
// - Compare domains when the crawl must stay on one site
// =============================================================================

use scraper::{Html, Selector};
use url::Url;

// Extracts all absolute http(s) links from HTML content
//
// Parameters:
//   html: the page body
//   page_url: the URL of the page (for resolving relative links)
//
// Returns: absolute URLs in document order; empty if page_url is invalid
//
// Example:
//   html = "<a href='/docs#intro'>Docs</a>"
//   page_url = "https://example.com"
//   result = ["https://example.com/docs"]
pub fn extract_links(html: &str, page_url: &str) -> Vec<String> {
    let base = match Url::parse(page_url) {
        Ok(url) => url,
        Err(_) => {
            tracing::debug!(page_url, "cannot resolve links against invalid page URL");
            return Vec::new();
        }
    };

    let document = Html::parse_document(html);
    // Constant selector, known to be valid
    let selector = Selector::parse("a[href]").expect("a[href] is a valid selector");

    document
        .select(&selector)
        .filter_map(|element| element.value().attr("href"))
        .filter_map(|href| resolve_link(&base, href))
        .collect()
}

/// True when `link` parses and its domain is exactly `domain`
pub fn is_same_domain(link: &str, domain: &str) -> bool {
    Url::parse(link)
        .map(|url| url.domain() == Some(domain))
        .unwrap_or(false)
}

// Resolves a possibly-relative href to an absolute http(s) URL without its
// fragment. Anchors and special protocols yield None.
fn resolve_link(base: &Url, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty()
        || href.starts_with('#')
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("javascript:")
    {
        return None;
    }

    let mut url = base.join(href).ok()?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return None;
    }
    url.set_fragment(None);

    Some(url.to_string())
}
