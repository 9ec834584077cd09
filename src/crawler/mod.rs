//! Crawler module for web page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with a single protocol fallback
//! - HTML parsing, link extraction and visible text
//! - Whole-word matching over Unicode text
//! - Per-domain rate limiting
//! - Overall crawl coordination

mod coordinator;
mod fetcher;
mod matcher;
mod parser;
mod rate_limiter;

pub use coordinator::{Coordinator, CrawlReport, DomainReport};
pub use fetcher::{
    build_http_client, decode_body, is_html, FetchFailure, FetchOutcome, FetchResult, Fetcher,
    FollowAll, RedirectCheck, RedirectGuard,
};
pub use matcher::{match_words, WordMatcher};
pub use parser::{extract_links, parse_html, ParsedPage};
pub use rate_limiter::RateLimiter;

use crate::config::Config;
use crate::CrawlerError;
use tokio_util::sync::CancellationToken;

/// Runs a complete crawl operation
///
/// This is the main entry point for starting a crawl. It will:
/// 1. Seed one frontier per domain
/// 2. Build the HTTP client
/// 3. Fetch pages with the worker pool until every frontier closes
/// 4. Return the per-domain report and every match found
///
/// # Errors
///
/// Fails only before crawling starts: empty inputs, no usable domain, or an
/// HTTP client that cannot be built. Failures of individual pages are counted
/// in the report instead.
pub async fn crawl(
    config: &Config,
    domains: &[String],
    words: &[String],
    cancel: CancellationToken,
) -> Result<CrawlReport, CrawlerError> {
    let coordinator = Coordinator::new(config, domains, words)?;
    Ok(coordinator.run(cancel).await)
}
