//! Crawler module for web page fetching and processing
//!
//! This module contains the crawl engine, including:
//! - HTTP fetching with per-request timeouts
//! - HTML text and link extraction
//! - The shared frontier with its visited check-and-set
//! - Worker-pool coordination and run statistics

mod engine;
mod extract;
mod fetcher;
mod frontier;
mod state;

pub use engine::{CrawlEngine, CrawlReport};
pub use extract::{extract_links, extract_text};
pub use fetcher::{build_http_client, fetch_page, FetchOutcome};
pub use frontier::{CancelToken, PendingUrl};
pub use state::{CrawlStats, PageOutcome, PageState, SkipReason};

use crate::{ConfigError, Result};
use std::time::Duration;
use url::Url;

/// Resource limits for one crawl run
///
/// Supplied once per run and immutable afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlLimits {
    /// Maximum number of pages to fetch (must be positive)
    pub max_pages: usize,

    /// Maximum link distance from the seed (0 crawls only the seed)
    pub max_depth: u32,

    /// Per-worker delay before each request
    pub request_delay: Duration,
}

impl CrawlLimits {
    /// Rejects limits that would make the run meaningless
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.max_pages == 0 {
            return Err(ConfigError::Validation(
                "max_pages must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for CrawlLimits {
    fn default() -> Self {
        Self {
            max_pages: 100,
            max_depth: 3,
            request_delay: Duration::from_millis(100),
        }
    }
}

/// One successfully extracted page
///
/// The unit handed to the cohesion analyzer. Immutable once created; the
/// text is cleaned (non-content elements stripped, whitespace collapsed) and
/// always non-empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRecord {
    /// Normalized URL the page was fetched from
    pub url: Url,

    /// Cleaned text content
    pub text: String,

    /// Link distance from the seed
    pub depth: u32,
}

/// Crawls a site and returns its extracted pages
///
/// This is the plain entry point for callers that need no cancellation,
/// progress reporting, or robots injection; it builds an engine and runs it.
/// The record count is bounded by `limits.max_pages`; emission order follows
/// worker completion, not discovery order.
///
/// # Arguments
///
/// * `seed_url` - Where the crawl starts; also defines the site boundary
/// * `limits` - Page, depth, and delay limits for the run
/// * `user_agent` - Full user agent string sent with every request
///
/// # Example
///
/// ```no_run
/// use site_radius::crawler::{crawl, CrawlLimits};
///
/// # async fn example() -> site_radius::Result<()> {
/// let records = crawl(
///     "https://example.com/",
///     CrawlLimits::default(),
///     "SiteRadius/1.0 (+https://example.com/bot; ops@example.com)",
/// )
/// .await?;
/// println!("{} pages", records.len());
/// # Ok(())
/// # }
/// ```
pub async fn crawl(
    seed_url: &str,
    limits: CrawlLimits,
    user_agent: &str,
) -> Result<Vec<PageRecord>> {
    let engine = CrawlEngine::new(limits, user_agent)?;
    let report = engine.run(seed_url).await?;
    Ok(report.records)
}
