//! Crawl engine - bounded concurrent crawl of one site
//!
//! The engine runs a fixed pool of workers against a shared frontier. Each
//! worker loops: acquire a URL (visited check-and-set happens inside the
//! frontier), throttle, check robots, fetch, extract text and links, release.
//! Page records flow to the caller through one aggregating channel, so
//! emission order follows completion order, not discovery order.

use crate::config::Config;
use crate::crawler::extract::{extract_links, extract_text};
use crate::crawler::fetcher::{build_http_client, fetch_page, is_server_error, FetchOutcome};
use crate::crawler::frontier::{CancelToken, Frontier, PendingUrl};
use crate::crawler::state::{CrawlStats, PageOutcome, SkipReason};
use crate::crawler::{CrawlLimits, PageRecord};
use crate::progress::{report, ProgressFn};
use crate::robots::{load_robots, RobotsPolicy};
use crate::url::normalize_url;
use crate::Result;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use url::Url;

/// Everything a crawl run produced
#[derive(Debug)]
pub struct CrawlReport {
    /// Extracted pages, at most `max_pages`, in completion order
    pub records: Vec<PageRecord>,

    /// Terminal-outcome tallies for the run
    pub stats: CrawlStats,
}

/// Bounded concurrent crawler for a single site
pub struct CrawlEngine {
    client: Client,
    user_agent: String,
    limits: CrawlLimits,
    worker_count: usize,
    min_content_length: usize,
    robots: Option<Arc<dyn RobotsPolicy>>,
    progress: Option<ProgressFn>,
    cancel: CancelToken,
}

/// Shared context handed to every worker
struct WorkerCtx {
    client: Client,
    robots: Arc<dyn RobotsPolicy>,
    frontier: Arc<Frontier>,
    records: mpsc::UnboundedSender<PageRecord>,
    seed: Url,
    delay: Duration,
    max_depth: u32,
    min_content_length: usize,
}

impl CrawlEngine {
    /// Creates an engine with the given limits and user agent string
    ///
    /// # Arguments
    ///
    /// * `limits` - Validated before any work starts
    /// * `user_agent` - Full user agent string sent with every request
    pub fn new(limits: CrawlLimits, user_agent: &str) -> Result<Self> {
        limits.validate()?;
        let client = build_http_client(user_agent)?;

        Ok(Self {
            client,
            user_agent: user_agent.to_string(),
            limits,
            worker_count: 10,
            min_content_length: 100,
            robots: None,
            progress: None,
            cancel: CancelToken::default(),
        })
    }

    /// Creates an engine from the loaded configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        let limits = CrawlLimits {
            max_pages: config.crawler.max_pages,
            max_depth: config.crawler.max_depth,
            request_delay: Duration::from_millis(config.crawler.request_delay_ms),
        };

        let engine = Self::new(limits, &config.user_agent.header_value())?;
        Ok(engine
            .with_worker_count(config.crawler.worker_count)
            .with_min_content_length(config.crawler.min_content_length))
    }

    /// Overrides the worker pool size (default 10)
    pub fn with_worker_count(mut self, count: usize) -> Self {
        self.worker_count = count.max(1);
        self
    }

    /// Overrides the minimum extracted-text length (default 100 chars)
    pub fn with_min_content_length(mut self, length: usize) -> Self {
        self.min_content_length = length;
        self
    }

    /// Installs a robots policy, replacing the per-run robots.txt fetch
    ///
    /// Tests use this to inject deny-lists without network traffic.
    pub fn with_robots(mut self, robots: Arc<dyn RobotsPolicy>) -> Self {
        self.robots = Some(robots);
        self
    }

    /// Installs a progress callback
    pub fn with_progress(mut self, progress: ProgressFn) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Shares an externally owned cancellation token
    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Token that cancels this engine's run from another task
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Runs the crawl to completion
    ///
    /// Terminates when the frontier drains, the page cap is reached, or the
    /// run is cancelled. Per-URL failures never abort the run; an unreachable
    /// seed yields an empty record list.
    ///
    /// # Arguments
    ///
    /// * `seed_url` - Where the crawl starts; also defines the site boundary
    pub async fn run(&self, seed_url: &str) -> Result<CrawlReport> {
        let seed = normalize_url(seed_url)?;
        tracing::info!(
            "Starting crawl of {} (max {} pages, depth {}, {} workers)",
            seed,
            self.limits.max_pages,
            self.limits.max_depth,
            self.worker_count
        );

        let robots: Arc<dyn RobotsPolicy> = match &self.robots {
            Some(robots) => robots.clone(),
            None => Arc::new(load_robots(&self.client, &seed, &self.user_agent).await),
        };

        let delay = effective_delay(self.limits.request_delay, robots.crawl_delay());
        if delay > self.limits.request_delay {
            tracing::info!("robots.txt crawl-delay raises request delay to {:?}", delay);
        }

        let frontier = Arc::new(Frontier::new(self.limits.max_pages, self.cancel.clone()));
        frontier.seed(PendingUrl {
            url: seed.clone(),
            depth: 0,
        });

        let (records_tx, mut records_rx) = mpsc::unbounded_channel();
        let ctx = Arc::new(WorkerCtx {
            client: self.client.clone(),
            robots,
            frontier: frontier.clone(),
            records: records_tx,
            seed,
            delay,
            max_depth: self.limits.max_depth,
            min_content_length: self.min_content_length,
        });

        let mut workers = Vec::with_capacity(self.worker_count);
        for worker_id in 0..self.worker_count {
            workers.push(tokio::spawn(worker_loop(worker_id, ctx.clone())));
        }
        // The receiver closes once every worker has dropped its context
        drop(ctx);

        let mut records = Vec::new();
        while let Some(record) = records_rx.recv().await {
            records.push(record);
            let percent = records.len() as f32 / self.limits.max_pages as f32 * 100.0;
            report(
                self.progress.as_ref(),
                percent,
                &format!("Crawled {} pages", records.len()),
            );
        }

        for worker in workers {
            worker.await?;
        }

        let stats = frontier.stats();
        tracing::info!(
            "Crawl finished: {} URLs visited, {} pages extracted, {} skipped, {} failed ({} URLs discovered)",
            frontier.visited_count(),
            stats.pages_extracted,
            stats.skipped_duplicate
                + stats.skipped_page_limit
                + stats.skipped_robots
                + stats.skipped_not_html
                + stats.skipped_thin_content,
            stats.failed,
            stats.urls_discovered
        );

        Ok(CrawlReport { records, stats })
    }
}

/// One worker's fetch-process-enqueue loop
async fn worker_loop(worker_id: usize, ctx: Arc<WorkerCtx>) {
    while let Some(pending) = ctx.frontier.acquire().await {
        tracing::trace!(worker_id, url = %pending.url, depth = pending.depth, "fetching");

        // Per-worker throttle; workers overlap, so the site sees at most
        // worker_count requests per delay window.
        if !ctx.delay.is_zero() {
            tokio::time::sleep(ctx.delay).await;
        }

        let (outcome, links) = process_url(&ctx, &pending).await;
        tracing::debug!(
            worker_id,
            url = %pending.url,
            state = %outcome.terminal_state(),
            "processed"
        );
        ctx.frontier.release(outcome, links);
    }
}

/// Processes one URL to its terminal outcome
///
/// Returns the outcome plus any same-site links to enqueue. Links are only
/// followed from pages that yielded a record: thin or failed pages do not
/// expand the frontier.
async fn process_url(ctx: &WorkerCtx, pending: &PendingUrl) -> (PageOutcome, Vec<PendingUrl>) {
    if !ctx.robots.is_allowed(&pending.url) {
        tracing::debug!("URL {} disallowed by robots.txt", pending.url);
        return (PageOutcome::Skipped(SkipReason::RobotsDisallowed), Vec::new());
    }

    match fetch_page(&ctx.client, &pending.url).await {
        FetchOutcome::Html { body } => {
            let text = extract_text(&body);

            if text.chars().count() < ctx.min_content_length {
                tracing::debug!(
                    "Too little content at {} ({} chars)",
                    pending.url,
                    text.chars().count()
                );
                return (PageOutcome::Skipped(SkipReason::ThinContent), Vec::new());
            }

            let links = if pending.depth < ctx.max_depth {
                extract_links(&body, &pending.url, &ctx.seed)
                    .into_iter()
                    .map(|url| PendingUrl {
                        url,
                        depth: pending.depth + 1,
                    })
                    .collect()
            } else {
                Vec::new()
            };

            let record = PageRecord {
                url: pending.url.clone(),
                text,
                depth: pending.depth,
            };
            // Send fails only when the collector is gone, i.e. the run is
            // being torn down; the record is moot then.
            let _ = ctx.records.send(record);

            (PageOutcome::Extracted, links)
        }

        FetchOutcome::NotHtml { content_type } => {
            tracing::debug!("Skipping {} (Content-Type {})", pending.url, content_type);
            (PageOutcome::Skipped(SkipReason::NotHtml), Vec::new())
        }

        FetchOutcome::HttpError { status } => {
            if is_server_error(status) {
                tracing::warn!("HTTP {} from {}", status, pending.url);
            } else {
                tracing::debug!("HTTP {} from {}", status, pending.url);
            }
            (PageOutcome::Failed, Vec::new())
        }

        FetchOutcome::NetworkError { error, timed_out } => {
            if timed_out {
                tracing::warn!("Request timeout for {}", pending.url);
            } else {
                tracing::warn!("Fetch failed for {}: {}", pending.url, error);
            }
            (PageOutcome::Failed, Vec::new())
        }
    }
}

/// Effective per-worker delay: the configured delay, raised by robots.txt
///
/// A site's `Crawl-delay` wins when it asks for more patience than our
/// configuration; it never lowers the configured delay.
fn effective_delay(configured: Duration, robots_delay: Option<f64>) -> Duration {
    let robots = robots_delay
        .filter(|d| d.is_finite() && *d >= 0.0)
        .map(Duration::from_secs_f64)
        .unwrap_or(Duration::ZERO);

    configured.max(robots)
}
