//! Shared crawl frontier: work queue, visited set, and drain tracking
//!
//! One `Frontier` is shared by all workers of a crawl run. A single mutex
//! guards the queue, the visited set, the in-flight counter, and the run
//! statistics; the visited check-and-set at dequeue is therefore linearizable
//! across workers, which is what prevents two workers from fetching the same
//! URL. A `Notify` wakes idle workers when work arrives or the run drains.

use crate::crawler::state::{CrawlStats, PageOutcome, SkipReason};
use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;
use url::Url;

/// A URL waiting in the frontier with its discovery depth
#[derive(Debug, Clone)]
pub struct PendingUrl {
    /// Normalized absolute URL
    pub url: Url,

    /// Link distance from the seed (seed itself is depth 0)
    pub depth: u32,
}

/// Cooperative cancellation flag for an in-progress crawl
///
/// Cancelling stops dequeuing and enqueuing; in-flight fetches drain and the
/// records collected so far are returned as valid but partial output.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// Requests cancellation of the crawl run holding this token
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    /// Returns true once cancellation has been requested
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

struct FrontierState {
    queue: VecDeque<PendingUrl>,
    visited: HashSet<String>,
    in_flight: usize,
    stats: CrawlStats,
}

/// Shared frontier for one crawl run
pub(crate) struct Frontier {
    state: Mutex<FrontierState>,
    notify: Notify,
    cancel: CancelToken,
    max_pages: usize,
}

impl Frontier {
    pub fn new(max_pages: usize, cancel: CancelToken) -> Self {
        Self {
            state: Mutex::new(FrontierState {
                queue: VecDeque::new(),
                visited: HashSet::new(),
                in_flight: 0,
                stats: CrawlStats::default(),
            }),
            notify: Notify::new(),
            cancel,
            max_pages,
        }
    }

    /// Puts the seed URL into the queue before any worker starts
    pub fn seed(&self, pending: PendingUrl) {
        let mut state = self.state.lock().unwrap();
        state.queue.push_back(pending);
    }

    /// Hands out the next URL to fetch, or None when the run is over
    ///
    /// Dequeued URLs pass the page cap and the visited check-and-set before
    /// they are returned; anything that fails is tallied as skipped and never
    /// reaches a worker. Marking visited here, before the fetch, is the core
    /// correctness guarantee of the dedup scheme.
    ///
    /// Returns None when the queue is empty and no work is in flight, or when
    /// the run is cancelled.
    pub async fn acquire(&self) -> Option<PendingUrl> {
        loop {
            // Register as a waiter before inspecting state so a wakeup
            // between the unlock and the await is not lost.
            let notified = self.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            {
                let mut state = self.state.lock().unwrap();

                if self.cancel.is_cancelled() {
                    self.notify.notify_waiters();
                    return None;
                }

                while let Some(pending) = state.queue.pop_front() {
                    if state.visited.len() >= self.max_pages {
                        state.stats.record(PageOutcome::Skipped(SkipReason::PageLimit));
                        continue;
                    }

                    let key = pending.url.as_str().to_string();
                    if !state.visited.insert(key) {
                        state.stats.record(PageOutcome::Skipped(SkipReason::Duplicate));
                        continue;
                    }

                    state.in_flight += 1;
                    return Some(pending);
                }

                if state.in_flight == 0 {
                    // Frontier drained and nobody can produce more work
                    self.notify.notify_waiters();
                    return None;
                }
            }

            notified.await;
        }
    }

    /// Finishes one unit of work: records its outcome and enqueues new links
    ///
    /// Links already visited are dropped here; the frontier may still end up
    /// holding the same URL twice (two pages linking to it concurrently),
    /// which the dequeue-time membership test resolves.
    pub fn release(&self, outcome: PageOutcome, links: Vec<PendingUrl>) {
        let mut state = self.state.lock().unwrap();
        state.stats.record(outcome);

        if !self.cancel.is_cancelled() {
            for link in links {
                state.stats.urls_discovered += 1;
                if !state.visited.contains(link.url.as_str()) {
                    state.queue.push_back(link);
                }
            }
        }

        state.in_flight -= 1;
        drop(state);

        // Wake idle workers: either new work arrived or the run just drained.
        self.notify.notify_waiters();
    }

    /// Number of URLs marked visited so far
    pub fn visited_count(&self) -> usize {
        self.state.lock().unwrap().visited.len()
    }

    /// Snapshot of the run statistics
    pub fn stats(&self) -> CrawlStats {
        self.state.lock().unwrap().stats.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pending(url: &str, depth: u32) -> PendingUrl {
        PendingUrl {
            url: Url::parse(url).unwrap(),
            depth,
        }
    }

    #[tokio::test]
    async fn test_acquire_returns_seed() {
        let frontier = Frontier::new(10, CancelToken::default());
        frontier.seed(pending("https://example.com/", 0));

        let got = frontier.acquire().await.unwrap();
        assert_eq!(got.url.as_str(), "https://example.com/");
        assert_eq!(got.depth, 0);
        assert_eq!(frontier.visited_count(), 1);
    }

    #[tokio::test]
    async fn test_empty_frontier_finishes_immediately() {
        let frontier = Frontier::new(10, CancelToken::default());
        assert!(frontier.acquire().await.is_none());
    }

    #[tokio::test]
    async fn test_duplicate_discarded_at_dequeue() {
        let frontier = Frontier::new(10, CancelToken::default());
        frontier.seed(pending("https://example.com/a", 0));
        frontier.seed(pending("https://example.com/a", 1));

        let first = frontier.acquire().await.unwrap();
        assert_eq!(first.depth, 0);
        frontier.release(PageOutcome::Extracted, vec![]);

        // The second copy of the same URL never reaches a worker
        assert!(frontier.acquire().await.is_none());
        assert_eq!(frontier.stats().skipped_duplicate, 1);
    }

    #[tokio::test]
    async fn test_page_cap_discards_overflow() {
        let frontier = Frontier::new(1, CancelToken::default());
        frontier.seed(pending("https://example.com/a", 0));
        frontier.seed(pending("https://example.com/b", 0));

        let first = frontier.acquire().await.unwrap();
        assert_eq!(first.url.path(), "/a");
        frontier.release(PageOutcome::Extracted, vec![]);

        assert!(frontier.acquire().await.is_none());
        assert_eq!(frontier.stats().skipped_page_limit, 1);
        assert_eq!(frontier.visited_count(), 1);
    }

    #[tokio::test]
    async fn test_release_enqueues_unvisited_links() {
        let frontier = Frontier::new(10, CancelToken::default());
        frontier.seed(pending("https://example.com/", 0));

        let _seed = frontier.acquire().await.unwrap();
        frontier.release(
            PageOutcome::Extracted,
            vec![
                pending("https://example.com/a", 1),
                // Already visited: must not be re-queued
                pending("https://example.com/", 1),
            ],
        );

        let next = frontier.acquire().await.unwrap();
        assert_eq!(next.url.path(), "/a");
        frontier.release(PageOutcome::Extracted, vec![]);

        assert!(frontier.acquire().await.is_none());
        assert_eq!(frontier.stats().urls_discovered, 2);
        assert_eq!(frontier.stats().pages_extracted, 2);
    }

    #[tokio::test]
    async fn test_cancel_stops_dequeue_and_enqueue() {
        let cancel = CancelToken::default();
        let frontier = Frontier::new(10, cancel.clone());
        frontier.seed(pending("https://example.com/", 0));

        let _seed = frontier.acquire().await.unwrap();
        cancel.cancel();

        frontier.release(
            PageOutcome::Extracted,
            vec![pending("https://example.com/a", 1)],
        );

        assert!(frontier.acquire().await.is_none());
        // The link discovered after cancellation was never queued
        assert_eq!(frontier.visited_count(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_acquire_never_duplicates() {
        let frontier = Arc::new(Frontier::new(100, CancelToken::default()));
        for i in 0..50 {
            frontier.seed(pending(&format!("https://example.com/p{}", i), 0));
            // Every URL queued twice
            frontier.seed(pending(&format!("https://example.com/p{}", i), 0));
        }

        let mut handles = Vec::new();
        for _ in 0..8 {
            let frontier = frontier.clone();
            handles.push(tokio::spawn(async move {
                let mut seen = Vec::new();
                while let Some(p) = frontier.acquire().await {
                    seen.push(p.url.to_string());
                    frontier.release(PageOutcome::Extracted, vec![]);
                }
                seen
            }));
        }

        let mut all = Vec::new();
        for handle in handles {
            all.extend(handle.await.unwrap());
        }
        all.sort();
        let before = all.len();
        all.dedup();
        assert_eq!(before, all.len(), "a URL was fetched twice");
        assert_eq!(all.len(), 50);
    }
}
