//! Per-URL crawl states and run statistics
//!
//! Every discovered URL moves through a small state machine:
//! `Discovered -> Queued -> Fetching -> { Extracted | Skipped | Failed }`.
//! Terminal states are final; a URL never re-enters the frontier.

use std::fmt;

/// Represents the current state of a URL in the crawl process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageState {
    /// URL was produced by link extraction but not yet queued
    Discovered,

    /// URL is waiting in the frontier
    Queued,

    /// A worker is fetching the URL
    Fetching,

    /// Fetch succeeded and the page yielded enough text for a record
    Extracted,

    /// URL was dropped without a record (duplicate, limit, robots, thin content)
    Skipped,

    /// Fetch or parse failed; the run continues without this URL
    Failed,
}

impl PageState {
    /// Returns true if this is a terminal state (no further processing)
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Extracted | Self::Skipped | Self::Failed)
    }

    /// Returns true if the transition to `next` is legal
    pub fn can_transition_to(&self, next: PageState) -> bool {
        match self {
            Self::Discovered => matches!(next, Self::Queued | Self::Skipped),
            Self::Queued => matches!(next, Self::Fetching | Self::Skipped),
            Self::Fetching => matches!(next, Self::Extracted | Self::Skipped | Self::Failed),
            // Terminal states have no successors
            Self::Extracted | Self::Skipped | Self::Failed => false,
        }
    }
}

impl fmt::Display for PageState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Discovered => "discovered",
            Self::Queued => "queued",
            Self::Fetching => "fetching",
            Self::Extracted => "extracted",
            Self::Skipped => "skipped",
            Self::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Why a URL ended in the Skipped state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// URL was already visited in this run
    Duplicate,

    /// The page cap was reached before this URL was dequeued
    PageLimit,

    /// robots.txt disallows the URL for our agent
    RobotsDisallowed,

    /// Response Content-Type was not HTML
    NotHtml,

    /// Extracted text was below the minimum length
    ThinContent,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Duplicate => "duplicate",
            Self::PageLimit => "page limit reached",
            Self::RobotsDisallowed => "disallowed by robots.txt",
            Self::NotHtml => "not HTML",
            Self::ThinContent => "not enough content",
        };
        f.write_str(s)
    }
}

/// Terminal outcome of processing one URL
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageOutcome {
    Extracted,
    Skipped(SkipReason),
    Failed,
}

impl PageOutcome {
    /// Maps the outcome to its terminal page state
    pub fn terminal_state(&self) -> PageState {
        match self {
            Self::Extracted => PageState::Extracted,
            Self::Skipped(_) => PageState::Skipped,
            Self::Failed => PageState::Failed,
        }
    }
}

/// Tallies of terminal outcomes for one crawl run
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CrawlStats {
    /// URLs that yielded a PageRecord
    pub pages_extracted: u64,

    /// URLs dropped because they were already visited
    pub skipped_duplicate: u64,

    /// URLs dropped because the page cap was reached
    pub skipped_page_limit: u64,

    /// URLs denied by robots.txt
    pub skipped_robots: u64,

    /// Responses with a non-HTML Content-Type
    pub skipped_not_html: u64,

    /// Pages whose extracted text was too short
    pub skipped_thin_content: u64,

    /// Fetches that failed (network, timeout, HTTP error)
    pub failed: u64,

    /// Same-site links discovered and offered to the frontier
    pub urls_discovered: u64,
}

impl CrawlStats {
    /// Records one terminal outcome
    pub fn record(&mut self, outcome: PageOutcome) {
        match outcome {
            PageOutcome::Extracted => self.pages_extracted += 1,
            PageOutcome::Skipped(SkipReason::Duplicate) => self.skipped_duplicate += 1,
            PageOutcome::Skipped(SkipReason::PageLimit) => self.skipped_page_limit += 1,
            PageOutcome::Skipped(SkipReason::RobotsDisallowed) => self.skipped_robots += 1,
            PageOutcome::Skipped(SkipReason::NotHtml) => self.skipped_not_html += 1,
            PageOutcome::Skipped(SkipReason::ThinContent) => self.skipped_thin_content += 1,
            PageOutcome::Failed => self.failed += 1,
        }
    }

    /// Total URLs that reached any terminal state
    pub fn total_terminal(&self) -> u64 {
        self.pages_extracted
            + self.skipped_duplicate
            + self.skipped_page_limit
            + self.skipped_robots
            + self.skipped_not_html
            + self.skipped_thin_content
            + self.failed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_states() {
        assert!(!PageState::Discovered.is_terminal());
        assert!(!PageState::Queued.is_terminal());
        assert!(!PageState::Fetching.is_terminal());
        assert!(PageState::Extracted.is_terminal());
        assert!(PageState::Skipped.is_terminal());
        assert!(PageState::Failed.is_terminal());
    }

    #[test]
    fn test_legal_transitions() {
        assert!(PageState::Discovered.can_transition_to(PageState::Queued));
        assert!(PageState::Queued.can_transition_to(PageState::Fetching));
        assert!(PageState::Fetching.can_transition_to(PageState::Extracted));
        assert!(PageState::Fetching.can_transition_to(PageState::Skipped));
        assert!(PageState::Fetching.can_transition_to(PageState::Failed));
        // Queued URLs can be skipped without fetching (duplicates, page cap)
        assert!(PageState::Queued.can_transition_to(PageState::Skipped));
    }

    #[test]
    fn test_terminal_states_have_no_successors() {
        for terminal in [PageState::Extracted, PageState::Skipped, PageState::Failed] {
            for next in [
                PageState::Discovered,
                PageState::Queued,
                PageState::Fetching,
                PageState::Extracted,
                PageState::Skipped,
                PageState::Failed,
            ] {
                assert!(!terminal.can_transition_to(next));
            }
        }
    }

    #[test]
    fn test_no_skipping_ahead() {
        assert!(!PageState::Discovered.can_transition_to(PageState::Fetching));
        assert!(!PageState::Discovered.can_transition_to(PageState::Extracted));
        assert!(!PageState::Queued.can_transition_to(PageState::Extracted));
    }

    #[test]
    fn test_stats_record() {
        let mut stats = CrawlStats::default();
        stats.record(PageOutcome::Extracted);
        stats.record(PageOutcome::Extracted);
        stats.record(PageOutcome::Skipped(SkipReason::Duplicate));
        stats.record(PageOutcome::Failed);

        assert_eq!(stats.pages_extracted, 2);
        assert_eq!(stats.skipped_duplicate, 1);
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.total_terminal(), 4);
    }

    #[test]
    fn test_outcome_terminal_state() {
        assert_eq!(PageOutcome::Extracted.terminal_state(), PageState::Extracted);
        assert_eq!(
            PageOutcome::Skipped(SkipReason::RobotsDisallowed).terminal_state(),
            PageState::Skipped
        );
        assert_eq!(PageOutcome::Failed.terminal_state(), PageState::Failed);
    }
}
