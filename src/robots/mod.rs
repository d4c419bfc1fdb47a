//! Robots.txt handling module
//!
//! A crawl run loads the seed origin's robots.txt exactly once and consults it
//! for every URL. Fetch failures degrade to an allow-all policy so an absent
//! or broken robots.txt never blocks a crawl.

mod parser;

pub use parser::ParsedRobots;

use reqwest::Client;
use url::Url;

/// Capability for deciding whether a URL may be fetched
///
/// The crawl engine only sees this trait, so tests can substitute a
/// deny-list or allow-all double without any network traffic.
pub trait RobotsPolicy: Send + Sync {
    /// Returns true if the crawler may fetch the given URL
    fn is_allowed(&self, url: &Url) -> bool;

    /// Crawl delay requested by the site for our agent, in seconds
    fn crawl_delay(&self) -> Option<f64> {
        None
    }
}

/// Policy that permits every URL
///
/// Used when robots.txt cannot be fetched and as a test double.
#[derive(Debug, Default, Clone)]
pub struct AllowAll;

impl RobotsPolicy for AllowAll {
    fn is_allowed(&self, _url: &Url) -> bool {
        true
    }
}

/// Robots policy for one site, bound to the crawler's user agent
#[derive(Debug, Clone)]
pub struct SiteRobots {
    parsed: ParsedRobots,
    user_agent: String,
}

impl SiteRobots {
    /// Wraps parsed robots.txt content for the given user agent
    pub fn new(parsed: ParsedRobots, user_agent: impl Into<String>) -> Self {
        Self {
            parsed,
            user_agent: user_agent.into(),
        }
    }
}

impl RobotsPolicy for SiteRobots {
    fn is_allowed(&self, url: &Url) -> bool {
        self.parsed.is_allowed(url.as_str(), &self.user_agent)
    }

    fn crawl_delay(&self) -> Option<f64> {
        self.parsed.crawl_delay(&self.user_agent)
    }
}

/// Fetches and parses robots.txt from the seed's origin
///
/// Called once per crawl run. Any failure (network error, non-200 status,
/// unreadable body) yields an allow-all policy; a missing robots.txt is not
/// an error condition for the crawl.
///
/// # Arguments
///
/// * `client` - The crawl run's HTTP client (carries the user agent)
/// * `seed` - The seed URL whose origin is consulted
/// * `user_agent` - User agent string matched against robots.txt groups
pub async fn load_robots(client: &Client, seed: &Url, user_agent: &str) -> SiteRobots {
    let robots_url = match seed.join("/robots.txt") {
        Ok(u) => u,
        Err(e) => {
            tracing::warn!("Cannot build robots.txt URL from {}: {}", seed, e);
            return SiteRobots::new(ParsedRobots::allow_all(), user_agent);
        }
    };

    match client.get(robots_url.clone()).send().await {
        Ok(response) if response.status().is_success() => match response.text().await {
            Ok(body) => {
                tracing::debug!("Loaded robots.txt from {} ({} bytes)", robots_url, body.len());
                SiteRobots::new(ParsedRobots::from_content(&body), user_agent)
            }
            Err(e) => {
                tracing::warn!("Failed to read robots.txt body from {}: {}", robots_url, e);
                SiteRobots::new(ParsedRobots::allow_all(), user_agent)
            }
        },
        Ok(response) => {
            tracing::debug!(
                "robots.txt at {} returned HTTP {}, allowing all",
                robots_url,
                response.status()
            );
            SiteRobots::new(ParsedRobots::allow_all(), user_agent)
        }
        Err(e) => {
            tracing::debug!("Failed to fetch robots.txt from {}: {}", robots_url, e);
            SiteRobots::new(ParsedRobots::allow_all(), user_agent)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allow_all_permits_everything() {
        let policy = AllowAll;
        let url = Url::parse("https://example.com/admin").unwrap();
        assert!(policy.is_allowed(&url));
        assert!(policy.crawl_delay().is_none());
    }

    #[test]
    fn test_site_robots_disallow() {
        let parsed = ParsedRobots::from_content("User-agent: *\nDisallow: /private");
        let policy = SiteRobots::new(parsed, "TestBot/1.0");

        let open = Url::parse("https://example.com/page").unwrap();
        let closed = Url::parse("https://example.com/private/doc").unwrap();
        assert!(policy.is_allowed(&open));
        assert!(!policy.is_allowed(&closed));
    }

    #[test]
    fn test_site_robots_crawl_delay() {
        let parsed = ParsedRobots::from_content("User-agent: *\nCrawl-delay: 2.5\nDisallow: /x");
        let policy = SiteRobots::new(parsed, "TestBot/1.0");
        assert_eq!(policy.crawl_delay(), Some(2.5));
    }
}
