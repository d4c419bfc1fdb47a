//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler:
//! - Building the HTTP client with the structured user agent string
//! - Fetching pages with a per-request timeout
//! - Classifying responses into outcomes the engine acts on

use reqwest::{Client, StatusCode};
use std::time::Duration;
use url::Url;

/// Per-request timeout; guarantees the run terminates against hanging servers
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Connect-phase timeout
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Result of fetching one URL
#[derive(Debug)]
pub enum FetchOutcome {
    /// Successfully fetched an HTML page
    Html {
        /// Response body
        body: String,
    },

    /// Page is not HTML (Content-Type mismatch)
    NotHtml {
        /// The actual Content-Type received
        content_type: String,
    },

    /// Server answered with a non-success status
    HttpError {
        /// The HTTP status code
        status: u16,
    },

    /// Network-level failure (connection refused, timeout, TLS error)
    NetworkError {
        /// Error description
        error: String,
        /// Whether the request timed out
        timed_out: bool,
    },
}

/// Builds the HTTP client used for a crawl run
///
/// The client carries the structured user agent, request and connect
/// timeouts, and transparent gzip/brotli decompression. Redirects follow
/// reqwest's default policy (up to 10 hops).
///
/// # Arguments
///
/// * `user_agent` - Full user agent string, e.g. `SiteRadius/1.0 (+https://...; ops@...)`
pub fn build_http_client(user_agent: &str) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent)
        .timeout(REQUEST_TIMEOUT)
        .connect_timeout(CONNECT_TIMEOUT)
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches a URL and classifies the response
///
/// Every failure mode maps to a `FetchOutcome` variant; this function never
/// returns an error, because a single bad URL must not abort the crawl run.
///
/// # Arguments
///
/// * `client` - The HTTP client to use
/// * `url` - The URL to fetch
pub async fn fetch_page(client: &Client, url: &Url) -> FetchOutcome {
    let response = match client.get(url.clone()).send().await {
        Ok(response) => response,
        Err(e) => {
            return FetchOutcome::NetworkError {
                timed_out: e.is_timeout(),
                error: e.to_string(),
            };
        }
    };

    let status = response.status();
    if !status.is_success() {
        return FetchOutcome::HttpError {
            status: status.as_u16(),
        };
    }

    let content_type = response
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();

    if !content_type.contains("text/html") && !content_type.contains("application/xhtml") {
        return FetchOutcome::NotHtml { content_type };
    }

    match response.text().await {
        Ok(body) => FetchOutcome::Html { body },
        Err(e) => FetchOutcome::NetworkError {
            timed_out: e.is_timeout(),
            error: e.to_string(),
        },
    }
}

/// Returns true for statuses worth mentioning at warn level
///
/// 404s on discovered links are routine; server errors are not.
pub fn is_server_error(status: u16) -> bool {
    StatusCode::from_u16(status)
        .map(|s| s.is_server_error())
        .unwrap_or(false)
}
