//! Site-Radius: thematic cohesion analysis for websites
//!
//! This crate crawls a single website politely and concurrently, extracts the
//! textual content of its pages, embeds each page as a semantic vector, and
//! condenses the result into a focus score and radius describing how tightly
//! the site clusters around one topic.

pub mod analyzer;
pub mod config;
pub mod crawler;
pub mod pipeline;
pub mod progress;
pub mod results;
pub mod robots;
pub mod url;

use thiserror::Error;

/// Main error type for Site-Radius operations
#[derive(Debug, Error)]
pub enum SiteRadiusError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Analysis error: {0}")]
    Analysis(#[from] analyzer::AnalysisError),

    #[error("Embedding error: {0}")]
    Embedding(#[from] analyzer::EmbedError),

    #[error("Results store error: {0}")]
    Results(#[from] results::ResultsError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Crawl task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing domain in URL")]
    MissingDomain,

    #[error("Malformed URL: {0}")]
    Malformed(String),
}

/// Result type alias for Site-Radius operations
pub type Result<T> = std::result::Result<T, SiteRadiusError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use analyzer::{Analyzer, CohesionResult, TextEmbedder};
pub use config::Config;
pub use crawler::{CrawlLimits, PageRecord};
pub use self::url::{extract_domain, normalize_url, same_site};
