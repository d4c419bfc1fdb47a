use serde::Deserialize;

/// Main configuration structure for Site-Radius
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub embedding: EmbeddingConfig,
    pub output: OutputConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Maximum number of pages to fetch in one run
    #[serde(rename = "max-pages")]
    pub max_pages: usize,

    /// Maximum depth to crawl from the seed URL
    #[serde(rename = "max-depth")]
    pub max_depth: u32,

    /// Delay each worker waits before issuing a request (milliseconds)
    #[serde(rename = "request-delay-ms")]
    pub request_delay_ms: u64,

    /// Number of concurrent fetch workers
    #[serde(rename = "worker-count", default = "default_worker_count")]
    pub worker_count: usize,

    /// Minimum extracted text length for a page to count (characters)
    #[serde(rename = "min-content-length", default = "default_min_content_length")]
    pub min_content_length: usize,
}

fn default_worker_count() -> usize {
    10
}

fn default_min_content_length() -> usize {
    100
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

impl UserAgentConfig {
    /// Formats the full user agent string sent with every request
    ///
    /// Format: `CrawlerName/Version (+ContactURL; ContactEmail)`
    pub fn header_value(&self) -> String {
        format!(
            "{}/{} (+{}; {})",
            self.crawler_name, self.crawler_version, self.contact_url, self.contact_email
        )
    }
}

/// Embedding model configuration
#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddingConfig {
    /// Base URL of an OpenAI-compatible embeddings API
    pub endpoint: String,

    /// Model identifier sent with every embedding request
    pub model: String,

    /// Name of the environment variable holding the API key
    #[serde(rename = "api-key-env", default = "default_api_key_env")]
    pub api_key_env: String,

    /// Number of texts embedded per request
    #[serde(rename = "batch-size", default = "default_batch_size")]
    pub batch_size: usize,

    /// Request timeout (seconds)
    #[serde(rename = "timeout-secs", default = "default_embed_timeout")]
    pub timeout_secs: u64,

    /// Retries for transient API failures
    #[serde(rename = "max-retries", default = "default_max_retries")]
    pub max_retries: usize,
}

fn default_api_key_env() -> String {
    "SITE_RADIUS_API_KEY".to_string()
}

fn default_batch_size() -> usize {
    32
}

fn default_embed_timeout() -> u64 {
    30
}

fn default_max_retries() -> usize {
    3
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Directory where analysis result documents are written
    #[serde(rename = "results-dir")]
    pub results_dir: String,
}
