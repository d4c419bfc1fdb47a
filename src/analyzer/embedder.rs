//! Text embedding: capability trait, HTTP client, and content-addressed cache
//!
//! The analyzer only sees the `TextEmbedder` trait, so tests substitute
//! deterministic doubles without touching analysis logic. The production
//! implementation talks to OpenAI-compatible `/embeddings` endpoints with a
//! blocking client; the analyzer is synchronous and runs off the async
//! executor.

use crate::config::EmbeddingConfig;
use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use thiserror::Error;

/// Errors from the embedding model
#[derive(Debug, Error)]
pub enum EmbedError {
    #[error("API key environment variable '{0}' is not set")]
    MissingApiKey(String),

    #[error("embedding request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("embedding API returned HTTP {status}: {message}")]
    Api { status: u16, message: String },

    #[error("embedding API returned {got} vectors for {expected} inputs")]
    CountMismatch { expected: usize, got: usize },
}

/// Capability for turning text into fixed-length vectors
pub trait TextEmbedder: Send + Sync {
    /// Identifier of the underlying model, recorded in result metadata
    fn model_id(&self) -> &str;

    /// Embeds a batch of texts, one vector per input, in input order
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbedError>;
}

/// Blocking client for OpenAI-compatible embedding endpoints
pub struct HttpEmbedder {
    client: Client,
    endpoint: String,
    model: String,
    max_retries: usize,
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [&'a str],
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingRow>,
}

#[derive(Deserialize)]
struct EmbeddingRow {
    index: usize,
    embedding: Vec<f32>,
}

impl HttpEmbedder {
    /// Builds a client for the given endpoint
    ///
    /// # Arguments
    ///
    /// * `base_url` - API base, e.g. `https://api.example.com/v1`
    /// * `model` - Model identifier sent with every request
    /// * `api_key` - Bearer token
    /// * `timeout` - Per-request timeout
    /// * `max_retries` - Retries for 429 and 5xx responses
    pub fn new(
        base_url: &str,
        model: &str,
        api_key: &str,
        timeout: Duration,
        max_retries: usize,
    ) -> Result<Self, EmbedError> {
        let mut headers = reqwest::header::HeaderMap::new();
        let auth = format!("Bearer {}", api_key.trim());
        if let Ok(value) = reqwest::header::HeaderValue::from_str(&auth) {
            headers.insert(reqwest::header::AUTHORIZATION, value);
        }

        let client = Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            endpoint: format!("{}/embeddings", base_url.trim_end_matches('/')),
            model: model.to_string(),
            max_retries,
        })
    }

    /// Builds a client from the loaded configuration
    ///
    /// Reads the API key from the environment variable the configuration
    /// names; the key itself never appears in the config file.
    pub fn from_config(config: &EmbeddingConfig) -> Result<Self, EmbedError> {
        let api_key = std::env::var(&config.api_key_env)
            .map_err(|_| EmbedError::MissingApiKey(config.api_key_env.clone()))?;

        Self::new(
            &config.endpoint,
            &config.model,
            &api_key,
            Duration::from_secs(config.timeout_secs),
            config.max_retries,
        )
    }
}

impl TextEmbedder for HttpEmbedder {
    fn model_id(&self) -> &str {
        &self.model
    }

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbedError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let request = EmbeddingRequest {
            model: &self.model,
            input: texts,
        };

        let mut attempt = 0usize;
        loop {
            let response = self.client.post(&self.endpoint).json(&request).send();

            match response {
                Ok(resp) => {
                    let status = resp.status();
                    if status.is_success() {
                        let mut parsed: EmbeddingResponse = resp.json()?;
                        parsed.data.sort_by_key(|row| row.index);

                        if parsed.data.len() != texts.len() {
                            return Err(EmbedError::CountMismatch {
                                expected: texts.len(),
                                got: parsed.data.len(),
                            });
                        }

                        return Ok(parsed.data.into_iter().map(|row| row.embedding).collect());
                    }

                    let retryable =
                        status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error();
                    if retryable && attempt < self.max_retries {
                        attempt += 1;
                        let backoff = Duration::from_millis(500 * attempt as u64);
                        tracing::warn!(
                            "Embedding API returned {}, retry {}/{} in {:?}",
                            status,
                            attempt,
                            self.max_retries,
                            backoff
                        );
                        std::thread::sleep(backoff);
                        continue;
                    }

                    let message = resp.text().unwrap_or_default();
                    return Err(EmbedError::Api {
                        status: status.as_u16(),
                        message,
                    });
                }

                Err(e) => {
                    if attempt < self.max_retries {
                        attempt += 1;
                        let backoff = Duration::from_millis(500 * attempt as u64);
                        tracing::warn!(
                            "Embedding request failed ({}), retry {}/{} in {:?}",
                            e,
                            attempt,
                            self.max_retries,
                            backoff
                        );
                        std::thread::sleep(backoff);
                        continue;
                    }
                    return Err(EmbedError::Http(e));
                }
            }
        }
    }
}

/// Content-addressed cache of embedding vectors
///
/// Keyed by a SHA-256 of the exact embedded text, so identical text across
/// pages is embedded once. Bounded in practice by the page cap; no eviction.
#[derive(Default)]
pub struct EmbeddingCache {
    entries: Mutex<HashMap<String, Arc<Vec<f32>>>>,
}

impl EmbeddingCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cache key for a text: hex-encoded SHA-256 of its bytes
    pub fn content_key(text: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(text.as_bytes());
        hex::encode(hasher.finalize())
    }

    pub fn get(&self, key: &str) -> Option<Arc<Vec<f32>>> {
        self.entries.lock().unwrap().get(key).cloned()
    }

    pub fn insert(&self, key: String, vector: Arc<Vec<f32>>) {
        self.entries.lock().unwrap().insert(key, vector);
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }
}
