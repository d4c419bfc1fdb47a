//! Cohesion analyzer - from page records to a thematic cohesion result
//!
//! The analyzer embeds every page, derives the site centroid, and aggregates
//! per-page similarities into the focus score, radius, histogram, composition
//! and cluster outputs. It performs no I/O beyond the embedding model and is
//! synchronous; async callers run it via `spawn_blocking`.

mod embedder;
mod metrics;
mod types;

pub use embedder::{EmbedError, EmbeddingCache, HttpEmbedder, TextEmbedder};
pub use metrics::{
    centroid, content_composition, cosine_similarity, info_density, normalize,
    similarity_histogram,
};
pub use types::{
    AnalysisMetadata, CategoryBreakdown, ClusterPoint, CohesionResult, ContentComposition,
    PageCategory, PageMetric, SimilarityBin,
};

use crate::crawler::PageRecord;
use crate::progress::{report, ProgressFn};
use chrono::Utc;
use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;

/// Maximum characters of page text submitted to the embedding model
const MAX_EMBED_CHARS: usize = 10_000;

/// Errors that end an analysis
///
/// Per-page embedding failures are not here: those pages are omitted and
/// counted, and only an empty survivor set escalates to `InsufficientData`.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// No pages to analyze, or every page was omitted
    #[error("insufficient data: no analyzable pages ({omitted} omitted)")]
    InsufficientData { omitted: usize },

    /// Page vectors cancel to a zero mean; no central theme is definable
    #[error("degenerate centroid: page vectors cancel to zero")]
    DegenerateCentroid,
}

/// Cohesion analyzer bound to one embedding model
pub struct Analyzer {
    embedder: Arc<dyn TextEmbedder>,
    batch_size: usize,
    cache: EmbeddingCache,
    progress: Option<ProgressFn>,
}

impl Analyzer {
    /// Creates an analyzer using the given embedding model
    pub fn new(embedder: Arc<dyn TextEmbedder>) -> Self {
        Self {
            embedder,
            batch_size: 32,
            cache: EmbeddingCache::new(),
            progress: None,
        }
    }

    /// Overrides the embedding batch size (default 32)
    ///
    /// Batching affects throughput only; the numeric output is identical for
    /// every batch size.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Installs a progress callback
    pub fn with_progress(mut self, progress: ProgressFn) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Analyzes a complete set of page records
    ///
    /// The full page set is required up front: per-page similarity is only
    /// meaningful against the global centroid.
    ///
    /// # Arguments
    ///
    /// * `seed_url` - Recorded in the result metadata
    /// * `records` - The crawl's extracted pages
    ///
    /// # Errors
    ///
    /// * `InsufficientData` - empty input, or every page was omitted
    /// * `DegenerateCentroid` - page vectors cancel to a zero mean
    pub fn analyze(
        &self,
        seed_url: &str,
        records: &[PageRecord],
    ) -> Result<CohesionResult, AnalysisError> {
        if records.is_empty() {
            return Err(AnalysisError::InsufficientData { omitted: 0 });
        }

        tracing::info!("Analyzing {} pages from {}", records.len(), seed_url);
        report(
            self.progress.as_ref(),
            0.0,
            &format!("Embedding {} pages", records.len()),
        );

        // Truncation bounds memory and time per page; the cache key is the
        // truncated text, i.e. exactly what the model sees.
        let texts: Vec<&str> = records
            .iter()
            .map(|record| truncate_chars(&record.text, MAX_EMBED_CHARS))
            .collect();
        let keys: Vec<String> = texts
            .iter()
            .map(|text| EmbeddingCache::content_key(text))
            .collect();

        self.embed_missing(&texts, &keys);

        // Collect survivors in record order so downstream sums are stable.
        let mut analyzed: Vec<(usize, Arc<Vec<f32>>)> = Vec::with_capacity(records.len());
        let mut omitted = 0usize;
        for (index, key) in keys.iter().enumerate() {
            if texts[index].trim().is_empty() {
                tracing::warn!("Omitting {}: empty text after truncation", records[index].url);
                omitted += 1;
                continue;
            }
            match self.cache.get(key) {
                Some(vector) => analyzed.push((index, vector)),
                None => {
                    tracing::warn!("Omitting {}: embedding unavailable", records[index].url);
                    omitted += 1;
                }
            }
        }

        if analyzed.is_empty() {
            return Err(AnalysisError::InsufficientData { omitted });
        }

        report(self.progress.as_ref(), 60.0, "Computing centroid");

        let views: Vec<&[f32]> = analyzed.iter().map(|(_, v)| v.as_slice()).collect();
        let center = centroid(&views).ok_or(AnalysisError::DegenerateCentroid)?;

        let similarities: Vec<f64> = views
            .iter()
            .map(|vector| cosine_similarity(vector, &center))
            .collect();

        let focus_score = similarities.iter().sum::<f64>() / similarities.len() as f64;
        let radius = 1.0 - focus_score;

        report(self.progress.as_ref(), 80.0, "Aggregating metrics");

        let similarity_distribution = similarity_histogram(&similarities);
        let categories: Vec<PageCategory> = similarities
            .iter()
            .map(|&s| PageCategory::from_similarity(s))
            .collect();
        let content_composition = content_composition(&categories);

        let mut content_clusters = Vec::with_capacity(analyzed.len());
        let mut page_metrics = Vec::with_capacity(analyzed.len());
        for (position, (index, _)) in analyzed.iter().enumerate() {
            let record = &records[*index];
            let similarity = similarities[position];
            let category = categories[position];
            let content_length = record.text.chars().count();
            let density = info_density(content_length);

            content_clusters.push(ClusterPoint {
                url: record.url.to_string(),
                topic_alignment: similarity,
                info_density: density,
                category,
            });
            page_metrics.push(PageMetric {
                url: record.url.to_string(),
                similarity,
                distance: 1.0 - similarity,
                content_length,
                info_density: density,
            });
        }

        let metadata = AnalysisMetadata {
            seed_url: seed_url.to_string(),
            page_count: analyzed.len(),
            omitted_pages: omitted,
            model: self.embedder.model_id().to_string(),
            generated_at: Utc::now(),
        };

        tracing::info!(
            "Analysis complete: focus score {:.4}, radius {:.4}, {} pages ({} omitted)",
            focus_score,
            radius,
            metadata.page_count,
            omitted
        );
        report(self.progress.as_ref(), 100.0, "Analysis complete");

        Ok(CohesionResult {
            focus_score,
            radius,
            similarity_distribution,
            content_composition,
            content_clusters,
            page_metrics,
            metadata,
        })
    }

    /// Embeds every text the cache does not yet hold
    ///
    /// Texts are deduplicated by content key before batching, normalized to
    /// unit length on arrival, and cached. A failed batch omits its pages
    /// (they stay absent from the cache) without ending the analysis.
    fn embed_missing(&self, texts: &[&str], keys: &[String]) {
        let mut seen = HashSet::new();
        let pending: Vec<(&str, &str)> = texts
            .iter()
            .zip(keys.iter())
            .filter(|(text, _)| !text.trim().is_empty())
            .filter(|(_, key)| self.cache.get(key).is_none() && seen.insert(key.as_str()))
            .map(|(text, key)| (*text, key.as_str()))
            .collect();

        if pending.is_empty() {
            return;
        }
        tracing::debug!(
            "Embedding {} unique texts in batches of {}",
            pending.len(),
            self.batch_size
        );

        for chunk in pending.chunks(self.batch_size) {
            let inputs: Vec<&str> = chunk.iter().map(|(text, _)| *text).collect();

            let vectors = match self.embedder.embed_batch(&inputs) {
                Ok(vectors) if vectors.len() == inputs.len() => vectors,
                Ok(vectors) => {
                    tracing::warn!(
                        "Embedding batch returned {} vectors for {} inputs, omitting batch",
                        vectors.len(),
                        inputs.len()
                    );
                    continue;
                }
                Err(e) => {
                    tracing::warn!("Embedding batch failed, omitting {} pages: {}", inputs.len(), e);
                    continue;
                }
            };

            for ((_, key), mut vector) in chunk.iter().zip(vectors) {
                if normalize(&mut vector) {
                    self.cache.insert((*key).to_string(), Arc::new(vector));
                } else {
                    tracing::warn!("Zero-norm embedding, page will be omitted");
                }
            }
        }
    }
}

/// Truncates text to at most `max_chars` characters on a char boundary
fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => &text[..byte_index],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use url::Url;

    /// Embedder returning fixed vectors per text prefix
    struct StubEmbedder {
        vectors: HashMap<String, Vec<f32>>,
    }

    impl StubEmbedder {
        fn new(entries: &[(&str, Vec<f32>)]) -> Self {
            Self {
                vectors: entries
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.clone()))
                    .collect(),
            }
        }
    }

    impl TextEmbedder for StubEmbedder {
        fn model_id(&self) -> &str {
            "stub-model"
        }

        fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbedError> {
            texts
                .iter()
                .map(|text| {
                    self.vectors.get(*text).cloned().ok_or(EmbedError::Api {
                        status: 400,
                        message: format!("unknown text: {}", text),
                    })
                })
                .collect()
        }
    }

    /// Deterministic embedder deriving a vector from the text bytes
    struct HashingEmbedder;

    impl TextEmbedder for HashingEmbedder {
        fn model_id(&self) -> &str {
            "hashing-model"
        }

        fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbedError> {
            Ok(texts
                .iter()
                .map(|text| {
                    let digest = sha2::Sha256::digest(text.as_bytes());
                    digest.iter().take(8).map(|&b| b as f32 + 1.0).collect()
                })
                .collect())
        }
    }

    use sha2::Digest;

    fn record(url: &str, text: &str) -> PageRecord {
        PageRecord {
            url: Url::parse(url).unwrap(),
            text: text.to_string(),
            depth: 0,
        }
    }

    #[test]
    fn test_empty_input_is_insufficient_data() {
        let analyzer = Analyzer::new(Arc::new(HashingEmbedder));
        match analyzer.analyze("https://example.com/", &[]) {
            Err(AnalysisError::InsufficientData { omitted: 0 }) => {}
            other => panic!("expected InsufficientData, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_single_page_focus_is_one() {
        let analyzer = Analyzer::new(Arc::new(HashingEmbedder));
        let records = vec![record("https://example.com/", &"word ".repeat(50))];

        let result = analyzer.analyze("https://example.com/", &records).unwrap();
        assert!((result.focus_score - 1.0).abs() < 1e-6);
        assert!(result.radius.abs() < 1e-6);
        assert_eq!(result.metadata.page_count, 1);
        assert_eq!(result.metadata.omitted_pages, 0);
        assert_eq!(result.metadata.model, "hashing-model");
    }

    #[test]
    fn test_focus_plus_radius_is_one() {
        let analyzer = Analyzer::new(Arc::new(HashingEmbedder));
        let records = vec![
            record("https://example.com/a", "alpha beta gamma delta"),
            record("https://example.com/b", "completely different words here"),
            record("https://example.com/c", "a third page about nothing"),
        ];

        let result = analyzer.analyze("https://example.com/", &records).unwrap();
        assert!((result.focus_score + result.radius - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_counts_sum_to_page_count() {
        let analyzer = Analyzer::new(Arc::new(HashingEmbedder));
        let records: Vec<PageRecord> = (0..7)
            .map(|i| {
                record(
                    &format!("https://example.com/p{}", i),
                    &format!("page number {} with some filler text", i),
                )
            })
            .collect();

        let result = analyzer.analyze("https://example.com/", &records).unwrap();

        let histogram_total: usize = result
            .similarity_distribution
            .iter()
            .map(|bin| bin.count)
            .sum();
        assert_eq!(histogram_total, 7);
        assert_eq!(result.content_composition.total(), 7);
        assert_eq!(result.content_clusters.len(), 7);
        assert_eq!(result.page_metrics.len(), 7);
    }

    #[test]
    fn test_cluster_categories_match_composition() {
        let analyzer = Analyzer::new(Arc::new(HashingEmbedder));
        let records: Vec<PageRecord> = (0..5)
            .map(|i| record(&format!("https://example.com/p{}", i), &format!("text {}", i)))
            .collect();

        let result = analyzer.analyze("https://example.com/", &records).unwrap();

        let central = result
            .content_clusters
            .iter()
            .filter(|p| p.category == PageCategory::Central)
            .count();
        let support = result
            .content_clusters
            .iter()
            .filter(|p| p.category == PageCategory::Support)
            .count();
        let peripheral = result
            .content_clusters
            .iter()
            .filter(|p| p.category == PageCategory::Peripheral)
            .count();

        assert_eq!(central, result.content_composition.central.count);
        assert_eq!(support, result.content_composition.support.count);
        assert_eq!(peripheral, result.content_composition.peripheral.count);
    }

    #[test]
    fn test_batch_size_does_not_change_focus_score() {
        let records: Vec<PageRecord> = (0..9)
            .map(|i| {
                record(
                    &format!("https://example.com/p{}", i),
                    &format!("unique page content number {}", i),
                )
            })
            .collect();

        let mut scores = Vec::new();
        for batch_size in [1, 2, 4, 32] {
            let analyzer =
                Analyzer::new(Arc::new(HashingEmbedder)).with_batch_size(batch_size);
            let result = analyzer.analyze("https://example.com/", &records).unwrap();
            scores.push(result.focus_score);
        }

        for score in &scores[1..] {
            assert_eq!(*score, scores[0]);
        }
    }

    #[test]
    fn test_two_similar_one_outlier_scenario() {
        // Two pages ~0.95 similar to each other, one nearly orthogonal
        let embedder = StubEmbedder::new(&[
            ("rust programming tutorial", vec![0.98769, 0.15643, 0.0]),
            ("rust programming reference", vec![0.98769, -0.15643, 0.0]),
            ("banana bread recipe", vec![0.10125, 0.0, 0.99486]),
        ]);
        let analyzer = Analyzer::new(Arc::new(embedder));
        let records = vec![
            record("https://example.com/tutorial", "rust programming tutorial"),
            record("https://example.com/reference", "rust programming reference"),
            record("https://example.com/recipe", "banana bread recipe"),
        ];

        let result = analyzer.analyze("https://example.com/", &records).unwrap();

        assert!(
            result.focus_score > 0.6 && result.focus_score < 0.8,
            "focus score {} outside expected band",
            result.focus_score
        );
        assert_eq!(
            result.content_composition.central.count + result.content_composition.support.count,
            2
        );
        assert_eq!(result.content_composition.peripheral.count, 1);
    }

    #[test]
    fn test_failed_page_is_omitted_not_fatal() {
        // Only two of three texts are known to the stub; with batch size 1
        // the unknown page fails alone and is omitted.
        let embedder = StubEmbedder::new(&[
            ("known page one", vec![1.0, 0.0]),
            ("known page two", vec![0.9, 0.1]),
        ]);
        let analyzer = Analyzer::new(Arc::new(embedder)).with_batch_size(1);
        let records = vec![
            record("https://example.com/a", "known page one"),
            record("https://example.com/b", "mystery page"),
            record("https://example.com/c", "known page two"),
        ];

        let result = analyzer.analyze("https://example.com/", &records).unwrap();
        assert_eq!(result.metadata.page_count, 2);
        assert_eq!(result.metadata.omitted_pages, 1);
        assert_eq!(result.page_metrics.len(), 2);
    }

    #[test]
    fn test_all_pages_omitted_is_insufficient_data() {
        let embedder = StubEmbedder::new(&[]);
        let analyzer = Analyzer::new(Arc::new(embedder));
        let records = vec![record("https://example.com/a", "nobody knows this text")];

        match analyzer.analyze("https://example.com/", &records) {
            Err(AnalysisError::InsufficientData { omitted: 1 }) => {}
            other => panic!("expected InsufficientData, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_opposing_vectors_degenerate_centroid() {
        let embedder = StubEmbedder::new(&[
            ("page east", vec![1.0, 0.0]),
            ("page west", vec![-1.0, 0.0]),
        ]);
        let analyzer = Analyzer::new(Arc::new(embedder));
        let records = vec![
            record("https://example.com/a", "page east"),
            record("https://example.com/b", "page west"),
        ];

        match analyzer.analyze("https://example.com/", &records) {
            Err(AnalysisError::DegenerateCentroid) => {}
            other => panic!("expected DegenerateCentroid, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_identical_text_embedded_once() {
        let analyzer = Analyzer::new(Arc::new(HashingEmbedder));
        let records = vec![
            record("https://example.com/a", "the same boilerplate text"),
            record("https://example.com/b", "the same boilerplate text"),
        ];

        let result = analyzer.analyze("https://example.com/", &records).unwrap();
        // Identical vectors: both pages are their own centroid
        assert!((result.focus_score - 1.0).abs() < 1e-6);
        assert_eq!(analyzer.cache.len(), 1);
        assert_eq!(result.metadata.page_count, 2);
    }

    #[test]
    fn test_truncate_chars_respects_boundaries() {
        assert_eq!(truncate_chars("hello", 10), "hello");
        assert_eq!(truncate_chars("hello", 3), "hel");
        // Multi-byte characters are never split
        assert_eq!(truncate_chars("héllo", 2), "hé");
    }
}
