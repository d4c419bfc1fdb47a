//! Orchestration: crawl a site, analyze its pages, store the result
//!
//! One call chains the two components. There is no streaming between the
//! stages; the analyzer needs the complete page set before the centroid
//! exists. The analyzer is synchronous, so it runs on the blocking pool.

use crate::analyzer::{Analyzer, CohesionResult, TextEmbedder};
use crate::config::Config;
use crate::crawler::{CancelToken, CrawlEngine, CrawlStats};
use crate::progress::{report, ProgressFn};
use crate::results::ResultsStore;
use crate::url::normalize_url;
use crate::Result;
use sha2::{Digest, Sha256};
use std::sync::Arc;

/// Share of overall progress attributed to the crawl stage
const CRAWL_PROGRESS_SHARE: f32 = 70.0;

/// Output of one complete pipeline run
#[derive(Debug)]
pub struct SiteAnalysisRun {
    /// Id under which the result was stored
    pub analysis_id: String,

    /// The complete, immutable analysis
    pub result: CohesionResult,

    /// Terminal-outcome tallies from the crawl stage
    pub crawl_stats: CrawlStats,
}

/// Derives a stable analysis id from the run parameters
///
/// Ids are hex, so they are always path-safe for the results store.
pub fn analysis_id(seed_url: &str, max_pages: usize) -> String {
    let mut hasher = Sha256::new();
    hasher.update(seed_url.as_bytes());
    hasher.update(b"|");
    hasher.update(max_pages.to_string().as_bytes());
    let digest = hex::encode(hasher.finalize());
    digest[..16].to_string()
}

/// Crawls, analyzes, and stores one site
///
/// The crawl maps to the first 70% of reported progress, the analysis to the
/// rest. Cancellation stops the crawl stage; pages collected before the
/// cancel still flow into the analysis.
///
/// # Arguments
///
/// * `config` - Loaded configuration (limits, user agent, embedding, output)
/// * `seed_url` - Where the crawl starts
/// * `embedder` - The embedding model to analyze with
/// * `store` - Sink that receives the finished result
/// * `progress` - Optional overall progress callback
/// * `cancel` - Optional externally owned cancellation token
pub async fn run_site_analysis(
    config: &Config,
    seed_url: &str,
    embedder: Arc<dyn TextEmbedder>,
    store: &dyn ResultsStore,
    progress: Option<ProgressFn>,
    cancel: Option<CancelToken>,
) -> Result<SiteAnalysisRun> {
    // Reject bad input before any work starts
    let seed = normalize_url(seed_url)?;

    let mut engine = CrawlEngine::from_config(config)?;
    if let Some(progress) = &progress {
        engine = engine.with_progress(scaled(progress.clone(), 0.0, CRAWL_PROGRESS_SHARE));
    }
    if let Some(cancel) = cancel {
        engine = engine.with_cancel_token(cancel);
    }

    let crawl_report = engine.run(seed.as_str()).await?;
    report(
        progress.as_ref(),
        CRAWL_PROGRESS_SHARE,
        &format!("Crawl complete: {} pages", crawl_report.records.len()),
    );

    let mut analyzer =
        Analyzer::new(embedder).with_batch_size(config.embedding.batch_size);
    if let Some(progress) = &progress {
        analyzer = analyzer.with_progress(scaled(progress.clone(), CRAWL_PROGRESS_SHARE, 100.0));
    }

    // The analyzer blocks on the embedding model; keep it off the executor.
    let records = crawl_report.records;
    let seed_string = seed.to_string();
    let result =
        tokio::task::spawn_blocking(move || analyzer.analyze(&seed_string, &records)).await??;

    let analysis_id = analysis_id(seed.as_str(), config.crawler.max_pages);
    store.store(&analysis_id, &result)?;
    tracing::info!("Stored analysis {} for {}", analysis_id, seed);

    Ok(SiteAnalysisRun {
        analysis_id,
        result,
        crawl_stats: crawl_report.stats,
    })
}

/// Maps a stage's 0-100% progress into a slice of the overall range
fn scaled(progress: ProgressFn, start: f32, end: f32) -> ProgressFn {
    Arc::new(move |percent, message| {
        let overall = start + percent / 100.0 * (end - start);
        progress(overall, message);
    })
}
