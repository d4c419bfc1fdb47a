//! Site-Radius main entry point
//!
//! Command-line interface for crawling a site and computing its thematic
//! cohesion metrics.

use clap::Parser;
use site_radius::analyzer::{CohesionResult, HttpEmbedder};
use site_radius::config::load_config_with_hash;
use site_radius::pipeline::run_site_analysis;
use site_radius::progress::ProgressFn;
use site_radius::results::{JsonFileStore, ResultsStore};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Site-Radius: thematic cohesion analysis for websites
///
/// Crawls a site politely, embeds each page's text, and reports how tightly
/// the site's pages cluster around one topic.
#[derive(Parser, Debug)]
#[command(name = "site-radius")]
#[command(version = "1.0.0")]
#[command(about = "Thematic cohesion analysis for websites", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Seed URL to crawl (required unless --show is used)
    #[arg(value_name = "SEED_URL")]
    seed_url: Option<String>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Override the configured page cap
    #[arg(long, value_name = "N")]
    max_pages: Option<usize>,

    /// Override the configured depth limit
    #[arg(long, value_name = "N")]
    max_depth: Option<u32>,

    /// Override the configured per-worker request delay (milliseconds)
    #[arg(long, value_name = "MS")]
    delay_ms: Option<u64>,

    /// Validate config and show what would run without crawling
    #[arg(long, conflicts_with = "show")]
    dry_run: bool,

    /// Print a previously stored analysis and exit
    #[arg(long, value_name = "ANALYSIS_ID")]
    show: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (mut config, config_hash) = load_config_with_hash(&cli.config)?;
    tracing::info!("Configuration loaded (hash: {})", config_hash);

    // CLI overrides apply after validation; they share the config's bounds
    if let Some(max_pages) = cli.max_pages {
        anyhow::ensure!(max_pages > 0, "--max-pages must be positive");
        config.crawler.max_pages = max_pages;
    }
    if let Some(max_depth) = cli.max_depth {
        config.crawler.max_depth = max_depth;
    }
    if let Some(delay_ms) = cli.delay_ms {
        config.crawler.request_delay_ms = delay_ms;
    }

    if let Some(analysis_id) = &cli.show {
        return handle_show(&config, analysis_id);
    }

    if cli.dry_run {
        return handle_dry_run(&config, cli.seed_url.as_deref());
    }

    let seed_url = cli
        .seed_url
        .ok_or_else(|| anyhow::anyhow!("a seed URL is required (or use --show)"))?;

    handle_analyze(config, &seed_url).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("site_radius=info,warn"),
            1 => EnvFilter::new("site_radius=debug,info"),
            2 => EnvFilter::new("site_radius=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles --dry-run: validates config and shows what would run
fn handle_dry_run(
    config: &site_radius::config::Config,
    seed_url: Option<&str>,
) -> anyhow::Result<()> {
    println!("=== Site-Radius Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Max pages: {}", config.crawler.max_pages);
    println!("  Max depth: {}", config.crawler.max_depth);
    println!("  Request delay: {}ms", config.crawler.request_delay_ms);
    println!("  Workers: {}", config.crawler.worker_count);
    println!("  Min content length: {}", config.crawler.min_content_length);

    println!("\nUser Agent:");
    println!("  {}", config.user_agent.header_value());

    println!("\nEmbedding:");
    println!("  Endpoint: {}", config.embedding.endpoint);
    println!("  Model: {}", config.embedding.model);
    println!("  Batch size: {}", config.embedding.batch_size);
    println!("  API key from: ${}", config.embedding.api_key_env);

    println!("\nOutput:");
    println!("  Results directory: {}", config.output.results_dir);

    match seed_url {
        Some(seed) => {
            let normalized = site_radius::url::normalize_url(seed)?;
            println!("\n✓ Configuration is valid");
            println!("✓ Would crawl {} ({} pages max)", normalized, config.crawler.max_pages);
        }
        None => {
            println!("\n✓ Configuration is valid (no seed URL given)");
        }
    }

    Ok(())
}

/// Handles --show: loads a stored analysis and prints its summary
fn handle_show(config: &site_radius::config::Config, analysis_id: &str) -> anyhow::Result<()> {
    let store = JsonFileStore::new(&config.output.results_dir)?;
    let result = store.load(analysis_id)?;
    print_summary(analysis_id, &result);
    Ok(())
}

/// Handles the main operation: crawl, analyze, store, summarize
async fn handle_analyze(
    config: site_radius::config::Config,
    seed_url: &str,
) -> anyhow::Result<()> {
    let embedder = Arc::new(HttpEmbedder::from_config(&config.embedding)?);
    let store = JsonFileStore::new(&config.output.results_dir)?;

    let progress: ProgressFn = Arc::new(|percent, message| {
        tracing::info!("[{:>3.0}%] {}", percent, message);
    });

    let run = run_site_analysis(
        &config,
        seed_url,
        embedder,
        &store,
        Some(progress),
        None,
    )
    .await?;

    print_summary(&run.analysis_id, &run.result);

    println!("\nCrawl outcome:");
    println!("  Extracted: {}", run.crawl_stats.pages_extracted);
    println!(
        "  Skipped: {} (duplicates {}, robots {}, thin content {}, non-HTML {}, page cap {})",
        run.crawl_stats.skipped_duplicate
            + run.crawl_stats.skipped_robots
            + run.crawl_stats.skipped_thin_content
            + run.crawl_stats.skipped_not_html
            + run.crawl_stats.skipped_page_limit,
        run.crawl_stats.skipped_duplicate,
        run.crawl_stats.skipped_robots,
        run.crawl_stats.skipped_thin_content,
        run.crawl_stats.skipped_not_html,
        run.crawl_stats.skipped_page_limit,
    );
    println!("  Failed: {}", run.crawl_stats.failed);

    Ok(())
}

/// Prints the human-readable summary of an analysis
fn print_summary(analysis_id: &str, result: &CohesionResult) {
    println!("=== Site Cohesion Analysis ({}) ===\n", analysis_id);
    println!("Seed: {}", result.metadata.seed_url);
    println!("Model: {}", result.metadata.model);
    println!(
        "Pages: {} analyzed, {} omitted",
        result.metadata.page_count, result.metadata.omitted_pages
    );
    println!("Generated: {}", result.metadata.generated_at);

    println!("\nFocus score: {:.4}", result.focus_score);
    println!("Radius: {:.4}", result.radius);

    let composition = &result.content_composition;
    println!("\nContent composition:");
    println!(
        "  Central:    {:>4} ({:>5.1}%)",
        composition.central.count, composition.central.percent
    );
    println!(
        "  Support:    {:>4} ({:>5.1}%)",
        composition.support.count, composition.support.percent
    );
    println!(
        "  Peripheral: {:>4} ({:>5.1}%)",
        composition.peripheral.count, composition.peripheral.percent
    );

    println!("\nSimilarity distribution:");
    for bin in &result.similarity_distribution {
        if bin.count > 0 {
            println!("  {:.1}-{:.1}: {}", bin.lower, bin.upper, bin.count);
        }
    }
}
