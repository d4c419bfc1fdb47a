//! Result types produced by the cohesion analyzer
//!
//! All types serialize with serde so a complete analysis can be stored and
//! reloaded through the results sink as one JSON document.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Similarity thresholds for page categorization
pub const CENTRAL_THRESHOLD: f64 = 0.8;
pub const SUPPORT_THRESHOLD: f64 = 0.6;

/// How closely a page aligns with the site's central theme
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageCategory {
    /// Similarity >= 0.8
    Central,
    /// Similarity in [0.6, 0.8)
    Support,
    /// Similarity < 0.6
    Peripheral,
}

impl PageCategory {
    /// Categorizes a page by its similarity to the centroid
    ///
    /// The same thresholds drive the composition counts and the cluster
    /// points, so the two outputs always agree.
    pub fn from_similarity(similarity: f64) -> Self {
        if similarity >= CENTRAL_THRESHOLD {
            Self::Central
        } else if similarity >= SUPPORT_THRESHOLD {
            Self::Support
        } else {
            Self::Peripheral
        }
    }
}

/// One bin of the similarity histogram
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarityBin {
    /// Inclusive lower edge of the bin
    pub lower: f64,

    /// Exclusive upper edge (inclusive for the final bin)
    pub upper: f64,

    /// Number of pages whose similarity falls in this bin
    pub count: usize,
}

/// Count and share of one page category
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CategoryBreakdown {
    pub count: usize,

    /// Share of all analyzed pages, in percent, rounded to one decimal
    pub percent: f64,
}

/// Distribution of pages across the three categories
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContentComposition {
    pub central: CategoryBreakdown,
    pub support: CategoryBreakdown,
    pub peripheral: CategoryBreakdown,
}

impl ContentComposition {
    /// Total pages across all categories
    pub fn total(&self) -> usize {
        self.central.count + self.support.count + self.peripheral.count
    }
}

/// One page positioned in the 2-D cluster view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterPoint {
    pub url: String,

    /// X axis: similarity to the centroid
    pub topic_alignment: f64,

    /// Y axis: bounded transform of content length
    pub info_density: f64,

    pub category: PageCategory,
}

/// Per-page metrics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageMetric {
    pub url: String,

    /// Cosine similarity to the centroid
    pub similarity: f64,

    /// 1 - similarity
    pub distance: f64,

    /// Character count of the page's cleaned text
    pub content_length: usize,

    /// Bounded transform of content length, shared with the cluster view
    pub info_density: f64,
}

/// Provenance for one analysis run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisMetadata {
    /// Seed URL the crawl started from
    pub seed_url: String,

    /// Pages that contributed to the metrics
    pub page_count: usize,

    /// Pages dropped because embedding failed or produced no signal
    pub omitted_pages: usize,

    /// Identifier of the embedding model used
    pub model: String,

    /// When the analysis finished
    pub generated_at: DateTime<Utc>,
}

/// Complete, immutable output of one cohesion analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CohesionResult {
    /// Mean similarity of all pages to the centroid
    pub focus_score: f64,

    /// 1 - focus_score
    pub radius: f64,

    /// Ten equal-width bins over [0, 1]
    pub similarity_distribution: Vec<SimilarityBin>,

    /// Page counts and shares per category
    pub content_composition: ContentComposition,

    /// One point per page for the cluster visualization
    pub content_clusters: Vec<ClusterPoint>,

    /// One metric row per page
    pub page_metrics: Vec<PageMetric>,

    pub metadata: AnalysisMetadata,
}
