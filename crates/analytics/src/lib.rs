//! Catalog analytics: descriptive statistics, embedding projections, and
//! recommendation-quality metrics.
//!
//! Everything here is computed fresh per call from the current catalog state
//! over a bounded scan — never cached, never incrementally maintained. That
//! is a deliberate simplicity/consistency trade-off: always correct as of
//! read time, at the cost of O(catalog) work per call, and explicitly
//! approximate once the catalog outgrows the scan cap.
//!
//! Analytics shares the engine's error taxonomy
//! ([`recommend::RecommendError`]); a failed sample query inside the quality
//! battery is recorded per query, not swallowed.

mod metrics;
mod projection;
mod quality;

pub use metrics::{
    CatalogMetrics, CategoryInsight, PriceBounds, PriceBucket, PriceRanges, PriceStats,
};
pub use projection::{ProjectionMethod, ProjectionPoint, ProjectionReport};
pub use quality::{
    FailedQuery, OverallQuality, PriceSimilarity, QualityMetrics, QueryQuality, ScoreStats,
    SimilarityAnalysis,
};

use std::sync::Arc;

use catalog::Catalog;
use recommend::{Engine, RecommendError};
use serde::{Deserialize, Serialize};

/// Analytics policy knobs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnalyticsConfig {
    /// Maximum records any analytics call scans. Above this the numbers are
    /// explicitly approximate, not exhaustive.
    #[serde(default = "default_scan_cap")]
    pub scan_cap: usize,
    /// Fixed battery of sample queries for the quality health signal.
    #[serde(default = "default_sample_queries")]
    pub sample_queries: Vec<String>,
    /// Result count per sample query.
    #[serde(default = "default_sample_top_k")]
    pub sample_top_k: usize,
}

fn default_scan_cap() -> usize {
    1000
}

fn default_sample_top_k() -> usize {
    5
}

fn default_sample_queries() -> Vec<String> {
    [
        "modern sofa",
        "office chair",
        "dining table",
        "bedroom furniture",
        "storage solutions",
    ]
    .into_iter()
    .map(str::to_string)
    .collect()
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            scan_cap: default_scan_cap(),
            sample_queries: default_sample_queries(),
            sample_top_k: default_sample_top_k(),
        }
    }
}

/// The analytics aggregator. Consumes the catalog accessor and the engine;
/// independent of the request path.
pub struct Analytics {
    catalog: Arc<Catalog>,
    engine: Arc<Engine>,
    cfg: AnalyticsConfig,
}

impl Analytics {
    pub fn new(catalog: Arc<Catalog>, engine: Arc<Engine>, cfg: AnalyticsConfig) -> Self {
        Self {
            catalog,
            engine,
            cfg,
        }
    }

    pub fn config(&self) -> &AnalyticsConfig {
        &self.cfg
    }

    /// Catalog-wide descriptive statistics. An empty catalog yields zeroed
    /// metrics, not an error.
    pub fn metrics(&self) -> Result<CatalogMetrics, RecommendError> {
        let products = self.catalog.products(self.cfg.scan_cap, 0)?;
        Ok(metrics::compute_metrics(&products))
    }

    /// Project item vectors to 2 or 3 coordinates for visualization.
    ///
    /// Best-effort tooling, never a ranking input: vectors come from the
    /// index when stored, and are regenerated through the embedder for
    /// records that carry none.
    pub fn embedding_projection(
        &self,
        method: ProjectionMethod,
        n_components: usize,
    ) -> Result<ProjectionReport, RecommendError> {
        if !(2..=3).contains(&n_components) {
            return Err(RecommendError::InvalidRequest(format!(
                "n_components must be 2 or 3, got {n_components}"
            )));
        }
        let records = self.catalog.records(self.cfg.scan_cap, 0)?;
        projection::project_records(&self.catalog, &records, method, n_components)
    }

    /// Similarity patterns around one product: score statistics, category
    /// distribution, and price spread of its nearest neighbors.
    pub fn similarity_analysis(
        &self,
        product_id: &str,
    ) -> Result<SimilarityAnalysis, RecommendError> {
        quality::similarity_analysis(&self.catalog, &self.engine, product_id)
    }

    /// Run the sample-query battery through the engine and summarize
    /// average similarity and category diversity as a coarse health signal.
    /// Failures are tracked per query, never swallowed.
    pub fn quality_metrics(&self) -> Result<QualityMetrics, RecommendError> {
        Ok(quality::run_quality_battery(
            &self.engine,
            &self.cfg.sample_queries,
            self.cfg.sample_top_k,
        ))
    }
}
