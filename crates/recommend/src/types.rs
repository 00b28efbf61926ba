use catalog::{CatalogError, Product};
use embedding::EmbeddingError;
use index::IndexError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Engine-wide policy knobs.
///
/// Cheap to clone and serde-friendly so it can be embedded in higher-level
/// configs or passed across process boundaries.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EngineConfig {
    /// Result count used when a request leaves `top_k` unset.
    #[serde(default = "EngineConfig::default_default_top_k")]
    pub default_top_k: usize,
    /// Hard cap on requested result counts.
    #[serde(default = "EngineConfig::default_max_top_k")]
    pub max_top_k: usize,
    /// Similarity floor for query recommendations. A candidate below the
    /// floor is excluded regardless of how well it fits the filters.
    #[serde(default = "EngineConfig::default_similarity_threshold")]
    pub similarity_threshold: f32,
    /// Oversampling factor for the index query: internal `top_k` is
    /// `oversample_factor × requested`, compensating for floor drops.
    #[serde(default = "EngineConfig::default_oversample_factor")]
    pub oversample_factor: f32,
    /// Bounded scan size backing the trending listing.
    #[serde(default = "EngineConfig::default_trending_scan_limit")]
    pub trending_scan_limit: usize,
    /// Synthetic score assigned to trending results. Placeholder policy
    /// pending a real popularity signal.
    #[serde(default = "EngineConfig::default_trending_score")]
    pub trending_score: f32,
}

impl EngineConfig {
    fn default_default_top_k() -> usize {
        5
    }

    fn default_max_top_k() -> usize {
        50
    }

    fn default_similarity_threshold() -> f32 {
        0.3
    }

    fn default_oversample_factor() -> f32 {
        2.0
    }

    fn default_trending_scan_limit() -> usize {
        100
    }

    fn default_trending_score() -> f32 {
        0.9
    }

    /// Validate the configuration at engine construction time.
    pub fn validate(&self) -> Result<(), RecommendError> {
        if self.default_top_k == 0 {
            return Err(RecommendError::Configuration(
                "default_top_k must be >= 1".into(),
            ));
        }
        if self.max_top_k < self.default_top_k {
            return Err(RecommendError::Configuration(
                "max_top_k must be >= default_top_k".into(),
            ));
        }
        if !(-1.0..=1.0).contains(&self.similarity_threshold) {
            return Err(RecommendError::Configuration(
                "similarity_threshold must be within [-1, 1]".into(),
            ));
        }
        if self.oversample_factor < 1.0 {
            return Err(RecommendError::Configuration(
                "oversample_factor must be >= 1.0".into(),
            ));
        }
        if self.trending_scan_limit == 0 {
            return Err(RecommendError::Configuration(
                "trending_scan_limit must be >= 1".into(),
            ));
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_top_k: Self::default_default_top_k(),
            max_top_k: Self::default_max_top_k(),
            similarity_threshold: Self::default_similarity_threshold(),
            oversample_factor: Self::default_oversample_factor(),
            trending_scan_limit: Self::default_trending_scan_limit(),
            trending_score: Self::default_trending_score(),
        }
    }
}

/// A single recommendation: the product, its similarity score (cosine in
/// [-1, 1], or a synthetic score for non-similarity listings), and a
/// human-readable reason. Constructed per request, never persisted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Recommendation {
    pub product: Product,
    pub score: f32,
    pub reason: String,
}

/// Price spread over a result list.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct PriceSpread {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
}

/// Descriptive quality summary of one result list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct QualityReport {
    pub total_recommendations: usize,
    pub average_similarity: f32,
    pub min_similarity: f32,
    pub max_similarity: f32,
    /// Number of distinct categories among the results.
    pub category_diversity: usize,
    pub price_range: PriceSpread,
}

/// Caller-facing error taxonomy for the recommendation surface.
#[derive(Debug, Error)]
pub enum RecommendError {
    /// Product id absent from the catalog — distinct from an empty result
    /// set and from a backend failure.
    #[error("product not found: {id}")]
    NotFound { id: String },

    /// The request is malformed (non-positive or over-cap top_k, inverted
    /// price range, empty query, unsupported projection method). Rejected
    /// before any external call is made.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// An embedding or index call failed or timed out. Always propagated,
    /// never silently degraded into empty results.
    #[error("backend unavailable: {0}")]
    BackendUnavailable(String),

    /// Deployment-level inconsistency (e.g., vector dimension mismatch).
    /// Fatal at startup, not per-request.
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl RecommendError {
    /// Suggested HTTP status for an external transport layer.
    pub fn http_status_code(&self) -> u16 {
        match self {
            RecommendError::NotFound { .. } => 404,
            RecommendError::InvalidRequest(_) => 400,
            RecommendError::BackendUnavailable(_) => 503,
            RecommendError::Configuration(_) => 500,
        }
    }
}

impl From<IndexError> for RecommendError {
    fn from(err: IndexError) -> Self {
        match err {
            IndexError::DimensionMismatch { .. } => RecommendError::Configuration(err.to_string()),
            other => RecommendError::BackendUnavailable(other.to_string()),
        }
    }
}

impl From<EmbeddingError> for RecommendError {
    fn from(err: EmbeddingError) -> Self {
        match err {
            EmbeddingError::InvalidConfig(_) | EmbeddingError::DimensionMismatch { .. } => {
                RecommendError::Configuration(err.to_string())
            }
            EmbeddingError::Unavailable(_) => RecommendError::BackendUnavailable(err.to_string()),
        }
    }
}

impl From<CatalogError> for RecommendError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::Configuration(msg) => RecommendError::Configuration(msg),
            CatalogError::Index(inner) => inner.into(),
            CatalogError::Embedding(inner) => inner.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let cfg = EngineConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.default_top_k, 5);
        assert!((cfg.similarity_threshold - 0.3).abs() < f32::EPSILON);
        assert!(cfg.oversample_factor >= 1.0);
    }

    #[test]
    fn zero_default_top_k_rejected() {
        let cfg = EngineConfig {
            default_top_k: 0,
            ..Default::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(RecommendError::Configuration(_))
        ));
    }

    #[test]
    fn max_below_default_rejected() {
        let cfg = EngineConfig {
            default_top_k: 10,
            max_top_k: 5,
            ..Default::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn out_of_range_threshold_rejected() {
        let cfg = EngineConfig {
            similarity_threshold: 1.5,
            ..Default::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn oversample_below_one_rejected() {
        let cfg = EngineConfig {
            oversample_factor: 0.5,
            ..Default::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn status_codes_map_by_taxonomy() {
        assert_eq!(
            RecommendError::NotFound { id: "x".into() }.http_status_code(),
            404
        );
        assert_eq!(
            RecommendError::InvalidRequest("bad".into()).http_status_code(),
            400
        );
        assert_eq!(
            RecommendError::BackendUnavailable("down".into()).http_status_code(),
            503
        );
        assert_eq!(
            RecommendError::Configuration("dim".into()).http_status_code(),
            500
        );
    }

    #[test]
    fn index_dimension_mismatch_is_configuration() {
        let err: RecommendError = IndexError::DimensionMismatch {
            expected: 384,
            got: 768,
        }
        .into();
        assert!(matches!(err, RecommendError::Configuration(_)));
    }

    #[test]
    fn index_backend_failure_is_backend_unavailable() {
        let err: RecommendError = IndexError::Backend("timeout".into()).into();
        assert!(matches!(err, RecommendError::BackendUnavailable(_)));
    }

    #[test]
    fn embedding_failure_is_backend_unavailable() {
        let err: RecommendError = EmbeddingError::Unavailable("503".into()).into();
        assert!(matches!(err, RecommendError::BackendUnavailable(_)));
    }
}
