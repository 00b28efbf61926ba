//! Umbrella crate for the vitrine catalog recommendation engine.
//!
//! This crate stitches the stage crates together so callers can wire the
//! whole service with a single entry point: environment-sourced
//! [`Settings`], and a [`Services`] bundle holding the explicitly
//! constructed, dependency-injected components — embedding provider, vector
//! index, catalog accessor, recommendation engine, and analytics aggregator.
//! There are no ambient singletons; tests wire fakes through the same
//! constructors.
//!
//! ```no_run
//! use vitrine::{Services, Settings};
//!
//! let settings = Settings::load().expect("settings");
//! let services = Services::from_settings(settings).expect("startup");
//! let hits = services
//!     .engine
//!     .recommend("mid-century walnut sideboard", None, None, None, None)
//!     .expect("recommendations");
//! for hit in hits {
//!     println!("{} ({:.2}): {}", hit.product.name, hit.score, hit.reason);
//! }
//! ```

mod config;

pub use config::Settings;

pub use analytics::{
    Analytics, AnalyticsConfig, CatalogMetrics, CategoryInsight, FailedQuery, OverallQuality,
    PriceBucket, PriceRanges, PriceStats, ProjectionMethod, ProjectionPoint, ProjectionReport,
    QualityMetrics, QueryQuality, ScoreStats, SimilarityAnalysis,
};
pub use catalog::{
    clean_price, embedding_text, parse_categories, parse_images, product_from_payload,
    product_to_payload, Catalog, CatalogConfig, CatalogError, Product, RawProduct,
};
pub use embedding::{
    CachedEmbedder, EmbeddingConfig, EmbeddingError, EmbeddingProvider, HashEmbedder, HttpEmbedder,
};
#[cfg(feature = "backend-http")]
pub use index::{HttpIndex, HttpIndexConfig};
pub use index::{
    cosine_similarity, BackendConfig, CollectionSpec, DistanceMetric, Filter, InMemoryIndex,
    IndexError, ScoredPoint, VectorIndex, VectorRecord,
};
pub use recommend::{
    recommendation_reason, Engine, EngineConfig, PriceSpread, QualityReport, Recommendation,
    RecommendError,
};

use std::sync::Arc;

/// The wired service graph. Construction performs the startup checks: the
/// vector collection is bootstrapped and the embedding dimension is verified
/// against it — a mismatch fails here, never per request.
pub struct Services {
    pub settings: Settings,
    pub embedder: Arc<dyn EmbeddingProvider>,
    pub index: Arc<dyn VectorIndex>,
    pub catalog: Arc<Catalog>,
    pub engine: Arc<Engine>,
    pub analytics: Arc<Analytics>,
}

impl Services {
    /// Build every component from settings and run the startup checks.
    pub fn from_settings(settings: Settings) -> Result<Self, RecommendError> {
        let embedder = settings.embedding_config().build()?;
        let index = settings.backend_config()?.build()?;

        let catalog = Arc::new(Catalog::new(
            index.clone(),
            embedder.clone(),
            settings.catalog_config(),
        ));
        catalog.ensure_ready()?;

        let engine = Arc::new(Engine::new(catalog.clone(), settings.engine_config())?);
        let analytics = Arc::new(Analytics::new(
            catalog.clone(),
            engine.clone(),
            settings.analytics_config(),
        ));

        tracing::info!(
            collection = %settings.index_collection,
            dimension = settings.embedding_dimension,
            "vitrine services ready"
        );

        Ok(Self {
            settings,
            embedder,
            index,
            catalog,
            engine,
            analytics,
        })
    }
}
