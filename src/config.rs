use std::time::Duration;

use analytics::AnalyticsConfig;
use catalog::CatalogConfig;
use embedding::EmbeddingConfig;
use index::BackendConfig;
use recommend::EngineConfig;
use serde::{Deserialize, Serialize};

/// Environment-sourced settings for the whole service.
///
/// Values load from an optional `vitrine` config file, overridden by
/// `VITRINE_*` environment variables (e.g. `VITRINE_SIMILARITY_THRESHOLD`),
/// with a `.env` file honored in development.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Settings {
    /// Embedding vector dimension; must match the index collection for the
    /// collection's lifetime.
    #[serde(default = "default_embedding_dimension")]
    pub embedding_dimension: usize,

    /// Model label passed to remote embedding endpoints.
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,

    /// Remote embedding endpoint; unset selects the deterministic local
    /// embedder.
    #[serde(default)]
    pub embedding_api_url: Option<String>,

    /// Authorization header for the embedding endpoint.
    #[serde(default)]
    pub embedding_api_key: Option<String>,

    /// Remote vector-index base URL; unset selects the in-memory index.
    #[serde(default)]
    pub index_url: Option<String>,

    /// `api-key` header for the vector index.
    #[serde(default)]
    pub index_api_key: Option<String>,

    /// Backing collection name.
    #[serde(default = "default_collection")]
    pub index_collection: String,

    /// Locality hint forwarded to hosted backends that place collections by
    /// region. Unused by the in-memory backend.
    #[serde(default = "default_region")]
    pub region: String,

    /// Result count when a request leaves top_k unset.
    #[serde(default = "default_top_k")]
    pub default_top_k: usize,

    /// Hard cap on requested result counts.
    #[serde(default = "default_max_top_k")]
    pub max_top_k: usize,

    /// Similarity floor for query recommendations.
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f32,

    /// Timeout budget for every external HTTP call, in seconds.
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,

    /// Scan cap for analytics calls.
    #[serde(default = "default_analytics_scan_cap")]
    pub analytics_scan_cap: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            embedding_dimension: default_embedding_dimension(),
            embedding_model: default_embedding_model(),
            embedding_api_url: None,
            embedding_api_key: None,
            index_url: None,
            index_api_key: None,
            index_collection: default_collection(),
            region: default_region(),
            default_top_k: default_top_k(),
            max_top_k: default_max_top_k(),
            similarity_threshold: default_similarity_threshold(),
            http_timeout_secs: default_http_timeout_secs(),
            analytics_scan_cap: default_analytics_scan_cap(),
        }
    }
}

impl Settings {
    /// Load configuration from an optional `vitrine` file and `VITRINE_*`
    /// environment variables.
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let builder = config::Config::builder()
            .add_source(config::File::with_name("vitrine").required(false))
            .add_source(config::Environment::with_prefix("VITRINE"));
        let settings: Settings = builder.build()?.try_deserialize()?;
        Ok(settings)
    }

    /// Timeout budget as a `Duration`.
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    pub fn embedding_config(&self) -> EmbeddingConfig {
        EmbeddingConfig {
            mode: if self.embedding_api_url.is_some() {
                "api".into()
            } else {
                "hash".into()
            },
            model_name: self.embedding_model.clone(),
            dimension: self.embedding_dimension,
            api_url: self.embedding_api_url.clone(),
            api_auth_header: self.embedding_api_key.clone(),
            api_timeout_secs: self.http_timeout_secs,
            ..Default::default()
        }
    }

    pub fn backend_config(&self) -> Result<BackendConfig, recommend::RecommendError> {
        match self.index_url.as_deref() {
            None => Ok(BackendConfig::InMemory),
            #[cfg(feature = "backend-http")]
            Some(url) => Ok(BackendConfig::Http(index::HttpIndexConfig {
                url: url.to_string(),
                api_key: self.index_api_key.clone(),
                timeout_secs: self.http_timeout_secs,
            })),
            #[cfg(not(feature = "backend-http"))]
            Some(_) => Err(recommend::RecommendError::Configuration(
                "index_url is set but this build lacks the backend-http feature".into(),
            )),
        }
    }

    pub fn catalog_config(&self) -> CatalogConfig {
        CatalogConfig {
            collection: self.index_collection.clone(),
            dimension: self.embedding_dimension,
            ..Default::default()
        }
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            default_top_k: self.default_top_k,
            max_top_k: self.max_top_k,
            similarity_threshold: self.similarity_threshold,
            ..Default::default()
        }
    }

    pub fn analytics_config(&self) -> AnalyticsConfig {
        AnalyticsConfig {
            scan_cap: self.analytics_scan_cap,
            ..Default::default()
        }
    }
}

fn default_embedding_dimension() -> usize {
    384
}

fn default_embedding_model() -> String {
    "all-MiniLM-L6-v2".to_string()
}

fn default_collection() -> String {
    "furniture-products".to_string()
}

fn default_region() -> String {
    "us-east-1".to_string()
}

fn default_top_k() -> usize {
    5
}

fn default_max_top_k() -> usize {
    50
}

fn default_similarity_threshold() -> f32 {
    0.3
}

fn default_http_timeout_secs() -> u64 {
    30
}

fn default_analytics_scan_cap() -> usize {
    1000
}
