use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::{CachedEmbedder, EmbeddingError, EmbeddingProvider, HashEmbedder, HttpEmbedder};

/// Runtime configuration describing which embedding provider to build and how
/// to post-process vectors.
///
/// # Example
/// ```
/// use embedding::EmbeddingConfig;
///
/// let cfg = EmbeddingConfig {
///     mode: "api".into(),
///     api_url: Some("https://embed.example.com/inference/text".into()),
///     api_auth_header: Some("Bearer token".into()),
///     ..Default::default()
/// };
/// assert!(cfg.validate().is_ok());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EmbeddingConfig {
    /// Provider selector: `"hash"` (deterministic local stub) or `"api"`
    /// (remote HTTP inference).
    #[serde(default = "default_mode")]
    pub mode: String,
    /// Friendly model label surfaced in remote requests and logs.
    #[serde(default = "default_model_name")]
    pub model_name: String,
    /// Output vector dimension. Must match the vector index collection for
    /// the lifetime of that collection.
    #[serde(default = "default_dimension")]
    pub dimension: usize,
    /// Normalize vectors to unit length (recommended for cosine similarity).
    #[serde(default = "true_value")]
    pub normalize: bool,
    /// Inference endpoint when [`mode`](Self::mode) is `"api"`.
    #[serde(default)]
    pub api_url: Option<String>,
    /// Authorization header value (e.g., `"Bearer hf_xxx"`).
    #[serde(default)]
    pub api_auth_header: Option<String>,
    /// Overall per-call API timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub api_timeout_secs: u64,
    /// Maximum attempts per API call (1 = no retry).
    #[serde(default = "default_max_retries")]
    pub max_retries: usize,
    /// Maximum inputs per remote batch request.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// LRU cache capacity in entries; 0 disables caching.
    #[serde(default = "default_cache_size")]
    pub cache_size: usize,
}

impl EmbeddingConfig {
    /// Validate the configuration before building a provider.
    pub fn validate(&self) -> Result<(), EmbeddingError> {
        match self.mode.as_str() {
            "hash" | "api" => {}
            other => {
                return Err(EmbeddingError::InvalidConfig(format!(
                    "mode must be \"hash\" or \"api\", got {other:?}"
                )));
            }
        }
        if self.dimension == 0 {
            return Err(EmbeddingError::InvalidConfig(
                "dimension must be >= 1".into(),
            ));
        }
        if self.mode == "api" && self.api_url.is_none() {
            return Err(EmbeddingError::InvalidConfig(
                "api mode requires api_url".into(),
            ));
        }
        if self.batch_size == 0 {
            return Err(EmbeddingError::InvalidConfig(
                "batch_size must be >= 1".into(),
            ));
        }
        Ok(())
    }

    /// Build the configured provider, wrapping it in an LRU cache when
    /// [`cache_size`](Self::cache_size) is non-zero.
    pub fn build(&self) -> Result<Arc<dyn EmbeddingProvider>, EmbeddingError> {
        self.validate()?;
        let inner: Arc<dyn EmbeddingProvider> = match self.mode.as_str() {
            "api" => Arc::new(HttpEmbedder::new(self)?),
            _ => Arc::new(HashEmbedder::new(self.dimension, self.normalize)),
        };
        if self.cache_size > 0 {
            Ok(Arc::new(CachedEmbedder::new(inner, self.cache_size)))
        } else {
            Ok(inner)
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            mode: default_mode(),
            model_name: default_model_name(),
            dimension: default_dimension(),
            normalize: true,
            api_url: None,
            api_auth_header: None,
            api_timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
            batch_size: default_batch_size(),
            cache_size: default_cache_size(),
        }
    }
}

fn default_mode() -> String {
    "hash".to_string()
}

fn default_model_name() -> String {
    "all-MiniLM-L6-v2".to_string()
}

fn default_dimension() -> usize {
    384
}

fn true_value() -> bool {
    true
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_retries() -> usize {
    3
}

fn default_batch_size() -> usize {
    32
}

fn default_cache_size() -> usize {
    1024
}
