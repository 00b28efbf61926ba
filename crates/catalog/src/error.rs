use embedding::EmbeddingError;
use index::IndexError;
use thiserror::Error;

/// Errors surfaced by the catalog accessor.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The embedding provider and the collection disagree on vector
    /// dimension. Fatal at startup, never a per-request error.
    #[error("catalog configuration error: {0}")]
    Configuration(String),

    /// Index call failed.
    #[error(transparent)]
    Index(#[from] IndexError),

    /// Embedding call failed.
    #[error(transparent)]
    Embedding(#[from] EmbeddingError),
}
