use thiserror::Error;

/// Errors surfaced by embedding providers.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EmbeddingError {
    /// Configuration is inconsistent (e.g., api mode without an endpoint).
    #[error("invalid embedding config: {0}")]
    InvalidConfig(String),

    /// The provider could not produce a vector: transport failure, timeout,
    /// or a non-success response from a remote endpoint.
    #[error("embedding backend unavailable: {0}")]
    Unavailable(String),

    /// The provider returned a vector whose length does not match the
    /// configured dimension. This is a deployment-level inconsistency, not a
    /// per-request condition.
    #[error("embedding dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },
}
