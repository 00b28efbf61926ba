//! Embedding providers for the vitrine recommendation engine.
//!
//! An [`EmbeddingProvider`] maps text to a fixed-dimension vector. The engine
//! treats the model itself as a black box: the only contract is that the
//! dimension is stable for the lifetime of the provider and that identical
//! input produces identical output within one provider instance.
//!
//! Two implementations ship with the crate:
//!
//! - [`HashEmbedder`]: a deterministic, dependency-free local embedder that
//!   derives sinusoid vectors from a hash of the input. It stands in for a
//!   real local model in tests and development environments.
//! - [`HttpEmbedder`]: a blocking HTTP client for a remote inference endpoint
//!   (enabled via [`EmbeddingConfig`] `mode = "api"`), with a configurable
//!   timeout and bounded retry.
//!
//! [`CachedEmbedder`] wraps any provider with a bounded LRU cache keyed by
//! input text.
//!
//! Embedding failure is fatal to the calling operation: providers never
//! substitute zero vectors for errors.

mod cache;
mod config;
mod error;
mod http;
mod normalize;
mod provider;

pub use cache::CachedEmbedder;
pub use config::EmbeddingConfig;
pub use error::EmbeddingError;
pub use http::HttpEmbedder;
pub use normalize::l2_normalize_in_place;
pub use provider::{EmbeddingProvider, HashEmbedder};
