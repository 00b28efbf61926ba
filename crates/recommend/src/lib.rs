//! The vitrine recommendation engine.
//!
//! [`Engine`] turns a free-text query or a reference item plus a set of
//! constraints into an ordered, filtered, explained result list. It
//! orchestrates the embedding provider and the vector index; it is stateless
//! per request and holds no ambient globals — every collaborator is injected
//! at construction.
//!
//! Retrieval policy, in order: resolve and validate the requested result
//! count, compose the conjunctive filter, embed, query the index with
//! oversampling, apply the similarity floor, attach reasons, rank stably by
//! descending score, truncate.
//!
//! Backend failures propagate as [`RecommendError::BackendUnavailable`];
//! they are never degraded into empty result sets.

mod engine;
mod reason;
mod types;

pub use engine::Engine;
pub use reason::recommendation_reason;
pub use types::{
    EngineConfig, PriceSpread, QualityReport, Recommendation, RecommendError,
};
