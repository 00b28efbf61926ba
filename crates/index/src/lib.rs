//! # Vitrine Index
//!
//! Backend-agnostic abstraction over an external vector store holding
//! `(id, vector, payload)` records. The store is a collaborator: this crate
//! defines the protocol the engine relies on — collection bootstrap, batched
//! upsert, nearest-neighbor query under a conjunctive metadata filter,
//! fetch-by-id, and offset pagination — and ships two backends behind the
//! common [`VectorIndex`] trait:
//!
//! - [`InMemoryIndex`]: exact cosine scoring over a `HashMap`, ideal for
//!   tests and ephemeral deployments.
//! - `HttpIndex` (feature `backend-http`): a blocking client for a
//!   Qdrant-style REST service.
//!
//! ## Consistency
//!
//! The store provides at most read-your-writes. `scan` order is
//! backend-defined and not stable under concurrent mutation; `upsert` is not
//! all-or-nothing — a failed batch leaves state unknown and callers retry
//! the whole batch.
//!
//! ## Example
//! ```
//! use index::{CollectionSpec, Filter, InMemoryIndex, VectorIndex, VectorRecord};
//! use serde_json::json;
//!
//! let index = InMemoryIndex::new();
//! index.ensure_collection(&CollectionSpec::cosine("products", 3)).unwrap();
//! index
//!     .upsert(vec![VectorRecord {
//!         id: "chair-1".into(),
//!         vector: vec![1.0, 0.0, 0.0],
//!         payload: json!({"category": "Chairs", "price": 150.0}),
//!     }])
//!     .unwrap();
//!
//! let hits = index.query(&[1.0, 0.0, 0.0], 5, None).unwrap();
//! assert_eq!(hits[0].id, "chair-1");
//! ```

mod backend;

pub use backend::{BackendConfig, InMemoryIndex, VectorIndex};
#[cfg(feature = "backend-http")]
pub use backend::{HttpIndex, HttpIndexConfig};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Distance metric used by a collection. Cosine is the only metric the
/// engine ranks with; the enum keeps the wire protocol explicit.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum DistanceMetric {
    #[default]
    Cosine,
}

/// Parameters of the backing collection. `ensure_collection` is idempotent
/// over an identical spec and must be safe to call on every cold start.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CollectionSpec {
    pub name: String,
    pub dimension: usize,
    pub metric: DistanceMetric,
}

impl CollectionSpec {
    pub fn cosine(name: impl Into<String>, dimension: usize) -> Self {
        Self {
            name: name.into(),
            dimension,
            metric: DistanceMetric::Cosine,
        }
    }
}

/// A stored record: identifier, embedding vector, and a JSON snapshot of the
/// product metadata. The payload stays schemaless at this layer; the catalog
/// crate owns the typed view.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VectorRecord {
    pub id: String,
    pub vector: Vec<f32>,
    pub payload: serde_json::Value,
}

/// A ranked query match.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScoredPoint {
    pub id: String,
    /// Cosine similarity in [-1, 1].
    pub score: f32,
    pub payload: serde_json::Value,
}

/// Conjunctive metadata constraint applied during vector search: exact
/// category equality and/or an inclusive price range. No disjunction, no
/// negation — a design boundary, not an oversight.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Filter {
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub price_min: Option<f64>,
    #[serde(default)]
    pub price_max: Option<f64>,
}

impl Filter {
    pub fn is_empty(&self) -> bool {
        self.category.is_none() && self.price_min.is_none() && self.price_max.is_none()
    }

    /// Whether a payload satisfies every present constraint. Missing payload
    /// fields fail the corresponding constraint rather than erroring.
    pub fn matches(&self, payload: &serde_json::Value) -> bool {
        if let Some(wanted) = self.category.as_deref() {
            match payload.get("category").and_then(|v| v.as_str()) {
                Some(category) if category == wanted => {}
                _ => return false,
            }
        }
        if self.price_min.is_some() || self.price_max.is_some() {
            let Some(price) = payload.get("price").and_then(|v| v.as_f64()) else {
                return false;
            };
            if let Some(min) = self.price_min {
                if price < min {
                    return false;
                }
            }
            if let Some(max) = self.price_max {
                if price > max {
                    return false;
                }
            }
        }
        true
    }
}

/// Errors produced by vector index backends.
#[derive(Debug, Error)]
pub enum IndexError {
    /// The backend call failed or timed out. Always propagated to the
    /// caller; never papered over with empty results.
    #[error("index backend error: {0}")]
    Backend(String),

    /// A vector's length does not match the collection dimension. Fatal
    /// configuration inconsistency, not a per-request condition.
    #[error("vector dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    /// An operation ran before `ensure_collection`.
    #[error("collection not initialized: {0}")]
    CollectionMissing(String),

    /// A record or response could not be encoded/decoded.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl IndexError {
    pub(crate) fn backend(msg: impl Into<String>) -> Self {
        IndexError::Backend(msg.into())
    }
}

/// Cosine similarity between two f32 vectors. Returns 0.0 for mismatched or
/// empty inputs so degenerate records rank last instead of erroring.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let mut dot = 0f32;
    let mut norm_a = 0f32;
    let mut norm_b = 0f32;
    for (&x, &y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}
