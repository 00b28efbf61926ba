use std::collections::HashMap;
use std::sync::RwLock;

use crate::{cosine_similarity, CollectionSpec, Filter, IndexError, ScoredPoint, VectorRecord};

#[cfg(feature = "backend-http")]
pub mod http;

#[cfg(feature = "backend-http")]
pub use http::{HttpIndex, HttpIndexConfig};

/// Protocol the engine relies on from the external vector store.
///
/// Implementations must be safe to share across request threads; the trait
/// is the only seam between the engine and the store.
pub trait VectorIndex: Send + Sync {
    /// Create the backing collection if absent, otherwise no-op. Safe to
    /// call on every cold start. Re-declaring an existing collection with a
    /// different dimension is a configuration error.
    fn ensure_collection(&self, spec: &CollectionSpec) -> Result<(), IndexError>;

    /// Replace-or-insert each record (last write per id wins). Not
    /// all-or-nothing: on failure the state is unknown and callers retry
    /// the whole batch.
    fn upsert(&self, records: Vec<VectorRecord>) -> Result<(), IndexError>;

    /// Up to `top_k` matches ordered by descending similarity, optionally
    /// constrained by `filter`. Tie order is backend-defined.
    fn query(
        &self,
        vector: &[f32],
        top_k: usize,
        filter: Option<&Filter>,
    ) -> Result<Vec<ScoredPoint>, IndexError>;

    /// Fetch a record by id; absence is `Ok(None)`, not an error.
    fn fetch(&self, id: &str) -> Result<Option<VectorRecord>, IndexError>;

    /// Paginate stored records in backend-defined order. The order is not
    /// stable across calls while the collection is concurrently mutated.
    fn scan(&self, limit: usize, offset: usize) -> Result<Vec<VectorRecord>, IndexError>;
}

/// Configuration for selecting and building a backend.
#[derive(Clone, Debug, Default)]
pub enum BackendConfig {
    /// In-memory store, for tests and ephemeral deployments.
    #[default]
    InMemory,
    /// Remote Qdrant-style REST service.
    ///
    /// Requires the `backend-http` feature (enabled by default).
    #[cfg(feature = "backend-http")]
    Http(HttpIndexConfig),
}

impl BackendConfig {
    pub fn in_memory() -> Self {
        BackendConfig::InMemory
    }

    #[cfg(feature = "backend-http")]
    pub fn http(cfg: HttpIndexConfig) -> Self {
        BackendConfig::Http(cfg)
    }

    /// Build the backend described by this configuration.
    pub fn build(&self) -> Result<std::sync::Arc<dyn VectorIndex>, IndexError> {
        match self {
            BackendConfig::InMemory => Ok(std::sync::Arc::new(InMemoryIndex::new())),
            #[cfg(feature = "backend-http")]
            BackendConfig::Http(cfg) => Ok(std::sync::Arc::new(HttpIndex::new(cfg.clone())?)),
        }
    }
}

#[derive(Default)]
struct InMemoryState {
    spec: Option<CollectionSpec>,
    records: HashMap<String, VectorRecord>,
    /// Insertion order of ids; defines the backend scan order.
    order: Vec<String>,
}

/// An in-memory index using a `RwLock` around a `HashMap`, with exact cosine
/// scoring. Scan order is insertion order.
pub struct InMemoryIndex {
    state: RwLock<InMemoryState>,
}

impl InMemoryIndex {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(InMemoryState::default()),
        }
    }
}

impl Default for InMemoryIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryIndex {
    fn check_dimension(spec: &CollectionSpec, vector: &[f32]) -> Result<(), IndexError> {
        if vector.len() != spec.dimension {
            return Err(IndexError::DimensionMismatch {
                expected: spec.dimension,
                got: vector.len(),
            });
        }
        Ok(())
    }
}

impl VectorIndex for InMemoryIndex {
    fn ensure_collection(&self, spec: &CollectionSpec) -> Result<(), IndexError> {
        let mut state = self
            .state
            .write()
            .map_err(|_| IndexError::backend("poisoned lock"))?;
        match &state.spec {
            Some(existing) if existing.dimension != spec.dimension => {
                Err(IndexError::DimensionMismatch {
                    expected: existing.dimension,
                    got: spec.dimension,
                })
            }
            Some(_) => Ok(()),
            None => {
                state.spec = Some(spec.clone());
                Ok(())
            }
        }
    }

    fn upsert(&self, records: Vec<VectorRecord>) -> Result<(), IndexError> {
        let mut state = self
            .state
            .write()
            .map_err(|_| IndexError::backend("poisoned lock"))?;
        let spec = state
            .spec
            .clone()
            .ok_or_else(|| IndexError::CollectionMissing("upsert before ensure_collection".into()))?;
        for record in records {
            Self::check_dimension(&spec, &record.vector)?;
            if !state.records.contains_key(&record.id) {
                state.order.push(record.id.clone());
            }
            state.records.insert(record.id.clone(), record);
        }
        Ok(())
    }

    fn query(
        &self,
        vector: &[f32],
        top_k: usize,
        filter: Option<&Filter>,
    ) -> Result<Vec<ScoredPoint>, IndexError> {
        if top_k == 0 {
            return Ok(Vec::new());
        }
        let state = self
            .state
            .read()
            .map_err(|_| IndexError::backend("poisoned lock"))?;
        let spec = state
            .spec
            .as_ref()
            .ok_or_else(|| IndexError::CollectionMissing("query before ensure_collection".into()))?;
        Self::check_dimension(spec, vector)?;

        let mut results: Vec<ScoredPoint> = state
            .order
            .iter()
            .filter_map(|id| state.records.get(id))
            .filter(|record| filter.map_or(true, |f| f.matches(&record.payload)))
            .map(|record| ScoredPoint {
                id: record.id.clone(),
                score: cosine_similarity(vector, &record.vector),
                payload: record.payload.clone(),
            })
            .collect();

        // Stable sort keeps insertion order among equal scores, which is
        // this backend's "internal order".
        results.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        results.truncate(top_k);
        Ok(results)
    }

    fn fetch(&self, id: &str) -> Result<Option<VectorRecord>, IndexError> {
        let state = self
            .state
            .read()
            .map_err(|_| IndexError::backend("poisoned lock"))?;
        Ok(state.records.get(id).cloned())
    }

    fn scan(&self, limit: usize, offset: usize) -> Result<Vec<VectorRecord>, IndexError> {
        let state = self
            .state
            .read()
            .map_err(|_| IndexError::backend("poisoned lock"))?;
        Ok(state
            .order
            .iter()
            .skip(offset)
            .take(limit)
            .filter_map(|id| state.records.get(id))
            .cloned()
            .collect())
    }
}
