use std::sync::Arc;

use embedding::EmbeddingProvider;
use index::{CollectionSpec, DistanceMetric, VectorIndex, VectorRecord};
use serde::{Deserialize, Serialize};

use crate::product::{embedding_text, product_from_payload, product_to_payload};
use crate::{CatalogError, Product, RawProduct};

/// Catalog accessor settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CatalogConfig {
    /// Name of the backing collection.
    #[serde(default = "default_collection")]
    pub collection: String,
    /// Vector dimension the collection is declared with. Must match the
    /// embedding provider for the lifetime of the collection.
    #[serde(default = "default_dimension")]
    pub dimension: usize,
    #[serde(default)]
    pub metric: DistanceMetric,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            collection: default_collection(),
            dimension: default_dimension(),
            metric: DistanceMetric::Cosine,
        }
    }
}

fn default_collection() -> String {
    "furniture-products".to_string()
}

fn default_dimension() -> usize {
    384
}

impl CatalogConfig {
    pub fn collection_spec(&self) -> CollectionSpec {
        CollectionSpec {
            name: self.collection.clone(),
            dimension: self.dimension,
            metric: self.metric,
        }
    }
}

/// Thin read layer over the vector index, plus embed-and-upsert ingestion.
/// Explicitly constructed and shared by `Arc`; holds no ambient state.
pub struct Catalog {
    index: Arc<dyn VectorIndex>,
    embedder: Arc<dyn EmbeddingProvider>,
    cfg: CatalogConfig,
}

impl Catalog {
    pub fn new(
        index: Arc<dyn VectorIndex>,
        embedder: Arc<dyn EmbeddingProvider>,
        cfg: CatalogConfig,
    ) -> Self {
        Self {
            index,
            embedder,
            cfg,
        }
    }

    pub fn config(&self) -> &CatalogConfig {
        &self.cfg
    }

    pub fn index(&self) -> &Arc<dyn VectorIndex> {
        &self.index
    }

    pub fn embedder(&self) -> &Arc<dyn EmbeddingProvider> {
        &self.embedder
    }

    /// Bootstrap the collection and verify the embedder and the collection
    /// agree on dimension. The mismatch is fatal here, at startup — it must
    /// never surface as a per-request error.
    pub fn ensure_ready(&self) -> Result<(), CatalogError> {
        let embedder_dim = self.embedder.dimension();
        if embedder_dim != self.cfg.dimension {
            return Err(CatalogError::Configuration(format!(
                "embedding provider produces {embedder_dim}-dim vectors but collection \
                 {:?} is declared with dimension {}",
                self.cfg.collection, self.cfg.dimension
            )));
        }
        self.index.ensure_collection(&self.cfg.collection_spec())?;
        Ok(())
    }

    /// Normalize, embed, and upsert a batch of raw products. Returns how
    /// many records were stored. Upsert is not all-or-nothing: on error the
    /// index state is unknown and the caller retries the whole batch.
    pub fn ingest(&self, raw: Vec<RawProduct>) -> Result<usize, CatalogError> {
        if raw.is_empty() {
            return Ok(0);
        }
        let products: Vec<Product> = raw.into_iter().map(RawProduct::normalize).collect();
        let texts: Vec<String> = products.iter().map(embedding_text).collect();
        let text_refs: Vec<&str> = texts.iter().map(String::as_str).collect();
        let vectors = self.embedder.embed_batch(&text_refs)?;

        let records: Vec<VectorRecord> = products
            .iter()
            .zip(vectors)
            .map(|(product, vector)| VectorRecord {
                id: product.id.clone(),
                vector,
                payload: product_to_payload(product),
            })
            .collect();
        let count = records.len();
        self.index.upsert(records)?;
        tracing::debug!(count, collection = %self.cfg.collection, "ingested products");
        Ok(count)
    }

    /// Fetch a product by id; absence is `Ok(None)`.
    pub fn product_by_id(&self, id: &str) -> Result<Option<Product>, CatalogError> {
        let record = self.index.fetch(id)?;
        Ok(record.map(|r| product_from_payload(&r.id, &r.payload)))
    }

    /// Paginate products in backend-defined order.
    pub fn products(&self, limit: usize, offset: usize) -> Result<Vec<Product>, CatalogError> {
        let records = self.index.scan(limit, offset)?;
        Ok(records
            .iter()
            .map(|r| product_from_payload(&r.id, &r.payload))
            .collect())
    }

    /// Paginate raw records (vector included) for analytics consumers.
    pub fn records(&self, limit: usize, offset: usize) -> Result<Vec<VectorRecord>, CatalogError> {
        Ok(self.index.scan(limit, offset)?)
    }
}
