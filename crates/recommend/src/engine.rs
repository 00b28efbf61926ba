use std::sync::Arc;

use catalog::{embedding_text, product_from_payload, Catalog, Product};
use embedding::EmbeddingProvider;
use index::{Filter, ScoredPoint, VectorIndex};

use crate::reason::recommendation_reason;
use crate::types::{
    EngineConfig, PriceSpread, QualityReport, Recommendation, RecommendError,
};

#[cfg(test)]
mod tests;

/// The recommendation engine.
///
/// Stateless per request: each call depends only on its inputs, the injected
/// embedding provider, and the external vector index. Shared freely across
/// request threads behind an `Arc`.
pub struct Engine {
    catalog: Arc<Catalog>,
    index: Arc<dyn VectorIndex>,
    embedder: Arc<dyn EmbeddingProvider>,
    cfg: EngineConfig,
}

impl Engine {
    /// Construct an engine over an existing catalog. Validates the config
    /// up front so bad policy values fail at startup, not per request.
    pub fn new(catalog: Arc<Catalog>, cfg: EngineConfig) -> Result<Self, RecommendError> {
        cfg.validate()?;
        let index = catalog.index().clone();
        let embedder = catalog.embedder().clone();
        Ok(Self {
            catalog,
            index,
            embedder,
            cfg,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.cfg
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    fn resolve_top_k(&self, requested: Option<usize>) -> Result<usize, RecommendError> {
        let k = requested.unwrap_or(self.cfg.default_top_k);
        if k == 0 {
            return Err(RecommendError::InvalidRequest(
                "top_k must be greater than zero".into(),
            ));
        }
        if k > self.cfg.max_top_k {
            return Err(RecommendError::InvalidRequest(format!(
                "top_k {k} exceeds the cap of {}",
                self.cfg.max_top_k
            )));
        }
        Ok(k)
    }

    fn build_filter(
        category: Option<&str>,
        price_min: Option<f64>,
        price_max: Option<f64>,
    ) -> Result<Option<Filter>, RecommendError> {
        if let (Some(min), Some(max)) = (price_min, price_max) {
            if min > max {
                return Err(RecommendError::InvalidRequest(format!(
                    "price_min {min} exceeds price_max {max}"
                )));
            }
        }
        if let Some(min) = price_min {
            if min < 0.0 {
                return Err(RecommendError::InvalidRequest(
                    "price_min must be non-negative".into(),
                ));
            }
        }
        let filter = Filter {
            category: category.map(str::to_string),
            price_min,
            price_max,
        };
        Ok(if filter.is_empty() { None } else { Some(filter) })
    }

    /// Free-text query recommendations.
    ///
    /// Oversamples the index by `oversample_factor × top_k` to compensate
    /// for candidates dropped by the similarity floor, then floors, reasons,
    /// ranks, and truncates. An empty result after filtering is a valid
    /// outcome, not an error.
    pub fn recommend(
        &self,
        query: &str,
        top_k: Option<usize>,
        category: Option<&str>,
        price_min: Option<f64>,
        price_max: Option<f64>,
    ) -> Result<Vec<Recommendation>, RecommendError> {
        let k = self.resolve_top_k(top_k)?;
        if query.trim().is_empty() {
            return Err(RecommendError::InvalidRequest(
                "query must not be empty".into(),
            ));
        }
        let filter = Self::build_filter(category, price_min, price_max)?;

        let vector = self.embedder.embed(query)?;
        let oversampled = ((k as f32) * self.cfg.oversample_factor).ceil() as usize;
        let points = self.index.query(&vector, oversampled, filter.as_ref())?;

        let floor = self.cfg.similarity_threshold;
        let mut hits: Vec<Recommendation> = points
            .into_iter()
            .filter(|point| point.score >= floor)
            .map(|point| self.to_recommendation(point))
            .collect();

        // Stable sort: candidates with equal scores keep the index's order.
        hits.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        hits.truncate(k);
        tracing::debug!(query, returned = hits.len(), "recommendation query served");
        Ok(hits)
    }

    /// Items similar to a reference product.
    ///
    /// The reference's name, category, and description stand in for its
    /// semantic content. With `exclude_self` the index is asked for one
    /// extra neighbor, anticipating the reference ranking as its own
    /// nearest neighbor. No similarity floor applies here.
    pub fn similar_products(
        &self,
        product_id: &str,
        top_k: Option<usize>,
        exclude_self: bool,
    ) -> Result<Vec<Recommendation>, RecommendError> {
        let k = self.resolve_top_k(top_k)?;
        let reference = self
            .catalog
            .product_by_id(product_id)?
            .ok_or_else(|| RecommendError::NotFound {
                id: product_id.to_string(),
            })?;

        let query_text = embedding_text(&reference);
        let vector = self.embedder.embed(&query_text)?;
        let fetch_k = if exclude_self { k + 1 } else { k };
        let points = self.index.query(&vector, fetch_k, None)?;

        let reason = format!("Similar to {}", reference.name);
        let mut hits: Vec<Recommendation> = points
            .into_iter()
            .filter(|point| !(exclude_self && point.id == product_id))
            .map(|point| {
                let product = product_from_payload(&point.id, &point.payload);
                Recommendation {
                    product,
                    score: point.score,
                    reason: reason.clone(),
                }
            })
            .collect();
        hits.truncate(k);
        Ok(hits)
    }

    /// Category browsing: the category label itself is embedded as the
    /// query — a deliberate simplification where category-name semantics
    /// stand in for "typical item in this category" — under an exact
    /// category filter. No similarity floor: browsing must not silently
    /// drop items for scoring low against the label.
    pub fn category_recommendations(
        &self,
        category: &str,
        top_k: Option<usize>,
        price_min: Option<f64>,
        price_max: Option<f64>,
    ) -> Result<Vec<Recommendation>, RecommendError> {
        let k = self.resolve_top_k(top_k)?;
        if category.trim().is_empty() {
            return Err(RecommendError::InvalidRequest(
                "category must not be empty".into(),
            ));
        }
        let filter = Self::build_filter(Some(category), price_min, price_max)?;

        let vector = self.embedder.embed(category)?;
        let points = self.index.query(&vector, k, filter.as_ref())?;

        let reason = format!("Popular in {category} category");
        Ok(points
            .into_iter()
            .map(|point| {
                let product = product_from_payload(&point.id, &point.payload);
                Recommendation {
                    product,
                    score: point.score,
                    reason: reason.clone(),
                }
            })
            .collect())
    }

    /// Trending listing. Does not touch similarity search at all: a bounded
    /// scan ranked by descending price, price standing in for popularity
    /// until a real signal (view/purchase counts) exists. Every result
    /// carries the fixed synthetic score from the config.
    pub fn trending(&self, top_k: Option<usize>) -> Result<Vec<Recommendation>, RecommendError> {
        let k = self.resolve_top_k(top_k)?;
        let mut products = self.catalog.products(self.cfg.trending_scan_limit, 0)?;
        products.sort_by(|a, b| {
            b.price
                .partial_cmp(&a.price)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        products.truncate(k);
        Ok(products
            .into_iter()
            .map(|product| Recommendation {
                product,
                score: self.cfg.trending_score,
                reason: "Trending product".to_string(),
            })
            .collect())
    }

    /// Descriptive quality summary of a result list. Empty input yields the
    /// zeroed report.
    pub fn analyze_quality(&self, recommendations: &[Recommendation]) -> QualityReport {
        if recommendations.is_empty() {
            return QualityReport::default();
        }
        let scores: Vec<f32> = recommendations.iter().map(|r| r.score).collect();
        let prices: Vec<f64> = recommendations.iter().map(|r| r.product.price).collect();
        let mut categories: Vec<&str> = recommendations
            .iter()
            .map(|r| r.product.category.as_str())
            .collect();
        categories.sort_unstable();
        categories.dedup();

        let sum: f32 = scores.iter().sum();
        let price_sum: f64 = prices.iter().sum();
        QualityReport {
            total_recommendations: recommendations.len(),
            average_similarity: sum / scores.len() as f32,
            min_similarity: scores.iter().copied().fold(f32::INFINITY, f32::min),
            max_similarity: scores.iter().copied().fold(f32::NEG_INFINITY, f32::max),
            category_diversity: categories.len(),
            price_range: PriceSpread {
                min: prices.iter().copied().fold(f64::INFINITY, f64::min),
                max: prices.iter().copied().fold(f64::NEG_INFINITY, f64::max),
                mean: price_sum / prices.len() as f64,
            },
        }
    }

    fn to_recommendation(&self, point: ScoredPoint) -> Recommendation {
        let product = product_from_payload(&point.id, &point.payload);
        let reason = recommendation_reason(point.score, &product.category, product.price);
        Recommendation {
            product,
            score: point.score,
            reason,
        }
    }
}

/// Convenience used by tests and analytics to turn an already-typed product
/// into the scored shape.
impl Recommendation {
    pub fn new(product: Product, score: f32, reason: impl Into<String>) -> Self {
        Self {
            product,
            score,
            reason: reason.into(),
        }
    }
}
