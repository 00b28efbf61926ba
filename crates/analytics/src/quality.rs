use std::collections::BTreeMap;
use std::sync::Arc;

use catalog::{Catalog, Product};
use recommend::{Engine, RecommendError};
use serde::{Deserialize, Serialize};

use crate::metrics::{max_of, mean, min_of, std_dev, variance};

/// Score statistics over one neighbor set.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct ScoreStats {
    pub mean: f32,
    pub std: f32,
    pub min: f32,
    pub max: f32,
}

/// Price spread of a product's neighbors against the product itself.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct PriceSimilarity {
    pub target_price: f64,
    pub similar_prices: Vec<f64>,
    pub price_variance: f64,
    pub price_min: f64,
    pub price_max: f64,
}

/// Similarity patterns around one product.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SimilarityAnalysis {
    pub product_id: String,
    pub target_product: Product,
    pub similarity_scores: Vec<f32>,
    pub similarity_statistics: ScoreStats,
    /// Category → count among the neighbors.
    pub category_distribution: BTreeMap<String, usize>,
    pub price_similarity: PriceSimilarity,
}

/// A sample query that failed, with the error it failed with. Tracked
/// explicitly instead of swallowed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FailedQuery {
    pub query: String,
    pub error: String,
}

/// One successful sample query with its quality summary.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QueryQuality {
    pub query: String,
    pub quality: recommend::QualityReport,
}

/// Averages across the successful sample queries.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct OverallQuality {
    pub average_similarity: f32,
    pub average_diversity: f32,
    /// Weighted health score: 0.7 × similarity + 0.3 × diversity.
    pub overall_score: f32,
}

/// Outcome of the sample-query battery.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct QualityMetrics {
    pub test_queries: usize,
    pub successful_queries: usize,
    pub failed_queries: Vec<FailedQuery>,
    pub per_query: Vec<QueryQuality>,
    pub overall: OverallQuality,
}

const NEIGHBOR_SAMPLE: usize = 10;

pub(crate) fn similarity_analysis(
    catalog: &Arc<Catalog>,
    engine: &Arc<Engine>,
    product_id: &str,
) -> Result<SimilarityAnalysis, RecommendError> {
    let target = catalog
        .product_by_id(product_id)?
        .ok_or_else(|| RecommendError::NotFound {
            id: product_id.to_string(),
        })?;
    let neighbors = engine.similar_products(product_id, Some(NEIGHBOR_SAMPLE), true)?;

    let scores: Vec<f32> = neighbors.iter().map(|n| n.score).collect();
    let scores_f64: Vec<f64> = scores.iter().map(|&s| s as f64).collect();
    let prices: Vec<f64> = neighbors.iter().map(|n| n.product.price).collect();

    let mut category_distribution: BTreeMap<String, usize> = BTreeMap::new();
    for neighbor in &neighbors {
        *category_distribution
            .entry(neighbor.product.category.clone())
            .or_default() += 1;
    }

    Ok(SimilarityAnalysis {
        product_id: product_id.to_string(),
        similarity_statistics: ScoreStats {
            mean: mean(&scores_f64) as f32,
            std: std_dev(&scores_f64) as f32,
            min: min_of(&scores_f64) as f32,
            max: max_of(&scores_f64) as f32,
        },
        similarity_scores: scores,
        category_distribution,
        price_similarity: PriceSimilarity {
            target_price: target.price,
            price_variance: variance(&prices),
            price_min: min_of(&prices),
            price_max: max_of(&prices),
            similar_prices: prices,
        },
        target_product: target,
    })
}

pub(crate) fn run_quality_battery(
    engine: &Arc<Engine>,
    queries: &[String],
    top_k: usize,
) -> QualityMetrics {
    let mut per_query = Vec::new();
    let mut failed_queries = Vec::new();

    for query in queries {
        match engine.recommend(query, Some(top_k), None, None, None) {
            Ok(recommendations) => {
                let quality = engine.analyze_quality(&recommendations);
                per_query.push(QueryQuality {
                    query: query.clone(),
                    quality,
                });
            }
            Err(err) => {
                tracing::warn!(query, error = %err, "sample query failed");
                failed_queries.push(FailedQuery {
                    query: query.clone(),
                    error: err.to_string(),
                });
            }
        }
    }

    let similarities: Vec<f64> = per_query
        .iter()
        .map(|q| q.quality.average_similarity as f64)
        .collect();
    let diversities: Vec<f64> = per_query
        .iter()
        .map(|q| q.quality.category_diversity as f64)
        .collect();
    let average_similarity = mean(&similarities) as f32;
    let average_diversity = mean(&diversities) as f32;

    QualityMetrics {
        test_queries: queries.len(),
        successful_queries: per_query.len(),
        failed_queries,
        per_query,
        overall: OverallQuality {
            average_similarity,
            average_diversity,
            overall_score: 0.7 * average_similarity + 0.3 * average_diversity,
        },
    }
}
