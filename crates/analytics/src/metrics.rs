use std::collections::BTreeMap;

use catalog::Product;
use serde::{Deserialize, Serialize};

/// Fixed price tiers. For any price exactly one tier holds, so the tier
/// counts always sum to the number of priced items.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PriceBucket {
    /// price < 200
    Budget,
    /// 200 <= price < 800
    MidRange,
    /// price >= 800
    Premium,
}

impl PriceBucket {
    /// Deterministic partition of the price line.
    pub fn of(price: f64) -> Self {
        if price < 200.0 {
            PriceBucket::Budget
        } else if price < 800.0 {
            PriceBucket::MidRange
        } else {
            PriceBucket::Premium
        }
    }
}

/// Counts per price tier.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct PriceRanges {
    pub budget: usize,
    pub mid_range: usize,
    pub premium: usize,
}

/// Global price statistics over products with a known (non-zero) price.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct PriceStats {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub median: f64,
    pub std: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct PriceBounds {
    pub min: f64,
    pub max: f64,
}

/// Per-category breakdown.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct CategoryInsight {
    pub count: usize,
    /// Share of the scanned catalog, in percent, rounded to two decimals.
    pub percentage: f64,
    /// Average over the category's priced items; 0.0 when none are priced.
    pub avg_price: f64,
    pub price_range: PriceBounds,
}

/// Catalog-wide metrics snapshot, computed fresh per call.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct CatalogMetrics {
    pub total_products: usize,
    /// Category label → product count.
    pub categories: BTreeMap<String, usize>,
    pub category_insights: BTreeMap<String, CategoryInsight>,
    pub price_statistics: PriceStats,
    pub price_ranges: PriceRanges,
}

pub(crate) fn compute_metrics(products: &[Product]) -> CatalogMetrics {
    if products.is_empty() {
        return CatalogMetrics::default();
    }

    let total = products.len();
    let mut categories: BTreeMap<String, usize> = BTreeMap::new();
    for product in products {
        *categories.entry(product.category.clone()).or_default() += 1;
    }

    // "Priced" means a known, non-zero price; 0.0 is the unknown sentinel.
    let prices: Vec<f64> = products
        .iter()
        .map(|p| p.price)
        .filter(|&p| p > 0.0)
        .collect();

    let mut ranges = PriceRanges::default();
    for &price in &prices {
        match PriceBucket::of(price) {
            PriceBucket::Budget => ranges.budget += 1,
            PriceBucket::MidRange => ranges.mid_range += 1,
            PriceBucket::Premium => ranges.premium += 1,
        }
    }

    let mut insights = BTreeMap::new();
    for (category, &count) in &categories {
        let category_prices: Vec<f64> = products
            .iter()
            .filter(|p| &p.category == category)
            .map(|p| p.price)
            .filter(|&p| p > 0.0)
            .collect();
        insights.insert(
            category.clone(),
            CategoryInsight {
                count,
                percentage: round2(count as f64 / total as f64 * 100.0),
                avg_price: mean(&category_prices),
                price_range: PriceBounds {
                    min: min_of(&category_prices),
                    max: max_of(&category_prices),
                },
            },
        );
    }

    CatalogMetrics {
        total_products: total,
        categories,
        category_insights: insights,
        price_statistics: PriceStats {
            min: min_of(&prices),
            max: max_of(&prices),
            mean: mean(&prices),
            median: median(&prices),
            std: std_dev(&prices),
        },
        price_ranges: ranges,
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub(crate) fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

pub(crate) fn min_of(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().copied().fold(f64::INFINITY, f64::min)
    }
}

pub(crate) fn max_of(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().copied().fold(f64::NEG_INFINITY, f64::max)
    }
}

pub(crate) fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

/// Population standard deviation.
pub(crate) fn std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    let variance = values.iter().map(|v| (v - m) * (v - m)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

/// Population variance.
pub(crate) fn variance(values: &[f64]) -> f64 {
    let s = std_dev(values);
    s * s
}
