use super::*;

use std::collections::HashMap;

use catalog::{product_to_payload, CatalogConfig};
use embedding::EmbeddingError;
use index::{CollectionSpec, IndexError, InMemoryIndex, VectorRecord};

const DIM: usize = 4;

/// Test embedder with a fixed text → vector table. Unmapped texts embed to
/// a vector orthogonal to everything in the table.
struct FixedEmbedder {
    table: HashMap<String, Vec<f32>>,
}

impl FixedEmbedder {
    fn new(entries: &[(&str, [f32; DIM])]) -> Self {
        let table = entries
            .iter()
            .map(|(text, vector)| (text.to_string(), vector.to_vec()))
            .collect();
        Self { table }
    }
}

impl EmbeddingProvider for FixedEmbedder {
    fn dimension(&self) -> usize {
        DIM
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        Ok(self
            .table
            .get(text)
            .cloned()
            .unwrap_or_else(|| vec![0.0, 0.0, 0.0, 1.0]))
    }
}

/// Embedder that always fails, for propagation tests.
struct DownEmbedder;

impl EmbeddingProvider for DownEmbedder {
    fn dimension(&self) -> usize {
        DIM
    }

    fn embed(&self, _text: &str) -> Result<Vec<f32>, EmbeddingError> {
        Err(EmbeddingError::Unavailable("model host down".into()))
    }
}

/// Index whose every operation fails, for propagation tests.
struct DownIndex;

impl index::VectorIndex for DownIndex {
    fn ensure_collection(&self, _spec: &CollectionSpec) -> Result<(), IndexError> {
        Err(IndexError::Backend("connection refused".into()))
    }

    fn upsert(&self, _records: Vec<VectorRecord>) -> Result<(), IndexError> {
        Err(IndexError::Backend("connection refused".into()))
    }

    fn query(
        &self,
        _vector: &[f32],
        _top_k: usize,
        _filter: Option<&Filter>,
    ) -> Result<Vec<index::ScoredPoint>, IndexError> {
        Err(IndexError::Backend("connection refused".into()))
    }

    fn fetch(&self, _id: &str) -> Result<Option<VectorRecord>, IndexError> {
        Err(IndexError::Backend("connection refused".into()))
    }

    fn scan(&self, _limit: usize, _offset: usize) -> Result<Vec<VectorRecord>, IndexError> {
        Err(IndexError::Backend("connection refused".into()))
    }
}

fn product(id: &str, name: &str, category: &str, price: f64) -> Product {
    Product {
        id: id.into(),
        name: name.into(),
        category: category.into(),
        price,
        description: format!("{name} description"),
        ..Default::default()
    }
}

fn record(p: &Product, vector: [f32; DIM]) -> VectorRecord {
    VectorRecord {
        id: p.id.clone(),
        vector: vector.to_vec(),
        payload: product_to_payload(p),
    }
}

/// Engine over an in-memory index seeded with four products:
///
/// - "a": Chairs, 150, collinear with the query vector (score 1.0)
/// - "b": Tables, 900, orthogonal to the query (score 0.0)
/// - "c": Chairs, 1200, close to the query (score ~0.95)
/// - "d": Chairs, 450, moderately close (score ~0.6)
fn seeded_engine(cfg: EngineConfig) -> Engine {
    let embedder = Arc::new(FixedEmbedder::new(&[
        ("cozy reading chair", [1.0, 0.0, 0.0, 0.0]),
        ("Chairs", [0.8, 0.6, 0.0, 0.0]),
    ]));
    let index = Arc::new(InMemoryIndex::new());
    index
        .ensure_collection(&CollectionSpec::cosine("test-products", DIM))
        .expect("collection");

    let a = product("a", "Aria Chair", "Chairs", 150.0);
    let b = product("b", "Brook Table", "Tables", 900.0);
    let c = product("c", "Caldera Armchair", "Chairs", 1200.0);
    let d = product("d", "Dune Stool", "Chairs", 450.0);
    index
        .upsert(vec![
            record(&a, [1.0, 0.0, 0.0, 0.0]),
            record(&b, [0.0, 1.0, 0.0, 0.0]),
            record(&c, [0.95, 0.312_25, 0.0, 0.0]),
            record(&d, [0.6, 0.8, 0.0, 0.0]),
        ])
        .expect("seed");

    let catalog = Arc::new(Catalog::new(
        index,
        embedder,
        CatalogConfig {
            collection: "test-products".into(),
            dimension: DIM,
            ..Default::default()
        },
    ));
    Engine::new(catalog, cfg).expect("engine")
}

fn empty_engine() -> Engine {
    let index = Arc::new(InMemoryIndex::new());
    index
        .ensure_collection(&CollectionSpec::cosine("test-products", DIM))
        .expect("collection");
    let catalog = Arc::new(Catalog::new(
        index,
        Arc::new(FixedEmbedder::new(&[])),
        CatalogConfig {
            collection: "test-products".into(),
            dimension: DIM,
            ..Default::default()
        },
    ));
    Engine::new(catalog, EngineConfig::default()).expect("engine")
}

fn down_engine() -> Engine {
    let catalog = Arc::new(Catalog::new(
        Arc::new(DownIndex),
        Arc::new(FixedEmbedder::new(&[])),
        CatalogConfig::default(),
    ));
    Engine::new(catalog, EngineConfig::default()).expect("engine")
}

#[test]
fn recommend_respects_similarity_floor_and_ordering() {
    let engine = seeded_engine(EngineConfig::default());
    let hits = engine
        .recommend("cozy reading chair", Some(5), None, None, None)
        .expect("recommendations");

    // "b" scores 0.0, below the 0.3 floor.
    assert!(hits.iter().all(|h| h.product.id != "b"));
    assert!(hits
        .iter()
        .all(|h| h.score >= engine.config().similarity_threshold));
    for pair in hits.windows(2) {
        assert!(pair[0].score >= pair[1].score, "results must be sorted");
    }
    assert_eq!(hits[0].product.id, "a");
}

#[test]
fn recommend_threshold_excludes_perfect_filter_matches() {
    // A hard floor: "b" matches the category filter but scores below it.
    let engine = seeded_engine(EngineConfig::default());
    let hits = engine
        .recommend("cozy reading chair", Some(5), Some("Tables"), None, None)
        .expect("recommendations");
    assert!(hits.is_empty());
}

#[test]
fn recommend_truncates_to_top_k() {
    let engine = seeded_engine(EngineConfig::default());
    let hits = engine
        .recommend("cozy reading chair", Some(1), None, None, None)
        .unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].product.id, "a");
}

#[test]
fn recommend_applies_category_and_price_filters_conjunctively() {
    let engine = seeded_engine(EngineConfig::default());
    let hits = engine
        .recommend(
            "cozy reading chair",
            Some(5),
            Some("Chairs"),
            Some(100.0),
            Some(500.0),
        )
        .unwrap();
    assert!(!hits.is_empty());
    for hit in &hits {
        assert_eq!(hit.product.category, "Chairs");
        assert!(hit.product.price >= 100.0 && hit.product.price <= 500.0);
    }
}

#[test]
fn recommend_attaches_score_driven_reasons() {
    let engine = seeded_engine(EngineConfig::default());
    let hits = engine
        .recommend("cozy reading chair", Some(5), None, None, None)
        .unwrap();
    let top = &hits[0];
    assert!(top.reason.contains("Highly similar to your search"));
    assert!(top.reason.contains("Popular in Chairs category"));
    assert!(top.reason.contains("Great value"));
}

#[test]
fn recommend_default_top_k_applies_when_unset() {
    let cfg = EngineConfig {
        default_top_k: 2,
        similarity_threshold: -1.0,
        ..Default::default()
    };
    let engine = seeded_engine(cfg);
    let hits = engine
        .recommend("cozy reading chair", None, None, None, None)
        .unwrap();
    assert_eq!(hits.len(), 2);
}

#[test]
fn recommend_rejects_zero_top_k_before_backend_calls() {
    let engine = down_engine();
    // With a dead backend, the InvalidRequest proves validation ran first.
    let err = engine.recommend("chair", Some(0), None, None, None).unwrap_err();
    assert!(matches!(err, RecommendError::InvalidRequest(_)));
}

#[test]
fn recommend_rejects_top_k_above_cap() {
    let engine = seeded_engine(EngineConfig::default());
    let err = engine
        .recommend("chair", Some(51), None, None, None)
        .unwrap_err();
    assert!(matches!(err, RecommendError::InvalidRequest(_)));
}

#[test]
fn recommend_rejects_empty_query() {
    let engine = seeded_engine(EngineConfig::default());
    let err = engine.recommend("   ", Some(3), None, None, None).unwrap_err();
    assert!(matches!(err, RecommendError::InvalidRequest(_)));
}

#[test]
fn recommend_rejects_inverted_price_range_before_backend_calls() {
    let engine = down_engine();
    let err = engine
        .recommend("chair", Some(3), None, Some(500.0), Some(100.0))
        .unwrap_err();
    assert!(matches!(err, RecommendError::InvalidRequest(_)));
}

#[test]
fn recommend_propagates_index_failure() {
    let engine = down_engine();
    let err = engine.recommend("chair", Some(3), None, None, None).unwrap_err();
    assert!(matches!(err, RecommendError::BackendUnavailable(_)));
}

#[test]
fn recommend_propagates_embedding_failure() {
    let index = Arc::new(InMemoryIndex::new());
    index
        .ensure_collection(&CollectionSpec::cosine("test-products", DIM))
        .unwrap();
    let catalog = Arc::new(Catalog::new(
        index,
        Arc::new(DownEmbedder),
        CatalogConfig {
            collection: "test-products".into(),
            dimension: DIM,
            ..Default::default()
        },
    ));
    let engine = Engine::new(catalog, EngineConfig::default()).unwrap();
    let err = engine.recommend("chair", Some(3), None, None, None).unwrap_err();
    assert!(matches!(err, RecommendError::BackendUnavailable(_)));
}

#[test]
fn recommend_empty_catalog_is_empty_not_error() {
    let engine = empty_engine();
    let hits = engine.recommend("anything", Some(5), None, None, None).unwrap();
    assert!(hits.is_empty());
}

#[test]
fn equal_scores_keep_index_order() {
    // Two records with identical vectors tie exactly; the in-memory index
    // yields them in insertion order and the engine must not reorder them.
    let embedder = Arc::new(FixedEmbedder::new(&[("q", [1.0, 0.0, 0.0, 0.0])]));
    let index = Arc::new(InMemoryIndex::new());
    index
        .ensure_collection(&CollectionSpec::cosine("test-products", DIM))
        .unwrap();
    let first = product("first", "First", "Chairs", 10.0);
    let second = product("second", "Second", "Chairs", 20.0);
    index
        .upsert(vec![
            record(&first, [1.0, 0.0, 0.0, 0.0]),
            record(&second, [1.0, 0.0, 0.0, 0.0]),
        ])
        .unwrap();
    let catalog = Arc::new(Catalog::new(
        index,
        embedder,
        CatalogConfig {
            collection: "test-products".into(),
            dimension: DIM,
            ..Default::default()
        },
    ));
    let engine = Engine::new(catalog, EngineConfig::default()).unwrap();

    let hits = engine.recommend("q", Some(2), None, None, None).unwrap();
    assert_eq!(hits[0].product.id, "first");
    assert_eq!(hits[1].product.id, "second");
}

#[test]
fn similar_products_excludes_reference() {
    let engine = seeded_engine(EngineConfig::default());
    let hits = engine.similar_products("a", Some(3), true).unwrap();
    assert!(!hits.is_empty());
    assert!(hits.iter().all(|h| h.product.id != "a"));
    assert!(hits.iter().all(|h| h.reason == "Similar to Aria Chair"));
}

#[test]
fn similar_products_can_include_reference() {
    let engine = seeded_engine(EngineConfig::default());
    let hits = engine.similar_products("a", Some(4), false).unwrap();
    assert!(hits.iter().any(|h| h.product.id == "a"));
}

#[test]
fn similar_products_missing_id_is_not_found() {
    let engine = seeded_engine(EngineConfig::default());
    let err = engine.similar_products("ghost", Some(3), true).unwrap_err();
    assert!(matches!(err, RecommendError::NotFound { .. }));
}

#[test]
fn similar_products_backend_failure_is_distinct_from_not_found() {
    let engine = down_engine();
    let err = engine.similar_products("a", Some(3), true).unwrap_err();
    assert!(matches!(err, RecommendError::BackendUnavailable(_)));
}

#[test]
fn category_recommendations_filter_exactly() {
    let engine = seeded_engine(EngineConfig::default());
    let hits = engine
        .category_recommendations("Chairs", Some(10), None, None)
        .unwrap();
    assert_eq!(hits.len(), 3);
    assert!(hits.iter().all(|h| h.product.category == "Chairs"));
    assert!(hits
        .iter()
        .all(|h| h.reason == "Popular in Chairs category"));
}

#[test]
fn category_recommendations_apply_no_similarity_floor() {
    // "d" scores ~0.92 against the mapped "Chairs" vector, but "a" only
    // ~0.8; with the floor raised past both they must still be returned.
    let cfg = EngineConfig {
        similarity_threshold: 0.99,
        ..Default::default()
    };
    let engine = seeded_engine(cfg);
    let hits = engine
        .category_recommendations("Chairs", Some(10), None, None)
        .unwrap();
    assert_eq!(hits.len(), 3);
}

#[test]
fn category_recommendations_respect_price_bounds() {
    let engine = seeded_engine(EngineConfig::default());
    let hits = engine
        .category_recommendations("Chairs", Some(10), Some(100.0), Some(500.0))
        .unwrap();
    assert!(!hits.is_empty());
    assert!(hits
        .iter()
        .all(|h| h.product.price >= 100.0 && h.product.price <= 500.0));
}

#[test]
fn category_recommendations_unknown_category_is_empty() {
    let engine = seeded_engine(EngineConfig::default());
    let hits = engine
        .category_recommendations("Rugs", Some(10), None, None)
        .unwrap();
    assert!(hits.is_empty());
}

#[test]
fn trending_ranks_by_descending_price() {
    let engine = seeded_engine(EngineConfig::default());
    let hits = engine.trending(Some(4)).unwrap();
    let prices: Vec<f64> = hits.iter().map(|h| h.product.price).collect();
    assert_eq!(prices, vec![1200.0, 900.0, 450.0, 150.0]);
    assert!(hits.iter().all(|h| h.reason == "Trending product"));
    assert!(hits
        .iter()
        .all(|h| (h.score - engine.config().trending_score).abs() < f32::EPSILON));
}

#[test]
fn trending_top_one_is_most_expensive() {
    let engine = seeded_engine(EngineConfig::default());
    let hits = engine.trending(Some(1)).unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].product.id, "c");
}

#[test]
fn trending_empty_catalog_is_empty() {
    let engine = empty_engine();
    assert!(engine.trending(Some(5)).unwrap().is_empty());
}

#[test]
fn analyze_quality_empty_is_zeroed() {
    let engine = seeded_engine(EngineConfig::default());
    let report = engine.analyze_quality(&[]);
    assert_eq!(report.total_recommendations, 0);
    assert_eq!(report.category_diversity, 0);
}

#[test]
fn analyze_quality_summarizes_scores_and_diversity() {
    let engine = seeded_engine(EngineConfig::default());
    let recs = vec![
        Recommendation::new(product("a", "A", "Chairs", 100.0), 0.9, "r"),
        Recommendation::new(product("b", "B", "Tables", 300.0), 0.5, "r"),
        Recommendation::new(product("c", "C", "Chairs", 200.0), 0.7, "r"),
    ];
    let report = engine.analyze_quality(&recs);
    assert_eq!(report.total_recommendations, 3);
    assert!((report.average_similarity - 0.7).abs() < 1e-6);
    assert_eq!(report.min_similarity, 0.5);
    assert_eq!(report.max_similarity, 0.9);
    assert_eq!(report.category_diversity, 2);
    assert_eq!(report.price_range.min, 100.0);
    assert_eq!(report.price_range.max, 300.0);
    assert!((report.price_range.mean - 200.0).abs() < 1e-9);
}
