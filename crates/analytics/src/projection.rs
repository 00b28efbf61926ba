//! Dimensionality reduction for embedding visualization.
//!
//! Two methods: a linear PCA projection and a non-linear neighbor-embedding
//! layout. Both are deterministic (fixed seed, fixed iteration counts) and
//! explicitly best-effort visualization tooling — never a ranking input.

use std::str::FromStr;

use catalog::{embedding_text, product_from_payload, Catalog};
use index::VectorRecord;
use ndarray::{Array1, Array2, Axis};
use recommend::RecommendError;
use serde::{Deserialize, Serialize};

/// Supported projection methods.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ProjectionMethod {
    /// Linear projection onto the top principal components.
    Pca,
    /// Non-linear layout that pulls cosine neighbors together.
    NeighborEmbedding,
}

impl FromStr for ProjectionMethod {
    type Err = RecommendError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pca" | "linear" => Ok(ProjectionMethod::Pca),
            "neighbor_embedding" | "neighbor-embedding" | "tsne" => {
                Ok(ProjectionMethod::NeighborEmbedding)
            }
            other => Err(RecommendError::InvalidRequest(format!(
                "unsupported projection method {other:?}"
            ))),
        }
    }
}

/// One projected item with the metadata a scatter plot needs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProjectionPoint {
    pub id: String,
    pub name: String,
    pub category: String,
    pub price: f64,
    /// `n_components` coordinates.
    pub coords: Vec<f32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProjectionReport {
    pub method: ProjectionMethod,
    pub n_components: usize,
    pub points: Vec<ProjectionPoint>,
}

pub(crate) fn project_records(
    catalog: &Catalog,
    records: &[VectorRecord],
    method: ProjectionMethod,
    n_components: usize,
) -> Result<ProjectionReport, RecommendError> {
    if records.is_empty() {
        return Ok(ProjectionReport {
            method,
            n_components,
            points: Vec::new(),
        });
    }

    let products: Vec<_> = records
        .iter()
        .map(|r| product_from_payload(&r.id, &r.payload))
        .collect();

    // Use stored vectors; regenerate through the embedder only for records
    // that carry none (some stores do not return raw vectors on scan).
    let mut vectors: Vec<Vec<f32>> = Vec::with_capacity(records.len());
    for (record, product) in records.iter().zip(&products) {
        if record.vector.is_empty() {
            let text = embedding_text(product);
            vectors.push(catalog.embedder().embed(&text)?);
        } else {
            vectors.push(record.vector.clone());
        }
    }

    let coords = match method {
        ProjectionMethod::Pca => pca(&vectors, n_components),
        ProjectionMethod::NeighborEmbedding => neighbor_embedding(&vectors, n_components),
    };

    let points = products
        .into_iter()
        .zip(coords)
        .map(|(product, coords)| ProjectionPoint {
            id: product.id,
            name: product.name,
            category: product.category,
            price: product.price,
            coords,
        })
        .collect();

    Ok(ProjectionReport {
        method,
        n_components,
        points,
    })
}

/// PCA via power iteration with deflation on the centered data matrix.
fn pca(vectors: &[Vec<f32>], n_components: usize) -> Vec<Vec<f32>> {
    let n = vectors.len();
    let dim = vectors[0].len();
    if dim == 0 {
        return vec![vec![0.0; n_components]; n];
    }

    let mut data = Array2::<f64>::zeros((n, dim));
    for (i, vector) in vectors.iter().enumerate() {
        for (j, &value) in vector.iter().enumerate().take(dim) {
            data[[i, j]] = value as f64;
        }
    }
    let means = data.mean_axis(Axis(0)).unwrap_or_else(|| Array1::zeros(dim));
    for mut row in data.rows_mut() {
        row -= &means;
    }

    let components = n_components.min(dim);
    let mut coords = vec![vec![0.0f32; n_components]; n];
    for component in 0..components {
        // Deterministic start vector; the offset decorrelates successive
        // components before deflation takes over.
        let mut axis = Array1::<f64>::from_shape_fn(dim, |j| {
            if (j + component) % 2 == 0 {
                1.0
            } else {
                -0.5
            }
        });
        normalize(&mut axis);

        for _ in 0..64 {
            // Power iteration on X^T X without materializing the d×d matrix.
            let projected = data.dot(&axis);
            let mut next = data.t().dot(&projected);
            let norm = normalize(&mut next);
            if norm < 1e-12 {
                break;
            }
            axis = next;
        }

        let projected = data.dot(&axis);
        for i in 0..n {
            coords[i][component] = projected[i] as f32;
        }
        // Deflate: remove the captured component from the data.
        for (mut row, &score) in data.rows_mut().into_iter().zip(projected.iter()) {
            row.scaled_add(-score, &axis);
        }
    }
    coords
}

fn normalize(v: &mut Array1<f64>) -> f64 {
    let norm = v.dot(&*v).sqrt();
    if norm > 0.0 {
        *v /= norm;
    }
    norm
}

/// Deterministic neighbor-embedding layout.
///
/// Initializes coordinates from a fixed-seed LCG, then runs a fixed number
/// of spring iterations: each point is attracted toward its k nearest
/// cosine neighbors at a distance proportional to (1 - similarity) and
/// weakly repelled from everything else. Approximate by design.
fn neighbor_embedding(vectors: &[Vec<f32>], n_components: usize) -> Vec<Vec<f32>> {
    const NEIGHBORS: usize = 10;
    const ITERATIONS: usize = 60;
    const LEARNING_RATE: f32 = 0.1;
    const REPULSION: f32 = 0.01;

    let n = vectors.len();
    let mut rng = Lcg::new(0x5EED_CAFE);
    let mut coords: Vec<Vec<f32>> = (0..n)
        .map(|_| (0..n_components).map(|_| rng.next_unit() - 0.5).collect())
        .collect();
    if n < 2 {
        return coords;
    }

    // kNN by cosine similarity.
    let k = NEIGHBORS.min(n - 1);
    let mut neighbors: Vec<Vec<(usize, f32)>> = Vec::with_capacity(n);
    for i in 0..n {
        let mut sims: Vec<(usize, f32)> = (0..n)
            .filter(|&j| j != i)
            .map(|j| (j, index::cosine_similarity(&vectors[i], &vectors[j])))
            .collect();
        sims.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        sims.truncate(k);
        neighbors.push(sims);
    }

    for _ in 0..ITERATIONS {
        let snapshot = coords.clone();
        for i in 0..n {
            for &(j, sim) in &neighbors[i] {
                let target = (1.0 - sim).max(0.0);
                let (dist, delta) = offset(&snapshot[i], &snapshot[j]);
                let pull = LEARNING_RATE * (dist - target);
                for (c, d) in coords[i].iter_mut().zip(&delta) {
                    *c -= pull * d;
                }
            }
            // Mild global repulsion keeps unrelated clusters apart.
            for j in 0..n {
                if j == i {
                    continue;
                }
                let (dist, delta) = offset(&snapshot[i], &snapshot[j]);
                if dist < 0.2 {
                    for (c, d) in coords[i].iter_mut().zip(&delta) {
                        *c += REPULSION * d;
                    }
                }
            }
        }
    }
    coords
}

/// Distance between two points plus the unit offset from `b` toward `a`.
fn offset(a: &[f32], b: &[f32]) -> (f32, Vec<f32>) {
    let mut delta: Vec<f32> = a.iter().zip(b).map(|(x, y)| x - y).collect();
    let dist = delta.iter().map(|d| d * d).sum::<f32>().sqrt();
    if dist > 1e-9 {
        for d in &mut delta {
            *d /= dist;
        }
    }
    (dist, delta)
}

/// Minimal deterministic generator for reproducible layouts.
struct Lcg(u64);

impl Lcg {
    fn new(seed: u64) -> Self {
        Self(seed)
    }

    fn next_unit(&mut self) -> f32 {
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        ((self.0 >> 33) as f32) / ((1u64 << 31) as f32)
    }
}
