use fxhash::hash64;

use crate::normalize::l2_normalize_in_place;
use crate::EmbeddingError;

/// Maps text to a fixed-dimension vector.
///
/// Implementations must be deterministic for identical input within a single
/// provider instance and must return vectors of exactly
/// [`dimension`](Self::dimension) length. A provider that cannot produce a
/// vector returns an error; it never falls back to a zero vector.
pub trait EmbeddingProvider: Send + Sync {
    /// Fixed output dimension of this provider.
    fn dimension(&self) -> usize;

    /// Embed a single text.
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;

    /// Embed a batch of texts. The default implementation embeds one at a
    /// time; remote providers override this with a true batch call.
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        texts.iter().map(|text| self.embed(text)).collect()
    }
}

/// Deterministic local embedder.
///
/// Generates sinusoid values derived from a hash of the input text, which
/// guarantees reproducible vectors with minimal CPU cost. Stands in for the
/// black-box local model in tests and development environments.
#[derive(Debug, Clone)]
pub struct HashEmbedder {
    dimension: usize,
    normalize: bool,
}

impl HashEmbedder {
    pub fn new(dimension: usize, normalize: bool) -> Self {
        Self {
            dimension,
            normalize,
        }
    }
}

impl EmbeddingProvider for HashEmbedder {
    fn dimension(&self) -> usize {
        self.dimension
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let mut v = vec![0f32; self.dimension];
        let h = hash64(text.as_bytes());
        for (idx, value) in v.iter_mut().enumerate() {
            // Mix the index into the hash so the cycle length exceeds the
            // 64-bit shift range.
            let word = h.rotate_left((idx % 64) as u32) ^ (idx as u64).wrapping_mul(0x9E37_79B9);
            *value = ((word & 0xFFFF) as f32 * 0.0001).sin();
        }
        if self.normalize {
            l2_normalize_in_place(&mut v);
        }
        Ok(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_embedder_dimension() {
        let embedder = HashEmbedder::new(384, false);
        let v = embedder.embed("hello world").unwrap();
        assert_eq!(v.len(), 384);
        assert_eq!(embedder.dimension(), 384);
    }

    #[test]
    fn hash_embedder_deterministic() {
        let embedder = HashEmbedder::new(64, true);
        let a = embedder.embed("same text").unwrap();
        let b = embedder.embed("same text").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn hash_embedder_different_text_differs() {
        let embedder = HashEmbedder::new(64, false);
        let a = embedder.embed("hello").unwrap();
        let b = embedder.embed("world").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn hash_embedder_normalized_unit_length() {
        let embedder = HashEmbedder::new(128, true);
        let v = embedder.embed("a mid-century walnut sideboard").unwrap();
        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-4, "norm was {norm}");
    }

    #[test]
    fn hash_embedder_values_in_range() {
        let embedder = HashEmbedder::new(256, false);
        let v = embedder.embed("test").unwrap();
        for (i, &val) in v.iter().enumerate() {
            assert!(
                (-1.0..=1.0).contains(&val),
                "value at index {i} is {val}, outside [-1, 1]"
            );
        }
    }

    #[test]
    fn hash_embedder_empty_text() {
        let embedder = HashEmbedder::new(32, false);
        let v = embedder.embed("").unwrap();
        assert_eq!(v.len(), 32);
    }

    #[test]
    fn hash_embedder_unicode() {
        let embedder = HashEmbedder::new(32, false);
        let v = embedder.embed("Stuhl 椅子 🪑").unwrap();
        assert_eq!(v.len(), 32);
        assert!(!v.iter().all(|&x| x == 0.0));
    }

    #[test]
    fn default_batch_matches_single_embeds() {
        let embedder = HashEmbedder::new(16, true);
        let batch = embedder.embed_batch(&["sofa", "table"]).unwrap();
        assert_eq!(batch.len(), 2);
        assert_eq!(batch[0], embedder.embed("sofa").unwrap());
        assert_eq!(batch[1], embedder.embed("table").unwrap());
    }
}
