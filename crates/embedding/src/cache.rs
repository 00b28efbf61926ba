use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};

use lru::LruCache;

use crate::{EmbeddingError, EmbeddingProvider};

/// Bounded LRU cache over any [`EmbeddingProvider`], keyed by input text.
///
/// The cache is the only mutable state adjacent to the engine; it sits behind
/// a mutex and holds the lock only for the lookup/insert, never across the
/// inner provider call.
pub struct CachedEmbedder {
    inner: Arc<dyn EmbeddingProvider>,
    cache: Mutex<LruCache<String, Vec<f32>>>,
}

impl CachedEmbedder {
    /// Wrap `inner` with a cache of `capacity` entries. A zero capacity is
    /// coerced to one; use the raw provider if caching is unwanted.
    pub fn new(inner: Arc<dyn EmbeddingProvider>, capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner,
            cache: Mutex::new(LruCache::new(capacity)),
        }
    }

    fn lookup(&self, text: &str) -> Option<Vec<f32>> {
        let mut guard = self.cache.lock().unwrap_or_else(|poisoned| {
            // A panic mid-lookup cannot corrupt the map; keep serving.
            poisoned.into_inner()
        });
        guard.get(text).cloned()
    }

    fn store(&self, text: &str, vector: &[f32]) {
        let mut guard = self
            .cache
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        guard.put(text.to_string(), vector.to_vec());
    }
}

impl EmbeddingProvider for CachedEmbedder {
    fn dimension(&self) -> usize {
        self.inner.dimension()
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        if let Some(hit) = self.lookup(text) {
            return Ok(hit);
        }
        let vector = self.inner.embed(text)?;
        self.store(text, &vector);
        Ok(vector)
    }

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        // Partition into hits and misses so the inner provider sees one
        // batch containing only the misses.
        let mut out: Vec<Option<Vec<f32>>> = texts.iter().map(|t| self.lookup(t)).collect();
        let misses: Vec<(usize, &str)> = texts
            .iter()
            .enumerate()
            .filter(|(i, _)| out[*i].is_none())
            .map(|(i, t)| (i, *t))
            .collect();

        if !misses.is_empty() {
            let miss_texts: Vec<&str> = misses.iter().map(|(_, t)| *t).collect();
            let vectors = self.inner.embed_batch(&miss_texts)?;
            for ((i, text), vector) in misses.into_iter().zip(vectors) {
                self.store(text, &vector);
                out[i] = Some(vector);
            }
        }

        Ok(out.into_iter().flatten().collect())
    }
}
