//! Deterministic fallback embedder
//!
//! Used when no embedding provider is configured. Folds character codes into a
//! fixed number of buckets and L2-normalizes the result. This is a placeholder
//! for offline and demo operation, not a production similarity model; results
//! produced from it are tagged [`EmbeddingSource::Fallback`].

use super::{normalize_embedding, Embedder, EmbeddingSource};
use crate::error::Result;
use async_trait::async_trait;

pub struct HashEmbedder {
    dimension: usize,
}

impl HashEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension: dimension.max(1),
        }
    }

    fn embed_one(&self, text: &str) -> Vec<f32> {
        let mut buckets = vec![0.0f32; self.dimension];

        for (i, c) in text.to_lowercase().chars().enumerate() {
            let code = c as u32;
            let bucket = (code as usize).wrapping_add(i * 31) % self.dimension;
            buckets[bucket] += 1.0 + (code % 7) as f32 * 0.1;
        }

        normalize_embedding(&buckets)
    }
}

#[async_trait]
impl Embedder for HashEmbedder {
    async fn embed(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.embed_one(t)).collect())
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        "hash-fallback"
    }

    fn source(&self) -> EmbeddingSource {
        EmbeddingSource::Fallback
    }
}
