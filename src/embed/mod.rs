//! Embedding generation
//!
//! This module provides an abstraction over embedding sources with:
//! - A trait for different embedding backends
//! - An HTTP provider backend
//! - A deterministic hash-based fallback for offline/demo operation
//! - Batch processing for efficiency
//!
//! Every backend reports which [`EmbeddingSource`] it is, so quality-sensitive
//! consumers can tell provider vectors apart from placeholder ones.

mod fallback;
mod http_backend;

pub use fallback::*;
pub use http_backend::*;

use crate::config::EmbeddingConfig;
use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Which kind of backend produced a vector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingSource {
    /// A real embedding provider reached over HTTP
    Provider,
    /// The deterministic hash fallback; similarity quality is poor
    Fallback,
}

impl std::fmt::Display for EmbeddingSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EmbeddingSource::Provider => write!(f, "provider"),
            EmbeddingSource::Fallback => write!(f, "fallback"),
        }
    }
}

/// Trait for embedding backends
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed a batch of texts
    async fn embed(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>>;

    /// Get the embedding dimension
    fn dimension(&self) -> usize;

    /// Get the model name
    fn model_name(&self) -> &str;

    /// Which backend kind produced the vectors
    fn source(&self) -> EmbeddingSource;
}

/// Create an embedder based on configuration: an HTTP provider when one is
/// configured, otherwise the deterministic fallback.
pub fn create_embedder(config: &EmbeddingConfig) -> Result<Box<dyn Embedder>> {
    match &config.provider_url {
        Some(url) => Ok(Box::new(HttpEmbedder::new(url, config)?)),
        None => Ok(Box::new(HashEmbedder::new(config.dimension))),
    }
}

/// Helper to embed in batches
pub async fn embed_in_batches(
    embedder: &dyn Embedder,
    texts: Vec<String>,
    batch_size: usize,
) -> Result<Vec<Vec<f32>>> {
    let mut all_embeddings = Vec::with_capacity(texts.len());

    for chunk in texts.chunks(batch_size.max(1)) {
        let embeddings = embedder.embed(chunk.to_vec()).await?;
        all_embeddings.extend(embeddings);
    }

    Ok(all_embeddings)
}

/// L2-normalize a vector
pub fn normalize_embedding(vector: &[f32]) -> Vec<f32> {
    let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm == 0.0 {
        return vector.to_vec();
    }
    vector.iter().map(|v| v / norm).collect()
}

/// Cosine similarity between two vectors, in [-1, 1]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|v| v * v).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|v| v * v).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_embedding() {
        let normalized = normalize_embedding(&[3.0, 4.0]);
        assert!((normalized[0] - 0.6).abs() < 1e-6);
        assert!((normalized[1] - 0.8).abs() < 1e-6);

        // Zero vector passes through unchanged
        assert_eq!(normalize_embedding(&[0.0, 0.0]), vec![0.0, 0.0]);
    }

    #[test]
    fn test_cosine_similarity_bounds() {
        let a = [1.0, 0.0];
        assert!((cosine_similarity(&a, &[1.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!((cosine_similarity(&a, &[-1.0, 0.0]) + 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&a, &[0.0, 1.0]).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_similarity_mismatched_lengths() {
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[1.0]), 0.0);
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
    }

    #[tokio::test]
    async fn test_embed_in_batches() {
        let embedder = HashEmbedder::new(8);
        let texts: Vec<String> = (0..10).map(|i| format!("text {}", i)).collect();

        let vectors = embed_in_batches(&embedder, texts.clone(), 3).await.unwrap();
        assert_eq!(vectors.len(), 10);

        // Batching does not change per-text results
        let single = embedder.embed(texts).await.unwrap();
        assert_eq!(vectors, single);
    }

    #[test]
    fn test_create_embedder_selects_fallback() {
        let config = EmbeddingConfig {
            provider_url: None,
            ..EmbeddingConfig::default()
        };
        let embedder = create_embedder(&config).unwrap();
        assert_eq!(embedder.source(), EmbeddingSource::Fallback);
    }
}
