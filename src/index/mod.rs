//! Vector index integration
//!
//! The vector index is best-effort infrastructure: the metadata store stays
//! authoritative, and callers treat index failures as degradation rather than
//! hard errors. This module defines the index abstraction, the payload schema
//! stored with each point, and the Qdrant-backed implementation.

mod payload;
mod qdrant;

pub use payload::*;
pub use qdrant::*;

use crate::error::Result;
use async_trait::async_trait;
use serde::Serialize;

/// A chunk ready to be written to the index
#[derive(Debug, Clone)]
pub struct IndexedChunk {
    pub chunk_index: usize,
    pub text: String,
    pub vector: Vec<f32>,
}

/// A chunk returned from a similarity search
#[derive(Debug, Clone)]
pub struct ScoredChunk {
    pub document_id: String,
    pub owner_id: String,
    pub chunk_index: usize,
    pub text: String,
    pub score: f32,
}

/// Reachability and size of the index, as observed just now
#[derive(Debug, Clone, Serialize)]
pub struct IndexHealth {
    pub reachable: bool,
    pub points_count: u64,
}

/// Trait for vector index backends
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Ensure the backing collection exists with the right configuration
    async fn ensure_ready(&self) -> Result<()>;

    /// Write all chunks of a document, replacing any existing versions.
    /// Returns the number of chunks written.
    async fn upsert_document(
        &self,
        document_id: &str,
        owner_id: &str,
        chunks: &[IndexedChunk],
    ) -> Result<usize>;

    /// Remove every chunk belonging to a document
    async fn delete_document(&self, document_id: &str) -> Result<()>;

    /// Count the chunks currently indexed for a document
    async fn chunk_count(&self, document_id: &str) -> Result<u64>;

    /// Distinct document ids present in the index for an owner
    async fn document_ids(&self, owner_id: &str) -> Result<Vec<String>>;

    /// Similarity search scoped to one owner
    async fn search(
        &self,
        query_vector: Vec<f32>,
        owner_id: &str,
        limit: usize,
    ) -> Result<Vec<ScoredChunk>>;

    /// Probe the index without failing; unreachable reads as unhealthy
    async fn health(&self) -> IndexHealth;
}
