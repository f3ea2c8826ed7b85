//! In-memory fakes for exercising partial-failure paths

use crate::embed::{cosine_similarity, Embedder, EmbeddingSource, HashEmbedder};
use crate::error::{Error, Result};
use crate::index::{IndexHealth, IndexedChunk, ScoredChunk, VectorIndex};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

/// Embedder that drops the last vector of every batch, violating the
/// one-vector-per-text contract
pub struct ShortEmbedder {
    inner: HashEmbedder,
}

impl ShortEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self {
            inner: HashEmbedder::new(dimension),
        }
    }
}

#[async_trait]
impl Embedder for ShortEmbedder {
    async fn embed(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
        let mut vectors = self.inner.embed(texts).await?;
        vectors.pop();
        Ok(vectors)
    }

    fn dimension(&self) -> usize {
        self.inner.dimension()
    }

    fn model_name(&self) -> &str {
        "short-batch"
    }

    fn source(&self) -> EmbeddingSource {
        EmbeddingSource::Fallback
    }
}

/// Fully in-memory index with real cosine scoring
#[derive(Default)]
pub struct MemoryIndex {
    // document_id -> (owner_id, chunks), in insertion order
    inner: Mutex<Vec<(String, String, Vec<IndexedChunk>)>>,
}

impl MemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<(String, String, Vec<IndexedChunk>)>> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn total_chunks(&self) -> usize {
        self.lock().iter().map(|(_, _, chunks)| chunks.len()).sum()
    }
}

#[async_trait]
impl VectorIndex for MemoryIndex {
    async fn ensure_ready(&self) -> Result<()> {
        Ok(())
    }

    async fn upsert_document(
        &self,
        document_id: &str,
        owner_id: &str,
        chunks: &[IndexedChunk],
    ) -> Result<usize> {
        let mut inner = self.lock();
        inner.retain(|(id, _, _)| id != document_id);
        inner.push((
            document_id.to_string(),
            owner_id.to_string(),
            chunks.to_vec(),
        ));
        Ok(chunks.len())
    }

    async fn delete_document(&self, document_id: &str) -> Result<()> {
        self.lock().retain(|(id, _, _)| id != document_id);
        Ok(())
    }

    async fn chunk_count(&self, document_id: &str) -> Result<u64> {
        Ok(self
            .lock()
            .iter()
            .find(|(id, _, _)| id == document_id)
            .map(|(_, _, chunks)| chunks.len() as u64)
            .unwrap_or(0))
    }

    async fn document_ids(&self, owner_id: &str) -> Result<Vec<String>> {
        Ok(self
            .lock()
            .iter()
            .filter(|(_, owner, _)| owner == owner_id)
            .map(|(id, _, _)| id.clone())
            .collect())
    }

    async fn search(
        &self,
        query_vector: Vec<f32>,
        owner_id: &str,
        limit: usize,
    ) -> Result<Vec<ScoredChunk>> {
        let query = query_vector.as_slice();
        let mut scored: Vec<ScoredChunk> = self
            .lock()
            .iter()
            .filter(|(_, owner, _)| owner == owner_id)
            .flat_map(|(id, owner, chunks)| {
                chunks.iter().map(move |chunk| ScoredChunk {
                    document_id: id.clone(),
                    owner_id: owner.clone(),
                    chunk_index: chunk.chunk_index,
                    text: chunk.text.clone(),
                    score: cosine_similarity(query, &chunk.vector),
                })
            })
            .collect();

        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(limit);
        Ok(scored)
    }

    async fn health(&self) -> IndexHealth {
        IndexHealth {
            reachable: true,
            points_count: self.total_chunks() as u64,
        }
    }
}

/// Index whose operations all fail, simulating an unreachable backend
#[derive(Default)]
pub struct FailingIndex;

impl FailingIndex {
    fn unreachable() -> Error {
        Error::Index("index unreachable".to_string())
    }
}

#[async_trait]
impl VectorIndex for FailingIndex {
    async fn ensure_ready(&self) -> Result<()> {
        Err(Self::unreachable())
    }

    async fn upsert_document(&self, _: &str, _: &str, _: &[IndexedChunk]) -> Result<usize> {
        Err(Self::unreachable())
    }

    async fn delete_document(&self, _: &str) -> Result<()> {
        Err(Self::unreachable())
    }

    async fn chunk_count(&self, _: &str) -> Result<u64> {
        Err(Self::unreachable())
    }

    async fn document_ids(&self, _: &str) -> Result<Vec<String>> {
        Err(Self::unreachable())
    }

    async fn search(&self, _: Vec<f32>, _: &str, _: usize) -> Result<Vec<ScoredChunk>> {
        Err(Self::unreachable())
    }

    async fn health(&self) -> IndexHealth {
        IndexHealth {
            reachable: false,
            points_count: 0,
        }
    }
}

/// Shared HashMap-backed metadata store for tests that cannot touch disk
#[derive(Default)]
pub struct MemoryStore {
    docs: Mutex<HashMap<String, crate::meta::Document>>,
}

#[async_trait]
impl crate::meta::MetadataStore for MemoryStore {
    async fn insert_document(&self, doc: &crate::meta::Document) -> Result<()> {
        self.docs
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(doc.id.clone(), doc.clone());
        Ok(())
    }

    async fn get_document(&self, id: &str) -> Result<Option<crate::meta::Document>> {
        Ok(self
            .docs
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(id)
            .cloned())
    }

    async fn list_documents(&self, owner_id: &str) -> Result<Vec<crate::meta::Document>> {
        let mut docs: Vec<_> = self
            .docs
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .values()
            .filter(|d| d.owner_id == owner_id)
            .cloned()
            .collect();
        docs.sort_by(|a, b| (&a.created_at, &a.id).cmp(&(&b.created_at, &b.id)));
        Ok(docs)
    }

    async fn set_chunk_count(&self, id: &str, chunk_count: i64) -> Result<()> {
        if let Some(doc) = self
            .docs
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get_mut(id)
        {
            doc.chunk_count = chunk_count;
        }
        Ok(())
    }

    async fn delete_document(&self, id: &str) -> Result<bool> {
        Ok(self
            .docs
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(id)
            .is_some())
    }

    async fn stats(&self) -> Result<crate::meta::StoreStats> {
        let docs = self.docs.lock().unwrap_or_else(|e| e.into_inner());
        let owners: std::collections::HashSet<_> =
            docs.values().map(|d| d.owner_id.clone()).collect();
        Ok(crate::meta::StoreStats {
            document_count: docs.len(),
            owner_count: owners.len(),
            chunk_count: docs.values().map(|d| d.chunk_count as usize).sum(),
        })
    }
}
