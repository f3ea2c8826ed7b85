//! Process-local embedding cache
//!
//! Caches chunk embeddings for one corpus snapshot at a time. The snapshot is
//! identified by a key derived from the owning corpus (document ids plus their
//! update timestamps); any change to the corpus invalidates the whole cache
//! rather than patching entries incrementally. Within a snapshot, embeddings
//! are memoized per distinct text.
//!
//! The cache is the only shared mutable in-process state. Concurrent
//! read-through population is resolved by last-writer-wins: embeddings are
//! pure functions of text, so racing writers store the same value.

use crate::embed::Embedder;
use crate::error::{Error, Result};
use crate::meta::Document;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// A cached chunk embedding
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub document_id: String,
    pub owner_id: String,
    pub chunk_index: usize,
    pub text: String,
    pub vector: Vec<f32>,
    pub inserted_at: String,
}

#[derive(Debug, Default)]
struct CacheInner {
    /// Identity of the corpus snapshot the entries belong to
    snapshot: Option<String>,
    /// Chunk entries in insertion order
    entries: Vec<CacheEntry>,
    /// Per-text memoized embeddings within the current snapshot
    memo: HashMap<String, Vec<f32>>,
}

/// Snapshot-keyed embedding cache
#[derive(Debug, Default)]
pub struct EmbeddingCache {
    inner: RwLock<CacheInner>,
}

/// Compute the snapshot identity of a document corpus
pub fn corpus_snapshot(documents: &[Document]) -> String {
    let mut hasher = blake3::Hasher::new();
    for doc in documents {
        hasher.update(doc.id.as_bytes());
        hasher.update(doc.updated_at.as_bytes());
    }
    hasher.finalize().to_hex().to_string()
}

impl EmbeddingCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, CacheInner> {
        // A poisoned lock holds deterministic values, safe to keep using
        self.inner.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, CacheInner> {
        self.inner.write().unwrap_or_else(|e| e.into_inner())
    }

    /// The snapshot key the cache currently holds, if any
    pub fn snapshot(&self) -> Option<String> {
        self.read().snapshot.clone()
    }

    /// Align the cache with a corpus snapshot key. Returns true if the key
    /// differed and the cache was cleared.
    pub fn sync_snapshot(&self, key: &str) -> bool {
        let mut inner = self.write();
        if inner.snapshot.as_deref() == Some(key) {
            return false;
        }
        inner.entries.clear();
        inner.memo.clear();
        inner.snapshot = Some(key.to_string());
        true
    }

    /// Drop everything; the next retrieval repopulates lazily
    pub fn invalidate(&self) {
        let mut inner = self.write();
        inner.snapshot = None;
        inner.entries.clear();
        inner.memo.clear();
    }

    /// Memoized embedding lookup for a distinct text
    pub fn lookup(&self, text: &str) -> Option<Vec<f32>> {
        self.read().memo.get(text).cloned()
    }

    /// Replace all cached chunks for a document (never partially updated)
    pub fn insert_document(&self, document_id: &str, owner_id: &str, chunks: Vec<(usize, String, Vec<f32>)>) {
        let now = Utc::now().to_rfc3339();
        let mut inner = self.write();
        inner.entries.retain(|e| e.document_id != document_id);
        for (chunk_index, text, vector) in chunks {
            inner.memo.insert(text.clone(), vector.clone());
            inner.entries.push(CacheEntry {
                document_id: document_id.to_string(),
                owner_id: owner_id.to_string(),
                chunk_index,
                text,
                vector,
                inserted_at: now.clone(),
            });
        }
    }

    /// Remove all cached chunks for a document
    pub fn remove_document(&self, document_id: &str) {
        self.write().entries.retain(|e| e.document_id != document_id);
    }

    /// Cached chunks visible to an owner, in insertion order
    pub fn entries_for_owner(&self, owner_id: &str) -> Vec<CacheEntry> {
        self.read()
            .entries
            .iter()
            .filter(|e| e.owner_id == owner_id)
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.read().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().entries.is_empty()
    }

    /// Read-through embedding: serve memoized vectors, compute only the
    /// misses, and memoize the results (last writer wins).
    pub async fn embed_cached(
        &self,
        embedder: &dyn Embedder,
        texts: &[String],
    ) -> Result<Vec<Vec<f32>>> {
        let mut vectors: Vec<Option<Vec<f32>>> = Vec::with_capacity(texts.len());
        let mut misses: Vec<(usize, String)> = Vec::new();

        {
            let inner = self.read();
            for (i, text) in texts.iter().enumerate() {
                match inner.memo.get(text) {
                    Some(vector) => vectors.push(Some(vector.clone())),
                    None => {
                        vectors.push(None);
                        misses.push((i, text.clone()));
                    }
                }
            }
        }

        if !misses.is_empty() {
            // Compute outside the lock; embeddings are deterministic per text
            let miss_texts: Vec<String> = misses.iter().map(|(_, t)| t.clone()).collect();
            let computed = embedder.embed(miss_texts).await?;

            // A short or long batch would attribute vectors to the wrong texts
            if computed.len() != misses.len() {
                return Err(Error::Embedding(format!(
                    "Embedder returned {} vectors for {} texts",
                    computed.len(),
                    misses.len()
                )));
            }

            let mut inner = self.write();
            for ((i, text), vector) in misses.into_iter().zip(computed.into_iter()) {
                inner.memo.insert(text, vector.clone());
                vectors[i] = Some(vector);
            }
        }

        vectors
            .into_iter()
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| Error::Embedding("Embedder left a text without a vector".to_string()))
    }
}
