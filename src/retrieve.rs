//! Query-time retrieval
//!
//! Embeds the query, collects candidate chunks scoped to the caller's owner,
//! and ranks them by cosine similarity with a score threshold and top-k
//! cutoff. The vector index is the primary candidate source; when it is
//! unreachable the engine falls back to a full scan of the embedding cache,
//! lazily repopulated from the authoritative metadata store. Query embedding
//! failure is terminal for that query. There is no silent lexical fallback.

use crate::cache::{corpus_snapshot, EmbeddingCache};
use crate::chunk::chunk_text;
use crate::config::Config;
use crate::embed::{cosine_similarity, Embedder, EmbeddingSource};
use crate::error::{Error, Result};
use crate::index::VectorIndex;
use crate::meta::MetadataStore;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, warn};

/// Per-query overrides for ranking parameters
#[derive(Debug, Clone, Default)]
pub struct QueryOptions {
    /// Maximum results to return; clamped to the configured ceiling
    pub top_k: Option<usize>,
    /// Minimum cosine score a result must reach
    pub min_score: Option<f32>,
}

/// One ranked chunk, attributed to its source document
#[derive(Debug, Clone, Serialize)]
pub struct RetrievalResult {
    pub document_id: String,
    pub owner_id: String,
    pub chunk_index: usize,
    pub content: String,
    pub score: f32,
}

/// Which candidate source served a query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RetrievalPath {
    Index,
    Cache,
}

/// A full query response
#[derive(Debug, Clone, Serialize)]
pub struct RetrievalResponse {
    pub results: Vec<RetrievalResult>,
    pub embedding_source: EmbeddingSource,
    pub served_from: RetrievalPath,
}

/// Stateless per-query ranking over the index or cache
pub struct RetrievalEngine {
    store: Arc<dyn MetadataStore>,
    index: Arc<dyn VectorIndex>,
    embedder: Arc<dyn Embedder>,
    cache: Arc<EmbeddingCache>,
    config: Config,
}

impl RetrievalEngine {
    pub fn new(
        store: Arc<dyn MetadataStore>,
        index: Arc<dyn VectorIndex>,
        embedder: Arc<dyn Embedder>,
        cache: Arc<EmbeddingCache>,
        config: Config,
    ) -> Self {
        Self {
            store,
            index,
            embedder,
            cache,
            config,
        }
    }

    /// Run one query for an owner
    pub async fn retrieve(
        &self,
        query: &str,
        owner_id: &str,
        options: &QueryOptions,
    ) -> Result<RetrievalResponse> {
        if owner_id.trim().is_empty() {
            return Err(Error::Unauthorized);
        }

        let top_k = options
            .top_k
            .unwrap_or(self.config.query.default_k)
            .clamp(1, self.config.query.max_results);
        let min_score = options.min_score.unwrap_or(self.config.query.min_score);

        if query.trim().is_empty() {
            return Ok(RetrievalResponse {
                results: Vec::new(),
                embedding_source: self.embedder.source(),
                served_from: RetrievalPath::Index,
            });
        }

        // Query embedding failure is terminal for this query
        let query_vector = self
            .embedder
            .embed(vec![query.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| Error::Embedding("Embedder returned no vector for query".to_string()))?;

        let (mut candidates, served_from) = match self
            .index
            .search(query_vector.clone(), owner_id, self.config.query.max_results)
            .await
        {
            Ok(scored) => {
                let results = scored
                    .into_iter()
                    .map(|chunk| RetrievalResult {
                        document_id: chunk.document_id,
                        owner_id: chunk.owner_id,
                        chunk_index: chunk.chunk_index,
                        content: chunk.text,
                        score: chunk.score,
                    })
                    .collect();
                (results, RetrievalPath::Index)
            }
            Err(e) => {
                warn!("Index search failed, falling back to cache scan: {}", e);
                let results = self.cache_candidates(owner_id, &query_vector).await?;
                (results, RetrievalPath::Cache)
            }
        };

        // Stable sort keeps insertion order for equal scores, so repeated
        // queries over a fixed corpus return identical sequences
        candidates.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        candidates.retain(|c| c.score >= min_score);
        candidates.truncate(top_k);

        debug!(
            owner = %owner_id,
            "Query returned {} results via {:?}",
            candidates.len(),
            served_from
        );

        Ok(RetrievalResponse {
            results: candidates,
            embedding_source: self.embedder.source(),
            served_from,
        })
    }

    /// Score every cached chunk visible to the owner, repopulating the cache
    /// from the metadata store when its snapshot is stale.
    async fn cache_candidates(
        &self,
        owner_id: &str,
        query_vector: &[f32],
    ) -> Result<Vec<RetrievalResult>> {
        let documents = self.store.list_documents(owner_id).await?;
        if documents.is_empty() {
            return Ok(Vec::new());
        }

        let snapshot = corpus_snapshot(&documents);
        let cleared = self.cache.sync_snapshot(&snapshot);
        if cleared || self.cache.entries_for_owner(owner_id).is_empty() {
            debug!(owner = %owner_id, "Populating embedding cache for {} documents", documents.len());
            for doc in &documents {
                let chunks = chunk_text(&doc.content, &self.config.chunk);
                let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
                let vectors = self.cache.embed_cached(self.embedder.as_ref(), &texts).await?;
                let entries = chunks
                    .into_iter()
                    .zip(vectors)
                    .map(|(chunk, vector)| (chunk.index, chunk.text, vector))
                    .collect();
                self.cache.insert_document(&doc.id, &doc.owner_id, entries);
            }
        }

        Ok(self
            .cache
            .entries_for_owner(owner_id)
            .into_iter()
            .map(|entry| {
                let score = cosine_similarity(query_vector, &entry.vector);
                RetrievalResult {
                    document_id: entry.document_id,
                    owner_id: entry.owner_id,
                    chunk_index: entry.chunk_index,
                    content: entry.text,
                    score,
                }
            })
            .collect())
    }
}
