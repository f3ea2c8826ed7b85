//! Ingestion pipeline
//!
//! Orchestrates upload validation, text extraction, metadata persistence, and
//! best-effort vector indexing. The metadata store is authoritative: once the
//! document row is written, no later failure rolls it back. Indexing failures
//! are reported as a tagged outcome on an otherwise-successful ingest, and
//! metadata deletion is never blocked by a degraded vector store.

use crate::cache::EmbeddingCache;
use crate::chunk::chunk_text;
use crate::config::Config;
use crate::embed::{embed_in_batches, Embedder, EmbeddingSource};
use crate::error::{Error, Result};
use crate::extract::DocumentProcessor;
use crate::index::{IndexHealth, IndexedChunk, VectorIndex};
use crate::meta::{Document, MetadataStore};
use crate::validate::check_upload;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// An upload as received from the caller
#[derive(Debug, Clone)]
pub struct Upload {
    pub filename: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

/// How the vector-index leg of an ingest ended
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum IndexingOutcome {
    /// All chunks were written to the index
    Succeeded { chunk_count: usize },
    /// The document persisted but its chunks did not reach the index
    Degraded { cause: String },
}

impl IndexingOutcome {
    pub fn succeeded(&self) -> bool {
        matches!(self, IndexingOutcome::Succeeded { .. })
    }
}

/// Result of a completed ingest
#[derive(Debug, Clone, Serialize)]
pub struct IngestOutcome {
    pub document: Document,
    pub indexing: IndexingOutcome,
    pub embedding_source: EmbeddingSource,
}

/// Result of a completed delete
#[derive(Debug, Clone, Serialize)]
pub struct DeleteOutcome {
    pub document_id: String,
    /// False when the index delete failed and orphaned vectors may remain
    pub index_cleaned: bool,
}

/// An owner's documents plus current index health
#[derive(Debug, Clone, Serialize)]
pub struct DocumentListing {
    pub documents: Vec<Document>,
    pub index_health: IndexHealth,
}

/// Coordinates the ingest pipeline across its collaborators
pub struct IngestionCoordinator {
    store: Arc<dyn MetadataStore>,
    index: Arc<dyn VectorIndex>,
    embedder: Arc<dyn Embedder>,
    processor: Arc<dyn DocumentProcessor>,
    cache: Arc<EmbeddingCache>,
    config: Config,
}

impl IngestionCoordinator {
    pub fn new(
        store: Arc<dyn MetadataStore>,
        index: Arc<dyn VectorIndex>,
        embedder: Arc<dyn Embedder>,
        processor: Arc<dyn DocumentProcessor>,
        cache: Arc<EmbeddingCache>,
        config: Config,
    ) -> Self {
        Self {
            store,
            index,
            embedder,
            processor,
            cache,
            config,
        }
    }

    /// Ingest an upload for an owner.
    ///
    /// Validation, extraction, and persistence failures are terminal and leave
    /// no document behind. Once the row is persisted, indexing is best-effort:
    /// its failure is reported in [`IngestOutcome::indexing`], never as an
    /// error.
    pub async fn ingest(&self, owner_id: &str, upload: Upload) -> Result<IngestOutcome> {
        if owner_id.trim().is_empty() {
            return Err(Error::Unauthorized);
        }

        check_upload(
            &upload.filename,
            &upload.mime_type,
            upload.bytes.len(),
            self.config.max_upload_bytes,
        )?;

        let text = self
            .processor
            .extract(&upload.filename, &upload.mime_type, &upload.bytes)
            .await?;

        let mut document = Document::new(
            owner_id.to_string(),
            upload.filename,
            upload.mime_type,
            upload.bytes.len() as i64,
            text,
        );
        self.store.insert_document(&document).await?;

        info!(
            document_id = %document.id,
            owner = %owner_id,
            "Persisted document '{}'",
            document.original_name
        );

        let indexing = self.index_document(&document).await;
        match &indexing {
            IndexingOutcome::Succeeded { chunk_count } => {
                document.chunk_count = *chunk_count as i64;
                // Stale chunk counts are tolerated; reconciliation corrects them
                if let Err(e) = self
                    .store
                    .set_chunk_count(&document.id, *chunk_count as i64)
                    .await
                {
                    warn!(document_id = %document.id, "Failed to record chunk count: {}", e);
                }
            }
            IndexingOutcome::Degraded { cause } => {
                warn!(
                    document_id = %document.id,
                    "Document persisted but indexing failed: {}",
                    cause
                );
            }
        }

        self.cache.invalidate();

        Ok(IngestOutcome {
            document,
            indexing,
            embedding_source: self.embedder.source(),
        })
    }

    /// Chunk, embed, and index one document's text
    async fn index_document(&self, document: &Document) -> IndexingOutcome {
        let chunks = chunk_text(&document.content, &self.config.chunk);
        if chunks.is_empty() {
            return IndexingOutcome::Succeeded { chunk_count: 0 };
        }

        debug!(
            document_id = %document.id,
            "Embedding {} chunks with model '{}'",
            chunks.len(),
            self.embedder.model_name()
        );

        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let vectors = match embed_in_batches(
            self.embedder.as_ref(),
            texts,
            self.config.embedding.batch_size,
        )
        .await
        {
            Ok(vectors) => vectors,
            Err(e) => return IndexingOutcome::Degraded { cause: e.to_string() },
        };

        // Zipping a short batch would index a partial document
        if vectors.len() != chunks.len() {
            return IndexingOutcome::Degraded {
                cause: format!(
                    "Embedder returned {} vectors for {} chunks",
                    vectors.len(),
                    chunks.len()
                ),
            };
        }

        let indexed: Vec<IndexedChunk> = chunks
            .into_iter()
            .zip(vectors)
            .map(|(chunk, vector)| IndexedChunk {
                chunk_index: chunk.index,
                text: chunk.text,
                vector,
            })
            .collect();

        match self
            .index
            .upsert_document(&document.id, &document.owner_id, &indexed)
            .await
        {
            Ok(written) => IndexingOutcome::Succeeded { chunk_count: written },
            Err(e) => IndexingOutcome::Degraded { cause: e.to_string() },
        }
    }

    /// Delete a document after an ownership check.
    ///
    /// The index delete is attempted first and its failure logged, then the
    /// metadata row is removed unconditionally. Orphaned vectors are
    /// unreachable without the row and are swept up by reconciliation.
    pub async fn delete(&self, document_id: &str, owner_id: &str) -> Result<DeleteOutcome> {
        let document = self
            .store
            .get_document(document_id)
            .await?
            .ok_or_else(|| Error::DocumentNotFound(document_id.to_string()))?;

        if document.owner_id != owner_id {
            return Err(Error::Forbidden(format!(
                "Document '{}' belongs to another owner",
                document_id
            )));
        }

        let index_cleaned = match self.index.delete_document(document_id).await {
            Ok(()) => true,
            Err(e) => {
                warn!(document_id = %document_id, "Index delete failed, continuing: {}", e);
                false
            }
        };

        self.store.delete_document(document_id).await?;
        self.cache.invalidate();

        info!(document_id = %document_id, owner = %owner_id, "Deleted document");

        Ok(DeleteOutcome {
            document_id: document_id.to_string(),
            index_cleaned,
        })
    }

    /// All documents owned by the caller plus a point-in-time index health probe
    pub async fn list(&self, owner_id: &str) -> Result<DocumentListing> {
        if owner_id.trim().is_empty() {
            return Err(Error::Unauthorized);
        }

        let documents = self.store.list_documents(owner_id).await?;
        let index_health = self.index.health().await;

        Ok(DocumentListing {
            documents,
            index_health,
        })
    }
}
