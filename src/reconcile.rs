//! Cross-store consistency repair
//!
//! The metadata store and the vector index drift: chunk counts go stale when
//! the count write-back fails, and index deletes that failed during a document
//! delete leave orphaned vectors behind. Every repair here is idempotent, so
//! re-running a reconciliation with the same document never double-counts or
//! double-deletes, and index failures degrade the result instead of aborting
//! the run.

use crate::error::{Error, Result};
use crate::index::VectorIndex;
use crate::meta::MetadataStore;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// How a deletion reconciliation ended
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum DeletionOutcome {
    /// Both stores are clean
    Ok,
    /// The metadata row is gone but the index side could not be confirmed
    Partial { cause: String },
}

impl DeletionOutcome {
    pub fn is_ok(&self) -> bool {
        matches!(self, DeletionOutcome::Ok)
    }
}

/// Summary of one owner-wide sweep
#[derive(Debug, Clone, Default, Serialize)]
pub struct SweepReport {
    /// Documents examined in the metadata store
    pub examined: usize,
    /// Chunk counts that were stale and got corrected
    pub counts_corrected: usize,
    /// Orphaned index documents removed
    pub orphans_removed: usize,
    /// Repairs that failed and were left for a later run
    pub failures: usize,
}

/// Repairs drift between the metadata store and the vector index
pub struct ConsistencyReconciler {
    store: Arc<dyn MetadataStore>,
    index: Arc<dyn VectorIndex>,
}

impl ConsistencyReconciler {
    pub fn new(store: Arc<dyn MetadataStore>, index: Arc<dyn VectorIndex>) -> Self {
        Self { store, index }
    }

    /// Bring one document's recorded chunk count in line with the index.
    /// Returns the count now recorded.
    pub async fn reconcile_chunk_count(&self, document_id: &str) -> Result<i64> {
        let document = self
            .store
            .get_document(document_id)
            .await?
            .ok_or_else(|| Error::DocumentNotFound(document_id.to_string()))?;

        let actual = self.index.chunk_count(document_id).await? as i64;
        if actual != document.chunk_count {
            info!(
                document_id = %document_id,
                "Correcting chunk count {} -> {}",
                document.chunk_count,
                actual
            );
            self.store.set_chunk_count(document_id, actual).await?;
        }

        Ok(actual)
    }

    /// Finish a deletion that may have left index state behind. Safe to call
    /// for documents that are already fully gone; a surviving row must belong
    /// to the calling owner.
    pub async fn reconcile_deletion(
        &self,
        document_id: &str,
        owner_id: &str,
    ) -> Result<DeletionOutcome> {
        if let Some(document) = self.store.get_document(document_id).await? {
            if document.owner_id != owner_id {
                return Err(Error::Forbidden(format!(
                    "Document '{}' belongs to another owner",
                    document_id
                )));
            }
        }

        let outcome = match self.index.delete_document(document_id).await {
            Ok(()) => DeletionOutcome::Ok,
            Err(e) => {
                warn!(document_id = %document_id, "Index cleanup failed: {}", e);
                DeletionOutcome::Partial {
                    cause: e.to_string(),
                }
            }
        };

        // Row may already be absent; deleting again is a no-op
        let removed = self.store.delete_document(document_id).await?;
        if removed {
            debug!(document_id = %document_id, "Removed lingering metadata row");
        }

        Ok(outcome)
    }

    /// Sweep one owner's corpus: correct stale chunk counts and remove index
    /// documents whose metadata row no longer exists.
    pub async fn sweep(&self, owner_id: &str) -> Result<SweepReport> {
        let documents = self.store.list_documents(owner_id).await?;
        let mut report = SweepReport {
            examined: documents.len(),
            ..SweepReport::default()
        };

        for document in &documents {
            match self.index.chunk_count(&document.id).await {
                Ok(actual) => {
                    let actual = actual as i64;
                    if actual != document.chunk_count {
                        match self.store.set_chunk_count(&document.id, actual).await {
                            Ok(()) => report.counts_corrected += 1,
                            Err(e) => {
                                warn!(document_id = %document.id, "Count correction failed: {}", e);
                                report.failures += 1;
                            }
                        }
                    }
                }
                Err(e) => {
                    warn!(document_id = %document.id, "Could not read index chunk count: {}", e);
                    report.failures += 1;
                }
            }
        }

        match self.index.document_ids(owner_id).await {
            Ok(indexed_ids) => {
                for indexed_id in indexed_ids {
                    if documents.iter().any(|d| d.id == indexed_id) {
                        continue;
                    }
                    match self.index.delete_document(&indexed_id).await {
                        Ok(()) => {
                            info!(document_id = %indexed_id, "Removed orphaned index document");
                            report.orphans_removed += 1;
                        }
                        Err(e) => {
                            warn!(document_id = %indexed_id, "Orphan removal failed: {}", e);
                            report.failures += 1;
                        }
                    }
                }
            }
            Err(e) => {
                warn!(owner = %owner_id, "Could not enumerate index documents: {}", e);
                report.failures += 1;
            }
        }

        info!(
            owner = %owner_id,
            "Sweep finished: {} examined, {} counts corrected, {} orphans removed, {} failures",
            report.examined,
            report.counts_corrected,
            report.orphans_removed,
            report.failures
        );

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::IndexedChunk;
    use crate::meta::Document;
    use crate::testing::{FailingIndex, MemoryIndex, MemoryStore};

    fn make_doc(owner: &str) -> Document {
        Document::new(
            owner.to_string(),
            "notes.txt".to_string(),
            "text/plain".to_string(),
            11,
            "hello world".to_string(),
        )
    }

    fn chunk(index: usize) -> IndexedChunk {
        IndexedChunk {
            chunk_index: index,
            text: format!("chunk {}", index),
            vector: vec![1.0, 0.0],
        }
    }

    #[tokio::test]
    async fn test_chunk_count_drift_is_corrected() {
        let store = Arc::new(MemoryStore::default());
        let index = Arc::new(MemoryIndex::new());

        let doc = make_doc("alice");
        store.insert_document(&doc).await.unwrap();
        index
            .upsert_document(&doc.id, "alice", &[chunk(0), chunk(1), chunk(2)])
            .await
            .unwrap();

        let reconciler = ConsistencyReconciler::new(store.clone(), index);

        let count = reconciler.reconcile_chunk_count(&doc.id).await.unwrap();
        assert_eq!(count, 3);
        assert_eq!(store.get_document(&doc.id).await.unwrap().unwrap().chunk_count, 3);

        // Idempotent: a second run changes nothing
        let count = reconciler.reconcile_chunk_count(&doc.id).await.unwrap();
        assert_eq!(count, 3);
    }

    #[tokio::test]
    async fn test_chunk_count_unknown_document() {
        let reconciler =
            ConsistencyReconciler::new(Arc::new(MemoryStore::default()), Arc::new(MemoryIndex::new()));
        let err = reconciler.reconcile_chunk_count("missing").await.unwrap_err();
        assert!(matches!(err, Error::DocumentNotFound(_)));
    }

    #[tokio::test]
    async fn test_reconcile_deletion_is_idempotent() {
        let store = Arc::new(MemoryStore::default());
        let index = Arc::new(MemoryIndex::new());

        let doc = make_doc("alice");
        store.insert_document(&doc).await.unwrap();
        index.upsert_document(&doc.id, "alice", &[chunk(0)]).await.unwrap();

        let reconciler = ConsistencyReconciler::new(store.clone(), index.clone());

        assert!(reconciler
            .reconcile_deletion(&doc.id, "alice")
            .await
            .unwrap()
            .is_ok());
        assert!(store.get_document(&doc.id).await.unwrap().is_none());
        assert_eq!(index.chunk_count(&doc.id).await.unwrap(), 0);

        // Already gone on both sides: still ok, never an error
        assert!(reconciler
            .reconcile_deletion(&doc.id, "alice")
            .await
            .unwrap()
            .is_ok());
    }

    #[tokio::test]
    async fn test_reconcile_deletion_enforces_ownership() {
        let store = Arc::new(MemoryStore::default());
        let index = Arc::new(MemoryIndex::new());

        let doc = make_doc("alice");
        store.insert_document(&doc).await.unwrap();
        index.upsert_document(&doc.id, "alice", &[chunk(0)]).await.unwrap();

        let reconciler = ConsistencyReconciler::new(store.clone(), index.clone());

        let err = reconciler
            .reconcile_deletion(&doc.id, "bob")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Forbidden(_)));

        // Nothing was touched on either side
        assert!(store.get_document(&doc.id).await.unwrap().is_some());
        assert_eq!(index.chunk_count(&doc.id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_reconcile_deletion_partial_on_index_failure() {
        let store = Arc::new(MemoryStore::default());
        let doc = make_doc("alice");
        store.insert_document(&doc).await.unwrap();

        let reconciler = ConsistencyReconciler::new(store.clone(), Arc::new(FailingIndex));

        let outcome = reconciler.reconcile_deletion(&doc.id, "alice").await.unwrap();
        assert!(!outcome.is_ok());
        // The metadata row is removed regardless
        assert!(store.get_document(&doc.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_sweep_fixes_drift_and_removes_orphans() {
        let store = Arc::new(MemoryStore::default());
        let index = Arc::new(MemoryIndex::new());

        // A document with a stale chunk count
        let doc = make_doc("alice");
        store.insert_document(&doc).await.unwrap();
        index
            .upsert_document(&doc.id, "alice", &[chunk(0), chunk(1)])
            .await
            .unwrap();

        // An orphan: indexed but no metadata row
        index
            .upsert_document("ghost-doc", "alice", &[chunk(0)])
            .await
            .unwrap();

        let reconciler = ConsistencyReconciler::new(store.clone(), index.clone());
        let report = reconciler.sweep("alice").await.unwrap();

        assert_eq!(report.examined, 1);
        assert_eq!(report.counts_corrected, 1);
        assert_eq!(report.orphans_removed, 1);
        assert_eq!(report.failures, 0);

        assert_eq!(store.get_document(&doc.id).await.unwrap().unwrap().chunk_count, 2);
        assert_eq!(index.chunk_count("ghost-doc").await.unwrap(), 0);

        // Re-running the sweep finds nothing left to repair
        let report = reconciler.sweep("alice").await.unwrap();
        assert_eq!(report.counts_corrected, 0);
        assert_eq!(report.orphans_removed, 0);
    }

    #[tokio::test]
    async fn test_sweep_absorbs_index_failures() {
        let store = Arc::new(MemoryStore::default());
        let doc = make_doc("alice");
        store.insert_document(&doc).await.unwrap();

        let reconciler = ConsistencyReconciler::new(store, Arc::new(FailingIndex));
        let report = reconciler.sweep("alice").await.unwrap();

        // Per-document count read plus the owner enumeration both failed
        assert_eq!(report.examined, 1);
        assert_eq!(report.failures, 2);
    }
}
