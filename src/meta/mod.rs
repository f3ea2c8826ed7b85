//! Metadata storage using SQLite
//!
//! The metadata store is the authoritative record of uploaded documents:
//! identity, ownership, extracted text, lifecycle status, and the last chunk
//! count reported by the vector index. It is consumed through the
//! [`MetadataStore`] trait so the ingestion pipeline can be exercised against
//! stores that fail on demand.

mod schema;

pub use schema::*;

use crate::error::{Error, Result};
use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::FromRow;
use std::str::FromStr;
use tracing::{debug, info};
use uuid::Uuid;

/// Document lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentStatus {
    Pending,
    Indexing,
    Indexed,
    Failed,
}

impl std::fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DocumentStatus::Pending => write!(f, "pending"),
            DocumentStatus::Indexing => write!(f, "indexing"),
            DocumentStatus::Indexed => write!(f, "indexed"),
            DocumentStatus::Failed => write!(f, "failed"),
        }
    }
}

impl FromStr for DocumentStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(DocumentStatus::Pending),
            "indexing" => Ok(DocumentStatus::Indexing),
            "indexed" => Ok(DocumentStatus::Indexed),
            "failed" => Ok(DocumentStatus::Failed),
            _ => Err(Error::Config(format!("Unknown document status: {}", s))),
        }
    }
}

/// An uploaded document
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub owner_id: String,
    /// Stored filename (unique per document)
    pub filename: String,
    /// Filename as supplied by the uploader
    pub original_name: String,
    /// Declared MIME type
    pub file_type: String,
    pub file_size: i64,
    /// Extracted plain text
    pub content: String,
    pub status: String,
    /// Last chunk count successfully reported by the vector index, 0 if
    /// indexing has never succeeded. Informational only: retrieval never
    /// depends on it.
    pub chunk_count: i64,
    pub created_at: String,
    pub updated_at: String,
}

impl Document {
    pub fn new(
        owner_id: String,
        original_name: String,
        file_type: String,
        file_size: i64,
        content: String,
    ) -> Self {
        let now = Utc::now().to_rfc3339();
        let id = Uuid::new_v4().to_string();
        // Stored filename keeps the original extension but is namespaced by id
        let filename = match original_name.rsplit_once('.') {
            Some((_, ext)) => format!("{}.{}", id, ext),
            None => id.clone(),
        };
        Self {
            id,
            owner_id,
            filename,
            original_name,
            file_type,
            file_size,
            content,
            status: DocumentStatus::Indexed.to_string(),
            chunk_count: 0,
            created_at: now.clone(),
            updated_at: now,
        }
    }

    pub fn get_status(&self) -> Result<DocumentStatus> {
        self.status.parse()
    }
}

/// Global statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreStats {
    pub document_count: usize,
    pub owner_count: usize,
    pub chunk_count: usize,
}

/// Document record operations consumed by the ingestion pipeline
#[async_trait]
pub trait MetadataStore: Send + Sync {
    /// Insert a new document row
    async fn insert_document(&self, doc: &Document) -> Result<()>;

    /// Get document by ID
    async fn get_document(&self, id: &str) -> Result<Option<Document>>;

    /// List all documents belonging to an owner, oldest first
    async fn list_documents(&self, owner_id: &str) -> Result<Vec<Document>>;

    /// Update the recorded chunk count for a document
    async fn set_chunk_count(&self, id: &str, chunk_count: i64) -> Result<()>;

    /// Delete a document row; returns false if no row existed
    async fn delete_document(&self, id: &str) -> Result<bool>;

    /// Get global statistics
    async fn stats(&self) -> Result<StoreStats>;
}

/// Metadata database handle
#[derive(Clone)]
pub struct MetaDb {
    pool: SqlitePool,
}

impl MetaDb {
    /// Open (and auto-initialize) the metadata database at the given path
    pub async fn new(db_path: &std::path::Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal);

        debug!("Connecting to SQLite database at {:?}", db_path);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        let db = Self { pool };

        if !db.is_initialized().await? {
            db.init_schema().await?;
        }

        Ok(db)
    }

    /// Initialize the database schema
    pub async fn init_schema(&self) -> Result<()> {
        info!("Initializing database schema");
        sqlx::query(SCHEMA_SQL).execute(&self.pool).await?;
        Ok(())
    }

    /// Check if database is initialized
    pub async fn is_initialized(&self) -> Result<bool> {
        let result: Option<(i32,)> =
            sqlx::query_as("SELECT 1 FROM sqlite_master WHERE type='table' AND name='documents'")
                .fetch_optional(&self.pool)
                .await?;
        Ok(result.is_some())
    }
}

#[async_trait]
impl MetadataStore for MetaDb {
    async fn insert_document(&self, doc: &Document) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO documents (id, owner_id, filename, original_name, file_type, file_size, content, status, chunk_count, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&doc.id)
        .bind(&doc.owner_id)
        .bind(&doc.filename)
        .bind(&doc.original_name)
        .bind(&doc.file_type)
        .bind(doc.file_size)
        .bind(&doc.content)
        .bind(&doc.status)
        .bind(doc.chunk_count)
        .bind(&doc.created_at)
        .bind(&doc.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_document(&self, id: &str) -> Result<Option<Document>> {
        let doc = sqlx::query_as::<_, Document>("SELECT * FROM documents WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(doc)
    }

    async fn list_documents(&self, owner_id: &str) -> Result<Vec<Document>> {
        let docs = sqlx::query_as::<_, Document>(
            "SELECT * FROM documents WHERE owner_id = ? ORDER BY created_at, id",
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(docs)
    }

    async fn set_chunk_count(&self, id: &str, chunk_count: i64) -> Result<()> {
        sqlx::query("UPDATE documents SET chunk_count = ?, updated_at = ? WHERE id = ?")
            .bind(chunk_count)
            .bind(Utc::now().to_rfc3339())
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn delete_document(&self, id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM documents WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn stats(&self) -> Result<StoreStats> {
        let doc_count: i32 = sqlx::query_scalar("SELECT COUNT(*) FROM documents")
            .fetch_one(&self.pool)
            .await?;

        let owner_count: i32 = sqlx::query_scalar("SELECT COUNT(DISTINCT owner_id) FROM documents")
            .fetch_one(&self.pool)
            .await?;

        let chunk_count: i64 = sqlx::query_scalar("SELECT COALESCE(SUM(chunk_count), 0) FROM documents")
            .fetch_one(&self.pool)
            .await?;

        Ok(StoreStats {
            document_count: doc_count as usize,
            owner_count: owner_count as usize,
            chunk_count: chunk_count as usize,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn setup_test_db() -> (MetaDb, TempDir) {
        let tmp = TempDir::new().unwrap();
        let db = MetaDb::new(&tmp.path().join("test.db")).await.unwrap();
        (db, tmp)
    }

    fn make_doc(owner: &str, name: &str) -> Document {
        Document::new(
            owner.to_string(),
            name.to_string(),
            "text/plain".to_string(),
            11,
            "hello world".to_string(),
        )
    }

    #[tokio::test]
    async fn test_document_crud() {
        let (db, _tmp) = setup_test_db().await;

        let doc = make_doc("alice", "notes.txt");
        db.insert_document(&doc).await.unwrap();

        let loaded = db.get_document(&doc.id).await.unwrap().unwrap();
        assert_eq!(loaded.original_name, "notes.txt");
        assert_eq!(loaded.get_status().unwrap(), DocumentStatus::Indexed);
        assert_eq!(loaded.chunk_count, 0);
        assert!(loaded.filename.ends_with(".txt"));

        let docs = db.list_documents("alice").await.unwrap();
        assert_eq!(docs.len(), 1);
        assert!(db.list_documents("bob").await.unwrap().is_empty());

        assert!(db.delete_document(&doc.id).await.unwrap());
        assert!(!db.delete_document(&doc.id).await.unwrap());
        assert!(db.get_document(&doc.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_chunk_count_update() {
        let (db, _tmp) = setup_test_db().await;

        let doc = make_doc("alice", "notes.txt");
        db.insert_document(&doc).await.unwrap();

        db.set_chunk_count(&doc.id, 7).await.unwrap();
        let loaded = db.get_document(&doc.id).await.unwrap().unwrap();
        assert_eq!(loaded.chunk_count, 7);
        assert!(loaded.updated_at >= doc.updated_at);
    }

    #[test]
    fn test_status_roundtrip() {
        for status in [
            DocumentStatus::Pending,
            DocumentStatus::Indexing,
            DocumentStatus::Indexed,
            DocumentStatus::Failed,
        ] {
            let parsed: DocumentStatus = status.to_string().parse().unwrap();
            assert_eq!(parsed, status);
        }
        assert!("garbage".parse::<DocumentStatus>().is_err());
    }

    #[tokio::test]
    async fn test_stats() {
        let (db, _tmp) = setup_test_db().await;

        db.insert_document(&make_doc("alice", "a.txt")).await.unwrap();
        db.insert_document(&make_doc("alice", "b.txt")).await.unwrap();
        db.insert_document(&make_doc("bob", "c.txt")).await.unwrap();

        let stats = db.stats().await.unwrap();
        assert_eq!(stats.document_count, 3);
        assert_eq!(stats.owner_count, 2);
        assert_eq!(stats.chunk_count, 0);
    }
}
