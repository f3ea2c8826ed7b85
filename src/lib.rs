//! archivist: document ingestion and semantic retrieval
//!
//! Uploads are validated, their text extracted and persisted to SQLite (the
//! authoritative store), then chunked, embedded, and written to a Qdrant
//! collection on a best-effort basis. Queries embed the question and rank
//! chunks by cosine similarity, falling back to a local embedding cache when
//! the index is unreachable. A reconciler repairs the drift the two stores
//! accumulate.

pub mod cache;
pub mod chunk;
pub mod commands;
pub mod config;
pub mod embed;
pub mod error;
pub mod extract;
pub mod index;
pub mod ingest;
pub mod meta;
pub mod reconcile;
pub mod retrieve;
pub mod validate;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{Error, Result};
