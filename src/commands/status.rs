//! Status command implementation

use crate::config::Config;
use crate::embed::Embedder;
use crate::error::Result;
use crate::index::{QdrantIndex, VectorIndex};
use crate::meta::{MetaDb, MetadataStore, StoreStats};
use serde::Serialize;
use tracing::info;

/// Status information
#[derive(Debug, Clone, Serialize)]
pub struct StatusInfo {
    pub config_path: String,
    pub db_path: String,
    pub index_url: String,
    pub collection_name: String,
    pub embedding_model: String,
    pub embedding_source: String,
    pub index_reachable: bool,
    pub index_points: u64,
    pub db_stats: StoreStats,
}

/// Get system status
pub async fn cmd_status(
    config: &Config,
    db: &MetaDb,
    index: &QdrantIndex,
    embedder: &dyn Embedder,
) -> Result<StatusInfo> {
    info!("Getting status");

    let db_stats = db.stats().await?;
    let health = index.health().await;

    Ok(StatusInfo {
        config_path: config.paths.config_file.display().to_string(),
        db_path: config.paths.db_file.display().to_string(),
        index_url: config.index_url.clone(),
        collection_name: config.collection_name.clone(),
        embedding_model: embedder.model_name().to_string(),
        embedding_source: embedder.source().to_string(),
        index_reachable: health.reachable,
        index_points: health.points_count,
        db_stats,
    })
}

/// Print status to console
pub fn print_status(status: &StatusInfo) {
    println!("\n📊 archivist Status\n");
    println!("Configuration: {}", status.config_path);
    println!("Database: {}", status.db_path);
    println!("\nVector index:");
    println!("  URL: {}", status.index_url);
    println!("  Collection: {}", status.collection_name);

    let connection_status = if status.index_reachable {
        "✓ Reachable"
    } else {
        "✗ Unreachable (retrieval falls back to the local cache)"
    };
    println!("  Status: {}", connection_status);
    println!("  Points: {}", status.index_points);

    println!(
        "\nEmbedding: {} ({})",
        status.embedding_model, status.embedding_source
    );
    println!("\nDatabase Stats:");
    println!("  Documents: {}", status.db_stats.document_count);
    println!("  Owners: {}", status.db_stats.owner_count);
    println!("  Chunks: {}", status.db_stats.chunk_count);
}
