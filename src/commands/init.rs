//! Init command implementation

use crate::config::Config;
use crate::error::{Error, Result};
use crate::index::{QdrantIndex, VectorIndex};
use crate::meta::MetaDb;
use std::path::PathBuf;
use tracing::{info, warn};

/// Initialize archivist configuration and database
pub async fn cmd_init(base_dir: Option<PathBuf>, force: bool) -> Result<()> {
    let mut config = Config::default();
    config.init_paths(base_dir);

    if config.paths.config_file.exists() && !force {
        return Err(Error::Config(format!(
            "Config already exists at {}. Use --force to overwrite.",
            config.paths.config_file.display()
        )));
    }

    config.validate()?;
    config.save()?;

    let _db = MetaDb::new(&config.paths.db_file).await?;
    info!("Created database at {:?}", config.paths.db_file);

    // The vector index is best-effort even here: a missing Qdrant only means
    // degraded ingestion until it comes up.
    match QdrantIndex::connect(&config) {
        Ok(index) => match index.ensure_ready().await {
            Ok(()) => info!("Collection '{}' ready", config.collection_name),
            Err(e) => warn!(
                "Could not create collection '{}': {}. You can create it later with 'archivist db init'.",
                config.collection_name, e
            ),
        },
        Err(e) => warn!(
            "Could not connect to Qdrant at {}: {}. Make sure Qdrant is running.",
            config.index_url, e
        ),
    }

    println!("✓ Initialized archivist at {:?}", config.paths.base_dir);
    println!("\nConfiguration: {:?}", config.paths.config_file);
    println!("Database: {:?}", config.paths.db_file);
    println!("\nNext steps:");
    println!("  archivist ingest ./notes.txt           # Upload a document");
    println!("  archivist query \"what did I write\"     # Search your documents");
    println!("  archivist documents                    # List uploaded documents");

    Ok(())
}
