//! archivist CLI entry point

use archivist::{
    cache::EmbeddingCache,
    commands::{
        cmd_init, cmd_status, print_delete_outcome, print_documents, print_ingest_outcome,
        print_query_results, print_status, print_sweep_report,
    },
    config::Config,
    embed::{create_embedder, Embedder},
    error::{Error, Result},
    extract::TextProcessor,
    index::{QdrantIndex, VectorIndex},
    ingest::{IngestionCoordinator, Upload},
    meta::MetaDb,
    reconcile::ConsistencyReconciler,
    retrieve::{QueryOptions, RetrievalEngine},
};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "archivist")]
#[command(version, about = "Document ingestion and semantic retrieval over SQLite + Qdrant", long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Owner identity for all document operations
    #[arg(short, long, global = true, default_value = "default")]
    owner: String,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize archivist configuration and database
    Init {
        /// Base directory (defaults to ~/.archivist)
        #[arg(long)]
        base_dir: Option<PathBuf>,

        /// Force overwrite existing config
        #[arg(long)]
        force: bool,
    },

    /// Upload and index a document
    Ingest {
        /// Path to the file to ingest
        file: PathBuf,

        /// Declared MIME type (guessed from the extension when omitted)
        #[arg(long)]
        mime: Option<String>,
    },

    /// Search your documents
    Query {
        /// The search query
        query: String,

        /// Maximum number of results
        #[arg(short, long)]
        limit: Option<usize>,

        /// Minimum similarity score (-1 to 1)
        #[arg(short, long)]
        min_score: Option<f32>,
    },

    /// List uploaded documents
    Documents,

    /// Delete a document and its index entries
    Remove {
        /// Document ID to remove (use 'archivist documents' to list)
        document_id: String,
    },

    /// Repair drift between the metadata store and the vector index
    Reconcile {
        /// Only reconcile one document's chunk count
        #[arg(long)]
        document: Option<String>,
    },

    /// Show system status
    Status,

    /// Manage the Qdrant collection
    Db {
        #[command(subcommand)]
        action: DbAction,
    },
}

/// Collection management actions
#[derive(Subcommand)]
enum DbAction {
    /// Create the collection if it does not exist
    Init,

    /// Show collection status
    Status,

    /// Reset the collection (delete all vectors and recreate)
    Reset {
        /// Skip confirmation
        #[arg(long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("{}", e);
        std::process::exit(if e.is_client_error() { 2 } else { 1 });
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    // Init doesn't need an existing config
    if let Commands::Init { base_dir, force } = &cli.command {
        return cmd_init(base_dir.clone(), *force).await;
    }

    let config = load_config(cli.config.as_deref())?;

    let db = Arc::new(MetaDb::new(&config.paths.db_file).await?);
    let index = Arc::new(QdrantIndex::connect(&config)?);
    let embedder: Arc<dyn Embedder> = Arc::from(create_embedder(&config.embedding)?);
    let cache = Arc::new(EmbeddingCache::new());

    match cli.command {
        Commands::Init { .. } => unreachable!(),

        Commands::Ingest { file, mime } => {
            let bytes = tokio::fs::read(&file).await?;
            let filename = file
                .file_name()
                .and_then(|n| n.to_str())
                .ok_or_else(|| Error::Config(format!("Invalid file name: {}", file.display())))?
                .to_string();
            let mime_type = match mime {
                Some(mime) => mime,
                None => mime_guess::from_path(&file)
                    .first_raw()
                    .unwrap_or("application/octet-stream")
                    .to_string(),
            };

            if let Err(e) = index.ensure_ready().await {
                warn!("Vector index not ready, ingest will be degraded: {}", e);
            }

            let coordinator = IngestionCoordinator::new(
                db.clone(),
                index.clone(),
                embedder.clone(),
                Arc::new(TextProcessor),
                cache.clone(),
                config.clone(),
            );
            let outcome = coordinator
                .ingest(
                    &cli.owner,
                    Upload {
                        filename,
                        mime_type,
                        bytes,
                    },
                )
                .await?;

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&outcome)?);
            } else {
                print_ingest_outcome(&outcome);
            }
        }

        Commands::Query {
            query,
            limit,
            min_score,
        } => {
            let engine = RetrievalEngine::new(
                db.clone(),
                index.clone(),
                embedder.clone(),
                cache.clone(),
                config.clone(),
            );
            let options = QueryOptions {
                top_k: limit,
                min_score,
            };
            let response = engine.retrieve(&query, &cli.owner, &options).await?;

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&response)?);
            } else {
                print_query_results(&response);
            }
        }

        Commands::Documents => {
            let coordinator = IngestionCoordinator::new(
                db.clone(),
                index.clone(),
                embedder.clone(),
                Arc::new(TextProcessor),
                cache.clone(),
                config.clone(),
            );
            let listing = coordinator.list(&cli.owner).await?;

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&listing)?);
            } else {
                print_documents(&listing);
            }
        }

        Commands::Remove { document_id } => {
            let coordinator = IngestionCoordinator::new(
                db.clone(),
                index.clone(),
                embedder.clone(),
                Arc::new(TextProcessor),
                cache.clone(),
                config.clone(),
            );
            let outcome = coordinator.delete(&document_id, &cli.owner).await?;

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&outcome)?);
            } else {
                print_delete_outcome(&outcome);
            }
        }

        Commands::Reconcile { document } => {
            let reconciler = ConsistencyReconciler::new(db.clone(), index.clone());

            match document {
                Some(document_id) => {
                    let count = reconciler.reconcile_chunk_count(&document_id).await?;
                    if cli.json {
                        println!(
                            "{}",
                            serde_json::json!({ "document_id": document_id, "chunk_count": count })
                        );
                    } else {
                        println!("✓ Document {} now records {} chunks", document_id, count);
                    }
                }
                None => {
                    let report = reconciler.sweep(&cli.owner).await?;
                    if cli.json {
                        println!("{}", serde_json::to_string_pretty(&report)?);
                    } else {
                        print_sweep_report(&report);
                    }
                }
            }
        }

        Commands::Status => {
            let status = cmd_status(&config, &db, &index, embedder.as_ref()).await?;

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&status)?);
            } else {
                print_status(&status);
            }
        }

        Commands::Db { action } => {
            handle_db(&config, &index, action).await?;
        }
    }

    Ok(())
}

async fn handle_db(config: &Config, index: &QdrantIndex, action: DbAction) -> Result<()> {
    match action {
        DbAction::Init => {
            index.ensure_ready().await?;
            println!("✓ Collection '{}' ready", config.collection_name);
        }

        DbAction::Status => match index.collection_info().await? {
            Some(info) => {
                println!("Collection: {}", config.collection_name);
                println!("Points: {}", info.points_count);
                println!("Status: {}", info.status);
            }
            None => {
                println!(
                    "Collection '{}' does not exist. Run 'archivist db init' to create it.",
                    config.collection_name
                );
            }
        },

        DbAction::Reset { yes } => {
            if !yes {
                return Err(Error::Config(
                    "Resetting deletes all vectors. Pass --yes to confirm.".to_string(),
                ));
            }
            index.reset_collection().await?;
            println!("✓ Collection '{}' reset", config.collection_name);
        }
    }

    Ok(())
}

fn load_config(path: Option<&std::path::Path>) -> Result<Config> {
    match path {
        Some(path) => Config::load(path),
        None => Config::load_default().map_err(|_| Error::NotInitialized),
    }
}
