//! Default values for configuration

/// Default Qdrant gRPC URL for local development (port 6334, not 6333 REST)
pub fn default_index_url() -> String {
    std::env::var("ARCHIVIST_INDEX_URL").unwrap_or_else(|_| "http://127.0.0.1:6334".to_string())
}

/// Default collection name
pub fn default_collection_name() -> String {
    "archivist_chunks".to_string()
}

/// Default maximum upload size (10 MiB)
pub fn default_max_upload_bytes() -> usize {
    10 * 1024 * 1024
}

/// Default embedding model identifier
pub fn default_embedding_model() -> String {
    "BAAI/bge-small-en-v1.5".to_string()
}

/// Default embedding dimension (must match model)
pub fn default_embedding_dimension() -> usize {
    384
}

/// Default batch size for embedding
pub fn default_embedding_batch_size() -> usize {
    32
}

/// Default embedding provider URL (none: deterministic fallback embedder)
pub fn default_provider_url() -> Option<String> {
    std::env::var("ARCHIVIST_EMBEDDING_URL").ok()
}

/// Default maximum characters per chunk
pub fn default_chunk_max_chars() -> usize {
    1500
}

/// Default minimum characters per chunk
pub fn default_chunk_min_chars() -> usize {
    100
}

/// Default overlap characters between chunks
pub fn default_chunk_overlap() -> usize {
    200
}

/// Default number of query results
pub fn default_query_k() -> usize {
    5
}

/// Default maximum query results
pub fn default_query_max_results() -> usize {
    50
}

/// Default minimum similarity score
pub fn default_query_min_score() -> f32 {
    0.55
}
