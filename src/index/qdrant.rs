//! Qdrant-backed vector index

use super::{
    chunk_point_id, ChunkPayload, ChunkPoint, IndexHealth, IndexedChunk, ScoredChunk, VectorIndex,
};
use crate::config::Config;
use crate::error::{Error, Result};
use async_trait::async_trait;
use chrono::Utc;
use qdrant_client::qdrant::{
    Condition, CountPointsBuilder, CreateCollectionBuilder, DeletePointsBuilder, Distance, Filter,
    PointStruct, ScalarQuantizationBuilder, ScrollPointsBuilder, SearchPointsBuilder,
    UpsertPointsBuilder, VectorParamsBuilder,
};
use qdrant_client::Qdrant;
use serde_json::Value;
use tracing::{debug, info};

/// Information about the backing collection
#[derive(Debug, Clone)]
pub struct CollectionInfo {
    pub points_count: u64,
    pub status: String,
}

/// Qdrant index handle
pub struct QdrantIndex {
    client: Qdrant,
    collection: String,
    dimension: usize,
}

impl QdrantIndex {
    /// Connect to Qdrant using config
    pub fn connect(config: &Config) -> Result<Self> {
        Self::new(
            &config.index_url,
            &config.collection_name,
            config.embedding.dimension,
        )
    }

    /// Create a new index handle directly with URL and collection name
    pub fn new(url: &str, collection: &str, dimension: usize) -> Result<Self> {
        debug!("Connecting to Qdrant at {}", url);

        let client = Qdrant::from_url(url)
            .skip_compatibility_check()
            .build()
            .map_err(|e| Error::Index(e.to_string()))?;

        Ok(Self {
            client,
            collection: collection.to_string(),
            dimension,
        })
    }

    /// Expected vector dimension for this index
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Delete and recreate the collection
    pub async fn reset_collection(&self) -> Result<()> {
        if self.client.collection_exists(&self.collection).await? {
            info!("Deleting existing collection {}", self.collection);
            self.client.delete_collection(&self.collection).await?;
        }

        self.ensure_ready().await
    }

    /// Collection point count and status, if the collection exists
    pub async fn collection_info(&self) -> Result<Option<CollectionInfo>> {
        if !self.client.collection_exists(&self.collection).await? {
            return Ok(None);
        }

        let info = self.client.collection_info(&self.collection).await?;
        Ok(info.result.map(|result| CollectionInfo {
            points_count: result.points_count.unwrap_or(0),
            status: format!("{:?}", result.status()),
        }))
    }

    fn document_filter(document_id: &str) -> Filter {
        Filter::must([Condition::matches("document_id", document_id.to_string())])
    }

    fn owner_filter(owner_id: &str) -> Filter {
        Filter::must([Condition::matches("owner_id", owner_id.to_string())])
    }
}

#[async_trait]
impl VectorIndex for QdrantIndex {
    async fn ensure_ready(&self) -> Result<()> {
        if self.client.collection_exists(&self.collection).await? {
            debug!("Collection {} already exists", self.collection);
            return Ok(());
        }

        info!(
            "Creating collection {} with dimension {}",
            self.collection, self.dimension
        );

        let vectors_config = VectorParamsBuilder::new(self.dimension as u64, Distance::Cosine);

        self.client
            .create_collection(
                CreateCollectionBuilder::new(&self.collection)
                    .vectors_config(vectors_config)
                    .quantization_config(ScalarQuantizationBuilder::default()),
            )
            .await?;

        info!("Collection {} created successfully", self.collection);
        Ok(())
    }

    async fn upsert_document(
        &self,
        document_id: &str,
        owner_id: &str,
        chunks: &[IndexedChunk],
    ) -> Result<usize> {
        if chunks.is_empty() {
            return Ok(0);
        }

        if let Some(mismatch) = chunks.iter().find(|c| c.vector.len() != self.dimension) {
            return Err(Error::Index(format!(
                "Vector dimension mismatch for collection '{}': expected {}, got {}",
                self.collection,
                self.dimension,
                mismatch.vector.len()
            )));
        }

        debug!(
            "Upserting {} points for document {} to collection {}",
            chunks.len(),
            document_id,
            self.collection
        );

        let now = Utc::now().to_rfc3339();
        let points: Vec<PointStruct> = chunks
            .iter()
            .map(|chunk| {
                ChunkPoint {
                    id: chunk_point_id(document_id, chunk.chunk_index),
                    vector: chunk.vector.clone(),
                    payload: ChunkPayload::new(
                        document_id.to_string(),
                        owner_id.to_string(),
                        chunk.chunk_index as i64,
                        chunk.text.clone(),
                        now.clone(),
                    ),
                }
                .to_point_struct()
            })
            .collect();

        let written = points.len();
        self.client
            .upsert_points(UpsertPointsBuilder::new(&self.collection, points))
            .await?;

        Ok(written)
    }

    async fn delete_document(&self, document_id: &str) -> Result<()> {
        debug!(
            "Deleting points for document {} from collection {}",
            document_id, self.collection
        );

        self.client
            .delete_points(
                DeletePointsBuilder::new(&self.collection)
                    .points(Self::document_filter(document_id)),
            )
            .await?;

        Ok(())
    }

    async fn chunk_count(&self, document_id: &str) -> Result<u64> {
        let response = self
            .client
            .count(
                CountPointsBuilder::new(&self.collection)
                    .filter(Self::document_filter(document_id))
                    .exact(true),
            )
            .await?;

        Ok(response.result.map(|r| r.count).unwrap_or(0))
    }

    async fn document_ids(&self, owner_id: &str) -> Result<Vec<String>> {
        let mut ids = Vec::new();
        let mut offset = None;

        loop {
            let mut scroll_builder = ScrollPointsBuilder::new(&self.collection)
                .filter(Self::owner_filter(owner_id))
                .limit(1000)
                .with_payload(true)
                .with_vectors(false);

            if let Some(o) = offset {
                scroll_builder = scroll_builder.offset(o);
            }

            let response = self.client.scroll(scroll_builder).await?;
            if response.result.is_empty() {
                break;
            }

            for point in response.result {
                let payload: ChunkPayload = point
                    .payload
                    .into_iter()
                    .map(|(k, v)| (k, json_from_qdrant_value(v)))
                    .collect::<serde_json::Map<String, Value>>()
                    .into();

                if !payload.document_id.is_empty() && !ids.contains(&payload.document_id) {
                    ids.push(payload.document_id);
                }
            }

            offset = response.next_page_offset;
            if offset.is_none() {
                break;
            }
        }

        Ok(ids)
    }

    async fn search(
        &self,
        query_vector: Vec<f32>,
        owner_id: &str,
        limit: usize,
    ) -> Result<Vec<ScoredChunk>> {
        debug!(
            "Searching collection {} for owner {} with limit {}",
            self.collection, owner_id, limit
        );

        let search_builder =
            SearchPointsBuilder::new(&self.collection, query_vector, limit as u64)
                .filter(Self::owner_filter(owner_id))
                .with_payload(true);

        let response = self.client.search_points(search_builder).await?;

        let results = response
            .result
            .into_iter()
            .map(|p| {
                let payload: ChunkPayload = p
                    .payload
                    .into_iter()
                    .map(|(k, v)| (k, json_from_qdrant_value(v)))
                    .collect::<serde_json::Map<String, Value>>()
                    .into();

                ScoredChunk {
                    document_id: payload.document_id,
                    owner_id: payload.owner_id,
                    chunk_index: payload.chunk_index.max(0) as usize,
                    text: payload.text,
                    score: p.score,
                }
            })
            .collect();

        Ok(results)
    }

    async fn health(&self) -> IndexHealth {
        match self.collection_info().await {
            Ok(Some(info)) => IndexHealth {
                reachable: true,
                points_count: info.points_count,
            },
            Ok(None) => IndexHealth {
                reachable: true,
                points_count: 0,
            },
            Err(_) => IndexHealth {
                reachable: false,
                points_count: 0,
            },
        }
    }
}

/// Convert Qdrant value to serde_json Value
fn json_from_qdrant_value(v: qdrant_client::qdrant::Value) -> Value {
    use qdrant_client::qdrant::value::Kind;

    match v.kind {
        Some(Kind::NullValue(_)) => Value::Null,
        Some(Kind::BoolValue(b)) => Value::Bool(b),
        Some(Kind::IntegerValue(i)) => Value::Number(i.into()),
        Some(Kind::DoubleValue(d)) => serde_json::Number::from_f64(d)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        Some(Kind::StringValue(s)) => Value::String(s),
        Some(Kind::ListValue(list)) => Value::Array(
            list.values
                .into_iter()
                .map(json_from_qdrant_value)
                .collect(),
        ),
        Some(Kind::StructValue(s)) => Value::Object(
            s.fields
                .into_iter()
                .map(|(k, v)| (k, json_from_qdrant_value(v)))
                .collect(),
        ),
        None => Value::Null,
    }
}
