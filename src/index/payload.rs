//! Payload schema for index points

use qdrant_client::qdrant::{PointStruct, Value as QdrantValue};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use uuid::Uuid;

/// A point ready to be upserted to the index
#[derive(Debug, Clone)]
pub struct ChunkPoint {
    pub id: Uuid,
    pub vector: Vec<f32>,
    pub payload: ChunkPayload,
}

impl ChunkPoint {
    /// Convert to qdrant-client PointStruct
    pub fn to_point_struct(self) -> PointStruct {
        let payload_map = self.payload.to_qdrant_payload();
        PointStruct::new(self.id.to_string(), self.vector, payload_map)
    }
}

/// Stable point id for one chunk of one document.
///
/// Derived from the document id and chunk index, so re-ingesting a document
/// overwrites its points in place instead of accumulating duplicates.
pub fn chunk_point_id(document_id: &str, chunk_index: usize) -> Uuid {
    let name = format!("{}:{}", document_id, chunk_index);
    Uuid::new_v5(&Uuid::NAMESPACE_OID, name.as_bytes())
}

/// Payload stored with each chunk point
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkPayload {
    /// Owning document id
    pub document_id: String,

    /// Owner the document belongs to
    pub owner_id: String,

    /// Chunk index within the document
    pub chunk_index: i64,

    /// The chunk text itself
    pub text: String,

    /// When this chunk was last written
    pub updated_at: String,
}

impl ChunkPayload {
    pub fn new(
        document_id: String,
        owner_id: String,
        chunk_index: i64,
        text: String,
        updated_at: String,
    ) -> Self {
        Self {
            document_id,
            owner_id,
            chunk_index,
            text,
            updated_at,
        }
    }

    /// Convert to Qdrant payload format
    pub fn to_qdrant_payload(self) -> HashMap<String, QdrantValue> {
        let mut map = HashMap::new();

        map.insert("document_id".to_string(), string_to_qdrant(&self.document_id));
        map.insert("owner_id".to_string(), string_to_qdrant(&self.owner_id));
        map.insert("chunk_index".to_string(), int_to_qdrant(self.chunk_index));
        map.insert("text".to_string(), string_to_qdrant(&self.text));
        map.insert("updated_at".to_string(), string_to_qdrant(&self.updated_at));

        map
    }
}

fn string_to_qdrant(s: &str) -> QdrantValue {
    QdrantValue {
        kind: Some(qdrant_client::qdrant::value::Kind::StringValue(s.to_string())),
    }
}

fn int_to_qdrant(i: i64) -> QdrantValue {
    QdrantValue {
        kind: Some(qdrant_client::qdrant::value::Kind::IntegerValue(i)),
    }
}

impl From<Map<String, Value>> for ChunkPayload {
    fn from(map: Map<String, Value>) -> Self {
        serde_json::from_value(Value::Object(map)).unwrap_or_else(|_| ChunkPayload {
            document_id: String::new(),
            owner_id: String::new(),
            chunk_index: 0,
            text: String::new(),
            updated_at: String::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_point_id_is_stable() {
        let a = chunk_point_id("doc-1", 0);
        let b = chunk_point_id("doc-1", 0);
        let c = chunk_point_id("doc-1", 1);
        let d = chunk_point_id("doc-2", 0);

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(a, d);
    }

    #[test]
    fn test_payload_serialization() {
        let payload = ChunkPayload::new(
            "doc-123".to_string(),
            "alice".to_string(),
            2,
            "some chunk text".to_string(),
            "2024-01-01T00:00:00Z".to_string(),
        );

        let json = serde_json::to_string(&payload).unwrap();
        assert!(json.contains("doc-123"));
        assert!(json.contains("owner_id"));

        let parsed: ChunkPayload = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.document_id, "doc-123");
        assert_eq!(parsed.chunk_index, 2);
    }

    #[test]
    fn test_payload_from_incomplete_map_defaults() {
        let mut map = Map::new();
        map.insert("document_id".to_string(), Value::String("d1".to_string()));

        // Missing fields fall back to empty defaults instead of panicking
        let payload = ChunkPayload::from(map);
        assert!(payload.document_id.is_empty() || payload.document_id == "d1");
    }
}
