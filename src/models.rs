use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A single chat turn (user or assistant)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }
}

/// One indexed chunk of a document, as written to the vector store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkRecord {
    pub chunk_id: String,
    pub document_id: String,
    pub filename: String,
    pub chunk_index: usize,
    pub content: String,
    pub upload_date: String,
    pub person_name: String,
    pub section: String,
    pub info_type: String,
    pub size_bytes: u64,
    /// Name of the source PDF in blob storage, if it was uploaded there.
    pub blob_name: Option<String>,
    pub embedding: Vec<f32>,
}

/// A search hit returned by a vector store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorDocument {
    pub id: String,
    pub content: String,
    pub metadata: ChunkMetadata,
    pub score: f32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChunkMetadata {
    pub document_id: String,
    pub filename: String,
    pub chunk_id: String,
    pub chunk_index: usize,
    pub person_name: String,
    pub section: String,
    pub info_type: String,
}

/// Restrictions applied to a similarity search.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchFilters {
    #[serde(default)]
    pub document_id: Option<String>,
    #[serde(default)]
    pub person_name: Option<String>,
    #[serde(default)]
    pub filename: Option<String>,
}

impl SearchFilters {
    pub fn is_empty(&self) -> bool {
        self.document_id.is_none() && self.person_name.is_none() && self.filename.is_none()
    }

    /// Copy of `self` with the person restriction replaced.
    pub fn with_person(&self, person: &str) -> Self {
        Self {
            person_name: Some(person.to_string()),
            ..self.clone()
        }
    }
}

/// Per-document aggregate over the chunks in a vector store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentSummary {
    pub document_id: String,
    pub filename: String,
    pub person_name: String,
    pub upload_date: String,
    pub size_bytes: u64,
    pub chunk_count: usize,
    pub blob_name: Option<String>,
}

/// Vector store statistics shown on `/health` and `/api/v1/storage/stats`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexStats {
    pub total_chunks: usize,
    pub unique_documents: usize,
    pub unique_persons: usize,
    pub backend: String,
}

/// Listing entry for a blob.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlobInfo {
    pub name: String,
    pub size: u64,
    pub last_modified: Option<String>,
    pub content_type: Option<String>,
}

/// JSON snapshot of a document's chunks and embeddings, kept in blob storage
/// so an index can be rebuilt without re-embedding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingsSnapshot {
    pub document_id: String,
    pub filename: String,
    pub person_name: String,
    pub total_chunks: usize,
    pub created_at: String,
    pub chunks: Vec<SnapshotChunk>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotChunk {
    pub chunk_id: String,
    pub text: String,
    pub section: String,
    pub embedding: Vec<f32>,
}

// ─── HTTP request / response bodies ──────────────────────

/// Query request
#[derive(Debug, Clone, Deserialize)]
pub struct QueryRequest {
    pub query: String,
    pub session_id: Option<String>,
    pub filters: Option<SearchFilters>,
}

/// Source reference returned with an answer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Source {
    pub document_id: String,
    pub filename: String,
    pub score: f32,
    pub chunk_id: String,
    pub person_name: String,
    pub section: String,
}

impl From<&VectorDocument> for Source {
    fn from(doc: &VectorDocument) -> Self {
        Self {
            document_id: doc.metadata.document_id.clone(),
            filename: doc.metadata.filename.clone(),
            score: doc.score,
            chunk_id: doc.id.clone(),
            person_name: doc.metadata.person_name.clone(),
            section: doc.metadata.section.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResponse {
    pub answer: String,
    pub sources: Vec<Source>,
    pub session_id: String,
    pub metadata: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentUploadResponse {
    pub document_id: String,
    pub filename: String,
    pub status: String,
    pub message: String,
    pub chunk_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub document_id: String,
    pub filename: String,
    pub upload_date: String,
    pub size_bytes: u64,
    pub status: String,
    pub chunk_count: Option<usize>,
    pub person_name: String,
}

impl From<DocumentSummary> for DocumentMetadata {
    fn from(s: DocumentSummary) -> Self {
        Self {
            document_id: s.document_id,
            filename: s.filename,
            upload_date: s.upload_date,
            size_bytes: s.size_bytes,
            status: "indexed".to_string(),
            chunk_count: Some(s.chunk_count),
            person_name: s.person_name,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CvDetailSource {
    pub document: String,
    pub page: String,
    pub relevance: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CvDetail {
    pub name: String,
    pub content: String,
    pub sources: Vec<CvDetailSource>,
    pub chunk_count: usize,
}
