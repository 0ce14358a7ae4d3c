//! Outbound ports. The services in [`crate::rag`] and [`crate::documents`]
//! only talk to these traits; the Azure and local adapters implement them.

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{
    BlobInfo, ChatMessage, ChunkRecord, DocumentSummary, EmbeddingsSnapshot, IndexStats,
    SearchFilters, VectorDocument,
};

#[async_trait]
pub trait LlmPort: Send + Sync {
    /// Answer `question` using only `context`, continuing `history`.
    async fn generate_response(
        &self,
        question: &str,
        context: &[String],
        history: &[ChatMessage],
    ) -> Result<String>;

    /// One embedding per input text, in input order.
    async fn generate_embeddings(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
}

#[async_trait]
pub trait VectorStorePort: Send + Sync {
    /// Store chunks and return their ids.
    async fn add_documents(&self, chunks: Vec<ChunkRecord>) -> Result<Vec<String>>;

    /// Nearest chunks to `query_embedding`, best first. When `query_text` is
    /// given the backend may combine keyword and vector scoring.
    async fn similarity_search(
        &self,
        query_embedding: &[f32],
        top_k: usize,
        filters: Option<&SearchFilters>,
        query_text: Option<&str>,
    ) -> Result<Vec<VectorDocument>>;

    /// Remove every chunk of a document. Returns how many were removed.
    async fn delete_by_document_id(&self, document_id: &str) -> Result<usize>;

    async fn list_documents(&self) -> Result<Vec<DocumentSummary>>;

    /// Summary of one document, or `None` when it has no chunks.
    async fn get_document(&self, document_id: &str) -> Result<Option<DocumentSummary>>;

    async fn document_exists_by_filename(&self, filename: &str) -> Result<bool>;

    async fn stats(&self) -> Result<IndexStats>;
}

#[async_trait]
pub trait BlobStorePort: Send + Sync {
    async fn ensure_containers(&self) -> Result<()>;

    /// Upload a PDF and return the generated blob name.
    async fn upload_pdf(&self, content: Vec<u8>, filename: &str) -> Result<String>;

    async fn download_pdf(&self, blob_name: &str) -> Result<Vec<u8>>;

    async fn list_pdfs(&self) -> Result<Vec<BlobInfo>>;

    async fn delete_pdf(&self, blob_name: &str) -> Result<bool>;

    async fn save_embeddings(&self, document_id: &str, snapshot: &EmbeddingsSnapshot)
        -> Result<()>;

    async fn load_embeddings(&self, document_id: &str) -> Result<Option<EmbeddingsSnapshot>>;

    async fn delete_embeddings(&self, document_id: &str) -> Result<bool>;

    /// Document ids that have an embeddings snapshot.
    async fn list_embedding_documents(&self) -> Result<Vec<String>>;
}

/// Blob naming shared by every blob store.
pub mod blob_names {
    use chrono::{DateTime, Utc};

    pub const EMBEDDINGS_SUFFIX: &str = "_embeddings.json";

    pub fn pdf_blob_name(filename: &str, now: DateTime<Utc>) -> String {
        format!("{}_{}", now.format("%Y%m%d_%H%M%S"), filename)
    }

    pub fn embeddings_blob_name(document_id: &str) -> String {
        format!("{document_id}{EMBEDDINGS_SUFFIX}")
    }

    pub fn document_id_from_embeddings_blob(blob_name: &str) -> Option<&str> {
        blob_name.strip_suffix(EMBEDDINGS_SUFFIX)
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use chrono::TimeZone;

        #[test]
        fn test_pdf_blob_name_is_timestamp_prefixed() {
            let now = Utc.with_ymd_and_hms(2025, 11, 16, 10, 5, 9).unwrap();
            assert_eq!(pdf_blob_name("cv.pdf", now), "20251116_100509_cv.pdf");
        }

        #[test]
        fn test_embeddings_blob_name_round_trip() {
            let name = embeddings_blob_name("abc");
            assert_eq!(name, "abc_embeddings.json");
            assert_eq!(document_id_from_embeddings_blob(&name), Some("abc"));
            assert_eq!(document_id_from_embeddings_blob("abc.pdf"), None);
        }
    }
}
