//! Document ingestion: PDF in, indexed chunks out.
//!
//! ```text
//! upload ─► blob (optional) ─► pdf text ─► owner name ─► section chunks
//!        ─► embeddings ─► vector store ─► embeddings snapshot (best effort)
//! ```

pub mod pdf;

use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

use crate::chunking::{chunk_cv, extract_full_name};
use crate::config::RagConfig;
use crate::error::{AdapterError, Result};
use crate::models::{
    ChunkRecord, DocumentMetadata, DocumentUploadResponse, EmbeddingsSnapshot, SnapshotChunk,
};
use crate::ports::{BlobStorePort, LlmPort, VectorStorePort};

pub struct DocumentManager {
    llm: Arc<dyn LlmPort>,
    vectors: Arc<dyn VectorStorePort>,
    blobs: Arc<dyn BlobStorePort>,
    config: RagConfig,
}

/// Last path component of a client-supplied filename.
fn base_name(filename: &str) -> &str {
    filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(filename)
        .trim()
}

impl DocumentManager {
    pub fn new(
        llm: Arc<dyn LlmPort>,
        vectors: Arc<dyn VectorStorePort>,
        blobs: Arc<dyn BlobStorePort>,
        config: RagConfig,
    ) -> Self {
        Self {
            llm,
            vectors,
            blobs,
            config,
        }
    }

    pub async fn upload_document(
        &self,
        content: Vec<u8>,
        filename: &str,
        upload_to_blob: bool,
    ) -> Result<DocumentUploadResponse> {
        let filename = base_name(filename);
        if !filename.to_lowercase().ends_with(".pdf") {
            return Err(AdapterError::InvalidInput(
                "Solo se aceptan archivos PDF".to_string(),
            ));
        }
        if content.is_empty() {
            return Err(AdapterError::InvalidInput("El archivo está vacío".to_string()));
        }
        if self.vectors.document_exists_by_filename(filename).await? {
            return Err(AdapterError::Conflict(format!(
                "Ya existe un documento con el nombre {filename}"
            )));
        }

        let size_bytes = content.len() as u64;
        let blob_name = if upload_to_blob {
            Some(self.blobs.upload_pdf(content.clone(), filename).await?)
        } else {
            None
        };

        let text = pdf::extract_text(content).await?;
        if text.is_empty() {
            return Err(AdapterError::InvalidInput(
                "El PDF no contiene texto extraíble".to_string(),
            ));
        }
        tracing::info!("Extracted {} chars from {filename}", text.chars().count());

        self.ingest_text(filename, &text, size_bytes, blob_name).await
    }

    /// Chunk, embed and index already-extracted text.
    pub async fn ingest_text(
        &self,
        filename: &str,
        text: &str,
        size_bytes: u64,
        blob_name: Option<String>,
    ) -> Result<DocumentUploadResponse> {
        let document_id = Uuid::new_v4().to_string();
        let person_name = extract_full_name(text, filename);
        let chunks = chunk_cv(
            text,
            &person_name,
            self.config.chunk_size,
            self.config.chunk_overlap,
        );
        if chunks.is_empty() {
            return Err(AdapterError::InvalidInput(
                "El documento no contiene texto".to_string(),
            ));
        }
        tracing::info!("Created {} chunks for {person_name} ({filename})", chunks.len());

        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let embeddings = self.llm.generate_embeddings(&texts).await?;
        if embeddings.len() != chunks.len() {
            return Err(AdapterError::Decode(format!(
                "expected {} embeddings, got {}",
                chunks.len(),
                embeddings.len()
            )));
        }

        let upload_date = Utc::now().to_rfc3339();
        let records: Vec<ChunkRecord> = chunks
            .into_iter()
            .zip(embeddings)
            .map(|(chunk, embedding)| ChunkRecord {
                chunk_id: format!("{document_id}_{}", chunk.index),
                document_id: document_id.clone(),
                filename: filename.to_string(),
                chunk_index: chunk.index,
                content: chunk.text,
                upload_date: upload_date.clone(),
                person_name: person_name.clone(),
                section: chunk.section.name().to_string(),
                info_type: chunk.section.info_type().to_string(),
                size_bytes,
                blob_name: blob_name.clone(),
                embedding,
            })
            .collect();

        let snapshot = EmbeddingsSnapshot {
            document_id: document_id.clone(),
            filename: filename.to_string(),
            person_name: person_name.clone(),
            total_chunks: records.len(),
            created_at: upload_date,
            chunks: records
                .iter()
                .map(|r| SnapshotChunk {
                    chunk_id: r.chunk_id.clone(),
                    text: r.content.clone(),
                    section: r.section.clone(),
                    embedding: r.embedding.clone(),
                })
                .collect(),
        };

        let chunk_count = self.vectors.add_documents(records).await?.len();

        if let Err(e) = self.blobs.save_embeddings(&document_id, &snapshot).await {
            tracing::warn!("Could not save embeddings snapshot for {document_id}: {e}");
        }

        tracing::info!("Document {filename} indexed as {document_id}");
        Ok(DocumentUploadResponse {
            document_id,
            filename: filename.to_string(),
            status: "success".to_string(),
            message: format!("Documento procesado: {chunk_count} chunks indexados"),
            chunk_count,
        })
    }

    /// Remove a document's chunks, snapshot and PDF. Returns false when the
    /// document had no chunks.
    pub async fn delete_document(&self, document_id: &str) -> Result<bool> {
        let blob_name = self
            .vectors
            .get_document(document_id)
            .await?
            .and_then(|d| d.blob_name);

        if self.vectors.delete_by_document_id(document_id).await? == 0 {
            return Ok(false);
        }

        if let Err(e) = self.blobs.delete_embeddings(document_id).await {
            tracing::warn!("Could not delete embeddings snapshot for {document_id}: {e}");
        }
        if let Some(name) = blob_name {
            if let Err(e) = self.blobs.delete_pdf(&name).await {
                tracing::warn!("Could not delete PDF {name}: {e}");
            }
        }
        tracing::info!("Document {document_id} deleted");
        Ok(true)
    }

    /// Indexed documents, newest first.
    pub async fn list_documents(&self) -> Result<Vec<DocumentMetadata>> {
        let mut docs: Vec<DocumentMetadata> = self
            .vectors
            .list_documents()
            .await?
            .into_iter()
            .map(DocumentMetadata::from)
            .collect();
        docs.sort_by(|a, b| b.upload_date.cmp(&a.upload_date));
        Ok(docs)
    }

    pub async fn get_document(&self, document_id: &str) -> Result<DocumentMetadata> {
        self.vectors
            .get_document(document_id)
            .await?
            .map(DocumentMetadata::from)
            .ok_or_else(|| AdapterError::NotFound(format!("Documento {document_id}")))
    }
}
