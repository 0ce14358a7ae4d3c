use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use super::{summarize, ChunkFacts};
use crate::chunking::name_matches;
use crate::error::{AdapterError, Result};
use crate::models::{
    ChunkMetadata, ChunkRecord, DocumentSummary, IndexStats, SearchFilters, VectorDocument,
};
use crate::ports::VectorStorePort;

/// In-memory vector store with disk persistence and cosine similarity search.
/// Used when Azure AI Search is not configured.
pub struct VectorStore {
    entries: RwLock<Vec<ChunkRecord>>,
    persist_path: PathBuf,
}

impl VectorStore {
    pub fn open_or_create(vector_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(vector_dir)?;
        let persist_path = vector_dir.join("vectors.json");

        let entries = if persist_path.exists() {
            let data = std::fs::read_to_string(&persist_path)?;
            serde_json::from_str(&data).unwrap_or_else(|e| {
                tracing::warn!("Ignoring unreadable vector store {}: {e}", persist_path.display());
                Vec::new()
            })
        } else {
            Vec::new()
        };

        Ok(Self {
            entries: RwLock::new(entries),
            persist_path,
        })
    }

    pub fn entry_count(&self) -> usize {
        self.entries.read().len()
    }

    /// Persist entries to disk (atomic write via temp file + rename).
    fn persist(&self, entries: &[ChunkRecord]) -> Result<()> {
        let data = serde_json::to_string(entries)?;
        let tmp_path = self.persist_path.with_extension("json.tmp");
        std::fs::write(&tmp_path, data)?;
        std::fs::rename(&tmp_path, &self.persist_path)?;
        Ok(())
    }
}

fn passes_filters(entry: &ChunkRecord, filters: Option<&SearchFilters>) -> bool {
    let Some(f) = filters else {
        return true;
    };
    if f.document_id.as_deref().is_some_and(|id| id != entry.document_id) {
        return false;
    }
    if f.filename.as_deref().is_some_and(|name| name != entry.filename) {
        return false;
    }
    f.person_name
        .as_deref()
        .map_or(true, |person| name_matches(&entry.person_name, person))
}

fn to_vector_document(entry: &ChunkRecord, score: f32) -> VectorDocument {
    VectorDocument {
        id: entry.chunk_id.clone(),
        content: entry.content.clone(),
        metadata: ChunkMetadata {
            document_id: entry.document_id.clone(),
            filename: entry.filename.clone(),
            chunk_id: entry.chunk_id.clone(),
            chunk_index: entry.chunk_index,
            person_name: entry.person_name.clone(),
            section: entry.section.clone(),
            info_type: entry.info_type.clone(),
        },
        score,
    }
}

#[async_trait]
impl VectorStorePort for VectorStore {
    async fn add_documents(&self, chunks: Vec<ChunkRecord>) -> Result<Vec<String>> {
        if chunks.iter().any(|c| c.embedding.is_empty()) {
            return Err(AdapterError::InvalidInput(
                "every chunk needs an embedding".to_string(),
            ));
        }
        let ids: Vec<String> = chunks.iter().map(|c| c.chunk_id.clone()).collect();
        let incoming: HashSet<&str> = ids.iter().map(String::as_str).collect();

        let mut entries = self.entries.write();
        // Same id replaces the stored chunk.
        entries.retain(|e| !incoming.contains(e.chunk_id.as_str()));
        entries.extend(chunks);
        self.persist(&entries)?;

        tracing::info!("{} chunks added to local vector store", ids.len());
        Ok(ids)
    }

    async fn similarity_search(
        &self,
        query_embedding: &[f32],
        top_k: usize,
        filters: Option<&SearchFilters>,
        _query_text: Option<&str>,
    ) -> Result<Vec<VectorDocument>> {
        let entries = self.entries.read();

        let mut scored: Vec<(f32, &ChunkRecord)> = entries
            .iter()
            .filter(|e| passes_filters(e, filters))
            .map(|e| (cosine_similarity(query_embedding, &e.embedding), e))
            .collect();

        // Sort descending by score
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(top_k);

        Ok(scored
            .into_iter()
            .map(|(score, e)| to_vector_document(e, score))
            .collect())
    }

    async fn delete_by_document_id(&self, document_id: &str) -> Result<usize> {
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|e| e.document_id != document_id);
        let removed = before - entries.len();
        if removed > 0 {
            self.persist(&entries)?;
            tracing::info!("Deleted {removed} chunks of document {document_id}");
        }
        Ok(removed)
    }

    async fn list_documents(&self) -> Result<Vec<DocumentSummary>> {
        let entries = self.entries.read();
        Ok(summarize(entries.iter().map(|e| ChunkFacts {
            document_id: &e.document_id,
            filename: &e.filename,
            person_name: &e.person_name,
            upload_date: &e.upload_date,
            size_bytes: e.size_bytes,
            blob_name: e.blob_name.as_deref(),
        })))
    }

    async fn get_document(&self, document_id: &str) -> Result<Option<DocumentSummary>> {
        let entries = self.entries.read();
        Ok(summarize(
            entries
                .iter()
                .filter(|e| e.document_id == document_id)
                .map(|e| ChunkFacts {
                    document_id: &e.document_id,
                    filename: &e.filename,
                    person_name: &e.person_name,
                    upload_date: &e.upload_date,
                    size_bytes: e.size_bytes,
                    blob_name: e.blob_name.as_deref(),
                }),
        )
        .pop())
    }

    async fn document_exists_by_filename(&self, filename: &str) -> Result<bool> {
        Ok(self.entries.read().iter().any(|e| e.filename == filename))
    }

    async fn stats(&self) -> Result<IndexStats> {
        let entries = self.entries.read();
        let documents: HashSet<&str> = entries.iter().map(|e| e.document_id.as_str()).collect();
        let persons: HashSet<&str> = entries.iter().map(|e| e.person_name.as_str()).collect();
        Ok(IndexStats {
            total_chunks: entries.len(),
            unique_documents: documents.len(),
            unique_persons: persons.len(),
            backend: "local".to_string(),
        })
    }
}

pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;

    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom == 0.0 {
        0.0
    } else {
        dot / denom
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(doc: &str, i: usize, person: &str, embedding: Vec<f32>) -> ChunkRecord {
        ChunkRecord {
            chunk_id: format!("{doc}_{i}"),
            document_id: doc.to_string(),
            filename: format!("{doc}.pdf"),
            chunk_index: i,
            content: format!("{person} chunk {i}"),
            upload_date: "2025-01-01T00:00:00Z".to_string(),
            person_name: person.to_string(),
            section: "general".to_string(),
            info_type: "general".to_string(),
            size_bytes: 100,
            blob_name: None,
            embedding,
        }
    }

    #[test]
    fn test_cosine_similarity() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 2.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
    }

    #[tokio::test]
    async fn test_search_ranks_by_similarity() {
        let dir = tempfile::tempdir().unwrap();
        let store = VectorStore::open_or_create(dir.path()).unwrap();
        store
            .add_documents(vec![
                chunk("a", 0, "Ana Silva", vec![1.0, 0.0]),
                chunk("b", 0, "Luis Pérez", vec![0.0, 1.0]),
            ])
            .await
            .unwrap();

        let hits = store.similarity_search(&[0.9, 0.1], 2, None, None).await.unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].metadata.document_id, "a");
        assert!(hits[0].score >= hits[1].score);
    }

    #[tokio::test]
    async fn test_person_filter_ignores_accents_and_case() {
        let dir = tempfile::tempdir().unwrap();
        let store = VectorStore::open_or_create(dir.path()).unwrap();
        store
            .add_documents(vec![
                chunk("a", 0, "Ana Silva", vec![1.0, 0.0]),
                chunk("b", 0, "Luis Pérez", vec![1.0, 0.0]),
            ])
            .await
            .unwrap();

        let filters = SearchFilters::default().with_person("luis perez");
        let hits = store
            .similarity_search(&[1.0, 0.0], 5, Some(&filters), None)
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].metadata.person_name, "Luis Pérez");
    }

    #[tokio::test]
    async fn test_persist_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = VectorStore::open_or_create(dir.path()).unwrap();
            store
                .add_documents(vec![chunk("a", 0, "Ana Silva", vec![1.0])])
                .await
                .unwrap();
        }
        let store = VectorStore::open_or_create(dir.path()).unwrap();
        assert_eq!(store.entry_count(), 1);
        assert!(store.document_exists_by_filename("a.pdf").await.unwrap());
        assert!(!dir.path().join("vectors.json.tmp").exists());
    }

    #[tokio::test]
    async fn test_delete_and_stats() {
        let dir = tempfile::tempdir().unwrap();
        let store = VectorStore::open_or_create(dir.path()).unwrap();
        store
            .add_documents(vec![
                chunk("a", 0, "Ana Silva", vec![1.0]),
                chunk("a", 1, "Ana Silva", vec![1.0]),
                chunk("b", 0, "Luis Pérez", vec![1.0]),
            ])
            .await
            .unwrap();

        let stats = store.stats().await.unwrap();
        assert_eq!(stats.total_chunks, 3);
        assert_eq!(stats.unique_documents, 2);
        assert_eq!(stats.unique_persons, 2);

        assert_eq!(store.delete_by_document_id("a").await.unwrap(), 2);
        assert_eq!(store.delete_by_document_id("a").await.unwrap(), 0);
        let docs = store.list_documents().await.unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].document_id, "b");
    }

    #[tokio::test]
    async fn test_get_document_by_id() {
        let dir = tempfile::tempdir().unwrap();
        let store = VectorStore::open_or_create(dir.path()).unwrap();
        let mut first = chunk("a", 0, "Ana Silva", vec![1.0]);
        first.blob_name = Some("20250101_000000_a.pdf".to_string());
        let mut second = chunk("a", 1, "Ana Silva", vec![1.0]);
        second.blob_name = first.blob_name.clone();
        store
            .add_documents(vec![first, second, chunk("b", 0, "Luis Pérez", vec![1.0])])
            .await
            .unwrap();

        let doc = store.get_document("a").await.unwrap().unwrap();
        assert_eq!(doc.chunk_count, 2);
        assert_eq!(doc.blob_name.as_deref(), Some("20250101_000000_a.pdf"));
        assert!(store.get_document("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_readding_same_chunk_replaces_it() {
        let dir = tempfile::tempdir().unwrap();
        let store = VectorStore::open_or_create(dir.path()).unwrap();
        store.add_documents(vec![chunk("a", 0, "Ana Silva", vec![1.0])]).await.unwrap();
        store.add_documents(vec![chunk("a", 0, "Ana Silva", vec![1.0])]).await.unwrap();
        assert_eq!(store.entry_count(), 1);
    }

    #[tokio::test]
    async fn test_rejects_chunk_without_embedding() {
        let dir = tempfile::tempdir().unwrap();
        let store = VectorStore::open_or_create(dir.path()).unwrap();
        let err = store
            .add_documents(vec![chunk("a", 0, "Ana Silva", Vec::new())])
            .await
            .unwrap_err();
        assert!(matches!(err, AdapterError::InvalidInput(_)));
    }
}
