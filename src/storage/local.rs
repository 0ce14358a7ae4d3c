use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};

use crate::config::BlobConfig;
use crate::error::{AdapterError, Result};
use crate::models::{BlobInfo, EmbeddingsSnapshot};
use crate::ports::blob_names::{
    document_id_from_embeddings_blob, embeddings_blob_name, pdf_blob_name,
};
use crate::ports::BlobStorePort;

/// Filesystem blob store: `{root}/{container}/{blob}`.
pub struct LocalBlobStore {
    root: PathBuf,
    containers: BlobConfig,
}

/// Reduce a blob name to a single safe path component.
fn sanitize(name: &str) -> Result<String> {
    let clean = name.replace(['/', '\\'], "_");
    if clean.is_empty() || clean == "." || clean == ".." {
        return Err(AdapterError::InvalidInput(format!("invalid blob name: {name:?}")));
    }
    Ok(clean)
}

impl LocalBlobStore {
    pub fn new(root: &Path, containers: BlobConfig) -> Self {
        Self {
            root: root.to_path_buf(),
            containers,
        }
    }

    fn path(&self, container: &str, name: &str) -> Result<PathBuf> {
        Ok(self.root.join(container).join(sanitize(name)?))
    }

    async fn write(&self, container: &str, name: &str, content: &[u8]) -> Result<()> {
        let path = self.path(container, name)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, content).await?;
        Ok(())
    }

    async fn read(&self, container: &str, name: &str) -> Result<Option<Vec<u8>>> {
        match tokio::fs::read(self.path(container, name)?).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn remove(&self, container: &str, name: &str) -> Result<bool> {
        match tokio::fs::remove_file(self.path(container, name)?).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn list(&self, container: &str) -> Result<Vec<BlobInfo>> {
        let dir = self.root.join(container);
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut blobs = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let meta = entry.metadata().await?;
            if !meta.is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            let content_type = if name.to_lowercase().ends_with(".pdf") {
                Some("application/pdf".to_string())
            } else if name.ends_with(".json") {
                Some("application/json".to_string())
            } else {
                None
            };
            blobs.push(BlobInfo {
                size: meta.len(),
                last_modified: meta
                    .modified()
                    .ok()
                    .map(|t| DateTime::<Utc>::from(t).to_rfc3339()),
                content_type,
                name,
            });
        }
        blobs.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(blobs)
    }
}

#[async_trait]
impl BlobStorePort for LocalBlobStore {
    async fn ensure_containers(&self) -> Result<()> {
        for container in [
            &self.containers.container_pdfs,
            &self.containers.container_embeddings,
            &self.containers.container_cache,
        ] {
            tokio::fs::create_dir_all(self.root.join(container)).await?;
        }
        Ok(())
    }

    async fn upload_pdf(&self, content: Vec<u8>, filename: &str) -> Result<String> {
        let blob_name = pdf_blob_name(&sanitize(filename)?, Utc::now());
        self.write(&self.containers.container_pdfs, &blob_name, &content)
            .await?;
        tracing::info!("PDF stored locally: {blob_name}");
        Ok(blob_name)
    }

    async fn download_pdf(&self, blob_name: &str) -> Result<Vec<u8>> {
        self.read(&self.containers.container_pdfs, blob_name)
            .await?
            .ok_or_else(|| AdapterError::NotFound(blob_name.to_string()))
    }

    async fn list_pdfs(&self) -> Result<Vec<BlobInfo>> {
        self.list(&self.containers.container_pdfs).await
    }

    async fn delete_pdf(&self, blob_name: &str) -> Result<bool> {
        self.remove(&self.containers.container_pdfs, blob_name).await
    }

    async fn save_embeddings(
        &self,
        document_id: &str,
        snapshot: &EmbeddingsSnapshot,
    ) -> Result<()> {
        let body = serde_json::to_vec(snapshot)?;
        self.write(
            &self.containers.container_embeddings,
            &embeddings_blob_name(document_id),
            &body,
        )
        .await
    }

    async fn load_embeddings(&self, document_id: &str) -> Result<Option<EmbeddingsSnapshot>> {
        let bytes = self
            .read(&self.containers.container_embeddings, &embeddings_blob_name(document_id))
            .await?;
        match bytes {
            Some(b) => Ok(Some(serde_json::from_slice(&b)?)),
            None => Ok(None),
        }
    }

    async fn delete_embeddings(&self, document_id: &str) -> Result<bool> {
        self.remove(&self.containers.container_embeddings, &embeddings_blob_name(document_id))
            .await
    }

    async fn list_embedding_documents(&self) -> Result<Vec<String>> {
        let blobs = self.list(&self.containers.container_embeddings).await?;
        Ok(blobs
            .iter()
            .filter_map(|b| document_id_from_embeddings_blob(&b.name))
            .map(str::to_string)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(id: &str) -> EmbeddingsSnapshot {
        EmbeddingsSnapshot {
            document_id: id.to_string(),
            filename: "cv.pdf".to_string(),
            person_name: "Ana Silva".to_string(),
            total_chunks: 1,
            created_at: "2025-01-01T00:00:00Z".to_string(),
            chunks: Vec::new(),
        }
    }

    #[test]
    fn test_sanitize_strips_separators() {
        assert_eq!(sanitize("../etc/passwd").unwrap(), ".._etc_passwd");
        assert_eq!(sanitize("a\\b.pdf").unwrap(), "a_b.pdf");
        assert!(sanitize("..").is_err());
        assert!(sanitize("").is_err());
    }

    #[tokio::test]
    async fn test_pdf_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalBlobStore::new(dir.path(), BlobConfig::default());
        store.ensure_containers().await.unwrap();
        store.ensure_containers().await.unwrap();

        let name = store.upload_pdf(b"%PDF-1.4".to_vec(), "cv.pdf").await.unwrap();
        assert!(name.ends_with("_cv.pdf"));
        assert_eq!(store.download_pdf(&name).await.unwrap(), b"%PDF-1.4");

        let listed = store.list_pdfs().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].size, 8);
        assert_eq!(listed[0].content_type.as_deref(), Some("application/pdf"));

        assert!(store.delete_pdf(&name).await.unwrap());
        assert!(!store.delete_pdf(&name).await.unwrap());
        assert!(matches!(
            store.download_pdf(&name).await,
            Err(AdapterError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_embeddings_snapshot_lifecycle() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalBlobStore::new(dir.path(), BlobConfig::default());

        assert!(store.load_embeddings("d1").await.unwrap().is_none());
        store.save_embeddings("d1", &snapshot("d1")).await.unwrap();
        let loaded = store.load_embeddings("d1").await.unwrap().unwrap();
        assert_eq!(loaded.person_name, "Ana Silva");
        assert_eq!(store.list_embedding_documents().await.unwrap(), vec!["d1"]);
        assert!(store.delete_embeddings("d1").await.unwrap());
        assert!(store.list_embedding_documents().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_missing_container_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalBlobStore::new(dir.path(), BlobConfig::default());
        assert!(store.list_pdfs().await.unwrap().is_empty());
    }
}
