use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Method, StatusCode};
use serde::Deserialize;
use url::Url;

use super::shared_key::{SignableRequest, StorageAccount, API_VERSION};
use crate::config::BlobConfig;
use crate::error::{AdapterError, Result};
use crate::models::{BlobInfo, EmbeddingsSnapshot};
use crate::ports::blob_names::{
    document_id_from_embeddings_blob, embeddings_blob_name, pdf_blob_name,
};
use crate::ports::BlobStorePort;

const SERVICE: &str = "Azure Blob Storage";

/// Blob Storage over the REST API, one container each for PDFs,
/// embedding snapshots and cache.
pub struct AzureBlobStore {
    http: reqwest::Client,
    account: StorageAccount,
    containers: BlobConfig,
}

// ─── List Blobs response ─────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct EnumerationResults {
    #[serde(default)]
    blobs: BlobList,
    #[serde(default)]
    next_marker: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct BlobList {
    #[serde(rename = "Blob", default)]
    items: Vec<BlobItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct BlobItem {
    name: String,
    #[serde(default)]
    properties: BlobProperties,
}

#[derive(Debug, Default, Deserialize)]
struct BlobProperties {
    #[serde(rename = "Last-Modified", default)]
    last_modified: Option<String>,
    #[serde(rename = "Content-Length", default)]
    content_length: u64,
    #[serde(rename = "Content-Type", default)]
    content_type: Option<String>,
}

fn parse_listing(xml: &str) -> Result<(Vec<BlobInfo>, Option<String>)> {
    let results: EnumerationResults = quick_xml::de::from_str(xml.trim_start_matches('\u{feff}'))
        .map_err(|e| AdapterError::Decode(format!("blob listing: {e}")))?;
    let blobs = results
        .blobs
        .items
        .into_iter()
        .map(|b| BlobInfo {
            name: b.name,
            size: b.properties.content_length,
            last_modified: b.properties.last_modified,
            content_type: b.properties.content_type.filter(|t| !t.is_empty()),
        })
        .collect();
    let marker = results.next_marker.filter(|m| !m.is_empty());
    Ok((blobs, marker))
}

// ─── Client ──────────────────────────────────────────────

impl AzureBlobStore {
    pub fn new(http: reqwest::Client, config: BlobConfig) -> Result<Self> {
        let conn = config
            .connection_string
            .as_deref()
            .ok_or_else(|| AdapterError::NotConfigured("AZURE_STORAGE_CONNECTION_STRING".into()))?;
        let account = StorageAccount::from_connection_string(conn)?;
        tracing::info!("Blob storage account: {}", account.name);
        Ok(Self {
            http,
            account,
            containers: config,
        })
    }

    fn url(&self, container: &str, blob: Option<&str>, query: &[(&str, &str)]) -> Result<Url> {
        let mut url = Url::parse(&self.account.blob_endpoint)
            .map_err(|e| AdapterError::NotConfigured(format!("blob endpoint: {e}")))?;
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| AdapterError::NotConfigured("blob endpoint cannot be a base".into()))?;
            segments.pop_if_empty().push(container);
            if let Some(blob) = blob {
                segments.push(blob);
            }
        }
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        if let Some(sas) = self.account.sas_token() {
            let joined = match url.query() {
                Some(q) if !q.is_empty() => format!("{q}&{sas}"),
                _ => sas.to_string(),
            };
            url.set_query(Some(&joined));
        }
        Ok(url)
    }

    async fn send(
        &self,
        method: Method,
        url: Url,
        body: Option<(Vec<u8>, &str)>,
        extra_headers: &[(&str, String)],
    ) -> Result<reqwest::Response> {
        let mut ms_headers: Vec<(&str, String)> = vec![
            ("x-ms-date", Utc::now().format("%a, %d %b %Y %H:%M:%S GMT").to_string()),
            ("x-ms-version", API_VERSION.to_string()),
        ];
        ms_headers.extend(extra_headers.iter().cloned());

        let (content_length, content_type) = match &body {
            Some((bytes, ct)) => (bytes.len(), Some(*ct)),
            None => (0, None),
        };
        let authorization = self.account.authorization(&SignableRequest {
            method: method.as_str(),
            url: &url,
            content_length,
            content_type,
            ms_headers: &ms_headers,
        });

        let mut builder = self.http.request(method, url);
        for (name, value) in &ms_headers {
            builder = builder.header(*name, value);
        }
        if let Some(auth) = authorization {
            builder = builder.header("Authorization", auth);
        }
        if let Some((bytes, ct)) = body {
            builder = builder.header("Content-Type", ct).body(bytes);
        }
        Ok(builder.send().await?)
    }

    async fn create_container(&self, container: &str) -> Result<()> {
        let url = self.url(container, None, &[("restype", "container")])?;
        let resp = self.send(Method::PUT, url, None, &[]).await?;
        match resp.status() {
            s if s.is_success() => {
                tracing::info!("Container created: {container}");
                Ok(())
            }
            StatusCode::CONFLICT => Ok(()),
            _ => Err(AdapterError::from_response(SERVICE, resp).await),
        }
    }

    async fn put_blob(
        &self,
        container: &str,
        name: &str,
        content: Vec<u8>,
        content_type: &str,
    ) -> Result<()> {
        let url = self.url(container, Some(name), &[])?;
        let resp = self
            .send(
                Method::PUT,
                url,
                Some((content, content_type)),
                &[("x-ms-blob-type", "BlockBlob".to_string())],
            )
            .await?;
        if !resp.status().is_success() {
            return Err(AdapterError::from_response(SERVICE, resp).await);
        }
        Ok(())
    }

    async fn get_blob(&self, container: &str, name: &str) -> Result<Vec<u8>> {
        let url = self.url(container, Some(name), &[])?;
        let resp = self.send(Method::GET, url, None, &[]).await?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Err(AdapterError::NotFound(format!("{container}/{name}")));
        }
        if !resp.status().is_success() {
            return Err(AdapterError::from_response(SERVICE, resp).await);
        }
        Ok(resp.bytes().await?.to_vec())
    }

    async fn delete_blob(&self, container: &str, name: &str) -> Result<bool> {
        let url = self.url(container, Some(name), &[])?;
        let resp = self.send(Method::DELETE, url, None, &[]).await?;
        match resp.status() {
            s if s.is_success() => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            _ => Err(AdapterError::from_response(SERVICE, resp).await),
        }
    }

    async fn list_blobs(&self, container: &str) -> Result<Vec<BlobInfo>> {
        let mut all = Vec::new();
        let mut marker: Option<String> = None;
        loop {
            let mut query = vec![("restype", "container"), ("comp", "list")];
            if let Some(m) = marker.as_deref() {
                query.push(("marker", m));
            }
            let url = self.url(container, None, &query)?;
            let resp = self.send(Method::GET, url, None, &[]).await?;
            if !resp.status().is_success() {
                return Err(AdapterError::from_response(SERVICE, resp).await);
            }
            let (blobs, next) = parse_listing(&resp.text().await?)?;
            all.extend(blobs);
            match next {
                Some(next) => marker = Some(next),
                None => break,
            }
        }
        Ok(all)
    }
}

#[async_trait]
impl BlobStorePort for AzureBlobStore {
    async fn ensure_containers(&self) -> Result<()> {
        for container in [
            &self.containers.container_pdfs,
            &self.containers.container_embeddings,
            &self.containers.container_cache,
        ] {
            self.create_container(container).await?;
        }
        Ok(())
    }

    async fn upload_pdf(&self, content: Vec<u8>, filename: &str) -> Result<String> {
        let blob_name = pdf_blob_name(filename, Utc::now());
        self.put_blob(&self.containers.container_pdfs, &blob_name, content, "application/pdf")
            .await?;
        tracing::info!("PDF uploaded: {blob_name}");
        Ok(blob_name)
    }

    async fn download_pdf(&self, blob_name: &str) -> Result<Vec<u8>> {
        self.get_blob(&self.containers.container_pdfs, blob_name).await
    }

    async fn list_pdfs(&self) -> Result<Vec<BlobInfo>> {
        self.list_blobs(&self.containers.container_pdfs).await
    }

    async fn delete_pdf(&self, blob_name: &str) -> Result<bool> {
        self.delete_blob(&self.containers.container_pdfs, blob_name).await
    }

    async fn save_embeddings(
        &self,
        document_id: &str,
        snapshot: &EmbeddingsSnapshot,
    ) -> Result<()> {
        let body = serde_json::to_vec(snapshot)?;
        let name = embeddings_blob_name(document_id);
        self.put_blob(&self.containers.container_embeddings, &name, body, "application/json")
            .await?;
        tracing::info!("Embeddings saved: {name}");
        Ok(())
    }

    async fn load_embeddings(&self, document_id: &str) -> Result<Option<EmbeddingsSnapshot>> {
        let name = embeddings_blob_name(document_id);
        match self.get_blob(&self.containers.container_embeddings, &name).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(AdapterError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn delete_embeddings(&self, document_id: &str) -> Result<bool> {
        self.delete_blob(
            &self.containers.container_embeddings,
            &embeddings_blob_name(document_id),
        )
        .await
    }

    async fn list_embedding_documents(&self) -> Result<Vec<String>> {
        let blobs = self.list_blobs(&self.containers.container_embeddings).await?;
        Ok(blobs
            .iter()
            .filter_map(|b| document_id_from_embeddings_blob(&b.name))
            .map(str::to_string)
            .collect())
    }
}
