//! Azure AI Search over its REST API. Chunks live in one index with a
//! `content_vector` field; queries are hybrid (keywords plus vector) when
//! the caller supplies query text.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::{HashMap, HashSet};

use super::{summarize, ChunkFacts};
use crate::config::SearchConfig;
use crate::error::{AdapterError, Result};
use crate::models::{
    ChunkMetadata, ChunkRecord, DocumentSummary, IndexStats, SearchFilters, VectorDocument,
};
use crate::ports::VectorStorePort;

const SERVICE: &str = "Azure AI Search";
const INDEX_BATCH: usize = 500;
const LIST_LIMIT: usize = 1000;
const VECTOR_FIELD: &str = "content_vector";
const VECTOR_PROFILE: &str = "vector-profile";
const SELECT_FIELDS: &str = "id,document_id,filename,chunk_id,chunk_index,content,person_name,section,info_type,upload_date,size_bytes,blob_name";
const SUMMARY_FIELDS: &str = "document_id,filename,person_name,upload_date,size_bytes,blob_name";

pub struct AzureSearchStore {
    http: reqwest::Client,
    config: SearchConfig,
    embedding_dim: usize,
}

// ─── Wire types ──────────────────────────────────────────

#[derive(Serialize)]
struct IndexAction<'a> {
    #[serde(rename = "@search.action")]
    action: &'static str,
    id: &'a str,
    document_id: &'a str,
    filename: &'a str,
    chunk_id: &'a str,
    chunk_index: usize,
    content: &'a str,
    upload_date: &'a str,
    person_name: &'a str,
    section: &'a str,
    info_type: &'a str,
    size_bytes: u64,
    blob_name: Option<&'a str>,
    content_vector: &'a [f32],
}

impl<'a> From<&'a ChunkRecord> for IndexAction<'a> {
    fn from(c: &'a ChunkRecord) -> Self {
        Self {
            action: "mergeOrUpload",
            id: &c.chunk_id,
            document_id: &c.document_id,
            filename: &c.filename,
            chunk_id: &c.chunk_id,
            chunk_index: c.chunk_index,
            content: &c.content,
            upload_date: &c.upload_date,
            person_name: &c.person_name,
            section: &c.section,
            info_type: &c.info_type,
            size_bytes: c.size_bytes,
            blob_name: c.blob_name.as_deref(),
            content_vector: &c.embedding,
        }
    }
}

#[derive(Serialize)]
struct IndexBatch<T: Serialize> {
    value: Vec<T>,
}

#[derive(Deserialize)]
struct IndexBatchResponse {
    #[serde(default)]
    value: Vec<IndexingResult>,
}

#[derive(Deserialize)]
struct IndexingResult {
    key: String,
    status: bool,
    #[serde(rename = "errorMessage", default)]
    error_message: Option<String>,
}

#[derive(Serialize, Default)]
#[serde(rename_all = "camelCase")]
struct SearchRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    search: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    filter: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    select: Option<&'a str>,
    top: usize,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    count: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    facets: Vec<&'a str>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    vector_queries: Vec<VectorQuery<'a>>,
}

#[derive(Serialize)]
struct VectorQuery<'a> {
    kind: &'static str,
    vector: &'a [f32],
    k: usize,
    fields: &'static str,
}

#[derive(Deserialize, Default)]
struct SearchResponse {
    #[serde(default)]
    value: Vec<IndexedChunk>,
    #[serde(rename = "@odata.count", default)]
    count: Option<u64>,
    #[serde(rename = "@search.facets", default)]
    facets: HashMap<String, Vec<FacetValue>>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct IndexedChunk {
    #[serde(rename = "@search.score")]
    score: f32,
    id: String,
    document_id: String,
    filename: String,
    chunk_id: String,
    chunk_index: usize,
    content: String,
    person_name: String,
    section: String,
    info_type: String,
    upload_date: String,
    size_bytes: u64,
    blob_name: Option<String>,
}

#[derive(Deserialize)]
struct FacetValue {
    value: serde_json::Value,
    #[serde(default)]
    count: u64,
}

impl From<IndexedChunk> for VectorDocument {
    fn from(c: IndexedChunk) -> Self {
        let id = if c.chunk_id.is_empty() { c.id } else { c.chunk_id.clone() };
        VectorDocument {
            id,
            content: c.content,
            metadata: ChunkMetadata {
                document_id: c.document_id,
                filename: c.filename,
                chunk_id: c.chunk_id,
                chunk_index: c.chunk_index,
                person_name: if c.person_name.is_empty() {
                    "Desconocido".to_string()
                } else {
                    c.person_name
                },
                section: non_empty_or_general(c.section),
                info_type: non_empty_or_general(c.info_type),
            },
            score: c.score,
        }
    }
}

fn non_empty_or_general(s: String) -> String {
    if s.is_empty() {
        "general".to_string()
    } else {
        s
    }
}

// ─── OData helpers ───────────────────────────────────────

/// Quote a value as an OData string literal.
pub fn odata_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// Translate search filters into an OData `$filter` expression.
pub fn odata_filter(filters: &SearchFilters) -> Option<String> {
    let mut parts = Vec::new();
    if let Some(id) = &filters.document_id {
        parts.push(format!("document_id eq {}", odata_literal(id)));
    }
    if let Some(person) = &filters.person_name {
        parts.push(format!("person_name eq {}", odata_literal(person)));
    }
    if let Some(filename) = &filters.filename {
        parts.push(format!("filename eq {}", odata_literal(filename)));
    }
    if parts.is_empty() {
        None
    } else {
        Some(parts.join(" and "))
    }
}

/// Index definition for the CV chunk index.
pub fn index_schema(name: &str, dimensions: usize) -> serde_json::Value {
    let string = |name: &str, filterable: bool| {
        json!({"name": name, "type": "Edm.String", "filterable": filterable, "retrievable": true})
    };
    json!({
        "name": name,
        "fields": [
            {"name": "id", "type": "Edm.String", "key": true, "filterable": true},
            string("document_id", true),
            string("filename", true),
            string("chunk_id", false),
            {"name": "chunk_index", "type": "Edm.Int32", "filterable": false, "sortable": true},
            string("upload_date", false),
            {"name": "content", "type": "Edm.String", "searchable": true},
            {"name": "person_name", "type": "Edm.String", "searchable": true, "filterable": true, "facetable": true},
            string("section", true),
            string("info_type", true),
            {"name": "size_bytes", "type": "Edm.Int64", "filterable": false},
            string("blob_name", false),
            {
                "name": VECTOR_FIELD,
                "type": "Collection(Edm.Single)",
                "searchable": true,
                "dimensions": dimensions,
                "vectorSearchProfile": VECTOR_PROFILE
            }
        ],
        "vectorSearch": {
            "algorithms": [{"name": "hnsw-config", "kind": "hnsw"}],
            "profiles": [{"name": VECTOR_PROFILE, "algorithm": "hnsw-config"}]
        }
    })
}

// ─── Client ──────────────────────────────────────────────

impl AzureSearchStore {
    pub fn new(http: reqwest::Client, config: SearchConfig, embedding_dim: usize) -> Self {
        Self {
            http,
            config,
            embedding_dim,
        }
    }

    fn index_url(&self, path: &str) -> String {
        format!(
            "{}/indexes/{}{path}?api-version={}",
            self.config.endpoint.trim_end_matches('/'),
            self.config.index_name,
            self.config.api_version
        )
    }

    fn api_key(&self) -> &str {
        self.config.api_key.as_deref().unwrap_or_default()
    }

    /// Create the index, or update its definition if it already exists.
    pub async fn initialize_index(&self) -> Result<()> {
        let resp = self
            .http
            .put(self.index_url(""))
            .header("api-key", self.api_key())
            .json(&index_schema(&self.config.index_name, self.embedding_dim))
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(AdapterError::from_response(SERVICE, resp).await);
        }
        tracing::info!("Index {} ready", self.config.index_name);
        Ok(())
    }

    async fn search(&self, request: &SearchRequest<'_>) -> Result<SearchResponse> {
        let resp = self
            .http
            .post(self.index_url("/docs/search"))
            .header("api-key", self.api_key())
            .json(request)
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(AdapterError::from_response(SERVICE, resp).await);
        }
        resp.json()
            .await
            .map_err(|e| AdapterError::Decode(format!("search response: {e}")))
    }

    async fn index_batch<T: Serialize>(&self, actions: Vec<T>) -> Result<Vec<String>> {
        let resp = self
            .http
            .post(self.index_url("/docs/index"))
            .header("api-key", self.api_key())
            .json(&IndexBatch { value: actions })
            .send()
            .await?;

        // 207 means some actions failed; the per-key results say which.
        if !resp.status().is_success() {
            return Err(AdapterError::from_response(SERVICE, resp).await);
        }
        let body: IndexBatchResponse = resp
            .json()
            .await
            .map_err(|e| AdapterError::Decode(format!("index response: {e}")))?;

        if let Some(failed) = body.value.iter().find(|r| !r.status) {
            return Err(AdapterError::Upstream {
                service: SERVICE.to_string(),
                status: 207,
                body: format!(
                    "{}: {}",
                    failed.key,
                    failed.error_message.as_deref().unwrap_or("indexing failed")
                ),
            });
        }
        Ok(body.value.into_iter().map(|r| r.key).collect())
    }
}

#[async_trait]
impl VectorStorePort for AzureSearchStore {
    async fn add_documents(&self, chunks: Vec<ChunkRecord>) -> Result<Vec<String>> {
        let mut ids = Vec::with_capacity(chunks.len());
        for batch in chunks.chunks(INDEX_BATCH) {
            let actions: Vec<IndexAction> = batch.iter().map(IndexAction::from).collect();
            ids.extend(self.index_batch(actions).await?);
        }
        tracing::info!("{} chunks added to index {}", ids.len(), self.config.index_name);
        Ok(ids)
    }

    async fn similarity_search(
        &self,
        query_embedding: &[f32],
        top_k: usize,
        filters: Option<&SearchFilters>,
        query_text: Option<&str>,
    ) -> Result<Vec<VectorDocument>> {
        let request = SearchRequest {
            search: query_text.filter(|q| !q.trim().is_empty()),
            filter: filters.and_then(odata_filter),
            select: Some(SELECT_FIELDS),
            top: top_k,
            vector_queries: vec![VectorQuery {
                kind: "vector",
                vector: query_embedding,
                k: top_k * 2,
                fields: VECTOR_FIELD,
            }],
            ..Default::default()
        };

        let response = self.search(&request).await?;
        let mut docs: Vec<VectorDocument> =
            response.value.into_iter().map(VectorDocument::from).collect();
        docs.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));

        tracing::debug!(hits = docs.len(), "similarity search");
        Ok(docs)
    }

    async fn delete_by_document_id(&self, document_id: &str) -> Result<usize> {
        let request = SearchRequest {
            search: Some("*"),
            filter: Some(format!("document_id eq {}", odata_literal(document_id))),
            select: Some("id"),
            top: LIST_LIMIT,
            ..Default::default()
        };
        let keys: Vec<String> = self
            .search(&request)
            .await?
            .value
            .into_iter()
            .map(|c| c.id)
            .collect();

        if keys.is_empty() {
            return Ok(0);
        }

        let actions: Vec<serde_json::Value> = keys
            .iter()
            .map(|id| json!({"@search.action": "delete", "id": id}))
            .collect();
        let deleted = self.index_batch(actions).await?.len();
        tracing::info!("Deleted {deleted} chunks of document {document_id}");
        Ok(deleted)
    }

    async fn list_documents(&self) -> Result<Vec<DocumentSummary>> {
        let request = SearchRequest {
            search: Some("*"),
            select: Some(SUMMARY_FIELDS),
            top: LIST_LIMIT,
            ..Default::default()
        };
        let rows = self.search(&request).await?.value;
        Ok(summarize(rows.iter().map(|c| ChunkFacts {
            document_id: &c.document_id,
            filename: &c.filename,
            person_name: &c.person_name,
            upload_date: &c.upload_date,
            size_bytes: c.size_bytes,
            blob_name: c.blob_name.as_deref(),
        })))
    }

    async fn get_document(&self, document_id: &str) -> Result<Option<DocumentSummary>> {
        let request = SearchRequest {
            search: Some("*"),
            filter: Some(format!("document_id eq {}", odata_literal(document_id))),
            select: Some(SUMMARY_FIELDS),
            top: 1,
            count: true,
            ..Default::default()
        };
        let response = self.search(&request).await?;
        Ok(summary_from_response(response))
    }

    async fn document_exists_by_filename(&self, filename: &str) -> Result<bool> {
        let request = SearchRequest {
            search: Some("*"),
            filter: Some(format!("filename eq {}", odata_literal(filename))),
            select: Some("document_id"),
            top: 1,
            ..Default::default()
        };
        let exists = !self.search(&request).await?.value.is_empty();
        if exists {
            tracing::info!("Duplicate document detected: {filename}");
        }
        Ok(exists)
    }

    async fn stats(&self) -> Result<IndexStats> {
        let request = SearchRequest {
            search: Some("*"),
            top: 0,
            count: true,
            facets: vec!["document_id,count:10000", "person_name,count:10000"],
            ..Default::default()
        };
        let response = self.search(&request).await?;
        Ok(stats_from_response(response))
    }
}

/// Summary of one document from a `top=1, count=true` search on its id.
fn summary_from_response(response: SearchResponse) -> Option<DocumentSummary> {
    let count = response.count;
    let first = response.value.into_iter().next()?;
    Some(DocumentSummary {
        document_id: first.document_id,
        filename: first.filename,
        person_name: first.person_name,
        upload_date: first.upload_date,
        size_bytes: first.size_bytes,
        chunk_count: count.map_or(1, |c| c as usize),
        blob_name: first.blob_name,
    })
}

fn stats_from_response(response: SearchResponse) -> IndexStats {
    let distinct = |field: &str| -> usize {
        response
            .facets
            .get(field)
            .map(|values| {
                values
                    .iter()
                    .filter(|v| v.count > 0)
                    .filter_map(|v| v.value.as_str())
                    .collect::<HashSet<_>>()
                    .len()
            })
            .unwrap_or(0)
    };
    IndexStats {
        total_chunks: response.count.unwrap_or(0) as usize,
        unique_documents: distinct("document_id"),
        unique_persons: distinct("person_name"),
        backend: "azure_search".to_string(),
    }
}
