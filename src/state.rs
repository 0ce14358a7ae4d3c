use std::sync::Arc;

use crate::config::Config;
use crate::documents::DocumentManager;
use crate::llm::AzureOpenAiClient;
use crate::ports::{BlobStorePort, LlmPort, VectorStorePort};
use crate::rag::RagAgent;
use crate::search::{AzureSearchStore, VectorStore};
use crate::storage::{AzureBlobStore, LocalBlobStore};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub rag: Arc<RagAgent>,
    pub documents: Arc<DocumentManager>,
    pub vectors: Arc<dyn VectorStorePort>,
    pub blobs: Arc<dyn BlobStorePort>,
}

/// HTTP client shared by every Azure adapter.
pub fn http_client() -> anyhow::Result<reqwest::Client> {
    Ok(reqwest::Client::builder()
        .connect_timeout(std::time::Duration::from_secs(10))
        .timeout(std::time::Duration::from_secs(120))
        .build()?)
}

impl AppState {
    /// Build the adapters from configuration. Azure backends are used when
    /// configured; otherwise data is kept under `data_dir`.
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let http = http_client()?;

        if !config.llm_configured() {
            tracing::warn!("AZURE_OPENAI_ENDPOINT is not set; LLM calls will fail");
        }
        let llm: Arc<dyn LlmPort> =
            Arc::new(AzureOpenAiClient::new(http.clone(), config.llm.clone()));

        let vectors: Arc<dyn VectorStorePort> = if config.search_configured() {
            tracing::info!("Vector store: Azure AI Search ({})", config.search.index_name);
            Arc::new(AzureSearchStore::new(
                http.clone(),
                config.search.clone(),
                config.llm.embedding_dim,
            ))
        } else {
            tracing::warn!(
                "Azure AI Search not configured, using local vector store in {}",
                config.vector_dir().display()
            );
            Arc::new(VectorStore::open_or_create(&config.vector_dir())?)
        };

        let blobs: Arc<dyn BlobStorePort> = if config.blob_configured() {
            Arc::new(AzureBlobStore::new(http, config.blob.clone())?)
        } else {
            tracing::warn!(
                "Azure Blob Storage not configured, storing files in {}",
                config.blob_dir().display()
            );
            Arc::new(LocalBlobStore::new(&config.blob_dir(), config.blob.clone()))
        };

        Ok(Self::from_parts(config, llm, vectors, blobs))
    }

    /// Assemble state from already-built adapters.
    pub fn from_parts(
        config: Config,
        llm: Arc<dyn LlmPort>,
        vectors: Arc<dyn VectorStorePort>,
        blobs: Arc<dyn BlobStorePort>,
    ) -> Self {
        let rag = RagAgent::new(llm.clone(), vectors.clone(), config.rag.clone());
        let documents = DocumentManager::new(
            llm,
            vectors.clone(),
            blobs.clone(),
            config.rag.clone(),
        );
        Self {
            config,
            rag: Arc::new(rag),
            documents: Arc::new(documents),
            vectors,
            blobs,
        }
    }
}
