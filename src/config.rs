use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server bind address
    pub bind_addr: String,
    /// Deployment environment name, reported on /health
    pub environment: String,
    /// Default log filter when RUST_LOG is not set
    pub log_level: String,
    /// Where the local fallback backends persist their data
    pub data_dir: PathBuf,
    pub llm: LlmConfig,
    pub search: SearchConfig,
    pub blob: BlobConfig,
    pub rag: RagConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// "azure" or "openai"
    pub provider: String,
    /// Resource endpoint, e.g. https://my-resource.openai.azure.com
    pub endpoint: String,
    pub api_key: Option<String>,
    /// Chat deployment (Azure) or model name (OpenAI)
    pub chat_deployment: String,
    /// Embedding deployment (Azure) or model name (OpenAI)
    pub embedding_deployment: String,
    pub api_version: String,
    pub temperature: f32,
    pub max_tokens: u32,
    /// Embedding vector dimension, used for the search index schema
    pub embedding_dim: usize,
}

/// Azure AI Search settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    pub endpoint: String,
    pub api_key: Option<String>,
    pub index_name: String,
    pub api_version: String,
}

/// Azure Blob Storage settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlobConfig {
    pub connection_string: Option<String>,
    pub container_pdfs: String,
    pub container_embeddings: String,
    pub container_cache: String,
}

/// Chunking and retrieval parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RagConfig {
    /// Characters per chunk
    pub chunk_size: usize,
    /// Characters shared by consecutive chunks (must be < chunk_size)
    pub chunk_overlap: usize,
    /// Chunks retrieved for a specific (single person) query
    pub top_k: usize,
    /// Chunks retrieved before grouping for a general query
    pub general_top_k: usize,
    /// Distinct profiles returned for a general query
    pub max_profiles: usize,
    /// Session messages sent back to the LLM
    pub max_history_turns: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8000".to_string(),
            environment: "development".to_string(),
            log_level: "info".to_string(),
            data_dir: PathBuf::from("./data"),
            llm: LlmConfig::default(),
            search: SearchConfig::default(),
            blob: BlobConfig::default(),
            rag: RagConfig::default(),
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "azure".to_string(),
            endpoint: String::new(),
            api_key: None,
            chat_deployment: "gpt-4o".to_string(),
            embedding_deployment: "text-embedding-ada-002".to_string(),
            api_version: "2024-06-01".to_string(),
            temperature: 0.7,
            max_tokens: 1000,
            embedding_dim: 1536,
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            api_key: None,
            index_name: "pdf-knowledge-base".to_string(),
            api_version: "2024-07-01".to_string(),
        }
    }
}

impl Default for BlobConfig {
    fn default() -> Self {
        Self {
            connection_string: None,
            container_pdfs: "pdfs".to_string(),
            container_embeddings: "embeddings".to_string(),
            container_cache: "cache".to_string(),
        }
    }
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
            top_k: 5,
            general_top_k: 30,
            max_profiles: 10,
            max_history_turns: 10,
        }
    }
}

/// Unset, empty and `<PLACEHOLDER>` values all count as missing.
fn is_configured(value: &str) -> bool {
    let v = value.trim();
    !v.is_empty() && !(v.starts_with('<') && v.ends_with('>'))
}

fn env_value(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| is_configured(v))
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    env_value(name).and_then(|v| v.trim().parse().ok())
}

impl Config {
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(addr) = env_value("BIND_ADDR") {
            config.bind_addr = addr;
        }
        if let Some(env) = env_value("ENVIRONMENT") {
            config.environment = env;
        }
        if let Some(level) = env_value("LOG_LEVEL") {
            config.log_level = level.to_lowercase();
        }
        if let Some(dir) = env_value("DATA_DIR") {
            config.data_dir = PathBuf::from(dir);
        }

        // Azure OpenAI
        if let Some(provider) = env_value("LLM_PROVIDER") {
            config.llm.provider = provider.to_lowercase();
        }
        if let Some(endpoint) = env_value("AZURE_OPENAI_ENDPOINT") {
            config.llm.endpoint = endpoint.trim_end_matches('/').to_string();
        }
        config.llm.api_key = env_value("AZURE_OPENAI_API_KEY");
        if let Some(name) = env_value("AZURE_OPENAI_DEPLOYMENT_NAME") {
            config.llm.chat_deployment = name;
        }
        if let Some(name) = env_value("AZURE_OPENAI_EMBEDDING_DEPLOYMENT") {
            config.llm.embedding_deployment = name;
        }
        if let Some(version) = env_value("AZURE_OPENAI_API_VERSION") {
            config.llm.api_version = version;
        }
        if let Some(t) = env_parse("LLM_TEMPERATURE") {
            config.llm.temperature = t;
        }
        if let Some(m) = env_parse("LLM_MAX_TOKENS") {
            config.llm.max_tokens = m;
        }
        if let Some(d) = env_parse("EMBEDDING_DIM") {
            config.llm.embedding_dim = d;
        }

        // Azure AI Search
        if let Some(endpoint) = env_value("AZURE_SEARCH_ENDPOINT") {
            config.search.endpoint = endpoint.trim_end_matches('/').to_string();
        }
        config.search.api_key = env_value("AZURE_SEARCH_API_KEY");
        if let Some(name) = env_value("AZURE_SEARCH_INDEX_NAME") {
            config.search.index_name = name;
        }
        if let Some(version) = env_value("AZURE_SEARCH_API_VERSION") {
            config.search.api_version = version;
        }

        // Azure Blob Storage
        config.blob.connection_string = env_value("AZURE_STORAGE_CONNECTION_STRING");
        if let Some(name) = env_value("AZURE_STORAGE_CONTAINER_PDFS") {
            config.blob.container_pdfs = name;
        }
        if let Some(name) = env_value("AZURE_STORAGE_CONTAINER_EMBEDDINGS") {
            config.blob.container_embeddings = name;
        }
        if let Some(name) = env_value("AZURE_STORAGE_CONTAINER_CACHE") {
            config.blob.container_cache = name;
        }

        // RAG
        if let Some(v) = env_parse("CHUNK_SIZE") {
            config.rag.chunk_size = v;
        }
        if let Some(v) = env_parse("CHUNK_OVERLAP") {
            config.rag.chunk_overlap = v;
        }
        if let Some(v) = env_parse("TOP_K_RESULTS") {
            config.rag.top_k = v;
        }
        if let Some(v) = env_parse("GENERAL_TOP_K") {
            config.rag.general_top_k = v;
        }
        if let Some(v) = env_parse("MAX_PROFILES") {
            config.rag.max_profiles = v;
        }
        if let Some(v) = env_parse("MAX_HISTORY_TURNS") {
            config.rag.max_history_turns = v;
        }

        config
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.rag.chunk_size == 0 {
            anyhow::bail!("CHUNK_SIZE must be greater than 0");
        }
        if self.rag.chunk_overlap >= self.rag.chunk_size {
            anyhow::bail!(
                "CHUNK_OVERLAP ({}) must be smaller than CHUNK_SIZE ({})",
                self.rag.chunk_overlap,
                self.rag.chunk_size
            );
        }
        if self.rag.top_k == 0 {
            anyhow::bail!("TOP_K_RESULTS must be greater than 0");
        }
        if !matches!(self.llm.provider.as_str(), "azure" | "openai") {
            anyhow::bail!("Unknown LLM provider: {}", self.llm.provider);
        }
        Ok(())
    }

    pub fn search_configured(&self) -> bool {
        is_configured(&self.search.endpoint)
            && self.search.api_key.as_deref().is_some_and(is_configured)
    }

    pub fn blob_configured(&self) -> bool {
        self.blob
            .connection_string
            .as_deref()
            .is_some_and(is_configured)
    }

    pub fn llm_configured(&self) -> bool {
        is_configured(&self.llm.endpoint)
    }

    pub fn vector_dir(&self) -> PathBuf {
        self.data_dir.join("vectors")
    }

    pub fn blob_dir(&self) -> PathBuf {
        self.data_dir.join("blobs")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_documented_values() {
        let c = Config::default();
        assert_eq!(c.rag.chunk_size, 1000);
        assert_eq!(c.rag.chunk_overlap, 200);
        assert_eq!(c.rag.top_k, 5);
        assert_eq!(c.search.index_name, "pdf-knowledge-base");
        assert_eq!(c.blob.container_pdfs, "pdfs");
        assert!(c.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_overlap_not_smaller_than_size() {
        let mut c = Config::default();
        c.rag.chunk_overlap = c.rag.chunk_size;
        assert!(c.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_top_k() {
        let mut c = Config::default();
        c.rag.top_k = 0;
        assert!(c.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_unknown_provider() {
        let mut c = Config::default();
        c.llm.provider = "ollama".into();
        assert!(c.validate().is_err());
    }

    #[test]
    fn test_placeholders_are_not_configured() {
        assert!(!is_configured(""));
        assert!(!is_configured("   "));
        assert!(!is_configured("<TU_AZURE_SEARCH_ENDPOINT>"));
        assert!(is_configured("https://x.search.windows.net"));
    }

    #[test]
    fn test_search_requires_endpoint_and_key() {
        let mut c = Config::default();
        c.search.endpoint = "https://x.search.windows.net".into();
        assert!(!c.search_configured());
        c.search.api_key = Some("k".into());
        assert!(c.search_configured());
    }
}
