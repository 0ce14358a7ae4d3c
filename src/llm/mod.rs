//! Azure OpenAI adapter for [`LlmPort`]: chat completions and embeddings
//! over the REST API. `provider = "openai"` targets a plain OpenAI-compatible
//! endpoint with the same request bodies.

pub mod chat;
pub mod embeddings;

use async_trait::async_trait;

use crate::config::LlmConfig;
use crate::error::Result;
use crate::models::ChatMessage;
use crate::ports::LlmPort;

pub const SERVICE: &str = "Azure OpenAI";

pub struct AzureOpenAiClient {
    http: reqwest::Client,
    config: LlmConfig,
}

impl AzureOpenAiClient {
    pub fn new(http: reqwest::Client, config: LlmConfig) -> Self {
        Self { http, config }
    }
}

#[async_trait]
impl LlmPort for AzureOpenAiClient {
    async fn generate_response(
        &self,
        question: &str,
        context: &[String],
        history: &[ChatMessage],
    ) -> Result<String> {
        let messages = chat::build_messages(question, context, history);
        chat::complete(&self.http, &self.config, messages).await
    }

    async fn generate_embeddings(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        embeddings::embed_batch(&self.http, &self.config, texts).await
    }
}

/// Build the request URL for an operation ("chat/completions", "embeddings").
fn operation_url(config: &LlmConfig, deployment: &str, operation: &str) -> String {
    let base = config.endpoint.trim_end_matches('/');
    match config.provider.as_str() {
        "openai" => format!("{base}/v1/{operation}"),
        _ => format!(
            "{base}/openai/deployments/{deployment}/{operation}?api-version={}",
            config.api_version
        ),
    }
}

fn authorize(builder: reqwest::RequestBuilder, config: &LlmConfig) -> reqwest::RequestBuilder {
    let key = config.api_key.as_deref().unwrap_or_default();
    match config.provider.as_str() {
        "openai" => builder.header("Authorization", format!("Bearer {key}")),
        _ => builder.header("api-key", key),
    }
}
