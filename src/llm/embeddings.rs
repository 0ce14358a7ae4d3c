use serde::{Deserialize, Serialize};

use super::{authorize, operation_url, SERVICE};
use crate::config::LlmConfig;
use crate::error::{AdapterError, Result};

/// Maximum bytes to send per text to the embedding API.
/// text-embedding-ada-002 accepts 8 191 tokens; CV prose runs ~4 chars per
/// token, so 8 000 bytes stays well inside the window even for dense text.
const MAX_EMBED_BYTES: usize = 8_000;

/// Azure caps the number of inputs per embeddings request.
const BATCH_SIZE: usize = 16;

/// Truncate `text` to at most `MAX_EMBED_BYTES`, splitting on a UTF-8 char boundary.
fn truncate_for_embedding(text: &str) -> &str {
    if text.len() <= MAX_EMBED_BYTES {
        return text;
    }
    let mut end = MAX_EMBED_BYTES;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    input: Vec<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<&'a str>,
}

#[derive(Deserialize)]
struct EmbedResponse {
    data: Vec<EmbedData>,
}

#[derive(Deserialize)]
struct EmbedData {
    #[serde(default)]
    index: usize,
    embedding: Vec<f32>,
}

/// Generate embeddings for a batch of texts.
pub async fn embed_batch(
    client: &reqwest::Client,
    config: &LlmConfig,
    texts: &[String],
) -> Result<Vec<Vec<f32>>> {
    if texts.is_empty() {
        return Ok(Vec::new());
    }

    let url = operation_url(config, &config.embedding_deployment, "embeddings");
    let model = (config.provider == "openai").then_some(config.embedding_deployment.as_str());
    let mut all_embeddings = Vec::with_capacity(texts.len());

    for chunk in texts.chunks(BATCH_SIZE) {
        let req = EmbedRequest {
            input: chunk.iter().map(|t| truncate_for_embedding(t)).collect(),
            model,
        };

        let resp = authorize(client.post(&url), config)
            .json(&req)
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(AdapterError::from_response(SERVICE, resp).await);
        }

        let body: EmbedResponse = resp
            .json()
            .await
            .map_err(|e| AdapterError::Decode(format!("embeddings response: {e}")))?;

        all_embeddings.extend(order_embeddings(body, chunk.len())?);
    }

    Ok(all_embeddings)
}

/// Sort vectors by their `index` and check one came back per input.
fn order_embeddings(body: EmbedResponse, expected: usize) -> Result<Vec<Vec<f32>>> {
    let mut data = body.data;
    if data.len() != expected {
        return Err(AdapterError::Decode(format!(
            "expected {expected} embeddings, got {}",
            data.len()
        )));
    }
    data.sort_by_key(|d| d.index);
    Ok(data.into_iter().map(|d| d.embedding).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_short_text_untouched() {
        assert_eq!(truncate_for_embedding("hola"), "hola");
    }

    #[test]
    fn test_truncate_respects_char_boundary() {
        let text = "ñ".repeat(MAX_EMBED_BYTES);
        let cut = truncate_for_embedding(&text);
        assert!(cut.len() <= MAX_EMBED_BYTES);
        assert!(text.is_char_boundary(cut.len()));
    }

    #[test]
    fn test_order_embeddings_sorts_by_index() {
        let body: EmbedResponse = serde_json::from_str(
            r#"{"data":[{"index":1,"embedding":[2.0]},{"index":0,"embedding":[1.0]}]}"#,
        )
        .unwrap();
        let out = order_embeddings(body, 2).unwrap();
        assert_eq!(out, vec![vec![1.0], vec![2.0]]);
    }

    #[test]
    fn test_order_embeddings_rejects_short_response() {
        let body: EmbedResponse =
            serde_json::from_str(r#"{"data":[{"index":0,"embedding":[1.0]}]}"#).unwrap();
        assert!(matches!(order_embeddings(body, 2), Err(AdapterError::Decode(_))));
    }

    #[test]
    fn test_request_omits_model_for_azure() {
        let req = EmbedRequest {
            input: vec!["a"],
            model: None,
        };
        let json = serde_json::to_value(&req).unwrap();
        assert!(json.get("model").is_none());
        assert_eq!(json["input"][0], "a");
    }
}
