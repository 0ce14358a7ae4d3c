use serde::{Deserialize, Serialize};
use std::fmt::Write;

use super::{authorize, operation_url, SERVICE};
use crate::config::LlmConfig;
use crate::error::{AdapterError, Result};
use crate::models::ChatMessage;

const SYSTEM_PROMPT: &str = "Eres un asistente útil que responde preguntas basándote en el contexto proporcionado.\n\n\
INSTRUCCIONES:\n\
1. Usa únicamente la información del contexto para responder\n\
2. Si la respuesta no está en el contexto, di \"No tengo información suficiente para responder esa pregunta\"\n\
3. Sé conciso pero completo en tus respuestas\n\
4. Cita las fuentes cuando sea relevante\n\
5. Mantén un tono profesional y amigable";

#[derive(Serialize)]
struct ChatRequest<'a> {
    messages: &'a [ChatMessage],
    temperature: f32,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<&'a str>,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

/// System prompt, prior turns, then one user turn carrying the numbered
/// context blocks and the question.
pub fn build_messages(
    question: &str,
    context: &[String],
    history: &[ChatMessage],
) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(history.len() + 2);
    messages.push(ChatMessage {
        role: "system".to_string(),
        content: SYSTEM_PROMPT.to_string(),
    });
    messages.extend(
        history
            .iter()
            .filter(|m| m.role == "user" || m.role == "assistant")
            .cloned(),
    );
    messages.push(ChatMessage::user(format!(
        "{}\n\nPregunta: {question}",
        build_context_block(context)
    )));
    messages
}

fn build_context_block(context: &[String]) -> String {
    let mut block = String::new();
    for (i, ctx) in context.iter().enumerate() {
        if i > 0 {
            block.push_str("\n\n");
        }
        let _ = write!(block, "[Documento {}]\n{ctx}", i + 1);
    }
    block
}

/// Run a single non-streaming chat completion.
pub async fn complete(
    client: &reqwest::Client,
    config: &LlmConfig,
    messages: Vec<ChatMessage>,
) -> Result<String> {
    let url = operation_url(config, &config.chat_deployment, "chat/completions");
    let req = ChatRequest {
        messages: &messages,
        temperature: config.temperature,
        max_tokens: config.max_tokens,
        model: (config.provider == "openai").then_some(config.chat_deployment.as_str()),
    };

    let resp = authorize(client.post(&url), config)
        .json(&req)
        .send()
        .await?;

    if !resp.status().is_success() {
        return Err(AdapterError::from_response(SERVICE, resp).await);
    }

    let body: ChatResponse = resp
        .json()
        .await
        .map_err(|e| AdapterError::Decode(format!("chat response: {e}")))?;
    first_content(body)
}

fn first_content(body: ChatResponse) -> Result<String> {
    body.choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .ok_or_else(|| AdapterError::Decode("chat completion returned no content".to_string()))
}
