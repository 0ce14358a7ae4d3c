use thiserror::Error;

/// Error type shared by every outbound port (LLM, vector store, blob store)
/// and by the application services built on top of them.
#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("{0} rejected the credentials")]
    Unauthorized(String),

    #[error("{0} rate limit or quota exceeded")]
    RateLimited(String),

    #[error("{service} returned {status}: {body}")]
    Upstream {
        service: String,
        status: u16,
        body: String,
    },

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected response: {0}")]
    Decode(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("{0} is not configured")]
    NotConfigured(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, AdapterError>;

impl AdapterError {
    /// Turn a non-success vendor response into the matching variant.
    /// The body is read so that the vendor's own message is kept.
    pub async fn from_response(service: &str, resp: reqwest::Response) -> Self {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        Self::from_status(service, status.as_u16(), body)
    }

    pub fn from_status(service: &str, status: u16, body: String) -> Self {
        match status {
            401 | 403 => AdapterError::Unauthorized(service.to_string()),
            404 => AdapterError::NotFound(if body.is_empty() {
                service.to_string()
            } else {
                body
            }),
            409 => AdapterError::Conflict(body),
            429 => AdapterError::RateLimited(service.to_string()),
            _ => AdapterError::Upstream {
                service: service.to_string(),
                status,
                body,
            },
        }
    }
}
