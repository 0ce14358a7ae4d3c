use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::error::AdapterError;

/// API-layer error type
#[derive(Debug)]
pub enum ApiError {
    /// 400 - Bad request (invalid input)
    BadRequest(String),

    /// 404 - Unknown document or session
    NotFound(String),

    /// 409 - Duplicate upload
    Conflict(String),

    /// 422 - Request parsed but its content is unusable
    Unprocessable(String),

    /// 429 - Vendor quota exceeded
    RateLimited(String),

    /// 502 - A vendor call failed
    BadGateway(String),

    /// 503 - A backend is not configured
    Unavailable(String),

    /// 500 - Internal error
    Internal(String),
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
    detail: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type, detail) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg),
            ApiError::Unprocessable(msg) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "unprocessable_entity", msg)
            }
            ApiError::RateLimited(msg) => (StatusCode::TOO_MANY_REQUESTS, "rate_limited", msg),
            ApiError::BadGateway(msg) => (StatusCode::BAD_GATEWAY, "upstream_error", msg),
            ApiError::Unavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, "unavailable", msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", msg),
        };

        if status.is_server_error() {
            tracing::error!("{error_type}: {detail}");
        }

        (
            status,
            Json(ErrorBody {
                error: error_type,
                detail,
            }),
        )
            .into_response()
    }
}

// Input errors become 400 by default; handlers that answer 422 map them
// with `ApiError::unprocessable`.
impl From<AdapterError> for ApiError {
    fn from(err: AdapterError) -> Self {
        match err {
            AdapterError::InvalidInput(msg) => ApiError::BadRequest(msg),
            AdapterError::NotFound(msg) => ApiError::NotFound(msg),
            AdapterError::Conflict(msg) => ApiError::Conflict(msg),
            AdapterError::RateLimited(service) => {
                ApiError::RateLimited(format!("{service}: cuota excedida, intenta más tarde"))
            }
            AdapterError::NotConfigured(what) => {
                ApiError::Unavailable(format!("{what} no está configurado"))
            }
            e @ (AdapterError::Unauthorized(_)
            | AdapterError::Upstream { .. }
            | AdapterError::Transport(_)
            | AdapterError::Decode(_)) => ApiError::BadGateway(e.to_string()),
            e @ (AdapterError::Io(_) | AdapterError::Json(_)) => ApiError::Internal(e.to_string()),
        }
    }
}

impl ApiError {
    /// Like `From`, but invalid input answers 422.
    pub fn unprocessable(err: AdapterError) -> Self {
        match err {
            AdapterError::InvalidInput(msg) => ApiError::Unprocessable(msg),
            other => other.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(err: AdapterError) -> StatusCode {
        ApiError::from(err).into_response().status()
    }

    #[test]
    fn test_adapter_errors_map_to_status() {
        assert_eq!(status_of(AdapterError::InvalidInput("x".into())), StatusCode::BAD_REQUEST);
        assert_eq!(status_of(AdapterError::NotFound("x".into())), StatusCode::NOT_FOUND);
        assert_eq!(status_of(AdapterError::Conflict("x".into())), StatusCode::CONFLICT);
        assert_eq!(
            status_of(AdapterError::RateLimited("Azure OpenAI".into())),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            status_of(AdapterError::Unauthorized("Azure OpenAI".into())),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            status_of(AdapterError::Upstream {
                service: "Azure AI Search".into(),
                status: 500,
                body: "boom".into()
            }),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            status_of(AdapterError::NotConfigured("Azure AI Search".into())),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn test_unprocessable_only_changes_invalid_input() {
        let resp =
            ApiError::unprocessable(AdapterError::InvalidInput("vacía".into())).into_response();
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let resp = ApiError::unprocessable(AdapterError::NotFound("x".into())).into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
