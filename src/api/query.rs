use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use super::error::ApiError;
use crate::models::{CvDetail, QueryRequest, QueryResponse};
use crate::state::AppState;

/// POST /api/v1/query - Answer a question from the indexed CVs
pub async fn query(
    State(state): State<AppState>,
    Json(req): Json<QueryRequest>,
) -> Result<Json<QueryResponse>, ApiError> {
    let response = state
        .rag
        .query(req)
        .await
        .map_err(ApiError::unprocessable)?;
    Ok(Json(response))
}

/// DELETE /api/v1/sessions/{id} - Forget a conversation
pub async fn clear_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    if !state.rag.clear_history(&session_id) {
        return Err(ApiError::NotFound("Sesión no encontrada".to_string()));
    }
    Ok(Json(json!({
        "message": "Historial limpiado",
        "session_id": session_id,
    })))
}

#[derive(Debug, Deserialize)]
pub struct CvDetailParams {
    #[serde(default)]
    pub name: String,
}

/// GET /api/v1/cv/detail?name= - Structured summary of one candidate
pub async fn cv_detail(
    State(state): State<AppState>,
    Query(params): Query<CvDetailParams>,
) -> Result<Json<CvDetail>, ApiError> {
    let detail = state
        .rag
        .cv_detail(&params.name)
        .await
        .map_err(ApiError::unprocessable)?;
    Ok(Json(detail))
}
