use axum::extract::{Multipart, Path, Query, State};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use super::error::ApiError;
use crate::models::{DocumentMetadata, DocumentUploadResponse};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct UploadParams {
    #[serde(default = "default_upload_to_blob")]
    pub upload_to_blob: bool,
}

fn default_upload_to_blob() -> bool {
    true
}

/// POST /api/v1/documents/upload - Index a PDF sent as multipart field `file`
pub async fn upload_document(
    State(state): State<AppState>,
    Query(params): Query<UploadParams>,
    mut multipart: Multipart,
) -> Result<Json<DocumentUploadResponse>, ApiError> {
    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Invalid multipart body: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field.file_name().unwrap_or_default().to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(format!("Failed to read file: {e}")))?;
        upload = Some((filename, bytes.to_vec()));
        break;
    }

    let (filename, content) =
        upload.ok_or_else(|| ApiError::BadRequest("Falta el campo 'file'".to_string()))?;
    tracing::info!("Upload received: {filename} ({} bytes)", content.len());

    let response = state
        .documents
        .upload_document(content, &filename, params.upload_to_blob)
        .await?;
    Ok(Json(response))
}

/// GET /api/v1/documents - List indexed documents, newest first
pub async fn list_documents(
    State(state): State<AppState>,
) -> Result<Json<Vec<DocumentMetadata>>, ApiError> {
    Ok(Json(state.documents.list_documents().await?))
}

/// GET /api/v1/documents/{id} - One document's metadata
pub async fn get_document(
    State(state): State<AppState>,
    Path(document_id): Path<String>,
) -> Result<Json<DocumentMetadata>, ApiError> {
    Ok(Json(state.documents.get_document(&document_id).await?))
}

/// DELETE /api/v1/documents/{id} - Remove a document and its blobs
pub async fn delete_document(
    State(state): State<AppState>,
    Path(document_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    if !state.documents.delete_document(&document_id).await? {
        return Err(ApiError::NotFound("Documento no encontrado".to_string()));
    }
    Ok(Json(json!({
        "message": "Documento eliminado",
        "document_id": document_id,
    })))
}
