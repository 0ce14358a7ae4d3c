use axum::extract::State;
use axum::Json;
use serde_json::{json, Value};

use super::error::ApiError;
use crate::state::AppState;

/// PDFs listed in the stats sample.
const SAMPLE_PDFS: usize = 10;

/// GET /api/v1/storage/stats - Index and blob storage totals
pub async fn stats(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let search = state.vectors.stats().await?;
    let pdfs = state.blobs.list_pdfs().await?;
    let embeddings = state.blobs.list_embedding_documents().await?;

    Ok(Json(json!({
        "azure_search": search,
        "azure_blob_storage": {
            "pdfs_count": pdfs.len(),
            "embeddings_count": embeddings.len(),
            "sample_pdfs": &pdfs[..pdfs.len().min(SAMPLE_PDFS)],
        },
        "summary": {
            "total_cv_pdfs": pdfs.len(),
            "indexed_documents": search.unique_documents,
            "total_chunks": search.total_chunks,
            "unique_personas": search.unique_persons,
        },
    })))
}
