//! HTTP adapter: axum routes onto the RAG agent and the document manager.

pub mod documents;
pub mod error;
pub mod health;
pub mod query;
pub mod storage;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Largest accepted upload body.
pub const MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route("/api/v1/query", post(query::query))
        .route("/api/v1/sessions/{id}", axum::routing::delete(query::clear_session))
        .route("/api/v1/cv/detail", get(query::cv_detail))
        .route("/api/v1/documents", get(documents::list_documents))
        .route("/api/v1/documents/upload", post(documents::upload_document))
        .route(
            "/api/v1/documents/{id}",
            get(documents::get_document).delete(documents::delete_document),
        )
        .route("/api/v1/storage/stats", get(storage::stats))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
