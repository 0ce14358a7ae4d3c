use axum::extract::State;
use axum::Json;
use serde_json::{json, Value};

use crate::state::AppState;

/// GET /health - Liveness plus vector store stats; always 200
pub async fn health(State(state): State<AppState>) -> Json<Value> {
    let vector_store = match state.vectors.stats().await {
        Ok(stats) => json!(stats),
        Err(e) => {
            tracing::warn!("Vector store stats unavailable: {e}");
            json!({ "error": e.to_string() })
        }
    };

    Json(json!({
        "status": "healthy",
        "environment": state.config.environment,
        "version": env!("CARGO_PKG_VERSION"),
        "vector_store": vector_store,
        "active_sessions": state.rag.active_sessions(),
    }))
}
