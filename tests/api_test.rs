//! HTTP tests: requests go through the full router with local backends.

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

use cv_rag::api;
use cv_rag::config::Config;
use cv_rag::error::Result;
use cv_rag::models::ChatMessage;
use cv_rag::ports::LlmPort;
use cv_rag::search::VectorStore;
use cv_rag::state::AppState;
use cv_rag::storage::LocalBlobStore;

struct EchoLlm;

#[async_trait]
impl LlmPort for EchoLlm {
    async fn generate_response(
        &self,
        question: &str,
        _context: &[String],
        _history: &[ChatMessage],
    ) -> Result<String> {
        Ok(format!("respuesta: {question}"))
    }

    async fn generate_embeddings(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| vec![t.len() as f32, 1.0]).collect())
    }
}

fn app(dir: &std::path::Path) -> (Router, AppState) {
    let config = Config {
        data_dir: dir.to_path_buf(),
        ..Config::default()
    };
    let vectors = Arc::new(VectorStore::open_or_create(&config.vector_dir()).unwrap());
    let blobs = Arc::new(LocalBlobStore::new(&config.blob_dir(), config.blob.clone()));
    let state = AppState::from_parts(config, Arc::new(EchoLlm), vectors, blobs);
    (api::router(state.clone()), state)
}

async fn body_json(resp: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn json_request(method: &str, uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn multipart_request(uri: &str, filename: &str, content: &[u8]) -> Request<Body> {
    let boundary = "cvragboundary";
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            "content-type",
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(body))
        .unwrap()
}

#[tokio::test]
async fn test_health_reports_local_backend() {
    let dir = tempfile::tempdir().unwrap();
    let (app, _) = app(dir.path());

    let resp = app
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let body = body_json(resp).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["environment"], "development");
    assert_eq!(body["vector_store"]["backend"], "local");
    assert_eq!(body["active_sessions"], 0);
}

#[tokio::test]
async fn test_empty_query_is_422() {
    let dir = tempfile::tempdir().unwrap();
    let (app, _) = app(dir.path());

    let resp = app
        .oneshot(json_request("POST", "/api/v1/query", r#"{"query":"  "}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = body_json(resp).await;
    assert_eq!(body["detail"], "La consulta no puede estar vacía");
}

#[tokio::test]
async fn test_query_then_clear_session() {
    let dir = tempfile::tempdir().unwrap();
    let (app, state) = app(dir.path());
    state
        .documents
        .ingest_text("ana.pdf", "ANA SILVA\nEXPERIENCIA\nPython en Acme", 40, None)
        .await
        .unwrap();

    let resp = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/v1/query",
            r#"{"query":"¿Qué sabe Ana Silva?","session_id":"abc"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["session_id"], "abc");
    assert_eq!(body["metadata"]["search_mode"], "specific");
    assert_eq!(body["sources"][0]["filename"], "ana.pdf");

    let resp = app
        .clone()
        .oneshot(
            Request::delete("/api/v1/sessions/abc")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await["message"], "Historial limpiado");

    let resp = app
        .oneshot(
            Request::delete("/api/v1/sessions/abc")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_unknown_document_is_404() {
    let dir = tempfile::tempdir().unwrap();
    let (app, _) = app(dir.path());

    let resp = app
        .clone()
        .oneshot(Request::get("/api/v1/documents/nope").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = app
        .oneshot(
            Request::delete("/api/v1/documents/nope")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(resp).await["detail"], "Documento no encontrado");
}

#[tokio::test]
async fn test_list_and_delete_document() {
    let dir = tempfile::tempdir().unwrap();
    let (app, state) = app(dir.path());
    let uploaded = state
        .documents
        .ingest_text("luis.pdf", "Luis Gómez\nHABILIDADES\nFigma", 30, None)
        .await
        .unwrap();

    let resp = app
        .clone()
        .oneshot(Request::get("/api/v1/documents").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body.as_array().map(Vec::len), Some(1));
    assert_eq!(body[0]["person_name"], "Luis Gómez");

    let uri = format!("/api/v1/documents/{}", uploaded.document_id);
    let resp = app
        .oneshot(Request::delete(uri.as_str()).body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["document_id"], uploaded.document_id.as_str());
}

#[tokio::test]
async fn test_upload_rejects_non_pdf() {
    let dir = tempfile::tempdir().unwrap();
    let (app, _) = app(dir.path());

    let resp = app
        .oneshot(multipart_request(
            "/api/v1/documents/upload",
            "notas.txt",
            b"hola",
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(resp).await["detail"], "Solo se aceptan archivos PDF");
}

#[tokio::test]
async fn test_upload_duplicate_filename_is_409() {
    let dir = tempfile::tempdir().unwrap();
    let (app, state) = app(dir.path());
    state
        .documents
        .ingest_text("ana.pdf", "ANA SILVA\nPython", 20, None)
        .await
        .unwrap();

    let resp = app
        .oneshot(multipart_request(
            "/api/v1/documents/upload?upload_to_blob=false",
            "ana.pdf",
            b"%PDF-1.4",
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_storage_stats_shape() {
    let dir = tempfile::tempdir().unwrap();
    let (app, state) = app(dir.path());
    state
        .documents
        .ingest_text("ana.pdf", "ANA SILVA\nPython", 20, None)
        .await
        .unwrap();

    let resp = app
        .oneshot(Request::get("/api/v1/storage/stats").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["summary"]["indexed_documents"], 1);
    assert_eq!(body["summary"]["unique_personas"], 1);
    assert_eq!(body["azure_blob_storage"]["pdfs_count"], 0);
    assert_eq!(body["azure_blob_storage"]["embeddings_count"], 1);
    assert_eq!(body["azure_search"]["backend"], "local");
}
