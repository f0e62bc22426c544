//! HTTP Endpoints
//!
//! REST API for the extraction service:
//! - `GET /` serves the upload page
//! - `POST /upload` accepts a multipart document, runs the pipeline and
//!   returns the stored path plus the extracted fields
//! - `GET /uploads/*` serves previously stored documents back to the page

use std::path::Path;

use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::{HeaderValue, Method, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use wire_extract_core::ExtractionResult;

use crate::state::AppState;
use crate::ServerError;

/// Create the application router
pub fn create_router(state: AppState) -> Router {
    let cors_layer = build_cors_layer(
        &state.config.server.cors_origins,
        state.config.server.cors_enabled,
    );
    let max_upload_bytes = state.config.server.max_upload_bytes;

    Router::new()
        .route("/", get(home))
        .route("/upload", post(upload_document))
        .nest_service("/uploads", ServeDir::new(&state.config.upload.dir))
        // Health check
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer)
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .with_state(state)
}

/// Build CORS layer from configured origins
///
/// - If cors_enabled is false, returns a permissive layer (for dev)
/// - If cors_origins is empty, defaults to localhost:3000 for safety
/// - Otherwise, uses the configured origins
fn build_cors_layer(origins: &[String], enabled: bool) -> CorsLayer {
    if !enabled {
        tracing::warn!("CORS is disabled - allowing all origins (NOT FOR PRODUCTION)");
        return CorsLayer::permissive();
    }

    let parsed_origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| {
            origin.parse::<HeaderValue>().ok().or_else(|| {
                tracing::warn!("Invalid CORS origin: {}", origin);
                None
            })
        })
        .collect();

    if parsed_origins.is_empty() {
        tracing::info!("No CORS origins configured, defaulting to localhost:3000");
        return CorsLayer::new()
            .allow_origin("http://localhost:3000".parse::<HeaderValue>().unwrap())
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers(Any);
    }

    tracing::info!("CORS configured with {} origins", parsed_origins.len());
    CorsLayer::new()
        .allow_origin(parsed_origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any)
        .allow_credentials(true)
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = StatusCode::from(&self);
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}

/// Upload page
async fn home() -> Html<&'static str> {
    Html(include_str!("../static/index.html"))
}

/// Upload response
#[derive(Debug, Serialize)]
struct UploadResponse {
    /// Path the stored document is served back under
    pdf_path: String,
    /// Extracted fields
    fields: ExtractionResult,
}

/// Upload endpoint
///
/// Accepts a multipart form with a `file` field, persists it under the
/// upload directory and runs the extraction pipeline on the saved copy.
/// Document errors come back as 422; there is no retry.
async fn upload_document(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ServerError> {
    let mut stored: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ServerError::InvalidRequest(e.to_string()))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let client_name = field.file_name().unwrap_or("upload.pdf").to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| ServerError::InvalidRequest(e.to_string()))?;

        let filename = stored_filename(&client_name, state.config.upload.sanitize_filenames);
        let dir = Path::new(&state.config.upload.dir);
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|e| ServerError::Internal(e.to_string()))?;
        tokio::fs::write(dir.join(&filename), &data)
            .await
            .map_err(|e| ServerError::Internal(e.to_string()))?;

        tracing::info!(
            filename = %filename,
            bytes = data.len(),
            "stored uploaded document"
        );
        stored = Some(filename);
        break;
    }

    let Some(filename) = stored else {
        return Err(ServerError::InvalidRequest(
            "multipart form has no 'file' field".to_string(),
        ));
    };

    let saved_path = Path::new(&state.config.upload.dir).join(&filename);
    let extractor = state.extractor.clone();
    let fields = tokio::task::spawn_blocking(move || extractor.extract(&saved_path))
        .await
        .map_err(|e| ServerError::Internal(e.to_string()))??;

    Ok(Json(UploadResponse {
        pdf_path: format!("/uploads/{}", filename),
        fields,
    }))
}

/// Reduce a client-supplied filename to a safe basename.
///
/// The historical behavior stored the client name verbatim, which lets a
/// crafted name escape the upload directory. Sanitization keeps only the
/// final path component, restricted to ASCII alphanumerics plus `._-`;
/// names with nothing left get a generated one. The verbatim mode survives
/// behind `upload.sanitize_filenames = false` and is rejected in
/// production config.
fn stored_filename(client_name: &str, sanitize: bool) -> String {
    if !sanitize {
        return client_name.to_string();
    }

    let base = Path::new(client_name)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("");

    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_matches('.');

    if cleaned.is_empty() {
        format!("upload-{}.pdf", Uuid::new_v4())
    } else {
        cleaned.to_string()
    }
}

/// Health check
async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Readiness check
///
/// The extractor is constructed before the router, so a serving process is
/// by definition ready; this exists for orchestration probes.
async fn readiness_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ready",
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use ndarray::Array1;
    use std::collections::HashMap;
    use tower::ServiceExt;
    use wire_extract_config::Settings;
    use wire_extract_core::{FieldName, Result};
    use wire_extract_pipeline::{Featurizer, FieldExtractor, LabelEncoder, PredictorStore};

    struct StubStore;

    impl PredictorStore for StubStore {
        fn predict(&self, _field: FieldName, _features: &Array1<f32>) -> Result<f32> {
            Ok(0.0)
        }
    }

    struct StubFeaturizer;

    impl Featurizer for StubFeaturizer {
        fn dim(&self) -> usize {
            1
        }

        fn transform(&self, _text: &str) -> Array1<f32> {
            Array1::zeros(1)
        }
    }

    fn test_state(upload_dir: &str) -> AppState {
        let mut config = Settings::default();
        config.upload.dir = upload_dir.to_string();

        let classes = vec!["USD".to_string()];
        let encoders = HashMap::from([
            (FieldName::FromCurrency, LabelEncoder::new(classes.clone())),
            (FieldName::ToCurrency, LabelEncoder::new(classes.clone())),
            (FieldName::FeeCurrency, LabelEncoder::new(classes)),
        ]);
        let extractor =
            FieldExtractor::new(Box::new(StubFeaturizer), Box::new(StubStore), encoders);

        AppState::new(config, extractor)
    }

    #[tokio::test]
    async fn test_health_check() {
        let dir = tempfile::tempdir().unwrap();
        let app = create_router(test_state(dir.path().to_str().unwrap()));

        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_home_serves_upload_page() {
        let dir = tempfile::tempdir().unwrap();
        let app = create_router(test_state(dir.path().to_str().unwrap()));

        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_upload_without_multipart_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let app = create_router(test_state(dir.path().to_str().unwrap()));

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/upload")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert!(response.status().is_client_error());
    }

    #[tokio::test]
    async fn test_upload_invalid_document_is_unprocessable() {
        let dir = tempfile::tempdir().unwrap();
        let app = create_router(test_state(dir.path().to_str().unwrap()));

        let boundary = "test-boundary";
        let body = format!(
            "--{boundary}\r\n\
             Content-Disposition: form-data; name=\"file\"; filename=\"junk.pdf\"\r\n\
             Content-Type: application/pdf\r\n\r\n\
             this is not a pdf\r\n\
             --{boundary}--\r\n"
        );

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/upload")
                    .header(
                        "content-type",
                        format!("multipart/form-data; boundary={boundary}"),
                    )
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn test_stored_filename_strips_path_traversal() {
        assert_eq!(
            stored_filename("../../etc/passwd", true),
            "passwd".to_string()
        );
        assert_eq!(stored_filename("dir/transfer.pdf", true), "transfer.pdf");
    }

    #[test]
    fn test_stored_filename_replaces_unsafe_characters() {
        assert_eq!(
            stored_filename("my transfer (1).pdf", true),
            "my_transfer__1_.pdf"
        );
    }

    #[test]
    fn test_stored_filename_empty_gets_generated_name() {
        let name = stored_filename("..", true);
        assert!(name.starts_with("upload-"));
        assert!(name.ends_with(".pdf"));
    }

    #[test]
    fn test_stored_filename_verbatim_mode() {
        assert_eq!(
            stored_filename("../traversal.pdf", false),
            "../traversal.pdf"
        );
    }
}
