//! HTTP surface for the voice-query service.
//!
//! This module owns request parsing, upload extraction, and response
//! formatting while delegating the actual work to [`VoicePipeline`].

use std::sync::Arc;

use axum::extract::{DefaultBodyLimit, Multipart, Request, State};
use axum::http::{header::HeaderValue, HeaderMap, Method, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde_json::json;
use uuid::Uuid;

use crate::config::AppConfig;
use crate::error::AppError;
use crate::pipeline::{UploadedAudio, VoicePipeline, VoiceResponse};

/// Human-readable service name returned by health endpoints.
pub const APP_NAME: &str = "bharatvoice-server";
/// Service version string returned by health endpoints.
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Header carrying a caller-supplied session identifier.
pub const SESSION_HEADER: &str = "session-id";

/// Shared state injected into all route handlers.
pub struct AppState {
    /// Runtime configuration loaded at startup.
    pub cfg: AppConfig,
    /// Request orchestrator shared across requests.
    pub pipeline: Arc<VoicePipeline>,
}

impl AppState {
    /// Constructs shared handler state.
    pub fn new(cfg: AppConfig, pipeline: Arc<VoicePipeline>) -> Self {
        Self { cfg, pipeline }
    }
}

/// Builds the Axum router for all public endpoints.
pub fn build_router(state: Arc<AppState>) -> Router {
    // Body limit sits above the pipeline's own cap so oversize uploads get
    // the pipeline's 413 instead of a multipart read error.
    let body_limit = state.cfg.max_upload_bytes as usize + 64 * 1024;

    Router::new()
        .route("/", get(health))
        .route("/health", get(health))
        .route("/voice", post(voice))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(middleware::from_fn(cors))
        .with_state(state)
}

/// Permissive CORS for browser and emulator clients, including the
/// `session-id` request header. `OPTIONS` preflights short-circuit here.
async fn cors(req: Request, next: Next) -> Response {
    let preflight = req.method() == Method::OPTIONS;
    let mut response = if preflight {
        StatusCode::OK.into_response()
    } else {
        next.run(req).await
    };

    let headers = response.headers_mut();
    headers.insert(
        "Access-Control-Allow-Origin",
        HeaderValue::from_static("*"),
    );
    headers.insert(
        "Access-Control-Allow-Headers",
        HeaderValue::from_static("Origin, X-Requested-With, Content-Type, Accept, session-id"),
    );
    headers.insert(
        "Access-Control-Allow-Methods",
        HeaderValue::from_static("GET, POST, OPTIONS"),
    );
    response
}

/// Static service metadata (`GET /health`, `GET /`). No business logic.
async fn health() -> Json<serde_json::Value> {
    Json(json!({
        "status": "healthy",
        "service": APP_NAME,
        "version": APP_VERSION,
        "timestamp": Utc::now(),
        "endpoints": {"voice": "POST /voice"},
    }))
}

/// Handles one voice query (`POST /voice`).
async fn voice(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Result<Json<VoiceResponse>, AppError> {
    let session_id = session_id_from(&headers);
    let upload = parse_voice_form(multipart).await?;
    let response = state.pipeline.handle(upload, session_id).await?;
    Ok(Json(response))
}

/// Returns the caller-supplied session id, or a fresh one. Session ids are
/// correlation tokens only; no state is kept across requests.
fn session_id_from(headers: &HeaderMap) -> String {
    headers
        .get(SESSION_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(ToOwned::to_owned)
        .unwrap_or_else(|| Uuid::new_v4().simple().to_string())
}

/// Extracts the `audio` file field from the multipart form.
async fn parse_voice_form(mut multipart: Multipart) -> Result<UploadedAudio, AppError> {
    let mut upload: Option<UploadedAudio> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| AppError::bad_multipart(format!("invalid multipart body: {err}")))?
    {
        let Some(name) = field.name().map(ToOwned::to_owned) else {
            continue;
        };
        if name != "audio" {
            continue;
        }

        let mime = field
            .content_type()
            .map(ToOwned::to_owned)
            .unwrap_or_else(|| "application/octet-stream".to_string());
        let bytes = field
            .bytes()
            .await
            .map_err(|err| AppError::bad_multipart(format!("failed to read audio bytes: {err}")))?;

        upload = Some(UploadedAudio {
            bytes: bytes.to_vec(),
            mime,
        });
    }

    upload.ok_or_else(|| AppError::invalid_upload("no audio file"))
}
