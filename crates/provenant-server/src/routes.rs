//! HTTP routes and handlers

use axum::{
    extract::{rejection::JsonRejection, DefaultBodyLimit, Multipart, State},
    http::{header, request::Parts, HeaderValue, Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use provenant_core::{AnalysisResult, ContentType, ImageInput, VideoInput};
use provenant_detectors::CapabilityReport;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing::debug;

use crate::error::AppError;
use crate::state::AppState;

/// Shortest text accepted for analysis, in characters
pub const MIN_TEXT_CHARS: usize = 20;

pub const DISCLAIMER: &str = "Probabilistic assessment. Not a definitive verdict.";

pub const ALLOWED_IMAGE_TYPES: &[&str] = &["image/png", "image/jpeg", "image/webp", "image/gif"];

pub const ALLOWED_VIDEO_TYPES: &[&str] = &["video/mp4", "video/webm", "video/quicktime"];

/// Headroom over the upload cap for multipart boundaries and part headers
const MULTIPART_OVERHEAD: usize = 64 * 1024;

pub fn create_router(state: AppState) -> Router {
    let body_limit = state.config.max_upload_bytes.saturating_add(MULTIPART_OVERHEAD);
    let cors = cors_layer(&state.config.cors_origins);

    Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(metrics))
        .route("/api/analyze/text", post(analyze_text))
        .route("/api/analyze/image", post(analyze_image))
        .route("/api/analyze/video", post(analyze_video))
        .fallback(fallback)
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let patterns = Arc::new(origins.to_vec());
    let allow_origin = AllowOrigin::predicate(move |origin: &HeaderValue, _: &Parts| {
        origin
            .to_str()
            .map(|origin| origin_allowed(&patterns, origin))
            .unwrap_or(false)
    });

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT, header::AUTHORIZATION])
        .allow_credentials(true)
}

/// Exact match, or `scheme://*.domain` matching any non-empty subdomain
fn origin_allowed(patterns: &[String], origin: &str) -> bool {
    patterns.iter().any(|pattern| match pattern.split_once("*.") {
        Some((scheme, domain)) => origin
            .strip_prefix(scheme)
            .and_then(|host| host.strip_suffix(domain))
            .and_then(|sub| sub.strip_suffix('.'))
            .map(|sub| !sub.is_empty() && !sub.contains('/'))
            .unwrap_or(false),
        None => pattern == origin,
    })
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    models_loaded: bool,
    capabilities: CapabilityReport,
}

async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        models_loaded: state.engine.model_loaded(),
        capabilities: state.engine.capabilities().clone(),
    })
}

async fn metrics(State(state): State<AppState>) -> String {
    state.metrics_handle.render()
}

#[derive(Debug, Deserialize)]
pub struct TextAnalysisRequest {
    pub text: String,
}

/// Successful analysis response
#[derive(Debug, Serialize)]
pub struct AnalysisResponse {
    pub content_type: ContentType,

    #[serde(flatten)]
    pub result: AnalysisResult,

    pub processing_time_ms: u64,

    pub disclaimer: &'static str,
}

impl AnalysisResponse {
    fn new(content_type: ContentType, result: AnalysisResult, start: Instant) -> Self {
        let elapsed = start.elapsed();
        let label = content_type.as_str();

        metrics::histogram!("provenant_analysis_latency_ms", "content_type" => label)
            .record(elapsed.as_secs_f64() * 1000.0);
        metrics::counter!(
            "provenant_predictions_total",
            "content_type" => label,
            "prediction" => result.prediction.as_str()
        )
        .increment(1);

        Self {
            content_type,
            result,
            processing_time_ms: elapsed.as_millis() as u64,
            disclaimer: DISCLAIMER,
        }
    }
}

async fn analyze_text(
    State(state): State<AppState>,
    payload: Result<Json<TextAnalysisRequest>, JsonRejection>,
) -> Result<Json<AnalysisResponse>, AppError> {
    metrics::counter!("provenant_requests_total", "content_type" => "text").increment(1);

    let Json(request) = payload?;
    if request.text.chars().count() < MIN_TEXT_CHARS {
        return Err(AppError::Unprocessable(format!(
            "text must be at least {} characters",
            MIN_TEXT_CHARS
        )));
    }

    let start = Instant::now();
    let result = state.engine.analyze_text(&request.text).await?;
    Ok(Json(AnalysisResponse::new(ContentType::Text, result, start)))
}

async fn analyze_image(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<AnalysisResponse>, AppError> {
    metrics::counter!("provenant_requests_total", "content_type" => "image").increment(1);

    let upload = read_upload(multipart, ALLOWED_IMAGE_TYPES, &state).await?;
    debug!(filename = %upload.filename, mime = %upload.mime, size = upload.bytes.len(), "Image received");

    let start = Instant::now();
    let input = ImageInput::new(upload.bytes, upload.filename, upload.mime);
    let result = state.engine.analyze_image(input).await?;
    Ok(Json(AnalysisResponse::new(ContentType::Image, result, start)))
}

async fn analyze_video(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<AnalysisResponse>, AppError> {
    metrics::counter!("provenant_requests_total", "content_type" => "video").increment(1);

    let upload = read_upload(multipart, ALLOWED_VIDEO_TYPES, &state).await?;
    debug!(filename = %upload.filename, mime = %upload.mime, size = upload.bytes.len(), "Video received");

    let start = Instant::now();
    let input = VideoInput::new(upload.bytes, upload.filename);
    let result = state.engine.analyze_video(input).await?;
    Ok(Json(AnalysisResponse::new(ContentType::Video, result, start)))
}

struct Upload {
    filename: String,
    mime: String,
    bytes: Vec<u8>,
}

/// Read the `file` part, checking its type before buffering and its size while buffering
async fn read_upload(
    mut multipart: Multipart,
    allowed: &[&str],
    state: &AppState,
) -> Result<Upload, AppError> {
    let max_bytes = state.config.max_upload_bytes;

    while let Some(mut field) = multipart.next_field().await? {
        if field.name() != Some("file") {
            continue;
        }

        let filename = field.file_name().unwrap_or("upload").to_string();
        let mime = match field.content_type() {
            Some(declared) => declared.to_string(),
            None => mime_guess::from_path(&filename)
                .first_raw()
                .unwrap_or("application/octet-stream")
                .to_string(),
        };

        if !mime_allowed(&mime, allowed) {
            return Err(AppError::InvalidRequest(format!("Invalid file type: {}", mime)));
        }

        let mut bytes = Vec::new();
        while let Some(chunk) = field.chunk().await? {
            if bytes.len() + chunk.len() > max_bytes {
                return Err(AppError::InvalidRequest(format!(
                    "File too large. Max {}.",
                    state.config.upload_limit_label()
                )));
            }
            bytes.extend_from_slice(&chunk);
        }

        return Ok(Upload {
            filename,
            mime,
            bytes,
        });
    }

    Err(AppError::Unprocessable("missing multipart field 'file'".to_string()))
}

fn mime_allowed(mime: &str, allowed: &[&str]) -> bool {
    let essence = mime.split(';').next().unwrap_or("").trim();
    allowed.iter().any(|a| a.eq_ignore_ascii_case(essence))
}

async fn fallback() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(json!({"error": "not found", "detail": ""})),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_origin_patterns() {
        let patterns = vec![
            "http://localhost:5173".to_string(),
            "https://*.vercel.app".to_string(),
        ];

        assert!(origin_allowed(&patterns, "http://localhost:5173"));
        assert!(origin_allowed(&patterns, "https://provenant-ui.vercel.app"));
        assert!(!origin_allowed(&patterns, "https://vercel.app"));
        assert!(!origin_allowed(&patterns, "http://app.vercel.app"));
        assert!(!origin_allowed(&patterns, "https://app.vercel.app.evil.com"));
        assert!(!origin_allowed(&patterns, "http://localhost:3000"));
    }

    #[test]
    fn test_mime_allowed_ignores_parameters() {
        assert!(mime_allowed("image/png", ALLOWED_IMAGE_TYPES));
        assert!(mime_allowed("IMAGE/JPEG; charset=binary", ALLOWED_IMAGE_TYPES));
        assert!(!mime_allowed("image/svg+xml", ALLOWED_IMAGE_TYPES));
        assert!(mime_allowed("video/quicktime", ALLOWED_VIDEO_TYPES));
        assert!(!mime_allowed("video/x-matroska", ALLOWED_VIDEO_TYPES));
    }
}
