//! API Routes

use axum::{
    extract::{DefaultBodyLimit, Multipart, Query, State},
    routing::{get, post},
    Json, Router,
};

use crate::detection_pipeline::DetectionResult;
use crate::error::{Error, Result};
use crate::models::{ApiResponse, DetectQuery, NoticeRequest, NoticeResponse};
use crate::session_hub::{HubNotice, ServerNoticeMessage, SessionInfo};
use crate::state::AppState;

/// Create API router
pub fn create_router(state: AppState) -> Router {
    let upload_limit = state.config.max_upload_bytes;

    Router::new()
        // Health & Status
        .route("/", get(super::root))
        .route("/healthz", get(super::health_check))
        // Single-shot detection
        .route(
            "/detect",
            post(detect).layer(DefaultBodyLimit::max(upload_limit)),
        )
        // Admin
        .route("/api/sessions", get(list_sessions))
        .route("/api/notices", post(post_notice))
        // WebSocket
        .merge(super::stream_routes::stream_routes())
        .with_state(state)
}

// ========================================
// Detection Handlers
// ========================================

/// POST /detect - classify one uploaded image, no session, no window
async fn detect(
    State(state): State<AppState>,
    Query(query): Query<DetectQuery>,
    multipart: Multipart,
) -> Result<Json<DetectionResult>> {
    let frame = read_upload(multipart).await?;

    tracing::debug!(size = frame.len(), test_mode = query.test_mode, "Single-shot detection");

    let result = state.pipeline.detect_single(frame, query.test_mode).await?;
    Ok(Json(result))
}

/// Take the `file` field, or the first field carrying a file name
async fn read_upload(mut multipart: Multipart) -> Result<Vec<u8>> {
    let mut fallback: Option<Vec<u8>> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| Error::Validation(format!("invalid multipart body: {}", e)))?
    {
        let is_file_field = field.name() == Some("file");
        let has_file_name = field.file_name().is_some();
        if !is_file_field && (!has_file_name || fallback.is_some()) {
            continue;
        }

        let bytes = field
            .bytes()
            .await
            .map_err(|e| Error::Validation(format!("failed to read upload: {}", e)))?;

        if is_file_field {
            return Ok(bytes.to_vec());
        }
        fallback = Some(bytes.to_vec());
    }

    fallback.ok_or_else(|| Error::Validation("no file part in upload".to_string()))
}

// ========================================
// Admin Handlers
// ========================================

/// GET /api/sessions - live session snapshot
async fn list_sessions(State(state): State<AppState>) -> Json<ApiResponse<Vec<SessionInfo>>> {
    Json(ApiResponse::success(state.sessions.sessions().await))
}

/// POST /api/notices - fan a server notice out to sessions
async fn post_notice(
    State(state): State<AppState>,
    Json(req): Json<NoticeRequest>,
) -> Result<Json<ApiResponse<NoticeResponse>>> {
    let message = req.message.trim();
    if message.is_empty() {
        return Err(Error::Validation("message must not be empty".to_string()));
    }

    let notice = HubNotice::ServerNotice(ServerNoticeMessage::now(message));
    let delivered = match req.client_id.as_deref() {
        Some(client_id) => state.sessions.send_to_client(client_id, notice).await,
        None => state.sessions.broadcast(notice).await,
    };

    tracing::info!(
        client_id = ?req.client_id,
        delivered = delivered,
        "Server notice sent"
    );

    Ok(Json(ApiResponse::success(NoticeResponse { delivered })))
}
