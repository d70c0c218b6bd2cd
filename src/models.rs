//! Shared models and types
//!
//! Request/response bodies for the HTTP API that do not belong to a
//! single component.

use serde::{Deserialize, Serialize};

/// Standard API response wrapper
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            ok: true,
            data: Some(data),
            error: None,
        }
    }
}

/// `GET /` liveness body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RootStatus {
    pub status: String,
}

impl Default for RootStatus {
    fn default() -> Self {
        Self {
            status: "Detection server is up and running".to_string(),
        }
    }
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_sec: u64,
    pub detector: String,
    pub detector_connected: bool,
    pub active_sessions: u64,
}

/// Query string of `POST /detect`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DetectQuery {
    #[serde(default)]
    pub test_mode: bool,
}

/// Query string of the WebSocket endpoints
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConnectQuery {
    pub client_id: Option<String>,
}

/// Body of `POST /api/notices`
#[derive(Debug, Clone, Deserialize)]
pub struct NoticeRequest {
    pub message: String,
    /// Only sessions opened with this client id; everyone when absent
    pub client_id: Option<String>,
}

/// Result of `POST /api/notices`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NoticeResponse {
    pub delivered: usize,
}
