//! Error handling for the Eco Challenge server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Error types
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Frame bytes are not a decodable image
    #[error("Decode error: {0}")]
    Decode(String),

    /// Object detector failed to process the frame
    #[error("Inference error: {0}")]
    Inference(String),

    /// Object detector did not answer in time
    #[error("Inference timed out after {0} ms")]
    InferenceTimeout(u64),

    /// Malformed command or message from a client
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Transport-level failure
    #[error("Connection error: {0}")]
    Connection(String),

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Config error
    #[error("Config error: {0}")]
    Config(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// HTTP client error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl Error {
    /// Stable machine-readable code, shared by HTTP and WebSocket replies
    pub fn code(&self) -> &'static str {
        match self {
            Error::Decode(_) => "DECODE_ERROR",
            Error::Inference(_) => "INFERENCE_ERROR",
            Error::InferenceTimeout(_) => "INFERENCE_TIMEOUT",
            Error::Protocol(_) => "PROTOCOL_ERROR",
            Error::Connection(_) => "CONNECTION_ERROR",
            Error::Validation(_) => "VALIDATION_ERROR",
            Error::NotFound(_) => "NOT_FOUND",
            Error::Config(_) => "CONFIG_ERROR",
            Error::Internal(_) => "INTERNAL_ERROR",
            Error::Serialization(_) => "SERIALIZATION_ERROR",
            Error::Http(_) => "HTTP_ERROR",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            Error::Decode(_) | Error::Protocol(_) | Error::Validation(_) => StatusCode::BAD_REQUEST,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::Inference(_) | Error::Http(_) => StatusCode::BAD_GATEWAY,
            Error::InferenceTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
            Error::Connection(_)
            | Error::Config(_)
            | Error::Internal(_)
            | Error::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Structured reply sent back over a WebSocket
    pub fn to_reply(&self) -> serde_json::Value {
        json!({
            "error_code": self.code(),
            "message": self.to_string()
        })
    }

    /// Whether the classifier failed (as opposed to the input or transport)
    pub fn is_inference_failure(&self) -> bool {
        matches!(
            self,
            Error::Inference(_) | Error::InferenceTimeout(_) | Error::Http(_)
        )
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status();
        let error_code = self.code();
        let message = self.to_string();

        tracing::error!(
            status = %status,
            error_code = %error_code,
            message = %message,
            "Request error"
        );

        let body = Json(json!({
            "error_code": error_code,
            "message": message
        }));

        (status, body).into_response()
    }
}
