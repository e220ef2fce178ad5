use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

/// Common error types used across the application.
///
/// Expected no-op outcomes (missing owner, self-comment, no tokens) are not
/// errors and never show up here.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Document store error: {0}")]
    Store(String),

    #[error("Token acquisition failed (status {status}): {body}")]
    TokenAcquisition { status: u16, body: String },

    #[error("Push send failed (status {status}): {body}")]
    PushRejected { status: u16, body: String },

    #[error("Invalid event: {0}")]
    InvalidEvent(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // 5xx lets the platform redeliver the event; 4xx drops it.
        let status = match &self {
            AppError::Transport(_) => StatusCode::BAD_GATEWAY,
            AppError::Store(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::TokenAcquisition { .. } => StatusCode::BAD_GATEWAY,
            AppError::PushRejected { .. } => StatusCode::BAD_GATEWAY,
            AppError::InvalidEvent(_) => StatusCode::BAD_REQUEST,
        };

        let body = json!({ "error": self.to_string() });
        (status, Json(body)).into_response()
    }
}
