use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use storyreel_core::error::CoreError;

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] for pipeline errors and adds HTTP-specific variants.
/// Implements [`IntoResponse`] to produce `{ "detail", "code" }` JSON bodies.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A pipeline error from `storyreel_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A malformed request (e.g. undecodable multipart body).
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// The request body exceeded `MAX_UPLOAD_BYTES`.
    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            AppError::Core(core) => match core {
                CoreError::MissingInput(_) => (StatusCode::BAD_REQUEST, "MISSING_INPUT"),
                CoreError::CommandExecution { .. } => (StatusCode::BAD_GATEWAY, "COMMAND_FAILED"),
                CoreError::DurationUnavailable { .. } => {
                    (StatusCode::UNPROCESSABLE_ENTITY, "DURATION_UNAVAILABLE")
                }
                CoreError::Timeout { .. } => (StatusCode::GATEWAY_TIMEOUT, "TIMEOUT"),
                CoreError::Unexpected(_) => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "UNEXPECTED_ERROR")
                }
            },
            AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            AppError::PayloadTooLarge(_) => (StatusCode::PAYLOAD_TOO_LARGE, "PAYLOAD_TOO_LARGE"),
        };

        let message = match &self {
            AppError::Core(core) => core.to_string(),
            AppError::BadRequest(msg) | AppError::PayloadTooLarge(msg) => msg.clone(),
        };

        if status.is_server_error() {
            tracing::error!(error = %message, code, "Render request failed");
        } else {
            tracing::warn!(error = %message, code, "Render request rejected");
        }

        let body = json!({
            "detail": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}
