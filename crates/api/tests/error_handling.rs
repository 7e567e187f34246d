//! Tests for `AppError` → HTTP response mapping.
//!
//! These tests verify that each `AppError` variant produces the correct HTTP
//! status code, error code, and `detail` message. They do NOT need an HTTP
//! server -- they call `IntoResponse` directly on `AppError` values.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use http_body_util::BodyExt;
use storyreel_api::error::AppError;
use storyreel_core::error::CoreError;

/// Helper: convert an `AppError` into its status code and parsed JSON body.
async fn error_to_response(err: AppError) -> (StatusCode, serde_json::Value) {
    let response = err.into_response();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    (status, json)
}

#[tokio::test]
async fn missing_input_returns_400() {
    let err = AppError::Core(CoreError::MissingInput("'audio' field".into()));

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "MISSING_INPUT");
    assert_eq!(json["detail"], "Missing required input: 'audio' field");
}

#[tokio::test]
async fn command_failure_returns_502_with_stderr() {
    let err = AppError::Core(CoreError::CommandExecution {
        command: "ffmpeg -y -i source.mp4".into(),
        stderr: "source.mp4: Invalid data found".into(),
    });

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(json["code"], "COMMAND_FAILED");
    assert_eq!(
        json["detail"],
        "Command failed: ffmpeg -y -i source.mp4: source.mp4: Invalid data found"
    );
}

#[tokio::test]
async fn duration_unavailable_returns_422() {
    let err = AppError::Core(CoreError::DurationUnavailable {
        path: "/w/narration.mp3".into(),
    });

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(json["code"], "DURATION_UNAVAILABLE");
    assert_eq!(
        json["detail"],
        "Could not determine media duration of /w/narration.mp3"
    );
}

#[tokio::test]
async fn timeout_returns_504() {
    let err = AppError::Core(CoreError::Timeout {
        command: "ffmpeg -y".into(),
        timeout_secs: 300,
    });

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
    assert_eq!(json["code"], "TIMEOUT");
    assert_eq!(json["detail"], "Command timed out after 300s: ffmpeg -y");
}

#[tokio::test]
async fn unexpected_error_returns_500() {
    let err = AppError::Core(CoreError::from(std::io::Error::other("disk full")));

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["code"], "UNEXPECTED_ERROR");
    assert_eq!(json["detail"], "Unexpected error: disk full");
}

#[tokio::test]
async fn bad_request_returns_400() {
    let err = AppError::BadRequest("malformed multipart body".into());

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "BAD_REQUEST");
    assert_eq!(json["detail"], "malformed multipart body");
}

#[tokio::test]
async fn payload_too_large_returns_413() {
    let err = AppError::PayloadTooLarge("length limit exceeded".into());

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(json["code"], "PAYLOAD_TOO_LARGE");
    assert_eq!(json["detail"], "length limit exceeded");
}
