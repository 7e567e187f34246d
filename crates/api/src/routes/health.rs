use axum::extract::State;
use axum::{routing::get, Json, Router};
use serde::Serialize;
use storyreel_core::ffmpeg;

use crate::state::AppState;

/// Health check response payload.
#[derive(Serialize)]
pub struct HealthResponse {
    /// `ok` when both media tools run, `degraded` otherwise.
    pub status: &'static str,
    /// Crate version from Cargo.toml.
    pub version: &'static str,
    pub ffmpeg_available: bool,
    pub ffprobe_available: bool,
}

/// GET /health -- returns service and media tool health.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let media = &state.config.media;
    let (ffmpeg_available, ffprobe_available) = tokio::join!(
        ffmpeg::tool_available(&media.ffmpeg_bin, media),
        ffmpeg::tool_available(&media.ffprobe_bin, media),
    );

    let status = if ffmpeg_available && ffprobe_available {
        "ok"
    } else {
        "degraded"
    };

    Json(HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION"),
        ffmpeg_available,
        ffprobe_available,
    })
}

pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
