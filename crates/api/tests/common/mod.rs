#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Method, Request};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use storyreel_api::config::ServerConfig;
use storyreel_api::router::build_app_router;
use storyreel_api::state::AppState;
use storyreel_core::config::MediaConfig;
use tower::ServiceExt;

/// Multipart boundary used by [`MultipartBody`].
pub const BOUNDARY: &str = "storyreel-test-boundary";

/// Build a test `ServerConfig` with safe defaults around the given media config.
pub fn test_config(media: MediaConfig) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        max_upload_bytes: 10 * 1024 * 1024,
        media,
    }
}

/// Media config pointing at the given tools, rendering under `work_dir`.
pub fn media_config(ffmpeg: PathBuf, ffprobe: PathBuf, work_dir: &Path) -> MediaConfig {
    MediaConfig {
        ffmpeg_bin: ffmpeg,
        ffprobe_bin: ffprobe,
        command_timeout: Duration::from_secs(10),
        work_dir: work_dir.to_path_buf(),
    }
}

/// Build the full application router exactly as `main.rs` does.
pub fn build_test_app(config: ServerConfig) -> Router {
    let state = AppState {
        config: Arc::new(config.clone()),
    };
    build_app_router(state, &config)
}

/// Write an executable shell script standing in for ffprobe/ffmpeg.
pub fn fake_tool(dir: &Path, name: &str, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{body}")).expect("write script");
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))
        .expect("chmod script");
    path
}

/// Fake ffprobe always reporting ten seconds.
pub const TEN_SECOND_FFPROBE: &str = "echo 10.000000\n";

/// Fake ffmpeg that writes a placeholder to its output, and for the caption
/// stage copies the SRT it was given, so tests can inspect the captions.
pub const WRITING_FFMPEG: &str = r#"[ "$1" = "-version" ] && exit 0
for a; do last="$a"; done
case "$*" in
  *subtitles=*) cp "$(dirname "$last")/captions.srt" "$last" ;;
  *) printf portrait > "$last" ;;
esac
"#;

/// Fake ffmpeg that always fails.
pub const FAILING_FFMPEG: &str = "echo 'Error opening input file' >&2\nexit 1\n";

/// Number of entries left in a work root.
pub fn entries(dir: &Path) -> usize {
    std::fs::read_dir(dir).expect("read work dir").count()
}

/// Hand-rolled `multipart/form-data` body.
#[derive(Default)]
pub struct MultipartBody {
    bytes: Vec<u8>,
}

impl MultipartBody {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.bytes.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
        self
    }

    pub fn file(mut self, name: &str, filename: &str, data: &[u8]) -> Self {
        self.bytes.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        self.bytes.extend_from_slice(data);
        self.bytes.extend_from_slice(b"\r\n");
        self
    }

    pub fn finish(mut self) -> Vec<u8> {
        self.bytes
            .extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        self.bytes
    }
}

/// The full set of fields a render needs.
pub fn complete_form(story: &str) -> MultipartBody {
    MultipartBody::new()
        .text("story", story)
        .file("audio", "narration.mp3", b"ID3 fake audio")
        .file("video", "clip.mp4", b"fake video")
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn get(app: Router, uri: &str) -> Response {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn post_multipart(app: Router, uri: &str, body: Vec<u8>) -> Response {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn body_bytes(response: Response) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec()
}

pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = body_bytes(response).await;
    serde_json::from_slice(&bytes).unwrap()
}
