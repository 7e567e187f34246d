//! Handler for `POST /process`.
//!
//! Accepts a multipart form with `story`, `audio` and `video` (required) and
//! `title` (optional), renders inside a fresh [`Workspace`], and streams the
//! result back as an `mp4` attachment.

use std::pin::Pin;
use std::task::{Context, Poll};

use axum::body::{Body, Bytes};
use axum::extract::multipart::MultipartError;
use axum::extract::{Multipart, State};
use axum::http::{header, StatusCode};
use axum::response::Response;
use futures::Stream;
use storyreel_core::error::CoreError;
use storyreel_core::naming::DEFAULT_TITLE;
use storyreel_core::pipeline::{self, RenderRequest, Upload};
use storyreel_core::workspace::Workspace;
use tokio_util::io::ReaderStream;

use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// Response body streaming the rendered file.
///
/// Owns the [`Workspace`] the file lives in, so the directory is removed only
/// once the body has been sent or the client has gone away.
pub struct WorkspaceStream {
    inner: ReaderStream<tokio::fs::File>,
    _workspace: Workspace,
}

impl WorkspaceStream {
    pub fn new(file: tokio::fs::File, workspace: Workspace) -> Self {
        Self {
            inner: ReaderStream::new(file),
            _workspace: workspace,
        }
    }
}

impl Stream for WorkspaceStream {
    type Item = std::io::Result<Bytes>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}

/// POST /process
///
/// On success the workspace is handed to a [`WorkspaceStream`]. On any error
/// it is dropped before the error response is built and nothing partial is
/// returned.
pub async fn process(
    State(state): State<AppState>,
    multipart: Multipart,
) -> AppResult<Response> {
    let request = read_form(multipart).await?;
    let media = &state.config.media;

    let workspace = Workspace::create(&media.work_dir).await?;
    tracing::info!(
        workspace = %workspace.path().display(),
        title = %request.title,
        "Render started"
    );

    let rendered = pipeline::render(media, &workspace, request).await?;

    let file = tokio::fs::File::open(&rendered.path)
        .await
        .map_err(CoreError::from)?;
    let stream = WorkspaceStream::new(file, workspace);

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "video/mp4")
        .header(header::CONTENT_LENGTH, rendered.size_bytes.to_string())
        .header(
            header::CONTENT_DISPOSITION,
            content_disposition(&rendered.filename),
        )
        .body(Body::from_stream(stream))
        .map_err(|e| AppError::Core(CoreError::Unexpected(e.to_string())))
}

/// Collect the form fields into a [`RenderRequest`].
///
/// Unknown fields are ignored. A missing `story`, or a missing or empty
/// `audio`/`video` upload, yields [`CoreError::MissingInput`].
async fn read_form(mut multipart: Multipart) -> AppResult<RenderRequest> {
    let mut story: Option<String> = None;
    let mut title: Option<String> = None;
    let mut narration: Option<Upload> = None;
    let mut background: Option<Upload> = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "story" => story = Some(read_text(field).await?),
            "title" => title = Some(read_text(field).await?),
            "audio" => narration = Some(read_upload(field).await?),
            "video" => background = Some(read_upload(field).await?),
            _ => {} // ignore unknown fields
        }
    }

    let story = story.ok_or_else(|| missing("story"))?;
    let narration = narration
        .filter(|u| !u.data.is_empty())
        .ok_or_else(|| missing("audio"))?;
    let background = background
        .filter(|u| !u.data.is_empty())
        .ok_or_else(|| missing("video"))?;
    let title = title
        .filter(|t| !t.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_TITLE.to_string());

    Ok(RenderRequest {
        story,
        narration,
        background,
        title,
    })
}

async fn read_text(field: axum::extract::multipart::Field<'_>) -> AppResult<String> {
    field.text().await.map_err(multipart_error)
}

async fn read_upload(field: axum::extract::multipart::Field<'_>) -> AppResult<Upload> {
    let filename = field.file_name().map(str::to_string);
    let data = field.bytes().await.map_err(multipart_error)?;
    Ok(Upload {
        filename,
        data: data.to_vec(),
    })
}

/// Body-limit violations keep their 413; everything else is a bad request.
fn multipart_error(err: MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(err.body_text())
    } else {
        AppError::BadRequest(err.body_text())
    }
}

fn missing(field: &str) -> AppError {
    AppError::Core(CoreError::MissingInput(format!("'{field}' field")))
}

/// `Content-Disposition` for an already-sanitized filename.
///
/// Header values must be visible ASCII, so non-ASCII titles get an
/// underscore-substituted `filename` plus an RFC 5987 `filename*`.
fn content_disposition(filename: &str) -> String {
    if filename.is_ascii() {
        return format!("attachment; filename=\"{filename}\"");
    }

    let fallback: String = filename
        .chars()
        .map(|c| if c.is_ascii() { c } else { '_' })
        .collect();
    let mut encoded = String::new();
    for byte in filename.bytes() {
        if byte.is_ascii_alphanumeric() || b"-_.".contains(&byte) {
            encoded.push(byte as char);
        } else {
            encoded.push_str(&format!("%{byte:02X}"));
        }
    }
    format!("attachment; filename=\"{fallback}\"; filename*=UTF-8''{encoded}")
}
