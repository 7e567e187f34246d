//! Render pipeline: uploads in, captioned portrait video out.
//!
//! Steps run strictly in order inside the caller's [`Workspace`]:
//!
//! 1. write the uploads
//! 2. read the narration duration (floored at [`MIN_DURATION_SECS`])
//! 3. build cues from the prepared story and write `captions.srt`
//! 4. Stage A, portraitize the background clip
//! 5. Stage B, burn captions and mux the narration
//!
//! Any error aborts the remaining steps; nothing is retried.

use std::path::PathBuf;
use std::time::Instant;

use crate::config::MediaConfig;
use crate::error::CoreError;
use crate::ffmpeg::{self, SubtitleStyle};
use crate::naming;
use crate::subtitles;
use crate::workspace::Workspace;

/// Narration durations below this are raised to it.
pub const MIN_DURATION_SECS: f64 = 1.5;

/// An uploaded file.
#[derive(Debug, Clone)]
pub struct Upload {
    /// Filename as sent by the client; only its extension is used.
    pub filename: Option<String>,
    pub data: Vec<u8>,
}

/// Validated inputs of one render.
#[derive(Debug, Clone)]
pub struct RenderRequest {
    pub story: String,
    pub narration: Upload,
    pub background: Upload,
    pub title: String,
}

/// Result of a successful render. `path` lives inside the workspace.
#[derive(Debug, Clone)]
pub struct RenderedVideo {
    pub path: PathBuf,
    /// Download filename derived from the title.
    pub filename: String,
    pub duration_secs: f64,
    pub cue_count: usize,
    pub size_bytes: u64,
}

/// Run every pipeline step for `request` inside `workspace`.
pub async fn render(
    config: &MediaConfig,
    workspace: &Workspace,
    request: RenderRequest,
) -> Result<RenderedVideo, CoreError> {
    let started = Instant::now();

    let narration_path = workspace.narration_path(request.narration.filename.as_deref());
    let source_path = workspace.source_video_path(request.background.filename.as_deref());
    tokio::fs::write(&narration_path, &request.narration.data).await?;
    tokio::fs::write(&source_path, &request.background.data).await?;
    tracing::info!(
        narration_bytes = request.narration.data.len(),
        video_bytes = request.background.data.len(),
        "Uploads written to workspace"
    );

    let measured = ffmpeg::probe_duration(config, &narration_path).await?;
    let duration_secs = measured.max(MIN_DURATION_SECS);
    tracing::info!(measured, duration_secs, "Narration duration measured");

    let story = subtitles::prepare_story(&request.story);
    let cues = subtitles::build_cues(&story, duration_secs);
    let subtitle_path = workspace.subtitle_path();
    tokio::fs::write(&subtitle_path, subtitles::render_srt(&cues)).await?;
    tracing::info!(cue_count = cues.len(), story_chars = story.chars().count(), "Captions written");

    let portrait_path = workspace.portrait_path();
    let stage_started = Instant::now();
    ffmpeg::run_ffmpeg(
        config,
        &ffmpeg::portrait_args(&source_path, &portrait_path),
        &portrait_path,
    )
    .await?;
    tracing::info!(
        elapsed_ms = stage_started.elapsed().as_millis() as u64,
        "Portrait stage complete"
    );

    let output_path = workspace.output_path();
    let stage_started = Instant::now();
    ffmpeg::run_ffmpeg(
        config,
        &ffmpeg::burn_and_mux_args(
            &portrait_path,
            &narration_path,
            &subtitle_path,
            &output_path,
            &SubtitleStyle::default(),
        ),
        &output_path,
    )
    .await?;
    tracing::info!(
        elapsed_ms = stage_started.elapsed().as_millis() as u64,
        "Caption and narration stage complete"
    );

    let size_bytes = tokio::fs::metadata(&output_path).await?.len();
    tracing::info!(
        size_bytes,
        total_ms = started.elapsed().as_millis() as u64,
        "Render finished"
    );

    Ok(RenderedVideo {
        path: output_path,
        filename: naming::output_filename(&request.title),
        duration_secs,
        cue_count: cues.len(),
        size_bytes,
    })
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use assert_matches::assert_matches;

    use super::*;

    /// Write an executable shell script standing in for ffprobe/ffmpeg.
    fn fake_tool(dir: &Path, name: &str, body: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let path = dir.join(name);
        std::fs::write(&path, format!("#!/bin/sh\n{body}")).expect("write script");
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))
            .expect("chmod script");
        path
    }

    /// Fake ffmpeg writing the captions it was given into its last argument,
    /// so tests can see what Stage B consumed.
    const COPYING_FFMPEG: &str = r#"for a; do last="$a"; done
case "$*" in
  *subtitles=*) cp "$(dirname "$last")/captions.srt" "$last" ;;
  *) printf portrait > "$last" ;;
esac
"#;

    fn request(story: &str) -> RenderRequest {
        RenderRequest {
            story: story.to_string(),
            narration: Upload {
                filename: Some("voice.wav".into()),
                data: b"RIFF".to_vec(),
            },
            background: Upload {
                filename: Some("clip.mov".into()),
                data: b"MOOV".to_vec(),
            },
            title: "Night #2".to_string(),
        }
    }

    #[tokio::test]
    async fn render_runs_all_stages() {
        let tools = tempfile::tempdir().expect("tools");
        let root = tempfile::tempdir().expect("root");
        let config = MediaConfig {
            ffprobe_bin: fake_tool(tools.path(), "ffprobe", "echo 10.0\n"),
            ffmpeg_bin: fake_tool(tools.path(), "ffmpeg", COPYING_FFMPEG),
            work_dir: root.path().to_path_buf(),
            ..MediaConfig::default()
        };
        let workspace = Workspace::create(root.path()).await.expect("workspace");

        let rendered = render(
            &config,
            &workspace,
            request("A creak. Then silence. Then... footsteps."),
        )
        .await
        .expect("render");

        assert_eq!(rendered.filename, "Night 2.mp4");
        assert_eq!(rendered.cue_count, 3);
        assert!((rendered.duration_secs - 10.0).abs() < 1e-9);
        assert!(workspace.path().join("narration.wav").exists());
        assert!(workspace.path().join("source.mov").exists());
        assert!(workspace.portrait_path().exists());

        let srt = std::fs::read_to_string(&rendered.path).expect("read output");
        assert!(srt.ends_with("3\n00:00:06,666 --> 00:00:10,000\nThen... footsteps.\n\n"));
        assert_eq!(rendered.size_bytes, srt.len() as u64);
    }

    #[tokio::test]
    async fn render_floors_short_narration() {
        let tools = tempfile::tempdir().expect("tools");
        let root = tempfile::tempdir().expect("root");
        let config = MediaConfig {
            ffprobe_bin: fake_tool(tools.path(), "ffprobe", "echo 0.4\n"),
            ffmpeg_bin: fake_tool(tools.path(), "ffmpeg", COPYING_FFMPEG),
            ..MediaConfig::default()
        };
        let workspace = Workspace::create(root.path()).await.expect("workspace");

        let rendered = render(&config, &workspace, request("boo"))
            .await
            .expect("render");

        assert!((rendered.duration_secs - MIN_DURATION_SECS).abs() < 1e-9);
        let srt = std::fs::read_to_string(&rendered.path).expect("read output");
        assert_eq!(srt, "1\n00:00:00,000 --> 00:00:01,500\nboo\n\n");
    }

    #[tokio::test]
    async fn render_stops_on_transcoder_failure() {
        let tools = tempfile::tempdir().expect("tools");
        let root = tempfile::tempdir().expect("root");
        let config = MediaConfig {
            ffprobe_bin: fake_tool(tools.path(), "ffprobe", "echo 10.0\n"),
            ffmpeg_bin: fake_tool(tools.path(), "ffmpeg", "echo 'Invalid data found' >&2\nexit 1\n"),
            ..MediaConfig::default()
        };
        let workspace = Workspace::create(root.path()).await.expect("workspace");

        let result = render(&config, &workspace, request("story")).await;

        assert_matches!(
            result,
            Err(CoreError::CommandExecution { stderr, .. }) if stderr.contains("Invalid data found")
        );
        assert!(!workspace.portrait_path().exists());
        assert!(!workspace.output_path().exists());
    }

    #[tokio::test]
    async fn render_reports_unknown_duration() {
        let tools = tempfile::tempdir().expect("tools");
        let root = tempfile::tempdir().expect("root");
        let config = MediaConfig {
            ffprobe_bin: fake_tool(tools.path(), "ffprobe", "exit 1\n"),
            ffmpeg_bin: fake_tool(tools.path(), "ffmpeg", COPYING_FFMPEG),
            ..MediaConfig::default()
        };
        let workspace = Workspace::create(root.path()).await.expect("workspace");

        let result = render(&config, &workspace, request("story")).await;

        assert_matches!(result, Err(CoreError::DurationUnavailable { .. }));
        assert!(!workspace.subtitle_path().exists());
    }
}
