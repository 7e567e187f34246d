//! FFmpeg/FFprobe command builders and invocations.
//!
//! Argument vectors are built by pure functions so they can be asserted on
//! without the tools installed; [`probe_duration`], [`run_ffmpeg`] and
//! [`tool_available`] execute them through [`crate::command::run`].

use std::ffi::OsString;
use std::path::Path;

use crate::command;
use crate::config::MediaConfig;
use crate::error::CoreError;

/// Portrait output width in pixels.
pub const OUTPUT_WIDTH: u32 = 1080;
/// Portrait output height in pixels.
pub const OUTPUT_HEIGHT: u32 = 1920;

/// x264 preset used by both stages.
const VIDEO_PRESET: &str = "veryfast";
/// x264 constant rate factor used by both stages.
const VIDEO_CRF: &str = "23";
/// AAC bitrate for the narration track.
const AUDIO_BITRATE: &str = "192k";

/// Burned-in caption appearance, rendered as an ASS `force_style` override.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubtitleStyle {
    pub font_name: String,
    pub font_size: u32,
    /// `&HAABBGGRR` fill colour.
    pub primary_colour: String,
    /// `&HAABBGGRR` outline colour.
    pub outline_colour: String,
    pub outline: u32,
    pub shadow: u32,
    /// ASS numpad alignment; 2 is bottom-centre.
    pub alignment: u32,
    pub margin_v: u32,
}

impl Default for SubtitleStyle {
    fn default() -> Self {
        Self {
            font_name: "Arial".to_string(),
            font_size: 14,
            primary_colour: "&H00FFFFFF".to_string(),
            outline_colour: "&H00000000".to_string(),
            outline: 3,
            shadow: 1,
            alignment: 2,
            margin_v: 80,
        }
    }
}

impl SubtitleStyle {
    /// Comma-separated `Key=Value` list for the `force_style` option.
    pub fn force_style(&self) -> String {
        format!(
            "FontName={},FontSize={},PrimaryColour={},OutlineColour={},BorderStyle=1,Outline={},Shadow={},Alignment={},MarginV={}",
            self.font_name,
            self.font_size,
            self.primary_colour,
            self.outline_colour,
            self.outline,
            self.shadow,
            self.alignment,
            self.margin_v,
        )
    }
}

// ---------------------------------------------------------------------------
// Narration duration
// ---------------------------------------------------------------------------

/// `ffprobe` arguments reporting the first audio stream's duration.
pub fn stream_duration_args(path: &Path) -> Vec<OsString> {
    let mut args: Vec<OsString> = [
        "-v",
        "error",
        "-select_streams",
        "a:0",
        "-show_entries",
        "stream=duration",
        "-of",
        "default=noprint_wrappers=1:nokey=1",
    ]
    .iter()
    .map(OsString::from)
    .collect();
    args.push(path.as_os_str().to_owned());
    args
}

/// `ffprobe` arguments reporting the container duration.
pub fn format_duration_args(path: &Path) -> Vec<OsString> {
    let mut args: Vec<OsString> = [
        "-v",
        "error",
        "-show_entries",
        "format=duration",
        "-of",
        "default=noprint_wrappers=1:nokey=1",
    ]
    .iter()
    .map(OsString::from)
    .collect();
    args.push(path.as_os_str().to_owned());
    args
}

/// Parse the seconds value printed by `ffprobe`.
///
/// Takes the first non-empty line; `N/A`, empty output, non-finite and
/// non-positive values are rejected.
pub fn parse_probe_seconds(stdout: &str) -> Option<f64> {
    let line = stdout.lines().map(str::trim).find(|l| !l.is_empty())?;
    let secs = line.parse::<f64>().ok()?;
    (secs.is_finite() && secs > 0.0).then_some(secs)
}

/// Duration of a media file in seconds.
///
/// Asks for the first audio stream's duration, then falls back to the
/// container duration. Fails with [`CoreError::DurationUnavailable`] when
/// neither query yields a usable number. Timeouts are not swallowed.
pub async fn probe_duration(config: &MediaConfig, path: &Path) -> Result<f64, CoreError> {
    for args in [stream_duration_args(path), format_duration_args(path)] {
        match command::run(&config.ffprobe_bin, args.as_slice(), config.command_timeout).await {
            Ok(output) => {
                if let Some(secs) = parse_probe_seconds(&output.stdout) {
                    return Ok(secs);
                }
                tracing::debug!(
                    path = %path.display(),
                    stdout = %output.stdout.trim(),
                    "ffprobe returned no usable duration"
                );
            }
            Err(err @ CoreError::Timeout { .. }) => return Err(err),
            Err(err) => {
                tracing::debug!(path = %path.display(), error = %err, "ffprobe duration query failed");
            }
        }
    }

    Err(CoreError::DurationUnavailable {
        path: path.to_string_lossy().to_string(),
    })
}

// ---------------------------------------------------------------------------
// Transform stages
// ---------------------------------------------------------------------------

/// Escape a path for use as a value inside an ffmpeg filter graph.
///
/// The value is single-quoted at the filter-graph level and then parsed again
/// as an option value, so option separators are backslash-escaped and a
/// literal quote has to leave the quoted section.
pub fn escape_filter_path(path: &Path) -> String {
    let s = path.to_string_lossy();
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'\\''"),
            ':' => out.push_str("\\:"),
            ',' => out.push_str("\\,"),
            other => out.push(other),
        }
    }
    out
}

/// Video filter scaling into the portrait frame and padding it, centred.
pub fn portrait_filter() -> String {
    format!(
        "scale={w}:{h}:force_original_aspect_ratio=decrease,pad={w}:{h}:(ow-iw)/2:(oh-ih)/2,setsar=1",
        w = OUTPUT_WIDTH,
        h = OUTPUT_HEIGHT,
    )
}

/// Stage A: rescale/pad `source` to a silent 1080x1920 video.
pub fn portrait_args(source: &Path, output: &Path) -> Vec<OsString> {
    let mut args: Vec<OsString> = Vec::new();
    push_all(&mut args, &["-y", "-hide_banner", "-loglevel", "error", "-i"]);
    args.push(source.as_os_str().to_owned());
    args.push("-vf".into());
    args.push(portrait_filter().into());
    push_all(&mut args, &["-an"]);
    push_video_encoding(&mut args);
    args.push(output.as_os_str().to_owned());
    args
}

/// Stage B: burn `subtitles` onto `portrait`, attach `narration` as the only
/// audio track, and stop at the shorter stream.
pub fn burn_and_mux_args(
    portrait: &Path,
    narration: &Path,
    subtitles: &Path,
    output: &Path,
    style: &SubtitleStyle,
) -> Vec<OsString> {
    let filter = format!(
        "subtitles=filename='{}':charenc=UTF-8:force_style='{}'",
        escape_filter_path(subtitles),
        style.force_style(),
    );

    let mut args: Vec<OsString> = Vec::new();
    push_all(&mut args, &["-y", "-hide_banner", "-loglevel", "error", "-i"]);
    args.push(portrait.as_os_str().to_owned());
    args.push("-i".into());
    args.push(narration.as_os_str().to_owned());
    args.push("-vf".into());
    args.push(filter.into());
    push_all(&mut args, &["-map", "0:v:0", "-map", "1:a:0"]);
    push_video_encoding(&mut args);
    push_all(
        &mut args,
        &[
            "-c:a",
            "aac",
            "-b:a",
            AUDIO_BITRATE,
            "-shortest",
            "-movflags",
            "+faststart",
        ],
    );
    args.push(output.as_os_str().to_owned());
    args
}

fn push_video_encoding(args: &mut Vec<OsString>) {
    push_all(
        args,
        &[
            "-c:v",
            "libx264",
            "-preset",
            VIDEO_PRESET,
            "-crf",
            VIDEO_CRF,
            "-pix_fmt",
            "yuv420p",
        ],
    );
}

fn push_all(args: &mut Vec<OsString>, items: &[&str]) {
    args.extend(items.iter().map(OsString::from));
}

/// Run `ffmpeg` with `args` and check that it produced `output`.
pub async fn run_ffmpeg(
    config: &MediaConfig,
    args: &[OsString],
    output: &Path,
) -> Result<(), CoreError> {
    command::run(&config.ffmpeg_bin, args, config.command_timeout).await?;

    if !tokio::fs::try_exists(output).await? {
        return Err(CoreError::Unexpected(format!(
            "ffmpeg exited successfully but did not produce {}",
            output.display()
        )));
    }
    Ok(())
}

/// Whether `bin -version` runs successfully.
pub async fn tool_available(bin: &Path, config: &MediaConfig) -> bool {
    command::run(bin, &["-version"], config.command_timeout)
        .await
        .is_ok()
}
