//! Immutable media tool configuration.
//!
//! Built once at startup by the API crate and shared behind an `Arc`; nothing
//! in this crate reads the environment directly.

use std::path::PathBuf;
use std::time::Duration;

/// Default per-invocation timeout for external tools (5 minutes).
pub const DEFAULT_COMMAND_TIMEOUT_SECS: u64 = 300;

/// Paths and limits for the external media tools.
#[derive(Debug, Clone)]
pub struct MediaConfig {
    /// Transcoder binary (default: `ffmpeg` on `PATH`).
    pub ffmpeg_bin: PathBuf,
    /// Inspector binary (default: `ffprobe` on `PATH`).
    pub ffprobe_bin: PathBuf,
    /// Upper bound on a single external tool invocation.
    pub command_timeout: Duration,
    /// Directory under which per-request workspaces are created.
    pub work_dir: PathBuf,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            ffmpeg_bin: PathBuf::from("ffmpeg"),
            ffprobe_bin: PathBuf::from("ffprobe"),
            command_timeout: Duration::from_secs(DEFAULT_COMMAND_TIMEOUT_SECS),
            work_dir: std::env::temp_dir(),
        }
    }
}
