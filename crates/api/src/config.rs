use std::path::PathBuf;
use std::time::Duration;

use storyreel_core::config::{MediaConfig, DEFAULT_COMMAND_TIMEOUT_SECS};

/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
/// In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `900`). Renders are slow.
    pub request_timeout_secs: u64,
    /// Maximum accepted request body in bytes (default: 200 MiB).
    pub max_upload_bytes: usize,
    /// External tool paths, per-command timeout and workspace root.
    pub media: MediaConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                    |
    /// |------------------------|----------------------------|
    /// | `HOST`                 | `0.0.0.0`                  |
    /// | `PORT`                 | `3000`                     |
    /// | `CORS_ORIGINS`         | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS` | `900`                      |
    /// | `MAX_UPLOAD_BYTES`     | `209715200`                |
    /// | `FFMPEG_BIN`           | `ffmpeg`                   |
    /// | `FFPROBE_BIN`          | `ffprobe`                  |
    /// | `COMMAND_TIMEOUT_SECS` | `300`                      |
    /// | `WORK_DIR`             | system temp directory      |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "900".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let max_upload_bytes: usize = std::env::var("MAX_UPLOAD_BYTES")
            .unwrap_or_else(|_| (200 * 1024 * 1024).to_string())
            .parse()
            .expect("MAX_UPLOAD_BYTES must be a valid usize");

        let command_timeout_secs: u64 = std::env::var("COMMAND_TIMEOUT_SECS")
            .unwrap_or_else(|_| DEFAULT_COMMAND_TIMEOUT_SECS.to_string())
            .parse()
            .expect("COMMAND_TIMEOUT_SECS must be a valid u64");

        let defaults = MediaConfig::default();
        let media = MediaConfig {
            ffmpeg_bin: env_path("FFMPEG_BIN").unwrap_or(defaults.ffmpeg_bin),
            ffprobe_bin: env_path("FFPROBE_BIN").unwrap_or(defaults.ffprobe_bin),
            command_timeout: Duration::from_secs(command_timeout_secs),
            work_dir: env_path("WORK_DIR").unwrap_or(defaults.work_dir),
        };

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            max_upload_bytes,
            media,
        }
    }
}

/// Non-empty env var as a path.
fn env_path(key: &str) -> Option<PathBuf> {
    std::env::var_os(key)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}
