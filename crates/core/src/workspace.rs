//! Scoped per-request workspace.
//!
//! A [`Workspace`] owns a uniquely-named temporary directory holding every
//! input, intermediate and output file of one render. The directory and its
//! contents are removed when the guard is dropped, on success and failure
//! alike.

use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::error::CoreError;

/// Directory name prefix, handy when inspecting a work root.
pub const WORKSPACE_PREFIX: &str = "storyreel-";

/// Longest extension carried over from an upload's filename.
const MAX_EXTENSION_LEN: usize = 5;

#[derive(Debug)]
pub struct Workspace {
    dir: TempDir,
}

impl Workspace {
    /// Create a fresh workspace under `root` (created if missing).
    ///
    /// Directory creation runs on the blocking pool.
    pub async fn create(root: &Path) -> Result<Self, CoreError> {
        let root = root.to_path_buf();
        let dir = tokio::task::spawn_blocking(move || {
            std::fs::create_dir_all(&root)?;
            tempfile::Builder::new()
                .prefix(WORKSPACE_PREFIX)
                .tempdir_in(&root)
        })
        .await
        .map_err(|e| CoreError::Unexpected(format!("workspace task failed: {e}")))??;
        tracing::debug!(path = %dir.path().display(), "Workspace created");
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Narration upload, keeping a safe extension from the client filename.
    pub fn narration_path(&self, client_filename: Option<&str>) -> PathBuf {
        self.dir
            .path()
            .join(format!("narration.{}", safe_extension(client_filename, "mp3")))
    }

    /// Background clip upload, keeping a safe extension from the client filename.
    pub fn source_video_path(&self, client_filename: Option<&str>) -> PathBuf {
        self.dir
            .path()
            .join(format!("source.{}", safe_extension(client_filename, "mp4")))
    }

    pub fn subtitle_path(&self) -> PathBuf {
        self.dir.path().join("captions.srt")
    }

    pub fn portrait_path(&self) -> PathBuf {
        self.dir.path().join("portrait.mp4")
    }

    pub fn output_path(&self) -> PathBuf {
        self.dir.path().join("final.mp4")
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        tracing::debug!(path = %self.dir.path().display(), "Removing workspace");
    }
}

/// Lowercased alphanumeric extension of `filename`, or `default`.
fn safe_extension(filename: Option<&str>, default: &str) -> String {
    filename
        .and_then(|name| Path::new(name).extension())
        .and_then(|ext| ext.to_str())
        .filter(|ext| {
            !ext.is_empty()
                && ext.len() <= MAX_EXTENSION_LEN
                && ext.chars().all(|c| c.is_ascii_alphanumeric())
        })
        .map(str::to_ascii_lowercase)
        .unwrap_or_else(|| default.to_string())
}
