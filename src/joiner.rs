use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tokio::process::Command;
use tracing::{error, info};

use crate::error::TaleError;

#[async_trait]
pub trait ClipJoiner: Send + Sync {
    /// Concatenates `clips` in order into `dest`, no transitions. Deleting
    /// the consumed inputs afterwards is the caller's job.
    async fn join(&self, clips: &[PathBuf], dest: &Path) -> Result<PathBuf, TaleError>;
}

/// Joins clips with ffmpeg's concat demuxer, stream-copying to avoid a
/// re-encode. The list file lives in a TempDir that is removed on every
/// path, and ffmpeg itself releases the clip handles when it exits.
pub struct FfmpegJoiner;

/// Concat-demuxer list file: one `file '...'` line per clip, input order
/// preserved. Single quotes in paths are escaped per ffmpeg quoting rules.
fn concat_list(clips: &[PathBuf]) -> String {
    clips
        .iter()
        .map(|clip| {
            format!(
                "file '{}'\n",
                clip.display().to_string().replace('\'', r"'\''")
            )
        })
        .collect()
}

#[async_trait]
impl ClipJoiner for FfmpegJoiner {
    async fn join(&self, clips: &[PathBuf], dest: &Path) -> Result<PathBuf, TaleError> {
        if clips.is_empty() {
            return Err(TaleError::Encoding("no clips to join".into()));
        }
        for clip in clips {
            if !clip.exists() {
                return Err(TaleError::Encoding(format!(
                    "input clip {} is missing or unreadable",
                    clip.display()
                )));
            }
        }

        let temp_dir = TempDir::new()
            .map_err(|e| TaleError::Encoding(format!("failed to create temp directory: {e}")))?;
        let list_path = temp_dir.path().join("clips.txt");
        tokio::fs::write(&list_path, concat_list(clips))
            .await
            .map_err(|e| TaleError::Encoding(format!("failed to write concat list: {e}")))?;

        info!("Running ffmpeg to join {} clips", clips.len());
        let output = Command::new("ffmpeg")
            .arg("-f")
            .arg("concat")
            .arg("-safe")
            .arg("0")
            .arg("-i")
            .arg(&list_path)
            .arg("-c")
            .arg("copy")
            .arg("-y")
            .arg(dest)
            .output()
            .await
            .map_err(|e| TaleError::Encoding(format!("failed to execute ffmpeg: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            error!("ffmpeg concat failed: {stderr}");
            return Err(TaleError::Encoding(format!(
                "ffmpeg concat failed: {stderr}"
            )));
        }

        info!("Joined output written to {}", dest.display());
        Ok(dest.to_path_buf())
    }
}
