//! ffmpeg-backed audio concatenation and export.
//!
//! Clips are concatenated with ffmpeg's concat demuxer: a list file naming
//! each clip in playback order is written next to the output, then ffmpeg
//! re-encodes the joined stream at the episode bitrate with the tags
//! embedded as metadata.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::process::Command;

use super::AudioStitcher;
use crate::domain::EpisodeTags;

/// Export bitrate for stitched episodes.
const EPISODE_BITRATE: &str = "64k";

/// Stitcher shelling out to ffmpeg.
pub struct FfmpegStitcher {
    /// Path to the ffmpeg binary (default: "ffmpeg").
    binary_path: String,
}

impl Default for FfmpegStitcher {
    fn default() -> Self {
        Self::new()
    }
}

impl FfmpegStitcher {
    pub fn new() -> Self {
        Self {
            binary_path: "ffmpeg".to_string(),
        }
    }

    /// Use a custom ffmpeg binary path.
    pub fn with_binary_path(binary_path: impl Into<String>) -> Self {
        Self {
            binary_path: binary_path.into(),
        }
    }

    /// Write the concat demuxer list file for the given clips.
    async fn write_concat_list(clips: &[PathBuf], list_path: &Path) -> Result<()> {
        let mut lines = String::new();
        for clip in clips {
            // concat demuxer quoting: single quotes, embedded quotes escaped
            let escaped = clip.display().to_string().replace('\'', r"'\''");
            lines.push_str(&format!("file '{}'\n", escaped));
        }
        tokio::fs::write(list_path, lines)
            .await
            .with_context(|| format!("Failed to write concat list: {}", list_path.display()))?;
        Ok(())
    }
}

#[async_trait]
impl AudioStitcher for FfmpegStitcher {
    async fn stitch(&self, clips: &[PathBuf], output: &Path, tags: &EpisodeTags) -> Result<()> {
        if clips.is_empty() {
            anyhow::bail!("No clips to stitch");
        }

        let list_path = output.with_extension("concat.txt");
        Self::write_concat_list(clips, &list_path).await?;

        let output_str = output
            .to_str()
            .context("Output path is not valid UTF-8")?;
        let list_str = list_path
            .to_str()
            .context("Concat list path is not valid UTF-8")?;

        let result = Command::new(&self.binary_path)
            .args([
                "-y",
                "-f",
                "concat",
                "-safe",
                "0",
                "-i",
                list_str,
                "-b:a",
                EPISODE_BITRATE,
                "-metadata",
                &format!("title={}", tags.title),
                "-metadata",
                &format!("artist={}", tags.artist),
                "-metadata",
                &format!("album={}", tags.album),
                output_str,
            ])
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await
            .context("Failed to spawn ffmpeg")?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            let exit_code = result.status.code().unwrap_or(-1);
            anyhow::bail!(
                "ffmpeg failed with exit code {}: {}",
                exit_code,
                stderr.trim()
            );
        }

        Ok(())
    }
}
