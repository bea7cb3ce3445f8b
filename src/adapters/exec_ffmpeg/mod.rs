//! FFmpeg execution adapter
//!
//! Stream-copy segment cutting and concat-demuxer assembly. No re-encoding
//! happens here, so cut points snap to the nearest keyframe ffmpeg picks.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::adapters::process::ToolCommand;
use crate::domain::errors::*;
use crate::domain::model::*;
use crate::ports::*;

/// FFmpeg-based cutter and concatenator
pub struct FFmpegAdapter {
    ffmpeg: PathBuf,
    timeout: Duration,
}

impl FFmpegAdapter {
    pub fn new(ffmpeg: PathBuf, timeout: Duration) -> Self {
        Self { ffmpeg, timeout }
    }

    fn command(&self) -> ToolCommand {
        let mut cmd = ToolCommand::new(&self.ffmpeg);
        cmd.args(["-hide_banner", "-nostdin", "-loglevel", "error", "-y"])
            .timeout(self.timeout);
        cmd
    }

    /// Arguments for cutting `segment` out of `source` into `output`
    pub fn cut_args(source: &Path, segment: &Segment, output: &Path) -> Vec<String> {
        vec![
            "-i".to_string(),
            source.to_string_lossy().to_string(),
            "-ss".to_string(),
            Segment::format_bound(segment.start),
            "-to".to_string(),
            Segment::format_bound(segment.end),
            "-c".to_string(),
            "copy".to_string(),
            "-avoid_negative_ts".to_string(),
            "make_zero".to_string(),
            output.to_string_lossy().to_string(),
        ]
    }

    /// Arguments for concatenating the files listed in `manifest` into `output`
    pub fn concat_args(manifest: &Path, output: &Path) -> Vec<String> {
        vec![
            "-f".to_string(),
            "concat".to_string(),
            "-safe".to_string(),
            "0".to_string(),
            "-i".to_string(),
            manifest.to_string_lossy().to_string(),
            "-c".to_string(),
            "copy".to_string(),
            output.to_string_lossy().to_string(),
        ]
    }
}

/// Size of `path`, or why it cannot serve as tool output
async fn non_empty_output(path: &Path) -> Result<u64, String> {
    match tokio::fs::metadata(path).await {
        Ok(meta) if meta.len() > 0 => Ok(meta.len()),
        Ok(_) => Err(format!("{} is empty", path.display())),
        Err(_) => Err(format!("{} was not produced", path.display())),
    }
}

#[async_trait]
impl SegmentCutterPort for FFmpegAdapter {
    async fn cut(
        &self,
        source: &SourceArtifact,
        index: usize,
        segment: &Segment,
        output: &Path,
        cancel: &CancellationToken,
    ) -> Result<ClipArtifact, DomainError> {
        debug!(index, start = segment.start, end = segment.end, "cutting segment");

        self.command()
            .args(Self::cut_args(&source.path, segment, output))
            .execute(cancel)
            .await?;

        let size = non_empty_output(output)
            .await
            .map_err(|message| DomainError::ToolFailed {
                tool: "ffmpeg".to_string(),
                message,
            })?;
        debug!(index, size, "segment cut");

        Ok(ClipArtifact {
            index,
            segment: *segment,
            path: output.to_path_buf(),
        })
    }
}

#[async_trait]
impl ConcatenatorPort for FFmpegAdapter {
    async fn concat(
        &self,
        manifest: &Path,
        output: &Path,
        cancel: &CancellationToken,
    ) -> Result<(), DomainError> {
        let result = self
            .command()
            .args(Self::concat_args(manifest, output))
            .execute(cancel)
            .await;

        match result {
            Ok(_) => {}
            Err(DomainError::ToolFailed { message, .. }) => {
                return Err(DomainError::ConcatFailed {
                    reason: message,
                    failures: Vec::new(),
                })
            }
            Err(other) => return Err(other),
        }

        non_empty_output(output)
            .await
            .map(|_| ())
            .map_err(|reason| DomainError::ConcatFailed {
                reason,
                failures: Vec::new(),
            })
    }
}
