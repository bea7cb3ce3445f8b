//! yt-dlp adapter
//!
//! Source fetching for clip runs, one-shot media downloads and caption
//! retrieval all go through the same downloader binary.

pub mod vtt;

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::adapters::process::{ToolCommand, ToolOutput};
use crate::domain::errors::*;
use crate::domain::model::*;
use crate::ports::*;

/// Format selector for clip sources: best video plus best audio, else best muxed
const SOURCE_FORMAT: &str = "bv*+ba/b";

/// stderr fragments meaning the reference itself cannot be resolved
const UNAVAILABLE_MARKERS: &[&str] = &[
    "video unavailable",
    "private video",
    "this video has been removed",
    "this video is not available",
    "unsupported url",
    "is not a valid url",
    "incomplete youtube id",
    "http error 404",
    "account associated with this video has been terminated",
    "sign in to confirm your age",
    "members-only",
    "name or service not known",
    "temporary failure in name resolution",
    "nodename nor servname provided",
    "failed to resolve",
    "getaddrinfo failed",
];

pub struct YtDlpAdapter {
    ytdlp: PathBuf,
    timeout: Duration,
    languages: Vec<String>,
}

impl YtDlpAdapter {
    pub fn new(ytdlp: PathBuf, timeout: Duration, languages: Vec<String>) -> Self {
        Self {
            ytdlp,
            timeout,
            languages,
        }
    }

    fn command(&self) -> ToolCommand {
        let mut cmd = ToolCommand::new(&self.ytdlp);
        cmd.args(["--no-playlist", "--no-progress", "--newline"])
            .timeout(self.timeout);
        cmd
    }

    /// Arguments that download `url` to `template`, printing the source
    /// duration and then the final path
    pub fn fetch_args(url: &str, template: &Path) -> Vec<String> {
        vec![
            "-f".to_string(),
            SOURCE_FORMAT.to_string(),
            "--merge-output-format".to_string(),
            "mp4".to_string(),
            "-o".to_string(),
            template.to_string_lossy().to_string(),
            "--no-simulate".to_string(),
            "--print".to_string(),
            "after_move:%(duration)s".to_string(),
            "--print".to_string(),
            "after_move:filepath".to_string(),
            url.to_string(),
        ]
    }

    /// Arguments for a whole-file download in `format`
    pub fn download_args(url: &str, format: DownloadFormat, template: &Path) -> Vec<String> {
        let mut args: Vec<String> = match format {
            DownloadFormat::Mp4 => vec!["-f".into(), "best[ext=mp4]/best".into()],
            DownloadFormat::Mp3 => vec![
                "-f".into(),
                "bestaudio/best".into(),
                "-x".into(),
                "--audio-format".into(),
                "mp3".into(),
                "--audio-quality".into(),
                "192K".into(),
            ],
        };
        args.extend([
            "-o".to_string(),
            template.to_string_lossy().to_string(),
            "--no-simulate".to_string(),
            "--print".to_string(),
            "after_move:filepath".to_string(),
            url.to_string(),
        ]);
        args
    }

    /// Arguments that fetch caption tracks only
    pub fn transcript_args(url: &str, languages: &[String], template: &Path) -> Vec<String> {
        vec![
            "--skip-download".to_string(),
            "--write-sub".to_string(),
            "--write-auto-sub".to_string(),
            "--sub-lang".to_string(),
            languages.join(","),
            "--sub-format".to_string(),
            "vtt".to_string(),
            "-o".to_string(),
            template.to_string_lossy().to_string(),
            "--no-warnings".to_string(),
            url.to_string(),
        ]
    }

    /// Run yt-dlp and turn a non-zero exit into a classified error
    async fn run(
        &self,
        args: Vec<String>,
        cancel: &CancellationToken,
    ) -> Result<ToolOutput, DomainError> {
        let output = self.command().args(args).output(cancel).await?;
        if output.success() {
            Ok(output)
        } else {
            Err(classify_failure(&output.stderr))
        }
    }
}

/// Map yt-dlp's stderr to the domain error a caller should see
pub fn classify_failure(stderr: &str) -> DomainError {
    let lowered = stderr.to_lowercase();
    let reason = stderr
        .lines()
        .map(str::trim)
        .filter(|l| l.starts_with("ERROR"))
        .last()
        .or_else(|| stderr.lines().map(str::trim).filter(|l| !l.is_empty()).last())
        .unwrap_or("yt-dlp exited unsuccessfully")
        .to_string();

    if UNAVAILABLE_MARKERS.iter().any(|m| lowered.contains(m)) {
        DomainError::SourceUnavailable(reason)
    } else {
        DomainError::DownloadFailed(reason)
    }
}

/// Duration yt-dlp printed for the source; `NA` when the extractor has none
fn printed_duration(stdout: &str) -> Option<f64> {
    stdout
        .lines()
        .map(str::trim)
        .filter_map(|l| l.parse::<f64>().ok())
        .find(|d| d.is_finite() && *d > 0.0)
}

/// File yt-dlp reported on stdout, else the first file in `dir` named `stem.*`
async fn locate_output(stdout: &str, dir: &Path, stem: &str) -> Option<PathBuf> {
    if let Some(printed) = stdout.lines().map(str::trim).filter(|l| !l.is_empty()).last() {
        let printed = PathBuf::from(printed);
        if tokio::fs::metadata(&printed).await.map(|m| m.is_file()).unwrap_or(false) {
            return Some(printed);
        }
    }

    let prefix = format!("{}.", stem);
    let mut entries = tokio::fs::read_dir(dir).await.ok()?;
    let mut found = Vec::new();
    while let Ok(Some(entry)) = entries.next_entry().await {
        let name = entry.file_name().to_string_lossy().to_string();
        if name.starts_with(&prefix) && !name.ends_with(".part") && !name.ends_with(".ytdl") {
            found.push(entry.path());
        }
    }
    found.sort();
    found.into_iter().next()
}

async fn ensure_non_empty(path: PathBuf) -> Result<PathBuf, DomainError> {
    match tokio::fs::metadata(&path).await {
        Ok(meta) if meta.len() > 0 => Ok(path),
        _ => Err(DomainError::DownloadFailed(format!(
            "{} is missing or empty",
            path.display()
        ))),
    }
}

#[async_trait]
impl SourceFetcherPort for YtDlpAdapter {
    async fn fetch(
        &self,
        reference: &str,
        run_id: RunId,
        work_dir: &Path,
        cancel: &CancellationToken,
    ) -> Result<SourceArtifact, DomainError> {
        let url = source_url(reference)?;
        let stem = format!("{}_source", run_id);
        let template = work_dir.join(format!("{}.%(ext)s", stem));
        info!(run_id = %run_id, url = %url, "fetching source");

        let output = self.run(Self::fetch_args(&url, &template), cancel).await?;
        let path = locate_output(&output.stdout, work_dir, &stem)
            .await
            .ok_or_else(|| {
                DomainError::DownloadFailed("downloader finished without an output file".into())
            })?;
        let path = ensure_non_empty(path).await?;
        let duration = printed_duration(&output.stdout);
        debug!(run_id = %run_id, path = %path.display(), ?duration, "source fetched");

        Ok(SourceArtifact {
            run_id,
            path,
            duration,
        })
    }
}

#[async_trait]
impl MediaDownloadPort for YtDlpAdapter {
    async fn download(
        &self,
        url: &str,
        format: DownloadFormat,
        work_dir: &Path,
        stem: &str,
        cancel: &CancellationToken,
    ) -> Result<PathBuf, DomainError> {
        let url = source_url(url)?;
        let template = work_dir.join(format!("{}.%(ext)s", stem));
        info!(url = %url, format = format.extension(), "downloading media");

        let output = self
            .run(Self::download_args(&url, format, &template), cancel)
            .await?;
        let path = locate_output(&output.stdout, work_dir, stem)
            .await
            .ok_or_else(|| {
                DomainError::DownloadFailed("downloader finished without an output file".into())
            })?;
        ensure_non_empty(path).await
    }
}

#[async_trait]
impl TranscriptPort for YtDlpAdapter {
    async fn transcript(
        &self,
        video_id: &VideoId,
        work_dir: &Path,
        cancel: &CancellationToken,
    ) -> Result<Vec<TranscriptCue>, DomainError> {
        let template = work_dir.join(format!("{}.%(ext)s", video_id));
        self.run(
            Self::transcript_args(&video_id.watch_url(), &self.languages, &template),
            cancel,
        )
        .await?;

        // Prefer tracks in configured language order: `<id>.<lang>.vtt`
        let mut chosen = None;
        for lang in &self.languages {
            let candidate = work_dir.join(format!("{}.{}.vtt", video_id, lang));
            if tokio::fs::metadata(&candidate).await.is_ok() {
                chosen = Some(candidate);
                break;
            }
        }
        if chosen.is_none() {
            chosen = first_vtt(work_dir).await;
        }

        let not_available =
            || DomainError::NotFound("Transcript not available for this video.".to_string());
        let path = chosen.ok_or_else(not_available)?;
        let text = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| DomainError::FsFail(format!("reading {}: {}", path.display(), e)))?;

        let cues = vtt::parse_cues(&text);
        if cues.is_empty() {
            warn!(video_id = %video_id, "caption track had no cues");
            return Err(not_available());
        }
        Ok(cues)
    }
}

async fn first_vtt(dir: &Path) -> Option<PathBuf> {
    let mut entries = tokio::fs::read_dir(dir).await.ok()?;
    let mut found = Vec::new();
    while let Ok(Some(entry)) = entries.next_entry().await {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) == Some("vtt") {
            found.push(path);
        }
    }
    found.sort();
    found.into_iter().next()
}
