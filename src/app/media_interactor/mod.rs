// Media interactor - Metadata, whole-video downloads and transcripts

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::app::workspace::{PublishedArtifact, RunWorkspace};
use crate::domain::errors::*;
use crate::domain::model::*;
use crate::ports::*;
use crate::utils::round2;

pub const ANALYSIS_MESSAGE: &str = "YouTube metadata retrieved successfully";

/// Result of a metadata lookup
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisResponse {
    pub analysis: String,
    pub metadata: VideoMetadata,
    pub processing_time: f64,
}

/// Downloaded file whose ownership passes to the caller
#[derive(Debug, Clone, PartialEq)]
pub struct DownloadedMedia {
    pub path: PathBuf,
    pub content_type: &'static str,
    pub file_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TranscriptResponse {
    pub transcript: Vec<TranscriptCue>,
}

/// Interactor for the collaborator features around clipping
pub struct MediaInteractor {
    metadata_port: Option<Arc<dyn MetadataPort>>,
    download_port: Arc<dyn MediaDownloadPort>,
    transcript_port: Arc<dyn TranscriptPort>,
    fs_port: Arc<dyn FsPort>,
    log_port: Arc<dyn LogPort>,
    temp_dir: PathBuf,
    output_dir: PathBuf,
}

impl MediaInteractor {
    pub fn new(
        metadata_port: Option<Arc<dyn MetadataPort>>,
        download_port: Arc<dyn MediaDownloadPort>,
        transcript_port: Arc<dyn TranscriptPort>,
        fs_port: Arc<dyn FsPort>,
        log_port: Arc<dyn LogPort>,
        temp_dir: PathBuf,
        output_dir: PathBuf,
    ) -> Self {
        Self {
            metadata_port,
            download_port,
            transcript_port,
            fs_port,
            log_port,
            temp_dir,
            output_dir,
        }
    }

    /// Look up title, statistics and duration of a video
    pub async fn analyze(&self, url: &str) -> Result<AnalysisResponse, DomainError> {
        let started = Instant::now();
        let video_id = VideoId::from_reference(url)?;
        let metadata_port = self.metadata_port.as_ref().ok_or_else(|| {
            DomainError::InternalError("metadata lookup is not configured".to_string())
        })?;

        let metadata = metadata_port.lookup(&video_id).await?;
        self.log_port
            .log_event(
                &LogEvent::new(LogLevel::Info, "metadata retrieved")
                    .with("video_id", &video_id)
                    .with("title", &metadata.title),
            )
            .await;

        Ok(AnalysisResponse {
            analysis: ANALYSIS_MESSAGE.to_string(),
            metadata,
            processing_time: round2(started.elapsed().as_secs_f64()),
        })
    }

    /// Download the whole video (or its audio) into the output directory
    pub async fn download(
        &self,
        url: &str,
        format: DownloadFormat,
        cancel: CancellationToken,
    ) -> Result<DownloadedMedia, DomainError> {
        source_url(url)?;
        let run_id = RunId::new();
        let workspace = RunWorkspace::create(&self.temp_dir, run_id)?;

        let result = self.download_in(&workspace, url, format, &cancel).await;
        if let Err(e) = workspace.close().await {
            self.log_port.warn(&e.to_string()).await;
        }
        let (published, file_name) = result?;

        // no await from here on: the caller owns the file once we return
        Ok(DownloadedMedia {
            path: published.release().path,
            content_type: format.content_type(),
            file_name,
        })
    }

    async fn download_in(
        &self,
        workspace: &RunWorkspace,
        url: &str,
        format: DownloadFormat,
        cancel: &CancellationToken,
    ) -> Result<(PublishedArtifact, String), DomainError> {
        let run_id = workspace.run_id();
        let stem = format!("{}_download", run_id);
        let produced = self
            .download_port
            .download(url, format, workspace.path(), &stem, cancel)
            .await?;

        let extension = produced
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or(format.extension())
            .to_string();
        let file_name = run_id.file_name("download", &extension);

        self.fs_port.create_directory(&self.output_dir).await?;
        let path = self.output_dir.join(&file_name);
        self.fs_port.move_file(&produced, &path).await?;
        let published = PublishedArtifact::new(FinalArtifact { run_id, path });

        self.log_port
            .log_event(
                &LogEvent::new(LogLevel::Info, "download finished")
                    .with("run_id", run_id)
                    .with("format", format.extension())
                    .with("file", &file_name),
            )
            .await;

        Ok((published, file_name))
    }

    /// Timed caption cues of a video
    pub async fn transcript(
        &self,
        url: &str,
        cancel: CancellationToken,
    ) -> Result<TranscriptResponse, DomainError> {
        let video_id = VideoId::from_reference(url)?;
        let workspace = RunWorkspace::create(&self.temp_dir, RunId::new())?;

        let result = self
            .transcript_port
            .transcript(&video_id, workspace.path(), &cancel)
            .await;
        if let Err(e) = workspace.close().await {
            self.log_port.warn(&e.to_string()).await;
        }

        let transcript = result?;
        self.log_port
            .debug(&format!(
                "Transcript for {}: {} cue(s)",
                video_id,
                transcript.len()
            ))
            .await;
        Ok(TranscriptResponse { transcript })
    }

    /// Remove a handed-over file once it has been delivered
    pub async fn discard(&self, path: &Path) {
        if let Err(e) = self.fs_port.delete_file(path).await {
            self.log_port
                .warn(&format!("Could not remove {}: {}", path.display(), e))
                .await;
        }
    }
}
