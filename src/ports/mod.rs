// Ports - Interface definitions (contracts)

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::domain::errors::*;
use crate::domain::model::*;

/// Port for resolving a video reference into one local media file
#[async_trait]
pub trait SourceFetcherPort: Send + Sync {
    /// Download `reference` into `work_dir`, naming the file from `run_id`.
    ///
    /// Fails with `SourceUnavailable` when the reference cannot be resolved and
    /// with `DownloadFailed` when the downloader ran but produced nothing usable.
    async fn fetch(
        &self,
        reference: &str,
        run_id: RunId,
        work_dir: &Path,
        cancel: &CancellationToken,
    ) -> Result<SourceArtifact, DomainError>;
}

/// Port for extracting one sub-range of a source without re-encoding
#[async_trait]
pub trait SegmentCutterPort: Send + Sync {
    /// Write segment `index` of `source` to `output`
    async fn cut(
        &self,
        source: &SourceArtifact,
        index: usize,
        segment: &Segment,
        output: &Path,
        cancel: &CancellationToken,
    ) -> Result<ClipArtifact, DomainError>;
}

/// Port for merging clips listed in a concat manifest
#[async_trait]
pub trait ConcatenatorPort: Send + Sync {
    /// Concatenate the files named in `manifest` (in file order) into `output`
    async fn concat(
        &self,
        manifest: &Path,
        output: &Path,
        cancel: &CancellationToken,
    ) -> Result<(), DomainError>;
}

/// Port for media probing
#[async_trait]
pub trait ProbePort: Send + Sync {
    /// Container duration in seconds
    async fn probe_duration(
        &self,
        file_path: &Path,
        cancel: &CancellationToken,
    ) -> Result<f64, DomainError>;
}

/// Port for video metadata lookup
#[async_trait]
pub trait MetadataPort: Send + Sync {
    async fn lookup(&self, video_id: &VideoId) -> Result<VideoMetadata, DomainError>;
}

/// Port for caption retrieval
#[async_trait]
pub trait TranscriptPort: Send + Sync {
    /// Timed cues for `video_id`; scratch files go under `work_dir`
    async fn transcript(
        &self,
        video_id: &VideoId,
        work_dir: &Path,
        cancel: &CancellationToken,
    ) -> Result<Vec<TranscriptCue>, DomainError>;
}

/// Port for whole-video or audio-only downloads
#[async_trait]
pub trait MediaDownloadPort: Send + Sync {
    /// Download `url` as `format` into `work_dir` and return the produced file
    async fn download(
        &self,
        url: &str,
        format: DownloadFormat,
        work_dir: &Path,
        stem: &str,
        cancel: &CancellationToken,
    ) -> Result<PathBuf, DomainError>;
}

/// Port for file system operations
#[async_trait]
pub trait FsPort: Send + Sync {
    /// Create directory (including parent directories)
    async fn create_directory(&self, path: &Path) -> Result<(), DomainError>;

    /// Write a whole text file
    async fn write_file(&self, path: &Path, contents: &str) -> Result<(), DomainError>;

    /// Delete file
    async fn delete_file(&self, path: &Path) -> Result<(), DomainError>;

    /// Move file, falling back to copy and delete across filesystems
    async fn move_file(&self, from: &Path, to: &Path) -> Result<(), DomainError>;
}

/// Port for logging and observability
#[async_trait]
pub trait LogPort: Send + Sync {
    /// Log warning message
    async fn warn(&self, message: &str);

    /// Log debug message
    async fn debug(&self, message: &str);

    /// Log structured event
    async fn log_event(&self, event: &LogEvent);
}

/// Log event with structured data
#[derive(Debug, Clone)]
pub struct LogEvent {
    pub level: LogLevel,
    pub message: String,
    pub timestamp: std::time::SystemTime,
    pub context: BTreeMap<String, String>,
}

impl LogEvent {
    pub fn new(level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            timestamp: std::time::SystemTime::now(),
            context: BTreeMap::new(),
        }
    }

    /// Attach a context field
    pub fn with(mut self, key: &str, value: impl ToString) -> Self {
        self.context.insert(key.to_string(), value.to_string());
        self
    }
}

/// Log level enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Parse log level from string
    pub fn parse(level_str: &str) -> Result<Self, DomainError> {
        match level_str.to_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            _ => Err(DomainError::BadArgs(format!(
                "Invalid log level: {}. Valid levels: trace, debug, info, warn, error",
                level_str
            ))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}
