//! Fake ports and a temp-dir harness shared by the integration tests.
//!
//! The fakes write real files so the pipeline's filesystem behaviour (run
//! directories, manifests, final artifacts) is exercised end to end without
//! yt-dlp or ffmpeg.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tempfile::TempDir;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

use ytclip::adapters::FsLocalAdapter;
use ytclip::app::{
    ArtifactRegistry, ClipInteractor, ClipSettings, DefaultAppContainer, MediaInteractor,
};
use ytclip::domain::errors::DomainError;
use ytclip::domain::model::*;
use ytclip::ports::*;

/// Writes a small source file into the run directory
#[derive(Default)]
pub struct FakeFetcher {
    pub error: Option<DomainError>,
    pub duration: Option<f64>,
    pub calls: AtomicUsize,
}

impl FakeFetcher {
    pub fn failing(error: DomainError) -> Self {
        Self {
            error: Some(error),
            ..Self::default()
        }
    }

    pub fn with_duration(duration: f64) -> Self {
        Self {
            duration: Some(duration),
            ..Self::default()
        }
    }
}

#[async_trait]
impl SourceFetcherPort for FakeFetcher {
    async fn fetch(
        &self,
        _reference: &str,
        run_id: RunId,
        work_dir: &Path,
        _cancel: &CancellationToken,
    ) -> Result<SourceArtifact, DomainError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(error) = &self.error {
            // a half-written download, as a real fetcher might leave behind
            let partial = work_dir.join(run_id.file_name("source", "mp4.part"));
            tokio::fs::write(&partial, b"partial").await.unwrap();
            return Err(error.clone());
        }
        let path = work_dir.join(run_id.file_name("source", "mp4"));
        tokio::fs::write(&path, b"source").await.unwrap();
        Ok(SourceArtifact {
            run_id,
            path,
            duration: self.duration,
        })
    }
}

/// Blocks until cancelled; `started` fires once the fetch is underway
#[derive(Default)]
pub struct WaitingFetcher {
    pub started: Notify,
}

#[async_trait]
impl SourceFetcherPort for WaitingFetcher {
    async fn fetch(
        &self,
        _reference: &str,
        run_id: RunId,
        work_dir: &Path,
        cancel: &CancellationToken,
    ) -> Result<SourceArtifact, DomainError> {
        let path = work_dir.join(run_id.file_name("source", "mp4.part"));
        tokio::fs::write(&path, b"partial").await.unwrap();
        self.started.notify_one();
        cancel.cancelled().await;
        Err(DomainError::Cancelled)
    }
}

/// Writes `clip:<index>:<start>-<end>` for each segment
#[derive(Default)]
pub struct FakeCutter {
    pub failing: HashSet<usize>,
    pub delays: HashMap<usize, Duration>,
    pub cut_indices: Mutex<Vec<usize>>,
}

impl FakeCutter {
    pub fn failing_at(indices: &[usize]) -> Self {
        Self {
            failing: indices.iter().copied().collect(),
            ..Self::default()
        }
    }

    pub fn with_delays(delays: &[(usize, u64)]) -> Self {
        Self {
            delays: delays
                .iter()
                .map(|&(i, ms)| (i, Duration::from_millis(ms)))
                .collect(),
            ..Self::default()
        }
    }

    pub fn cut_indices(&self) -> Vec<usize> {
        let mut indices = self.cut_indices.lock().unwrap().clone();
        indices.sort_unstable();
        indices
    }
}

pub fn clip_line(index: usize, segment: &Segment) -> String {
    format!(
        "clip:{}:{}-{}",
        index,
        Segment::format_bound(segment.start),
        Segment::format_bound(segment.end)
    )
}

#[async_trait]
impl SegmentCutterPort for FakeCutter {
    async fn cut(
        &self,
        _source: &SourceArtifact,
        index: usize,
        segment: &Segment,
        output: &Path,
        _cancel: &CancellationToken,
    ) -> Result<ClipArtifact, DomainError> {
        self.cut_indices.lock().unwrap().push(index);
        if let Some(delay) = self.delays.get(&index) {
            tokio::time::sleep(*delay).await;
        }
        if self.failing.contains(&index) {
            return Err(DomainError::ToolFailed {
                tool: "ffmpeg".to_string(),
                message: format!("exited with exit status: 1: cannot cut segment {}", index),
            });
        }
        tokio::fs::write(output, format!("{}\n", clip_line(index, segment)))
            .await
            .unwrap();
        Ok(ClipArtifact {
            index,
            segment: *segment,
            path: output.to_path_buf(),
        })
    }
}

/// Concatenates the files listed in the manifest, in manifest order
#[derive(Default)]
pub struct FakeConcatenator {
    pub error: Option<DomainError>,
}

#[async_trait]
impl ConcatenatorPort for FakeConcatenator {
    async fn concat(
        &self,
        manifest: &Path,
        output: &Path,
        _cancel: &CancellationToken,
    ) -> Result<(), DomainError> {
        if let Some(error) = &self.error {
            return Err(error.clone());
        }
        let text = tokio::fs::read_to_string(manifest).await.unwrap();
        let mut merged = Vec::new();
        for entry in ConcatManifest::parse(&text).entries() {
            merged.extend(tokio::fs::read(entry).await.unwrap());
        }
        tokio::fs::write(output, merged).await.unwrap();
        Ok(())
    }
}

pub struct FixedProbe(pub f64);

#[async_trait]
impl ProbePort for FixedProbe {
    async fn probe_duration(
        &self,
        _file_path: &Path,
        _cancel: &CancellationToken,
    ) -> Result<f64, DomainError> {
        Ok(self.0)
    }
}

/// Keeps every structured event for assertions
#[derive(Default)]
pub struct RecordingLog {
    pub events: Mutex<Vec<LogEvent>>,
}

impl RecordingLog {
    /// `state` field of every event, in emission order
    pub fn states(&self) -> Vec<String> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.message == "pipeline state changed" || e.level == LogLevel::Error)
            .filter_map(|e| e.context.get("state").cloned())
            .collect()
    }
}

#[async_trait]
impl LogPort for RecordingLog {
    async fn warn(&self, _message: &str) {}
    async fn debug(&self, _message: &str) {}

    async fn log_event(&self, event: &LogEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}

/// Never returns from the event that reports `state`
pub struct StallingLog {
    state: String,
    stalled: AtomicBool,
}

impl StallingLog {
    pub fn at_state(state: &str) -> Self {
        Self {
            state: state.to_string(),
            stalled: AtomicBool::new(false),
        }
    }

    pub fn stalled(&self) -> bool {
        self.stalled.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LogPort for StallingLog {
    async fn warn(&self, _message: &str) {}
    async fn debug(&self, _message: &str) {}

    async fn log_event(&self, event: &LogEvent) {
        if event.context.get("state") == Some(&self.state) {
            self.stalled.store(true, Ordering::SeqCst);
            std::future::pending::<()>().await;
        }
    }
}

/// Temp directories for one test plus a way to build interactors over them
pub struct Harness {
    _root: TempDir,
    pub temp_dir: PathBuf,
    pub output_dir: PathBuf,
    pub log: Arc<RecordingLog>,
}

impl Harness {
    pub fn new() -> Self {
        let root = tempfile::tempdir().unwrap();
        let temp_dir = root.path().join("work");
        let output_dir = root.path().join("out");
        Self {
            _root: root,
            temp_dir,
            output_dir,
            log: Arc::new(RecordingLog::default()),
        }
    }

    pub fn settings(&self, policy: PartialFailurePolicy) -> ClipSettings {
        ClipSettings {
            temp_dir: self.temp_dir.clone(),
            output_dir: self.output_dir.clone(),
            max_parallel_cuts: 4,
            policy,
        }
    }

    pub fn interactor(
        &self,
        fetcher: Arc<dyn SourceFetcherPort>,
        cutter: Arc<dyn SegmentCutterPort>,
        policy: PartialFailurePolicy,
    ) -> ClipInteractor {
        self.interactor_with_concat(fetcher, cutter, Arc::new(FakeConcatenator::default()), policy)
    }

    pub fn interactor_with_concat(
        &self,
        fetcher: Arc<dyn SourceFetcherPort>,
        cutter: Arc<dyn SegmentCutterPort>,
        concatenator: Arc<dyn ConcatenatorPort>,
        policy: PartialFailurePolicy,
    ) -> ClipInteractor {
        ClipInteractor::new(
            fetcher,
            cutter,
            concatenator,
            Arc::new(FsLocalAdapter::new()),
            Arc::clone(&self.log) as Arc<dyn LogPort>,
            self.settings(policy),
        )
    }

    /// Entries left in the scratch directory (empty if it was never created)
    pub fn leftover_work(&self) -> Vec<PathBuf> {
        list_dir(&self.temp_dir)
    }

    pub fn outputs(&self) -> Vec<PathBuf> {
        list_dir(&self.output_dir)
    }
}

impl Default for Harness {
    fn default() -> Self {
        Self::new()
    }
}

pub fn list_dir(dir: &Path) -> Vec<PathBuf> {
    match std::fs::read_dir(dir) {
        Ok(entries) => {
            let mut paths: Vec<PathBuf> = entries.map(|e| e.unwrap().path()).collect();
            paths.sort();
            paths
        }
        Err(_) => Vec::new(),
    }
}

pub fn segments(ranges: &[(f64, f64)]) -> Vec<Segment> {
    ranges.iter().map(|&(s, e)| Segment::new(s, e)).collect()
}

pub fn read_lines(path: &Path) -> Vec<String> {
    std::fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(str::to_string)
        .collect()
}

pub fn sample_metadata() -> VideoMetadata {
    VideoMetadata {
        title: "Never Gonna Give You Up".to_string(),
        description: "Official video".to_string(),
        duration: "PT3M33S".to_string(),
        duration_seconds: Some(213),
        view_count: 1_000,
        like_count: 10,
        channel_name: "Rick Astley".to_string(),
        upload_date: "2009-10-25".to_string(),
    }
}

pub struct FakeMetadata;

#[async_trait]
impl MetadataPort for FakeMetadata {
    async fn lookup(&self, video_id: &VideoId) -> Result<VideoMetadata, DomainError> {
        if video_id.as_str() == "aaaaaaaaaaa" {
            return Err(DomainError::NotFound("Video not found".to_string()));
        }
        Ok(sample_metadata())
    }
}

/// Writes `<stem>.<format>` into the work directory
pub struct FakeDownloader;

#[async_trait]
impl MediaDownloadPort for FakeDownloader {
    async fn download(
        &self,
        _url: &str,
        format: DownloadFormat,
        work_dir: &Path,
        stem: &str,
        _cancel: &CancellationToken,
    ) -> Result<PathBuf, DomainError> {
        let path = work_dir.join(format!("{}.{}", stem, format.extension()));
        tokio::fs::write(&path, format!("{} bytes", format.extension()))
            .await
            .unwrap();
        Ok(path)
    }
}

pub struct FakeTranscript;

#[async_trait]
impl TranscriptPort for FakeTranscript {
    async fn transcript(
        &self,
        _video_id: &VideoId,
        _work_dir: &Path,
        _cancel: &CancellationToken,
    ) -> Result<Vec<TranscriptCue>, DomainError> {
        Ok(vec![
            TranscriptCue {
                text: "hello".to_string(),
                start: 0.0,
                duration: 1.5,
            },
            TranscriptCue {
                text: "world".to_string(),
                start: 1.5,
                duration: 2.0,
            },
        ])
    }
}

impl Harness {
    pub fn media_interactor(&self) -> MediaInteractor {
        MediaInteractor::new(
            Some(Arc::new(FakeMetadata) as Arc<dyn MetadataPort>),
            Arc::new(FakeDownloader),
            Arc::new(FakeTranscript),
            Arc::new(FsLocalAdapter::new()),
            Arc::clone(&self.log) as Arc<dyn LogPort>,
            self.temp_dir.clone(),
            self.output_dir.clone(),
        )
    }

    /// Container over fakes; `fetcher` and `cutter` drive the clip pipeline
    pub fn container(
        &self,
        fetcher: Arc<dyn SourceFetcherPort>,
        cutter: Arc<dyn SegmentCutterPort>,
    ) -> DefaultAppContainer {
        DefaultAppContainer::from_parts(
            self.interactor(fetcher, cutter, PartialFailurePolicy::BestEffort),
            self.media_interactor(),
            ArtifactRegistry::new(Duration::from_secs(3600)),
        )
    }
}
