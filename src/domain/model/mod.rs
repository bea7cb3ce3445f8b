// Domain models - Core types and data structures

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use url::Url;
use uuid::Uuid;

use crate::domain::errors::{DomainError, SegmentFailure};

/// Time specification with precision - represents time in seconds with fractional precision
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct TimeSpec {
    pub seconds: f64,
}

impl TimeSpec {
    /// Create a new TimeSpec from seconds
    pub fn from_seconds(seconds: f64) -> Self {
        Self { seconds }
    }

    /// Parse `SS[.ms]`, `MM:SS[.ms]` or `HH:MM:SS[.ms]`
    pub fn parse(time_str: &str) -> Result<Self, DomainError> {
        let trimmed = time_str.trim();
        if trimmed.is_empty() {
            return Err(DomainError::BadArgs("Time value is empty".to_string()));
        }

        let parts: Vec<&str> = trimmed.split(':').collect();
        let seconds = match parts.as_slice() {
            [secs] => parse_seconds_field(secs, false)?,
            [mins, secs] => parse_whole(mins, "minutes")? * 60.0 + parse_seconds_field(secs, true)?,
            [hours, mins, secs] => {
                let minutes = parse_whole(mins, "minutes")?;
                if minutes >= 60.0 {
                    return Err(DomainError::BadArgs(
                        "Minutes must be less than 60".to_string(),
                    ));
                }
                parse_whole(hours, "hours")? * 3600.0
                    + minutes * 60.0
                    + parse_seconds_field(secs, true)?
            }
            _ => {
                return Err(DomainError::BadArgs(format!(
                    "Invalid time format: {}. Expected HH:MM:SS.ms, MM:SS.ms, or seconds",
                    time_str
                )))
            }
        };

        Ok(Self::from_seconds(seconds))
    }
}

fn parse_whole(field: &str, name: &str) -> Result<f64, DomainError> {
    field
        .parse::<u32>()
        .map(f64::from)
        .map_err(|_| DomainError::BadArgs(format!("Invalid {} value: {}", name, field)))
}

fn parse_seconds_field(field: &str, bounded: bool) -> Result<f64, DomainError> {
    let value = field
        .parse::<f64>()
        .map_err(|_| DomainError::BadArgs(format!("Invalid seconds value: {}", field)))?;
    if !value.is_finite() || value < 0.0 {
        return Err(DomainError::BadArgs(format!(
            "Time must be a non-negative number: {}",
            field
        )));
    }
    if bounded && value >= 60.0 {
        return Err(DomainError::BadArgs(
            "Seconds must be less than 60".to_string(),
        ));
    }
    Ok(value)
}

/// One requested sub-range of the source timeline, in seconds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub start: f64,
    pub end: f64,
}

impl Segment {
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    /// Parse a `START-END` range where each bound is anything [`TimeSpec::parse`] accepts
    pub fn from_range_str(range: &str) -> Result<Self, DomainError> {
        let (start, end) = range.split_once('-').ok_or_else(|| {
            DomainError::BadArgs(format!("Segment must look like START-END: {}", range))
        })?;
        Ok(Self::new(
            TimeSpec::parse(start)?.seconds,
            TimeSpec::parse(end)?.seconds,
        ))
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    /// ffmpeg-friendly rendering of a bound
    pub fn format_bound(seconds: f64) -> String {
        let rendered = format!("{:.3}", seconds);
        rendered
            .trim_end_matches('0')
            .trim_end_matches('.')
            .to_string()
    }
}

/// A clip request as received from a caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClipRequest {
    /// URL or video identifier
    pub source: String,
    /// Segments in caller order
    pub segments: Vec<Segment>,
}

impl ClipRequest {
    pub fn new(source: impl Into<String>, segments: Vec<Segment>) -> Self {
        Self {
            source: source.into(),
            segments,
        }
    }
}

/// Unique token scoping every file of one clip run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(Uuid);

impl RunId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// File name for an intermediate or final file of this run
    pub fn file_name(&self, stem: &str, extension: &str) -> String {
        format!("{}_{}.{}", self, stem, extension)
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

impl FromStr for RunId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|_| DomainError::NotFound(format!("unknown run id: {}", s)))
    }
}

/// Local copy of the full source media for one run
#[derive(Debug, Clone, PartialEq)]
pub struct SourceArtifact {
    pub run_id: RunId,
    pub path: PathBuf,
    /// Probed duration in seconds, when known
    pub duration: Option<f64>,
}

impl SourceArtifact {
    /// Container extension of the downloaded file, defaulting to mp4
    pub fn extension(&self) -> String {
        self.path
            .extension()
            .and_then(|e| e.to_str())
            .filter(|e| !e.is_empty())
            .unwrap_or("mp4")
            .to_string()
    }
}

/// One cut file, tagged with the index of the segment it came from
#[derive(Debug, Clone, PartialEq)]
pub struct ClipArtifact {
    pub index: usize,
    pub segment: Segment,
    pub path: PathBuf,
}

/// Ordered list of clips handed to the concat demuxer
#[derive(Debug, Clone, PartialEq)]
pub struct ConcatManifest {
    entries: Vec<PathBuf>,
}

impl ConcatManifest {
    /// Build from clip artifacts, ordered by their original segment index
    pub fn from_artifacts(artifacts: &[ClipArtifact]) -> Self {
        let mut ordered: Vec<&ClipArtifact> = artifacts.iter().collect();
        ordered.sort_by_key(|a| a.index);
        Self {
            entries: ordered.into_iter().map(|a| a.path.clone()).collect(),
        }
    }

    pub fn entries(&self) -> &[PathBuf] {
        &self.entries
    }

    /// Render in concat demuxer directive format
    pub fn render(&self) -> String {
        let mut out = String::new();
        for path in &self.entries {
            out.push_str("file '");
            out.push_str(&escape_concat_path(path));
            out.push_str("'\n");
        }
        out
    }

    /// Parse a rendered manifest back into its entries
    pub fn parse(text: &str) -> Self {
        let entries = text
            .lines()
            .filter_map(|line| line.trim().strip_prefix("file "))
            .map(|quoted| {
                let inner = quoted
                    .strip_prefix('\'')
                    .and_then(|q| q.strip_suffix('\''))
                    .unwrap_or(quoted);
                PathBuf::from(inner.replace("'\\''", "'"))
            })
            .collect();
        Self { entries }
    }
}

fn escape_concat_path(path: &Path) -> String {
    path.to_string_lossy().replace('\'', "'\\''")
}

/// Merged output whose ownership passes to the caller
#[derive(Debug, Clone, PartialEq)]
pub struct FinalArtifact {
    pub run_id: RunId,
    pub path: PathBuf,
}

/// Lifecycle of one clip run
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineState {
    Validating,
    Fetching,
    Cutting { index: usize },
    Assembling,
    Done,
    Failed { reason: String },
}

impl PipelineState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, PipelineState::Done | PipelineState::Failed { .. })
    }

    /// Move to `next`, rejecting transitions the pipeline never makes
    pub fn advance(&self, next: PipelineState) -> Result<PipelineState, DomainError> {
        use PipelineState::*;

        let allowed = match (self, &next) {
            (Done, _) | (Failed { .. }, _) => false,
            (_, Failed { .. }) => true,
            (Validating, Fetching) => true,
            (Fetching, Cutting { .. }) => true,
            (Cutting { index: from }, Cutting { index: to }) => to > from,
            (Cutting { .. }, Assembling) => true,
            (Assembling, Done) => true,
            _ => false,
        };

        if allowed {
            Ok(next)
        } else {
            Err(DomainError::InternalError(format!(
                "illegal pipeline transition {} -> {}",
                self, next
            )))
        }
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineState::Validating => write!(f, "validating"),
            PipelineState::Fetching => write!(f, "fetching"),
            PipelineState::Cutting { index } => write!(f, "cutting({})", index),
            PipelineState::Assembling => write!(f, "assembling"),
            PipelineState::Done => write!(f, "done"),
            PipelineState::Failed { .. } => write!(f, "failed"),
        }
    }
}

/// What to do when only some segments could be cut
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartialFailurePolicy {
    /// Concatenate whatever succeeded and report the rest
    #[default]
    BestEffort,
    /// Any failed segment fails the request
    Strict,
}

impl PartialFailurePolicy {
    pub fn parse(value: &str) -> Result<Self, DomainError> {
        match value.trim().to_lowercase().replace('-', "_").as_str() {
            "best_effort" => Ok(PartialFailurePolicy::BestEffort),
            "strict" => Ok(PartialFailurePolicy::Strict),
            other => Err(DomainError::BadArgs(format!(
                "Invalid partial failure policy: {}. Valid policies: best_effort, strict",
                other
            ))),
        }
    }
}

/// Outcome of a successful clip run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClipResponse {
    pub run_id: RunId,
    pub output_file: PathBuf,
    pub segments_requested: usize,
    /// Indices of the segments present in the output, ascending
    pub kept: Vec<usize>,
    /// Segments left out of the output, with reasons
    pub dropped: Vec<SegmentFailure>,
    /// Sum of the kept segments' requested durations, seconds
    pub requested_duration: f64,
    /// Probed duration of the output, seconds
    pub output_duration: Option<f64>,
    /// Wall-clock seconds, two decimals
    pub processing_time: f64,
}

/// Output format for whole-video downloads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DownloadFormat {
    Mp4,
    Mp3,
}

impl DownloadFormat {
    pub fn parse(value: &str) -> Result<Self, DomainError> {
        match value.trim().to_lowercase().as_str() {
            "mp4" => Ok(DownloadFormat::Mp4),
            "mp3" => Ok(DownloadFormat::Mp3),
            _ => Err(DomainError::BadArgs(
                "Invalid format. Use 'mp4' or 'mp3'.".to_string(),
            )),
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            DownloadFormat::Mp4 => "mp4",
            DownloadFormat::Mp3 => "mp3",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            DownloadFormat::Mp4 => "video/mp4",
            DownloadFormat::Mp3 => "audio/mpeg",
        }
    }
}

const YOUTUBE_HOSTS: &[&str] = &[
    "youtube.com",
    "www.youtube.com",
    "m.youtube.com",
    "music.youtube.com",
    "youtube-nocookie.com",
    "www.youtube-nocookie.com",
];

/// 11-character YouTube video identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VideoId(String);

impl VideoId {
    /// Extract the id from a bare id or any common YouTube URL shape
    pub fn from_reference(reference: &str) -> Result<Self, DomainError> {
        let trimmed = reference.trim();
        if Self::is_valid_id(trimmed) {
            return Ok(Self(trimmed.to_string()));
        }

        let unavailable =
            || DomainError::SourceUnavailable(format!("not a YouTube video reference: {}", trimmed));

        let url = Url::parse(trimmed).map_err(|_| unavailable())?;
        let host = url.host_str().unwrap_or_default().to_lowercase();
        let mut segments = url
            .path_segments()
            .map(|s| s.filter(|p| !p.is_empty()).collect::<Vec<_>>())
            .unwrap_or_default()
            .into_iter();

        let candidate = if host == "youtu.be" {
            segments.next().map(str::to_string)
        } else if YOUTUBE_HOSTS.contains(&host.as_str()) {
            match segments.next() {
                Some("watch") => url
                    .query_pairs()
                    .find(|(k, _)| k == "v")
                    .map(|(_, v)| v.into_owned()),
                Some("shorts") | Some("embed") | Some("live") | Some("v") => {
                    segments.next().map(str::to_string)
                }
                _ => None,
            }
        } else {
            None
        };

        candidate
            .filter(|id| Self::is_valid_id(id))
            .map(Self)
            .ok_or_else(unavailable)
    }

    fn is_valid_id(candidate: &str) -> bool {
        candidate.len() == 11
            && candidate
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn watch_url(&self) -> String {
        format!("https://www.youtube.com/watch?v={}", self.0)
    }
}

impl fmt::Display for VideoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Normalize a caller's source reference into a URL the downloader accepts
pub fn source_url(reference: &str) -> Result<String, DomainError> {
    let trimmed = reference.trim();
    if trimmed.is_empty() {
        return Err(DomainError::SourceUnavailable(
            "empty source reference".to_string(),
        ));
    }
    if let Ok(id) = VideoId::from_reference(trimmed) {
        if !trimmed.contains("://") {
            return Ok(id.watch_url());
        }
    }
    match Url::parse(trimmed) {
        Ok(url) if matches!(url.scheme(), "http" | "https") && url.host_str().is_some() => {
            Ok(url.to_string())
        }
        _ => Err(DomainError::SourceUnavailable(format!(
            "not a valid video URL or identifier: {}",
            trimmed
        ))),
    }
}

/// Video metadata as returned by the metadata lookup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoMetadata {
    pub title: String,
    pub description: String,
    /// ISO-8601 duration as reported upstream, e.g. `PT4M13S`
    pub duration: String,
    pub duration_seconds: Option<u64>,
    pub view_count: u64,
    pub like_count: u64,
    pub channel_name: String,
    /// `YYYY-MM-DD`
    pub upload_date: String,
}

/// One timed caption line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptCue {
    pub text: String,
    pub start: f64,
    pub duration: f64,
}

#[cfg(test)]
mod tests;
