// Domain errors - Error types for the domain layer

use std::fmt;

use serde::Serialize;

/// Rule a segment (or the segment list) broke during validation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentRule {
    /// The request carried no segments at all
    EmptySequence,
    /// `start` was below zero
    NegativeStart,
    /// `end` was not strictly after `start`
    EndNotAfterStart,
    /// A bound was NaN or infinite
    NonFinite,
}

impl fmt::Display for SegmentRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SegmentRule::EmptySequence => write!(f, "at least one segment is required"),
            SegmentRule::NegativeStart => write!(f, "start must not be negative"),
            SegmentRule::EndNotAfterStart => write!(f, "end must be greater than start"),
            SegmentRule::NonFinite => write!(f, "start and end must be finite numbers"),
        }
    }
}

/// A segment that could not be turned into a clip
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SegmentFailure {
    /// Position of the segment in the original request
    pub index: usize,
    /// Human readable cause
    pub reason: String,
}

impl SegmentFailure {
    pub fn new(index: usize, reason: impl Into<String>) -> Self {
        Self {
            index,
            reason: reason.into(),
        }
    }
}

/// Domain-specific error types
#[derive(Debug, Clone)]
pub enum DomainError {
    /// A requested segment broke a validation rule (`index` is `None` for list-level rules)
    InvalidSegment {
        index: Option<usize>,
        rule: SegmentRule,
    },
    /// The source reference cannot be resolved (bad URL, private or removed video)
    SourceUnavailable(String),
    /// The downloader ran but did not produce a usable file
    DownloadFailed(String),
    /// One or more segments failed and the run does not accept partial output
    CutFailed { failures: Vec<SegmentFailure> },
    /// Assembly could not produce the merged artifact
    ConcatFailed {
        reason: String,
        failures: Vec<SegmentFailure>,
    },
    /// Removing an intermediate failed; logged, never returned to callers
    CleanupFailed(String),
    /// An external tool exceeded its time budget
    Timeout { operation: String, seconds: u64 },
    /// The run was cancelled before it finished
    Cancelled,
    /// An external tool exited unsuccessfully
    ToolFailed { tool: String, message: String },
    /// An external tool is not installed or not executable
    ToolNotFound(String),
    /// Invalid arguments provided
    BadArgs(String),
    /// Requested resource does not exist
    NotFound(String),
    /// An upstream API rejected the request
    Upstream(String),
    /// Filesystem failure
    FsFail(String),
    /// Internal error
    InternalError(String),
}

impl DomainError {
    /// Stable machine-readable error kind
    pub fn kind(&self) -> &'static str {
        match self {
            DomainError::InvalidSegment { .. } => "invalid_segment",
            DomainError::SourceUnavailable(_) => "source_unavailable",
            DomainError::DownloadFailed(_) => "download_failed",
            DomainError::CutFailed { .. } => "cut_failed",
            DomainError::ConcatFailed { .. } => "concat_failed",
            DomainError::CleanupFailed(_) => "cleanup_failed",
            DomainError::Timeout { .. } => "timeout",
            DomainError::Cancelled => "cancelled",
            DomainError::ToolFailed { .. } => "tool_failed",
            DomainError::ToolNotFound(_) => "tool_not_found",
            DomainError::BadArgs(_) => "bad_args",
            DomainError::NotFound(_) => "not_found",
            DomainError::Upstream(_) => "upstream_error",
            DomainError::FsFail(_) => "fs_error",
            DomainError::InternalError(_) => "internal_error",
        }
    }

    /// Per-segment failures carried by the error, if any
    pub fn segment_failures(&self) -> &[SegmentFailure] {
        match self {
            DomainError::CutFailed { failures } => failures,
            DomainError::ConcatFailed { failures, .. } => failures,
            _ => &[],
        }
    }

    pub fn invalid_segment(index: usize, rule: SegmentRule) -> Self {
        DomainError::InvalidSegment {
            index: Some(index),
            rule,
        }
    }
}

impl fmt::Display for DomainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DomainError::InvalidSegment {
                index: Some(index),
                rule,
            } => write!(f, "Invalid segment {}: {}", index, rule),
            DomainError::InvalidSegment { index: None, rule } => {
                write!(f, "Invalid segment list: {}", rule)
            }
            DomainError::SourceUnavailable(msg) => write!(f, "Source unavailable: {}", msg),
            DomainError::DownloadFailed(msg) => write!(f, "Download failed: {}", msg),
            DomainError::CutFailed { failures } => {
                let indices: Vec<String> = failures.iter().map(|s| s.index.to_string()).collect();
                write!(f, "Cut failed for segment(s) {}", indices.join(", "))
            }
            DomainError::ConcatFailed { reason, .. } => write!(f, "Concatenation failed: {}", reason),
            DomainError::CleanupFailed(msg) => write!(f, "Cleanup failed: {}", msg),
            DomainError::Timeout { operation, seconds } => {
                write!(f, "{} timed out after {}s", operation, seconds)
            }
            DomainError::Cancelled => write!(f, "Operation cancelled"),
            DomainError::ToolFailed { tool, message } => write!(f, "{} failed: {}", tool, message),
            DomainError::ToolNotFound(tool) => write!(f, "Required tool not found: {}", tool),
            DomainError::BadArgs(msg) => write!(f, "Bad arguments: {}", msg),
            DomainError::NotFound(msg) => write!(f, "Not found: {}", msg),
            DomainError::Upstream(msg) => write!(f, "Upstream error: {}", msg),
            DomainError::FsFail(msg) => write!(f, "Filesystem error: {}", msg),
            DomainError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for DomainError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_segment_message_names_index_and_rule() {
        let err = DomainError::invalid_segment(3, SegmentRule::EndNotAfterStart);
        assert_eq!(
            err.to_string(),
            "Invalid segment 3: end must be greater than start"
        );
        assert_eq!(err.kind(), "invalid_segment");
    }

    #[test]
    fn cut_failed_lists_indices() {
        let err = DomainError::CutFailed {
            failures: vec![
                SegmentFailure::new(1, "boom"),
                SegmentFailure::new(4, "bang"),
            ],
        };
        assert_eq!(err.to_string(), "Cut failed for segment(s) 1, 4");
        assert_eq!(err.segment_failures().len(), 2);
    }

    #[test]
    fn plain_errors_carry_no_segment_failures() {
        assert!(DomainError::Cancelled.segment_failures().is_empty());
    }
}
