// Domain rules - Business logic and policies

use crate::domain::errors::*;
use crate::domain::model::*;

/// Slack allowed past the probed source end before a segment is rejected
pub const DURATION_TOLERANCE_SECS: f64 = 0.5;

/// Structural validation of the requested segment list
pub struct SegmentValidator;

impl SegmentValidator {
    /// Check every segment before any work starts.
    ///
    /// Fails on the first offending segment. Times are not checked against the
    /// source duration here; that only becomes known after fetching.
    pub fn validate(segments: &[Segment]) -> Result<(), DomainError> {
        if segments.is_empty() {
            return Err(DomainError::InvalidSegment {
                index: None,
                rule: SegmentRule::EmptySequence,
            });
        }

        for (index, segment) in segments.iter().enumerate() {
            Self::validate_one(index, segment)?;
        }

        Ok(())
    }

    fn validate_one(index: usize, segment: &Segment) -> Result<(), DomainError> {
        if !segment.start.is_finite() || !segment.end.is_finite() {
            return Err(DomainError::invalid_segment(index, SegmentRule::NonFinite));
        }
        if segment.start < 0.0 {
            return Err(DomainError::invalid_segment(index, SegmentRule::NegativeStart));
        }
        if segment.end <= segment.start {
            return Err(DomainError::invalid_segment(
                index,
                SegmentRule::EndNotAfterStart,
            ));
        }
        Ok(())
    }
}

/// Checks of a segment against the fetched source
pub struct SourceBounds;

impl SourceBounds {
    /// Reason the segment cannot be cut from a source of `duration` seconds, if any
    pub fn violation(segment: &Segment, duration: Option<f64>) -> Option<String> {
        let duration = duration?;
        if segment.start >= duration {
            return Some(format!(
                "start {}s is beyond the source duration of {:.3}s",
                Segment::format_bound(segment.start),
                duration
            ));
        }
        if segment.end > duration + DURATION_TOLERANCE_SECS {
            return Some(format!(
                "end {}s is beyond the source duration of {:.3}s",
                Segment::format_bound(segment.end),
                duration
            ));
        }
        None
    }
}

/// Clips that will be concatenated plus the segments left out
#[derive(Debug, Clone, PartialEq)]
pub struct AssemblyPlan {
    /// Successful clips in ascending segment order
    pub clips: Vec<ClipArtifact>,
    /// Failed segments in ascending segment order
    pub dropped: Vec<SegmentFailure>,
}

impl AssemblyPlan {
    pub fn kept_indices(&self) -> Vec<usize> {
        self.clips.iter().map(|c| c.index).collect()
    }

    pub fn requested_duration(&self) -> f64 {
        self.clips.iter().map(|c| c.segment.duration()).sum()
    }
}

/// Decides what gets assembled once every cut has finished
pub struct AssemblyRules;

impl AssemblyRules {
    pub fn plan(
        outcomes: Vec<Result<ClipArtifact, SegmentFailure>>,
        policy: PartialFailurePolicy,
    ) -> Result<AssemblyPlan, DomainError> {
        let mut clips = Vec::new();
        let mut dropped = Vec::new();
        for outcome in outcomes {
            match outcome {
                Ok(clip) => clips.push(clip),
                Err(failure) => dropped.push(failure),
            }
        }
        clips.sort_by_key(|c| c.index);
        dropped.sort_by_key(|f| f.index);

        if clips.is_empty() {
            return Err(DomainError::ConcatFailed {
                reason: "no segment could be cut".to_string(),
                failures: dropped,
            });
        }

        if policy == PartialFailurePolicy::Strict && !dropped.is_empty() {
            return Err(DomainError::CutFailed { failures: dropped });
        }

        Ok(AssemblyPlan { clips, dropped })
    }
}
