// Unit tests for domain models

use super::*;
use crate::domain::errors::*;

#[test]
fn test_time_spec_parse_seconds() {
    let time = TimeSpec::parse("123.456").unwrap();
    assert_eq!(time.seconds, 123.456);
}

#[test]
fn test_time_spec_parse_mm_ss() {
    let time = TimeSpec::parse("01:30.5").unwrap();
    assert_eq!(time.seconds, 90.5);
}

#[test]
fn test_time_spec_parse_hh_mm_ss() {
    let time = TimeSpec::parse("01:02:03.5").unwrap();
    assert_eq!(time.seconds, 3723.5);
}

#[test]
fn test_time_spec_parse_invalid() {
    assert!(TimeSpec::parse("invalid").is_err());
    assert!(TimeSpec::parse("").is_err());
    assert!(TimeSpec::parse("00:60").is_err());
    assert!(TimeSpec::parse("01:60:00").is_err());
    assert!(TimeSpec::parse("-10").is_err());
    assert!(TimeSpec::parse("1:2:3:4").is_err());
}

#[test]
fn test_segment_from_range_str() {
    assert_eq!(
        Segment::from_range_str("10-15").unwrap(),
        Segment::new(10.0, 15.0)
    );
    assert_eq!(
        Segment::from_range_str("00:30-00:32.5").unwrap(),
        Segment::new(30.0, 32.5)
    );
    assert!(Segment::from_range_str("10").is_err());
    assert!(Segment::from_range_str("a-b").is_err());
}

#[test]
fn test_segment_format_bound() {
    assert_eq!(Segment::format_bound(10.0), "10");
    assert_eq!(Segment::format_bound(32.5), "32.5");
    assert_eq!(Segment::format_bound(0.0), "0");
    assert_eq!(Segment::format_bound(1.23456), "1.235");
}

#[test]
fn test_run_ids_are_unique_and_scope_file_names() {
    let a = RunId::new();
    let b = RunId::new();
    assert_ne!(a, b);

    let name = a.file_name("part0", "mp4");
    assert!(name.starts_with(&a.to_string()));
    assert!(name.ends_with("_part0.mp4"));
    assert_eq!(a.to_string().parse::<RunId>().unwrap(), a);
    assert!("nope".parse::<RunId>().is_err());
}

#[test]
fn test_manifest_orders_by_index_not_path() {
    let artifacts = vec![
        ClipArtifact {
            index: 2,
            segment: Segment::new(0.0, 1.0),
            path: PathBuf::from("/tmp/a.mp4"),
        },
        ClipArtifact {
            index: 0,
            segment: Segment::new(5.0, 6.0),
            path: PathBuf::from("/tmp/z.mp4"),
        },
        ClipArtifact {
            index: 1,
            segment: Segment::new(2.0, 3.0),
            path: PathBuf::from("/tmp/m.mp4"),
        },
    ];
    let manifest = ConcatManifest::from_artifacts(&artifacts);
    assert_eq!(
        manifest.render(),
        "file '/tmp/z.mp4'\nfile '/tmp/m.mp4'\nfile '/tmp/a.mp4'\n"
    );
}

#[test]
fn test_manifest_escapes_quotes_and_parses_back() {
    let artifacts = vec![ClipArtifact {
        index: 0,
        segment: Segment::new(0.0, 1.0),
        path: PathBuf::from("/tmp/it's.mp4"),
    }];
    let manifest = ConcatManifest::from_artifacts(&artifacts);
    let rendered = manifest.render();
    assert_eq!(rendered, "file '/tmp/it'\\''s.mp4'\n");
    assert_eq!(ConcatManifest::parse(&rendered), manifest);
}

#[test]
fn test_pipeline_state_happy_path() {
    let state = PipelineState::Validating;
    let state = state.advance(PipelineState::Fetching).unwrap();
    let state = state.advance(PipelineState::Cutting { index: 0 }).unwrap();
    let state = state.advance(PipelineState::Cutting { index: 1 }).unwrap();
    let state = state.advance(PipelineState::Assembling).unwrap();
    let state = state.advance(PipelineState::Done).unwrap();
    assert!(state.is_terminal());
}

#[test]
fn test_pipeline_state_rejects_illegal_moves() {
    assert!(PipelineState::Validating
        .advance(PipelineState::Assembling)
        .is_err());
    assert!(PipelineState::Cutting { index: 2 }
        .advance(PipelineState::Cutting { index: 1 })
        .is_err());
    assert!(PipelineState::Done.advance(PipelineState::Fetching).is_err());
    assert!(PipelineState::Failed {
        reason: "x".to_string()
    }
    .advance(PipelineState::Failed {
        reason: "y".to_string()
    })
    .is_err());
}

#[test]
fn test_failed_is_reachable_from_every_live_state() {
    let live = [
        PipelineState::Validating,
        PipelineState::Fetching,
        PipelineState::Cutting { index: 3 },
        PipelineState::Assembling,
    ];
    for state in live {
        let failed = state.advance(PipelineState::Failed {
            reason: "boom".to_string(),
        });
        assert!(failed.unwrap().is_terminal());
    }
}

#[test]
fn test_partial_failure_policy_parse() {
    assert_eq!(
        PartialFailurePolicy::parse("best-effort").unwrap(),
        PartialFailurePolicy::BestEffort
    );
    assert_eq!(
        PartialFailurePolicy::parse("STRICT").unwrap(),
        PartialFailurePolicy::Strict
    );
    assert!(PartialFailurePolicy::parse("lenient").is_err());
}

#[test]
fn test_download_format_parse() {
    assert_eq!(DownloadFormat::parse("MP3").unwrap(), DownloadFormat::Mp3);
    assert_eq!(DownloadFormat::parse("mp4").unwrap().extension(), "mp4");
    match DownloadFormat::parse("avi") {
        Err(DomainError::BadArgs(msg)) => assert!(msg.contains("'mp4' or 'mp3'")),
        other => panic!("unexpected: {:?}", other),
    }
}

#[test]
fn test_video_id_from_reference() {
    let id = "dQw4w9WgXcQ";
    let cases = [
        "dQw4w9WgXcQ",
        "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
        "https://www.youtube.com/watch?feature=share&v=dQw4w9WgXcQ&t=42",
        "https://youtu.be/dQw4w9WgXcQ?t=10",
        "https://m.youtube.com/shorts/dQw4w9WgXcQ",
        "https://www.youtube.com/embed/dQw4w9WgXcQ",
        "https://www.youtube.com/live/dQw4w9WgXcQ",
    ];
    for case in cases {
        assert_eq!(VideoId::from_reference(case).unwrap().as_str(), id, "{}", case);
    }
}

#[test]
fn test_video_id_rejects_foreign_or_malformed() {
    assert!(VideoId::from_reference("https://vimeo.com/12345").is_err());
    assert!(VideoId::from_reference("https://www.youtube.com/watch?v=short").is_err());
    assert!(VideoId::from_reference("not a url").is_err());
}

#[test]
fn test_source_url_normalizes_bare_ids() {
    assert_eq!(
        source_url("dQw4w9WgXcQ").unwrap(),
        "https://www.youtube.com/watch?v=dQw4w9WgXcQ"
    );
    assert_eq!(
        source_url("https://example.com/video.mp4").unwrap(),
        "https://example.com/video.mp4"
    );
    assert!(matches!(
        source_url("ftp://example.com/x"),
        Err(DomainError::SourceUnavailable(_))
    ));
    assert!(matches!(
        source_url("  "),
        Err(DomainError::SourceUnavailable(_))
    ));
}

#[test]
fn test_source_artifact_extension() {
    let artifact = SourceArtifact {
        run_id: RunId::new(),
        path: PathBuf::from("/tmp/run_source.webm"),
        duration: None,
    };
    assert_eq!(artifact.extension(), "webm");

    let bare = SourceArtifact {
        path: PathBuf::from("/tmp/run_source"),
        ..artifact
    };
    assert_eq!(bare.extension(), "mp4");
}
