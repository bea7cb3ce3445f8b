// Clip interactor - Orchestrates the fetch, cut and concat pipeline

use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::app::workspace::{PublishedArtifact, RunWorkspace};
use crate::config::PipelineConfig;
use crate::domain::errors::*;
use crate::domain::model::*;
use crate::domain::rules::*;
use crate::ports::*;
use crate::utils::round2;

/// Pipeline settings taken from configuration
#[derive(Debug, Clone)]
pub struct ClipSettings {
    pub temp_dir: PathBuf,
    pub output_dir: PathBuf,
    pub max_parallel_cuts: usize,
    pub policy: PartialFailurePolicy,
}

impl From<&PipelineConfig> for ClipSettings {
    fn from(config: &PipelineConfig) -> Self {
        Self {
            temp_dir: config.temp_dir.clone(),
            output_dir: config.output_dir.clone(),
            max_parallel_cuts: config.max_parallel_cuts,
            policy: config.partial_failure,
        }
    }
}

/// Interactor for the clip use case
pub struct ClipInteractor {
    fetcher: Arc<dyn SourceFetcherPort>,
    cutter: Arc<dyn SegmentCutterPort>,
    concatenator: Arc<dyn ConcatenatorPort>,
    probe_port: Option<Arc<dyn ProbePort>>,
    fs_port: Arc<dyn FsPort>,
    log_port: Arc<dyn LogPort>,
    settings: ClipSettings,
}

impl ClipInteractor {
    /// Create new clip interactor with injected ports
    pub fn new(
        fetcher: Arc<dyn SourceFetcherPort>,
        cutter: Arc<dyn SegmentCutterPort>,
        concatenator: Arc<dyn ConcatenatorPort>,
        fs_port: Arc<dyn FsPort>,
        log_port: Arc<dyn LogPort>,
        settings: ClipSettings,
    ) -> Self {
        Self {
            fetcher,
            cutter,
            concatenator,
            probe_port: None,
            fs_port,
            log_port,
            settings,
        }
    }

    /// Probe durations of the source and the merged output.
    ///
    /// Without a probe, segments are only checked against a source length the
    /// fetcher reported, and the response carries no output duration.
    pub fn with_probe(mut self, probe_port: Arc<dyn ProbePort>) -> Self {
        self.probe_port = Some(probe_port);
        self
    }

    /// Run one clip request to completion.
    ///
    /// Nothing touches the filesystem until the segment list has been
    /// validated. From `Fetching` on, every intermediate lives in the run's
    /// workspace, which is removed on every exit path. The published output
    /// is removed too unless this future runs to completion.
    pub async fn execute(
        &self,
        request: ClipRequest,
        cancel: CancellationToken,
    ) -> Result<ClipResponse, DomainError> {
        let started = Instant::now();
        let run_id = RunId::new();
        let mut tracker = StateTracker::start(run_id, Arc::clone(&self.log_port)).await;

        if let Err(e) = SegmentValidator::validate(&request.segments) {
            tracker.fail(&e).await;
            return Err(e);
        }

        if let Err(e) = tracker.advance(PipelineState::Fetching).await {
            tracker.fail(&e).await;
            return Err(e);
        }

        let workspace = match RunWorkspace::create(&self.settings.temp_dir, run_id) {
            Ok(workspace) => workspace,
            Err(e) => {
                tracker.fail(&e).await;
                return Err(e);
            }
        };

        let outcome = self
            .run_in_workspace(&workspace, &request, &mut tracker, &cancel)
            .await;

        if let Err(e) = workspace.close().await {
            self.log_port
                .log_event(
                    &LogEvent::new(LogLevel::Warn, e.to_string())
                        .with("run_id", run_id)
                        .with("kind", e.kind()),
                )
                .await;
        }

        match outcome {
            Ok(done) => {
                tracker.advance(PipelineState::Done).await?;
                // no await from here on: the caller owns the file once we return
                let output = done.output.release();
                Ok(ClipResponse {
                    run_id,
                    output_file: output.path,
                    segments_requested: request.segments.len(),
                    kept: done.plan.kept_indices(),
                    dropped: done.plan.dropped.clone(),
                    requested_duration: done.plan.requested_duration(),
                    output_duration: done.output_duration,
                    processing_time: round2(started.elapsed().as_secs_f64()),
                })
            }
            Err(e) => {
                tracker.fail(&e).await;
                Err(e)
            }
        }
    }

    async fn run_in_workspace(
        &self,
        workspace: &RunWorkspace,
        request: &ClipRequest,
        tracker: &mut StateTracker,
        cancel: &CancellationToken,
    ) -> Result<Assembled, DomainError> {
        let run_id = workspace.run_id();

        let mut source = guarded(
            cancel,
            self.fetcher
                .fetch(&request.source, run_id, workspace.path(), cancel),
        )
        .await?;
        if source.duration.is_none() {
            source.duration = self.probe_duration(&source.path, cancel).await?;
        }
        self.log_port
            .log_event(
                &LogEvent::new(LogLevel::Info, "source fetched")
                    .with("run_id", run_id)
                    .with("path", source.path.display())
                    .with(
                        "duration",
                        source
                            .duration
                            .map(|d| format!("{:.3}", d))
                            .unwrap_or_else(|| "unknown".to_string()),
                    ),
            )
            .await;

        let outcomes = self
            .cut_segments(workspace, &source, &request.segments, tracker, cancel)
            .await?;
        let plan = AssemblyRules::plan(outcomes, self.settings.policy)?;
        for failure in &plan.dropped {
            self.log_port
                .log_event(
                    &LogEvent::new(LogLevel::Warn, "segment dropped")
                        .with("run_id", run_id)
                        .with("segment", failure.index)
                        .with("reason", &failure.reason),
                )
                .await;
        }

        tracker.advance(PipelineState::Assembling).await?;
        let extension = source.extension();
        let merged = self.assemble(workspace, &plan, &extension, cancel).await?;
        let output_duration = self.probe_duration(&merged, cancel).await?;

        let output = self.publish(run_id, &merged, &extension).await?;
        Ok(Assembled {
            output,
            plan,
            output_duration,
        })
    }

    /// Cut every segment, bounded by `max_parallel_cuts`.
    ///
    /// Failures are collected per index; only cancellation aborts the batch.
    async fn cut_segments(
        &self,
        workspace: &RunWorkspace,
        source: &SourceArtifact,
        segments: &[Segment],
        tracker: &mut StateTracker,
        cancel: &CancellationToken,
    ) -> Result<Vec<Result<ClipArtifact, SegmentFailure>>, DomainError> {
        let permits = Arc::new(Semaphore::new(self.settings.max_parallel_cuts.max(1)));
        let extension = source.extension();
        let mut outcomes = Vec::with_capacity(segments.len());
        let mut tasks = JoinSet::new();

        for (index, segment) in segments.iter().enumerate() {
            if cancel.is_cancelled() {
                tasks.shutdown().await;
                return Err(DomainError::Cancelled);
            }
            tracker.advance(PipelineState::Cutting { index }).await?;

            if let Some(reason) = SourceBounds::violation(segment, source.duration) {
                outcomes.push(Err(SegmentFailure::new(index, reason)));
                continue;
            }

            let cutter = Arc::clone(&self.cutter);
            let permits = Arc::clone(&permits);
            let source = source.clone();
            let segment = *segment;
            let output = workspace.file(&format!("part{}", index), &extension);
            let cancel = cancel.clone();
            tasks.spawn(async move {
                let result = match permits.acquire_owned().await {
                    Ok(_permit) => cutter.cut(&source, index, &segment, &output, &cancel).await,
                    Err(_) => Err(DomainError::Cancelled),
                };
                (index, result)
            });
        }

        loop {
            let joined = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    tasks.shutdown().await;
                    return Err(DomainError::Cancelled);
                }
                joined = tasks.join_next() => joined,
            };
            let Some(joined) = joined else {
                break;
            };

            match joined {
                Ok((_, Err(DomainError::Cancelled))) => {
                    tasks.shutdown().await;
                    return Err(DomainError::Cancelled);
                }
                Ok((index, Ok(clip))) => {
                    self.log_port
                        .log_event(
                            &LogEvent::new(LogLevel::Debug, "segment cut")
                                .with("run_id", workspace.run_id())
                                .with("segment", index),
                        )
                        .await;
                    outcomes.push(Ok(clip));
                }
                Ok((index, Err(e))) => {
                    outcomes.push(Err(SegmentFailure::new(index, e.to_string())));
                }
                Err(e) => {
                    return Err(DomainError::InternalError(format!("cut task failed: {}", e)));
                }
            }
        }

        Ok(outcomes)
    }

    /// Write the manifest and merge the planned clips inside the workspace
    async fn assemble(
        &self,
        workspace: &RunWorkspace,
        plan: &AssemblyPlan,
        extension: &str,
        cancel: &CancellationToken,
    ) -> Result<PathBuf, DomainError> {
        let manifest = ConcatManifest::from_artifacts(&plan.clips);
        let manifest_path = workspace.file("list", "txt");
        self.fs_port
            .write_file(&manifest_path, &manifest.render())
            .await?;

        let merged = workspace.file("concat", extension);
        guarded(
            cancel,
            self.concatenator.concat(&manifest_path, &merged, cancel),
        )
        .await
        .map_err(|e| match e {
            DomainError::ConcatFailed { reason, .. } => DomainError::ConcatFailed {
                reason,
                failures: plan.dropped.clone(),
            },
            other => other,
        })?;

        Ok(merged)
    }

    /// Move the merged file out of the workspace under its final name
    async fn publish(
        &self,
        run_id: RunId,
        merged: &std::path::Path,
        extension: &str,
    ) -> Result<PublishedArtifact, DomainError> {
        self.fs_port
            .create_directory(&self.settings.output_dir)
            .await?;
        let path = self
            .settings
            .output_dir
            .join(run_id.file_name("final", extension));

        if let Err(e) = self.fs_port.move_file(merged, &path).await {
            if let Err(cleanup) = self.fs_port.delete_file(&path).await {
                let cleanup = DomainError::CleanupFailed(cleanup.to_string());
                self.log_port
                    .log_event(
                        &LogEvent::new(LogLevel::Warn, cleanup.to_string())
                            .with("run_id", run_id)
                            .with("kind", cleanup.kind()),
                    )
                    .await;
            }
            return Err(e);
        }
        Ok(PublishedArtifact::new(FinalArtifact { run_id, path }))
    }

    /// Probe failures only cost the duration; cancellation still aborts
    async fn probe_duration(
        &self,
        path: &std::path::Path,
        cancel: &CancellationToken,
    ) -> Result<Option<f64>, DomainError> {
        let Some(probe) = &self.probe_port else {
            return Ok(None);
        };
        match guarded(cancel, probe.probe_duration(path, cancel)).await {
            Ok(duration) => Ok(Some(duration)),
            Err(DomainError::Cancelled) => Err(DomainError::Cancelled),
            Err(e) => {
                self.log_port
                    .warn(&format!("Could not probe {}: {}", path.display(), e))
                    .await;
                Ok(None)
            }
        }
    }
}

struct Assembled {
    output: PublishedArtifact,
    plan: AssemblyPlan,
    output_duration: Option<f64>,
}

/// Resolve to `Cancelled` as soon as the token fires, even if `fut` ignores it
async fn guarded<T, F>(cancel: &CancellationToken, fut: F) -> Result<T, DomainError>
where
    F: Future<Output = Result<T, DomainError>>,
{
    tokio::select! {
        biased;
        result = fut => result,
        _ = cancel.cancelled() => Err(DomainError::Cancelled),
    }
}

/// Current pipeline state of one run; every transition is logged
struct StateTracker {
    run_id: RunId,
    state: PipelineState,
    log_port: Arc<dyn LogPort>,
}

impl StateTracker {
    async fn start(run_id: RunId, log_port: Arc<dyn LogPort>) -> Self {
        let tracker = Self {
            run_id,
            state: PipelineState::Validating,
            log_port,
        };
        tracker.emit(LogLevel::Info, "pipeline state changed").await;
        tracker
    }

    async fn advance(&mut self, next: PipelineState) -> Result<(), DomainError> {
        self.state = self.state.advance(next)?;
        let level = match self.state {
            PipelineState::Cutting { .. } => LogLevel::Debug,
            _ => LogLevel::Info,
        };
        self.emit(level, "pipeline state changed").await;
        Ok(())
    }

    async fn fail(&mut self, error: &DomainError) {
        if self.state.is_terminal() {
            return;
        }
        self.state = PipelineState::Failed {
            reason: error.to_string(),
        };
        self.log_port
            .log_event(
                &LogEvent::new(LogLevel::Error, error.to_string())
                    .with("run_id", self.run_id)
                    .with("state", &self.state)
                    .with("kind", error.kind()),
            )
            .await;
    }

    async fn emit(&self, level: LogLevel, message: &str) {
        self.log_port
            .log_event(
                &LogEvent::new(level, message)
                    .with("run_id", self.run_id)
                    .with("state", &self.state),
            )
            .await;
    }
}
