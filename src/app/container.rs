use std::sync::Arc;
use std::time::Duration;

use crate::adapters::{
    FFmpegAdapter, FFprobeAdapter, FsLocalAdapter, Tool, ToolRegistry, TracingLogAdapter,
    YoutubeMetadataAdapter, YtDlpAdapter,
};
use crate::app::artifacts::ArtifactRegistry;
use crate::app::clip_interactor::{ClipInteractor, ClipSettings};
use crate::app::media_interactor::MediaInteractor;
use crate::config::ServiceConfig;
use crate::error::YtClipResult;
use crate::ports::{
    ConcatenatorPort, FsPort, LogPort, MediaDownloadPort, MetadataPort, ProbePort,
    SegmentCutterPort, SourceFetcherPort, TranscriptPort,
};

pub trait AppContainer: Send + Sync {
    fn clip_interactor(&self) -> Arc<ClipInteractor>;
    fn media_interactor(&self) -> Arc<MediaInteractor>;
    fn artifacts(&self) -> Arc<ArtifactRegistry>;
}

pub struct DefaultAppContainer {
    clip_interactor: Arc<ClipInteractor>,
    media_interactor: Arc<MediaInteractor>,
    artifacts: Arc<ArtifactRegistry>,
}

impl DefaultAppContainer {
    /// Wire the production adapters.
    ///
    /// `yt-dlp` and `ffmpeg` must be resolvable; `ffprobe` is optional. The
    /// metadata adapter exists only when an API key is configured.
    pub fn new(config: &ServiceConfig, tools: &ToolRegistry) -> YtClipResult<Self> {
        let pipeline = &config.pipeline;

        let ytdlp = Arc::new(YtDlpAdapter::new(
            tools.require(Tool::YtDlp)?,
            pipeline.fetch_timeout(),
            config.youtube.transcript_languages.clone(),
        ));
        let ffmpeg = Arc::new(FFmpegAdapter::new(
            tools.require(Tool::Ffmpeg)?,
            pipeline.tool_timeout(),
        ));
        let probe_port = tools.path(Tool::Ffprobe).map(|path| {
            Arc::new(FFprobeAdapter::new(path.to_path_buf(), pipeline.tool_timeout()))
                as Arc<dyn ProbePort>
        });
        let metadata_port = match config.youtube.api_key.as_deref() {
            Some(key) if !key.trim().is_empty() => Some(Arc::new(YoutubeMetadataAdapter::new(
                key.to_string(),
                config.youtube.api_base_url.clone(),
                Duration::from_secs(config.youtube.request_timeout_secs),
            )?) as Arc<dyn MetadataPort>),
            _ => None,
        };
        let fs_port = Arc::new(FsLocalAdapter::new());
        let log_port = Arc::new(TracingLogAdapter::default());

        let mut clip_interactor = ClipInteractor::new(
            Arc::clone(&ytdlp) as Arc<dyn SourceFetcherPort>,
            Arc::clone(&ffmpeg) as Arc<dyn SegmentCutterPort>,
            Arc::clone(&ffmpeg) as Arc<dyn ConcatenatorPort>,
            Arc::clone(&fs_port) as Arc<dyn FsPort>,
            Arc::clone(&log_port) as Arc<dyn LogPort>,
            ClipSettings::from(pipeline),
        );
        if let Some(probe_port) = probe_port {
            clip_interactor = clip_interactor.with_probe(probe_port);
        }

        let media_interactor = MediaInteractor::new(
            metadata_port,
            Arc::clone(&ytdlp) as Arc<dyn MediaDownloadPort>,
            Arc::clone(&ytdlp) as Arc<dyn TranscriptPort>,
            Arc::clone(&fs_port) as Arc<dyn FsPort>,
            Arc::clone(&log_port) as Arc<dyn LogPort>,
            pipeline.temp_dir.clone(),
            pipeline.output_dir.clone(),
        );

        Ok(Self::from_parts(
            clip_interactor,
            media_interactor,
            ArtifactRegistry::new(pipeline.artifact_ttl()),
        ))
    }

    /// Assemble from already-built interactors
    pub fn from_parts(
        clip_interactor: ClipInteractor,
        media_interactor: MediaInteractor,
        artifacts: ArtifactRegistry,
    ) -> Self {
        Self {
            clip_interactor: Arc::new(clip_interactor),
            media_interactor: Arc::new(media_interactor),
            artifacts: Arc::new(artifacts),
        }
    }
}

impl AppContainer for DefaultAppContainer {
    fn clip_interactor(&self) -> Arc<ClipInteractor> {
        Arc::clone(&self.clip_interactor)
    }

    fn media_interactor(&self) -> Arc<MediaInteractor> {
        Arc::clone(&self.media_interactor)
    }

    fn artifacts(&self) -> Arc<ArtifactRegistry> {
        Arc::clone(&self.artifacts)
    }
}
