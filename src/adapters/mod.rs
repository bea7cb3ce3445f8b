// Adapters - External system implementations

pub mod exec_ffmpeg;
pub mod fetch_ytdlp;
pub mod fs_local;
pub mod metadata_youtube;
pub mod probe_ffprobe;
pub mod process;
pub mod toml_config;
pub mod tracing_log;

// Re-export adapters
pub use exec_ffmpeg::FFmpegAdapter;
pub use fetch_ytdlp::YtDlpAdapter;
pub use fs_local::FsLocalAdapter;
pub use metadata_youtube::YoutubeMetadataAdapter;
pub use probe_ffprobe::FFprobeAdapter;
pub use process::{Tool, ToolCommand, ToolInfo, ToolRegistry};
pub use toml_config::TomlConfigAdapter;
pub use tracing_log::TracingLogAdapter;
