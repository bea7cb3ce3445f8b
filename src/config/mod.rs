//! Service configuration.
//!
//! One explicit [`ServiceConfig`] is built at startup (see
//! `config_initialization`) and handed to the container; nothing reads the
//! environment after that.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::model::PartialFailurePolicy;
use crate::error::{YtClipError, YtClipResult};
use crate::ports::LogLevel;
use crate::utils::logging::LogFormat;

pub const DEFAULT_API_BASE_URL: &str = "https://www.googleapis.com/youtube/v3";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub server: ServerConfig,
    pub youtube: YoutubeConfig,
    pub tools: ToolsConfig,
    pub pipeline: PipelineConfig,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Socket address the HTTP service listens on
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8000".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct YoutubeConfig {
    /// YouTube Data API v3 key; required to serve
    pub api_key: Option<String>,
    pub api_base_url: String,
    /// Caption languages tried in order
    pub transcript_languages: Vec<String>,
    pub request_timeout_secs: u64,
}

impl Default for YoutubeConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            transcript_languages: vec!["en".to_string(), "en-US".to_string()],
            request_timeout_secs: 30,
        }
    }
}

/// Explicit tool locations; unset tools are looked up on `PATH`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    pub ffmpeg_path: Option<PathBuf>,
    pub ffprobe_path: Option<PathBuf>,
    pub ytdlp_path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Parent of the per-run scratch directories
    pub temp_dir: PathBuf,
    /// Where final artifacts are placed
    pub output_dir: PathBuf,
    pub fetch_timeout_secs: u64,
    pub tool_timeout_secs: u64,
    pub max_parallel_cuts: usize,
    pub partial_failure: PartialFailurePolicy,
    /// How long an unclaimed final artifact is kept
    pub artifact_ttl_secs: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            temp_dir: PathBuf::from("downloads").join("tmp"),
            output_dir: PathBuf::from("downloads"),
            fetch_timeout_secs: 1800,
            tool_timeout_secs: 300,
            max_parallel_cuts: num_cpus::get().clamp(1, 4),
            partial_failure: PartialFailurePolicy::BestEffort,
            artifact_ttl_secs: 3600,
        }
    }
}

impl PipelineConfig {
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    pub fn tool_timeout(&self) -> Duration {
        Duration::from_secs(self.tool_timeout_secs)
    }

    pub fn artifact_ttl(&self) -> Duration {
        Duration::from_secs(self.artifact_ttl_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

impl ServiceConfig {
    /// Reject values no run could work with
    pub fn validate(&self) -> YtClipResult<()> {
        let invalid = |message: String| Err(YtClipError::InvalidConfig { message });

        if self.pipeline.fetch_timeout_secs == 0 {
            return invalid("pipeline.fetch_timeout_secs must be greater than zero".into());
        }
        if self.pipeline.tool_timeout_secs == 0 {
            return invalid("pipeline.tool_timeout_secs must be greater than zero".into());
        }
        if self.pipeline.max_parallel_cuts == 0 {
            return invalid("pipeline.max_parallel_cuts must be at least 1".into());
        }
        if self.pipeline.artifact_ttl_secs == 0 {
            return invalid("pipeline.artifact_ttl_secs must be greater than zero".into());
        }
        if self.pipeline.temp_dir.as_os_str().is_empty() {
            return invalid("pipeline.temp_dir must not be empty".into());
        }
        if self.pipeline.output_dir.as_os_str().is_empty() {
            return invalid("pipeline.output_dir must not be empty".into());
        }
        if self.youtube.transcript_languages.is_empty() {
            return invalid("youtube.transcript_languages must not be empty".into());
        }
        if let Err(e) = LogLevel::parse(&self.logging.level) {
            return invalid(e.to_string());
        }
        Ok(())
    }

    /// The metadata API key, or a startup error naming the missing option
    pub fn require_api_key(&self) -> YtClipResult<&str> {
        match self.youtube.api_key.as_deref().map(str::trim) {
            Some(key) if !key.is_empty() => Ok(key),
            _ => Err(YtClipError::MissingConfig {
                key: "youtube.api_key (or YTCLIP_API_KEY / YOUTUBE_API_KEY)".to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = ServiceConfig::default();
        assert!(config.validate().is_ok());
        assert!(config.pipeline.max_parallel_cuts >= 1);
        assert_eq!(config.server.bind, "0.0.0.0:8000");
    }

    #[test]
    fn missing_api_key_is_reported() {
        let mut config = ServiceConfig::default();
        assert!(matches!(
            config.require_api_key(),
            Err(YtClipError::MissingConfig { .. })
        ));

        config.youtube.api_key = Some("   ".to_string());
        assert!(config.require_api_key().is_err());

        config.youtube.api_key = Some("abc".to_string());
        assert_eq!(config.require_api_key().unwrap(), "abc");
    }

    #[test]
    fn zero_limits_are_rejected() {
        let mut config = ServiceConfig::default();
        config.pipeline.max_parallel_cuts = 0;
        assert!(config.validate().is_err());

        let mut config = ServiceConfig::default();
        config.pipeline.tool_timeout_secs = 0;
        assert!(config.validate().is_err());

        let mut config = ServiceConfig::default();
        config.logging.level = "loud".to_string();
        assert!(config.validate().is_err());
    }
}
