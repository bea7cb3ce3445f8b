// TOML config adapter - Configuration file and environment loading

use std::path::{Path, PathBuf};

use crate::config::ServiceConfig;
use crate::domain::model::PartialFailurePolicy;
use crate::error::{YtClipError, YtClipResult};
use crate::utils::logging::LogFormat;

/// Files probed, in order, when no `--config` is given
const DEFAULT_CONFIG_PATHS: &[&str] = &["ytclip.toml", "config/ytclip.toml"];

/// TOML configuration adapter
pub struct TomlConfigAdapter;

impl TomlConfigAdapter {
    /// Parse TOML text; `origin` names the source in errors
    pub fn parse_str(text: &str, origin: &str) -> YtClipResult<ServiceConfig> {
        toml::from_str(text).map_err(|e| YtClipError::ConfigParse {
            path: origin.to_string(),
            message: e.to_string(),
        })
    }

    /// Load an explicit configuration file
    pub fn load_file(path: &Path) -> YtClipResult<ServiceConfig> {
        let text = std::fs::read_to_string(path).map_err(|e| YtClipError::ConfigParse {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::parse_str(&text, &path.display().to_string())
    }

    /// First default config file that exists, parsed
    pub fn discover() -> YtClipResult<Option<(PathBuf, ServiceConfig)>> {
        for candidate in DEFAULT_CONFIG_PATHS {
            let path = PathBuf::from(candidate);
            if path.is_file() {
                let config = Self::load_file(&path)?;
                return Ok(Some((path, config)));
            }
        }
        Ok(None)
    }

    /// Apply environment overrides read through `lookup`; returns the variables applied
    pub fn apply_env<F>(config: &mut ServiceConfig, lookup: F) -> YtClipResult<Vec<&'static str>>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut applied = Vec::new();
        let mut get = |name: &'static str| {
            let value = lookup(name).filter(|v| !v.trim().is_empty());
            if value.is_some() {
                applied.push(name);
            }
            value
        };

        // YTCLIP_API_KEY wins over the conventional YOUTUBE_API_KEY
        if let Some(key) = get("YOUTUBE_API_KEY") {
            config.youtube.api_key = Some(key);
        }
        if let Some(key) = get("YTCLIP_API_KEY") {
            config.youtube.api_key = Some(key);
        }
        if let Some(v) = get("YTCLIP_API_BASE_URL") {
            config.youtube.api_base_url = v;
        }
        if let Some(v) = get("YTCLIP_BIND") {
            config.server.bind = v;
        }
        if let Some(v) = get("YTCLIP_TEMP_DIR") {
            config.pipeline.temp_dir = PathBuf::from(v);
        }
        if let Some(v) = get("YTCLIP_OUTPUT_DIR") {
            config.pipeline.output_dir = PathBuf::from(v);
        }
        if let Some(v) = get("YTCLIP_FFMPEG") {
            config.tools.ffmpeg_path = Some(PathBuf::from(v));
        }
        if let Some(v) = get("YTCLIP_FFPROBE") {
            config.tools.ffprobe_path = Some(PathBuf::from(v));
        }
        if let Some(v) = get("YTCLIP_YTDLP") {
            config.tools.ytdlp_path = Some(PathBuf::from(v));
        }
        if let Some(v) = get("YTCLIP_TOOL_TIMEOUT_SECS") {
            config.pipeline.tool_timeout_secs = parse_number("YTCLIP_TOOL_TIMEOUT_SECS", &v)?;
        }
        if let Some(v) = get("YTCLIP_FETCH_TIMEOUT_SECS") {
            config.pipeline.fetch_timeout_secs = parse_number("YTCLIP_FETCH_TIMEOUT_SECS", &v)?;
        }
        if let Some(v) = get("YTCLIP_MAX_PARALLEL_CUTS") {
            config.pipeline.max_parallel_cuts = parse_number("YTCLIP_MAX_PARALLEL_CUTS", &v)?;
        }
        if let Some(v) = get("YTCLIP_ARTIFACT_TTL_SECS") {
            config.pipeline.artifact_ttl_secs = parse_number("YTCLIP_ARTIFACT_TTL_SECS", &v)?;
        }
        if let Some(v) = get("YTCLIP_PARTIAL_FAILURE") {
            config.pipeline.partial_failure = PartialFailurePolicy::parse(&v)?;
        }
        if let Some(v) = get("YTCLIP_LOG_LEVEL") {
            config.logging.level = v;
        }
        if let Some(v) = get("YTCLIP_LOG_FORMAT") {
            config.logging.format = LogFormat::parse(&v)?;
        }

        Ok(applied)
    }
}

fn parse_number<T: std::str::FromStr>(name: &str, value: &str) -> YtClipResult<T> {
    value
        .trim()
        .parse::<T>()
        .map_err(|_| YtClipError::InvalidConfig {
            message: format!("{} must be a non-negative integer, got {:?}", name, value),
        })
}
