//! External tool discovery.
//!
//! [`ToolRegistry`] resolves the executables the pipeline shells out to,
//! preferring configured paths and falling back to a `PATH` lookup.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::adapters::process::ToolCommand;
use crate::config::ToolsConfig;
use crate::error::{YtClipError, YtClipResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tool {
    Ffmpeg,
    Ffprobe,
    YtDlp,
}

impl Tool {
    pub const ALL: [Tool; 3] = [Tool::YtDlp, Tool::Ffmpeg, Tool::Ffprobe];

    pub fn name(&self) -> &'static str {
        match self {
            Tool::Ffmpeg => "ffmpeg",
            Tool::Ffprobe => "ffprobe",
            Tool::YtDlp => "yt-dlp",
        }
    }

    pub fn config_key(&self) -> &'static str {
        match self {
            Tool::Ffmpeg => "ffmpeg_path",
            Tool::Ffprobe => "ffprobe_path",
            Tool::YtDlp => "ytdlp_path",
        }
    }

    fn version_flag(&self) -> &'static str {
        match self {
            Tool::YtDlp => "--version",
            Tool::Ffmpeg | Tool::Ffprobe => "-version",
        }
    }
}

/// Availability of one tool, as reported by `ytclip tools`.
#[derive(Debug, Clone, Serialize)]
pub struct ToolInfo {
    pub name: String,
    pub available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ToolRegistry {
    paths: HashMap<Tool, PathBuf>,
}

impl ToolRegistry {
    /// Resolve every known tool from config, then `PATH`.
    pub fn discover(config: &ToolsConfig) -> Self {
        let configured = |tool: Tool| match tool {
            Tool::Ffmpeg => config.ffmpeg_path.as_deref(),
            Tool::Ffprobe => config.ffprobe_path.as_deref(),
            Tool::YtDlp => config.ytdlp_path.as_deref(),
        };

        let paths = Tool::ALL
            .iter()
            .filter_map(|&tool| {
                let found = resolve(configured(tool), tool.name());
                match &found {
                    Some(path) => tracing::debug!(tool = tool.name(), path = %path.display(), "tool resolved"),
                    None => tracing::debug!(tool = tool.name(), "tool not found"),
                }
                found.map(|path| (tool, path))
            })
            .collect();

        Self { paths }
    }

    /// Registry with explicit paths, bypassing discovery
    pub fn with_paths(paths: impl IntoIterator<Item = (Tool, PathBuf)>) -> Self {
        Self {
            paths: paths.into_iter().collect(),
        }
    }

    pub fn path(&self, tool: Tool) -> Option<&Path> {
        self.paths.get(&tool).map(PathBuf::as_path)
    }

    /// Path of a tool the caller cannot run without
    pub fn require(&self, tool: Tool) -> YtClipResult<PathBuf> {
        self.path(tool)
            .map(Path::to_path_buf)
            .ok_or_else(|| YtClipError::ToolMissing {
                tool: tool.name().to_string(),
                config_key: tool.config_key().to_string(),
            })
    }

    /// Probe every tool's version
    pub async fn check_all(&self) -> Vec<ToolInfo> {
        let cancel = CancellationToken::new();
        let mut infos = Vec::with_capacity(Tool::ALL.len());

        for tool in Tool::ALL {
            let path = self.path(tool).map(Path::to_path_buf);
            let version = match &path {
                Some(p) => ToolCommand::new(p)
                    .arg(tool.version_flag())
                    .timeout(Duration::from_secs(10))
                    .execute(&cancel)
                    .await
                    .ok()
                    .and_then(|out| out.stdout.lines().next().map(|l| l.trim().to_string())),
                None => None,
            };
            infos.push(ToolInfo {
                name: tool.name().to_string(),
                available: path.is_some(),
                path,
                version,
            });
        }

        infos
    }
}

fn resolve(configured: Option<&Path>, default_name: &str) -> Option<PathBuf> {
    match configured {
        Some(path) if path.is_file() => Some(path.to_path_buf()),
        Some(path) => which::which(path).ok(),
        None => which::which(default_name).ok(),
    }
}
