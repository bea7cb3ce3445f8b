//! Logging configuration and subscriber setup

use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

use crate::error::{YtClipError, YtClipResult};
use crate::ports::LogLevel;

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable multi-line text
    #[default]
    Pretty,
    /// Single-line text
    Compact,
    /// Newline-delimited JSON for log shippers
    Json,
}

impl LogFormat {
    pub fn parse(value: &str) -> YtClipResult<Self> {
        match value.trim().to_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "compact" => Ok(LogFormat::Compact),
            "json" => Ok(LogFormat::Json),
            other => Err(YtClipError::InvalidConfig {
                message: format!(
                    "Invalid log format: {}. Valid formats: pretty, compact, json",
                    other
                ),
            }),
        }
    }
}

/// Logging configuration options
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub level: LogLevel,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            format: LogFormat::Pretty,
        }
    }
}

impl LoggingConfig {
    /// `RUST_LOG` wins over the configured level when set
    fn filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{level},hyper=warn,reqwest=warn",
                level = self.level.as_str()
            ))
        })
    }

    /// Install the global subscriber. Fails if one is already installed.
    pub fn initialize(&self) -> YtClipResult<()> {
        let builder = tracing_subscriber::fmt()
            .with_env_filter(self.filter())
            .with_writer(std::io::stderr);

        let result = match self.format {
            LogFormat::Pretty => builder.pretty().try_init(),
            LogFormat::Compact => builder.compact().with_target(false).try_init(),
            LogFormat::Json => builder.json().with_current_span(true).try_init(),
        };

        result.map_err(|e| YtClipError::LoggingInit {
            message: e.to_string(),
        })?;

        tracing::debug!(level = self.level.as_str(), format = ?self.format, "logging initialized");
        Ok(())
    }
}
