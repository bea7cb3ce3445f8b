//! Configuration initialization and hierarchy management

use crate::adapters::TomlConfigAdapter;
use crate::cli::{Cli, Commands};
use crate::config::{LoggingSettings, ServiceConfig};
use crate::domain::model::PartialFailurePolicy;
use crate::error::{YtClipError, YtClipResult};
use crate::ports::LogLevel;
use crate::utils::logging::{LogFormat, LoggingConfig};

/// Validated configuration plus where its values came from
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: ServiceConfig,
    /// Human-readable sources in the order they were applied
    pub sources: Vec<String>,
}

/// Build the configuration following precedence: CLI > Env > File > Defaults
pub fn load_configuration(cli: &Cli) -> YtClipResult<LoadedConfig> {
    load_configuration_with(cli, |key| std::env::var(key).ok())
}

/// Same as [`load_configuration`] with an injectable environment
pub fn load_configuration_with<F>(cli: &Cli, env: F) -> YtClipResult<LoadedConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let mut sources = vec!["defaults".to_string()];

    // Step 1: file, explicit or discovered
    let mut config = match &cli.config {
        Some(path) => {
            sources.push(format!("file {}", path.display()));
            TomlConfigAdapter::load_file(path)?
        }
        None => match TomlConfigAdapter::discover()? {
            Some((path, config)) => {
                sources.push(format!("file {}", path.display()));
                config
            }
            None => ServiceConfig::default(),
        },
    };

    // Step 2: environment
    for name in TomlConfigAdapter::apply_env(&mut config, env)? {
        sources.push(format!("env {}", name));
    }

    // Step 3: command line
    for flag in apply_cli_overrides(&mut config, cli)? {
        sources.push(format!("cli {}", flag));
    }

    config.validate()?;
    Ok(LoadedConfig { config, sources })
}

fn apply_cli_overrides(config: &mut ServiceConfig, cli: &Cli) -> YtClipResult<Vec<&'static str>> {
    let mut applied = Vec::new();

    if let Some(level) = &cli.log_level {
        config.logging.level = level.clone();
        applied.push("--log-level");
    }
    if let Some(format) = &cli.log_format {
        config.logging.format = LogFormat::parse(format)?;
        applied.push("--log-format");
    }

    match &cli.command {
        Commands::Serve(args) => {
            if let Some(bind) = &args.bind {
                config.server.bind = bind.clone();
                applied.push("--bind");
            }
        }
        Commands::Clip(args) => {
            if args.strict {
                config.pipeline.partial_failure = PartialFailurePolicy::Strict;
                applied.push("--strict");
            }
        }
        Commands::Tools(_) => {}
    }

    Ok(applied)
}

/// Subscriber settings for the configured level and format
pub fn logging_config(settings: &LoggingSettings) -> YtClipResult<LoggingConfig> {
    let level = LogLevel::parse(&settings.level).map_err(|e| YtClipError::InvalidConfig {
        message: e.to_string(),
    })?;
    Ok(LoggingConfig {
        level,
        format: settings.format,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    fn write_config(dir: &std::path::Path, text: &str) -> std::path::PathBuf {
        let path = dir.join("ytclip.toml");
        std::fs::write(&path, text).unwrap();
        path
    }

    #[test]
    fn cli_beats_env_beats_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            dir.path(),
            "[server]\nbind = \"127.0.0.1:1000\"\n[logging]\nlevel = \"warn\"\n[youtube]\napi_key = \"file\"\n",
        );
        let cli = Cli::try_parse_from([
            "ytclip",
            "--config",
            path.to_str().unwrap(),
            "--log-level",
            "debug",
            "serve",
            "--bind",
            "127.0.0.1:3000",
        ])
        .unwrap();

        let loaded = load_configuration_with(
            &cli,
            env(&[("YTCLIP_BIND", "127.0.0.1:2000"), ("YTCLIP_LOG_LEVEL", "error")]),
        )
        .unwrap();

        assert_eq!(loaded.config.server.bind, "127.0.0.1:3000");
        assert_eq!(loaded.config.logging.level, "debug");
        assert_eq!(loaded.config.youtube.api_key.as_deref(), Some("file"));
        assert_eq!(
            loaded.sources,
            vec![
                "defaults".to_string(),
                format!("file {}", path.display()),
                "env YTCLIP_BIND".to_string(),
                "env YTCLIP_LOG_LEVEL".to_string(),
                "cli --log-level".to_string(),
                "cli --bind".to_string(),
            ]
        );
    }

    #[test]
    fn strict_flag_switches_policy() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(dir.path(), "");
        let cli = Cli::try_parse_from([
            "ytclip",
            "--config",
            path.to_str().unwrap(),
            "clip",
            "-u",
            "x",
            "-s",
            "1-2",
            "--strict",
        ])
        .unwrap();

        let loaded = load_configuration_with(&cli, env(&[])).unwrap();
        assert_eq!(
            loaded.config.pipeline.partial_failure,
            PartialFailurePolicy::Strict
        );
    }

    #[test]
    fn invalid_values_fail_at_startup() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(dir.path(), "[pipeline]\nmax_parallel_cuts = 0\n");
        let cli = Cli::try_parse_from(["ytclip", "--config", path.to_str().unwrap(), "tools"])
            .unwrap();
        assert!(matches!(
            load_configuration_with(&cli, env(&[])),
            Err(YtClipError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn bad_log_level_is_rejected() {
        let settings = LoggingSettings {
            level: "chatty".to_string(),
            format: LogFormat::Json,
        };
        assert!(logging_config(&settings).is_err());
    }
}
