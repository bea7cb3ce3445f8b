//! CLI module for ytclip
//!
//! This module handles command-line argument parsing and command execution.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub mod args;
pub mod commands;

pub use args::{ClipArgs, ServeArgs, ToolsArgs};

/// ytclip - YouTube highlight clipper
///
/// Downloads a video once, cuts the requested segments without re-encoding
/// and stitches them into a single file.
#[derive(Parser, Debug)]
#[command(name = "ytclip")]
#[command(about = "ytclip - Cut YouTube videos into stitched highlight clips")]
#[command(version)]
#[command(long_about = None)]
pub struct Cli {
    /// Configuration file (default: ytclip.toml or config/ytclip.toml when present)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Logging level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Log format (pretty, compact, json)
    #[arg(long, global = true)]
    pub log_format: Option<String>,

    /// The command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the HTTP API
    Serve(ServeArgs),
    /// Cut segments of one video into a single file
    Clip(ClipArgs),
    /// Show which external tools were found
    Tools(ToolsArgs),
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn clip_collects_repeated_segments() {
        let cli = Cli::try_parse_from([
            "ytclip",
            "--log-level",
            "debug",
            "clip",
            "--url",
            "dQw4w9WgXcQ",
            "-s",
            "10-15",
            "--segment",
            "30-32.5",
            "--strict",
        ])
        .unwrap();

        assert_eq!(cli.log_level.as_deref(), Some("debug"));
        match cli.command {
            Commands::Clip(args) => {
                assert_eq!(args.segments, vec!["10-15", "30-32.5"]);
                assert!(args.strict);
                assert!(args.output.is_none());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn clip_requires_a_segment() {
        assert!(Cli::try_parse_from(["ytclip", "clip", "--url", "x"]).is_err());
    }
}
