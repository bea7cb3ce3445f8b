//! Command-line argument definitions

use std::path::PathBuf;

use clap::Args;

/// Arguments for the serve command
#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Listen address, overriding server.bind
    #[arg(long, value_name = "ADDR")]
    pub bind: Option<String>,
}

/// Arguments for the clip command
#[derive(Args, Debug)]
pub struct ClipArgs {
    /// Video URL or 11-character video id
    #[arg(short, long)]
    pub url: String,

    /// Segment to keep, in request order (SS, MM:SS or HH:MM:SS bounds); repeatable
    #[arg(short = 's', long = "segment", value_name = "START-END", required = true)]
    pub segments: Vec<String>,

    /// Where to put the result (default: <output_dir>/<run_id>_final.<ext>)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Fail if any segment cannot be cut
    #[arg(long)]
    pub strict: bool,

    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the tools command
#[derive(Args, Debug)]
pub struct ToolsArgs {
    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}
