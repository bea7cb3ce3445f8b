//! ytclip - YouTube highlight clipper
//!
//! Fetches a video with yt-dlp, cuts the requested segments with ffmpeg
//! stream copy and concatenates them in request order.
//!
//! # Usage
//!
//! ```bash
//! ytclip clip --url https://youtu.be/dQw4w9WgXcQ -s 10-15 -s 30-32.5
//! ytclip serve --bind 127.0.0.1:8000
//! ytclip tools
//! ```

use anyhow::Result;
use clap::Parser;
use tracing::{debug, info};

use ytclip::cli::{commands, Cli, Commands};
use ytclip::config_initialization::{load_configuration, logging_config};

/// Main entry point for the ytclip CLI application
#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse();

    let loaded = load_configuration(&cli)?;
    logging_config(&loaded.config.logging)?.initialize()?;
    for source in &loaded.sources {
        debug!(source = %source, "configuration source applied");
    }

    // Execute the requested command
    match cli.command {
        Commands::Serve(_) => {
            info!("Executing serve command");
            commands::serve(&loaded.config).await?;
        }
        Commands::Clip(args) => {
            info!("Executing clip command");
            commands::clip(&loaded.config, args).await?;
        }
        Commands::Tools(args) => {
            commands::tools(&loaded.config, args).await?;
        }
    }

    Ok(())
}
