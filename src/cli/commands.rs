//! Command implementations

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::adapters::{FsLocalAdapter, ToolInfo, ToolRegistry};
use crate::app::{AppContainer, DefaultAppContainer};
use crate::cli::args::{ClipArgs, ToolsArgs};
use crate::config::ServiceConfig;
use crate::domain::model::{source_url, ClipRequest, ClipResponse, Segment};
use crate::domain::rules::SegmentValidator;
use crate::ports::FsPort;
use crate::utils::{format_duration, format_file_size};

/// Execute the serve command
pub async fn serve(config: &ServiceConfig) -> Result<()> {
    config.require_api_key()?;
    let tools = ToolRegistry::discover(&config.tools);
    let container = DefaultAppContainer::new(config, &tools)?;

    info!(bind = %config.server.bind, "Starting ytclip server");
    crate::http::serve(config, Arc::new(container)).await?;
    Ok(())
}

/// Execute the clip command
pub async fn clip(config: &ServiceConfig, args: ClipArgs) -> Result<()> {
    // Requests are checked before any tool is looked up or file is created
    let segments = args
        .segments
        .iter()
        .map(|s| Segment::from_range_str(s))
        .collect::<Result<Vec<_>, _>>()?;
    SegmentValidator::validate(&segments)?;
    source_url(&args.url)?;

    let tools = ToolRegistry::discover(&config.tools);
    let container = DefaultAppContainer::new(config, &tools)?;

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling clip run");
            on_interrupt.cancel();
        }
    });

    let request = ClipRequest::new(args.url, segments);
    let mut response = container
        .clip_interactor()
        .execute(request, cancel)
        .await?;

    if let Some(target) = &args.output {
        FsLocalAdapter::new()
            .move_file(&response.output_file, target)
            .await
            .with_context(|| format!("Failed to move clip to {}", target.display()))?;
        response.output_file = target.clone();
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&response)?);
    } else {
        display_clip_response(&response).await;
    }
    Ok(())
}

/// Execute the tools command
pub async fn tools(config: &ServiceConfig, args: ToolsArgs) -> Result<()> {
    let infos = ToolRegistry::discover(&config.tools).check_all().await;

    if args.json {
        let json = serde_json::to_string_pretty(&infos)
            .context("Failed to serialize tool information to JSON")?;
        println!("{}", json);
    } else {
        display_tools(&infos);
    }
    Ok(())
}

async fn display_clip_response(response: &ClipResponse) {
    println!("Clip written to {}", response.output_file.display());
    if let Ok(meta) = tokio::fs::metadata(&response.output_file).await {
        println!("  Size:      {}", format_file_size(meta.len()));
    }
    println!(
        "  Segments:  {} of {} kept",
        response.kept.len(),
        response.segments_requested
    );
    println!(
        "  Requested: {}",
        format_duration(Duration::from_secs_f64(response.requested_duration))
    );
    if let Some(actual) = response.output_duration {
        println!("  Actual:    {}", format_duration(Duration::from_secs_f64(actual)));
    }
    for dropped in &response.dropped {
        println!("  Dropped segment {}: {}", dropped.index, dropped.reason);
    }
    println!("  Took:      {:.2}s", response.processing_time);
}

fn display_tools(infos: &[ToolInfo]) {
    println!("External tools:");
    for info in infos {
        let status = if info.available { "found" } else { "missing" };
        let path = info
            .path
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "-".to_string());
        println!("  {:<8} {:<8} {}", info.name, status, path);
        if let Some(version) = &info.version {
            println!("           {}", version);
        }
    }
}
