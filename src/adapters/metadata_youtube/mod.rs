// YouTube Data API adapter - video metadata lookup

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::domain::errors::*;
use crate::domain::model::*;
use crate::ports::*;

pub struct YoutubeMetadataAdapter {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl YoutubeMetadataAdapter {
    pub fn new(api_key: String, base_url: String, timeout: Duration) -> Result<Self, DomainError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DomainError::InternalError(format!("building HTTP client: {}", e)))?;
        Ok(Self {
            client,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl MetadataPort for YoutubeMetadataAdapter {
    async fn lookup(&self, video_id: &VideoId) -> Result<VideoMetadata, DomainError> {
        let url = format!("{}/videos", self.base_url);
        debug!(video_id = %video_id, "looking up video metadata");

        let response = self
            .client
            .get(&url)
            .query(&[
                ("part", "snippet,statistics,contentDetails"),
                ("id", video_id.as_str()),
                ("key", self.api_key.as_str()),
            ])
            .send()
            .await
            .map_err(|e| DomainError::Upstream(format!("metadata request failed: {}", e)))?;

        if !response.status().is_success() {
            warn!(status = %response.status(), video_id = %video_id, "metadata API rejected request");
            return Err(DomainError::Upstream(
                "Invalid YouTube URL or quota exceeded".to_string(),
            ));
        }

        let body: VideoListResponse = response
            .json()
            .await
            .map_err(|e| DomainError::Upstream(format!("unreadable metadata response: {}", e)))?;

        metadata_from_response(body)
    }
}

fn metadata_from_response(body: VideoListResponse) -> Result<VideoMetadata, DomainError> {
    let item = body
        .items
        .into_iter()
        .next()
        .ok_or_else(|| DomainError::NotFound("Video not found".to_string()))?;

    let count = |key: &str| {
        item.statistics
            .get(key)
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(0)
    };

    Ok(VideoMetadata {
        view_count: count("viewCount"),
        like_count: count("likeCount"),
        duration_seconds: parse_iso8601_duration(&item.content_details.duration),
        duration: item.content_details.duration,
        title: item.snippet.title,
        description: item.snippet.description,
        channel_name: item.snippet.channel_title,
        upload_date: item.snippet.published_at.chars().take(10).collect(),
    })
}

/// Parse an ISO 8601 duration such as `PT1H30M45S` or `P1DT2M` into seconds
pub fn parse_iso8601_duration(duration: &str) -> Option<u64> {
    let rest = duration.strip_prefix('P')?;
    let mut seconds = 0u64;
    let mut number = String::new();
    let mut in_time = false;

    for c in rest.chars() {
        match c {
            'T' => in_time = true,
            d if d.is_ascii_digit() || d == '.' => number.push(d),
            unit => {
                let value = number.parse::<f64>().ok()?;
                number.clear();
                let factor = match (unit, in_time) {
                    ('W', false) => 604_800.0,
                    ('D', false) => 86_400.0,
                    ('H', true) => 3600.0,
                    ('M', true) => 60.0,
                    ('S', true) => 1.0,
                    _ => return None,
                };
                // float-to-int `as` saturates, so the sum must as well
                seconds = seconds.saturating_add((value * factor).round() as u64);
            }
        }
    }

    if number.is_empty() {
        Some(seconds)
    } else {
        None
    }
}

#[derive(Debug, Deserialize)]
struct VideoListResponse {
    #[serde(default)]
    items: Vec<VideoItem>,
}

#[derive(Debug, Deserialize)]
struct VideoItem {
    snippet: Snippet,
    #[serde(rename = "contentDetails")]
    content_details: ContentDetails,
    #[serde(default)]
    statistics: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct Snippet {
    title: String,
    #[serde(default)]
    description: String,
    #[serde(rename = "channelTitle", default)]
    channel_title: String,
    #[serde(rename = "publishedAt", default)]
    published_at: String,
}

#[derive(Debug, Deserialize)]
struct ContentDetails {
    #[serde(default)]
    duration: String,
}
