//! Route handlers.

use std::path::Path;

use axum::body::Body;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path as UrlPath, State};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio_util::io::ReaderStream;

use crate::app::StoredArtifact;
use crate::domain::errors::DomainError;
use crate::domain::model::{ClipRequest, ClipResponse, DownloadFormat, RunId, Segment};
use crate::http::error::AppError;
use crate::http::request_id::RequestId;
use crate::http::state::AppState;

type HandlerResult<T> = Result<T, AppError>;

#[derive(Debug, Deserialize)]
pub struct UrlBody {
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct DownloadBody {
    pub url: String,
    #[serde(default = "default_format")]
    pub format: String,
}

fn default_format() -> String {
    "mp4".to_string()
}

#[derive(Debug, Deserialize)]
pub struct ClipBody {
    pub url: String,
    pub segments: Vec<Segment>,
}

#[derive(Debug, Serialize)]
pub struct ClipCreated {
    #[serde(flatten)]
    pub response: ClipResponse,
    pub artifact_url: String,
}

/// Unwrap a JSON body, turning extractor rejections into `bad_args`
fn body<T>(payload: Result<Json<T>, JsonRejection>, request_id: &str) -> HandlerResult<T> {
    payload.map(|Json(value)| value).map_err(|rejection| {
        AppError::new(DomainError::BadArgs(rejection.body_text())).with_request_id(request_id)
    })
}

pub async fn root() -> Json<serde_json::Value> {
    Json(json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running",
    }))
}

pub async fn health() -> Json<serde_json::Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

pub async fn analyze(
    State(state): State<AppState>,
    Extension(RequestId(request_id)): Extension<RequestId>,
    payload: Result<Json<UrlBody>, JsonRejection>,
) -> HandlerResult<impl IntoResponse> {
    let UrlBody { url } = body(payload, &request_id)?;
    let analysis = state
        .container
        .media_interactor()
        .analyze(&url)
        .await
        .map_err(|e| AppError::new(e).with_request_id(&request_id))?;
    Ok(Json(analysis))
}

pub async fn transcript(
    State(state): State<AppState>,
    Extension(RequestId(request_id)): Extension<RequestId>,
    payload: Result<Json<UrlBody>, JsonRejection>,
) -> HandlerResult<impl IntoResponse> {
    let UrlBody { url } = body(payload, &request_id)?;
    let transcript = state
        .container
        .media_interactor()
        .transcript(&url, state.shutdown.child_token())
        .await
        .map_err(|e| AppError::new(e).with_request_id(&request_id))?;
    Ok(Json(transcript))
}

/// Download the whole video and stream it back; the file is gone afterwards
pub async fn download(
    State(state): State<AppState>,
    Extension(RequestId(request_id)): Extension<RequestId>,
    payload: Result<Json<DownloadBody>, JsonRejection>,
) -> HandlerResult<Response> {
    let DownloadBody { url, format } = body(payload, &request_id)?;
    let with_id = |e: DomainError| AppError::new(e).with_request_id(&request_id);

    let format = DownloadFormat::parse(&format).map_err(with_id)?;
    let media = state.container.media_interactor();
    let downloaded = media
        .download(&url, format, state.shutdown.child_token())
        .await
        .map_err(with_id)?;

    let file = tokio::fs::File::open(&downloaded.path).await;
    media.discard(&downloaded.path).await;
    let file = file.map_err(|e| {
        with_id(DomainError::FsFail(format!(
            "opening {}: {}",
            downloaded.path.display(),
            e
        )))
    })?;

    Ok(stream_file(file, downloaded.content_type, &downloaded.file_name))
}

/// Run the clip pipeline and register the result for one-shot collection
pub async fn clip(
    State(state): State<AppState>,
    Extension(RequestId(request_id)): Extension<RequestId>,
    payload: Result<Json<ClipBody>, JsonRejection>,
) -> HandlerResult<impl IntoResponse> {
    let ClipBody { url, segments } = body(payload, &request_id)?;
    let response = state
        .container
        .clip_interactor()
        .execute(ClipRequest::new(url, segments), state.shutdown.child_token())
        .await
        .map_err(|e| AppError::new(e).with_request_id(&request_id))?;

    let file_name = response
        .output_file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| response.run_id.file_name("final", "mp4"));
    state.container.artifacts().insert(
        response.run_id,
        StoredArtifact {
            path: response.output_file.clone(),
            content_type: content_type_for(&response.output_file),
            file_name,
        },
    );

    let artifact_url = format!("/clips/{}", response.run_id);
    Ok((
        StatusCode::OK,
        Json(ClipCreated {
            response,
            artifact_url,
        }),
    ))
}

/// Serve a finished clip once; the file is removed as it is handed over
pub async fn get_clip(
    State(state): State<AppState>,
    Extension(RequestId(request_id)): Extension<RequestId>,
    UrlPath(run_id): UrlPath<String>,
) -> HandlerResult<Response> {
    let with_id = |e: DomainError| AppError::new(e).with_request_id(&request_id);

    let run_id: RunId = run_id.parse().map_err(with_id)?;
    let artifact = state.container.artifacts().take(&run_id).ok_or_else(|| {
        with_id(DomainError::NotFound(format!(
            "no artifact for run {} (unknown, expired or already collected)",
            run_id
        )))
    })?;

    let file = tokio::fs::File::open(&artifact.path).await;
    state
        .container
        .media_interactor()
        .discard(&artifact.path)
        .await;
    let file = file.map_err(|e| {
        with_id(DomainError::NotFound(format!(
            "artifact file for run {} is missing: {}",
            run_id, e
        )))
    })?;

    Ok(stream_file(file, artifact.content_type, &artifact.file_name))
}

fn stream_file(file: tokio::fs::File, content_type: &'static str, file_name: &str) -> Response {
    let body = Body::from_stream(ReaderStream::new(file));
    let mut response = (StatusCode::OK, [(header::CONTENT_TYPE, content_type)], body).into_response();

    if let Ok(value) = HeaderValue::from_str(&format!("attachment; filename=\"{}\"", file_name)) {
        response
            .headers_mut()
            .insert(header::CONTENT_DISPOSITION, value);
    }
    response
}

fn content_type_for(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some("mp4") => "video/mp4",
        Some("webm") => "video/webm",
        Some("mkv") => "video/x-matroska",
        Some("mp3") => "audio/mpeg",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_types_follow_extension() {
        assert_eq!(content_type_for(Path::new("/o/a_final.mp4")), "video/mp4");
        assert_eq!(content_type_for(Path::new("/o/a_final.webm")), "video/webm");
        assert_eq!(content_type_for(Path::new("/o/a_final")), "application/octet-stream");
    }

    #[test]
    fn download_format_defaults_to_mp4() {
        let parsed: DownloadBody = serde_json::from_str(r#"{"url": "x"}"#).unwrap();
        assert_eq!(parsed.format, "mp4");
    }
}
