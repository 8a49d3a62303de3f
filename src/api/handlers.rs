use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};
use utoipa::{IntoParams, ToSchema};

use crate::app_state::AppState;
use crate::error::TaleError;
use crate::narrative::Narrative;
use crate::pipeline::{run_pipeline, GenerateRequest};
use crate::videogen::JobState;

#[derive(Debug, Serialize, ToSchema)]
pub struct GenerateResponse {
    pub narrative: Narrative,
    /// Relative URL the UI can hand to a `<video>` element.
    pub video_url: String,
}

/// Runs the whole pipeline synchronously: narrative, per-part generation,
/// download, join. Errors are reported to the caller, never crash the host.
#[utoipa::path(
    post,
    path = "/generate",
    request_body = GenerateRequest,
    responses(
        (status = 200, description = "Run finished, combined video available", body = GenerateResponse),
        (status = 502, description = "A remote service failed or returned malformed output", body = TaleError),
        (status = 504, description = "Video generation did not finish in time", body = TaleError),
        (status = 500, description = "Local encoding or I/O failure", body = TaleError),
    ),
    tag = "TALEWEAVER"
)]
pub async fn generate_video(
    State(app_state): State<Arc<AppState>>,
    Json(request): Json<GenerateRequest>,
) -> Result<Json<GenerateResponse>, (StatusCode, Json<TaleError>)> {
    let output = run_pipeline(&app_state, &request).await.map_err(|e| {
        error!("TaleWeaver run failed: {e}");
        (e.status_code(), Json(e))
    })?;

    let filename = output
        .video_file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| {
            let e = TaleError::Internal("combined video has no file name".into());
            (e.status_code(), Json(e))
        })?;

    info!("Serving combined video {filename}");
    Ok(Json(GenerateResponse {
        narrative: output.narrative,
        video_url: format!("/api/v1/videos/{filename}"),
    }))
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct ListParams {
    /// Page size, as the generation service counts it.
    #[serde(default = "default_limit")]
    pub limit: u32,
    #[serde(default)]
    pub offset: u32,
}

fn default_limit() -> u32 {
    10
}

/// One past generation the gallery can play back.
#[derive(Debug, Serialize, ToSchema)]
pub struct GenerationSummary {
    pub id: String,
    pub prompt: Option<String>,
    /// The generation service's own asset URL.
    pub video_url: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct GenerationListResponse {
    pub generations: Vec<GenerationSummary>,
}

/// One page of past generations, playable ones only. Jobs still pending,
/// failed, or missing their asset are filtered out.
#[utoipa::path(
    get,
    path = "/generations",
    params(ListParams),
    responses(
        (status = 200, description = "Past generations with playable assets", body = GenerationListResponse),
        (status = 502, description = "The generation service failed", body = TaleError),
    ),
    tag = "TALEWEAVER"
)]
pub async fn list_generations(
    State(app_state): State<Arc<AppState>>,
    Query(params): Query<ListParams>,
) -> Result<Json<GenerationListResponse>, (StatusCode, Json<TaleError>)> {
    let jobs = app_state
        .video_generator
        .list(params.limit, params.offset)
        .await
        .map_err(|e| {
            error!("Listing generations failed: {e}");
            (e.status_code(), Json(e))
        })?;

    let generations = jobs
        .into_iter()
        .filter(|job| job.state == JobState::Completed)
        .filter_map(|job| {
            let video_url = job.video?;
            Some(GenerationSummary {
                id: job.id,
                prompt: job.prompt,
                video_url,
            })
        })
        .collect();

    Ok(Json(GenerationListResponse { generations }))
}

/// Serves a combined video from the output directory.
#[utoipa::path(
    get,
    path = "/videos/{filename}",
    params(("filename" = String, Path, description = "Combined video file name")),
    responses(
        (status = 200, description = "Video bytes", body = Vec<u8>, content_type = "video/mp4"),
        (status = 404, description = "No such video"),
    ),
    tag = "TALEWEAVER"
)]
pub async fn serve_video(
    State(app_state): State<Arc<AppState>>,
    Path(filename): Path<String>,
) -> Result<Response, StatusCode> {
    // The output directory is flat; anything path-like is not ours.
    if filename.contains('/') || filename.contains('\\') || filename.contains("..") {
        return Err(StatusCode::NOT_FOUND);
    }

    let path = app_state.config.output_dir.join(&filename);
    let bytes = tokio::fs::read(&path)
        .await
        .map_err(|_| StatusCode::NOT_FOUND)?;

    Ok(([(header::CONTENT_TYPE, "video/mp4")], bytes).into_response())
}
