//! HTTP handlers

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Json, Path, Query, State};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::jobs::{Job, JobCounts, JobId, JobStatus};
use crate::server::error::ApiError;
use crate::server::ServerState;

/// `GET /improve` query string
#[derive(Debug, Deserialize)]
pub struct ImproveQuery {
    #[serde(default)]
    pub text: Option<String>,
}

/// `POST /improve-async` body
#[derive(Debug, Deserialize)]
pub struct ImproveRequest {
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ImproveResponse {
    pub improved_text: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SubmitResponse {
    pub job_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct JobStatusResponse {
    pub job_id: String,
    pub status: JobStatus,
    pub result: Option<String>,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Job> for JobStatusResponse {
    fn from(job: Job) -> Self {
        Self {
            job_id: job.id.to_string(),
            status: job.status,
            result: job.result,
            text: job.text,
            created_at: job.created_at,
            updated_at: job.updated_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub cache_entries: usize,
    pub jobs: JobCounts,
}

/// Synchronous improvement
pub async fn improve_handler(
    State(state): State<ServerState>,
    query: Result<Query<ImproveQuery>, QueryRejection>,
) -> Result<Json<ImproveResponse>, ApiError> {
    let Query(query) = query?;
    let text = state.rules.validate_opt(query.text.as_deref())?;

    let improved_text = state.service.improve_now(&text).await?;
    Ok(Json(ImproveResponse { improved_text }))
}

/// Submit a background improvement job
pub async fn improve_async_handler(
    State(state): State<ServerState>,
    payload: Result<Json<ImproveRequest>, JsonRejection>,
) -> Result<Json<SubmitResponse>, ApiError> {
    let Json(req) = payload?;
    let text = state.rules.validate_opt(req.text.as_deref())?;

    let job_id = state.service.submit(text)?;
    Ok(Json(SubmitResponse { job_id: job_id.to_string() }))
}

/// Job status lookup. Ids that do not parse cannot exist, so they are 404 too.
pub async fn job_status_handler(
    State(state): State<ServerState>,
    Path(job_id): Path<String>,
) -> Result<Json<JobStatusResponse>, ApiError> {
    let id: JobId = job_id.parse().map_err(|_| ApiError::JobNotFound)?;
    let job = state.service.job(id).ok_or(ApiError::JobNotFound)?;
    Ok(Json(job.into()))
}

pub async fn health_handler(State(state): State<ServerState>) -> Json<HealthResponse> {
    let stats = state.service.stats();
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        cache_entries: stats.cache_entries,
        jobs: stats.jobs,
    })
}
