//! API controllers

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use tracing::warn;
use uuid::Uuid;

use crate::application::{Orchestrator, SubmitError};
use crate::presentation::models::{
    ErrorResponse, HealthResponse, JobAcceptedResponse, JobListResponse, JobStatusResponse,
    SubmitAuditRequest,
};

/// Application state shared by all handlers
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
    pub started_at: Instant,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

/// POST /api/v1/audits - Submit an audit job
#[utoipa::path(
    post,
    path = "/api/v1/audits",
    request_body = SubmitAuditRequest,
    responses(
        (status = 200, description = "Audit job queued", body = JobAcceptedResponse),
        (status = 400, description = "Missing, relative, or blocked target URL", body = ErrorResponse),
        (status = 429, description = "Concurrent audit capacity exceeded", body = ErrorResponse),
        (status = 500, description = "Unexpected submission failure", body = ErrorResponse)
    ),
    tag = "audits"
)]
pub async fn submit_audit(
    State(state): State<AppState>,
    Json(request): Json<SubmitAuditRequest>,
) -> Result<Json<JobAcceptedResponse>, ApiError> {
    match state
        .orchestrator
        .submit(&request.target_url, request.protocol.as_deref())
    {
        Ok(job) => Ok(Json(JobAcceptedResponse {
            job_id: job.job_id,
            state: job.state,
            protocol: job.protocol,
        })),
        Err(err @ (SubmitError::InvalidUrl | SubmitError::BlockedHost(_))) => Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new(err.to_string())),
        )),
        Err(err @ SubmitError::CapacityExceeded { max }) => {
            warn!(max_concurrent = max, "Audit submission rejected at capacity");
            Err((
                StatusCode::TOO_MANY_REQUESTS,
                Json(ErrorResponse::capacity(err.to_string(), max)),
            ))
        }
    }
}

/// GET /api/v1/audits/{id} - Poll one audit job
#[utoipa::path(
    get,
    path = "/api/v1/audits/{id}",
    params(
        ("id" = Uuid, Path, description = "Job ID")
    ),
    responses(
        (status = 200, description = "Current job projection", body = JobStatusResponse),
        (status = 404, description = "Unknown job ID", body = ErrorResponse)
    ),
    tag = "audits"
)]
pub async fn get_audit(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<JobStatusResponse>, ApiError> {
    match state.orchestrator.store().get(id) {
        Some(job) => Ok(Json(JobStatusResponse::from(job))),
        None => Err((
            StatusCode::NOT_FOUND,
            Json(ErrorResponse::new(format!("Job not found: {id}"))),
        )),
    }
}

/// GET /api/v1/audits - List all known audit jobs
#[utoipa::path(
    get,
    path = "/api/v1/audits",
    responses(
        (status = 200, description = "All known jobs, newest first", body = JobListResponse)
    ),
    tag = "audits"
)]
pub async fn list_audits(State(state): State<AppState>) -> Json<JobListResponse> {
    let jobs: Vec<JobStatusResponse> = state
        .orchestrator
        .store()
        .list()
        .into_iter()
        .map(JobStatusResponse::from)
        .collect();
    let total = jobs.len();
    Json(JobListResponse { jobs, total })
}

/// GET /health - Liveness check
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse)
    ),
    tag = "health"
)]
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        name: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.started_at.elapsed().as_secs(),
    })
}
