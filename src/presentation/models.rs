//! API request and response models

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::entities::{AuditJob, AuditStep, ToolCall, Verdict};
use crate::domain::value_objects::{AuditProtocol, JobPhase, JobState};

/// Request model for audit submission
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubmitAuditRequest {
    /// Absolute http(s) URL of the audit target
    #[schema(example = "https://shop.example.com")]
    pub target_url: String,

    /// Audit protocol. Unrecognized values fall back to `generic`.
    #[schema(example = "ecommerce")]
    pub protocol: Option<String>,
}

/// Response returned when a job is accepted for asynchronous processing
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct JobAcceptedResponse {
    pub job_id: Uuid,
    #[schema(example = "QUEUED")]
    pub state: JobState,
    pub protocol: AuditProtocol,
}

/// Full projection of one audit job for polling clients
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct JobStatusResponse {
    pub job_id: Uuid,
    pub state: JobState,
    pub phase: JobPhase,
    pub target_url: String,
    pub protocol: AuditProtocol,
    pub result: Option<Verdict>,
    pub log_lines: Vec<String>,
    pub steps: Vec<AuditStep>,
    pub tool_calls: Vec<ToolCall>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub screenshot: Option<String>,
    /// Computed at response time, not stored
    pub elapsed_ms: u64,
}

impl From<AuditJob> for JobStatusResponse {
    fn from(job: AuditJob) -> Self {
        let elapsed_ms = job.elapsed_ms();
        Self {
            job_id: job.job_id,
            state: job.state,
            phase: job.phase,
            target_url: job.target_url,
            protocol: job.protocol,
            result: job.result,
            log_lines: job.log_lines,
            steps: job.steps,
            tool_calls: job.tool_calls,
            screenshot: job.screenshot,
            elapsed_ms,
        }
    }
}

/// Collection projection, a dashboard affordance
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct JobListResponse {
    pub jobs: Vec<JobStatusResponse>,
    pub total: usize,
}

/// Error payload for submission-path failures
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub error: String,
    /// Present on capacity rejections: the configured maximum
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_concurrent_jobs: Option<usize>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            max_concurrent_jobs: None,
        }
    }

    pub fn capacity(error: impl Into<String>, max: usize) -> Self {
        Self {
            error: error.into(),
            max_concurrent_jobs: Some(max),
        }
    }
}

/// Health check response
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    #[schema(example = "healthy")]
    pub status: String,
    pub name: String,
    pub version: String,
    pub uptime_seconds: u64,
}
