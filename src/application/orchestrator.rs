//! Submission façade: validates, gates, records, and spawns audit jobs.

use std::sync::Arc;

use tracing::info;
use url::Url;

use crate::application::runner::{spawn_job_runner, JobRunnerContext};
use crate::domain::entities::AuditJob;
use crate::domain::value_objects::AuditProtocol;
use crate::infrastructure::JobStore;

/// Hostnames that are never valid audit targets (anti-SSRF policy).
const BLOCKED_HOSTS: [&str; 4] = ["localhost", "127.0.0.1", "0.0.0.0", "::1"];

/// Synchronous submission-path failures. Anything past submission is only
/// ever observable as a terminal job state, never as an error to the caller.
#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    #[error("targetUrl is required and must be an absolute http(s) URL")]
    InvalidUrl,
    #[error("Target host '{0}' is not allowed")]
    BlockedHost(String),
    #[error("Audit capacity exceeded: at most {max} concurrent jobs")]
    CapacityExceeded { max: usize },
}

/// Entry point for audit submissions.
pub struct Orchestrator {
    ctx: JobRunnerContext,
}

impl Orchestrator {
    pub fn new(ctx: JobRunnerContext) -> Self {
        Self { ctx }
    }

    pub fn store(&self) -> &Arc<JobStore> {
        &self.ctx.store
    }

    pub fn max_concurrent(&self) -> usize {
        self.ctx.admission.max_concurrent()
    }

    /// Validate the submission, reserve an admission slot, create the job
    /// record, and spawn its runner. Returns immediately with the queued job.
    pub fn submit(
        &self,
        target_url: &str,
        protocol: Option<&str>,
    ) -> Result<AuditJob, SubmitError> {
        let host = validate_target(target_url)?;
        let protocol = AuditProtocol::parse_or_default(protocol);

        let job = AuditJob::new(target_url.to_string(), protocol);
        if !self.ctx.admission.try_admit(job.job_id) {
            return Err(SubmitError::CapacityExceeded {
                max: self.ctx.admission.max_concurrent(),
            });
        }

        self.ctx.store.insert(job.clone());
        spawn_job_runner(self.ctx.clone(), job.job_id);

        info!(
            job_id = %job.job_id,
            target_host = %host,
            protocol = %protocol,
            "Audit job submitted"
        );
        Ok(job)
    }
}

/// Parse and vet the target URL, returning its host.
fn validate_target(target_url: &str) -> Result<String, SubmitError> {
    let url = Url::parse(target_url).map_err(|_| SubmitError::InvalidUrl)?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(SubmitError::InvalidUrl);
    }
    let host = url
        .host_str()
        .ok_or(SubmitError::InvalidUrl)?
        .trim_start_matches('[')
        .trim_end_matches(']')
        .to_string();
    if BLOCKED_HOSTS.contains(&host.as_str()) {
        return Err(SubmitError::BlockedHost(host));
    }
    Ok(host)
}
