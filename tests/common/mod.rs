//! Shared test harness

pub mod mocks;

use std::sync::Arc;
use std::time::Duration;

use aegis::config::Config;
use aegis::domain::entities::AuditJob;
use aegis::infrastructure::JobStore;
use uuid::Uuid;

/// Config with test-sized knobs. Docs are disabled to keep routers lean.
#[allow(dead_code)]
pub fn test_config(max_concurrent_jobs: usize, timeout_seconds: u64) -> Config {
    let mut config = Config::default();
    config.audit.max_concurrent_jobs = max_concurrent_jobs;
    config.audit.timeout_seconds = timeout_seconds;
    config.server.enable_docs = false;
    config
}

/// Poll the store until the job reaches a terminal state.
#[allow(dead_code)]
pub async fn wait_for_terminal(store: &Arc<JobStore>, job_id: Uuid) -> AuditJob {
    for _ in 0..500 {
        if let Some(job) = store.get(job_id) {
            if job.state.is_terminal() {
                return job;
            }
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("job {job_id} did not reach a terminal state in time");
}
