//! Authoritative in-memory record of every audit job.
//!
//! The store owns the job map; runners mutate their own job through it and
//! polling handlers read clones, so a poll never observes a torn record.
//! Jobs are never deleted by the core — retention is an external policy.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use uuid::Uuid;

use crate::domain::entities::{AuditJob, Verdict};
use crate::domain::value_objects::{JobPhase, JobState};

/// Job store errors.
#[derive(Debug, thiserror::Error)]
pub enum JobStoreError {
    #[error("Job not found: {0}")]
    NotFound(Uuid),
}

#[derive(Default)]
pub struct JobStore {
    jobs: RwLock<HashMap<Uuid, AuditJob>>,
}

impl JobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, job: AuditJob) {
        let mut jobs = self.jobs.write().unwrap_or_else(PoisonError::into_inner);
        jobs.insert(job.job_id, job);
    }

    /// Snapshot of one job.
    pub fn get(&self, job_id: Uuid) -> Option<AuditJob> {
        let jobs = self.jobs.read().unwrap_or_else(PoisonError::into_inner);
        jobs.get(&job_id).cloned()
    }

    /// Snapshot of every known job, newest first.
    pub fn list(&self) -> Vec<AuditJob> {
        let jobs = self.jobs.read().unwrap_or_else(PoisonError::into_inner);
        let mut all: Vec<AuditJob> = jobs.values().cloned().collect();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        all
    }

    pub fn len(&self) -> usize {
        self.jobs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Mutate one job under the write lock and return the closure's result.
    pub fn with_job_mut<R>(
        &self,
        job_id: Uuid,
        f: impl FnOnce(&mut AuditJob) -> R,
    ) -> Result<R, JobStoreError> {
        let mut jobs = self.jobs.write().unwrap_or_else(PoisonError::into_inner);
        let job = jobs.get_mut(&job_id).ok_or(JobStoreError::NotFound(job_id))?;
        Ok(f(job))
    }

    /// Write the terminal state and verdict exactly once.
    ///
    /// First write wins: returns `Ok(false)` without touching the job when it
    /// is already terminal, which is what keeps an abandoned deadline-race
    /// loser from mutating state after the race resolved.
    pub fn finalize(
        &self,
        job_id: Uuid,
        state: JobState,
        phase: JobPhase,
        verdict: Verdict,
    ) -> Result<bool, JobStoreError> {
        debug_assert!(state.is_terminal());
        let mut jobs = self.jobs.write().unwrap_or_else(PoisonError::into_inner);
        let job = jobs.get_mut(&job_id).ok_or(JobStoreError::NotFound(job_id))?;

        if job.state.is_terminal() {
            return Ok(false);
        }
        if job.transition(state).is_err() {
            return Ok(false);
        }
        job.phase = phase;
        job.result = Some(verdict);
        Ok(true)
    }
}
