//! Admission control: bounds the number of simultaneously running jobs.
//!
//! A counting semaphore keyed by job ID rather than an anonymous counter, so
//! a duplicate release can never under-count capacity.

use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};

use uuid::Uuid;

pub struct AdmissionController {
    max_concurrent: usize,
    admitted: Mutex<HashSet<Uuid>>,
}

impl AdmissionController {
    pub fn new(max_concurrent: usize) -> Self {
        Self {
            max_concurrent: max_concurrent.max(1),
            admitted: Mutex::new(HashSet::new()),
        }
    }

    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    /// Reserve a slot for `job_id`. Fails without side effects when the
    /// configured maximum is reached.
    pub fn try_admit(&self, job_id: Uuid) -> bool {
        let mut admitted = self.admitted.lock().unwrap_or_else(PoisonError::into_inner);
        if admitted.len() >= self.max_concurrent {
            return false;
        }
        admitted.insert(job_id)
    }

    /// Release the slot held by `job_id`. Idempotent: releasing an ID that
    /// is not admitted is a no-op.
    pub fn release(&self, job_id: Uuid) {
        let mut admitted = self.admitted.lock().unwrap_or_else(PoisonError::into_inner);
        admitted.remove(&job_id);
    }

    pub fn admitted_count(&self) -> usize {
        self.admitted
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}
