//! Per-job log fan-out.
//!
//! Every job owns an ordered, append-only buffer of [`LogEntry`] values. At
//! most one subscriber callback is registered per job at a time; registering
//! again replaces the previous one (last-writer-wins — the only live consumer
//! is the polling endpoint's backing store). `append` stores the entry before
//! invoking the callback, so a `drain` immediately after an `append` always
//! observes the entry.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use uuid::Uuid;

use crate::domain::entities::LogEntry;

/// Subscriber invoked for each new entry after it has been buffered.
pub type LogCallback = Arc<dyn Fn(&LogEntry) + Send + Sync>;

#[derive(Default)]
struct JobChannel {
    buffer: Vec<LogEntry>,
    subscriber: Option<LogCallback>,
}

/// Concurrent per-job log hub.
#[derive(Default)]
pub struct LogHub {
    channels: Mutex<HashMap<Uuid, JobChannel>>,
}

impl LogHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry to the job's buffer, then notify the subscriber if
    /// one is registered. The callback runs outside the hub lock.
    pub fn append(&self, job_id: Uuid, entry: LogEntry) {
        let subscriber = {
            let mut channels = self.channels.lock().unwrap_or_else(PoisonError::into_inner);
            let channel = channels.entry(job_id).or_default();
            channel.buffer.push(entry.clone());
            channel.subscriber.clone()
        };
        if let Some(callback) = subscriber {
            callback(&entry);
        }
    }

    /// Register the job's subscriber, replacing any previous one.
    pub fn subscribe(&self, job_id: Uuid, callback: LogCallback) {
        let mut channels = self.channels.lock().unwrap_or_else(PoisonError::into_inner);
        channels.entry(job_id).or_default().subscriber = Some(callback);
    }

    /// Remove the job's subscriber. The buffer persists for later inspection.
    pub fn unsubscribe(&self, job_id: Uuid) {
        let mut channels = self.channels.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(channel) = channels.get_mut(&job_id) {
            channel.subscriber = None;
        }
    }

    /// Snapshot of all entries appended so far, in append order.
    pub fn drain(&self, job_id: Uuid) -> Vec<LogEntry> {
        let channels = self.channels.lock().unwrap_or_else(PoisonError::into_inner);
        channels
            .get(&job_id)
            .map(|channel| channel.buffer.clone())
            .unwrap_or_default()
    }

    /// A sink handle bound to one job, for code paths (the agent's tool
    /// layer) that should not have to thread the job ID explicitly.
    pub fn sink(self: &Arc<Self>, job_id: Uuid) -> AgentLogSink {
        AgentLogSink {
            hub: Arc::clone(self),
            job_id,
        }
    }
}

/// Log routing handle carried along the call path of one job.
///
/// Binding the job ID into the handle, rather than a shared "current job"
/// pointer, keeps concurrent jobs from misrouting each other's lines.
#[derive(Clone)]
pub struct AgentLogSink {
    hub: Arc<LogHub>,
    job_id: Uuid,
}

impl AgentLogSink {
    pub fn job_id(&self) -> Uuid {
        self.job_id
    }

    pub fn log(&self, level: &str, source: &str, message: impl Into<String>) {
        self.hub
            .append(self.job_id, LogEntry::new(level, source, message));
    }

    pub fn log_with_data(
        &self,
        level: &str,
        source: &str,
        message: impl Into<String>,
        data: serde_json::Value,
    ) {
        self.hub.append(
            self.job_id,
            LogEntry::new(level, source, message).with_data(data),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn drain_returns_entries_in_append_order() {
        let hub = LogHub::new();
        let job_id = Uuid::new_v4();
        for i in 0..5 {
            hub.append(job_id, LogEntry::new("info", "test", format!("line {i}")));
        }
        let entries = hub.drain(job_id);
        assert_eq!(entries.len(), 5);
        for (i, entry) in entries.iter().enumerate() {
            assert_eq!(entry.message, format!("line {i}"));
        }
    }

    #[test]
    fn drain_works_without_a_subscriber() {
        let hub = LogHub::new();
        let job_id = Uuid::new_v4();
        hub.append(job_id, LogEntry::new("info", "test", "one"));
        assert_eq!(hub.drain(job_id).len(), 1);
    }

    #[test]
    fn subscriber_sees_each_entry_after_it_is_buffered() {
        let hub = Arc::new(LogHub::new());
        let job_id = Uuid::new_v4();
        let seen = Arc::new(AtomicUsize::new(0));

        let hub_inner = Arc::clone(&hub);
        let seen_inner = Arc::clone(&seen);
        hub.subscribe(
            job_id,
            Arc::new(move |_entry| {
                // Store-before-notify: the buffer already holds the entry.
                let buffered = hub_inner.drain(job_id).len();
                let count = seen_inner.fetch_add(1, Ordering::SeqCst) + 1;
                assert!(buffered >= count);
            }),
        );

        hub.append(job_id, LogEntry::new("info", "test", "a"));
        hub.append(job_id, LogEntry::new("info", "test", "b"));
        assert_eq!(seen.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn second_subscribe_replaces_the_first() {
        let hub = LogHub::new();
        let job_id = Uuid::new_v4();
        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));

        let c = Arc::clone(&first);
        hub.subscribe(job_id, Arc::new(move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        }));
        let c = Arc::clone(&second);
        hub.subscribe(job_id, Arc::new(move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        }));

        hub.append(job_id, LogEntry::new("info", "test", "line"));
        assert_eq!(first.load(Ordering::SeqCst), 0);
        assert_eq!(second.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn unsubscribe_keeps_the_buffer() {
        let hub = LogHub::new();
        let job_id = Uuid::new_v4();
        hub.subscribe(job_id, Arc::new(|_| {}));
        hub.append(job_id, LogEntry::new("info", "test", "kept"));
        hub.unsubscribe(job_id);
        hub.append(job_id, LogEntry::new("info", "test", "still kept"));
        assert_eq!(hub.drain(job_id).len(), 2);
    }

    #[test]
    fn sink_routes_to_its_own_job_only() {
        let hub = Arc::new(LogHub::new());
        let job_a = Uuid::new_v4();
        let job_b = Uuid::new_v4();
        let sink_a = hub.sink(job_a);
        let sink_b = hub.sink(job_b);

        sink_a.log("info", "browser", "navigated");
        sink_b.log("warn", "browser", "blocked");
        sink_a.log("info", "browser", "clicked");

        assert_eq!(hub.drain(job_a).len(), 2);
        assert_eq!(hub.drain(job_b).len(), 1);
        assert_eq!(hub.drain(job_b)[0].message, "blocked");
    }
}
