//! Infrastructure: stores, admission control, log routing, agent transport

pub mod admission;
pub mod agent;
pub mod job_store;
pub mod log_hub;

pub use admission::AdmissionController;
pub use agent::{AgentError, AgentExecutor, AgentRunOutput, HttpAgentExecutor, MissionPayload, TranscriptEntry};
pub use job_store::{JobStore, JobStoreError};
pub use log_hub::{AgentLogSink, LogHub};
