//! Audit domain entities

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::value_objects::{
    AuditProtocol, JobPhase, JobState, JobTransitionError, Rating, Severity, StepStatus,
};

/// One discovered issue contributing to the verdict.
///
/// Agents sometimes emit a bare title string instead of the structured form
/// when no detail was recoverable; both shapes round-trip through the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum Finding {
    Detailed {
        severity: Severity,
        title: String,
        description: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        evidence: Option<String>,
    },
    Title(String),
}

impl Finding {
    pub fn titled(title: impl Into<String>) -> Self {
        Self::Title(title.into())
    }

    pub fn detailed(severity: Severity, title: impl Into<String>, description: impl Into<String>) -> Self {
        Self::Detailed {
            severity,
            title: title.into(),
            description: description.into(),
            evidence: None,
        }
    }

    /// Effective severity. Bare titles carry no structured severity and do
    /// not deduct from the score.
    pub fn severity(&self) -> Severity {
        match self {
            Self::Detailed { severity, .. } => *severity,
            Self::Title(_) => Severity::Info,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Self::Detailed { title, .. } => title,
            Self::Title(title) => title,
        }
    }
}

/// Structured, scored outcome of an audit job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Verdict {
    pub passed: bool,
    /// 0-100 resilience score
    pub score: u8,
    pub rating: Rating,
    pub findings: Vec<Finding>,
    pub recommendations: Vec<String>,
    /// Set when the run itself failed, as opposed to a discovered weakness
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub critical_failure: Option<String>,
    /// Wall-clock duration from job creation to finalization
    pub latency_ms: u64,
}

impl Verdict {
    /// Verdict recorded when the run itself failed (agent error, timeout,
    /// or an escaped error inside the runner).
    pub fn run_failure(message: impl Into<String>, latency_ms: u64) -> Self {
        Self {
            passed: false,
            score: 0,
            rating: Rating::F,
            findings: Vec::new(),
            recommendations: Vec::new(),
            critical_failure: Some(message.into()),
            latency_ms,
        }
    }
}

/// One step of the audit, as surfaced to polling clients.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuditStep {
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<String>,
    pub status: StepStatus,
    pub timestamp: DateTime<Utc>,
}

/// One tool invocation recovered from the agent transcript.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ToolCall {
    pub tool_name: String,
    pub input: String,
    pub output: String,
    pub timestamp: DateTime<Utc>,
}

/// A single log line routed through the log hub. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub level: String,
    pub source: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl LogEntry {
    pub fn new(level: impl Into<String>, source: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            level: level.into(),
            source: source.into(),
            message: message.into(),
            data: None,
        }
    }

    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }

    /// Render the entry as a display line for the job's `log_lines` buffer.
    pub fn format_line(&self) -> String {
        format!(
            "[{}] [{}] {}: {}",
            self.timestamp.format("%H:%M:%S%.3f"),
            self.level.to_uppercase(),
            self.source,
            self.message
        )
    }
}

/// One end-to-end audit run against one target.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditJob {
    pub job_id: Uuid,
    pub target_url: String,
    pub protocol: AuditProtocol,
    pub state: JobState,
    pub phase: JobPhase,
    pub created_at: DateTime<Utc>,
    /// Formatted log lines, append-only while the job is live
    pub log_lines: Vec<String>,
    pub steps: Vec<AuditStep>,
    pub tool_calls: Vec<ToolCall>,
    /// Most recent capture only; overwritten, never accumulated
    pub screenshot: Option<String>,
    /// Present once the job reaches a terminal state, then immutable
    pub result: Option<Verdict>,
}

impl AuditJob {
    pub fn new(target_url: String, protocol: AuditProtocol) -> Self {
        Self {
            job_id: Uuid::new_v4(),
            target_url,
            protocol,
            state: JobState::Queued,
            phase: JobPhase::Initializing,
            created_at: Utc::now(),
            log_lines: Vec::new(),
            steps: Vec::new(),
            tool_calls: Vec::new(),
            screenshot: None,
            result: None,
        }
    }

    /// Validated state transition.
    pub fn transition(&mut self, to: JobState) -> Result<(), JobTransitionError> {
        if !self.state.can_transition_to(&to) {
            return Err(JobTransitionError {
                from: self.state,
                to,
            });
        }
        self.state = to;
        Ok(())
    }

    /// Append a new step in `Running` status and return its index.
    pub fn push_step(&mut self, description: impl Into<String>, tool: Option<String>) -> usize {
        self.steps.push(AuditStep {
            description: description.into(),
            tool,
            input: None,
            status: StepStatus::Running,
            timestamp: Utc::now(),
        });
        self.steps.len() - 1
    }

    /// Settle the most recent unsettled step. Settled steps never regress.
    pub fn settle_last_step(&mut self, status: StepStatus) {
        if let Some(step) = self.steps.iter_mut().rev().find(|s| !s.status.is_settled()) {
            step.status = status;
        }
    }

    /// Milliseconds elapsed since creation, computed at call time.
    pub fn elapsed_ms(&self) -> u64 {
        (Utc::now() - self.created_at).num_milliseconds().max(0) as u64
    }
}
