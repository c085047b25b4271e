//! Audit domain value objects

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Lifecycle state of an audit job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobState {
    /// Job accepted, runner not started yet
    Queued,
    /// Runner is driving the audit
    Processing,
    /// Terminal: audit completed and the target passed
    Pass,
    /// Terminal: audit failed, timed out, or the target did not pass
    Fail,
}

impl JobState {
    /// Returns the set of valid target states from the current state.
    ///
    /// ```text
    /// Queued ──► Processing ──► Pass
    ///                 │
    ///                 └───────► Fail
    /// ```
    pub fn valid_transitions(&self) -> &[JobState] {
        match self {
            Self::Queued => &[Self::Processing],
            Self::Processing => &[Self::Pass, Self::Fail],
            Self::Pass | Self::Fail => &[],
        }
    }

    /// Check whether transitioning to `target` is allowed from the current state.
    pub fn can_transition_to(&self, target: &JobState) -> bool {
        self.valid_transitions().contains(target)
    }

    /// Whether this state represents a terminal (final) state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Pass | Self::Fail)
    }
}

impl std::fmt::Display for JobState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Queued => write!(f, "QUEUED"),
            Self::Processing => write!(f, "PROCESSING"),
            Self::Pass => write!(f, "PASS"),
            Self::Fail => write!(f, "FAIL"),
        }
    }
}

/// Error returned when an invalid state transition is attempted.
#[derive(Debug, thiserror::Error)]
#[error("Invalid job transition from {from} to {to}")]
pub struct JobTransitionError {
    pub from: JobState,
    pub to: JobState,
}

/// Advisory sub-state label for observability. Never used for control flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobPhase {
    Initializing,
    AgentInit,
    AgentRunning,
    ParsingResults,
    Completed,
    Error,
}

impl std::fmt::Display for JobPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Initializing => write!(f, "INITIALIZING"),
            Self::AgentInit => write!(f, "AGENT_INIT"),
            Self::AgentRunning => write!(f, "AGENT_RUNNING"),
            Self::ParsingResults => write!(f, "PARSING_RESULTS"),
            Self::Completed => write!(f, "COMPLETED"),
            Self::Error => write!(f, "ERROR"),
        }
    }
}

/// Severity of a single finding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    #[serde(alias = "critical", alias = "Critical")]
    Critical,
    #[serde(alias = "high", alias = "High")]
    High,
    #[serde(alias = "medium", alias = "Medium")]
    Medium,
    #[serde(alias = "low", alias = "Low")]
    Low,
    #[serde(alias = "info", alias = "Info", alias = "informational")]
    Info,
}

impl Severity {
    /// Score deduction applied per finding of this severity.
    pub fn weight(&self) -> u8 {
        match self {
            Self::Critical => 40,
            Self::High => 20,
            Self::Medium => 10,
            Self::Low => 5,
            Self::Info => 0,
        }
    }
}

/// Letter rating derived from the numeric score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum Rating {
    A,
    B,
    C,
    D,
    F,
}

impl Rating {
    /// Map a 0-100 score to its letter rating (inclusive lower bounds).
    pub fn from_score(score: u8) -> Self {
        match score {
            90..=u8::MAX => Self::A,
            75..=89 => Self::B,
            50..=74 => Self::C,
            25..=49 => Self::D,
            _ => Self::F,
        }
    }
}

/// Status of a single audit step. Moves forward only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl StepStatus {
    pub fn is_settled(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

/// Audit protocol selecting the mission brief handed to the agent.
///
/// Unrecognized protocol strings fall back to [`AuditProtocol::Generic`]
/// rather than rejecting the submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum AuditProtocol {
    #[default]
    Generic,
    Ecommerce,
    Authentication,
    Api,
}

impl AuditProtocol {
    /// Parse a protocol label, falling back to the default when unrecognized
    /// or absent.
    pub fn parse_or_default(input: Option<&str>) -> Self {
        match input.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
            Some("ecommerce") => Self::Ecommerce,
            Some("authentication") | Some("auth") => Self::Authentication,
            Some("api") => Self::Api,
            _ => Self::Generic,
        }
    }

    /// One-line mission brief for the agent payload.
    pub fn mission_brief(&self) -> &'static str {
        match self {
            Self::Generic => "Probe the target for resilience and security weaknesses.",
            Self::Ecommerce => "Exercise catalog, cart, and checkout flows for abuse paths.",
            Self::Authentication => "Exercise login, session, and account recovery flows.",
            Self::Api => "Enumerate and probe exposed API endpoints.",
        }
    }
}

impl std::fmt::Display for AuditProtocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Generic => write!(f, "generic"),
            Self::Ecommerce => write!(f, "ecommerce"),
            Self::Authentication => write!(f, "authentication"),
            Self::Api => write!(f, "api"),
        }
    }
}
