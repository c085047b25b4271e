//! Job runner: drives one audit job through its state machine.
//!
//! ```text
//! Orchestrator        JobRunner           AgentExecutor      JobStore
//!     │                   │                    │                │
//!     ├─ spawn ──────────►│                    │                │
//!     │                   ├─ Processing ──────────────────────►│
//!     │                   ├─ run(mission) ────►│                │
//!     │                   │   (raced against the deadline)      │
//!     │                   │◄── transcript ─────┤                │
//!     │                   ├─ parse + score     │                │
//!     │                   ├─ finalize (once) ─────────────────►│
//!     │                   └─ cleanup: agent, log hub, admission slot
//! ```
//!
//! The deadline race is the only cancellation mechanism: the loser is
//! dropped, never awaited further, and the store's first-write-wins
//! `finalize` keeps a late loser from mutating terminal state. Cleanup runs
//! on every exit path.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::application::parser::{ParseStrategy, ParsedVerdict, ResultParser};
use crate::application::scoring::ScoringEngine;
use crate::config::AuditConfig;
use crate::domain::entities::{LogEntry, ToolCall, Verdict};
use crate::domain::value_objects::{JobPhase, JobState, JobTransitionError, Rating, Severity, StepStatus};
use crate::infrastructure::agent::{AgentError, AgentExecutor, MissionPayload, TranscriptEntry};
use crate::infrastructure::job_store::JobStoreError;
use crate::infrastructure::{AdmissionController, JobStore, LogHub};

/// Shared dependencies handed to every job runner.
#[derive(Clone)]
pub struct JobRunnerContext {
    pub store: Arc<JobStore>,
    pub admission: Arc<AdmissionController>,
    pub log_hub: Arc<LogHub>,
    pub agent: Arc<dyn AgentExecutor>,
    pub audit: AuditConfig,
    /// Cancelled on graceful shutdown; in-flight runs are abandoned.
    pub shutdown: CancellationToken,
}

/// Errors surfaced inside the job body. Never propagate to the submitter;
/// they are converted to a terminal FAIL verdict.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    #[error("Audit deadline of {0}s exceeded")]
    DeadlineExceeded(u64),
    #[error("Audit abandoned: service shutting down")]
    ShuttingDown,
    #[error(transparent)]
    Agent(#[from] AgentError),
    #[error(transparent)]
    Store(#[from] JobStoreError),
    #[error(transparent)]
    Transition(#[from] JobTransitionError),
}

/// Spawn the detached task owning one job's lifecycle.
pub fn spawn_job_runner(ctx: JobRunnerContext, job_id: Uuid) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        if let Err(err) = run_job(&ctx, job_id).await {
            record_failure(&ctx, job_id, &err);
        }
        release_resources(&ctx, job_id).await;
    })
}

async fn run_job(ctx: &JobRunnerContext, job_id: Uuid) -> Result<(), RunnerError> {
    // Route every hub entry into the job's display buffer. The subscriber is
    // the polling endpoint's backing store; it is replaced wholesale if a
    // runner were ever restarted for the same job.
    let store = Arc::clone(&ctx.store);
    ctx.log_hub.subscribe(
        job_id,
        Arc::new(move |entry| {
            let line = entry.format_line();
            if store.with_job_mut(job_id, |job| job.log_lines.push(line)).is_err() {
                debug!(job_id = %job_id, "Dropped log line for unknown job");
            }
        }),
    );
    let sink = ctx.log_hub.sink(job_id);

    // ── Queued → Processing ──────────────────────────────────────────
    let (target_url, protocol) = ctx.store.with_job_mut(job_id, |job| {
        job.transition(JobState::Processing)?;
        job.phase = JobPhase::Initializing;
        job.push_step("Initializing audit agent", None);
        Ok::<_, JobTransitionError>((job.target_url.clone(), job.protocol))
    })??;
    sink.log("info", "orchestrator", "Phase INITIALIZING");
    info!(job_id = %job_id, target_url, "Audit job processing started");

    // ── Mission construction ─────────────────────────────────────────
    ctx.store
        .with_job_mut(job_id, |job| job.phase = JobPhase::AgentInit)?;
    sink.log(
        "info",
        "orchestrator",
        format!("Phase AGENT_INIT: {} mission against {}", protocol, target_url),
    );
    let mission = MissionPayload::new(target_url, protocol);

    // ── Agent execution raced against the deadline ───────────────────
    ctx.store.with_job_mut(job_id, |job| {
        job.phase = JobPhase::AgentRunning;
        job.settle_last_step(StepStatus::Completed);
        job.push_step("Executing audit mission", None);
    })?;
    sink.log("info", "orchestrator", "Phase AGENT_RUNNING");

    let deadline = Duration::from_secs(ctx.audit.timeout_seconds);
    let output = tokio::select! {
        result = ctx.agent.run(mission, sink.clone(), ctx.audit.max_agent_steps) => result?,
        _ = tokio::time::sleep(deadline) => {
            return Err(RunnerError::DeadlineExceeded(ctx.audit.timeout_seconds));
        }
        _ = ctx.shutdown.cancelled() => {
            return Err(RunnerError::ShuttingDown);
        }
    };

    // ── Transcript folding ───────────────────────────────────────────
    let screenshot = ctx.agent.take_screenshot(job_id).await;
    ctx.store.with_job_mut(job_id, |job| {
        job.phase = JobPhase::ParsingResults;
        job.settle_last_step(StepStatus::Completed);
        for entry in &output.transcript {
            if let TranscriptEntry::ToolUse {
                tool_name,
                input,
                output: tool_output,
            } = entry
            {
                job.tool_calls.push(ToolCall {
                    tool_name: tool_name.clone(),
                    input: input.clone(),
                    output: tool_output.clone(),
                    timestamp: Utc::now(),
                });
                let idx = job.push_step(format!("Tool: {tool_name}"), Some(tool_name.clone()));
                job.steps[idx].input = Some(input.clone());
                job.steps[idx].status = StepStatus::Completed;
            }
        }
        job.screenshot = screenshot;
    })?;
    sink.log("info", "orchestrator", "Phase PARSING_RESULTS");

    // ── Parse, score, finalize ───────────────────────────────────────
    let parsed = ResultParser::parse(&output.final_text);
    sink.log(
        "info",
        "orchestrator",
        match parsed.strategy {
            ParseStrategy::Strict => "Verdict object extracted from transcript",
            ParseStrategy::ParseError => "Verdict region unparseable, degraded verdict recorded",
            ParseStrategy::NoVerdict => "No verdict object in transcript, degraded verdict recorded",
        },
    );

    let latency_ms = ctx.store.with_job_mut(job_id, |job| job.elapsed_ms())?;
    let verdict = assemble_verdict(parsed, latency_ms);
    let state = if verdict.passed { JobState::Pass } else { JobState::Fail };

    if ctx.store.finalize(job_id, state, JobPhase::Completed, verdict)? {
        sink.log("info", "orchestrator", format!("Audit finalized: {state}"));
        info!(job_id = %job_id, state = %state, latency_ms, "Audit job finalized");
    } else {
        warn!(job_id = %job_id, "Finalize skipped: job already terminal");
    }
    Ok(())
}

/// Assemble the verdict from the parsed outcome.
///
/// An explicit score in the transcript wins. When the strict strategy parsed
/// a verdict that omitted the score, one is derived from the findings; with
/// nothing to score, the neutral default of 50 applies. A CRITICAL finding
/// forces `passed = false` no matter what the agent claimed.
pub fn assemble_verdict(parsed: ParsedVerdict, latency_ms: u64) -> Verdict {
    let has_critical = parsed
        .findings
        .iter()
        .any(|f| f.severity() == Severity::Critical);

    let score = match parsed.score {
        Some(score) => score,
        None if parsed.findings.is_empty() => 50,
        None => ScoringEngine::score(&parsed.findings).score,
    };

    Verdict {
        passed: parsed.passed && !has_critical,
        score,
        rating: Rating::from_score(score),
        findings: parsed.findings,
        recommendations: parsed.recommendations,
        critical_failure: parsed.critical_failure,
        latency_ms,
    }
}

/// Convert a runner error into the terminal FAIL verdict.
fn record_failure(ctx: &JobRunnerContext, job_id: Uuid, err: &RunnerError) {
    error!(job_id = %job_id, error = %err, "Audit job failed");
    let latency_ms = ctx
        .store
        .get(job_id)
        .map(|job| job.elapsed_ms())
        .unwrap_or(0);
    let verdict = Verdict::run_failure(err.to_string(), latency_ms);

    match ctx
        .store
        .finalize(job_id, JobState::Fail, JobPhase::Error, verdict)
    {
        Ok(true) => {
            if ctx
                .store
                .with_job_mut(job_id, |job| job.settle_last_step(StepStatus::Failed))
                .is_err()
            {
                debug!(job_id = %job_id, "Failure bookkeeping skipped for unknown job");
            }
            ctx.log_hub.append(
                job_id,
                LogEntry::new("error", "orchestrator", format!("Audit failed: {err}")),
            );
        }
        Ok(false) => warn!(job_id = %job_id, "Failure finalize skipped: job already terminal"),
        Err(store_err) => error!(job_id = %job_id, error = %store_err, "Failure finalize errored"),
    }
}

/// Scoped cleanup, run unconditionally on every exit path: the agent's
/// automation resource, the log subscriber, and the admission slot.
async fn release_resources(ctx: &JobRunnerContext, job_id: Uuid) {
    ctx.agent.cleanup(job_id).await;
    ctx.log_hub.append(
        job_id,
        LogEntry::new("info", "orchestrator", "Cleanup complete"),
    );
    ctx.log_hub.unsubscribe(job_id);
    ctx.admission.release(job_id);
    debug!(job_id = %job_id, "Job resources released");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::Finding;

    fn strict(parsed_score: Option<u8>, passed: bool, findings: Vec<Finding>) -> ParsedVerdict {
        ParsedVerdict {
            passed,
            score: parsed_score,
            findings,
            recommendations: vec![],
            critical_failure: None,
            strategy: ParseStrategy::Strict,
        }
    }

    #[test]
    fn explicit_score_wins() {
        let verdict = assemble_verdict(strict(Some(95), true, vec![]), 1234);
        assert!(verdict.passed);
        assert_eq!(verdict.score, 95);
        assert_eq!(verdict.rating, Rating::A);
        assert_eq!(verdict.latency_ms, 1234);
    }

    #[test]
    fn missing_score_without_findings_defaults_to_fifty() {
        let verdict = assemble_verdict(strict(None, true, vec![]), 10);
        assert_eq!(verdict.score, 50);
        assert_eq!(verdict.rating, Rating::C);
        assert!(verdict.passed);
    }

    #[test]
    fn missing_score_is_derived_from_findings() {
        let findings = vec![
            Finding::detailed(Severity::High, "a", "b"),
            Finding::detailed(Severity::Medium, "c", "d"),
        ];
        let verdict = assemble_verdict(strict(None, true, findings), 10);
        assert_eq!(verdict.score, 70);
        assert_eq!(verdict.rating, Rating::C);
    }

    #[test]
    fn critical_finding_overrides_claimed_pass() {
        let findings = vec![Finding::detailed(Severity::Critical, "RCE", "remote shell")];
        let verdict = assemble_verdict(strict(Some(95), true, findings), 10);
        assert!(!verdict.passed);
        assert_eq!(verdict.score, 95);
    }

    #[test]
    fn run_failure_verdict_shape() {
        let verdict = Verdict::run_failure("agent exploded", 77);
        assert!(!verdict.passed);
        assert_eq!(verdict.score, 0);
        assert_eq!(verdict.rating, Rating::F);
        assert_eq!(verdict.critical_failure.as_deref(), Some("agent exploded"));
        assert_eq!(verdict.latency_ms, 77);
    }
}
