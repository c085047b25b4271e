//! Agent execution seam.
//!
//! The browser-automation agent is an external collaborator: this core only
//! builds a mission payload, invokes the agent, and awaits its transcript.
//! The orchestrator imposes its own deadline — executors carry no timeout of
//! their own.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::domain::value_objects::AuditProtocol;
use crate::infrastructure::log_hub::AgentLogSink;

/// Mission handed to the agent for one audit run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MissionPayload {
    pub target_url: String,
    pub protocol: AuditProtocol,
    pub instructions: String,
}

impl MissionPayload {
    pub fn new(target_url: impl Into<String>, protocol: AuditProtocol) -> Self {
        let target_url = target_url.into();
        let instructions = format!(
            "Audit {} using the {} protocol. {} Conclude with a JSON verdict \
             object containing the key \"passed\".",
            target_url,
            protocol,
            protocol.mission_brief()
        );
        Self {
            target_url,
            protocol,
            instructions,
        }
    }
}

/// One record of the agent transcript.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum TranscriptEntry {
    #[serde(rename_all = "camelCase")]
    ToolUse {
        tool_name: String,
        input: String,
        output: String,
    },
    Message { text: String },
}

/// Full output of one agent run.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentRunOutput {
    /// The agent's final textual message, fed to the result parser
    pub final_text: String,
    #[serde(default)]
    pub transcript: Vec<TranscriptEntry>,
}

/// Agent execution errors.
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    #[error("Agent transport error: {0}")]
    Transport(String),
    #[error("Agent internal error: {0}")]
    Internal(String),
}

/// External agent-execution capability.
///
/// `run` has no built-in timeout; cancellation is the caller abandoning the
/// future. `cleanup` releases the scarce browser session and must be safe to
/// call on every exit path, including after abandonment.
#[async_trait]
pub trait AgentExecutor: Send + Sync {
    async fn run(
        &self,
        mission: MissionPayload,
        sink: AgentLogSink,
        max_steps: u32,
    ) -> Result<AgentRunOutput, AgentError>;

    /// Most recent out-of-band screenshot, if any. Screenshots are never
    /// embedded in the transcript itself.
    async fn take_screenshot(&self, job_id: uuid::Uuid) -> Option<String>;

    /// Release the automation resource held for `job_id`.
    async fn cleanup(&self, job_id: uuid::Uuid);
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RemoteRunRequest<'a> {
    mission: &'a MissionPayload,
    max_steps: u32,
    job_id: uuid::Uuid,
}

/// Agent executor backed by a remote agent-runtime service.
pub struct HttpAgentExecutor {
    client: Client,
    base_url: String,
}

impl HttpAgentExecutor {
    /// `base_url` is the agent runtime's root, e.g. `http://agent:4000`.
    /// The client is built without a request timeout: the orchestrator's
    /// deadline race is the only cancellation mechanism.
    pub fn new(base_url: impl Into<String>) -> Self {
        let client = Client::builder().build().unwrap_or_else(|e| {
            error!(error = %e, "Failed to build agent HTTP client, using default");
            Client::new()
        });
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl AgentExecutor for HttpAgentExecutor {
    async fn run(
        &self,
        mission: MissionPayload,
        sink: AgentLogSink,
        max_steps: u32,
    ) -> Result<AgentRunOutput, AgentError> {
        let url = format!("{}/v1/runs", self.base_url);
        sink.log("info", "agent", format!("Dispatching mission to {}", url));

        let response = self
            .client
            .post(&url)
            .json(&RemoteRunRequest {
                mission: &mission,
                max_steps,
                job_id: sink.job_id(),
            })
            .send()
            .await
            .map_err(|e| AgentError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AgentError::Internal(format!(
                "agent runtime returned {}: {}",
                status, body
            )));
        }

        let output: AgentRunOutput = response
            .json()
            .await
            .map_err(|e| AgentError::Transport(format!("invalid agent response: {}", e)))?;

        debug!(
            transcript_entries = output.transcript.len(),
            "Agent run completed"
        );
        Ok(output)
    }

    async fn take_screenshot(&self, job_id: uuid::Uuid) -> Option<String> {
        let url = format!("{}/v1/runs/{}/screenshot", self.base_url, job_id);
        let response = self.client.get(&url).send().await.ok()?;
        if !response.status().is_success() {
            return None;
        }
        response.text().await.ok().filter(|s| !s.is_empty())
    }

    async fn cleanup(&self, job_id: uuid::Uuid) {
        let url = format!("{}/v1/runs/{}", self.base_url, job_id);
        if let Err(e) = self.client.delete(&url).send().await {
            // Cleanup failures are logged, never escalated.
            tracing::warn!(job_id = %job_id, error = %e, "Agent cleanup request failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mission_payload_embeds_target_and_protocol() {
        let mission = MissionPayload::new("https://shop.example.com", AuditProtocol::Ecommerce);
        assert!(mission.instructions.contains("https://shop.example.com"));
        assert!(mission.instructions.contains("ecommerce"));
        assert!(mission.instructions.contains("\"passed\""));
    }

    #[test]
    fn transcript_entry_wire_format() {
        let entry = TranscriptEntry::ToolUse {
            tool_name: "navigate".into(),
            input: "https://example.com".into(),
            output: "ok".into(),
        };
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["kind"], "toolUse");
        assert_eq!(json["toolName"], "navigate");
    }
}
