//! Mock agent executor for integration tests

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use uuid::Uuid;

use aegis::infrastructure::agent::{
    AgentError, AgentExecutor, AgentRunOutput, MissionPayload, TranscriptEntry,
};
use aegis::infrastructure::log_hub::AgentLogSink;

pub enum MockBehavior {
    Respond {
        final_text: String,
        transcript: Vec<TranscriptEntry>,
    },
    Error(String),
    /// Never resolves; exercises the deadline race.
    Hang,
}

/// Scripted agent. Records cleanup calls so tests can assert that every
/// exit path releases the automation resource.
pub struct MockAgentExecutor {
    behavior: MockBehavior,
    screenshot: Option<String>,
    cleanups: AtomicUsize,
}

impl MockAgentExecutor {
    pub fn respond(final_text: impl Into<String>) -> Self {
        Self {
            behavior: MockBehavior::Respond {
                final_text: final_text.into(),
                transcript: Vec::new(),
            },
            screenshot: None,
            cleanups: AtomicUsize::new(0),
        }
    }

    /// A clean pass: explicit score, no findings, verdict embedded in prose
    /// the way real agents close out a mission.
    pub fn passing() -> Self {
        Self::respond(
            "Audit complete. The target held up well. \
             {\"passed\": true, \"resilienceScore\": 92, \"findings\": [], \
             \"recommendations\": [\"Enable HSTS preload\"]}",
        )
    }

    pub fn erroring(message: impl Into<String>) -> Self {
        Self {
            behavior: MockBehavior::Error(message.into()),
            screenshot: None,
            cleanups: AtomicUsize::new(0),
        }
    }

    pub fn hanging() -> Self {
        Self {
            behavior: MockBehavior::Hang,
            screenshot: None,
            cleanups: AtomicUsize::new(0),
        }
    }

    pub fn with_transcript(mut self, transcript: Vec<TranscriptEntry>) -> Self {
        if let MockBehavior::Respond {
            transcript: ref mut t,
            ..
        } = self.behavior
        {
            *t = transcript;
        }
        self
    }

    pub fn with_screenshot(mut self, data: impl Into<String>) -> Self {
        self.screenshot = Some(data.into());
        self
    }

    pub fn cleanup_count(&self) -> usize {
        self.cleanups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AgentExecutor for MockAgentExecutor {
    async fn run(
        &self,
        _mission: MissionPayload,
        sink: AgentLogSink,
        _max_steps: u32,
    ) -> Result<AgentRunOutput, AgentError> {
        match &self.behavior {
            MockBehavior::Respond {
                final_text,
                transcript,
            } => {
                sink.log("info", "agent", "Mission started");
                sink.log("info", "agent", "Mission complete");
                Ok(AgentRunOutput {
                    final_text: final_text.clone(),
                    transcript: transcript.clone(),
                })
            }
            MockBehavior::Error(message) => Err(AgentError::Internal(message.clone())),
            MockBehavior::Hang => std::future::pending().await,
        }
    }

    async fn take_screenshot(&self, _job_id: Uuid) -> Option<String> {
        self.screenshot.clone()
    }

    async fn cleanup(&self, _job_id: Uuid) {
        self.cleanups.fetch_add(1, Ordering::SeqCst);
    }
}
