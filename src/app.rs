//! Application setup and wiring

use std::sync::Arc;

use axum::Router;
use tokio_util::sync::CancellationToken;

use crate::application::{JobRunnerContext, Orchestrator};
use crate::config::Config;
use crate::infrastructure::agent::AgentExecutor;
use crate::infrastructure::{AdmissionController, HttpAgentExecutor, JobStore, LogHub};
use crate::presentation::{create_router, AppState};

/// Handle returned from create_app for graceful shutdown coordination
pub struct AppHandle {
    pub router: Router,
    pub shutdown_token: CancellationToken,
}

/// Wire the orchestrator and build the router.
pub fn create_app(config: &Config) -> AppHandle {
    let agent: Arc<dyn AgentExecutor> =
        Arc::new(HttpAgentExecutor::new(config.agent.endpoint.clone()));
    create_app_with_agent(config, agent)
}

/// Wiring with an injected agent executor, used by tests and alternative
/// agent runtimes.
pub fn create_app_with_agent(config: &Config, agent: Arc<dyn AgentExecutor>) -> AppHandle {
    let shutdown_token = CancellationToken::new();
    let ctx = JobRunnerContext {
        store: Arc::new(JobStore::new()),
        admission: Arc::new(AdmissionController::new(config.audit.max_concurrent_jobs)),
        log_hub: Arc::new(LogHub::new()),
        agent,
        audit: config.audit.clone(),
        shutdown: shutdown_token.clone(),
    };
    let state = AppState {
        orchestrator: Arc::new(Orchestrator::new(ctx)),
        started_at: std::time::Instant::now(),
    };

    AppHandle {
        router: create_router(state, config),
        shutdown_token,
    }
}
