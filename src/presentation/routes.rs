//! Route definitions and router assembly

use std::time::Duration;

use axum::{
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::config::Config;
use crate::presentation::controllers::{
    get_audit, health_check, list_audits, submit_audit, AppState,
};
use crate::presentation::models::*;

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::presentation::controllers::submit_audit,
        crate::presentation::controllers::get_audit,
        crate::presentation::controllers::list_audits,
        crate::presentation::controllers::health_check
    ),
    components(
        schemas(
            SubmitAuditRequest,
            JobAcceptedResponse,
            JobStatusResponse,
            JobListResponse,
            ErrorResponse,
            HealthResponse,
            crate::domain::entities::Verdict,
            crate::domain::entities::Finding,
            crate::domain::entities::AuditStep,
            crate::domain::entities::ToolCall,
            crate::domain::value_objects::JobState,
            crate::domain::value_objects::JobPhase,
            crate::domain::value_objects::Severity,
            crate::domain::value_objects::Rating,
            crate::domain::value_objects::AuditProtocol,
            crate::domain::value_objects::StepStatus
        )
    ),
    tags(
        (name = "audits", description = "Audit job submission and polling"),
        (name = "health", description = "Service health")
    ),
    info(
        title = "Aegis Audit API",
        description = "Autonomous web audit orchestrator: submit a target, poll the job until a scored verdict lands."
    )
)]
pub struct ApiDoc;

/// Create the application router.
pub fn create_router(state: AppState, config: &Config) -> Router {
    let api_routes = Router::new()
        .route("/audits", post(submit_audit).get(list_audits))
        .route("/audits/{id}", get(get_audit));

    let cors_layer = build_cors_layer(&config.server.allowed_origins);

    let mut router = Router::new()
        .nest("/api/v1", api_routes)
        .route("/health", get(health_check));

    // Keep API docs out of deployments that do not want them exposed.
    if config.server.enable_docs {
        router =
            router.merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()));
    }

    router
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer)
                .layer(TimeoutLayer::new(Duration::from_secs(
                    config.server.request_timeout_seconds,
                ))),
        )
        .with_state(state)
}

fn build_cors_layer(allowed_origins: &[String]) -> CorsLayer {
    if allowed_origins.len() == 1 && allowed_origins[0] == "*" {
        return CorsLayer::permissive();
    }

    let origins: Vec<axum::http::HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| {
            axum::http::HeaderValue::from_str(origin)
                .map_err(|_| {
                    tracing::warn!(origin, "Invalid CORS origin in config; skipping");
                })
                .ok()
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([axum::http::Method::GET, axum::http::Method::POST])
        .allow_headers([axum::http::header::CONTENT_TYPE, axum::http::header::ACCEPT])
}
