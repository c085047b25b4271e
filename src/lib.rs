//! Aegis - Autonomous web audit orchestrator
//!
//! Accepts audit submissions over HTTP, drives a browser-automation agent
//! through a deadline-bounded run per job, and serves scored verdicts to
//! polling clients.

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod logging;
pub mod presentation;

mod app;

pub use app::{create_app, create_app_with_agent, AppHandle};
pub use config::Config;
pub use logging::init_tracing;
