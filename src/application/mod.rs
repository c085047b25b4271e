//! Application layer: submission façade, job runner, parsing, scoring

pub mod orchestrator;
pub mod parser;
pub mod runner;
pub mod scoring;

pub use orchestrator::{Orchestrator, SubmitError};
pub use runner::JobRunnerContext;
