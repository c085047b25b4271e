//! Domain models for the audit orchestrator

pub mod entities;
pub mod value_objects;
