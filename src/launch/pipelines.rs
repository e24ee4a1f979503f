//! Pipelines module (orchestration)

pub mod orchestrate;
pub mod subscription;

pub use orchestrate::Orchestrator;
