//! Launch module - provisioning, login and game launch through the provider
//!
//! This module provides:
//! - Result code interpretation (sentinel vs. opaque codes)
//! - Background service and registry provisioning with readiness polling
//! - The linear launch sequence, failing fast on the first error
//! - A cancellable LSX event subscription
//!
//! ## Module Structure
//! - `types.rs`: Errors, states, requests and tuning knobs
//! - `pure/`: Pure functions (result checks, transitions, backoff)
//! - `operations/`: Atomic provider interactions (provision, events, maintenance)
//! - `pipelines/`: High-level orchestration (orchestrate, subscription)

mod operations;
mod pipelines;
mod pure;
mod types;


// Re-export public API
pub use operations::{read_game_path, stop_background_service};
pub use pipelines::Orchestrator;
pub use types::{
    LaunchRequest, LaunchResult, LoginMethod, ProvisioningPolicy, PumpOptions, SettleStrategy,
};
