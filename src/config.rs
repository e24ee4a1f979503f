//! Config module - persistent launcher settings
//!
//! ## Module Structure
//! - `types.rs`: Settings structs and their conversion into launch tuning
//! - `operations/`: Loading and saving `settings.json`

pub mod operations;
pub mod types;

// Re-export types
pub use types::LaunchConfig;

// Re-export operations
pub use operations::{load_cfg, save_cfg};
