//! Operations module (atomic side effects)
//!
//! Each function performs one provider interaction plus the checks around it.

pub mod events;
pub mod maintenance;
pub mod provision;

pub use events::poll_once;
pub use maintenance::{read_game_path, stop_background_service};
pub use provision::{ensure_registry, ensure_service_registered, ensure_service_running};
