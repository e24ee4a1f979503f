//! Pure functions for launch module
//!
//! These functions have no side effects and are deterministic.

mod backoff;
mod check;
mod state;

pub use backoff::Backoff;
pub use check::check;
pub use state::is_valid_transition;
