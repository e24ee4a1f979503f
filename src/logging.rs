//! Diagnostic logging setup
//!
//! Diagnostics go to stderr so stdout stays reserved for progress lines and
//! events.

use tracing_subscriber::EnvFilter;

/// Variable holding a `tracing` filter directive, e.g. `mxlaunch=trace`
pub const LOG_ENV: &str = "MXLAUNCH_LOG";

/// Filter used when `MXLAUNCH_LOG` is unset or invalid
pub fn default_directive(debug: bool) -> &'static str {
    if debug { "debug" } else { "info" }
}

pub fn init(debug: bool) {
    let filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_directive(debug)));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .ok();
}
