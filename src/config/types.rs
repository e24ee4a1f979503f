use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::launch::{ProvisioningPolicy, PumpOptions, SettleStrategy};

/// Readiness waits after service remediation
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProvisioningConfig {
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
    /// Only used with the fixed settle strategy
    #[serde(default = "default_fixed_settle_ms")]
    pub fixed_settle_ms: u64,
}

fn default_timeout_ms() -> u64 {
    30_000
}

fn default_initial_backoff_ms() -> u64 {
    100
}

fn default_max_backoff_ms() -> u64 {
    2_000
}

fn default_fixed_settle_ms() -> u64 {
    1_000
}

impl Default for ProvisioningConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout_ms(),
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
            fixed_settle_ms: default_fixed_settle_ms(),
        }
    }
}

/// LSX event pump
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EventsConfig {
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

fn default_poll_interval_ms() -> u64 {
    50
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

/// Persistent launcher settings, stored as `settings.json` in the data dir.
///
/// Every field is optional in the file; CLI flags override what is loaded.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Default)]
pub struct LaunchConfig {
    /// Provider library to load (None = search the default locations)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub library_path: Option<PathBuf>,
    /// Game to launch when none is given on the command line
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub game_slug: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lsx_port: Option<u16>,
    /// Persona for credential login; the password only comes from the environment
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub persona: Option<String>,
    #[serde(default)]
    pub focus_after_login: bool,
    #[serde(default)]
    pub debug_logging: bool,
    #[serde(default)]
    pub settle: SettleStrategy,
    #[serde(default)]
    pub provisioning: ProvisioningConfig,
    #[serde(default)]
    pub events: EventsConfig,
}

impl LaunchConfig {
    pub fn provisioning_policy(&self) -> ProvisioningPolicy {
        let p = &self.provisioning;
        ProvisioningPolicy {
            strategy: self.settle,
            timeout: Duration::from_millis(p.timeout_ms),
            initial_backoff: Duration::from_millis(p.initial_backoff_ms),
            max_backoff: Duration::from_millis(p.max_backoff_ms.max(p.initial_backoff_ms)),
            fixed_settle: Duration::from_millis(p.fixed_settle_ms),
        }
    }

    pub fn pump_options(&self) -> PumpOptions {
        PumpOptions {
            interval: Duration::from_millis(self.events.poll_interval_ms),
        }
    }
}
