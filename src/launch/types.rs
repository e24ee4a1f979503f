//! Launch module type definitions

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::provider::{LoaderError, Operation, ResultCode};

/// Message used when the sentinel code comes back but no message is set
pub const UNKNOWN_ERROR_MESSAGE: &str = "unknown error";

/// Everything that can abort a launch
#[derive(Debug, Error)]
pub enum LaunchError {
    /// Sentinel code, message taken from the last-error accessor
    #[error("Function '{op}' failed: {message}")]
    Provider { op: Operation, message: String },
    /// Any other nonzero code
    #[error("Function '{op}' failed: {code}")]
    ProviderCode { op: Operation, code: ResultCode },
    #[error("Function '{op}' is not exported by the provider library")]
    Unsupported { op: Operation },
    #[error(
        "provisioning timed out after {:.1}s waiting on '{}'",
        .waited.as_secs_f32(),
        .op
    )]
    ProvisioningTimeout { op: Operation, waited: Duration },
    #[error("event stream closed unexpectedly")]
    StreamClosed,
    #[error(transparent)]
    Loader(#[from] LoaderError),
}

pub type LaunchResult<T> = Result<T, LaunchError>;

/// Where the launch sequence currently is. `Failed` is absorbing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LaunchState {
    Uninitialized,
    RuntimeReady,
    ServiceReady,
    RegistryReady,
    Authenticated,
    SessionBound,
    Streaming,
    Launched,
    Polling,
    Failed,
}

/// How to wait for the background service after remediating it
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SettleStrategy {
    /// Re-query with exponential backoff until ready or timed out
    #[default]
    Poll,
    /// Sleep once after registering and assume it worked
    Fixed,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ProvisioningPolicy {
    pub strategy: SettleStrategy,
    /// Total time allowed for one readiness wait (poll mode)
    pub timeout: Duration,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
    /// Single delay used in fixed mode
    pub fixed_settle: Duration,
}

impl Default for ProvisioningPolicy {
    fn default() -> Self {
        Self {
            strategy: SettleStrategy::Poll,
            timeout: Duration::from_secs(30),
            initial_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_secs(2),
            fixed_settle: Duration::from_secs(1),
        }
    }
}

#[derive(Clone, PartialEq, Eq)]
pub enum LoginMethod {
    /// Browser OAuth flow through `maxima_login`
    Browser,
    /// Persona + password through `maxima_login_manual`
    Credentials { persona: String, password: String },
}

impl std::fmt::Debug for LoginMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoginMethod::Browser => write!(f, "Browser"),
            LoginMethod::Credentials { persona, .. } => f
                .debug_struct("Credentials")
                .field("persona", persona)
                .finish_non_exhaustive(),
        }
    }
}

/// Everything the orchestrator needs from its caller
#[derive(Clone, Debug)]
pub struct LaunchRequest {
    /// Product slug of an owned game (e.g., "star-wars-battlefront-2")
    pub slug: String,
    pub login: LoginMethod,
    pub lsx_port: Option<u16>,
    pub focus_after_login: bool,
    pub provisioning: ProvisioningPolicy,
}

impl LaunchRequest {
    pub fn new(slug: impl Into<String>) -> Self {
        Self {
            slug: slug.into(),
            login: LoginMethod::Browser,
            lsx_port: None,
            focus_after_login: false,
            provisioning: ProvisioningPolicy::default(),
        }
    }
}

/// Event pump tuning
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PumpOptions {
    /// Pause between two fetches
    pub interval: Duration,
}

impl Default for PumpOptions {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(50),
        }
    }
}
