//! Provider module type definitions

use std::fmt;

/// Raw result code returned by every fallible provider entry point
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ResultCode(pub usize);

impl ResultCode {
    pub const SUCCESS: ResultCode = ResultCode(0);
    pub const UNKNOWN: ResultCode = ResultCode(1);
    /// Sentinel: a message is waiting behind `maxima_get_last_error`
    pub const CHECK_LAST_ERROR: ResultCode = ResultCode(2);
    pub const LOGIN_FAILED: ResultCode = ResultCode(3);
    pub const INVALID_ARGUMENT: ResultCode = ResultCode(4);
    pub const NOT_LOGGED_IN: ResultCode = ResultCode(5);

    pub fn is_success(self) -> bool {
        self == Self::SUCCESS
    }

    /// Short description of a known code, for diagnostics
    pub fn meaning(self) -> &'static str {
        match self {
            Self::SUCCESS => "success",
            Self::UNKNOWN => "unknown failure",
            Self::CHECK_LAST_ERROR => "see last error",
            Self::LOGIN_FAILED => "login failed",
            Self::INVALID_ARGUMENT => "invalid argument",
            Self::NOT_LOGGED_IN => "not logged in",
            _ => "unrecognized code",
        }
    }

    /// Convert a raw code into `Ok(value)` on success
    pub fn into_result<T>(self, value: T) -> ProviderResult<T> {
        if self.is_success() {
            Ok(value)
        } else {
            Err(ProviderFault::Code(self))
        }
    }
}

impl fmt::Display for ResultCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Why a provider call did not succeed, before any last-error lookup
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProviderFault {
    /// The entry point ran and returned a nonzero code
    Code(ResultCode),
    /// The loaded library does not export this optional entry point
    Unsupported,
}

/// Result type for raw provider calls
pub type ProviderResult<T> = Result<T, ProviderFault>;

/// Every provider entry point the launcher knows about.
///
/// Displays as the exported symbol name.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operation {
    GetLastError,
    InitLogger,
    CreateRuntime,
    IsServiceValid,
    IsServiceRunning,
    RegisterService,
    StartService,
    StopService,
    CheckRegistryValidity,
    RequestRegistrySetup,
    Login,
    LoginManual,
    AccessToken,
    CreateSession,
    SetAccessToken,
    SetLsxPort,
    StartLsx,
    ConsumeEvents,
    FreeEvents,
    FindOwnedOffer,
    GetDisplayName,
    LaunchGame,
    TakeForegroundFocus,
    ReadGamePath,
}

impl Operation {
    pub fn symbol(&self) -> &'static str {
        match self {
            Operation::GetLastError => "maxima_get_last_error",
            Operation::InitLogger => "maxima_init_logger",
            Operation::CreateRuntime => "maxima_create_runtime",
            Operation::IsServiceValid => "maxima_is_service_valid",
            Operation::IsServiceRunning => "maxima_is_service_running",
            Operation::RegisterService => "maxima_register_service",
            Operation::StartService => "maxima_start_service",
            Operation::StopService => "maxima_stop_service",
            Operation::CheckRegistryValidity => "maxima_check_registry_validity",
            Operation::RequestRegistrySetup => "maxima_request_registry_setup",
            Operation::Login => "maxima_login",
            Operation::LoginManual => "maxima_login_manual",
            Operation::AccessToken => "maxima_access_token",
            Operation::CreateSession => "maxima_mx_create",
            Operation::SetAccessToken => "maxima_mx_set_access_token",
            Operation::SetLsxPort => "maxima_mx_set_lsx_port",
            Operation::StartLsx => "maxima_mx_start_lsx",
            Operation::ConsumeEvents => "maxima_mx_consume_lsx_events",
            Operation::FreeEvents => "maxima_mx_free_lsx_events",
            Operation::FindOwnedOffer => "maxima_find_owned_offer",
            Operation::GetDisplayName => "maxima_get_local_display_name",
            Operation::LaunchGame => "maxima_launch_game",
            Operation::TakeForegroundFocus => "maxima_take_foreground_focus",
            Operation::ReadGamePath => "maxima_read_game_path",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Access token handed out by a login call. Never parsed.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(<redacted>)")
    }
}

/// Offer ID of an owned, downloadable game
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OfferId(String);

impl OfferId {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OfferId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A request a running game sent to the LSX endpoint
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LsxEvent {
    /// Process id of the game that sent it
    pub pid: u32,
    /// Request name (e.g., "GetProfile")
    pub request: String,
}

impl LsxEvent {
    pub fn new(pid: u32, request: impl Into<String>) -> Self {
        Self {
            pid,
            request: request.into(),
        }
    }
}

/// Read access to a provider-owned batch of events
pub trait EventBatchView {
    fn len(&self) -> usize;

    /// Copy the batch out in provider order
    fn events(&self) -> Vec<LsxEvent>;
}
