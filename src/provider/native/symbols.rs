//! Exported entry points of the provider library and how to resolve them

use std::ffi::{c_char, c_uint, c_ushort, c_void};
use std::path::Path;

use libloading::{Library, Symbol};
use tracing::debug;

use crate::provider::{LoaderError, Operation};

pub type GetLastErrorFn = unsafe extern "C" fn() -> *const c_char;
pub type InitLoggerFn = unsafe extern "C" fn() -> usize;
pub type CreateRuntimeFn = unsafe extern "C" fn(runtime_out: *mut *mut c_void) -> usize;
pub type ServiceQueryFn = unsafe extern "C" fn(out: *mut bool) -> usize;
pub type RegisterServiceFn = unsafe extern "C" fn() -> usize;
pub type RuntimeOpFn = unsafe extern "C" fn(runtime: *mut *mut c_void) -> usize;
pub type CheckRegistryFn = unsafe extern "C" fn() -> bool;
pub type LoginFn =
    unsafe extern "C" fn(runtime: *mut *mut c_void, token_out: *mut *mut c_char) -> usize;
pub type LoginManualFn = unsafe extern "C" fn(
    runtime: *mut *mut c_void,
    mx: *mut *mut c_void,
    persona: *const c_char,
    password: *const c_char,
) -> usize;
pub type SessionStringOutFn = unsafe extern "C" fn(
    runtime: *mut *mut c_void,
    mx: *mut *mut c_void,
    out: *mut *const c_char,
) -> usize;
pub type CreateSessionFn = unsafe extern "C" fn() -> *mut c_void;
pub type SessionStringInFn = unsafe extern "C" fn(
    runtime: *mut *mut c_void,
    mx: *mut *mut c_void,
    input: *const c_char,
) -> usize;
pub type SetLsxPortFn =
    unsafe extern "C" fn(runtime: *mut *mut c_void, mx: *mut *mut c_void, port: c_ushort);
pub type SessionOpFn = unsafe extern "C" fn(runtime: *mut *mut c_void, mx: *mut *mut c_void) -> usize;
pub type ConsumeEventsFn = unsafe extern "C" fn(
    runtime: *mut *mut c_void,
    mx: *mut *mut c_void,
    events_out: *mut *mut *const c_char,
    pids_out: *mut *mut c_uint,
    count_out: *mut c_uint,
) -> usize;
pub type FreeEventsFn = unsafe extern "C" fn(events: *mut *mut c_char, count: c_uint);
pub type FindOwnedOfferFn = unsafe extern "C" fn(
    runtime: *mut *mut c_void,
    mx: *mut *mut c_void,
    slug: *const c_char,
    offer_out: *mut *const c_char,
) -> usize;
pub type TakeFocusFn = unsafe extern "C" fn() -> usize;
pub type ReadGamePathFn = unsafe extern "C" fn(name: *const c_char, path_out: *mut *const c_char) -> usize;

/// Resolved function pointers. Only valid while the owning `Library` is loaded.
pub struct Symbols {
    pub get_last_error: GetLastErrorFn,
    pub init_logger: InitLoggerFn,
    pub create_runtime: CreateRuntimeFn,
    pub is_service_valid: ServiceQueryFn,
    pub is_service_running: ServiceQueryFn,
    pub register_service: RegisterServiceFn,
    pub start_service: RuntimeOpFn,
    pub check_registry_validity: CheckRegistryFn,
    pub request_registry_setup: RuntimeOpFn,
    pub login: LoginFn,
    pub create_session: CreateSessionFn,
    pub set_access_token: SessionStringInFn,
    pub start_lsx: SessionOpFn,
    pub consume_events: ConsumeEventsFn,
    pub free_events: FreeEventsFn,
    pub find_owned_offer: FindOwnedOfferFn,
    pub display_name: SessionStringOutFn,
    pub launch_game: SessionStringInFn,

    // Not every build of the library exports these
    pub stop_service: Option<RuntimeOpFn>,
    pub login_manual: Option<LoginManualFn>,
    pub access_token: Option<SessionStringOutFn>,
    pub set_lsx_port: Option<SetLsxPortFn>,
    pub take_foreground_focus: Option<TakeFocusFn>,
    pub read_game_path: Option<ReadGamePathFn>,
}

impl Symbols {
    pub fn resolve(lib: &Library, path: &Path) -> Result<Self, LoaderError> {
        let symbols = Self {
            get_last_error: required(lib, path, Operation::GetLastError)?,
            init_logger: required(lib, path, Operation::InitLogger)?,
            create_runtime: required(lib, path, Operation::CreateRuntime)?,
            is_service_valid: required(lib, path, Operation::IsServiceValid)?,
            is_service_running: required(lib, path, Operation::IsServiceRunning)?,
            register_service: required(lib, path, Operation::RegisterService)?,
            start_service: required(lib, path, Operation::StartService)?,
            check_registry_validity: required(lib, path, Operation::CheckRegistryValidity)?,
            request_registry_setup: required(lib, path, Operation::RequestRegistrySetup)?,
            login: required(lib, path, Operation::Login)?,
            create_session: required(lib, path, Operation::CreateSession)?,
            set_access_token: required(lib, path, Operation::SetAccessToken)?,
            start_lsx: required(lib, path, Operation::StartLsx)?,
            consume_events: required(lib, path, Operation::ConsumeEvents)?,
            free_events: required(lib, path, Operation::FreeEvents)?,
            find_owned_offer: required(lib, path, Operation::FindOwnedOffer)?,
            display_name: required(lib, path, Operation::GetDisplayName)?,
            launch_game: required(lib, path, Operation::LaunchGame)?,
            stop_service: optional(lib, Operation::StopService),
            login_manual: optional(lib, Operation::LoginManual),
            access_token: optional(lib, Operation::AccessToken),
            set_lsx_port: optional(lib, Operation::SetLsxPort),
            take_foreground_focus: optional(lib, Operation::TakeForegroundFocus),
            read_game_path: optional(lib, Operation::ReadGamePath),
        };
        Ok(symbols)
    }
}

fn required<T: Copy>(lib: &Library, path: &Path, op: Operation) -> Result<T, LoaderError> {
    // SAFETY: every call site names a type alias matching the export's C signature.
    let symbol: Symbol<T> = unsafe { lib.get(op.symbol().as_bytes()) }.map_err(|source| {
        LoaderError::MissingSymbol {
            path: path.to_path_buf(),
            symbol: op.symbol(),
            source,
        }
    })?;
    Ok(*symbol)
}

fn optional<T: Copy>(lib: &Library, op: Operation) -> Option<T> {
    // SAFETY: see `required`.
    match unsafe { lib.get::<T>(op.symbol().as_bytes()) } {
        Ok(symbol) => Some(*symbol),
        Err(_) => {
            debug!(symbol = op.symbol(), "optional provider export not found");
            None
        }
    }
}
