//! Result code interpretation

use crate::launch::types::{LaunchError, LaunchResult, UNKNOWN_ERROR_MESSAGE};
use crate::provider::{Operation, ProviderFault, ProviderResult, ResultCode};

/// Turn a raw provider result into a launch result.
///
/// `last_error` is only invoked for the sentinel code.
pub fn check<T, F>(op: Operation, result: ProviderResult<T>, last_error: F) -> LaunchResult<T>
where
    F: FnOnce() -> Option<String>,
{
    match result {
        Ok(value) => Ok(value),
        Err(ProviderFault::Code(ResultCode::CHECK_LAST_ERROR)) => Err(LaunchError::Provider {
            op,
            message: last_error().unwrap_or_else(|| UNKNOWN_ERROR_MESSAGE.to_string()),
        }),
        Err(ProviderFault::Code(code)) => Err(LaunchError::ProviderCode { op, code }),
        Err(ProviderFault::Unsupported) => Err(LaunchError::Unsupported { op }),
    }
}
