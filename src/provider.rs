//! Provider abstraction - the shared library that does the real work
//!
//! The launcher never authenticates, licenses or launches anything itself.
//! It drives a provider through a fixed sequence of entry points, each of
//! which reports a raw [`ResultCode`]. Interpreting those codes is the
//! orchestrator's job (see `launch::pure::check`), so implementations here
//! must not look up the last error on their own.
//!
//! ## Module Structure
//! - `types.rs`: Result codes, operation names, tokens, offers, events
//! - `error.rs`: Library loading errors
//! - `native/`: `libloading`-backed implementation
//! - `mock.rs`: Scripted provider for tests

mod error;
mod native;
mod types;

#[cfg(test)]
pub mod mock;

pub use error::LoaderError;
pub use native::NativeProvider;
pub use types::{
    AccessToken, EventBatchView, LsxEvent, OfferId, Operation, ProviderFault, ProviderResult,
    ResultCode,
};

use std::path::PathBuf;

/// The provider's exported entry points, one method per symbol.
///
/// Handles are owned by the caller and lent out as `&mut` for each call,
/// mirroring the pointer-to-pointer convention of the exports: the provider
/// may relocate the underlying resource during any call.
pub trait Provider: Send + Sync {
    /// Opaque asynchronous runtime context
    type Runtime: Send;
    /// Opaque user session
    type Session: Send;
    /// Provider-owned batch of events, returned to the provider on release
    type EventBatch: EventBatchView;

    /// Message for the most recent call that returned the sentinel code
    fn last_error(&self) -> Option<String>;

    fn init_logger(&self) -> ProviderResult<()>;

    fn create_runtime(&self) -> ProviderResult<Self::Runtime>;

    fn is_service_valid(&self) -> ProviderResult<bool>;

    fn is_service_running(&self) -> ProviderResult<bool>;

    fn register_service(&self) -> ProviderResult<()>;

    fn start_service(&self, runtime: &mut Self::Runtime) -> ProviderResult<()>;

    fn stop_service(&self, runtime: &mut Self::Runtime) -> ProviderResult<()>;

    /// Bare flag, no result code
    fn check_registry_validity(&self) -> bool;

    fn request_registry_setup(&self, runtime: &mut Self::Runtime) -> ProviderResult<()>;

    /// Browser login; returns the access token
    fn login(&self, runtime: &mut Self::Runtime) -> ProviderResult<AccessToken>;

    /// Credential login; stores the account inside the session
    fn login_manual(
        &self,
        runtime: &mut Self::Runtime,
        session: &mut Self::Session,
        persona: &str,
        password: &str,
    ) -> ProviderResult<()>;

    /// Token of the account selected inside the session
    fn access_token(
        &self,
        runtime: &mut Self::Runtime,
        session: &mut Self::Session,
    ) -> ProviderResult<AccessToken>;

    /// Never fails
    fn create_session(&self) -> Self::Session;

    fn set_access_token(
        &self,
        runtime: &mut Self::Runtime,
        session: &mut Self::Session,
        token: &AccessToken,
    ) -> ProviderResult<()>;

    /// No result code; `Unsupported` when the library lacks the export
    fn set_lsx_port(
        &self,
        runtime: &mut Self::Runtime,
        session: &mut Self::Session,
        port: u16,
    ) -> ProviderResult<()>;

    fn start_lsx(&self, runtime: &mut Self::Runtime, session: &mut Self::Session)
    -> ProviderResult<()>;

    fn consume_events(
        &self,
        runtime: &mut Self::Runtime,
        session: &mut Self::Session,
    ) -> ProviderResult<Self::EventBatch>;

    /// Must be called exactly once for every batch `consume_events` returned
    fn free_events(&self, batch: Self::EventBatch);

    fn find_owned_offer(
        &self,
        runtime: &mut Self::Runtime,
        session: &mut Self::Session,
        slug: &str,
    ) -> ProviderResult<OfferId>;

    fn display_name(
        &self,
        runtime: &mut Self::Runtime,
        session: &mut Self::Session,
    ) -> ProviderResult<String>;

    fn launch_game(
        &self,
        runtime: &mut Self::Runtime,
        session: &mut Self::Session,
        offer: &OfferId,
    ) -> ProviderResult<()>;

    fn take_foreground_focus(&self) -> ProviderResult<()>;

    fn read_game_path(&self, name: &str) -> ProviderResult<PathBuf>;
}
