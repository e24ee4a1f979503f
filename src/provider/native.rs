//! Provider backed by the `maxima` shared library

mod symbols;

use std::ffi::{CStr, CString, c_char, c_uint, c_void};
use std::path::{Path, PathBuf};
use std::ptr;

use libloading::Library;
use tracing::{debug, info};

use symbols::Symbols;

use super::{
    AccessToken, EventBatchView, LoaderError, LsxEvent, OfferId, Provider, ProviderFault,
    ProviderResult, ResultCode,
};

/// Runtime context created by `maxima_create_runtime`
pub struct RuntimeHandle(*mut c_void);

// SAFETY: the pointer is never aliased; whichever thread owns the handle is
// the only one passing it to the provider.
unsafe impl Send for RuntimeHandle {}

/// Session object created by `maxima_mx_create`
pub struct SessionHandle(*mut c_void);

// SAFETY: same single-owner discipline as `RuntimeHandle`.
unsafe impl Send for SessionHandle {}

/// Event arrays allocated by `maxima_mx_consume_lsx_events`
pub struct NativeEventBatch {
    events: *mut *const c_char,
    pids: *mut c_uint,
    count: c_uint,
}

impl EventBatchView for NativeEventBatch {
    fn len(&self) -> usize {
        if self.events.is_null() {
            0
        } else {
            self.count as usize
        }
    }

    fn events(&self) -> Vec<LsxEvent> {
        let mut out = Vec::with_capacity(self.len());
        for i in 0..self.len() {
            // SAFETY: assumes the provider allocated `count` entries in both
            // arrays. Some library builds count events they then leave out of
            // the arrays (finished installs), which makes these reads run past
            // the end. Nothing on this side can detect that.
            let (raw, pid) = unsafe {
                let raw = *self.events.add(i);
                let pid = if self.pids.is_null() {
                    0
                } else {
                    *self.pids.add(i)
                };
                (raw, pid)
            };
            // SAFETY: entries are NUL-terminated strings owned by the batch.
            let request = unsafe { owned_string(raw) };
            out.push(LsxEvent::new(pid, request));
        }
        out
    }
}

/// Provider library loaded at runtime
pub struct NativeProvider {
    symbols: Symbols,
    // Keeps every pointer in `symbols` valid; dropped last.
    _lib: Library,
}

impl NativeProvider {
    /// Load the library and resolve every required export
    pub fn load(path: &Path) -> Result<Self, LoaderError> {
        // SAFETY: loading runs the library's initializers; we trust the provider build.
        let lib = unsafe { Library::new(path) }.map_err(|source| LoaderError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        let symbols = Symbols::resolve(&lib, path)?;

        info!(path = %path.display(), "provider library loaded");

        Ok(Self {
            symbols,
            _lib: lib,
        })
    }
}

impl Provider for NativeProvider {
    type Runtime = RuntimeHandle;
    type Session = SessionHandle;
    type EventBatch = NativeEventBatch;

    fn last_error(&self) -> Option<String> {
        // SAFETY: no arguments; returns null or a NUL-terminated string.
        let raw = unsafe { (self.symbols.get_last_error)() };
        if raw.is_null() {
            return None;
        }
        // SAFETY: non-null checked above.
        Some(unsafe { owned_string(raw) })
    }

    fn init_logger(&self) -> ProviderResult<()> {
        // SAFETY: no arguments.
        code(unsafe { (self.symbols.init_logger)() }).into_result(())
    }

    fn create_runtime(&self) -> ProviderResult<RuntimeHandle> {
        let mut raw = ptr::null_mut();
        // SAFETY: `raw` is a valid out slot.
        let rc = code(unsafe { (self.symbols.create_runtime)(&mut raw) });
        rc.into_result(RuntimeHandle(raw))
    }

    fn is_service_valid(&self) -> ProviderResult<bool> {
        let mut valid = false;
        // SAFETY: `valid` is a valid out slot.
        let rc = code(unsafe { (self.symbols.is_service_valid)(&mut valid) });
        rc.into_result(valid)
    }

    fn is_service_running(&self) -> ProviderResult<bool> {
        let mut running = false;
        // SAFETY: `running` is a valid out slot.
        let rc = code(unsafe { (self.symbols.is_service_running)(&mut running) });
        rc.into_result(running)
    }

    fn register_service(&self) -> ProviderResult<()> {
        // SAFETY: no arguments.
        code(unsafe { (self.symbols.register_service)() }).into_result(())
    }

    fn start_service(&self, runtime: &mut RuntimeHandle) -> ProviderResult<()> {
        // SAFETY: runtime came from `create_runtime`.
        code(unsafe { (self.symbols.start_service)(&mut runtime.0) }).into_result(())
    }

    fn stop_service(&self, runtime: &mut RuntimeHandle) -> ProviderResult<()> {
        let stop = self.symbols.stop_service.ok_or(ProviderFault::Unsupported)?;
        // SAFETY: runtime came from `create_runtime`.
        code(unsafe { stop(&mut runtime.0) }).into_result(())
    }

    fn check_registry_validity(&self) -> bool {
        // SAFETY: no arguments.
        unsafe { (self.symbols.check_registry_validity)() }
    }

    fn request_registry_setup(&self, runtime: &mut RuntimeHandle) -> ProviderResult<()> {
        // SAFETY: runtime came from `create_runtime`.
        code(unsafe { (self.symbols.request_registry_setup)(&mut runtime.0) }).into_result(())
    }

    fn login(&self, runtime: &mut RuntimeHandle) -> ProviderResult<AccessToken> {
        let mut token: *mut c_char = ptr::null_mut();
        // SAFETY: runtime came from `create_runtime`; `token` is a valid out slot.
        let rc = code(unsafe { (self.symbols.login)(&mut runtime.0, &mut token) });
        rc.into_result(())?;
        // SAFETY: set by the provider on success.
        Ok(AccessToken::new(unsafe { owned_string(token) }))
    }

    fn login_manual(
        &self,
        runtime: &mut RuntimeHandle,
        session: &mut SessionHandle,
        persona: &str,
        password: &str,
    ) -> ProviderResult<()> {
        let login = self.symbols.login_manual.ok_or(ProviderFault::Unsupported)?;
        let persona = c_string(persona)?;
        let password = c_string(password)?;
        // SAFETY: handles came from the provider; strings outlive the call.
        let rc = code(unsafe {
            login(
                &mut runtime.0,
                &mut session.0,
                persona.as_ptr(),
                password.as_ptr(),
            )
        });
        rc.into_result(())
    }

    fn access_token(
        &self,
        runtime: &mut RuntimeHandle,
        session: &mut SessionHandle,
    ) -> ProviderResult<AccessToken> {
        let fetch = self.symbols.access_token.ok_or(ProviderFault::Unsupported)?;
        let mut token: *const c_char = ptr::null();
        // SAFETY: handles came from the provider; `token` is a valid out slot.
        let rc = code(unsafe { fetch(&mut runtime.0, &mut session.0, &mut token) });
        rc.into_result(())?;
        // SAFETY: set by the provider on success.
        Ok(AccessToken::new(unsafe { owned_string(token) }))
    }

    fn create_session(&self) -> SessionHandle {
        // SAFETY: no arguments.
        SessionHandle(unsafe { (self.symbols.create_session)() })
    }

    fn set_access_token(
        &self,
        runtime: &mut RuntimeHandle,
        session: &mut SessionHandle,
        token: &AccessToken,
    ) -> ProviderResult<()> {
        let token = c_string(token.as_str())?;
        // SAFETY: handles came from the provider; `token` outlives the call.
        let rc = code(unsafe {
            (self.symbols.set_access_token)(&mut runtime.0, &mut session.0, token.as_ptr())
        });
        rc.into_result(())
    }

    fn set_lsx_port(
        &self,
        runtime: &mut RuntimeHandle,
        session: &mut SessionHandle,
        port: u16,
    ) -> ProviderResult<()> {
        let set_port = self.symbols.set_lsx_port.ok_or(ProviderFault::Unsupported)?;
        // SAFETY: handles came from the provider.
        unsafe { set_port(&mut runtime.0, &mut session.0, port) };
        Ok(())
    }

    fn start_lsx(
        &self,
        runtime: &mut RuntimeHandle,
        session: &mut SessionHandle,
    ) -> ProviderResult<()> {
        // SAFETY: handles came from the provider.
        code(unsafe { (self.symbols.start_lsx)(&mut runtime.0, &mut session.0) }).into_result(())
    }

    fn consume_events(
        &self,
        runtime: &mut RuntimeHandle,
        session: &mut SessionHandle,
    ) -> ProviderResult<NativeEventBatch> {
        let mut batch = NativeEventBatch {
            events: ptr::null_mut(),
            pids: ptr::null_mut(),
            count: 0,
        };
        // SAFETY: handles came from the provider; all three out slots are valid.
        let rc = code(unsafe {
            (self.symbols.consume_events)(
                &mut runtime.0,
                &mut session.0,
                &mut batch.events,
                &mut batch.pids,
                &mut batch.count,
            )
        });
        rc.into_result(batch)
    }

    fn free_events(&self, batch: NativeEventBatch) {
        if batch.events.is_null() {
            return;
        }
        debug!(count = batch.count, "releasing event batch");
        // SAFETY: hands the arrays back exactly as the provider produced them.
        unsafe { (self.symbols.free_events)(batch.events as *mut *mut c_char, batch.count) };
    }

    fn find_owned_offer(
        &self,
        runtime: &mut RuntimeHandle,
        session: &mut SessionHandle,
        slug: &str,
    ) -> ProviderResult<OfferId> {
        let slug = c_string(slug)?;
        let mut offer: *const c_char = ptr::null();
        // SAFETY: handles came from the provider; `slug` outlives the call.
        let rc = code(unsafe {
            (self.symbols.find_owned_offer)(
                &mut runtime.0,
                &mut session.0,
                slug.as_ptr(),
                &mut offer,
            )
        });
        rc.into_result(())?;
        // SAFETY: set by the provider on success.
        Ok(OfferId::new(unsafe { owned_string(offer) }))
    }

    fn display_name(
        &self,
        runtime: &mut RuntimeHandle,
        session: &mut SessionHandle,
    ) -> ProviderResult<String> {
        let mut name: *const c_char = ptr::null();
        // SAFETY: handles came from the provider; `name` is a valid out slot.
        let rc = code(unsafe {
            (self.symbols.display_name)(&mut runtime.0, &mut session.0, &mut name)
        });
        rc.into_result(())?;
        // SAFETY: set by the provider on success.
        Ok(unsafe { owned_string(name) })
    }

    fn launch_game(
        &self,
        runtime: &mut RuntimeHandle,
        session: &mut SessionHandle,
        offer: &OfferId,
    ) -> ProviderResult<()> {
        let offer = c_string(offer.as_str())?;
        // SAFETY: handles came from the provider; `offer` outlives the call.
        let rc = code(unsafe {
            (self.symbols.launch_game)(&mut runtime.0, &mut session.0, offer.as_ptr())
        });
        rc.into_result(())
    }

    fn take_foreground_focus(&self) -> ProviderResult<()> {
        let focus = self
            .symbols
            .take_foreground_focus
            .ok_or(ProviderFault::Unsupported)?;
        // SAFETY: no arguments.
        code(unsafe { focus() }).into_result(())
    }

    fn read_game_path(&self, name: &str) -> ProviderResult<PathBuf> {
        let read = self.symbols.read_game_path.ok_or(ProviderFault::Unsupported)?;
        let name = c_string(name)?;
        let mut path: *const c_char = ptr::null();
        // SAFETY: `name` outlives the call; `path` is a valid out slot.
        let rc = code(unsafe { read(name.as_ptr(), &mut path) });
        rc.into_result(())?;
        // SAFETY: set by the provider on success.
        Ok(PathBuf::from(unsafe { owned_string(path) }))
    }
}

fn code(raw: usize) -> ResultCode {
    ResultCode(raw)
}

/// Strings with interior NULs cannot cross the boundary
fn c_string(value: &str) -> ProviderResult<CString> {
    CString::new(value).map_err(|_| ProviderFault::Code(ResultCode::INVALID_ARGUMENT))
}

/// Copy a provider string. Null becomes empty; invalid UTF-8 is replaced.
///
/// # Safety
/// `raw` must be null or point to a NUL-terminated string.
unsafe fn owned_string(raw: *const c_char) -> String {
    if raw.is_null() {
        return String::new();
    }
    // SAFETY: upheld by the caller.
    unsafe { CStr::from_ptr(raw) }.to_string_lossy().into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn owned_string_handles_null() {
        assert_eq!(unsafe { owned_string(ptr::null()) }, "");
    }

    #[test]
    fn owned_string_copies_contents() {
        let raw = CString::new("GetProfile").unwrap();
        assert_eq!(unsafe { owned_string(raw.as_ptr()) }, "GetProfile");
    }

    #[test]
    fn interior_nul_is_invalid_argument() {
        assert_eq!(
            c_string("bad\0slug").unwrap_err(),
            ProviderFault::Code(ResultCode::INVALID_ARGUMENT)
        );
    }

    #[test]
    fn batch_view_reads_events_and_pids() {
        let names = [
            CString::new("GetProfile").unwrap(),
            CString::new("GetConfig").unwrap(),
        ];
        let mut ptrs: Vec<*const c_char> = names.iter().map(|n| n.as_ptr()).collect();
        let mut pids: Vec<c_uint> = vec![100, 200];
        let batch = NativeEventBatch {
            events: ptrs.as_mut_ptr(),
            pids: pids.as_mut_ptr(),
            count: 2,
        };

        assert_eq!(batch.len(), 2);
        assert_eq!(
            batch.events(),
            vec![LsxEvent::new(100, "GetProfile"), LsxEvent::new(200, "GetConfig")]
        );
    }

    #[test]
    fn null_batch_is_empty() {
        let batch = NativeEventBatch {
            events: ptr::null_mut(),
            pids: ptr::null_mut(),
            count: 3,
        };
        assert_eq!(batch.len(), 0);
        assert!(batch.events().is_empty());
    }

    #[test]
    fn loading_missing_library_reports_path() {
        let path = Path::new("/nonexistent/libmaxima-test.so");
        let err = NativeProvider::load(path).err().unwrap();
        assert!(matches!(err, LoaderError::Open { .. }));
        assert!(err.to_string().contains("/nonexistent/libmaxima-test.so"));
    }
}
