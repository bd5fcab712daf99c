//! C calling convention exported to the host runtime.
//!
//! Every function returns plain integers: non-negative for success, a
//! negative [`ErrorCode`] (always `SYSTEM_ERROR`, -24) for failure. Nothing
//! unwinds across this boundary; a panic inside the bridge is logged and
//! reported as `SYSTEM_ERROR`. That needs `panic = "unwind"`, so every
//! profile this library is built with must keep the default panic strategy.

use std::ffi::{c_char, c_int, CStr, OsStr};
use std::os::unix::ffi::OsStrExt;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;

use sshbridge_agent_socket::ErrorCode;
use tracing::{error, warn};

use crate::bridge;

#[cfg(panic = "abort")]
compile_error!("sshbridge_host catches panics at the C boundary and must be built with panic = \"unwind\"");

/// Bumped whenever [`HostApi`] changes layout.
pub const ABI_VERSION: u32 = 1;

/// Status returned for every failure.
pub const SYSTEM_ERROR: c_int = ErrorCode::SystemError.as_raw();

/// Function table for hosts that bind one symbol and dispatch through it.
#[repr(C)]
pub struct HostApi {
    pub abi_version: u32,
    pub is_a_tty: extern "C" fn() -> c_int,
    pub terminal_width: extern "C" fn() -> c_int,
    pub terminal_height: extern "C" fn() -> c_int,
    pub enter_raw_mode: extern "C" fn(c_int),
    pub leave_raw_mode: extern "C" fn(c_int),
    pub open_auth_socket: unsafe extern "C" fn(*const c_char) -> c_int,
    pub close_auth_socket: extern "C" fn(c_int),
    pub read_auth_socket: unsafe extern "C" fn(c_int, *mut u8, c_int) -> c_int,
    pub write_auth_socket: unsafe extern "C" fn(c_int, *const u8, c_int) -> c_int,
    pub init_logging: extern "C" fn() -> c_int,
}

static API: HostApi = HostApi {
    abi_version: ABI_VERSION,
    is_a_tty: sshbridge_is_a_tty,
    terminal_width: sshbridge_terminal_width,
    terminal_height: sshbridge_terminal_height,
    enter_raw_mode: sshbridge_enter_raw_mode,
    leave_raw_mode: sshbridge_leave_raw_mode,
    open_auth_socket: sshbridge_open_auth_socket,
    close_auth_socket: sshbridge_close_auth_socket,
    read_auth_socket: sshbridge_read_auth_socket,
    write_auth_socket: sshbridge_write_auth_socket,
    init_logging: sshbridge_init_logging,
};

/// Run `f`, turning a panic into `on_panic`.
fn guarded<T>(name: &str, on_panic: T, f: impl FnOnce() -> T) -> T {
    panic::catch_unwind(AssertUnwindSafe(f)).unwrap_or_else(|_| {
        error!("panic in {}", name);
        on_panic
    })
}

fn status(result: Result<usize, ErrorCode>) -> c_int {
    match result {
        Ok(n) => c_int::try_from(n).unwrap_or(c_int::MAX),
        Err(code) => code.as_raw(),
    }
}

/// Validate a host-supplied byte count.
fn byte_count(count: c_int) -> Option<usize> {
    usize::try_from(count).ok()
}

#[no_mangle]
pub extern "C" fn sshbridge_api() -> *const HostApi {
    &API
}

/// 1 if stdout is a terminal, else 0.
#[no_mangle]
pub extern "C" fn sshbridge_is_a_tty() -> c_int {
    guarded("is_a_tty", 0, || c_int::from(bridge::is_a_tty()))
}

/// Terminal columns, or 0 if unknown.
#[no_mangle]
pub extern "C" fn sshbridge_terminal_width() -> c_int {
    guarded("terminal_width", 0, || c_int::from(bridge::terminal_width()))
}

/// Terminal rows, or 0 if unknown.
#[no_mangle]
pub extern "C" fn sshbridge_terminal_height() -> c_int {
    guarded("terminal_height", 0, || c_int::from(bridge::terminal_height()))
}

#[no_mangle]
pub extern "C" fn sshbridge_enter_raw_mode(quiet: c_int) {
    guarded("enter_raw_mode", (), || bridge::enter_raw_mode(quiet != 0));
}

#[no_mangle]
pub extern "C" fn sshbridge_leave_raw_mode(quiet: c_int) {
    guarded("leave_raw_mode", (), || bridge::leave_raw_mode(quiet != 0));
}

/// Connect to the agent socket at `path`; returns the handle or
/// `SYSTEM_ERROR`.
///
/// # Safety
///
/// `path` must be null or point to a NUL-terminated string that stays valid
/// for the duration of the call.
#[no_mangle]
pub unsafe extern "C" fn sshbridge_open_auth_socket(path: *const c_char) -> c_int {
    if path.is_null() {
        warn!("open_auth_socket: null path");
        return SYSTEM_ERROR;
    }
    // SAFETY: non-null and NUL-terminated per the contract above.
    let path = unsafe { CStr::from_ptr(path) };
    let path = Path::new(OsStr::from_bytes(path.to_bytes()));
    guarded("open_auth_socket", SYSTEM_ERROR, || {
        match bridge::open_auth_socket(path) {
            Ok(handle) => handle,
            Err(code) => code.as_raw(),
        }
    })
}

#[no_mangle]
pub extern "C" fn sshbridge_close_auth_socket(handle: c_int) {
    guarded("close_auth_socket", (), || bridge::close_auth_socket(handle));
}

/// Read up to `count` bytes into `buf`; returns the byte count (0 at end of
/// stream) or `SYSTEM_ERROR`.
///
/// # Safety
///
/// When `count > 0`, `buf` must be valid for writes of `count` bytes.
#[no_mangle]
pub unsafe extern "C" fn sshbridge_read_auth_socket(
    handle: c_int,
    buf: *mut u8,
    count: c_int,
) -> c_int {
    let Some(len) = byte_count(count) else {
        warn!("read_auth_socket: negative count {}", count);
        return SYSTEM_ERROR;
    };
    if len == 0 {
        return status(bridge::read_auth_socket(handle, &mut []));
    }
    if buf.is_null() {
        warn!("read_auth_socket: null buffer");
        return SYSTEM_ERROR;
    }
    // SAFETY: non-null and valid for `len` bytes per the contract above.
    let buf = unsafe { std::slice::from_raw_parts_mut(buf, len) };
    guarded("read_auth_socket", SYSTEM_ERROR, || {
        status(bridge::read_auth_socket(handle, buf))
    })
}

/// Write `count` bytes from `buf`; returns the number written or
/// `SYSTEM_ERROR`.
///
/// # Safety
///
/// When `count > 0`, `buf` must be valid for reads of `count` bytes.
#[no_mangle]
pub unsafe extern "C" fn sshbridge_write_auth_socket(
    handle: c_int,
    buf: *const u8,
    count: c_int,
) -> c_int {
    let Some(len) = byte_count(count) else {
        warn!("write_auth_socket: negative count {}", count);
        return SYSTEM_ERROR;
    };
    if len == 0 {
        return status(bridge::write_auth_socket(handle, &[]));
    }
    if buf.is_null() {
        warn!("write_auth_socket: null buffer");
        return SYSTEM_ERROR;
    }
    // SAFETY: non-null and valid for `len` bytes per the contract above.
    let data = unsafe { std::slice::from_raw_parts(buf, len) };
    guarded("write_auth_socket", SYSTEM_ERROR, || {
        status(bridge::write_auth_socket(handle, data))
    })
}

/// Install the stderr log subscriber. Returns 1 if installed, 0 if a
/// subscriber already existed.
#[no_mangle]
pub extern "C" fn sshbridge_init_logging() -> c_int {
    guarded("init_logging", 0, || c_int::from(crate::init_logging()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_error_is_minus_24() {
        assert_eq!(SYSTEM_ERROR, -24);
    }

    #[test]
    fn status_maps_results() {
        assert_eq!(status(Ok(4)), 4);
        assert_eq!(status(Ok(0)), 0);
        assert_eq!(status(Err(ErrorCode::SystemError)), -24);
        assert_eq!(status(Ok(usize::MAX)), c_int::MAX);
    }

    #[test]
    fn byte_count_rejects_negative() {
        assert_eq!(byte_count(-1), None);
        assert_eq!(byte_count(0), Some(0));
        assert_eq!(byte_count(4096), Some(4096));
    }

    #[test]
    fn guarded_converts_panics() {
        let result = guarded("test", SYSTEM_ERROR, || -> c_int { panic!("boom") });
        assert_eq!(result, SYSTEM_ERROR);
        assert_eq!(guarded("test", SYSTEM_ERROR, || 7), 7);
    }

    #[test]
    fn api_table_points_at_exports() {
        // SAFETY: sshbridge_api returns a pointer to a static.
        let api = unsafe { &*sshbridge_api() };
        assert_eq!(api.abi_version, ABI_VERSION);
        assert_eq!((api.is_a_tty)(), sshbridge_is_a_tty());
        assert_eq!((api.terminal_width)(), sshbridge_terminal_width());
    }
}
