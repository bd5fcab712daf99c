//! Exercises the exported C functions the way a host runtime would call them.

mod common;

use std::ffi::c_int;
use std::ptr;

use common::{c_path, FakeAgent, TestEnv};
use pretty_assertions::assert_eq;
use serial_test::serial;
use sshbridge_host::abi::{self, SYSTEM_ERROR};

fn open(agent: &FakeAgent) -> c_int {
    let path = agent.c_path();
    // SAFETY: `path` is a valid C string for the duration of the call.
    unsafe { abi::sshbridge_open_auth_socket(path.as_ptr()) }
}

fn write(handle: c_int, data: &[u8]) -> c_int {
    let count = c_int::try_from(data.len()).expect("small buffer");
    // SAFETY: `data` is valid for `count` bytes.
    unsafe { abi::sshbridge_write_auth_socket(handle, data.as_ptr(), count) }
}

fn read(handle: c_int, buf: &mut [u8]) -> c_int {
    let count = c_int::try_from(buf.len()).expect("small buffer");
    // SAFETY: `buf` is valid for `count` bytes.
    unsafe { abi::sshbridge_read_auth_socket(handle, buf.as_mut_ptr(), count) }
}

// ============================================================================
// Agent socket
// ============================================================================

#[test]
#[serial]
fn echo_round_trip() {
    let env = TestEnv::new();
    let agent = FakeAgent::echo(env.socket_path("agent.sock"));

    let handle = open(&agent);
    assert!(handle >= 0, "open failed: {}", handle);

    assert_eq!(write(handle, b"PING"), 4);
    let mut buf = [0u8; 4];
    assert_eq!(read(handle, &mut buf), 4);
    assert_eq!(&buf, b"PING");

    abi::sshbridge_close_auth_socket(handle);
    agent.join();
}

#[test]
#[serial]
fn partial_read_returns_what_is_available() {
    let env = TestEnv::new();
    let agent = FakeAgent::reply(env.socket_path("agent.sock"), b"OK");

    let handle = open(&agent);
    assert!(handle >= 0);

    let mut buf = [0u8; 4];
    assert_eq!(read(handle, &mut buf), 2);
    assert_eq!(&buf[..2], b"OK");

    abi::sshbridge_close_auth_socket(handle);
    agent.join();
}

#[test]
#[serial]
fn closed_handle_is_rejected() {
    let env = TestEnv::new();
    let agent = FakeAgent::echo(env.socket_path("agent.sock"));

    let handle = open(&agent);
    assert!(handle >= 0);
    abi::sshbridge_close_auth_socket(handle);
    agent.join();

    let mut buf = [0u8; 4];
    assert_eq!(read(handle, &mut buf), SYSTEM_ERROR);
    assert_eq!(write(handle, b"PING"), SYSTEM_ERROR);
    // Closing again is harmless.
    abi::sshbridge_close_auth_socket(handle);
}

#[test]
#[serial]
fn open_nonexistent_path_is_system_error() {
    let _env = TestEnv::new();
    let path = c_path(std::path::Path::new("/definitely/nonexistent/path"));
    // SAFETY: valid C string.
    let status = unsafe { abi::sshbridge_open_auth_socket(path.as_ptr()) };
    assert_eq!(status, SYSTEM_ERROR);
}

#[test]
#[serial]
fn null_path_is_system_error() {
    // SAFETY: null is explicitly allowed.
    let status = unsafe { abi::sshbridge_open_auth_socket(ptr::null()) };
    assert_eq!(status, SYSTEM_ERROR);
}

#[test]
#[serial]
fn bad_buffers_and_counts_are_rejected() {
    let env = TestEnv::new();
    let agent = FakeAgent::echo(env.socket_path("agent.sock"));
    let handle = open(&agent);
    assert!(handle >= 0);

    let mut buf = [0u8; 4];
    // SAFETY: negative counts and null buffers are rejected before any access.
    unsafe {
        assert_eq!(
            abi::sshbridge_read_auth_socket(handle, buf.as_mut_ptr(), -1),
            SYSTEM_ERROR
        );
        assert_eq!(
            abi::sshbridge_write_auth_socket(handle, buf.as_ptr(), -4),
            SYSTEM_ERROR
        );
        assert_eq!(
            abi::sshbridge_read_auth_socket(handle, ptr::null_mut(), 4),
            SYSTEM_ERROR
        );
        assert_eq!(
            abi::sshbridge_write_auth_socket(handle, ptr::null(), 4),
            SYSTEM_ERROR
        );
        // Zero-length transfers never touch the buffer.
        assert_eq!(abi::sshbridge_write_auth_socket(handle, ptr::null(), 0), 0);
    }

    // The handle is still usable afterwards.
    assert_eq!(write(handle, b"PING"), 4);
    assert_eq!(read(handle, &mut buf), 4);

    abi::sshbridge_close_auth_socket(handle);
    agent.join();
}

#[test]
#[serial]
fn zero_count_on_unknown_handle_is_system_error() {
    // SAFETY: zero-length transfers never touch the buffer.
    unsafe {
        assert_eq!(
            abi::sshbridge_read_auth_socket(-1, ptr::null_mut(), 0),
            SYSTEM_ERROR
        );
        assert_eq!(abi::sshbridge_write_auth_socket(-1, ptr::null(), 0), SYSTEM_ERROR);
    }
}

// ============================================================================
// Terminal
// ============================================================================

#[test]
#[serial]
fn leave_raw_mode_without_enter_is_a_no_op() {
    abi::sshbridge_leave_raw_mode(0);
    abi::sshbridge_leave_raw_mode(1);
    assert_eq!(sshbridge_host::raw_mode(), sshbridge_terminal::TerminalMode::Normal);
}

#[test]
fn terminal_queries_are_well_formed() {
    let tty = abi::sshbridge_is_a_tty();
    assert!(tty == 0 || tty == 1);
    assert!(abi::sshbridge_terminal_width() >= 0);
    assert!(abi::sshbridge_terminal_height() >= 0);
    if tty == 0 {
        assert_eq!(abi::sshbridge_terminal_width(), 0);
        assert_eq!(abi::sshbridge_terminal_height(), 0);
    }
}

// ============================================================================
// Function table
// ============================================================================

#[test]
#[serial]
fn api_table_dispatches_to_exports() {
    let env = TestEnv::new();
    let agent = FakeAgent::echo(env.socket_path("agent.sock"));

    // SAFETY: sshbridge_api returns a pointer to a static table.
    let api = unsafe { &*abi::sshbridge_api() };
    assert_eq!(api.abi_version, abi::ABI_VERSION);

    let path = agent.c_path();
    // SAFETY: valid C string and buffers sized to their counts.
    unsafe {
        let handle = (api.open_auth_socket)(path.as_ptr());
        assert!(handle >= 0);
        assert_eq!((api.write_auth_socket)(handle, b"hi".as_ptr(), 2), 2);
        let mut buf = [0u8; 2];
        assert_eq!((api.read_auth_socket)(handle, buf.as_mut_ptr(), 2), 2);
        assert_eq!(&buf, b"hi");
        (api.close_auth_socket)(handle);
    }
    agent.join();
}
