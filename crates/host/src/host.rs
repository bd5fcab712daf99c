//! Host-runtime boundary for sshbridge.
//!
//! The managed runtime of the SSH client loads this library and calls the
//! `extern "C"` functions in [`abi`] (or the [`abi::HostApi`] table). Those are
//! thin pointer-checking wrappers over [`bridge`], which owns the process-wide
//! state: one raw-mode controller for stdin and a registry of open agent
//! sockets keyed by their integer handle.

pub mod abi;
pub mod bridge;
mod logging;
mod registry;

pub use bridge::{
    close_auth_socket, enter_raw_mode, is_a_tty, leave_raw_mode, open_auth_socket, raw_mode,
    read_auth_socket, terminal_height, terminal_width, write_auth_socket,
};
pub use logging::{default_filter, init_logging};
pub use registry::SocketRegistry;
pub use sshbridge_agent_socket::ErrorCode;
