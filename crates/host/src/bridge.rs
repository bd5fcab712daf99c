//! Process-wide bridge operations behind the C ABI.
//!
//! Raw-mode state is a single mutex-guarded controller for stdin, matching
//! the one-controlling-terminal model. Agent sockets live in a registry so
//! a handle that was never opened, or was already closed, is rejected instead
//! of reaching a descriptor the kernel may have handed to someone else.

use std::os::fd::RawFd;
use std::path::Path;

use once_cell::sync::Lazy;
use parking_lot::Mutex;
use sshbridge_agent_socket::{AgentSocket, ErrorCode};
use sshbridge_settings::Config;
use sshbridge_terminal::{RawModeController, TerminalMode};
use tracing::warn;

use crate::registry::SocketRegistry;

static CONFIG: Lazy<Config> = Lazy::new(sshbridge_settings::load_config);

static RAW_MODE: Lazy<Mutex<RawModeController>> =
    Lazy::new(|| Mutex::new(RawModeController::stdin(CONFIG.apply_timing)));

static SOCKETS: Lazy<SocketRegistry> = Lazy::new(SocketRegistry::new);

pub(crate) fn config() -> &'static Config {
    &CONFIG
}

pub fn is_a_tty() -> bool {
    sshbridge_terminal::is_a_tty()
}

pub fn terminal_width() -> u16 {
    sshbridge_terminal::terminal_width()
}

pub fn terminal_height() -> u16 {
    sshbridge_terminal::terminal_height()
}

/// Put stdin into raw mode. Failures are reported unless `quiet` and leave
/// the mode unchanged.
pub fn enter_raw_mode(quiet: bool) {
    let _ = RAW_MODE.lock().enter(quiet);
}

/// Restore stdin to the attributes saved by [`enter_raw_mode`]; no-op when
/// not in raw mode.
pub fn leave_raw_mode(quiet: bool) {
    let _ = RAW_MODE.lock().leave(quiet);
}

pub fn raw_mode() -> TerminalMode {
    RAW_MODE.lock().mode()
}

/// Connect to the agent at `path` and register the socket.
pub fn open_auth_socket(path: &Path) -> Result<RawFd, ErrorCode> {
    match AgentSocket::open(path) {
        Ok(socket) => {
            let socket = socket.with_read_limit(config().effective_max_read_len());
            Ok(SOCKETS.insert(socket))
        }
        Err(e) => {
            warn!("{}", e);
            Err(e.code())
        }
    }
}

/// Close a registered socket. Unknown handles are ignored.
pub fn close_auth_socket(handle: RawFd) {
    if SOCKETS.remove(handle).is_none() {
        warn!("close of unknown agent socket handle {}", handle);
    }
}

/// One read into `buf` from a registered socket.
pub fn read_auth_socket(handle: RawFd, buf: &mut [u8]) -> Result<usize, ErrorCode> {
    let socket = lookup(handle)?;
    socket.read_into(buf).map_err(|e| {
        warn!("{}", e);
        e.code()
    })
}

/// One write of `data` to a registered socket.
pub fn write_auth_socket(handle: RawFd, data: &[u8]) -> Result<usize, ErrorCode> {
    let socket = lookup(handle)?;
    socket.write(data).map_err(|e| {
        warn!("{}", e);
        e.code()
    })
}

fn lookup(handle: RawFd) -> Result<std::sync::Arc<AgentSocket>, ErrorCode> {
    SOCKETS.get(handle).ok_or_else(|| {
        warn!("unknown agent socket handle {}", handle);
        ErrorCode::SystemError
    })
}

#[cfg(test)]
pub(crate) fn open_socket_count() -> usize {
    SOCKETS.len()
}
