//! Byte pass-through to a local SSH authentication agent.
//!
//! An [`AgentSocket`] is one connected `AF_UNIX` stream. Reads and writes are
//! a single system call each: short transfers are returned as-is and nothing
//! is retried, so the caller owns framing, read loops and timeouts.
//!
//! The socket address is built by copying the path into the fixed-size
//! `sun_path` field with [`bounded_copy`](sshbridge_util::bounded_copy). A
//! path that does not fit is truncated (and logged), not rejected; the connect
//! result decides whether the truncated path was usable.

mod error;

pub use error::{AgentSocketError, ErrorCode};

use std::ffi::OsStr;
use std::io::Read;
use std::mem;
use std::os::fd::{AsFd, AsRawFd, BorrowedFd, FromRawFd, OwnedFd, RawFd};
use std::os::unix::ffi::OsStrExt;
use std::os::unix::net::UnixStream;
use std::path::{Path, PathBuf};

use sshbridge_settings::constants::agent::MAX_READ_LEN;
use sshbridge_util::{bounded_copy_outcome, CopyOutcome};
use tracing::{debug, warn};

/// Capacity of `sockaddr_un::sun_path` on this platform, terminator included.
pub const SOCKET_PATH_CAPACITY: usize =
    mem::size_of::<libc::sockaddr_un>() - mem::offset_of!(libc::sockaddr_un, sun_path);

#[cfg(any(target_os = "linux", target_os = "android"))]
const SEND_FLAGS: libc::c_int = libc::MSG_NOSIGNAL;
#[cfg(not(any(target_os = "linux", target_os = "android")))]
const SEND_FLAGS: libc::c_int = 0;

/// Build a unix socket address for `path`, truncating to fit `sun_path`.
pub fn socket_address(path: &[u8]) -> (libc::sockaddr_un, CopyOutcome) {
    // SAFETY: sockaddr_un is plain data; all-zero is a valid value.
    let mut addr: libc::sockaddr_un = unsafe { mem::zeroed() };
    addr.sun_family = libc::AF_UNIX as libc::sa_family_t;

    // SAFETY: sun_path is an array of c_char, which has the size and
    // alignment of u8; the slice does not outlive `addr`'s borrow.
    let sun_path = unsafe {
        std::slice::from_raw_parts_mut(
            addr.sun_path.as_mut_ptr().cast::<u8>(),
            addr.sun_path.len(),
        )
    };
    let outcome = bounded_copy_outcome(sun_path, path);
    (addr, outcome)
}

/// An open connection to an agent socket.
///
/// The descriptor is closed by [`close`](Self::close) or on drop, whichever
/// comes first; ownership ends there, so a closed socket cannot be used.
#[derive(Debug)]
pub struct AgentSocket {
    stream: UnixStream,
    path: PathBuf,
    read_limit: usize,
}

impl AgentSocket {
    /// Connect to the agent listening at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, AgentSocketError> {
        let requested = path.as_ref().as_os_str().as_bytes();
        let (addr, outcome) = socket_address(requested);
        if outcome.truncated() {
            warn!(
                "agent socket path is {} bytes, truncated to {} to fit sun_path",
                outcome.source_len,
                outcome.copied()
            );
        }
        let connected = PathBuf::from(OsStr::from_bytes(&requested[..outcome.copied()]));

        // SAFETY: plain socket(2) call; the result is checked before use.
        let raw = unsafe { libc::socket(libc::AF_UNIX, libc::SOCK_STREAM, 0) };
        if raw == -1 {
            return Err(AgentSocketError::Socket(std::io::Error::last_os_error()));
        }
        // SAFETY: `raw` is a freshly created descriptor nobody else owns.
        // From here on every early return closes it.
        let fd = unsafe { OwnedFd::from_raw_fd(raw) };

        // SAFETY: fd is open for the duration of the call.
        if unsafe { libc::fcntl(fd.as_raw_fd(), libc::F_SETFD, libc::FD_CLOEXEC) } == -1 {
            return Err(AgentSocketError::CloseOnExec(std::io::Error::last_os_error()));
        }

        disable_sigpipe(&fd)?;

        // SAFETY: addr is a fully initialized sockaddr_un and the length
        // passed matches its size.
        let rc = unsafe {
            libc::connect(
                fd.as_raw_fd(),
                (&addr as *const libc::sockaddr_un).cast::<libc::sockaddr>(),
                mem::size_of::<libc::sockaddr_un>() as libc::socklen_t,
            )
        };
        if rc == -1 {
            return Err(AgentSocketError::Connect {
                path: connected,
                source: std::io::Error::last_os_error(),
            });
        }

        debug!("connected to agent socket {:?} (fd {})", connected, raw);
        Ok(Self {
            stream: UnixStream::from(fd),
            path: connected,
            read_limit: MAX_READ_LEN,
        })
    }

    /// Cap single reads at `limit` bytes (at least 1).
    pub fn with_read_limit(mut self, limit: usize) -> Self {
        self.read_limit = limit.max(1);
        self
    }

    pub fn read_limit(&self) -> usize {
        self.read_limit
    }

    /// Path the socket is connected to, after any truncation.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// One read of up to `max_count` bytes (capped at the read limit).
    /// An empty result means the agent closed the connection.
    pub fn read(&self, max_count: usize) -> Result<Vec<u8>, AgentSocketError> {
        let mut buf = vec![0u8; max_count.min(self.read_limit)];
        let n = self.read_into(&mut buf)?;
        buf.truncate(n);
        Ok(buf)
    }

    /// One read into `buf`, using at most the read limit of it.
    pub fn read_into(&self, buf: &mut [u8]) -> Result<usize, AgentSocketError> {
        let len = buf.len().min(self.read_limit);
        (&self.stream)
            .read(&mut buf[..len])
            .map_err(AgentSocketError::Read)
    }

    /// One write of `data`; returns how many bytes the kernel accepted.
    pub fn write(&self, data: &[u8]) -> Result<usize, AgentSocketError> {
        // SAFETY: data is a valid slice for the duration of the call.
        let n = unsafe {
            libc::send(
                self.stream.as_raw_fd(),
                data.as_ptr().cast::<libc::c_void>(),
                data.len(),
                SEND_FLAGS,
            )
        };
        if n < 0 {
            return Err(AgentSocketError::Write(std::io::Error::last_os_error()));
        }
        Ok(n as usize)
    }

    /// Release the descriptor.
    pub fn close(self) {
        debug!("closing agent socket {:?}", self.path);
        drop(self);
    }
}

impl AsFd for AgentSocket {
    fn as_fd(&self) -> BorrowedFd<'_> {
        self.stream.as_fd()
    }
}

impl AsRawFd for AgentSocket {
    fn as_raw_fd(&self) -> RawFd {
        self.stream.as_raw_fd()
    }
}

/// A write to a dead peer must fail with EPIPE, not kill the host process.
#[cfg(any(target_os = "macos", target_os = "ios", target_os = "freebsd"))]
fn disable_sigpipe(fd: &OwnedFd) -> Result<(), AgentSocketError> {
    let on: libc::c_int = 1;
    // SAFETY: `on` outlives the call and its size is passed correctly.
    let rc = unsafe {
        libc::setsockopt(
            fd.as_raw_fd(),
            libc::SOL_SOCKET,
            libc::SO_NOSIGPIPE,
            (&on as *const libc::c_int).cast::<libc::c_void>(),
            mem::size_of::<libc::c_int>() as libc::socklen_t,
        )
    };
    if rc == -1 {
        return Err(AgentSocketError::SocketOption(std::io::Error::last_os_error()));
    }
    Ok(())
}

#[cfg(not(any(target_os = "macos", target_os = "ios", target_os = "freebsd")))]
fn disable_sigpipe(_fd: &OwnedFd) -> Result<(), AgentSocketError> {
    Ok(())
}
