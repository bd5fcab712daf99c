//! Error taxonomy shared with the host's SSH layer.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Negative status codes from the OpenSSH `ssherr.h` numbering.
///
/// The host already speaks these values; this crate only ever produces
/// [`ErrorCode::SystemError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum ErrorCode {
    InternalError = -1,
    AllocFail = -2,
    InvalidArgument = -10,
    SystemError = -24,
    AgentCommunication = -26,
    AgentFailure = -27,
    Disconnected = -29,
    AgentNotPresent = -47,
    ProtocolError = -55,
}

impl ErrorCode {
    const ALL: [ErrorCode; 9] = [
        Self::InternalError,
        Self::AllocFail,
        Self::InvalidArgument,
        Self::SystemError,
        Self::AgentCommunication,
        Self::AgentFailure,
        Self::Disconnected,
        Self::AgentNotPresent,
        Self::ProtocolError,
    ];

    /// Wire value handed to the host.
    pub const fn as_raw(self) -> i32 {
        self as i32
    }

    pub fn message(self) -> &'static str {
        match self {
            Self::InternalError => "unexpected internal error",
            Self::AllocFail => "memory allocation failed",
            Self::InvalidArgument => "invalid argument",
            Self::SystemError => "unexpected system error",
            Self::AgentCommunication => "communication with agent failed",
            Self::AgentFailure => "agent refused operation",
            Self::Disconnected => "disconnected",
            Self::AgentNotPresent => "agent not present",
            Self::ProtocolError => "Protocol error",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.message(), self.as_raw())
    }
}

impl TryFrom<i32> for ErrorCode {
    type Error = i32;

    fn try_from(raw: i32) -> Result<Self, Self::Error> {
        Self::ALL
            .into_iter()
            .find(|code| code.as_raw() == raw)
            .ok_or(raw)
    }
}

/// Failure of an agent socket operation.
#[derive(Debug, thiserror::Error)]
pub enum AgentSocketError {
    #[error("failed to allocate unix domain socket: {0}")]
    Socket(#[source] io::Error),

    #[error("failed to set close-on-exec: {0}")]
    CloseOnExec(#[source] io::Error),

    #[error("failed to set socket option: {0}")]
    SocketOption(#[source] io::Error),

    #[error("connect to {path:?} failed: {source}")]
    Connect { path: PathBuf, source: io::Error },

    #[error("read from agent socket failed: {0}")]
    Read(#[source] io::Error),

    #[error("write to agent socket failed: {0}")]
    Write(#[source] io::Error),
}

impl AgentSocketError {
    /// Status code reported to the host. Every variant is a system error.
    pub fn code(&self) -> ErrorCode {
        ErrorCode::SystemError
    }

    /// The underlying OS error.
    pub fn os_error(&self) -> &io::Error {
        match self {
            Self::Socket(e)
            | Self::CloseOnExec(e)
            | Self::SocketOption(e)
            | Self::Read(e)
            | Self::Write(e) => e,
            Self::Connect { source, .. } => source,
        }
    }
}
