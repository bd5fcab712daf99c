//! Raw-mode state machine for passphrase entry.
//!
//! ```text
//!   Normal ──enter ok──▶ Raw
//!   Raw ────leave ok──▶ Normal
//! ```
//!
//! A failed `enter` or `leave` leaves the state where it was. The saved
//! attributes exist only while in `Raw`, so `leave` always restores the
//! snapshot taken by the `enter` that got us there.
//!
//! Failures are reported through `tracing::warn!` unless the caller asked
//! for quiet operation, and are also returned so Rust callers can act on them.

use std::fmt;
use std::io;
use std::mem::MaybeUninit;
use std::os::fd::RawFd;

use sshbridge_settings::ApplyTiming;
use tracing::{debug, warn};

/// Terminal attribute set as understood by the tty driver.
pub type Termios = libc::termios;

/// Current state of a [`RawModeController`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminalMode {
    Normal,
    Raw,
}

impl fmt::Display for TerminalMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Normal => write!(f, "normal"),
            Self::Raw => write!(f, "raw"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RawModeError {
    #[error("tcgetattr: {0}")]
    GetAttributes(#[source] io::Error),

    #[error("tcsetattr: {0}")]
    SetAttributes(#[source] io::Error),

    #[error("tcsetattr (restore): {0}")]
    Restore(#[source] io::Error),
}

/// Attribute access for one terminal.
#[cfg_attr(test, mockall::automock)]
pub trait TermiosOps {
    fn get_attributes(&self) -> io::Result<Termios>;
    fn set_attributes(&self, attrs: &Termios, timing: ApplyTiming) -> io::Result<()>;
}

/// [`TermiosOps`] over a raw descriptor. The descriptor is not owned and must
/// stay open for as long as this value is used.
#[derive(Debug, Clone, Copy)]
pub struct FdTermios {
    fd: RawFd,
}

impl FdTermios {
    pub fn new(fd: RawFd) -> Self {
        Self { fd }
    }

    /// Standard input, the terminal passphrases are typed into.
    pub fn stdin() -> Self {
        Self::new(libc::STDIN_FILENO)
    }

    pub fn fd(&self) -> RawFd {
        self.fd
    }
}

fn tcsetattr_action(timing: ApplyTiming) -> libc::c_int {
    match timing {
        ApplyTiming::Now => libc::TCSANOW,
        ApplyTiming::Drain => libc::TCSADRAIN,
        ApplyTiming::Flush => libc::TCSAFLUSH,
    }
}

impl TermiosOps for FdTermios {
    fn get_attributes(&self) -> io::Result<Termios> {
        let mut tio = MaybeUninit::<Termios>::uninit();
        // SAFETY: tcgetattr fully initializes `tio` when it returns 0.
        unsafe {
            if libc::tcgetattr(self.fd, tio.as_mut_ptr()) != 0 {
                return Err(io::Error::last_os_error());
            }
            Ok(tio.assume_init())
        }
    }

    fn set_attributes(&self, attrs: &Termios, timing: ApplyTiming) -> io::Result<()> {
        // SAFETY: `attrs` is a valid termios obtained from tcgetattr.
        if unsafe { libc::tcsetattr(self.fd, tcsetattr_action(timing), attrs) } != 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }
}

/// Turn `tio` into raw settings: no line editing, echo, signal keys,
/// input translation, flow control or output processing; reads return as
/// soon as one byte is available.
pub fn make_raw(tio: &mut Termios) {
    tio.c_iflag |= libc::IGNPAR;
    tio.c_iflag &= !(libc::ISTRIP
        | libc::INLCR
        | libc::IGNCR
        | libc::ICRNL
        | libc::IXON
        | libc::IXANY
        | libc::IXOFF);
    #[cfg(any(
        target_os = "linux",
        target_os = "android",
        target_os = "illumos",
        target_os = "solaris",
        target_os = "aix",
        target_os = "haiku",
        target_os = "hurd",
        target_os = "nto",
        target_os = "cygwin"
    ))]
    {
        tio.c_iflag &= !libc::IUCLC;
    }
    tio.c_lflag &= !(libc::ISIG
        | libc::ICANON
        | libc::ECHO
        | libc::ECHOE
        | libc::ECHOK
        | libc::ECHONL
        | libc::IEXTEN);
    tio.c_oflag &= !libc::OPOST;
    tio.c_cc[libc::VMIN] = 1;
    tio.c_cc[libc::VTIME] = 0;
}

/// Owns the raw-mode session for one terminal.
///
/// Not thread-safe; callers sharing one across threads must serialize
/// `enter`/`leave` themselves. Dropping the controller does not restore
/// the terminal.
pub struct RawModeController<T = FdTermios> {
    ops: T,
    timing: ApplyTiming,
    saved: Option<Termios>,
}

impl RawModeController<FdTermios> {
    /// Controller for standard input.
    pub fn stdin(timing: ApplyTiming) -> Self {
        Self::new(FdTermios::stdin(), timing)
    }
}

impl<T: TermiosOps> RawModeController<T> {
    pub fn new(ops: T, timing: ApplyTiming) -> Self {
        Self {
            ops,
            timing,
            saved: None,
        }
    }

    pub fn mode(&self) -> TerminalMode {
        if self.saved.is_some() {
            TerminalMode::Raw
        } else {
            TerminalMode::Normal
        }
    }

    pub fn is_raw(&self) -> bool {
        self.saved.is_some()
    }

    /// Attributes `leave` will restore; `None` unless in raw mode.
    pub fn saved_attributes(&self) -> Option<&Termios> {
        self.saved.as_ref()
    }

    /// Switch the terminal to raw mode. No-op if already raw.
    pub fn enter(&mut self, quiet: bool) -> Result<(), RawModeError> {
        if self.saved.is_some() {
            debug!("enter: terminal already in raw mode");
            return Ok(());
        }

        let original = self
            .ops
            .get_attributes()
            .map_err(RawModeError::GetAttributes)
            .inspect_err(|e| report(e, quiet))?;

        let mut raw = original;
        make_raw(&mut raw);
        self.ops
            .set_attributes(&raw, self.timing)
            .map_err(RawModeError::SetAttributes)
            .inspect_err(|e| report(e, quiet))?;

        self.saved = Some(original);
        debug!("terminal entered raw mode");
        Ok(())
    }

    /// Restore the attributes saved by `enter`. No-op if not raw.
    pub fn leave(&mut self, quiet: bool) -> Result<(), RawModeError> {
        let Some(saved) = self.saved else {
            return Ok(());
        };

        self.ops
            .set_attributes(&saved, self.timing)
            .map_err(RawModeError::Restore)
            .inspect_err(|e| report(e, quiet))?;

        self.saved = None;
        debug!("terminal left raw mode");
        Ok(())
    }
}

fn report(err: &RawModeError, quiet: bool) {
    if !quiet {
        warn!("{}", err);
    }
}
