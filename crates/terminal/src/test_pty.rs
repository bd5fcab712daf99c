//! Pseudo-terminal pairs for tests that need a real tty driver.

use std::ffi::CStr;
use std::io;
use std::os::fd::{AsRawFd, FromRawFd, OwnedFd};
use std::sync::Mutex;

/// `ptsname` returns a pointer into static storage.
static PTSNAME_LOCK: Mutex<()> = Mutex::new(());

pub(crate) struct TestPty {
    pub master: OwnedFd,
    pub slave: OwnedFd,
}

impl TestPty {
    pub fn open() -> io::Result<Self> {
        // SAFETY: every raw fd is wrapped in an OwnedFd as soon as it is
        // valid, and the ptsname result is copied while the lock is held.
        unsafe {
            let raw = libc::posix_openpt(libc::O_RDWR | libc::O_NOCTTY);
            if raw < 0 {
                return Err(io::Error::last_os_error());
            }
            let master = OwnedFd::from_raw_fd(raw);
            if libc::grantpt(master.as_raw_fd()) != 0 || libc::unlockpt(master.as_raw_fd()) != 0 {
                return Err(io::Error::last_os_error());
            }

            let name = {
                let _guard = PTSNAME_LOCK.lock().unwrap_or_else(|e| e.into_inner());
                let ptr = libc::ptsname(master.as_raw_fd());
                if ptr.is_null() {
                    return Err(io::Error::last_os_error());
                }
                CStr::from_ptr(ptr).to_owned()
            };

            let raw = libc::open(name.as_ptr(), libc::O_RDWR | libc::O_NOCTTY);
            if raw < 0 {
                return Err(io::Error::last_os_error());
            }
            Ok(Self {
                master,
                slave: OwnedFd::from_raw_fd(raw),
            })
        }
    }

    pub fn set_size(&self, cols: u16, rows: u16) -> io::Result<()> {
        let ws = libc::winsize {
            ws_row: rows,
            ws_col: cols,
            ws_xpixel: 0,
            ws_ypixel: 0,
        };
        // SAFETY: ws is a fully initialized winsize and the fd is open.
        if unsafe { libc::ioctl(self.master.as_raw_fd(), libc::TIOCSWINSZ, &ws) } == -1 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }
}
