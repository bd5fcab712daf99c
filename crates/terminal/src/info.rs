//! Terminal capability queries.
//!
//! The stdout forms never fail: layout is best-effort, so a failed query
//! reads as "not a tty" or a zero dimension.

use std::io::{self, IsTerminal};
use std::os::fd::{AsFd, AsRawFd};

/// Terminal dimensions in columns and rows.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WindowSize {
    pub cols: u16,
    pub rows: u16,
}

/// True if `fd` refers to a terminal device.
pub fn is_tty(fd: impl AsFd) -> bool {
    fd.as_fd().is_terminal()
}

/// Query the window size of the terminal behind `fd` (`TIOCGWINSZ`).
pub fn window_size(fd: impl AsFd) -> io::Result<WindowSize> {
    let mut ws = libc::winsize {
        ws_row: 0,
        ws_col: 0,
        ws_xpixel: 0,
        ws_ypixel: 0,
    };
    // SAFETY: the fd is borrowed for the duration of the call and `ws` is a
    // valid, initialized winsize for the kernel to fill.
    let rc = unsafe { libc::ioctl(fd.as_fd().as_raw_fd(), libc::TIOCGWINSZ, &mut ws) };
    if rc == -1 {
        return Err(io::Error::last_os_error());
    }
    Ok(WindowSize {
        cols: ws.ws_col,
        rows: ws.ws_row,
    })
}

/// True if standard output is attached to a terminal.
pub fn is_a_tty() -> bool {
    is_tty(io::stdout())
}

/// Window size of standard output, or `None` if the query failed.
pub fn stdout_window_size() -> Option<WindowSize> {
    match window_size(io::stdout()) {
        Ok(size) => Some(size),
        Err(e) => {
            tracing::trace!("TIOCGWINSZ on stdout failed: {}", e);
            None
        }
    }
}

/// Column count of the terminal on stdout; 0 if unknown.
pub fn terminal_width() -> u16 {
    stdout_window_size().map_or(0, |size| size.cols)
}

/// Row count of the terminal on stdout; 0 if unknown.
pub fn terminal_height() -> u16 {
    stdout_window_size().map_or(0, |size| size.rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_pty::TestPty;
    use test_case::test_case;

    #[test]
    fn pty_slave_is_a_tty() {
        let pty = TestPty::open().expect("open pty");
        assert!(is_tty(&pty.slave));
    }

    #[test]
    fn regular_file_is_not_a_tty() {
        let file = std::fs::File::open("/dev/null").expect("open /dev/null");
        assert!(!is_tty(&file));
    }

    #[test]
    fn window_size_fails_on_non_terminal() {
        let file = std::fs::File::open("/dev/null").expect("open /dev/null");
        assert!(window_size(&file).is_err());
    }

    #[test_case(80, 24 ; "standard terminal")]
    #[test_case(132, 43 ; "wide terminal")]
    #[test_case(1, 1 ; "minimum dimensions")]
    #[test_case(0, 0 ; "zero dimensions")]
    fn window_size_reads_pty_dimensions(cols: u16, rows: u16) {
        let pty = TestPty::open().expect("open pty");
        pty.set_size(cols, rows).expect("set size");
        assert_eq!(window_size(&pty.slave).expect("query"), WindowSize { cols, rows });
    }

    #[test]
    fn stdout_queries_agree() {
        // Whatever stdout is under the test runner, the fallible and
        // degrading forms must agree.
        match stdout_window_size() {
            Some(size) => {
                assert_eq!(terminal_width(), size.cols);
                assert_eq!(terminal_height(), size.rows);
            }
            None => {
                assert_eq!(terminal_width(), 0);
                assert_eq!(terminal_height(), 0);
            }
        }
    }
}
