//! Controlling-terminal access for sshbridge.
//!
//! Capability queries (tty-ness, window size) and the raw-mode state machine
//! used around passphrase prompts. Unix only; everything here talks to the
//! tty driver through `libc`.

pub mod info;
pub mod raw_mode;
#[cfg(test)]
mod test_pty;

pub use info::{
    is_a_tty, is_tty, stdout_window_size, terminal_height, terminal_width, window_size,
    WindowSize,
};
pub use raw_mode::{
    make_raw, FdTermios, RawModeController, RawModeError, TerminalMode, Termios, TermiosOps,
};
pub use sshbridge_settings::ApplyTiming;
