//! Centralized configuration constants for sshbridge.
//!
//! Organized by component.

/// Agent socket bridge limits.
pub mod agent {
    /// Largest single read the bridge will size a buffer for.
    ///
    /// Matches the maximum agent message length OpenSSH accepts (256 KiB).
    pub const MAX_READ_LEN: usize = 256 * 1024;
    /// Smallest configurable read cap.
    pub const MIN_READ_LEN: usize = 1;
}

/// Config file handling.
pub mod settings {
    /// Config files larger than this are ignored.
    pub const MAX_FILE_SIZE: u64 = 64 * 1024;
}

/// Logging defaults.
pub mod logging {
    /// Env var that switches on trace logging for sshbridge crates.
    pub const DEBUG_ENV: &str = "SSHBRIDGE_DEBUG";
    /// Filter used when neither `RUST_LOG` nor the config file sets one.
    pub const DEFAULT_FILTER: &str = "sshbridge=info,warn";
    /// Filter used when `SSHBRIDGE_DEBUG` is set.
    pub const DEBUG_FILTER: &str = "sshbridge=trace,info";
}
