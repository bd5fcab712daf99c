//! Centralized path management for sshbridge.
//!
//! The config directory is lazily initialized and cached.
//! Use `set_config_dir` before first access to override it for testing.

use std::path::PathBuf;
use std::sync::OnceLock;

static CONFIG_DIR: OnceLock<PathBuf> = OnceLock::new();

/// ~/.config/sshbridge (or platform equivalent)
pub fn config_dir() -> &'static PathBuf {
    CONFIG_DIR.get_or_init(|| {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("sshbridge")
    })
}

/// Override config dir (must be called before first access). For testing.
///
/// Returns `false` if the directory was already initialized.
pub fn set_config_dir(path: PathBuf) -> bool {
    CONFIG_DIR.set(path).is_ok()
}

/// Config file path: config_dir()/config.toml
pub fn config_file() -> PathBuf {
    config_dir().join("config.toml")
}
