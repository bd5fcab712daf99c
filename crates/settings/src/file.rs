//! TOML config file support.
//!
//! Config location: `~/.config/sshbridge/config.toml`

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::constants;

/// When terminal attribute changes take effect (`tcsetattr` action).
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ApplyTiming {
    /// Apply immediately (`TCSANOW`).
    Now,
    /// Apply after pending output is written (`TCSADRAIN`).
    #[default]
    Drain,
    /// Like `Drain`, and discard unread input (`TCSAFLUSH`).
    Flush,
}

/// User-facing config parsed from TOML.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, rename_all = "kebab-case")]
pub struct Config {
    /// Upper bound on a single agent socket read.
    pub max_read_len: usize,
    /// When raw-mode attribute changes are applied.
    pub apply_timing: ApplyTiming,
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    pub log_filter: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_read_len: constants::agent::MAX_READ_LEN,
            apply_timing: ApplyTiming::default(),
            log_filter: None,
        }
    }
}

impl Config {
    /// Read cap clamped to the supported range.
    pub fn effective_max_read_len(&self) -> usize {
        self.max_read_len.clamp(
            constants::agent::MIN_READ_LEN,
            constants::agent::MAX_READ_LEN,
        )
    }
}

/// Default config file content with comments (generated on request).
const DEFAULT_CONFIG: &str = r#"# sshbridge configuration

# Largest single agent socket read, in bytes (1..=262144)
# max-read-len = 262144

# When raw-mode terminal changes take effect: "now", "drain" or "flush"
# apply-timing = "drain"

# Log filter used when RUST_LOG is not set
# log-filter = "sshbridge=info,warn"
"#;

/// Return the config file path.
pub fn config_path() -> PathBuf {
    sshbridge_paths::config_file()
}

/// Ensure the config file exists, creating a commented default if missing.
pub fn ensure_config_file() -> Result<PathBuf> {
    let path = config_path();
    if !path.exists() {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }
        std::fs::write(&path, DEFAULT_CONFIG)
            .with_context(|| format!("Failed to write default config: {:?}", path))?;
        tracing::info!("Created default config at {:?}", path);
    }
    Ok(path)
}

/// Read and parse a config file, surfacing every failure.
pub fn read_config(path: &Path) -> Result<Config> {
    let len = std::fs::metadata(path)
        .with_context(|| format!("Failed to stat config: {:?}", path))?
        .len();
    anyhow::ensure!(
        len <= constants::settings::MAX_FILE_SIZE,
        "Config file too large ({} bytes)",
        len
    );

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config: {:?}", path))?;
    toml::from_str(&content).with_context(|| format!("Failed to parse config: {:?}", path))
}

/// Load a config file. Returns default on any error.
pub fn load_config_from(path: &Path) -> Config {
    if !path.exists() {
        return Config::default();
    }
    match read_config(path) {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::warn!("{:#}, using defaults", e);
            Config::default()
        }
    }
}

/// Load and parse the user config file. Returns default on any error.
pub fn load_config() -> Config {
    load_config_from(&config_path())
}
