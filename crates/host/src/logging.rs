//! Logging setup.
//!
//! Output goes to stderr: stdout belongs to the host application.

use sshbridge_settings::constants::logging::{DEBUG_ENV, DEBUG_FILTER, DEFAULT_FILTER};
use sshbridge_settings::Config;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Check if debug mode is enabled via environment variable.
fn is_debug_mode() -> bool {
    std::env::var_os(DEBUG_ENV).is_some()
}

/// Filter used when `RUST_LOG` is unset.
pub fn default_filter(config: &Config, debug: bool) -> &str {
    if debug {
        DEBUG_FILTER
    } else {
        config.log_filter.as_deref().unwrap_or(DEFAULT_FILTER)
    }
}

/// `RUST_LOG` wins when it parses, then `fallback`, then [`DEFAULT_FILTER`].
fn build_filter(rust_log: Option<&str>, fallback: &str) -> EnvFilter {
    rust_log
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .or_else(|| EnvFilter::try_new(fallback).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_FILTER))
}

/// Install the global subscriber. Returns `false` if one was already set.
pub fn init_logging() -> bool {
    use tracing_subscriber::{fmt, prelude::*};

    let debug = is_debug_mode();
    let fallback = default_filter(crate::bridge::config(), debug);
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let filter = build_filter(rust_log.as_deref(), fallback);

    let installed = tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_line_number(true),
        )
        .with(filter)
        .try_init()
        .is_ok();

    if installed {
        if debug {
            info!(
                "sshbridge v{} logging initialized (DEBUG MODE ENABLED)",
                env!("CARGO_PKG_VERSION")
            );
        } else {
            info!("sshbridge v{} logging initialized", env!("CARGO_PKG_VERSION"));
        }
    }
    installed
}
