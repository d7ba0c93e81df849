//! # Logging
//!
//! Installs a `tracing-subscriber` formatter as the global subscriber.

use crate::config::LogConfig;
use tracing_subscriber::EnvFilter;

/// Installs the global subscriber described by `config`.
///
/// `RUST_LOG` takes precedence over `config.filter`; an unparsable
/// directive falls back to `info`. Calling this more than once is
/// harmless.
///
/// # Returns
///
/// `true` if this call installed the subscriber.
pub fn init(config: &LogConfig) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(config.with_target)
        .try_init()
        .is_ok();

    if installed {
        tracing::debug!(filter = %config.filter, "logging initialised");
    }
    installed
}
