//! Tracing subscriber setup for the binary.

use std::io;

use tracing_subscriber::EnvFilter;

use crate::config::EnvConfig;

pub const DEFAULT_LOG_FILTER: &str = "warn";

/// Filter from `QUOTE_DESK_LOG`, then `RUST_LOG`, then [`DEFAULT_LOG_FILTER`].
pub fn env_filter(config: &EnvConfig) -> EnvFilter {
    config
        .log_filter
        .as_deref()
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .or_else(|| EnvFilter::try_from_default_env().ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_LOG_FILTER))
}

/// Installs the global subscriber. Logs go to stderr so they stay out of the
/// transcript on stdout. A second call is a no-op.
pub fn init(config: &EnvConfig) {
    let filter = env_filter(config);
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr);

    let _ = if config.log_json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
}
