//! Tracing subscriber setup

use anyhow::{anyhow, Result};
use tracing::Level;
use tracing_subscriber::EnvFilter;

use crate::config::LogConfig;

/// Map a level name to a tracing level, defaulting to `INFO`
pub fn parse_level(log_level: &str) -> Level {
    match log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    }
}

/// Install the global tracing subscriber
///
/// `RUST_LOG` takes precedence over `log_level`. `log_format` is `json` or
/// anything else for human-readable text. Fails if a global subscriber is
/// already set.
pub fn init_tracing(log_level: &str, log_format: &str, no_color: bool) -> Result<()> {
    let level = parse_level(log_level);

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.to_string()));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .with_ansi(!no_color);

    let installed = match log_format {
        "json" => subscriber.json().try_init(),
        _ => subscriber.try_init(),
    };
    installed.map_err(|e| anyhow!("Failed to install tracing subscriber: {e}"))
}

impl LogConfig {
    /// Install the global subscriber from these settings
    pub fn init(&self, no_color: bool) -> Result<()> {
        init_tracing(&self.level, &self.format, no_color)
    }
}
