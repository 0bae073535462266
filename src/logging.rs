//! Diagnostic log: `tracing` events written to `<log_dir>/service.log`.
//!
//! The file is never rotated or truncated. Each line carries a timestamp,
//! the level and the message with its structured fields.

use std::path::Path;

use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::error::{Result, SorterError};

/// Install the global subscriber.
///
/// `level` is an `EnvFilter` directive (`"info"`, `"mailsort=debug"`, ...);
/// `RUST_LOG` takes precedence when set. With `stderr` the same events are
/// also printed to the terminal.
pub fn init(log_dir: &Path, file_name: &str, level: &str, stderr: bool) -> Result<()> {
    std::fs::create_dir_all(log_dir).map_err(|e| SorterError::io(log_dir, e))?;

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let file_appender = tracing_appender::rolling::never(log_dir, file_name);
    let file_layer = tracing_subscriber::fmt::layer()
        .with_ansi(false)
        .with_target(false)
        .with_writer(file_appender);

    let stderr_layer = stderr.then(|| {
        tracing_subscriber::fmt::layer()
            .with_target(false)
            .with_writer(std::io::stderr)
    });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(stderr_layer)
        .try_init()
        .map_err(|e| SorterError::Config(format!("logging already initialised: {e}")))
}

/// Write one free-text diagnostic entry at `level`.
///
/// Used for lifecycle entries that carry no structured fields: cycle start
/// and the critical entry written before the daemon exits.
pub fn note(level: Level, message: &str) {
    match level {
        Level::ERROR => tracing::error!("{message}"),
        Level::WARN => tracing::warn!("{message}"),
        Level::INFO => tracing::info!("{message}"),
        Level::DEBUG => tracing::debug!("{message}"),
        _ => tracing::trace!("{message}"),
    }
}
