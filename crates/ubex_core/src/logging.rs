use std::path::Path;

use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::config::UbexConfig;

/// Default directive set used when `RUST_LOG` is not set.
fn default_directives(level: &str) -> String {
    format!("{level},ubex_app=debug,ubex_contracts=debug,ubex_core=debug")
}

/// Initializes the logging system with file + console output under
/// `~/.ubex/logs`.
///
/// The console layer writes to stderr so command output on stdout stays
/// machine-readable. Returns a guard that must be kept alive for the duration
/// of the process.
pub fn init_logging(level: &str) -> Result<WorkerGuard> {
    init_logging_to_dir(&UbexConfig::logs_dir()?, level)
}

/// Same as [`init_logging`], with the log files written to `logs_dir`.
pub fn init_logging_to_dir(logs_dir: &Path, level: &str) -> Result<WorkerGuard> {
    std::fs::create_dir_all(logs_dir)
        .with_context(|| format!("Failed to create log directory: {}", logs_dir.display()))?;

    // File appender: daily rotation
    let file_appender = tracing_appender::rolling::daily(logs_dir, "ubex");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(level)));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_target(true)
                .with_ansi(false)
                .with_writer(non_blocking),
        )
        .with(
            fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr)
                .compact(),
        )
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {e}"))?;

    Ok(guard)
}
