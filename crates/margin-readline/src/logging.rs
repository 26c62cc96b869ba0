//! File logging for the REPL.
//!
//! Logs go to `<data_dir>/margin/logs/margin.log.YYYY-MM-DD` so they never
//! interleave with the interactive prompt.

use anyhow::{Context, Result};
use margin_infrastructure::MarginPaths;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Installs the global subscriber.
///
/// `RUST_LOG` wins over `level`. The returned guard flushes buffered lines
/// when dropped and must live until exit.
pub fn init(level: &str) -> Result<WorkerGuard> {
    let log_dir = MarginPaths::log_dir()?;
    std::fs::create_dir_all(&log_dir)
        .with_context(|| format!("Failed to create log directory {}", log_dir.display()))?;

    let file_appender = RollingFileAppender::new(Rotation::DAILY, &log_dir, "margin.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(level)
            .with_context(|| format!("Invalid log level '{}'", level))?,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_target(true),
        )
        .init();

    tracing::info!(dir = %log_dir.display(), "Logging initialized");
    Ok(guard)
}
