//! File logging. stdout and stderr belong to the TUI.

use std::fs;

use anyhow::{Context, Result};
use dashboard_core::config::paths;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

const LOG_FILE: &str = "dashboard.log";

/// Filter variable, e.g. `DASHBOARD_LOG=dashboard_core=debug`.
const LOG_ENV: &str = "DASHBOARD_LOG";

/// Installs the global subscriber writing to `$DASHBOARD_HOME/logs`.
///
/// Keep the returned guard alive until exit so buffered lines are flushed.
pub fn init() -> Result<Option<WorkerGuard>> {
    let log_dir = paths::logs_dir();
    fs::create_dir_all(&log_dir)
        .with_context(|| format!("Failed to create log directory {}", log_dir.display()))?;

    let file_appender = tracing_appender::rolling::never(&log_dir, LOG_FILE);
    let (writer, guard) = tracing_appender::non_blocking(file_appender);
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));

    match tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .try_init()
    {
        Ok(()) => Ok(Some(guard)),
        // A subscriber is already installed; drop the guard so the writer shuts down.
        Err(_) => Ok(None),
    }
}
