use std::sync::Arc;

use anyhow::{Context, Result};
use dashboard_core::config::ConfigStore;

/// Loads the config and runs the dashboard. Must run inside a tokio runtime
/// context.
pub fn run() -> Result<()> {
    let store = Arc::new(ConfigStore::open_default());
    let config = store.load().context("load config")?;
    dashboard_tui::run_dashboard(&config, store)
}
