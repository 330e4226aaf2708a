//! Full-screen terminal dashboard.

pub mod effects;
pub mod events;
pub mod render;
pub mod runtime;
pub mod state;
pub mod terminal;
pub mod text;
pub mod theme;
pub mod update;

#[cfg(test)]
mod testing;

use std::io::{IsTerminal, stdout};
use std::sync::Arc;

use anyhow::Result;
use dashboard_core::config::{Config, ConfigStore};
pub use runtime::TuiRuntime;

/// Runs the dashboard until the user quits.
///
/// # Errors
/// Fails when stdout is not a terminal, a panel cannot be configured, or the
/// terminal cannot be driven.
pub fn run_dashboard(config: &Config, store: Arc<ConfigStore>) -> Result<()> {
    if !stdout().is_terminal() {
        anyhow::bail!(
            "The dashboard requires a terminal.\n\
             Use `dashboard locations list` or `dashboard config path` for non-interactive use."
        );
    }

    let mut runtime = TuiRuntime::new(config, store)?;
    runtime.run()
}
