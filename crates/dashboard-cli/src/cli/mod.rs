//! CLI entry and dispatch.

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use crate::logging;

mod commands;

#[derive(Parser)]
#[command(name = "dashboard")]
#[command(version)]
#[command(about = "Multi-panel terminal dashboard")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Manage the weather location carousel
    Locations {
        #[command(subcommand)]
        command: LocationCommands,
    },
}

#[derive(clap::Subcommand)]
enum ConfigCommands {
    /// Show the path to the config file
    Path,
    /// Initialize a default config file (if not present)
    Init,
}

#[derive(clap::Subcommand)]
enum LocationCommands {
    /// List locations, marking the active one
    List,
    /// Append a location and make it active
    Add {
        /// City name, postcode, coordinates or `auto:ip`
        #[arg(value_name = "LOCATION")]
        location: String,
    },
    /// Remove the location at a zero-based index
    Remove {
        #[arg(value_name = "INDEX")]
        index: usize,
    },
    /// Make the next location active (wraps around)
    Next,
    /// Make the previous location active (wraps around)
    Previous,
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    let _log_guard = logging::init()?;
    info!(version = env!("CARGO_PKG_VERSION"), "dashboard starting");

    match cli.command {
        None => {
            // one tokio runtime for every plugin
            let rt = tokio::runtime::Runtime::new().context("create tokio runtime")?;
            let _enter = rt.enter();
            commands::tui::run()
        }
        Some(Commands::Config { command }) => match command {
            ConfigCommands::Path => {
                commands::config::path();
                Ok(())
            }
            ConfigCommands::Init => commands::config::init(),
        },
        Some(Commands::Locations { command }) => match command {
            LocationCommands::List => commands::locations::list(),
            LocationCommands::Add { location } => commands::locations::add(&location),
            LocationCommands::Remove { index } => commands::locations::remove(index),
            LocationCommands::Next => commands::locations::next(),
            LocationCommands::Previous => commands::locations::previous(),
        },
    }
}
