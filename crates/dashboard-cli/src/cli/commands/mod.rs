//! CLI command handlers.

pub mod config;
pub mod locations;
pub mod tui;
