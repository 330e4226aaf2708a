//! Render-ready state of one plugin panel.

use chrono::{DateTime, Local};

use crate::selection::SelectionState;
use crate::sources::Field;

/// What the presentation layer draws for a plugin.
#[derive(Debug, Clone, Default)]
pub struct PluginView {
    pub status: String,
    pub last_updated: Option<DateTime<Local>>,
    pub fields: Vec<Field>,
    pub selection: SelectionState,
    pub loading: bool,
}

impl PluginView {
    pub fn loading() -> Self {
        Self {
            status: "Loading...".to_string(),
            loading: true,
            ..Self::default()
        }
    }

    /// Status line for a failure. Previous data stays on screen.
    pub fn set_error(&mut self, message: impl std::fmt::Display) {
        self.status = format!("⚠ {message}");
        self.loading = false;
    }

    pub fn has_error(&self) -> bool {
        self.status.starts_with('⚠')
    }
}
